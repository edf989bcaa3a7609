//! Type registry (layer 6)
//!
//! Project-wide catalog of class-like types and their members, folded from
//! the per-file analyses. Rust `impl` blocks merge into their type's entry,
//! so methods declared away from the type's own definition still land on it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::analysis::FileAnalysis;
use crate::shared::models::{DefKind, ScopeKind, Span, SymbolId};

/// A method (or constructor) of a registered type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodEntry {
    pub name: String,
    pub symbol: SymbolId,
    pub return_type: Option<String>,
    pub is_constructor: bool,
}

/// A property or field of a registered type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyEntry {
    pub name: String,
    pub symbol: SymbolId,
}

/// One class/struct/interface/enum/trait in the project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeEntry {
    pub symbol: SymbolId,
    pub name: String,
    pub file: String,
    pub kind: DefKind,
    pub span: Span,
    pub methods: Vec<MethodEntry>,
    pub properties: Vec<PropertyEntry>,
    /// Declared parent names, unresolved (layer 7 resolves them).
    pub extends: Vec<String>,
    pub implements: Vec<String>,
}

impl TypeEntry {
    pub fn method(&self, name: &str) -> Option<&MethodEntry> {
        self.methods.iter().find(|m| m.name == name)
    }

    pub fn constructor(&self) -> Option<&MethodEntry> {
        self.methods.iter().find(|m| m.is_constructor)
    }

    pub fn property(&self, name: &str) -> Option<&PropertyEntry> {
        self.properties.iter().find(|p| p.name == name)
    }
}

/// Project-wide type catalog, keyed by symbol and by `(file, name)`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TypeRegistry {
    entries: Vec<TypeEntry>,
    by_symbol: BTreeMap<SymbolId, usize>,
    by_file_name: BTreeMap<(String, String), usize>,
}

impl TypeRegistry {
    /// Fold over per-file analyses (sorted by path for determinism).
    pub fn build(analyses: &[FileAnalysis]) -> TypeRegistry {
        let mut registry = TypeRegistry::default();

        for analysis in analyses {
            for def in &analysis.definitions {
                if !def.kind.is_class_like() {
                    continue;
                }
                let info = def.class_info().cloned().unwrap_or_default();
                let index = registry.entry_index(
                    &analysis.file_path,
                    &def.name,
                    def.id.clone(),
                    def.kind,
                    def.location.span,
                );
                let entry = &mut registry.entries[index];
                for parent in info.extends {
                    if !entry.extends.contains(&parent) {
                        entry.extends.push(parent);
                    }
                }
                for interface in info.implements {
                    if !entry.implements.contains(&interface) {
                        entry.implements.push(interface);
                    }
                }
            }

            // Attach methods, properties, and fields via their class scope.
            for def in &analysis.definitions {
                let scope = analysis.scopes.get(def.scope);
                if scope.kind != ScopeKind::Class {
                    continue;
                }
                let Some(class_name) = scope.name.clone() else {
                    continue;
                };
                let Some(&index) = registry
                    .by_file_name
                    .get(&(analysis.file_path.clone(), class_name))
                else {
                    continue;
                };
                let entry = &mut registry.entries[index];
                match def.kind {
                    DefKind::Method | DefKind::Constructor | DefKind::Function => {
                        if entry.methods.iter().all(|m| m.symbol != def.id) {
                            entry.methods.push(MethodEntry {
                                name: def.name.clone(),
                                symbol: def.id.clone(),
                                return_type: def
                                    .callable_info()
                                    .and_then(|c| c.return_type.clone()),
                                is_constructor: def.kind == DefKind::Constructor,
                            });
                        }
                    }
                    DefKind::Property | DefKind::Field => {
                        if entry.properties.iter().all(|p| p.name != def.name) {
                            entry.properties.push(PropertyEntry {
                                name: def.name.clone(),
                                symbol: def.id.clone(),
                            });
                        }
                    }
                    _ => {}
                }
            }

            // Rust impl-block trait attachments.
            for (type_name, traits) in &analysis.impl_relations {
                if let Some(&index) = registry
                    .by_file_name
                    .get(&(analysis.file_path.clone(), type_name.clone()))
                {
                    let entry = &mut registry.entries[index];
                    for interface in traits {
                        if !entry.implements.contains(interface) {
                            entry.implements.push(interface.clone());
                        }
                    }
                }
            }
        }

        registry
    }

    fn entry_index(
        &mut self,
        file: &str,
        name: &str,
        symbol: SymbolId,
        kind: DefKind,
        span: Span,
    ) -> usize {
        let key = (file.to_string(), name.to_string());
        if let Some(&index) = self.by_file_name.get(&key) {
            return index;
        }
        let index = self.entries.len();
        self.entries.push(TypeEntry {
            symbol: symbol.clone(),
            name: name.to_string(),
            file: file.to_string(),
            kind,
            span,
            methods: Vec::new(),
            properties: Vec::new(),
            extends: Vec::new(),
            implements: Vec::new(),
        });
        self.by_symbol.insert(symbol, index);
        self.by_file_name.insert(key, index);
        index
    }

    pub fn get(&self, symbol: &SymbolId) -> Option<&TypeEntry> {
        self.by_symbol.get(symbol).map(|&i| &self.entries[i])
    }

    pub fn lookup(&self, file: &str, name: &str) -> Option<&TypeEntry> {
        self.by_file_name
            .get(&(file.to_string(), name.to_string()))
            .map(|&i| &self.entries[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &TypeEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::analyze_source;
    use crate::languages::Language;

    fn analyze(language: Language, path: &str, code: &str) -> FileAnalysis {
        let mut parser = language.parser(std::path::Path::new(path)).unwrap();
        analyze_source(path, language, code, &mut parser)
    }

    #[test]
    fn test_class_with_methods() {
        let analysis = analyze(
            Language::Javascript,
            "a.js",
            "class A { constructor() {} greet() {} }",
        );
        let registry = TypeRegistry::build(&[analysis]);

        let a = registry.lookup("a.js", "A").unwrap();
        assert_eq!(a.kind, DefKind::Class);
        assert!(a.method("greet").is_some());
        assert!(a.constructor().is_some());
    }

    #[test]
    fn test_rust_impl_merges_into_struct() {
        let analysis = analyze(
            Language::Rust,
            "s.rs",
            "pub struct S;\npub trait T { fn m(&self); }\nimpl T for S { fn m(&self) {} }\nimpl S { pub fn new() -> Self { S } }\n",
        );
        let registry = TypeRegistry::build(&[analysis]);

        let s = registry.lookup("s.rs", "S").unwrap();
        assert_eq!(s.kind, DefKind::Struct);
        assert_eq!(s.implements, vec!["T".to_string()]);
        assert!(s.method("m").is_some());
        assert!(s.constructor().is_some());

        let t = registry.lookup("s.rs", "T").unwrap();
        assert_eq!(t.kind, DefKind::Trait);
        assert!(t.method("m").is_some());
    }

    #[test]
    fn test_return_type_hint_recorded() {
        let analysis = analyze(
            Language::Typescript,
            "b.ts",
            "class B { inner(): C { return new C(); } }\nclass C { doit() {} }",
        );
        let registry = TypeRegistry::build(&[analysis]);

        let b = registry.lookup("b.ts", "B").unwrap();
        assert_eq!(b.method("inner").unwrap().return_type.as_deref(), Some("C"));
    }

    #[test]
    fn test_python_fields_as_properties() {
        let analysis = analyze(
            Language::Python,
            "c.py",
            "class C:\n    size = 0\n    def f(self): pass\n",
        );
        let registry = TypeRegistry::build(&[analysis]);

        let c = registry.lookup("c.py", "C").unwrap();
        assert!(c.property("size").is_some());
        assert!(c.method("f").is_some());
    }

    #[test]
    fn test_lookup_by_symbol() {
        let analysis = analyze(Language::Python, "d.py", "class D: pass\n");
        let registry = TypeRegistry::build(&[analysis]);
        let d = registry.lookup("d.py", "D").unwrap();
        assert!(registry.get(&d.symbol).is_some());
    }
}
