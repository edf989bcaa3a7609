//! Inheritance resolution (layer 7)
//!
//! Resolves declared `extends`/`implements` names to type symbols (local
//! definitions first, then resolved imports), computes transitive ancestor
//! and descendant closures with cycle guards, and linearizes a method
//! resolution order per class: depth-first, parents before interfaces,
//! stable declared order, duplicates dropped on first visit.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::warn;

use super::module_graph::ModuleGraph;
use super::type_registry::TypeRegistry;
use crate::errors::ErrorRecord;
use crate::shared::models::SymbolId;

/// One class in the resolved hierarchy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassNode {
    pub symbol: SymbolId,
    /// Direct parents, declared order.
    pub extends: Vec<SymbolId>,
    /// Implemented interfaces/traits, declared order.
    pub implements: Vec<SymbolId>,
    /// Transitive closure over parents and interfaces.
    pub all_ancestors: Vec<SymbolId>,
    pub all_descendants: Vec<SymbolId>,
    /// Linearized lookup order, the class itself first.
    pub mro: Vec<SymbolId>,
}

impl ClassNode {
    fn new(symbol: SymbolId) -> Self {
        Self {
            symbol,
            extends: Vec::new(),
            implements: Vec::new(),
            all_ancestors: Vec::new(),
            all_descendants: Vec::new(),
            mro: Vec::new(),
        }
    }
}

/// The resolved class hierarchy, keyed by class symbol.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClassHierarchy {
    pub nodes: BTreeMap<SymbolId, ClassNode>,
}

impl ClassHierarchy {
    pub fn build(
        registry: &TypeRegistry,
        modules: &ModuleGraph,
    ) -> (ClassHierarchy, Vec<ErrorRecord>) {
        let mut errors = Vec::new();
        let mut nodes: BTreeMap<SymbolId, ClassNode> = BTreeMap::new();

        // Pass 1: resolve declared parent names to symbols.
        for entry in registry.iter() {
            let mut node = ClassNode::new(entry.symbol.clone());
            for name in &entry.extends {
                if let Some(parent) =
                    resolve_type_name(&entry.file, name, registry, modules)
                {
                    node.extends.push(parent);
                }
            }
            for name in &entry.implements {
                if let Some(interface) =
                    resolve_type_name(&entry.file, name, registry, modules)
                {
                    node.implements.push(interface);
                }
            }
            nodes.insert(entry.symbol.clone(), node);
        }

        // Pass 2: transitive closure with cycle guards.
        let direct: BTreeMap<SymbolId, Vec<SymbolId>> = nodes
            .iter()
            .map(|(symbol, node)| {
                let mut parents = node.extends.clone();
                parents.extend(node.implements.iter().cloned());
                (symbol.clone(), parents)
            })
            .collect();

        for (symbol, node) in nodes.iter_mut() {
            let (ancestors, cycle) = collect_ancestors(symbol, &direct);
            if cycle {
                let file = symbol.file().unwrap_or("<unknown>");
                warn!(class = %symbol, "inheritance cycle broken");
                errors.push(ErrorRecord::cycle(
                    file,
                    format!("inheritance cycle through {}", symbol),
                ));
            }
            node.all_ancestors = ancestors;
            node.mro = linearize(symbol, &direct);
        }

        // Pass 3: descendants are the inverse of ancestors.
        let mut descendants: BTreeMap<SymbolId, BTreeSet<SymbolId>> = BTreeMap::new();
        for (symbol, node) in &nodes {
            for ancestor in &node.all_ancestors {
                descendants
                    .entry(ancestor.clone())
                    .or_default()
                    .insert(symbol.clone());
            }
        }
        for (symbol, set) in descendants {
            if let Some(node) = nodes.get_mut(&symbol) {
                node.all_descendants = set.into_iter().collect();
            }
        }

        (ClassHierarchy { nodes }, errors)
    }

    pub fn get(&self, symbol: &SymbolId) -> Option<&ClassNode> {
        self.nodes.get(symbol)
    }

    /// Method resolution order for a class; the class itself if unknown.
    pub fn mro_of(&self, symbol: &SymbolId) -> Vec<SymbolId> {
        self.nodes
            .get(symbol)
            .map(|n| n.mro.clone())
            .unwrap_or_else(|| vec![symbol.clone()])
    }

    pub fn is_ancestor(&self, ancestor: &SymbolId, of: &SymbolId) -> bool {
        self.nodes
            .get(of)
            .map(|n| n.all_ancestors.contains(ancestor))
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Resolve a parent name: same-file types first, then the file's resolved
/// imports, chasing re-export chains with a bounded depth.
pub(crate) fn resolve_type_name(
    file: &str,
    name: &str,
    registry: &TypeRegistry,
    modules: &ModuleGraph,
) -> Option<SymbolId> {
    if let Some(entry) = registry.lookup(file, name) {
        return Some(entry.symbol.clone());
    }
    let import = modules.import_of(file, name)?;
    let target = import.target_file()?;
    let wanted = if import.record.external_name == "*" || import.record.external_name == "default" {
        name
    } else {
        import.record.external_name.as_str()
    };
    lookup_exported_type(target, wanted, registry, modules, 0)
}

/// Find a type named `name` visible from `file`'s export surface, following
/// re-exports.
pub(crate) fn lookup_exported_type(
    file: &str,
    name: &str,
    registry: &TypeRegistry,
    modules: &ModuleGraph,
    depth: usize,
) -> Option<SymbolId> {
    if depth > 8 {
        return None;
    }
    if let Some(entry) = registry.lookup(file, name) {
        return Some(entry.symbol.clone());
    }
    for export in modules.exports(file) {
        let Some(source) = &export.re_export_source else {
            continue;
        };
        let matches = export.export_name == name || export.is_glob();
        if !matches {
            continue;
        }
        let upstream_name = if export.is_glob() {
            name
        } else {
            export.local_name.as_str()
        };
        if let Some(target) = modules.re_export_target(file, source) {
            if let Some(symbol) =
                lookup_exported_type(target, upstream_name, registry, modules, depth + 1)
            {
                return Some(symbol);
            }
        }
    }
    None
}

/// Ancestor closure; the bool reports whether a cycle was broken.
fn collect_ancestors(
    start: &SymbolId,
    direct: &BTreeMap<SymbolId, Vec<SymbolId>>,
) -> (Vec<SymbolId>, bool) {
    let mut seen: BTreeSet<SymbolId> = BTreeSet::new();
    let mut order = Vec::new();
    let mut cycle = false;
    let mut stack: Vec<SymbolId> = direct.get(start).cloned().unwrap_or_default();
    stack.reverse();

    while let Some(current) = stack.pop() {
        if current == *start {
            // A symbol never becomes its own ancestor.
            cycle = true;
            continue;
        }
        if !seen.insert(current.clone()) {
            continue;
        }
        order.push(current.clone());
        let mut parents = direct.get(&current).cloned().unwrap_or_default();
        parents.reverse();
        stack.extend(parents);
    }
    (order, cycle)
}

/// Depth-first linearization: self, then parents (declared order, each with
/// its own ancestors), then interfaces.
fn linearize(start: &SymbolId, direct: &BTreeMap<SymbolId, Vec<SymbolId>>) -> Vec<SymbolId> {
    let mut order = Vec::new();
    let mut visited = BTreeSet::new();
    fn dfs(
        current: &SymbolId,
        direct: &BTreeMap<SymbolId, Vec<SymbolId>>,
        visited: &mut BTreeSet<SymbolId>,
        order: &mut Vec<SymbolId>,
    ) {
        if !visited.insert(current.clone()) {
            return;
        }
        order.push(current.clone());
        for parent in direct.get(current).cloned().unwrap_or_default() {
            dfs(&parent, direct, visited, order);
        }
    }
    dfs(start, direct, &mut visited, &mut order);
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{analyze_source, FileAnalysis};
    use crate::languages::Language;
    use crate::project::module_graph::{FileSet, PackageManifests};

    fn analyze(language: Language, path: &str, code: &str) -> FileAnalysis {
        let mut parser = language.parser(std::path::Path::new(path)).unwrap();
        analyze_source(path, language, code, &mut parser)
    }

    fn hierarchy_for(analyses: Vec<FileAnalysis>, paths: &[&str]) -> (ClassHierarchy, Vec<ErrorRecord>) {
        let files = FileSet::new(paths.iter().map(|s| s.to_string()));
        let manifests = PackageManifests::new();
        let (modules, _) = ModuleGraph::build(&analyses, &files, &manifests);
        let registry = TypeRegistry::build(&analyses);
        ClassHierarchy::build(&registry, &modules)
    }

    #[test]
    fn test_diamond_single_base() {
        // Diamond: D extends L and R, both extend Base.
        let analysis = analyze(
            Language::Python,
            "d.py",
            "class Base: pass\nclass L(Base): pass\nclass R(Base): pass\nclass D(L, R): pass\n",
        );
        let (hierarchy, errors) = hierarchy_for(vec![analysis], &["d.py"]);
        assert!(errors.is_empty());

        let d = hierarchy
            .get(&SymbolId::local("d.py", "", "D", Some("class")))
            .unwrap();
        let names: Vec<&str> = d.all_ancestors.iter().map(|s| s.name()).collect();
        assert_eq!(names.len(), 3, "Base appears exactly once");
        assert!(names.contains(&"L"));
        assert!(names.contains(&"R"));
        assert!(names.contains(&"Base"));

        // MRO: D first, L before R.
        let mro: Vec<&str> = d.mro.iter().map(|s| s.name()).collect();
        assert_eq!(mro[0], "D");
        let l_pos = mro.iter().position(|n| *n == "L").unwrap();
        let r_pos = mro.iter().position(|n| *n == "R").unwrap();
        assert!(l_pos < r_pos);
    }

    #[test]
    fn test_cross_file_parent_via_import() {
        let lib = analyze(Language::Python, "lib.py", "class Base: pass\n");
        let app = analyze(
            Language::Python,
            "app.py",
            "from lib import Base\nclass Child(Base): pass\n",
        );
        let (hierarchy, errors) = hierarchy_for(vec![app, lib], &["lib.py", "app.py"]);
        assert!(errors.is_empty());

        let child = hierarchy
            .get(&SymbolId::local("app.py", "", "Child", Some("class")))
            .unwrap();
        assert_eq!(
            child.extends,
            vec![SymbolId::local("lib.py", "", "Base", Some("class"))]
        );

        let base = hierarchy
            .get(&SymbolId::local("lib.py", "", "Base", Some("class")))
            .unwrap();
        assert_eq!(base.all_descendants.len(), 1);
    }

    #[test]
    fn test_cycle_broken_and_recorded() {
        let analysis = analyze(
            Language::Python,
            "cyc.py",
            "class A(B): pass\nclass B(A): pass\n",
        );
        let (hierarchy, errors) = hierarchy_for(vec![analysis], &["cyc.py"]);

        assert!(!errors.is_empty());
        let a = hierarchy
            .get(&SymbolId::local("cyc.py", "", "A", Some("class")))
            .unwrap();
        // A is never its own ancestor.
        assert!(!a.all_ancestors.contains(&a.symbol));
    }

    #[test]
    fn test_rust_trait_implementation() {
        let a = analyze(Language::Rust, "src/a.rs", "pub trait T { fn m(&self); }\n");
        let b = analyze(
            Language::Rust,
            "src/b.rs",
            "use crate::a::T;\npub struct S;\nimpl T for S { fn m(&self) {} }\n",
        );
        let lib = analyze(Language::Rust, "src/lib.rs", "pub mod a;\npub mod b;\n");
        let (hierarchy, errors) =
            hierarchy_for(vec![a, b, lib], &["src/a.rs", "src/b.rs", "src/lib.rs"]);
        assert!(errors.is_empty());

        let s = hierarchy
            .get(&SymbolId::local("src/b.rs", "", "S", Some("struct")))
            .unwrap();
        assert_eq!(
            s.implements,
            vec![SymbolId::local("src/a.rs", "", "T", Some("trait"))]
        );
        // The trait shows up in the resolution path.
        assert!(s.mro.iter().any(|sym| sym.name() == "T"));
    }
}
