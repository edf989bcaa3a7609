//! Per-file analysis (layers 1–4)
//!
//! Parse, scope tree, entity extraction, type tracking, call detection. All
//! of it is pure per-file work; the parser and tree are acquired for the
//! duration of one file's analysis and released when it completes. The
//! resulting `FileAnalysis` is immutable from here on: the project layers
//! read it and produce new records of their own.

pub mod calls;
pub mod extract;
pub mod scopes;
pub mod types;

pub use scopes::ScopeTree;
pub use types::{LocalTypeTracker, TypeBinding};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::errors::{ErrorKind, ErrorRecord, Layer};
use crate::languages::{policy_for, Language};
use crate::shared::models::{
    CallSite, DefKind, Definition, ExportRecord, ImportRecord, Reference, ScopeId, SymbolId,
};
use crate::shared::utils::tree_sitter::node_span;

/// Complete per-file analysis artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileAnalysis {
    pub file_path: String,
    pub language: Language,
    pub scopes: ScopeTree,
    pub definitions: Vec<Definition>,
    pub references: Vec<Reference>,
    pub imports: Vec<ImportRecord>,
    pub exports: Vec<ExportRecord>,
    /// `impl Trait for Type` attachments (Rust).
    pub impl_relations: Vec<(String, Vec<String>)>,
    pub call_sites: Vec<CallSite>,
    pub type_bindings: LocalTypeTracker,
    /// Callable scope → owning symbol.
    pub scope_owners: BTreeMap<ScopeId, SymbolId>,
    pub errors: Vec<ErrorRecord>,
}

impl FileAnalysis {
    /// Shell for a file whose parse failed; carries only the error.
    pub fn failed(file_path: impl Into<String>, language: Language, error: ErrorRecord) -> Self {
        let file_path = file_path.into();
        Self {
            file_path,
            language,
            scopes: ScopeTree::empty(),
            definitions: Vec::new(),
            references: Vec::new(),
            imports: Vec::new(),
            exports: Vec::new(),
            impl_relations: Vec::new(),
            call_sites: Vec::new(),
            type_bindings: LocalTypeTracker::new(),
            scope_owners: BTreeMap::new(),
            errors: vec![error],
        }
    }

    pub fn module_symbol(&self) -> SymbolId {
        SymbolId::module(&self.file_path)
    }

    pub fn has_parse_error(&self) -> bool {
        self.errors.iter().any(|e| e.kind == ErrorKind::Parse)
    }

    pub fn functions(&self) -> impl Iterator<Item = &Definition> {
        self.definitions.iter().filter(|d| d.kind.is_callable())
    }

    pub fn classes(&self) -> impl Iterator<Item = &Definition> {
        self.definitions.iter().filter(|d| d.kind.is_class_like())
    }

    pub fn variables(&self) -> impl Iterator<Item = &Definition> {
        self.definitions
            .iter()
            .filter(|d| matches!(d.kind, DefKind::Variable | DefKind::Constant))
    }
}

/// Run layers 1–4 for one file. `parser` must already be configured for the
/// file's language; per-worker parser reuse is the caller's concern.
pub fn analyze_source(
    file_path: &str,
    language: Language,
    source: &str,
    parser: &mut tree_sitter::Parser,
) -> FileAnalysis {
    let tree = match parser.parse(source, None) {
        Some(tree) => tree,
        None => {
            return FileAnalysis::failed(
                file_path,
                language,
                ErrorRecord::parse(file_path, "tree-sitter returned no tree"),
            );
        }
    };
    let root = tree.root_node();

    // A malformed file aborts its own analysis; the project carries on.
    if root.has_error() {
        let span = first_error_span(&root);
        let mut record = ErrorRecord::parse(file_path, "syntax errors in file");
        if let Some(span) = span {
            record = record.with_span(span);
        }
        return FileAnalysis::failed(file_path, language, record);
    }

    let policy = policy_for(language);
    let mut errors = Vec::new();

    // L1: scope tree.
    let mut scopes = ScopeTree::build(root, source, policy);
    for violation in scopes.check_invariants() {
        warn!(file = file_path, %violation, "scope invariant violated");
        errors.push(ErrorRecord::new(
            file_path,
            Layer::ScopeTree,
            ErrorKind::Scope,
            violation,
        ));
    }

    // L2: entities.
    let extraction = extract::extract(root, source, file_path, policy, &scopes);
    scopes.index_definitions(&extraction.definitions);
    errors.extend(extraction.errors);

    // L3/L4 run as a two-pass exchange: constructor discovery writes the
    // tracker, call classification reads it downstream.
    let mut type_bindings = LocalTypeTracker::new();
    type_bindings.seed_imports(&extraction.imports);
    calls::seed_constructor_types(
        root,
        source,
        policy,
        &scopes,
        &extraction.definitions,
        &mut type_bindings,
    );
    let call_sites = calls::detect_calls(
        root,
        source,
        file_path,
        policy,
        &scopes,
        &extraction.scope_owners,
    );

    debug!(
        file = file_path,
        definitions = extraction.definitions.len(),
        references = extraction.references.len(),
        calls = call_sites.len(),
        "per-file analysis complete"
    );

    FileAnalysis {
        file_path: file_path.to_string(),
        language,
        scopes,
        definitions: extraction.definitions,
        references: extraction.references,
        imports: extraction.imports,
        exports: extraction.exports,
        impl_relations: extraction.impl_relations,
        call_sites,
        type_bindings,
        scope_owners: extraction.scope_owners,
        errors,
    }
}

fn first_error_span(root: &tree_sitter::Node) -> Option<crate::shared::models::Span> {
    let mut found = None;
    crate::shared::utils::tree_sitter::walk_tree(*root, &mut |node| {
        if found.is_none() && (node.is_error() || node.is_missing()) {
            found = Some(node_span(&node));
        }
    });
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn analyze(language: Language, path: &str, code: &str) -> FileAnalysis {
        let mut parser = language.parser(std::path::Path::new(path)).unwrap();
        analyze_source(path, language, code, &mut parser)
    }

    #[test]
    fn test_js_instance_method_scenario() {
        let analysis = analyze(
            Language::Javascript,
            "a.js",
            "class A { greet() { return 1; } }\nconst a = new A();\na.greet();\n",
        );

        assert!(!analysis.has_parse_error());
        assert!(analysis.classes().any(|c| c.name == "A"));
        assert!(analysis
            .functions()
            .any(|f| f.id.as_str() == "a.js#A#greet"));

        // Type binding a → A anchored at the declaration.
        let binding = analysis
            .type_bindings
            .lookup(
                "a",
                crate::shared::models::Point::new(2, 0),
                analysis.scopes.root(),
                &analysis.scopes,
            )
            .unwrap();
        assert_eq!(binding.class_name, "A");
        assert_eq!(binding.position.row, 1);

        // Method call site from module level.
        let site = analysis
            .call_sites
            .iter()
            .find(|s| s.callee_name == "greet")
            .unwrap();
        assert_eq!(site.caller.as_str(), "a.js#<module>");
    }

    #[test]
    fn test_parse_failure_aborts_file() {
        let analysis = analyze(Language::Python, "bad.py", "def (:\n");
        assert!(analysis.has_parse_error());
        assert!(analysis.definitions.is_empty());
        assert!(analysis.call_sites.is_empty());
    }

    #[test]
    fn test_definitions_land_in_matching_scope() {
        let analysis = analyze(
            Language::Python,
            "m.py",
            "class C:\n    def f(self):\n        x = 1\n",
        );
        for def in &analysis.definitions {
            if def.kind == DefKind::Module {
                continue;
            }
            let scope = analysis.scopes.get(def.scope);
            assert!(
                scope.span.contains_point(def.location.span.start)
                    || def.scope == analysis.scopes.root(),
                "definition {} outside its scope",
                def.name
            );
        }
    }

    #[test]
    fn test_idempotent_per_file() {
        let code = "class A:\n    def f(self): pass\n\na = A()\na.f()\n";
        let first = analyze(Language::Python, "x.py", code);
        let second = analyze(Language::Python, "x.py", code);

        let a = serde_json::to_string(&first).unwrap();
        let b = serde_json::to_string(&second).unwrap();
        assert_eq!(a, b);
    }
}
