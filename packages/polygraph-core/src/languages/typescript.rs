//! TypeScript language policy
//!
//! Shares the ECMAScript extraction with JavaScript; the TypeScript-only node
//! kinds (interfaces, enums, type aliases, parameter wrappers, implements
//! clauses) are handled in the shared module and simply never fire for JS.

use once_cell::sync::Lazy;
use std::collections::HashSet;
use tree_sitter::Node;

use super::ecma;
use super::policy::{
    CallCapture, DefCapture, ExportCapture, ImportCapture, LanguagePolicy, RefCapture,
    ScopeCapture,
};
use super::Language;
use crate::shared::models::{DefKind, Span};

static BUILTINS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    let mut set: HashSet<&'static str> = super::javascript::JavascriptPolicy
        .builtins()
        .iter()
        .copied()
        .collect();
    // Type-level builtins that can appear in value-ish positions.
    for name in [
        "Partial",
        "Required",
        "Readonly",
        "Record",
        "Pick",
        "Omit",
        "Exclude",
        "Extract",
        "NonNullable",
        "ReturnType",
        "InstanceType",
        "Parameters",
        "Awaited",
        "Array",
        "ReadonlyArray",
    ] {
        set.insert(name);
    }
    set
});

pub struct TypescriptPolicy;

impl LanguagePolicy for TypescriptPolicy {
    fn language(&self) -> Language {
        Language::Typescript
    }

    fn scope_capture(&self, node: &Node, source: &str) -> Option<ScopeCapture> {
        ecma::scope_capture(node, source)
    }

    fn definition_capture(&self, node: &Node, source: &str) -> Option<DefCapture> {
        ecma::definition_capture(node, source)
    }

    fn reference_capture(&self, node: &Node, source: &str) -> Option<RefCapture> {
        ecma::reference_capture(node, source)
    }

    fn is_import_node(&self, node: &Node, source: &str) -> bool {
        ecma::is_import_node(node, source)
    }

    fn import_captures(&self, node: &Node, source: &str) -> Vec<ImportCapture> {
        ecma::import_captures(node, source)
    }

    fn export_captures(&self, root: &Node, source: &str) -> Vec<ExportCapture> {
        ecma::export_captures(root, source)
    }

    fn call_capture(&self, node: &Node, source: &str) -> Option<CallCapture> {
        ecma::call_capture(node, source)
    }

    fn assignment_target(&self, node: &Node, source: &str) -> Option<(String, Span)> {
        ecma::assignment_target(node, source)
    }

    fn is_hoisted(&self, kind: DefKind, decl_node: &Node, source: &str) -> bool {
        ecma::is_hoisted(kind, decl_node, source)
    }

    fn builtins(&self) -> &'static HashSet<&'static str> {
        &BUILTINS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::utils::tree_sitter::walk_tree;
    use tree_sitter::Parser;

    fn parse(code: &str) -> tree_sitter::Tree {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_typescript::language_typescript())
            .unwrap();
        parser.parse(code, None).unwrap()
    }

    fn definitions(code: &str) -> Vec<(String, DefKind)> {
        let tree = parse(code);
        let mut defs = Vec::new();
        walk_tree(tree.root_node(), &mut |node| {
            if let Some(cap) = TypescriptPolicy.definition_capture(&node, code) {
                defs.push((cap.name.clone(), cap.kind));
            }
        });
        defs
    }

    #[test]
    fn test_interface_and_type_alias() {
        let defs = definitions("interface Shape { area(): number }\ntype Alias = Shape;\n");
        assert!(defs.contains(&("Shape".to_string(), DefKind::Interface)));
        assert!(defs.contains(&("Alias".to_string(), DefKind::TypeAlias)));
        assert!(defs.contains(&("area".to_string(), DefKind::Method)));
    }

    #[test]
    fn test_implements_clause() {
        let code = "class Circle extends Base implements Shape, Drawable {}";
        let tree = parse(code);
        let class = tree.root_node().child(0).unwrap();

        let cap = TypescriptPolicy.definition_capture(&class, code).unwrap();
        assert_eq!(cap.extends, vec!["Base".to_string()]);
        assert_eq!(
            cap.implements,
            vec!["Shape".to_string(), "Drawable".to_string()]
        );
    }

    #[test]
    fn test_interface_extends() {
        let code = "interface A extends B, C {}";
        let tree = parse(code);
        let iface = tree.root_node().child(0).unwrap();

        let cap = TypescriptPolicy.definition_capture(&iface, code).unwrap();
        assert_eq!(cap.extends, vec!["B".to_string(), "C".to_string()]);
    }

    #[test]
    fn test_return_type_hint() {
        let code = "class B { inner(): C { return new C(); } }";
        let tree = parse(code);
        let mut hint = None;
        walk_tree(tree.root_node(), &mut |node| {
            if let Some(cap) = TypescriptPolicy.definition_capture(&node, code) {
                if cap.name == "inner" {
                    hint = cap.return_type.clone();
                }
            }
        });
        assert_eq!(hint.as_deref(), Some("C"));
    }

    #[test]
    fn test_typed_parameters() {
        let code = "function f(a: number, b?: string) {}";
        let tree = parse(code);
        let func = tree.root_node().child(0).unwrap();

        let cap = TypescriptPolicy.definition_capture(&func, code).unwrap();
        let names: Vec<&str> = cap.params.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_generic_return_type_head() {
        let code = "function g(): Promise<C> { return null as any; }";
        let tree = parse(code);
        let func = tree.root_node().child(0).unwrap();

        let cap = TypescriptPolicy.definition_capture(&func, code).unwrap();
        assert_eq!(cap.return_type.as_deref(), Some("Promise"));
    }
}
