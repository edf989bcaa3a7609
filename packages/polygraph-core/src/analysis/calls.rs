//! Call detection (layer 4)
//!
//! Two passes over the CST. Pass one finds constructor-call assignments and
//! seeds the type tracker (the write half of the L3/L4 exchange). Pass two
//! classifies every call-shaped node into a `CallSite` with its receiver
//! shape; binding callees to symbols needs the project-wide registries and
//! happens in the resolution layer.

use std::collections::{BTreeMap, HashMap};
use tree_sitter::Node;

use super::scopes::ScopeTree;
use super::types::{LocalTypeTracker, TypeBinding};
use crate::languages::LanguagePolicy;
use crate::shared::models::{CallKind, CallSite, Definition, Location, ScopeId, SymbolId};
use crate::shared::utils::tree_sitter::{node_span, walk_tree};

/// Seed the tracker from constructor-call assignments (pass one).
pub fn seed_constructor_types(
    root: Node,
    source: &str,
    policy: &dyn LanguagePolicy,
    scopes: &ScopeTree,
    definitions: &[Definition],
    tracker: &mut LocalTypeTracker,
) {
    // Local class names resolve immediately; imported ones stay by-name.
    let local_classes: HashMap<&str, &SymbolId> = definitions
        .iter()
        .filter(|d| d.kind.is_class_like())
        .map(|d| (d.name.as_str(), &d.id))
        .collect();

    walk_tree(root, &mut |node| {
        let capture = match policy.call_capture(&node, source) {
            Some(c) if c.kind == CallKind::Constructor => c,
            _ => return,
        };
        let (variable, target_span) = match policy.assignment_target(&node, source) {
            Some(t) => t,
            None => return,
        };
        tracker.record(TypeBinding {
            variable,
            class_name: capture.callee_name.clone(),
            class_symbol: local_classes
                .get(capture.callee_name.as_str())
                .map(|id| (*id).clone()),
            position: target_span.start,
            scope: scopes.scope_at(target_span.start),
        });
    });
}

/// Classify every call site (pass two).
pub fn detect_calls(
    root: Node,
    source: &str,
    file: &str,
    policy: &dyn LanguagePolicy,
    scopes: &ScopeTree,
    scope_owners: &BTreeMap<ScopeId, SymbolId>,
) -> Vec<CallSite> {
    let mut sites = Vec::new();
    let module_symbol = SymbolId::module(file);

    walk_tree(root, &mut |node| {
        let capture = match policy.call_capture(&node, source) {
            Some(c) => c,
            None => return,
        };
        // `require(...)` already became an import record.
        if capture.callee_name == "require" && capture.kind == CallKind::Direct {
            return;
        }
        let span = node_span(&node);
        let scope = scopes.scope_at(span.start);
        let caller = scopes
            .nearest_callable(scope)
            .and_then(|callable| scope_owners.get(&callable))
            .cloned()
            .unwrap_or_else(|| module_symbol.clone());

        sites.push(CallSite {
            caller,
            callee_name: capture.callee_name,
            receiver: capture.receiver,
            kind: capture.kind,
            location: Location::new(file, span),
            scope,
        });
    });
    sites
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::extract::extract;
    use crate::languages::{policy_for, Language};
    use crate::shared::models::Receiver;
    use tree_sitter::Parser;

    struct Analyzed {
        scopes: ScopeTree,
        sites: Vec<CallSite>,
        tracker: LocalTypeTracker,
    }

    fn run(language: Language, code: &str) -> Analyzed {
        let grammar = match language {
            Language::Javascript => tree_sitter_javascript::language(),
            Language::Typescript => tree_sitter_typescript::language_typescript(),
            Language::Python => tree_sitter_python::language(),
            Language::Rust => tree_sitter_rust::language(),
        };
        let mut parser = Parser::new();
        parser.set_language(&grammar).unwrap();
        let tree = parser.parse(code, None).unwrap();
        let policy = policy_for(language);
        let scopes = ScopeTree::build(tree.root_node(), code, policy);
        let extraction = extract(tree.root_node(), code, "t", policy, &scopes);

        let mut tracker = LocalTypeTracker::new();
        tracker.seed_imports(&extraction.imports);
        seed_constructor_types(
            tree.root_node(),
            code,
            policy,
            &scopes,
            &extraction.definitions,
            &mut tracker,
        );
        let sites = detect_calls(
            tree.root_node(),
            code,
            "t",
            policy,
            &scopes,
            &extraction.scope_owners,
        );
        Analyzed {
            scopes,
            sites,
            tracker,
        }
    }

    #[test]
    fn test_module_level_caller_is_module_symbol() {
        let analyzed = run(Language::Javascript, "const a = new A(); a.greet();");
        for site in &analyzed.sites {
            assert_eq!(site.caller.as_str(), "t#<module>");
        }
    }

    #[test]
    fn test_constructor_seeds_tracker() {
        let analyzed = run(
            Language::Javascript,
            "class A {}\nconst a = new A();\na.greet();",
        );
        let binding = analyzed
            .tracker
            .lookup(
                "a",
                crate::shared::models::Point::new(2, 0),
                analyzed.scopes.root(),
                &analyzed.scopes,
            )
            .unwrap();
        assert_eq!(binding.class_name, "A");
        assert_eq!(binding.class_symbol.as_ref().unwrap().as_str(), "t#A:class");
    }

    #[test]
    fn test_caller_attribution_inside_function() {
        let analyzed = run(Language::Python, "def f():\n    helper()\n");
        let site = analyzed
            .sites
            .iter()
            .find(|s| s.callee_name == "helper")
            .unwrap();
        assert_eq!(site.caller.as_str(), "t#f");
    }

    #[test]
    fn test_chained_receiver_shape() {
        let analyzed = run(Language::Javascript, "new B().inner().doit();");
        let doit = analyzed
            .sites
            .iter()
            .find(|s| s.callee_name == "doit")
            .unwrap();
        match &doit.receiver {
            Some(Receiver::Call { callee, receiver }) => {
                assert_eq!(callee, "inner");
                match receiver.as_deref() {
                    Some(Receiver::Constructed(class)) => assert_eq!(class, "B"),
                    other => panic!("unexpected inner receiver: {:?}", other),
                }
            }
            other => panic!("unexpected receiver: {:?}", other),
        }
    }

    #[test]
    fn test_rust_constructor_assignment() {
        let analyzed = run(
            Language::Rust,
            "struct S;\nimpl S { fn new() -> Self { S } }\nfn main() { let s = S::new(); s.m(); }",
        );
        let main_scope = analyzed
            .scopes
            .iter()
            .find(|s| s.name.as_deref() == Some("main"))
            .unwrap()
            .id;
        let binding = analyzed
            .tracker
            .lookup(
                "s",
                crate::shared::models::Point::new(2, 40),
                main_scope,
                &analyzed.scopes,
            )
            .unwrap();
        assert_eq!(binding.class_name, "S");
    }

    #[test]
    fn test_require_not_a_call_site() {
        let analyzed = run(Language::Javascript, "const lib = require('./lib');");
        assert!(analyzed.sites.is_empty());
    }
}
