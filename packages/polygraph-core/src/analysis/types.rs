//! Local type tracking (layer 3)
//!
//! Shallow, assignment-driven `variable → type` bindings within one file.
//! Seeded from imported class candidates and from constructor-call
//! assignments. Position-aware but not flow-sensitive: a lookup sees the
//! latest binding at or before the query point in the same scope, else the
//! nearest binding in an enclosing scope. Types are never invented.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::scopes::ScopeTree;
use crate::shared::models::{ImportKind, ImportRecord, Point, ScopeId, SymbolId};

/// One `variable → class` binding, anchored at its declaration point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeBinding {
    pub variable: String,
    pub class_name: String,
    /// Filled when the class is declared in the same file.
    pub class_symbol: Option<SymbolId>,
    pub position: Point,
    pub scope: ScopeId,
}

/// Per-file variable type tracker.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LocalTypeTracker {
    bindings: BTreeMap<String, Vec<TypeBinding>>,
}

impl LocalTypeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a binding, keeping per-variable lists position-sorted.
    pub fn record(&mut self, binding: TypeBinding) {
        let list = self.bindings.entry(binding.variable.clone()).or_default();
        let at = list
            .binary_search_by(|b| b.position.cmp(&binding.position))
            .unwrap_or_else(|i| i);
        list.insert(at, binding);
    }

    /// Seed bindings from imported class candidates. Namespace and glob
    /// imports bind modules, not classes, and are skipped; whether a named
    /// import actually targets a class is settled at resolution time.
    pub fn seed_imports(&mut self, imports: &[ImportRecord]) {
        for import in imports {
            match import.kind {
                ImportKind::Named | ImportKind::Default => {}
                _ => continue,
            }
            if import.local_name.is_empty() || import.local_name == "*" {
                continue;
            }
            let class_name = if import.external_name == "default" || import.external_name == "*" {
                import.local_name.clone()
            } else {
                import.external_name.clone()
            };
            self.record(TypeBinding {
                variable: import.local_name.clone(),
                class_name,
                class_symbol: None,
                position: import.location.span.start,
                scope: import.scope,
            });
        }
    }

    /// Latest binding for `name` visible at `at` from `scope`.
    pub fn lookup(
        &self,
        name: &str,
        at: Point,
        scope: ScopeId,
        scopes: &ScopeTree,
    ) -> Option<&TypeBinding> {
        let candidates = self.bindings.get(name)?;
        let mut first = true;
        for scope_id in scopes.chain(scope) {
            let in_scope: Vec<&TypeBinding> = candidates
                .iter()
                .filter(|b| b.scope == scope_id)
                .collect();
            if in_scope.is_empty() {
                first = false;
                continue;
            }
            let preceding = in_scope
                .iter()
                .rev()
                .find(|b| b.position <= at)
                .copied();
            if first {
                // In the query scope only preceding bindings count.
                if let Some(binding) = preceding {
                    return Some(binding);
                }
            } else {
                return preceding.or_else(|| in_scope.last().copied());
            }
            first = false;
        }
        None
    }

    pub fn len(&self) -> usize {
        self.bindings.values().map(|v| v.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TypeBinding> {
        self.bindings.values().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::languages::{policy_for, Language};
    use tree_sitter::Parser;

    fn scopes_for(code: &str) -> ScopeTree {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_python::language())
            .unwrap();
        let tree = parser.parse(code, None).unwrap();
        ScopeTree::build(tree.root_node(), code, policy_for(Language::Python))
    }

    fn binding(var: &str, class: &str, position: Point, scope: ScopeId) -> TypeBinding {
        TypeBinding {
            variable: var.to_string(),
            class_name: class.to_string(),
            class_symbol: None,
            position,
            scope,
        }
    }

    #[test]
    fn test_latest_preceding_wins() {
        let scopes = scopes_for("a = A()\na = B()\na.m()\n");
        let mut tracker = LocalTypeTracker::new();
        let root = scopes.root();
        tracker.record(binding("a", "A", Point::new(0, 0), root));
        tracker.record(binding("a", "B", Point::new(1, 0), root));

        let hit = tracker.lookup("a", Point::new(2, 0), root, &scopes).unwrap();
        assert_eq!(hit.class_name, "B");

        // Between the two assignments only the first is visible.
        let hit = tracker.lookup("a", Point::new(0, 9), root, &scopes).unwrap();
        assert_eq!(hit.class_name, "A");
    }

    #[test]
    fn test_enclosing_scope_fallback() {
        let code = "a = A()\ndef f():\n    a.m()\n";
        let scopes = scopes_for(code);
        let mut tracker = LocalTypeTracker::new();
        tracker.record(binding("a", "A", Point::new(0, 0), scopes.root()));

        let f_scope = scopes
            .iter()
            .find(|s| s.name.as_deref() == Some("f"))
            .unwrap()
            .id;
        let hit = tracker
            .lookup("a", Point::new(2, 4), f_scope, &scopes)
            .unwrap();
        assert_eq!(hit.class_name, "A");
    }

    #[test]
    fn test_no_binding_before_declaration() {
        let scopes = scopes_for("a.m()\na = A()\n");
        let mut tracker = LocalTypeTracker::new();
        tracker.record(binding("a", "A", Point::new(1, 0), scopes.root()));

        assert!(tracker
            .lookup("a", Point::new(0, 0), scopes.root(), &scopes)
            .is_none());
    }

    #[test]
    fn test_seed_skips_namespace_imports() {
        use crate::shared::models::{ImportKind, ImportRecord, Location, Span};
        let mut tracker = LocalTypeTracker::new();
        tracker.seed_imports(&[
            ImportRecord::new("C", "C", "lib", ImportKind::Named, Location::default()),
            ImportRecord::new("ns", "*", "mod", ImportKind::Namespace, Location::new("", Span::zero())),
        ]);

        assert_eq!(tracker.len(), 1);
        assert_eq!(tracker.iter().next().unwrap().class_name, "C");
    }
}
