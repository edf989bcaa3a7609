//! Scope tree construction (layer 1)
//!
//! Builds the per-file lexical scope tree by walking the CST and asking the
//! language policy for scope boundaries. The arena is a flat `Vec` keyed by
//! `ScopeId`; parent/child links are index pairs.

use serde::{Deserialize, Serialize};
use tree_sitter::Node;

use crate::languages::LanguagePolicy;
use crate::shared::models::{Point, Scope, ScopeId, ScopeKind, Span, SymbolId};
use crate::shared::utils::scope_path::ScopePath;
use crate::shared::utils::tree_sitter::node_span;

/// Per-file scope tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScopeTree {
    scopes: Vec<Scope>,
}

impl ScopeTree {
    /// A tree with only the root module scope (parse-failure shells).
    pub fn empty() -> ScopeTree {
        ScopeTree {
            scopes: vec![Scope::new(
                ScopeId::ROOT,
                None,
                ScopeKind::Module,
                Span::zero(),
            )],
        }
    }

    /// Build the tree for one file. The root is always a module scope
    /// covering the whole file.
    pub fn build(root: Node, source: &str, policy: &dyn LanguagePolicy) -> ScopeTree {
        let root_span = node_span(&root);
        let root_scope = Scope::new(ScopeId::ROOT, None, ScopeKind::Module, root_span);
        let mut tree = ScopeTree {
            scopes: vec![root_scope],
        };
        for i in 0..root.child_count() {
            if let Some(child) = root.child(i) {
                tree.walk(child, ScopeId::ROOT, source, policy);
            }
        }
        tree
    }

    fn walk(&mut self, node: Node, parent: ScopeId, source: &str, policy: &dyn LanguagePolicy) {
        let current = match policy.scope_capture(&node, source) {
            Some(capture) => {
                let id = ScopeId(self.scopes.len() as u32);
                let mut scope = Scope::new(id, Some(parent), capture.kind, capture.span);
                scope.name = capture.name;
                self.scopes.push(scope);
                self.scopes[parent.index()].children.push(id);
                id
            }
            None => parent,
        };
        for i in 0..node.child_count() {
            if let Some(child) = node.child(i) {
                self.walk(child, current, source, policy);
            }
        }
    }

    pub fn root(&self) -> ScopeId {
        ScopeId::ROOT
    }

    pub fn get(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.index()]
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Scope> {
        self.scopes.iter()
    }

    /// Smallest scope whose span contains `point`; ties favor the innermost.
    pub fn scope_at(&self, point: Point) -> ScopeId {
        let mut best = ScopeId::ROOT;
        let mut best_len = u32::MAX;
        for scope in &self.scopes {
            if scope.span.contains_point(point) {
                let len = scope.span.len();
                if len < best_len || (len == best_len && scope.id.0 > best.0) {
                    best = scope.id;
                    best_len = len;
                }
            }
        }
        best
    }

    /// Scope whose span exactly matches `span`, if any.
    pub fn scope_with_span(&self, span: Span) -> Option<ScopeId> {
        self.scopes.iter().find(|s| s.span == span).map(|s| s.id)
    }

    /// Chain from `id` up to and including the root.
    pub fn chain(&self, id: ScopeId) -> ScopeChain<'_> {
        ScopeChain {
            tree: self,
            next: Some(id),
        }
    }

    /// Nearest enclosing callable scope (the call-site owner), if any.
    pub fn nearest_callable(&self, id: ScopeId) -> Option<ScopeId> {
        self.chain(id).find(|s| self.get(*s).kind.is_callable())
    }

    /// Name of the nearest enclosing class scope, for `self`/`this` dispatch.
    pub fn enclosing_class_name(&self, id: ScopeId) -> Option<&str> {
        self.chain(id)
            .find(|s| self.get(*s).kind == ScopeKind::Class)
            .and_then(|s| self.get(s).name.as_deref())
    }

    /// Path of enclosing named scopes, for symbol ID minting. Blocks
    /// contribute nothing; anonymous callables contribute their position
    /// segment.
    pub fn path_of(&self, id: ScopeId) -> String {
        let mut segments: Vec<String> = Vec::new();
        for sid in self.chain(id) {
            if sid == ScopeId::ROOT {
                break;
            }
            let scope = self.get(sid);
            match scope.kind {
                ScopeKind::Block => continue,
                _ => match &scope.name {
                    Some(name) => segments.push(name.clone()),
                    None => segments.push(SymbolId::anonymous_segment(scope.span.start)),
                },
            }
        }
        let mut path = ScopePath::new();
        for segment in segments.into_iter().rev() {
            path.push(segment);
        }
        path.joined()
    }

    /// Register definitions in their scopes' symbol maps.
    pub fn index_definitions(&mut self, defs: &[crate::shared::models::Definition]) {
        for (i, def) in defs.iter().enumerate() {
            self.scopes[def.scope.index()]
                .symbols
                .entry(def.name.clone())
                .or_default()
                .push(i);
        }
    }

    /// Structural invariant check: parented, nested, sibling-disjoint.
    /// Returns human-readable violations; empty means healthy.
    pub fn check_invariants(&self) -> Vec<String> {
        let mut violations = Vec::new();
        for scope in &self.scopes {
            if scope.id != ScopeId::ROOT && scope.parent.is_none() {
                violations.push(format!("scope {:?} has no parent", scope.id));
            }
            if let Some(parent) = scope.parent {
                let parent_span = self.get(parent).span;
                if !parent_span.contains(&scope.span) {
                    violations.push(format!(
                        "scope {:?} escapes its parent {:?}",
                        scope.id, parent
                    ));
                }
            }
            for (i, a) in scope.children.iter().enumerate() {
                for b in scope.children.iter().skip(i + 1) {
                    let (sa, sb) = (self.get(*a).span, self.get(*b).span);
                    if sa.overlaps(&sb) && !sa.contains(&sb) && !sb.contains(&sa) {
                        violations.push(format!(
                            "sibling scopes {:?} and {:?} partially overlap",
                            a, b
                        ));
                    }
                }
            }
        }
        violations
    }
}

/// Upward iterator over a scope chain.
pub struct ScopeChain<'a> {
    tree: &'a ScopeTree,
    next: Option<ScopeId>,
}

impl<'a> Iterator for ScopeChain<'a> {
    type Item = ScopeId;

    fn next(&mut self) -> Option<ScopeId> {
        let current = self.next?;
        self.next = self.tree.get(current).parent;
        Some(current)
    }
}
