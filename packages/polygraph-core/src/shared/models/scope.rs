//! Lexical scope model
//!
//! Scopes form a per-file tree held in an arena (`Vec` keyed by `ScopeId`).
//! Invariants: every scope except the root has a parent; a child's span nests
//! inside its parent's; siblings are disjoint.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::span::Span;

/// Index of a scope inside its file's scope arena.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct ScopeId(pub u32);

impl ScopeId {
    pub const ROOT: ScopeId = ScopeId(0);

    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

/// Kind of a lexical scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeKind {
    Global,
    Module,
    Function,
    Method,
    Constructor,
    Class,
    Block,
}

impl ScopeKind {
    /// Scopes that own executable bodies; call sites are attributed to the
    /// nearest enclosing one of these.
    pub fn is_callable(&self) -> bool {
        matches!(
            self,
            ScopeKind::Function | ScopeKind::Method | ScopeKind::Constructor
        )
    }
}

/// One node of the scope tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scope {
    pub id: ScopeId,
    pub parent: Option<ScopeId>,
    pub kind: ScopeKind,
    pub name: Option<String>,
    pub span: Span,
    pub children: Vec<ScopeId>,
    /// Direct symbol map: name → indices into the file's definition list.
    pub symbols: BTreeMap<String, Vec<usize>>,
}

impl Scope {
    pub fn new(id: ScopeId, parent: Option<ScopeId>, kind: ScopeKind, span: Span) -> Self {
        Self {
            id,
            parent,
            kind,
            name: None,
            span,
            children: Vec::new(),
            symbols: BTreeMap::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}
