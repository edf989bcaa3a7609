//! Reference resolution state
//!
//! Every reference moves through a small monotone state machine:
//! `Pending → Resolved | Builtin | Unresolved`. The three right-hand states
//! are terminal; in particular a reference never leaves `Resolved`.

use serde::{Deserialize, Serialize};

use super::entity::Reference;
use super::symbol_id::SymbolId;

/// Terminal-or-pending resolution state of a reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "value")]
pub enum ResolutionState {
    Pending,
    Resolved(SymbolId),
    Builtin(SymbolId),
    Unresolved(String),
}

impl ResolutionState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ResolutionState::Pending)
    }

    pub fn symbol(&self) -> Option<&SymbolId> {
        match self {
            ResolutionState::Resolved(id) | ResolutionState::Builtin(id) => Some(id),
            _ => None,
        }
    }

    /// Apply a transition. Terminal states are sticky: once resolved (or
    /// failed), later transitions are ignored rather than applied.
    pub fn advance(&mut self, next: ResolutionState) {
        if matches!(self, ResolutionState::Pending) {
            *self = next;
        }
    }
}

impl Default for ResolutionState {
    fn default() -> Self {
        ResolutionState::Pending
    }
}

/// A reference together with its final resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedReference {
    pub reference: Reference,
    pub state: ResolutionState,
}

impl ResolvedReference {
    pub fn new(reference: Reference, state: ResolutionState) -> Self {
        Self { reference, state }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_from_pending() {
        let mut state = ResolutionState::Pending;
        state.advance(ResolutionState::Resolved(SymbolId::module("a.py")));
        assert_eq!(
            state.symbol().map(|s| s.as_str()),
            Some("a.py#<module>")
        );
    }

    #[test]
    fn test_resolved_is_sticky() {
        let mut state = ResolutionState::Resolved(SymbolId::module("a.py"));
        state.advance(ResolutionState::Unresolved("late failure".into()));
        assert_eq!(
            state,
            ResolutionState::Resolved(SymbolId::module("a.py"))
        );
    }

    #[test]
    fn test_unresolved_is_terminal() {
        let state = ResolutionState::Unresolved("no binding".into());
        assert!(state.is_terminal());
        assert!(state.symbol().is_none());
    }
}
