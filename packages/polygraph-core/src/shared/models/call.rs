//! Call-site models
//!
//! The call detector classifies sites and records the receiver shape; the
//! reference resolver later binds callees to symbols, turning `CallSite`s
//! into `CallRecord` edges.

use serde::{Deserialize, Serialize};

use super::scope::ScopeId;
use super::span::Location;
use super::symbol_id::SymbolId;

/// Classification of a call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallKind {
    Direct,
    Method,
    Constructor,
}

/// Receiver shape of a method call, recorded structurally so chained calls
/// can be resolved from the inside out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Receiver {
    /// `obj.m()`: plain identifier receiver, resolved via the type tracker.
    Identifier(String),
    /// `this.m()` / `self.m()`: resolved via the enclosing class.
    SelfReceiver,
    /// `new C().m()`: freshly constructed receiver of a known class name.
    Constructed(String),
    /// `a.b().c()`: receiver is another call; resolved via its return type.
    Call {
        callee: String,
        receiver: Option<Box<Receiver>>,
    },
    /// `a::b::f()`: path-qualified receiver (Rust paths, namespace chains).
    Path(Vec<String>),
    /// Anything the detector cannot name (literals, complex expressions).
    Opaque,
}

/// A detected call site, callee not yet bound.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallSite {
    /// Symbol of the enclosing callable, or the module symbol.
    pub caller: SymbolId,
    pub callee_name: String,
    pub receiver: Option<Receiver>,
    pub kind: CallKind,
    pub location: Location,
    pub scope: ScopeId,
}

/// A resolved call-graph edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallRecord {
    pub caller: SymbolId,
    pub callee: SymbolId,
    pub kind: CallKind,
    pub location: Location,
}

impl CallRecord {
    pub fn new(caller: SymbolId, callee: SymbolId, kind: CallKind, location: Location) -> Self {
        Self {
            caller,
            callee,
            kind,
            location,
        }
    }

    pub fn is_method_call(&self) -> bool {
        self.kind == CallKind::Method
    }

    pub fn is_constructor_call(&self) -> bool {
        self.kind == CallKind::Constructor
    }
}
