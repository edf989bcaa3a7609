//! Shared models

mod call;
mod entity;
mod import_export;
mod resolution;
mod scope;
mod span;
mod symbol_id;

pub use call::{CallKind, CallRecord, CallSite, Receiver};
pub use entity::{
    CallableInfo, ClassInfo, DefKind, DefPayload, Definition, RefKind, Reference, Visibility,
};
pub use import_export::{ExportRecord, ImportKind, ImportRecord};
pub use resolution::{ResolutionState, ResolvedReference};
pub use scope::{Scope, ScopeId, ScopeKind};
pub use span::{Location, Point, Span};
pub use symbol_id::{SymbolId, BUILTIN_FILE, MODULE_NAME};
