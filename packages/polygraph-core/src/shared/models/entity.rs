//! Definitions and references
//!
//! Entities are tagged records: a shared header (id, name, kind, location,
//! scope) plus a per-kind payload. No inheritance hierarchies; exhaustive
//! matching and serde come for free.

use serde::{Deserialize, Serialize};

use super::scope::ScopeId;
use super::span::{Location, Span};
use super::symbol_id::SymbolId;

/// Kind of a declared entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefKind {
    Function,
    Method,
    Constructor,
    Class,
    Struct,
    Enum,
    Trait,
    Interface,
    Variable,
    Constant,
    Parameter,
    Property,
    Field,
    Module,
    TypeAlias,
    Import,
}

impl DefKind {
    /// Tag appended to symbol IDs so same-named entities of different kinds
    /// stay distinct. Callables are the untagged default.
    pub fn tag(&self) -> Option<&'static str> {
        match self {
            DefKind::Function | DefKind::Method | DefKind::Constructor | DefKind::Module => None,
            DefKind::Class => Some("class"),
            DefKind::Struct => Some("struct"),
            DefKind::Enum => Some("enum"),
            DefKind::Trait => Some("trait"),
            DefKind::Interface => Some("interface"),
            DefKind::Variable => Some("var"),
            DefKind::Constant => Some("const"),
            DefKind::Parameter => Some("param"),
            DefKind::Property => Some("prop"),
            DefKind::Field => Some("field"),
            DefKind::TypeAlias => Some("type"),
            DefKind::Import => Some("import"),
        }
    }

    pub fn is_callable(&self) -> bool {
        matches!(
            self,
            DefKind::Function | DefKind::Method | DefKind::Constructor
        )
    }

    /// Class-like kinds participate in the type registry and hierarchy.
    pub fn is_class_like(&self) -> bool {
        matches!(
            self,
            DefKind::Class | DefKind::Struct | DefKind::Enum | DefKind::Trait | DefKind::Interface
        )
    }
}

/// Language-level visibility of a definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    #[default]
    Public,
    Crate,
    Module,
    Private,
}

/// Payload for callable definitions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CallableInfo {
    pub params: Vec<String>,
    /// Declared return-type hint, textual. Never inferred.
    pub return_type: Option<String>,
}

/// Payload for class-like definitions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassInfo {
    /// Declared parent names, textual, in source order.
    pub extends: Vec<String>,
    /// Declared interface/trait names, textual, in source order.
    pub implements: Vec<String>,
}

/// Per-kind payload of a definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefPayload {
    Callable(CallableInfo),
    ClassLike(ClassInfo),
    #[default]
    None,
}

/// A declared entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Definition {
    pub id: SymbolId,
    pub name: String,
    pub kind: DefKind,
    /// Location of the declared name.
    pub location: Location,
    /// Full declaration including body, when the kind has one.
    pub enclosing_span: Option<Span>,
    pub scope: ScopeId,
    pub is_exported: bool,
    pub is_hoisted: bool,
    pub visibility: Visibility,
    pub payload: DefPayload,
}

impl Definition {
    pub fn new(id: SymbolId, name: impl Into<String>, kind: DefKind, location: Location) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
            location,
            enclosing_span: None,
            scope: ScopeId::ROOT,
            is_exported: false,
            is_hoisted: false,
            visibility: Visibility::default(),
            payload: DefPayload::None,
        }
    }

    pub fn with_scope(mut self, scope: ScopeId) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_enclosing_span(mut self, span: Span) -> Self {
        self.enclosing_span = Some(span);
        self
    }

    pub fn with_payload(mut self, payload: DefPayload) -> Self {
        self.payload = payload;
        self
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn exported(mut self) -> Self {
        self.is_exported = true;
        self
    }

    pub fn hoisted(mut self) -> Self {
        self.is_hoisted = true;
        self
    }

    pub fn callable_info(&self) -> Option<&CallableInfo> {
        match &self.payload {
            DefPayload::Callable(info) => Some(info),
            _ => None,
        }
    }

    pub fn class_info(&self) -> Option<&ClassInfo> {
        match &self.payload {
            DefPayload::ClassLike(info) => Some(info),
            _ => None,
        }
    }
}

/// Best-guess classification of a reference at extraction time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefKind {
    Identifier,
    /// Property of a member access; resolution may need the receiver type.
    Member,
    /// Type position (annotations, extends clauses, generics).
    Type,
}

/// A textual use of a name, bound to a definition in the final layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reference {
    pub name: String,
    pub location: Location,
    pub kind: RefKind,
    pub scope: ScopeId,
    /// Receiver identifier for member references (`obj` in `obj.prop`),
    /// recorded when the receiver is a plain identifier.
    pub receiver: Option<String>,
}

impl Reference {
    pub fn new(name: impl Into<String>, location: Location, kind: RefKind, scope: ScopeId) -> Self {
        Self {
            name: name.into(),
            location,
            kind,
            scope,
            receiver: None,
        }
    }

    pub fn with_receiver(mut self, receiver: impl Into<String>) -> Self {
        self.receiver = Some(receiver.into());
        self
    }
}
