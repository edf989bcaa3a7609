//! Language policy
//!
//! One trait gathers everything the core layers need to know about a
//! language: where scopes begin and end, which nodes declare or reference
//! entities, how imports and exports are written, what counts as a
//! constructor call, what hoists, and which names are built in. Defaults on
//! the trait cover the common case; each language overrides the exceptions.

use std::collections::HashSet;
use tree_sitter::Node;

use super::Language;
use crate::shared::models::{
    CallKind, DefKind, ImportKind, Receiver, RefKind, ScopeKind, Span, Visibility,
};
use crate::shared::utils::tree_sitter::{child_by_field, node_span, node_text};

/// A scope-creating node with its semantic boundaries.
#[derive(Debug, Clone)]
pub struct ScopeCapture {
    pub kind: ScopeKind,
    /// Semantic span of the scope (may differ from the node's own span).
    pub span: Span,
    pub name: Option<String>,
}

/// A captured parameter declaration.
#[derive(Debug, Clone)]
pub struct ParamCapture {
    pub name: String,
    pub span: Span,
}

/// A captured definition, before the symbol factory mints its ID.
#[derive(Debug, Clone)]
pub struct DefCapture {
    pub kind: DefKind,
    pub name: String,
    pub name_span: Span,
    /// Full declaration span including the body.
    pub enclosing_span: Option<Span>,
    pub return_type: Option<String>,
    pub extends: Vec<String>,
    pub implements: Vec<String>,
    pub params: Vec<ParamCapture>,
    pub visibility: Visibility,
}

impl DefCapture {
    pub fn new(kind: DefKind, name: impl Into<String>, name_span: Span) -> Self {
        Self {
            kind,
            name: name.into(),
            name_span,
            enclosing_span: None,
            return_type: None,
            extends: Vec::new(),
            implements: Vec::new(),
            params: Vec::new(),
            visibility: Visibility::default(),
        }
    }
}

/// A captured reference.
#[derive(Debug, Clone)]
pub struct RefCapture {
    pub name: String,
    pub span: Span,
    pub kind: RefKind,
    /// Identifier receiver for member references.
    pub receiver: Option<String>,
}

/// A captured import binding.
#[derive(Debug, Clone)]
pub struct ImportCapture {
    pub local_name: String,
    pub external_name: String,
    pub source: String,
    pub kind: ImportKind,
    pub span: Span,
}

/// A captured export declaration (explicit export syntax only; implicit
/// export rules go through [`LanguagePolicy::is_implicitly_exported`]).
#[derive(Debug, Clone)]
pub struct ExportCapture {
    pub local_name: String,
    pub export_name: String,
    pub is_default: bool,
    pub re_export_source: Option<String>,
    pub span: Span,
}

/// A classified call site capture.
#[derive(Debug, Clone)]
pub struct CallCapture {
    pub callee_name: String,
    pub callee_span: Span,
    pub receiver: Option<Receiver>,
    pub kind: CallKind,
}

/// Per-language capability set. Core layers are generic over this.
pub trait LanguagePolicy: Send + Sync {
    fn language(&self) -> Language;

    /// Boundary extractor: scope kind and semantic span for a
    /// scope-creating node, `None` otherwise.
    fn scope_capture(&self, node: &Node, source: &str) -> Option<ScopeCapture>;

    /// Definition capture for a declaring node, `None` otherwise.
    fn definition_capture(&self, node: &Node, source: &str) -> Option<DefCapture>;

    /// Reference capture for an identifier in use position, `None` otherwise.
    fn reference_capture(&self, node: &Node, source: &str) -> Option<RefCapture>;

    /// Whether this node is an import statement (walker collects and skips
    /// its subtree).
    fn is_import_node(&self, node: &Node, source: &str) -> bool;

    /// Import bindings declared by one import statement node.
    fn import_captures(&self, node: &Node, source: &str) -> Vec<ImportCapture>;

    /// Explicit export declarations in the file.
    fn export_captures(&self, root: &Node, source: &str) -> Vec<ExportCapture> {
        let _ = (root, source);
        Vec::new()
    }

    /// Whether a top-level definition is exported without explicit syntax
    /// (Python public names, Rust `pub` items).
    fn is_implicitly_exported(&self, def: &DefCapture) -> bool {
        let _ = def;
        false
    }

    /// Interface attachment outside the type's own declaration (Rust
    /// `impl Trait for Type`): `(type_name, trait_names)`.
    fn implements_capture(&self, node: &Node, source: &str) -> Option<(String, Vec<String>)> {
        let _ = (node, source);
        None
    }

    /// Call-site classification for a call-shaped node, `None` otherwise.
    /// Constructor detection is folded in via `CallKind::Constructor`.
    fn call_capture(&self, node: &Node, source: &str) -> Option<CallCapture>;

    /// The identifier an enclosing assignment binds the value of `node` to,
    /// used to seed the type tracker from constructor calls.
    fn assignment_target(&self, node: &Node, source: &str) -> Option<(String, Span)>;

    /// Hoisting table.
    fn is_hoisted(&self, kind: DefKind, decl_node: &Node, source: &str) -> bool {
        let _ = (kind, decl_node, source);
        false
    }

    /// Whether references inside nested bodies may see top-level items
    /// declared later in the file.
    fn forward_top_level_refs(&self) -> bool {
        true
    }

    /// Known built-in names for the builtin resolution fallback.
    fn builtins(&self) -> &'static HashSet<&'static str>;
}

// ───────────────────────────────────────────────────────────────────────────
// Shared helpers used by the policy implementations
// ───────────────────────────────────────────────────────────────────────────

/// Scope span from the parameter list to the end of the node: the default
/// boundary rule for function-like scopes.
pub(crate) fn span_from_field(node: &Node, field: &str) -> Span {
    let full = node_span(node);
    match child_by_field(node, field) {
        Some(start_node) => {
            let start = node_span(&start_node);
            Span::new(start.start_byte, full.end_byte, start.start, full.end)
        }
        None => full,
    }
}

/// Receiver shape of a member-access object expression, shared by the
/// ECMAScript policies and reused (with different node kinds) by the rest.
pub(crate) fn receiver_of_expression(node: &Node, source: &str) -> Receiver {
    match node.kind() {
        "identifier" => Receiver::Identifier(node_text(node, source).to_string()),
        "this" | "self" => Receiver::SelfReceiver,
        "new_expression" => match child_by_field(node, "constructor") {
            Some(ctor) => Receiver::Constructed(node_text(&ctor, source).to_string()),
            None => Receiver::Opaque,
        },
        "call_expression" | "call" => {
            match child_by_field(node, "function") {
                Some(f) if f.kind() == "member_expression" || f.kind() == "attribute" => {
                    let prop_field = if f.kind() == "attribute" {
                        "attribute"
                    } else {
                        "property"
                    };
                    let name = child_by_field(&f, prop_field)
                        .map(|p| node_text(&p, source).to_string())
                        .unwrap_or_default();
                    let inner = child_by_field(&f, "object")
                        .map(|o| Box::new(receiver_of_expression(&o, source)));
                    Receiver::Call {
                        callee: name,
                        receiver: inner,
                    }
                }
                Some(f) if f.kind() == "identifier" => Receiver::Call {
                    callee: node_text(&f, source).to_string(),
                    receiver: None,
                },
                _ => Receiver::Opaque,
            }
        }
        "member_expression" | "attribute" | "field_expression" => {
            // A bare property access used as a receiver: keep the chain as a
            // path so namespace walks stay possible.
            let mut segments = Vec::new();
            collect_path_segments(node, source, &mut segments);
            if segments.is_empty() {
                Receiver::Opaque
            } else {
                Receiver::Path(segments)
            }
        }
        _ => Receiver::Opaque,
    }
}

/// Flatten `a.b.c` / `a::b::c` member chains into path segments.
pub(crate) fn collect_path_segments(node: &Node, source: &str, out: &mut Vec<String>) {
    match node.kind() {
        "identifier" | "property_identifier" | "field_identifier" | "type_identifier" => {
            out.push(node_text(node, source).to_string());
        }
        "member_expression" => {
            if let Some(obj) = child_by_field(node, "object") {
                collect_path_segments(&obj, source, out);
            }
            if let Some(prop) = child_by_field(node, "property") {
                out.push(node_text(&prop, source).to_string());
            }
        }
        "attribute" => {
            if let Some(obj) = child_by_field(node, "object") {
                collect_path_segments(&obj, source, out);
            }
            if let Some(attr) = child_by_field(node, "attribute") {
                out.push(node_text(&attr, source).to_string());
            }
        }
        "scoped_identifier" => {
            if let Some(path) = child_by_field(node, "path") {
                collect_path_segments(&path, source, out);
            }
            if let Some(name) = child_by_field(node, "name") {
                out.push(node_text(&name, source).to_string());
            }
        }
        _ => {}
    }
}

/// Walk up from `node` to an enclosing assignment-like ancestor, bounded to
/// a few hops so unrelated outer statements never match.
pub(crate) fn nearest_ancestor<'a>(
    node: &Node<'a>,
    kinds: &[&str],
    max_hops: usize,
) -> Option<Node<'a>> {
    let mut current = node.parent();
    let mut hops = 0;
    while let Some(n) = current {
        if kinds.contains(&n.kind()) {
            return Some(n);
        }
        hops += 1;
        if hops >= max_hops {
            return None;
        }
        current = n.parent();
    }
    None
}
