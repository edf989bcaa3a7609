//! Rust language policy
//!
//! Items allow forward references everywhere, visibility comes from `pub`
//! modifiers, methods live in `impl` blocks (merged into their type by the
//! registry), and `Type::new(..)` is the constructor convention.

use once_cell::sync::Lazy;
use std::collections::HashSet;
use tree_sitter::Node;

use super::policy::{
    nearest_ancestor, span_from_field, CallCapture, DefCapture, ExportCapture, ImportCapture,
    LanguagePolicy, ParamCapture, RefCapture, ScopeCapture,
};
use super::Language;
use crate::shared::models::{
    CallKind, DefKind, ImportKind, Point, Receiver, RefKind, ScopeKind, Span, SymbolId,
    Visibility,
};
use crate::shared::utils::tree_sitter::{
    child_by_field, find_child_by_kind, named_children, node_span, node_text, walk_tree,
};

static BUILTINS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "println", "print", "eprintln", "eprint", "format", "vec", "panic", "assert",
        "assert_eq", "assert_ne", "debug_assert", "write", "writeln", "dbg", "todo",
        "unimplemented", "unreachable", "matches", "include_str", "include_bytes", "env",
        "concat", "stringify", "Some", "None", "Ok", "Err", "Vec", "String", "Box", "Rc", "Arc",
        "Option", "Result", "HashMap", "HashSet", "BTreeMap", "BTreeSet", "VecDeque", "Cow",
        "Cell", "RefCell", "Mutex", "RwLock", "PathBuf", "Path", "Default", "Clone", "Copy",
        "Debug", "Display", "Iterator", "IntoIterator", "Into", "From", "TryFrom", "TryInto",
        "AsRef", "AsMut", "Send", "Sync", "Sized", "Drop", "Fn", "FnMut", "FnOnce", "drop",
    ]
    .into_iter()
    .collect()
});

const ITEM_KINDS: &[&str] = &[
    "function_item",
    "function_signature_item",
    "struct_item",
    "enum_item",
    "trait_item",
    "mod_item",
    "const_item",
    "static_item",
    "type_item",
];

/// Head identifier of a type node (`Foo<T>` → `Foo`).
fn type_head(node: &Node, source: &str) -> String {
    match node.kind() {
        "type_identifier" | "identifier" => node_text(node, source).to_string(),
        "generic_type" => child_by_field(node, "type")
            .map(|t| type_head(&t, source))
            .unwrap_or_else(|| node_text(node, source).to_string()),
        "scoped_type_identifier" | "scoped_identifier" => child_by_field(node, "name")
            .map(|n| node_text(&n, source).to_string())
            .unwrap_or_else(|| node_text(node, source).to_string()),
        "reference_type" => child_by_field(node, "type")
            .map(|t| type_head(&t, source))
            .unwrap_or_default(),
        _ => node_text(node, source)
            .split(|c: char| c == '<' || c == '&' || c == ' ')
            .find(|s| !s.is_empty())
            .unwrap_or("")
            .to_string(),
    }
}

fn visibility_of(node: &Node, source: &str) -> Visibility {
    match find_child_by_kind(node, "visibility_modifier") {
        Some(vis) => {
            let text = node_text(&vis, source);
            if text == "pub" {
                Visibility::Public
            } else if text.contains("crate") {
                Visibility::Crate
            } else if text.contains("super") || text.contains("in ") {
                Visibility::Module
            } else {
                Visibility::Public
            }
        }
        None => Visibility::Private,
    }
}

/// Nearest impl or trait block enclosing a function item.
fn enclosing_impl<'a>(node: &Node<'a>) -> Option<Node<'a>> {
    let mut current = node.parent();
    while let Some(n) = current {
        match n.kind() {
            "impl_item" | "trait_item" => return Some(n),
            "function_item" | "mod_item" | "source_file" => return None,
            _ => current = n.parent(),
        }
    }
    None
}

fn function_def_kind(node: &Node, name: &str) -> DefKind {
    match enclosing_impl(node) {
        Some(holder) if holder.kind() == "impl_item" => {
            if name == "new" {
                DefKind::Constructor
            } else {
                DefKind::Method
            }
        }
        Some(_) => DefKind::Method,
        None => DefKind::Function,
    }
}

fn extract_params(node: &Node, source: &str) -> Vec<ParamCapture> {
    let mut params = Vec::new();
    let params_node = match child_by_field(node, "parameters") {
        Some(p) => p,
        None => return params,
    };
    for child in named_children(&params_node) {
        if child.kind() != "parameter" {
            continue;
        }
        if let Some(pattern) = child_by_field(&child, "pattern") {
            if pattern.kind() == "identifier" {
                params.push(ParamCapture {
                    name: node_text(&pattern, source).to_string(),
                    span: node_span(&pattern),
                });
            }
        }
    }
    params
}

fn return_type_hint(node: &Node, source: &str) -> Option<String> {
    let rt = child_by_field(node, "return_type")?;
    let head = type_head(&rt, source);
    if head.is_empty() {
        None
    } else {
        Some(head)
    }
}

/// Flatten a use tree into import captures.
fn flatten_use_tree(node: &Node, source: &str, prefix: &str, out: &mut Vec<ImportCapture>) {
    let span = node_span(node);
    let join = |prefix: &str, seg: &str| {
        if prefix.is_empty() {
            seg.to_string()
        } else {
            format!("{}::{}", prefix, seg)
        }
    };
    match node.kind() {
        "identifier" | "crate" | "super" | "self" | "metavariable" => {
            let name = node_text(node, source).to_string();
            if name == "self" {
                // `use p::{self}` binds the module itself.
                let local = prefix.rsplit("::").next().unwrap_or(prefix).to_string();
                if !local.is_empty() {
                    out.push(ImportCapture {
                        local_name: local,
                        external_name: "*".to_string(),
                        source: prefix.to_string(),
                        kind: ImportKind::Namespace,
                        span,
                    });
                }
            } else if prefix.is_empty() {
                out.push(ImportCapture {
                    local_name: name.clone(),
                    external_name: "*".to_string(),
                    source: name,
                    kind: ImportKind::Namespace,
                    span,
                });
            } else {
                out.push(ImportCapture {
                    local_name: name.clone(),
                    external_name: name,
                    source: prefix.to_string(),
                    kind: ImportKind::Named,
                    span,
                });
            }
        }
        "scoped_identifier" => {
            let path = child_by_field(node, "path")
                .map(|p| node_text(&p, source).to_string())
                .unwrap_or_default();
            let name = child_by_field(node, "name")
                .map(|n| node_text(&n, source).to_string())
                .unwrap_or_default();
            let full_prefix = join(prefix, &path);
            if name == "self" {
                out.push(ImportCapture {
                    local_name: full_prefix
                        .rsplit("::")
                        .next()
                        .unwrap_or(&full_prefix)
                        .to_string(),
                    external_name: "*".to_string(),
                    source: full_prefix,
                    kind: ImportKind::Namespace,
                    span,
                });
            } else {
                out.push(ImportCapture {
                    local_name: name.clone(),
                    external_name: name,
                    source: full_prefix,
                    kind: ImportKind::Named,
                    span,
                });
            }
        }
        "use_as_clause" => {
            let alias = child_by_field(node, "alias")
                .map(|a| node_text(&a, source).to_string());
            let mut inner = Vec::new();
            if let Some(path) = child_by_field(node, "path") {
                flatten_use_tree(&path, source, prefix, &mut inner);
            }
            for mut cap in inner {
                if let Some(ref alias) = alias {
                    cap.local_name = alias.clone();
                }
                out.push(cap);
            }
        }
        "use_list" => {
            for child in named_children(node) {
                flatten_use_tree(&child, source, prefix, out);
            }
        }
        "scoped_use_list" => {
            let path = child_by_field(node, "path")
                .map(|p| node_text(&p, source).to_string())
                .unwrap_or_default();
            let new_prefix = join(prefix, &path);
            if let Some(list) = child_by_field(node, "list") {
                flatten_use_tree(&list, source, &new_prefix, out);
            }
        }
        "use_wildcard" => {
            let path = named_children(node)
                .first()
                .map(|p| node_text(p, source).to_string())
                .unwrap_or_default();
            out.push(ImportCapture {
                local_name: "*".to_string(),
                external_name: "*".to_string(),
                source: join(prefix, &path),
                kind: ImportKind::Glob,
                span,
            });
        }
        _ => {}
    }
}

fn rust_receiver(node: &Node, source: &str) -> Receiver {
    match node.kind() {
        "identifier" => Receiver::Identifier(node_text(node, source).to_string()),
        "self" => Receiver::SelfReceiver,
        "call_expression" => {
            let function = match child_by_field(node, "function") {
                Some(f) => f,
                None => return Receiver::Opaque,
            };
            match function.kind() {
                "field_expression" => {
                    let callee = child_by_field(&function, "field")
                        .map(|f| node_text(&f, source).to_string())
                        .unwrap_or_default();
                    let inner = child_by_field(&function, "value")
                        .map(|v| Box::new(rust_receiver(&v, source)));
                    Receiver::Call {
                        callee,
                        receiver: inner,
                    }
                }
                "identifier" => Receiver::Call {
                    callee: node_text(&function, source).to_string(),
                    receiver: None,
                },
                "scoped_identifier" => {
                    let name = child_by_field(&function, "name")
                        .map(|n| node_text(&n, source).to_string())
                        .unwrap_or_default();
                    if name == "new" {
                        let class = child_by_field(&function, "path")
                            .map(|p| type_head(&p, source))
                            .unwrap_or_default();
                        Receiver::Constructed(class)
                    } else {
                        Receiver::Opaque
                    }
                }
                _ => Receiver::Opaque,
            }
        }
        "field_expression" => {
            let mut segments = Vec::new();
            if let Some(value) = child_by_field(node, "value") {
                if value.kind() == "identifier" {
                    segments.push(node_text(&value, source).to_string());
                }
            }
            if let Some(field) = child_by_field(node, "field") {
                segments.push(node_text(&field, source).to_string());
            }
            if segments.len() == 2 {
                Receiver::Path(segments)
            } else {
                Receiver::Opaque
            }
        }
        _ => Receiver::Opaque,
    }
}

pub struct RustPolicy;

impl LanguagePolicy for RustPolicy {
    fn language(&self) -> Language {
        Language::Rust
    }

    fn scope_capture(&self, node: &Node, source: &str) -> Option<ScopeCapture> {
        match node.kind() {
            "source_file" => Some(ScopeCapture {
                kind: ScopeKind::Module,
                span: node_span(node),
                name: None,
            }),
            "function_item" => {
                let name = child_by_field(node, "name").map(|n| node_text(&n, source).to_string());
                let kind = match function_def_kind(node, name.as_deref().unwrap_or("")) {
                    DefKind::Constructor => ScopeKind::Constructor,
                    DefKind::Method => ScopeKind::Method,
                    _ => ScopeKind::Function,
                };
                Some(ScopeCapture {
                    kind,
                    span: span_from_field(node, "parameters"),
                    name,
                })
            }
            "closure_expression" => Some(ScopeCapture {
                kind: ScopeKind::Function,
                span: node_span(node),
                name: None,
            }),
            "impl_item" => {
                let name = child_by_field(node, "type").map(|t| type_head(&t, source));
                Some(ScopeCapture {
                    kind: ScopeKind::Class,
                    span: child_by_field(node, "body")
                        .map(|b| node_span(&b))
                        .unwrap_or_else(|| node_span(node)),
                    name,
                })
            }
            "trait_item" | "struct_item" | "enum_item" => {
                let name = child_by_field(node, "name").map(|n| node_text(&n, source).to_string());
                Some(ScopeCapture {
                    kind: ScopeKind::Class,
                    span: child_by_field(node, "body")
                        .map(|b| node_span(&b))
                        .unwrap_or_else(|| node_span(node)),
                    name,
                })
            }
            "mod_item" => {
                child_by_field(node, "body")?;
                Some(ScopeCapture {
                    kind: ScopeKind::Module,
                    span: child_by_field(node, "body")
                        .map(|b| node_span(&b))
                        .unwrap_or_else(|| node_span(node)),
                    name: child_by_field(node, "name")
                        .map(|n| node_text(&n, source).to_string()),
                })
            }
            "block" => {
                let parent_kind = node.parent().map(|p| p.kind());
                if matches!(parent_kind, Some("function_item") | Some("closure_expression")) {
                    // The body block is already covered by the callable scope.
                    return None;
                }
                Some(ScopeCapture {
                    kind: ScopeKind::Block,
                    span: node_span(node),
                    name: None,
                })
            }
            _ => None,
        }
    }

    fn definition_capture(&self, node: &Node, source: &str) -> Option<DefCapture> {
        match node.kind() {
            "function_item" | "function_signature_item" => {
                let name_node = child_by_field(node, "name")?;
                let name = node_text(&name_node, source).to_string();
                let kind = if node.kind() == "function_signature_item" {
                    DefKind::Method
                } else {
                    function_def_kind(node, &name)
                };
                let mut cap = DefCapture::new(kind, name, node_span(&name_node));
                cap.enclosing_span = Some(node_span(node));
                cap.params = extract_params(node, source);
                cap.return_type = return_type_hint(node, source);
                cap.visibility = visibility_of(node, source);
                Some(cap)
            }
            "struct_item" => {
                let name_node = child_by_field(node, "name")?;
                let mut cap = DefCapture::new(
                    DefKind::Struct,
                    node_text(&name_node, source),
                    node_span(&name_node),
                );
                cap.enclosing_span = Some(node_span(node));
                cap.visibility = visibility_of(node, source);
                Some(cap)
            }
            "enum_item" => {
                let name_node = child_by_field(node, "name")?;
                let mut cap = DefCapture::new(
                    DefKind::Enum,
                    node_text(&name_node, source),
                    node_span(&name_node),
                );
                cap.enclosing_span = Some(node_span(node));
                cap.visibility = visibility_of(node, source);
                Some(cap)
            }
            "trait_item" => {
                let name_node = child_by_field(node, "name")?;
                let mut cap = DefCapture::new(
                    DefKind::Trait,
                    node_text(&name_node, source),
                    node_span(&name_node),
                );
                cap.enclosing_span = Some(node_span(node));
                cap.visibility = visibility_of(node, source);
                Some(cap)
            }
            "type_item" => {
                let name_node = child_by_field(node, "name")?;
                let mut cap = DefCapture::new(
                    DefKind::TypeAlias,
                    node_text(&name_node, source),
                    node_span(&name_node),
                );
                cap.visibility = visibility_of(node, source);
                Some(cap)
            }
            "mod_item" => {
                let name_node = child_by_field(node, "name")?;
                let mut cap = DefCapture::new(
                    DefKind::Module,
                    node_text(&name_node, source),
                    node_span(&name_node),
                );
                cap.visibility = visibility_of(node, source);
                Some(cap)
            }
            "const_item" | "static_item" => {
                let name_node = child_by_field(node, "name")?;
                let mut cap = DefCapture::new(
                    DefKind::Constant,
                    node_text(&name_node, source),
                    node_span(&name_node),
                );
                cap.visibility = visibility_of(node, source);
                Some(cap)
            }
            "field_declaration" => {
                let name_node = child_by_field(node, "name")?;
                let mut cap = DefCapture::new(
                    DefKind::Field,
                    node_text(&name_node, source),
                    node_span(&name_node),
                );
                cap.visibility = visibility_of(node, source);
                Some(cap)
            }
            "let_declaration" => {
                let pattern = child_by_field(node, "pattern")?;
                let id = match pattern.kind() {
                    "identifier" => pattern,
                    "mut_pattern" => named_children(&pattern)
                        .into_iter()
                        .find(|c| c.kind() == "identifier")?,
                    _ => return None,
                };
                Some(DefCapture::new(
                    DefKind::Variable,
                    node_text(&id, source),
                    node_span(&id),
                ))
            }
            "closure_expression" => {
                let start = node_span(node).start;
                let mut cap = DefCapture::new(
                    DefKind::Function,
                    SymbolId::anonymous_segment(Point::new(start.row, start.column)),
                    node_span(node),
                );
                if let Some(params) = child_by_field(node, "parameters") {
                    for child in named_children(&params) {
                        if child.kind() == "identifier" {
                            cap.params.push(ParamCapture {
                                name: node_text(&child, source).to_string(),
                                span: node_span(&child),
                            });
                        }
                    }
                }
                Some(cap)
            }
            _ => None,
        }
    }

    fn reference_capture(&self, node: &Node, source: &str) -> Option<RefCapture> {
        match node.kind() {
            "identifier" => {
                let parent = node.parent()?;
                if ITEM_KINDS.contains(&parent.kind()) {
                    if child_by_field(&parent, "name")
                        .map(|n| n.id() == node.id())
                        .unwrap_or(false)
                    {
                        return None;
                    }
                }
                match parent.kind() {
                    "parameter" | "closure_parameters" | "mut_pattern" | "macro_invocation" => {
                        return None
                    }
                    "let_declaration" => {
                        if child_by_field(&parent, "pattern")
                            .map(|p| p.id() == node.id())
                            .unwrap_or(false)
                        {
                            return None;
                        }
                    }
                    "scoped_identifier" => {
                        // Only the final segment reads as the reference.
                        if child_by_field(&parent, "path")
                            .map(|p| p.id() == node.id())
                            .unwrap_or(false)
                        {
                            return None;
                        }
                    }
                    "field_initializer" | "shorthand_field_initializer" => return None,
                    _ => {}
                }
                Some(RefCapture {
                    name: node_text(node, source).to_string(),
                    span: node_span(node),
                    kind: RefKind::Identifier,
                    receiver: None,
                })
            }
            "type_identifier" => {
                let parent = node.parent()?;
                if ITEM_KINDS.contains(&parent.kind())
                    && child_by_field(&parent, "name")
                        .map(|n| n.id() == node.id())
                        .unwrap_or(false)
                {
                    return None;
                }
                Some(RefCapture {
                    name: node_text(node, source).to_string(),
                    span: node_span(node),
                    kind: RefKind::Type,
                    receiver: None,
                })
            }
            "field_identifier" => {
                let parent = node.parent()?;
                if parent.kind() != "field_expression" {
                    return None;
                }
                let receiver = child_by_field(&parent, "value").and_then(|v| {
                    if v.kind() == "identifier" {
                        Some(node_text(&v, source).to_string())
                    } else {
                        None
                    }
                });
                Some(RefCapture {
                    name: node_text(node, source).to_string(),
                    span: node_span(node),
                    kind: RefKind::Member,
                    receiver,
                })
            }
            _ => None,
        }
    }

    fn is_import_node(&self, node: &Node, _source: &str) -> bool {
        matches!(
            node.kind(),
            "use_declaration" | "extern_crate_declaration"
        )
    }

    fn import_captures(&self, node: &Node, source: &str) -> Vec<ImportCapture> {
        let mut captures = Vec::new();
        match node.kind() {
            "use_declaration" => {
                if let Some(argument) = child_by_field(node, "argument") {
                    flatten_use_tree(&argument, source, "", &mut captures);
                }
            }
            "extern_crate_declaration" => {
                if let Some(name) = child_by_field(node, "name") {
                    let crate_name = node_text(&name, source).to_string();
                    let local = child_by_field(node, "alias")
                        .map(|a| node_text(&a, source).to_string())
                        .unwrap_or_else(|| crate_name.clone());
                    captures.push(ImportCapture {
                        local_name: local,
                        external_name: "*".to_string(),
                        source: crate_name,
                        kind: ImportKind::Namespace,
                        span: node_span(node),
                    });
                }
            }
            _ => {}
        }
        captures
    }

    fn export_captures(&self, root: &Node, source: &str) -> Vec<ExportCapture> {
        // `pub use` re-exports; ordinary `pub` items go through the implicit
        // export rule.
        let mut captures = Vec::new();
        walk_tree(*root, &mut |node| {
            if node.kind() != "use_declaration" {
                return;
            }
            if visibility_of(&node, source) == Visibility::Private {
                return;
            }
            let mut imports = Vec::new();
            if let Some(argument) = child_by_field(&node, "argument") {
                flatten_use_tree(&argument, source, "", &mut imports);
            }
            for imp in imports {
                captures.push(ExportCapture {
                    local_name: if imp.external_name == "*" {
                        imp.local_name.clone()
                    } else {
                        imp.external_name.clone()
                    },
                    export_name: imp.local_name.clone(),
                    is_default: false,
                    re_export_source: Some(imp.source.clone()),
                    span: imp.span,
                });
            }
        });
        captures
    }

    fn is_implicitly_exported(&self, def: &DefCapture) -> bool {
        def.visibility != Visibility::Private
    }

    fn implements_capture(&self, node: &Node, source: &str) -> Option<(String, Vec<String>)> {
        if node.kind() != "impl_item" {
            return None;
        }
        let trait_node = child_by_field(node, "trait")?;
        let type_node = child_by_field(node, "type")?;
        Some((
            type_head(&type_node, source),
            vec![type_head(&trait_node, source)],
        ))
    }

    fn call_capture(&self, node: &Node, source: &str) -> Option<CallCapture> {
        match node.kind() {
            "call_expression" => {
                let mut function = child_by_field(node, "function")?;
                if function.kind() == "generic_function" {
                    function = child_by_field(&function, "function")?;
                }
                match function.kind() {
                    "identifier" => Some(CallCapture {
                        callee_name: node_text(&function, source).to_string(),
                        callee_span: node_span(&function),
                        receiver: None,
                        kind: CallKind::Direct,
                    }),
                    "field_expression" => {
                        let field = child_by_field(&function, "field")?;
                        let value = child_by_field(&function, "value")?;
                        Some(CallCapture {
                            callee_name: node_text(&field, source).to_string(),
                            callee_span: node_span(&field),
                            receiver: Some(rust_receiver(&value, source)),
                            kind: CallKind::Method,
                        })
                    }
                    "scoped_identifier" => {
                        let name = child_by_field(&function, "name")?;
                        let name_text = node_text(&name, source).to_string();
                        let path = child_by_field(&function, "path");
                        if name_text == "new" {
                            let class = path
                                .map(|p| type_head(&p, source))
                                .filter(|c| !c.is_empty())?;
                            Some(CallCapture {
                                callee_name: class,
                                callee_span: node_span(&function),
                                receiver: None,
                                kind: CallKind::Constructor,
                            })
                        } else {
                            let mut segments = Vec::new();
                            if let Some(p) = path {
                                super::policy::collect_path_segments(&p, source, &mut segments);
                            }
                            Some(CallCapture {
                                callee_name: name_text,
                                callee_span: node_span(&name),
                                receiver: if segments.is_empty() {
                                    None
                                } else {
                                    Some(Receiver::Path(segments))
                                },
                                kind: CallKind::Direct,
                            })
                        }
                    }
                    _ => None,
                }
            }
            "macro_invocation" => {
                let mac = child_by_field(node, "macro")?;
                if mac.kind() != "identifier" {
                    return None;
                }
                Some(CallCapture {
                    callee_name: node_text(&mac, source).to_string(),
                    callee_span: node_span(&mac),
                    receiver: None,
                    kind: CallKind::Direct,
                })
            }
            _ => None,
        }
    }

    fn assignment_target(&self, node: &Node, source: &str) -> Option<(String, Span)> {
        let ancestor =
            nearest_ancestor(node, &["let_declaration", "assignment_expression"], 3)?;
        let target = match ancestor.kind() {
            "let_declaration" => {
                let pattern = child_by_field(&ancestor, "pattern")?;
                match pattern.kind() {
                    "identifier" => pattern,
                    "mut_pattern" => named_children(&pattern)
                        .into_iter()
                        .find(|c| c.kind() == "identifier")?,
                    _ => return None,
                }
            }
            _ => {
                let left = child_by_field(&ancestor, "left")?;
                if left.kind() != "identifier" {
                    return None;
                }
                left
            }
        };
        Some((node_text(&target, source).to_string(), node_span(&target)))
    }

    fn is_hoisted(&self, kind: DefKind, _decl_node: &Node, _source: &str) -> bool {
        // Items see each other regardless of order; only local bindings are
        // positional.
        !matches!(kind, DefKind::Variable | DefKind::Parameter)
    }

    fn builtins(&self) -> &'static HashSet<&'static str> {
        &BUILTINS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tree_sitter::Parser;

    fn parse(code: &str) -> tree_sitter::Tree {
        let mut parser = Parser::new();
        parser.set_language(&tree_sitter_rust::language()).unwrap();
        parser.parse(code, None).unwrap()
    }

    fn definitions(code: &str) -> Vec<(String, DefKind, Visibility)> {
        let tree = parse(code);
        let mut defs = Vec::new();
        walk_tree(tree.root_node(), &mut |node| {
            if let Some(cap) = RustPolicy.definition_capture(&node, code) {
                defs.push((cap.name.clone(), cap.kind, cap.visibility));
            }
        });
        defs
    }

    #[test]
    fn test_visibility_forms() {
        let defs = definitions(
            "pub fn a() {}\npub(crate) fn b() {}\npub(super) fn c() {}\nfn d() {}\n",
        );
        assert!(defs.contains(&("a".to_string(), DefKind::Function, Visibility::Public)));
        assert!(defs.contains(&("b".to_string(), DefKind::Function, Visibility::Crate)));
        assert!(defs.contains(&("c".to_string(), DefKind::Function, Visibility::Module)));
        assert!(defs.contains(&("d".to_string(), DefKind::Function, Visibility::Private)));
    }

    #[test]
    fn test_impl_methods_and_constructor() {
        let defs = definitions(
            "struct S;\nimpl S {\n    pub fn new() -> Self { S }\n    fn m(&self) {}\n}\n",
        );
        assert!(defs
            .iter()
            .any(|(n, k, _)| n == "new" && *k == DefKind::Constructor));
        assert!(defs.iter().any(|(n, k, _)| n == "m" && *k == DefKind::Method));
    }

    #[test]
    fn test_use_forms() {
        let code = "use crate::a::T;\nuse std::collections::{HashMap, BTreeMap as Tree};\nuse super::util::*;\nextern crate serde;\n";
        let tree = parse(code);
        let mut captures = Vec::new();
        walk_tree(tree.root_node(), &mut |node| {
            if RustPolicy.is_import_node(&node, code) {
                captures.extend(RustPolicy.import_captures(&node, code));
            }
        });

        let t = captures.iter().find(|c| c.local_name == "T").unwrap();
        assert_eq!(t.source, "crate::a");
        assert_eq!(t.kind, ImportKind::Named);

        let tree_alias = captures.iter().find(|c| c.local_name == "Tree").unwrap();
        assert_eq!(tree_alias.external_name, "BTreeMap");
        assert_eq!(tree_alias.source, "std::collections");

        let glob = captures.iter().find(|c| c.kind == ImportKind::Glob).unwrap();
        assert_eq!(glob.source, "super::util");

        assert!(captures.iter().any(|c| c.local_name == "serde"));
    }

    #[test]
    fn test_constructor_call() {
        let code = "fn main() { let s = S::new(); }";
        let tree = parse(code);
        let mut captures = Vec::new();
        walk_tree(tree.root_node(), &mut |node| {
            if let Some(cap) = RustPolicy.call_capture(&node, code) {
                captures.push(cap);
            }
        });

        let ctor = captures
            .iter()
            .find(|c| c.kind == CallKind::Constructor)
            .unwrap();
        assert_eq!(ctor.callee_name, "S");
    }

    #[test]
    fn test_method_call_receiver() {
        let code = "fn main() { s.m(); }";
        let tree = parse(code);
        let mut captures = Vec::new();
        walk_tree(tree.root_node(), &mut |node| {
            if let Some(cap) = RustPolicy.call_capture(&node, code) {
                captures.push(cap);
            }
        });

        assert_eq!(captures.len(), 1);
        assert_eq!(captures[0].callee_name, "m");
        assert_eq!(
            captures[0].receiver,
            Some(Receiver::Identifier("s".to_string()))
        );
    }

    #[test]
    fn test_macro_call() {
        let code = "fn main() { println!(\"hi\"); }";
        let tree = parse(code);
        let mut captures = Vec::new();
        walk_tree(tree.root_node(), &mut |node| {
            if let Some(cap) = RustPolicy.call_capture(&node, code) {
                captures.push(cap);
            }
        });
        assert!(captures.iter().any(|c| c.callee_name == "println"));
    }

    #[test]
    fn test_impl_trait_for_type() {
        let code = "impl T for S { fn m(&self) {} }";
        let tree = parse(code);
        let mut relation = None;
        walk_tree(tree.root_node(), &mut |node| {
            if let Some(rel) = RustPolicy.implements_capture(&node, code) {
                relation = Some(rel);
            }
        });

        let (ty, traits) = relation.unwrap();
        assert_eq!(ty, "S");
        assert_eq!(traits, vec!["T".to_string()]);
    }

    #[test]
    fn test_pub_use_re_export() {
        let code = "pub use crate::a::T;\nuse crate::b::Hidden;\n";
        let tree = parse(code);
        let captures = RustPolicy.export_captures(&tree.root_node(), code);

        assert_eq!(captures.len(), 1);
        assert_eq!(captures[0].export_name, "T");
        assert_eq!(captures[0].re_export_source.as_deref(), Some("crate::a"));
    }

    #[test]
    fn test_items_allow_forward_refs() {
        let code = "fn f() {}";
        let tree = parse(code);
        let func = tree.root_node().child(0).unwrap();
        assert!(RustPolicy.is_hoisted(DefKind::Function, &func, code));
        assert!(!RustPolicy.is_hoisted(DefKind::Variable, &func, code));
    }
}
