//! Shared ECMAScript extraction
//!
//! JavaScript and TypeScript share a grammar family; the TypeScript-only node
//! kinds (interfaces, enums, type aliases, parameter wrappers) never occur in
//! JavaScript trees, so both policies delegate here.
//!
//! Heritage clauses differ between the two grammars: TypeScript wraps them in
//! `extends_clause` / `implements_clause` under `class_heritage`, while the
//! JavaScript grammar puts the `extends` keyword and the expression directly
//! under `class_heritage`. Both layouts are handled.

use tree_sitter::Node;

use super::policy::{
    nearest_ancestor, receiver_of_expression, span_from_field, CallCapture, DefCapture,
    ExportCapture, ImportCapture, ParamCapture, RefCapture, ScopeCapture,
};
use crate::shared::models::{
    CallKind, DefKind, ImportKind, Point, RefKind, ScopeKind, Span, SymbolId,
};
use crate::shared::utils::tree_sitter::{
    child_by_field, find_child_by_kind, named_children, node_span, node_text,
};

const FUNCTION_KINDS: &[&str] = &[
    "function_declaration",
    "generator_function_declaration",
    "function_expression",
    "function",
    "generator_function",
];

const BLOCK_PARENTS: &[&str] = &[
    "if_statement",
    "else_clause",
    "for_statement",
    "for_in_statement",
    "while_statement",
    "do_statement",
    "try_statement",
    "catch_clause",
    "finally_clause",
];

fn is_function_kind(kind: &str) -> bool {
    FUNCTION_KINDS.contains(&kind)
}

fn string_content(node: &Node, source: &str) -> String {
    node_text(node, source)
        .trim_matches(|c| c == '"' || c == '\'' || c == '`')
        .to_string()
}

// ───────────────────────────────────────────────────────────────────────────
// L1: scope boundaries
// ───────────────────────────────────────────────────────────────────────────

pub(crate) fn scope_capture(node: &Node, source: &str) -> Option<ScopeCapture> {
    let kind = node.kind();
    match kind {
        "program" => Some(ScopeCapture {
            kind: ScopeKind::Module,
            span: node_span(node),
            name: None,
        }),
        k if is_function_kind(k) => Some(ScopeCapture {
            kind: ScopeKind::Function,
            span: span_from_field(node, "parameters"),
            name: child_by_field(node, "name").map(|n| node_text(&n, source).to_string()),
        }),
        "arrow_function" => {
            let span = if child_by_field(node, "parameters").is_some() {
                span_from_field(node, "parameters")
            } else {
                span_from_field(node, "parameter")
            };
            Some(ScopeCapture {
                kind: ScopeKind::Function,
                span,
                name: None,
            })
        }
        "method_definition" => {
            let name = child_by_field(node, "name").map(|n| node_text(&n, source).to_string());
            let scope_kind = if name.as_deref() == Some("constructor") {
                ScopeKind::Constructor
            } else {
                ScopeKind::Method
            };
            Some(ScopeCapture {
                kind: scope_kind,
                span: span_from_field(node, "parameters"),
                name,
            })
        }
        "class_declaration" | "class" | "abstract_class_declaration" => Some(ScopeCapture {
            kind: ScopeKind::Class,
            span: child_by_field(node, "body")
                .map(|b| node_span(&b))
                .unwrap_or_else(|| node_span(node)),
            name: child_by_field(node, "name").map(|n| node_text(&n, source).to_string()),
        }),
        "interface_declaration" => Some(ScopeCapture {
            kind: ScopeKind::Class,
            span: child_by_field(node, "body")
                .map(|b| node_span(&b))
                .unwrap_or_else(|| node_span(node)),
            name: child_by_field(node, "name").map(|n| node_text(&n, source).to_string()),
        }),
        "statement_block" => {
            let parent_kind = node.parent().map(|p| p.kind().to_string());
            if parent_kind
                .as_deref()
                .map(|k| BLOCK_PARENTS.contains(&k))
                .unwrap_or(false)
            {
                Some(ScopeCapture {
                    kind: ScopeKind::Block,
                    span: node_span(node),
                    name: None,
                })
            } else {
                None
            }
        }
        "for_statement" | "for_in_statement" => Some(ScopeCapture {
            kind: ScopeKind::Block,
            span: node_span(node),
            name: None,
        }),
        _ => None,
    }
}

// ───────────────────────────────────────────────────────────────────────────
// L2: definitions
// ───────────────────────────────────────────────────────────────────────────

pub(crate) fn definition_capture(node: &Node, source: &str) -> Option<DefCapture> {
    match node.kind() {
        "function_declaration" | "generator_function_declaration" => {
            let name_node = child_by_field(node, "name")?;
            let mut cap = DefCapture::new(
                DefKind::Function,
                node_text(&name_node, source),
                node_span(&name_node),
            );
            cap.enclosing_span = Some(node_span(node));
            cap.params = extract_params(node, source);
            cap.return_type = return_type_hint(node, source);
            Some(cap)
        }
        "function_expression" | "function" | "generator_function" | "arrow_function" => {
            // Anonymous callables still get a definition so their parameters
            // land in a scope symbol map; the position stands in for a name.
            let name = match child_by_field(node, "name") {
                Some(n) => node_text(&n, source).to_string(),
                None => {
                    let start = node_span(node).start;
                    SymbolId::anonymous_segment(Point::new(start.row, start.column))
                }
            };
            let mut cap = DefCapture::new(DefKind::Function, name, node_span(node));
            cap.enclosing_span = Some(node_span(node));
            cap.params = extract_params(node, source);
            cap.return_type = return_type_hint(node, source);
            Some(cap)
        }
        "class_declaration" | "abstract_class_declaration" => {
            let name_node = child_by_field(node, "name")?;
            let mut cap = DefCapture::new(
                DefKind::Class,
                node_text(&name_node, source),
                node_span(&name_node),
            );
            cap.enclosing_span = Some(node_span(node));
            let (extends, implements) = heritage(node, source);
            cap.extends = extends;
            cap.implements = implements;
            Some(cap)
        }
        "interface_declaration" => {
            let name_node = child_by_field(node, "name")?;
            let mut cap = DefCapture::new(
                DefKind::Interface,
                node_text(&name_node, source),
                node_span(&name_node),
            );
            cap.enclosing_span = Some(node_span(node));
            // Interfaces extend other interfaces through extends_type_clause.
            let (extends, _) = heritage(node, source);
            cap.extends = extends;
            Some(cap)
        }
        "enum_declaration" => {
            let name_node = child_by_field(node, "name")?;
            let mut cap = DefCapture::new(
                DefKind::Enum,
                node_text(&name_node, source),
                node_span(&name_node),
            );
            cap.enclosing_span = Some(node_span(node));
            Some(cap)
        }
        "type_alias_declaration" => {
            let name_node = child_by_field(node, "name")?;
            Some(DefCapture::new(
                DefKind::TypeAlias,
                node_text(&name_node, source),
                node_span(&name_node),
            ))
        }
        "method_definition" => {
            let name_node = child_by_field(node, "name")?;
            let name = node_text(&name_node, source).to_string();
            let kind = if name == "constructor" {
                DefKind::Constructor
            } else {
                DefKind::Method
            };
            let mut cap = DefCapture::new(kind, name, node_span(&name_node));
            cap.enclosing_span = Some(node_span(node));
            cap.params = extract_params(node, source);
            cap.return_type = return_type_hint(node, source);
            Some(cap)
        }
        "method_signature" | "abstract_method_signature" => {
            let name_node = child_by_field(node, "name")?;
            let mut cap = DefCapture::new(
                DefKind::Method,
                node_text(&name_node, source),
                node_span(&name_node),
            );
            cap.return_type = return_type_hint(node, source);
            Some(cap)
        }
        "field_definition" | "public_field_definition" | "property_signature" => {
            let name_node =
                child_by_field(node, "property").or_else(|| child_by_field(node, "name"))?;
            Some(DefCapture::new(
                DefKind::Property,
                node_text(&name_node, source),
                node_span(&name_node),
            ))
        }
        "variable_declarator" => {
            let name_node = child_by_field(node, "name")?;
            if name_node.kind() != "identifier" {
                // Destructuring patterns are declared per-identifier below.
                return None;
            }
            let decl = node.parent()?;
            let kind = if decl.kind() == "lexical_declaration"
                && node_text(&decl, source).starts_with("const")
            {
                DefKind::Constant
            } else {
                DefKind::Variable
            };
            Some(DefCapture::new(
                kind,
                node_text(&name_node, source),
                node_span(&name_node),
            ))
        }
        "shorthand_property_identifier_pattern" => {
            // const { a, b } = expr; but not parameter destructuring,
            // which the enclosing callable already captured.
            let anchor = nearest_ancestor(
                node,
                &["variable_declarator", "formal_parameters"],
                6,
            )?;
            if anchor.kind() != "variable_declarator" {
                return None;
            }
            Some(DefCapture::new(
                DefKind::Variable,
                node_text(node, source),
                node_span(node),
            ))
        }
        _ => None,
    }
}

fn return_type_hint(node: &Node, source: &str) -> Option<String> {
    let rt = child_by_field(node, "return_type")?;
    let text = node_text(&rt, source).trim_start_matches(':').trim();
    // Strip generics and qualifiers down to the head identifier; the tracker
    // only follows class names.
    let head = text
        .split(|c: char| c == '<' || c == '|' || c == '&')
        .next()
        .unwrap_or(text)
        .trim();
    if head.is_empty() {
        None
    } else {
        Some(head.to_string())
    }
}

fn extract_params(node: &Node, source: &str) -> Vec<ParamCapture> {
    let mut params = Vec::new();
    let params_node = match child_by_field(node, "parameters") {
        Some(p) => p,
        None => {
            // Single-identifier arrow function.
            if let Some(p) = child_by_field(node, "parameter") {
                params.push(ParamCapture {
                    name: node_text(&p, source).to_string(),
                    span: node_span(&p),
                });
            }
            return params;
        }
    };

    for child in named_children(&params_node) {
        param_from_node(&child, source, &mut params);
    }
    params
}

fn param_from_node(node: &Node, source: &str, out: &mut Vec<ParamCapture>) {
    match node.kind() {
        "identifier" => out.push(ParamCapture {
            name: node_text(node, source).to_string(),
            span: node_span(node),
        }),
        // TypeScript wraps patterns; both carry a `pattern` field.
        "required_parameter" | "optional_parameter" => {
            if let Some(pattern) = child_by_field(node, "pattern") {
                param_from_node(&pattern, source, out);
            }
        }
        "assignment_pattern" => {
            if let Some(left) = child_by_field(node, "left") {
                param_from_node(&left, source, out);
            }
        }
        "rest_pattern" => {
            if let Some(inner) = find_child_by_kind(node, "identifier") {
                param_from_node(&inner, source, out);
            }
        }
        "object_pattern" | "array_pattern" => {
            for child in named_children(node) {
                match child.kind() {
                    "shorthand_property_identifier_pattern" | "identifier" => {
                        out.push(ParamCapture {
                            name: node_text(&child, source).to_string(),
                            span: node_span(&child),
                        })
                    }
                    "pair_pattern" => {
                        if let Some(value) = child_by_field(&child, "value") {
                            param_from_node(&value, source, out);
                        }
                    }
                    _ => {}
                }
            }
        }
        _ => {}
    }
}

/// Extends/implements names from a class-like node, tolerating both the
/// TypeScript and JavaScript heritage layouts.
fn heritage(node: &Node, source: &str) -> (Vec<String>, Vec<String>) {
    let mut extends = Vec::new();
    let mut implements = Vec::new();

    for child in named_children(node) {
        match child.kind() {
            "class_heritage" => {
                let mut saw_clause = false;
                for clause in named_children(&child) {
                    match clause.kind() {
                        "extends_clause" => {
                            saw_clause = true;
                            collect_type_names(&clause, source, &mut extends);
                        }
                        "implements_clause" => {
                            saw_clause = true;
                            collect_type_names(&clause, source, &mut implements);
                        }
                        _ => {}
                    }
                }
                if !saw_clause {
                    // JavaScript layout: expression directly under the
                    // heritage node.
                    collect_type_names(&child, source, &mut extends);
                }
            }
            "extends_type_clause" => {
                collect_type_names(&child, source, &mut extends);
            }
            _ => {}
        }
    }
    (extends, implements)
}

fn collect_type_names(node: &Node, source: &str, out: &mut Vec<String>) {
    for child in named_children(node) {
        match child.kind() {
            "identifier" | "type_identifier" => out.push(node_text(&child, source).to_string()),
            "generic_type" => {
                if let Some(name) = child_by_field(&child, "name") {
                    out.push(node_text(&name, source).to_string());
                }
            }
            "member_expression" | "nested_type_identifier" => {
                out.push(node_text(&child, source).to_string());
            }
            _ => {}
        }
    }
}

// ───────────────────────────────────────────────────────────────────────────
// L2: references
// ───────────────────────────────────────────────────────────────────────────

pub(crate) fn reference_capture(node: &Node, source: &str) -> Option<RefCapture> {
    match node.kind() {
        "identifier" => {
            let parent = node.parent()?;
            if is_declaration_name(node, &parent) {
                return None;
            }
            Some(RefCapture {
                name: node_text(node, source).to_string(),
                span: node_span(node),
                kind: RefKind::Identifier,
                receiver: None,
            })
        }
        "property_identifier" => {
            let parent = node.parent()?;
            if parent.kind() != "member_expression" {
                return None;
            }
            let property = child_by_field(&parent, "property")?;
            if property.id() != node.id() {
                return None;
            }
            let receiver = child_by_field(&parent, "object").and_then(|obj| {
                if obj.kind() == "identifier" {
                    Some(node_text(&obj, source).to_string())
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
        "type_identifier" => {
            let parent = node.parent()?;
            // Declared names are captured as definitions, not references.
            if child_by_field(&parent, "name")
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
        _ => None,
    }
}

fn is_declaration_name(node: &Node, parent: &Node) -> bool {
    let declares = matches!(
        parent.kind(),
        "function_declaration"
            | "generator_function_declaration"
            | "function_expression"
            | "function"
            | "class_declaration"
            | "abstract_class_declaration"
            | "method_definition"
            | "variable_declarator"
            | "interface_declaration"
            | "enum_declaration"
            | "type_alias_declaration"
    );
    if declares {
        if let Some(name) = child_by_field(parent, "name") {
            if name.id() == node.id() {
                return true;
            }
        }
    }
    // Parameter positions and destructuring targets declare, not reference.
    matches!(
        parent.kind(),
        "formal_parameters"
            | "required_parameter"
            | "optional_parameter"
            | "rest_pattern"
            | "object_pattern"
            | "array_pattern"
            | "pair_pattern"
    ) || (parent.kind() == "assignment_pattern"
        && child_by_field(parent, "left")
            .map(|l| l.id() == node.id())
            .unwrap_or(false))
        || (parent.kind() == "arrow_function"
            && child_by_field(parent, "parameter")
                .map(|p| p.id() == node.id())
                .unwrap_or(false))
        || (parent.kind() == "labeled_statement")
        || (parent.kind() == "pair"
            && child_by_field(parent, "key")
                .map(|k| k.id() == node.id())
                .unwrap_or(false))
}

// ───────────────────────────────────────────────────────────────────────────
// L2: imports
// ───────────────────────────────────────────────────────────────────────────

pub(crate) fn is_import_node(node: &Node, source: &str) -> bool {
    match node.kind() {
        "import_statement" => true,
        "variable_declarator" => require_call(node, source).is_some(),
        _ => false,
    }
}

fn require_call<'a>(declarator: &Node<'a>, source: &str) -> Option<Node<'a>> {
    let value = child_by_field(declarator, "value")?;
    if value.kind() != "call_expression" {
        return None;
    }
    let function = child_by_field(&value, "function")?;
    if function.kind() != "identifier" || node_text(&function, source) != "require" {
        return None;
    }
    Some(value)
}

pub(crate) fn import_captures(node: &Node, source: &str) -> Vec<ImportCapture> {
    match node.kind() {
        "import_statement" => import_statement_captures(node, source),
        "variable_declarator" => require_captures(node, source),
        _ => Vec::new(),
    }
}

fn import_statement_captures(node: &Node, source: &str) -> Vec<ImportCapture> {
    let mut captures = Vec::new();
    let source_path = match child_by_field(node, "source") {
        Some(s) => string_content(&s, source),
        None => return captures,
    };
    let span = node_span(node);

    let clause = match find_child_by_kind(node, "import_clause") {
        Some(c) => c,
        None => {
            captures.push(ImportCapture {
                local_name: String::new(),
                external_name: String::new(),
                source: source_path,
                kind: ImportKind::SideEffect,
                span,
            });
            return captures;
        }
    };

    for child in named_children(&clause) {
        match child.kind() {
            "identifier" => captures.push(ImportCapture {
                local_name: node_text(&child, source).to_string(),
                external_name: "default".to_string(),
                source: source_path.clone(),
                kind: ImportKind::Default,
                span,
            }),
            "namespace_import" => {
                if let Some(alias) = find_child_by_kind(&child, "identifier") {
                    captures.push(ImportCapture {
                        local_name: node_text(&alias, source).to_string(),
                        external_name: "*".to_string(),
                        source: source_path.clone(),
                        kind: ImportKind::Namespace,
                        span,
                    });
                }
            }
            "named_imports" => {
                for spec in named_children(&child) {
                    if spec.kind() != "import_specifier" {
                        continue;
                    }
                    let name = match child_by_field(&spec, "name") {
                        Some(n) => node_text(&n, source).to_string(),
                        None => continue,
                    };
                    let local = child_by_field(&spec, "alias")
                        .map(|a| node_text(&a, source).to_string())
                        .unwrap_or_else(|| name.clone());
                    captures.push(ImportCapture {
                        local_name: local,
                        external_name: name,
                        source: source_path.clone(),
                        kind: ImportKind::Named,
                        span: node_span(&spec),
                    });
                }
            }
            _ => {}
        }
    }
    captures
}

fn require_captures(declarator: &Node, source: &str) -> Vec<ImportCapture> {
    let mut captures = Vec::new();
    let call = match require_call(declarator, source) {
        Some(c) => c,
        None => return captures,
    };
    let args = match child_by_field(&call, "arguments") {
        Some(a) => a,
        None => return captures,
    };
    let module = match named_children(&args)
        .into_iter()
        .find(|a| a.kind() == "string")
    {
        Some(s) => string_content(&s, source),
        None => return captures,
    };
    let span = node_span(declarator);

    match child_by_field(declarator, "name") {
        Some(name) if name.kind() == "identifier" => captures.push(ImportCapture {
            local_name: node_text(&name, source).to_string(),
            external_name: "*".to_string(),
            source: module,
            kind: ImportKind::Namespace,
            span,
        }),
        Some(pattern) if pattern.kind() == "object_pattern" => {
            // const { a, b: c } = require('m')
            for child in named_children(&pattern) {
                match child.kind() {
                    "shorthand_property_identifier_pattern" => captures.push(ImportCapture {
                        local_name: node_text(&child, source).to_string(),
                        external_name: node_text(&child, source).to_string(),
                        source: module.clone(),
                        kind: ImportKind::Named,
                        span,
                    }),
                    "pair_pattern" => {
                        let key = child_by_field(&child, "key");
                        let value = child_by_field(&child, "value");
                        if let (Some(key), Some(value)) = (key, value) {
                            captures.push(ImportCapture {
                                local_name: node_text(&value, source).to_string(),
                                external_name: node_text(&key, source).to_string(),
                                source: module.clone(),
                                kind: ImportKind::Named,
                                span,
                            });
                        }
                    }
                    _ => {}
                }
            }
        }
        _ => {}
    }
    captures
}

// ───────────────────────────────────────────────────────────────────────────
// L2: exports
// ───────────────────────────────────────────────────────────────────────────

pub(crate) fn export_captures(root: &Node, source: &str) -> Vec<ExportCapture> {
    let mut captures = Vec::new();
    collect_exports(root, source, &mut captures);
    captures
}

fn collect_exports(node: &Node, source: &str, out: &mut Vec<ExportCapture>) {
    for child in named_children(node) {
        match child.kind() {
            "export_statement" => export_statement_captures(&child, source, out),
            "expression_statement" => commonjs_export_captures(&child, source, out),
            // Export statements only occur at module (or namespace) level;
            // no need to descend into bodies.
            _ => {}
        }
    }
}

fn export_statement_captures(node: &Node, source: &str, out: &mut Vec<ExportCapture>) {
    let span = node_span(node);
    let re_source = child_by_field(node, "source").map(|s| string_content(&s, source));
    let is_default = (0..node.child_count())
        .filter_map(|i| node.child(i))
        .any(|c| c.kind() == "default");

    // export * from './m'
    let has_star = (0..node.child_count())
        .filter_map(|i| node.child(i))
        .any(|c| c.kind() == "*" || c.kind() == "namespace_export");
    if has_star {
        if let Some(src) = re_source {
            out.push(ExportCapture {
                local_name: "*".to_string(),
                export_name: "*".to_string(),
                is_default: false,
                re_export_source: Some(src),
                span,
            });
        }
        return;
    }

    if let Some(decl) = child_by_field(node, "declaration") {
        for name in declared_names(&decl, source) {
            out.push(ExportCapture {
                local_name: name.clone(),
                export_name: if is_default {
                    "default".to_string()
                } else {
                    name
                },
                is_default,
                re_export_source: None,
                span,
            });
        }
        return;
    }

    if let Some(value) = child_by_field(node, "value") {
        // export default <expression>
        let local = if value.kind() == "identifier" {
            node_text(&value, source).to_string()
        } else {
            "<anonymous>".to_string()
        };
        out.push(ExportCapture {
            local_name: local,
            export_name: "default".to_string(),
            is_default: true,
            re_export_source: None,
            span,
        });
        return;
    }

    if let Some(clause) = find_child_by_kind(node, "export_clause") {
        for spec in named_children(&clause) {
            if spec.kind() != "export_specifier" {
                continue;
            }
            let name = match child_by_field(&spec, "name") {
                Some(n) => node_text(&n, source).to_string(),
                None => continue,
            };
            let export_name = child_by_field(&spec, "alias")
                .map(|a| node_text(&a, source).to_string())
                .unwrap_or_else(|| name.clone());
            out.push(ExportCapture {
                local_name: name,
                export_name,
                is_default: false,
                re_export_source: re_source.clone(),
                span: node_span(&spec),
            });
        }
    }
}

fn declared_names(decl: &Node, source: &str) -> Vec<String> {
    match decl.kind() {
        "function_declaration"
        | "generator_function_declaration"
        | "class_declaration"
        | "abstract_class_declaration"
        | "interface_declaration"
        | "enum_declaration"
        | "type_alias_declaration" => child_by_field(decl, "name")
            .map(|n| vec![node_text(&n, source).to_string()])
            .unwrap_or_default(),
        "lexical_declaration" | "variable_declaration" => named_children(decl)
            .into_iter()
            .filter(|c| c.kind() == "variable_declarator")
            .filter_map(|d| child_by_field(&d, "name"))
            .filter(|n| n.kind() == "identifier")
            .map(|n| node_text(&n, source).to_string())
            .collect(),
        _ => Vec::new(),
    }
}

fn commonjs_export_captures(stmt: &Node, source: &str, out: &mut Vec<ExportCapture>) {
    let assignment = match named_children(stmt)
        .into_iter()
        .find(|c| c.kind() == "assignment_expression")
    {
        Some(a) => a,
        None => return,
    };
    let left = match child_by_field(&assignment, "left") {
        Some(l) if l.kind() == "member_expression" => l,
        _ => return,
    };
    let object = child_by_field(&left, "object").map(|o| node_text(&o, source).to_string());
    let property = child_by_field(&left, "property").map(|p| node_text(&p, source).to_string());
    let right = child_by_field(&assignment, "right");
    let local = right
        .filter(|r| r.kind() == "identifier")
        .map(|r| node_text(&r, source).to_string());
    let span = node_span(stmt);

    match (object.as_deref(), property) {
        (Some("module"), Some(p)) if p == "exports" => out.push(ExportCapture {
            local_name: local.unwrap_or_else(|| "<anonymous>".to_string()),
            export_name: "default".to_string(),
            is_default: true,
            re_export_source: None,
            span,
        }),
        (Some("exports"), Some(p)) => out.push(ExportCapture {
            local_name: local.unwrap_or_else(|| p.clone()),
            export_name: p,
            is_default: false,
            re_export_source: None,
            span,
        }),
        _ => {}
    }
}

// ───────────────────────────────────────────────────────────────────────────
// L4: calls
// ───────────────────────────────────────────────────────────────────────────

pub(crate) fn call_capture(node: &Node, source: &str) -> Option<CallCapture> {
    match node.kind() {
        "call_expression" => {
            let function = child_by_field(node, "function")?;
            match function.kind() {
                "identifier" => Some(CallCapture {
                    callee_name: node_text(&function, source).to_string(),
                    callee_span: node_span(&function),
                    receiver: None,
                    kind: CallKind::Direct,
                }),
                "member_expression" => {
                    let property = child_by_field(&function, "property")?;
                    let object = child_by_field(&function, "object")?;
                    Some(CallCapture {
                        callee_name: node_text(&property, source).to_string(),
                        callee_span: node_span(&property),
                        receiver: Some(receiver_of_expression(&object, source)),
                        kind: CallKind::Method,
                    })
                }
                _ => None,
            }
        }
        "new_expression" => {
            let ctor = child_by_field(node, "constructor")?;
            let name = match ctor.kind() {
                "identifier" => node_text(&ctor, source).to_string(),
                "member_expression" => child_by_field(&ctor, "property")
                    .map(|p| node_text(&p, source).to_string())?,
                _ => return None,
            };
            Some(CallCapture {
                callee_name: name,
                callee_span: node_span(&ctor),
                receiver: None,
                kind: CallKind::Constructor,
            })
        }
        _ => None,
    }
}

pub(crate) fn assignment_target(node: &Node, source: &str) -> Option<(String, Span)> {
    let ancestor = nearest_ancestor(node, &["variable_declarator", "assignment_expression"], 3)?;
    let target = match ancestor.kind() {
        "variable_declarator" => child_by_field(&ancestor, "name")?,
        _ => child_by_field(&ancestor, "left")?,
    };
    if target.kind() != "identifier" {
        return None;
    }
    Some((node_text(&target, source).to_string(), node_span(&target)))
}

/// JS hoisting: function declarations and `var` hoist to the enclosing
/// function scope; `let`, `const`, and class declarations do not.
pub(crate) fn is_hoisted(kind: DefKind, decl_node: &Node, source: &str) -> bool {
    match kind {
        DefKind::Function => matches!(
            decl_node.kind(),
            "function_declaration" | "generator_function_declaration"
        ),
        DefKind::Variable => decl_node
            .parent()
            .map(|p| p.kind() == "variable_declaration" && node_text(&p, source).starts_with("var"))
            .unwrap_or(false),
        _ => false,
    }
}
