//! Python language policy

use once_cell::sync::Lazy;
use std::collections::HashSet;
use tree_sitter::Node;

use super::policy::{
    nearest_ancestor, receiver_of_expression, span_from_field, CallCapture, DefCapture,
    ImportCapture, LanguagePolicy, ParamCapture, RefCapture, ScopeCapture,
};
use super::Language;
use crate::shared::models::{
    CallKind, DefKind, ImportKind, Point, Receiver, RefKind, ScopeKind, Span, SymbolId,
};
use crate::shared::utils::tree_sitter::{
    child_by_field, named_children, node_span, node_text,
};

static BUILTINS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "print", "len", "range", "int", "str", "float", "bool", "bytes", "list", "dict", "set",
        "tuple", "frozenset", "type", "isinstance", "issubclass", "super", "object", "Exception",
        "BaseException", "ValueError", "TypeError", "KeyError", "IndexError", "AttributeError",
        "RuntimeError", "NotImplementedError", "StopIteration", "FileNotFoundError", "OSError",
        "open", "input", "enumerate", "zip", "map", "filter", "sorted", "reversed", "sum", "min",
        "max", "abs", "round", "divmod", "pow", "any", "all", "hasattr", "getattr", "setattr",
        "delattr", "callable", "repr", "format", "ord", "chr", "hex", "oct", "bin", "id", "hash",
        "iter", "next", "vars", "dir", "locals", "globals", "staticmethod", "classmethod",
        "property", "slice", "memoryview", "complex", "exec", "eval", "compile", "__import__",
    ]
    .into_iter()
    .collect()
});

/// Nearest enclosing definition kind, used to classify functions as methods.
fn enclosing_class<'a>(node: &Node<'a>) -> Option<Node<'a>> {
    let mut current = node.parent();
    while let Some(n) = current {
        match n.kind() {
            "class_definition" => return Some(n),
            "function_definition" | "lambda" | "module" => return None,
            _ => current = n.parent(),
        }
    }
    None
}

fn function_def_kind(node: &Node, name: &str) -> DefKind {
    if enclosing_class(node).is_some() {
        if name == "__init__" {
            DefKind::Constructor
        } else {
            DefKind::Method
        }
    } else {
        DefKind::Function
    }
}

/// Whether an assignment sits directly in a class body (a field) rather than
/// in a function or at module level.
fn in_class_body(node: &Node) -> bool {
    let mut current = node.parent();
    while let Some(n) = current {
        match n.kind() {
            "class_definition" => return true,
            "function_definition" | "lambda" | "module" => return false,
            _ => current = n.parent(),
        }
    }
    false
}

fn extract_params(node: &Node, source: &str) -> Vec<ParamCapture> {
    let mut params = Vec::new();
    let params_node = match child_by_field(node, "parameters") {
        Some(p) => p,
        None => return params,
    };
    for child in named_children(&params_node) {
        match child.kind() {
            "identifier" => params.push(ParamCapture {
                name: node_text(&child, source).to_string(),
                span: node_span(&child),
            }),
            "typed_parameter" => {
                if let Some(id) = named_children(&child)
                    .into_iter()
                    .find(|c| c.kind() == "identifier")
                {
                    params.push(ParamCapture {
                        name: node_text(&id, source).to_string(),
                        span: node_span(&id),
                    });
                }
            }
            "default_parameter" | "typed_default_parameter" => {
                if let Some(name) = child_by_field(&child, "name") {
                    params.push(ParamCapture {
                        name: node_text(&name, source).to_string(),
                        span: node_span(&name),
                    });
                }
            }
            "list_splat_pattern" | "dictionary_splat_pattern" => {
                if let Some(id) = named_children(&child)
                    .into_iter()
                    .find(|c| c.kind() == "identifier")
                {
                    params.push(ParamCapture {
                        name: node_text(&id, source).to_string(),
                        span: node_span(&id),
                    });
                }
            }
            _ => {}
        }
    }
    params
}

fn superclass_names(node: &Node, source: &str) -> Vec<String> {
    let mut names = Vec::new();
    if let Some(args) = child_by_field(node, "superclasses") {
        for arg in named_children(&args) {
            match arg.kind() {
                "identifier" | "attribute" => names.push(node_text(&arg, source).to_string()),
                _ => {}
            }
        }
    }
    names
}

/// Python has no const keyword; the conventional all-caps module constant is
/// tagged as one.
fn variable_kind(name: &str) -> DefKind {
    let has_alpha = name.chars().any(|c| c.is_ascii_alphabetic());
    if has_alpha && name.chars().all(|c| !c.is_ascii_lowercase()) {
        DefKind::Constant
    } else {
        DefKind::Variable
    }
}

fn binding_def(id: &Node, anchor: &Node, source: &str) -> DefCapture {
    let name = node_text(id, source).to_string();
    let kind = if in_class_body(anchor) {
        DefKind::Field
    } else {
        variable_kind(&name)
    };
    DefCapture::new(kind, name, node_span(id))
}

pub struct PythonPolicy;

impl LanguagePolicy for PythonPolicy {
    fn language(&self) -> Language {
        Language::Python
    }

    fn scope_capture(&self, node: &Node, source: &str) -> Option<ScopeCapture> {
        match node.kind() {
            "module" => Some(ScopeCapture {
                kind: ScopeKind::Module,
                span: node_span(node),
                name: None,
            }),
            "function_definition" => {
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
            "lambda" => Some(ScopeCapture {
                kind: ScopeKind::Function,
                span: node_span(node),
                name: None,
            }),
            "class_definition" => {
                // Class body scope begins at the colon delimiter, not at the
                // first statement.
                let full = node_span(node);
                let span = (0..node.child_count())
                    .filter_map(|i| node.child(i))
                    .find(|c| c.kind() == ":")
                    .map(|colon| {
                        let c = node_span(&colon);
                        Span::new(c.start_byte, full.end_byte, c.start, full.end)
                    })
                    .unwrap_or_else(|| {
                        child_by_field(node, "body")
                            .map(|b| node_span(&b))
                            .unwrap_or(full)
                    });
                Some(ScopeCapture {
                    kind: ScopeKind::Class,
                    span,
                    name: child_by_field(node, "name")
                        .map(|n| node_text(&n, source).to_string()),
                })
            }
            _ => None,
        }
    }

    fn definition_capture(&self, node: &Node, source: &str) -> Option<DefCapture> {
        match node.kind() {
            "function_definition" => {
                let name_node = child_by_field(node, "name")?;
                let name = node_text(&name_node, source).to_string();
                let kind = function_def_kind(node, &name);
                let mut cap = DefCapture::new(kind, name, node_span(&name_node));
                cap.enclosing_span = Some(node_span(node));
                cap.params = extract_params(node, source);
                cap.return_type = child_by_field(node, "return_type")
                    .map(|rt| node_text(&rt, source).trim().to_string());
                Some(cap)
            }
            "class_definition" => {
                let name_node = child_by_field(node, "name")?;
                let mut cap = DefCapture::new(
                    DefKind::Class,
                    node_text(&name_node, source),
                    node_span(&name_node),
                );
                cap.enclosing_span = Some(node_span(node));
                cap.extends = superclass_names(node, source);
                Some(cap)
            }
            "lambda" => {
                let start = node_span(node).start;
                let mut cap = DefCapture::new(
                    DefKind::Function,
                    SymbolId::anonymous_segment(Point::new(start.row, start.column)),
                    node_span(node),
                );
                cap.params = extract_params(node, source);
                Some(cap)
            }
            "assignment" => {
                let left = child_by_field(node, "left")?;
                if left.kind() != "identifier" {
                    // Tuple targets are captured at their identifier nodes.
                    return None;
                }
                Some(binding_def(&left, node, source))
            }
            "identifier" => {
                // a, b = expr: each target identifier declares a binding.
                let parent = node.parent()?;
                if !matches!(parent.kind(), "pattern_list" | "tuple_pattern") {
                    return None;
                }
                let assignment = parent.parent()?;
                if assignment.kind() != "assignment"
                    || child_by_field(&assignment, "left")
                        .map(|l| l.id() != parent.id())
                        .unwrap_or(true)
                {
                    return None;
                }
                Some(binding_def(node, &assignment, source))
            }
            "for_statement" => {
                let left = child_by_field(node, "left")?;
                if left.kind() != "identifier" {
                    return None;
                }
                Some(DefCapture::new(
                    DefKind::Variable,
                    node_text(&left, source),
                    node_span(&left),
                ))
            }
            _ => None,
        }
    }

    fn reference_capture(&self, node: &Node, source: &str) -> Option<RefCapture> {
        match node.kind() {
            "identifier" => {
                let parent = node.parent()?;
                match parent.kind() {
                    "function_definition" | "class_definition" => {
                        if child_by_field(&parent, "name")
                            .map(|n| n.id() == node.id())
                            .unwrap_or(false)
                        {
                            return None;
                        }
                    }
                    "parameters"
                    | "typed_parameter"
                    | "default_parameter"
                    | "typed_default_parameter"
                    | "lambda_parameters"
                    | "list_splat_pattern"
                    | "dictionary_splat_pattern"
                    | "global_statement"
                    | "nonlocal_statement" => return None,
                    "keyword_argument" => {
                        if child_by_field(&parent, "name")
                            .map(|n| n.id() == node.id())
                            .unwrap_or(false)
                        {
                            return None;
                        }
                    }
                    "assignment" => {
                        if child_by_field(&parent, "left")
                            .map(|l| l.id() == node.id())
                            .unwrap_or(false)
                        {
                            return None;
                        }
                    }
                    "pattern_list" | "tuple_pattern" => return None,
                    "for_statement" => {
                        if child_by_field(&parent, "left")
                            .map(|l| l.id() == node.id())
                            .unwrap_or(false)
                        {
                            return None;
                        }
                    }
                    "attribute" => {
                        // Object side is a reference; attribute side is a
                        // member reference captured below.
                        if child_by_field(&parent, "attribute")
                            .map(|a| a.id() == node.id())
                            .unwrap_or(false)
                        {
                            let receiver =
                                child_by_field(&parent, "object").and_then(|obj| {
                                    if obj.kind() == "identifier" {
                                        Some(node_text(&obj, source).to_string())
                                    } else {
                                        None
                                    }
                                });
                            return Some(RefCapture {
                                name: node_text(node, source).to_string(),
                                span: node_span(node),
                                kind: RefKind::Member,
                                receiver,
                            });
                        }
                    }
                    _ => {}
                }
                Some(RefCapture {
                    name: node_text(node, source).to_string(),
                    span: node_span(node),
                    kind: RefKind::Identifier,
                    receiver: None,
                })
            }
            _ => None,
        }
    }

    fn is_import_node(&self, node: &Node, _source: &str) -> bool {
        matches!(
            node.kind(),
            "import_statement" | "import_from_statement" | "future_import_statement"
        )
    }

    fn import_captures(&self, node: &Node, source: &str) -> Vec<ImportCapture> {
        let mut captures = Vec::new();
        let span = node_span(node);
        match node.kind() {
            "import_statement" => {
                for child in named_children(node) {
                    match child.kind() {
                        "dotted_name" => {
                            let dotted = node_text(&child, source).to_string();
                            // `import a.b` binds the top-level package name.
                            let local = dotted.split('.').next().unwrap_or(&dotted).to_string();
                            captures.push(ImportCapture {
                                local_name: local,
                                external_name: "*".to_string(),
                                source: dotted,
                                kind: ImportKind::Namespace,
                                span,
                            });
                        }
                        "aliased_import" => {
                            let name = child_by_field(&child, "name")
                                .map(|n| node_text(&n, source).to_string())
                                .unwrap_or_default();
                            let alias = child_by_field(&child, "alias")
                                .map(|a| node_text(&a, source).to_string())
                                .unwrap_or_else(|| name.clone());
                            captures.push(ImportCapture {
                                local_name: alias,
                                external_name: "*".to_string(),
                                source: name,
                                kind: ImportKind::Namespace,
                                span,
                            });
                        }
                        _ => {}
                    }
                }
            }
            "import_from_statement" => {
                let module = child_by_field(node, "module_name")
                    .map(|m| node_text(&m, source).to_string())
                    .unwrap_or_default();
                let module_node_id = child_by_field(node, "module_name").map(|m| m.id());
                for child in named_children(node) {
                    if Some(child.id()) == module_node_id {
                        continue;
                    }
                    match child.kind() {
                        "dotted_name" => {
                            let name = node_text(&child, source).to_string();
                            captures.push(ImportCapture {
                                local_name: name.clone(),
                                external_name: name,
                                source: module.clone(),
                                kind: ImportKind::Named,
                                span: node_span(&child),
                            });
                        }
                        "aliased_import" => {
                            let name = child_by_field(&child, "name")
                                .map(|n| node_text(&n, source).to_string())
                                .unwrap_or_default();
                            let alias = child_by_field(&child, "alias")
                                .map(|a| node_text(&a, source).to_string())
                                .unwrap_or_else(|| name.clone());
                            captures.push(ImportCapture {
                                local_name: alias,
                                external_name: name,
                                source: module.clone(),
                                kind: ImportKind::Named,
                                span: node_span(&child),
                            });
                        }
                        "wildcard_import" => captures.push(ImportCapture {
                            local_name: "*".to_string(),
                            external_name: "*".to_string(),
                            source: module.clone(),
                            kind: ImportKind::Glob,
                            span,
                        }),
                        _ => {}
                    }
                }
            }
            _ => {}
        }
        captures
    }

    fn is_implicitly_exported(&self, def: &DefCapture) -> bool {
        // Underscore-prefixed names (dunders included) are private by
        // convention and excluded from the export surface.
        !def.name.starts_with('_')
    }

    fn call_capture(&self, node: &Node, source: &str) -> Option<CallCapture> {
        if node.kind() != "call" {
            return None;
        }
        let function = child_by_field(node, "function")?;
        match function.kind() {
            "identifier" => {
                let name = node_text(&function, source).to_string();
                let kind = if name.chars().next().map(|c| c.is_ascii_uppercase()) == Some(true) {
                    CallKind::Constructor
                } else {
                    CallKind::Direct
                };
                Some(CallCapture {
                    callee_name: name,
                    callee_span: node_span(&function),
                    receiver: None,
                    kind,
                })
            }
            "attribute" => {
                let attr = child_by_field(&function, "attribute")?;
                let object = child_by_field(&function, "object")?;
                let receiver = match receiver_of_expression(&object, source) {
                    Receiver::Identifier(name) if name == "self" || name == "cls" => {
                        Receiver::SelfReceiver
                    }
                    other => other,
                };
                Some(CallCapture {
                    callee_name: node_text(&attr, source).to_string(),
                    callee_span: node_span(&attr),
                    receiver: Some(receiver),
                    kind: CallKind::Method,
                })
            }
            _ => None,
        }
    }

    fn assignment_target(&self, node: &Node, source: &str) -> Option<(String, Span)> {
        let assignment = nearest_ancestor(node, &["assignment"], 3)?;
        let left = child_by_field(&assignment, "left")?;
        if left.kind() != "identifier" {
            return None;
        }
        Some((node_text(&left, source).to_string(), node_span(&left)))
    }

    fn builtins(&self) -> &'static HashSet<&'static str> {
        &BUILTINS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::utils::tree_sitter::walk_tree;
    use tree_sitter::Parser;

    fn parse(code: &str) -> tree_sitter::Tree {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_python::language())
            .unwrap();
        parser.parse(code, None).unwrap()
    }

    fn definitions(code: &str) -> Vec<(String, DefKind)> {
        let tree = parse(code);
        let mut defs = Vec::new();
        walk_tree(tree.root_node(), &mut |node| {
            if let Some(cap) = PythonPolicy.definition_capture(&node, code) {
                defs.push((cap.name.clone(), cap.kind));
            }
        });
        defs
    }

    #[test]
    fn test_method_vs_function() {
        let defs = definitions("class C:\n    def f(self): pass\n\ndef g(): pass\n");
        assert!(defs.contains(&("f".to_string(), DefKind::Method)));
        assert!(defs.contains(&("g".to_string(), DefKind::Function)));
    }

    #[test]
    fn test_dunder_init_is_constructor() {
        let defs = definitions("class C:\n    def __init__(self): pass\n");
        assert!(defs.contains(&("__init__".to_string(), DefKind::Constructor)));
    }

    #[test]
    fn test_class_body_scope_starts_at_colon() {
        let code = "class C(Base):\n    x = 1\n";
        let tree = parse(code);
        let class = tree.root_node().child(0).unwrap();

        let cap = PythonPolicy.scope_capture(&class, code).unwrap();
        assert_eq!(cap.kind, ScopeKind::Class);
        assert_eq!(cap.span.start_byte as usize, code.find(':').unwrap());
    }

    #[test]
    fn test_superclasses() {
        let defs_code = "class D(L, R): pass\n";
        let tree = parse(defs_code);
        let class = tree.root_node().child(0).unwrap();
        let cap = PythonPolicy.definition_capture(&class, defs_code).unwrap();
        assert_eq!(cap.extends, vec!["L".to_string(), "R".to_string()]);
    }

    #[test]
    fn test_import_forms() {
        let code = "import os.path\nimport numpy as np\nfrom lib import C\nfrom ..pkg import helper as h\nfrom x import *\n";
        let tree = parse(code);
        let mut captures = Vec::new();
        walk_tree(tree.root_node(), &mut |node| {
            if PythonPolicy.is_import_node(&node, code) {
                captures.extend(PythonPolicy.import_captures(&node, code));
            }
        });

        let os = captures.iter().find(|c| c.local_name == "os").unwrap();
        assert_eq!(os.source, "os.path");
        assert_eq!(os.kind, ImportKind::Namespace);

        let np = captures.iter().find(|c| c.local_name == "np").unwrap();
        assert_eq!(np.source, "numpy");

        let c = captures.iter().find(|c| c.local_name == "C").unwrap();
        assert_eq!(c.kind, ImportKind::Named);
        assert_eq!(c.source, "lib");

        let h = captures.iter().find(|c| c.local_name == "h").unwrap();
        assert_eq!(h.external_name, "helper");
        assert_eq!(h.source, "..pkg");

        assert!(captures.iter().any(|c| c.kind == ImportKind::Glob));
    }

    #[test]
    fn test_capitalized_call_is_constructor() {
        let code = "c = C()\nd = helper()\n";
        let tree = parse(code);
        let mut captures = Vec::new();
        walk_tree(tree.root_node(), &mut |node| {
            if let Some(cap) = PythonPolicy.call_capture(&node, code) {
                captures.push(cap);
            }
        });

        let ctor = captures.iter().find(|c| c.callee_name == "C").unwrap();
        assert_eq!(ctor.kind, CallKind::Constructor);
        let call = captures.iter().find(|c| c.callee_name == "helper").unwrap();
        assert_eq!(call.kind, CallKind::Direct);
    }

    #[test]
    fn test_self_method_receiver() {
        let code = "class C:\n    def f(self):\n        self.g()\n";
        let tree = parse(code);
        let mut captures = Vec::new();
        walk_tree(tree.root_node(), &mut |node| {
            if let Some(cap) = PythonPolicy.call_capture(&node, code) {
                captures.push(cap);
            }
        });

        assert_eq!(captures.len(), 1);
        assert_eq!(captures[0].receiver, Some(Receiver::SelfReceiver));
    }

    #[test]
    fn test_underscore_names_not_exported() {
        let make = |name: &str| DefCapture::new(DefKind::Function, name, Span::zero());
        assert!(PythonPolicy.is_implicitly_exported(&make("helper")));
        assert!(!PythonPolicy.is_implicitly_exported(&make("_internal")));
        assert!(!PythonPolicy.is_implicitly_exported(&make("__init__")));
    }

    #[test]
    fn test_constant_heuristic() {
        let defs = definitions("MAX_SIZE = 10\ncount = 0\n");
        assert!(defs.contains(&("MAX_SIZE".to_string(), DefKind::Constant)));
        assert!(defs.contains(&("count".to_string(), DefKind::Variable)));
    }

    #[test]
    fn test_assignment_target_for_seeding() {
        let code = "c = C()\n";
        let tree = parse(code);
        let mut target = None;
        walk_tree(tree.root_node(), &mut |node| {
            if node.kind() == "call" {
                target = PythonPolicy.assignment_target(&node, code);
            }
        });
        assert_eq!(target.map(|t| t.0), Some("c".to_string()));
    }
}
