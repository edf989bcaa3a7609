//! JavaScript language policy
//!
//! Delegates to the shared ECMAScript extraction; owns the JS builtin table
//! and the hoisting asymmetry (function declarations and `var` hoist, class
//! declarations do not).

use once_cell::sync::Lazy;
use std::collections::HashSet;
use tree_sitter::Node;

use super::ecma;
use super::policy::{
    CallCapture, DefCapture, ExportCapture, ImportCapture, LanguagePolicy, RefCapture,
    ScopeCapture,
};
use super::Language;
use crate::shared::models::{DefKind, Span};

static BUILTINS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "console",
        "Math",
        "JSON",
        "Object",
        "Array",
        "String",
        "Number",
        "Boolean",
        "Symbol",
        "BigInt",
        "Promise",
        "Map",
        "Set",
        "WeakMap",
        "WeakSet",
        "Error",
        "TypeError",
        "RangeError",
        "SyntaxError",
        "Date",
        "RegExp",
        "Proxy",
        "Reflect",
        "Function",
        "parseInt",
        "parseFloat",
        "isNaN",
        "isFinite",
        "encodeURIComponent",
        "decodeURIComponent",
        "structuredClone",
        "setTimeout",
        "setInterval",
        "clearTimeout",
        "clearInterval",
        "queueMicrotask",
        "fetch",
        "URL",
        "URLSearchParams",
        "TextEncoder",
        "TextDecoder",
        "AbortController",
        "require",
        "module",
        "exports",
        "process",
        "globalThis",
        "window",
        "document",
        "undefined",
        "NaN",
        "Infinity",
    ]
    .into_iter()
    .collect()
});

pub struct JavascriptPolicy;

impl LanguagePolicy for JavascriptPolicy {
    fn language(&self) -> Language {
        Language::Javascript
    }

    fn scope_capture(&self, node: &Node, source: &str) -> Option<ScopeCapture> {
        ecma::scope_capture(node, source)
    }

    fn definition_capture(&self, node: &Node, source: &str) -> Option<DefCapture> {
        ecma::definition_capture(node, source)
    }

    fn reference_capture(&self, node: &Node, source: &str) -> Option<RefCapture> {
        ecma::reference_capture(node, source)
    }

    fn is_import_node(&self, node: &Node, source: &str) -> bool {
        ecma::is_import_node(node, source)
    }

    fn import_captures(&self, node: &Node, source: &str) -> Vec<ImportCapture> {
        ecma::import_captures(node, source)
    }

    fn export_captures(&self, root: &Node, source: &str) -> Vec<ExportCapture> {
        ecma::export_captures(root, source)
    }

    fn call_capture(&self, node: &Node, source: &str) -> Option<CallCapture> {
        ecma::call_capture(node, source)
    }

    fn assignment_target(&self, node: &Node, source: &str) -> Option<(String, Span)> {
        ecma::assignment_target(node, source)
    }

    fn is_hoisted(&self, kind: DefKind, decl_node: &Node, source: &str) -> bool {
        ecma::is_hoisted(kind, decl_node, source)
    }

    fn builtins(&self) -> &'static HashSet<&'static str> {
        &BUILTINS
    }
}
