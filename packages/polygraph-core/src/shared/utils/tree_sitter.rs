//! Tree-sitter node utilities
//!
//! Common helpers for walking concrete syntax trees, shared by every
//! language policy.

use tree_sitter::Node;

use crate::shared::models::{Point, Span};

/// Convert a tree-sitter node to a `Span` (zero-based tree-sitter frame).
#[inline]
pub fn node_span(node: &Node) -> Span {
    let start = node.start_position();
    let end = node.end_position();
    Span::new(
        node.start_byte() as u32,
        node.end_byte() as u32,
        Point::new(start.row as u32, start.column as u32),
        Point::new(end.row as u32, end.column as u32),
    )
}

/// Start point of a node.
#[inline]
pub fn node_point(node: &Node) -> Point {
    let start = node.start_position();
    Point::new(start.row as u32, start.column as u32)
}

/// Text content of a node.
#[inline]
pub fn node_text<'a>(node: &Node, source: &'a str) -> &'a str {
    source.get(node.byte_range()).unwrap_or("")
}

/// Find a direct child node by kind.
#[inline]
pub fn find_child_by_kind<'a>(node: &Node<'a>, kind: &str) -> Option<Node<'a>> {
    let mut cursor = node.walk();
    let found = node.children(&mut cursor).find(|c| c.kind() == kind);
    found
}

/// Find all direct children by kind.
pub fn find_children_by_kind<'a>(node: &Node<'a>, kind: &str) -> Vec<Node<'a>> {
    let mut cursor = node.walk();
    node.children(&mut cursor)
        .filter(|c| c.kind() == kind)
        .collect()
}

/// All named direct children.
pub fn named_children<'a>(node: &Node<'a>) -> Vec<Node<'a>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor).collect()
}

/// Field accessor that tolerates grammars omitting the field.
#[inline]
pub fn child_by_field<'a>(node: &Node<'a>, field: &str) -> Option<Node<'a>> {
    node.child_by_field_name(field)
}

/// Name text via the `name` field, the common case across grammars.
#[inline]
pub fn name_of(node: &Node, source: &str) -> Option<String> {
    child_by_field(node, "name").map(|n| node_text(&n, source).to_string())
}

/// Whether the subtree below `node` contains an error or missing node.
pub fn has_parse_errors(node: &Node) -> bool {
    if node.has_error() || node.is_missing() {
        return true;
    }
    false
}

/// Walk every node in the tree, pre-order, calling `visit` on each.
pub fn walk_tree<'a, F: FnMut(Node<'a>)>(root: Node<'a>, visit: &mut F) {
    let mut cursor = root.walk();
    let mut done = false;
    while !done {
        visit(cursor.node());
        if cursor.goto_first_child() {
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                done = true;
                break;
            }
        }
    }
}
