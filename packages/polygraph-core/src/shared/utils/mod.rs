//! Shared utilities

pub mod scope_path;
pub mod tree_sitter;
