//! Symbol identifiers
//!
//! Globally unique, human-readable IDs:
//!
//! ```text
//! symbol   ::= file '#' path '#' name [':' kind_tag]
//! path     ::= segment ('/' segment)*
//! builtin  ::= 'builtin:' language ':' identifier
//! ```
//!
//! When the scope path is empty the two separators collapse to one, so a
//! top-level function in `ops.ts` is `ops.ts#add` and the module symbol is
//! `ops.ts#<module>`. Anonymous entities encode their declaration point as
//! `<anon:row:col>` in place of a name.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::span::Point;

/// Name used for the per-file module symbol.
pub const MODULE_NAME: &str = "<module>";

/// File path used for synthetic definitions of unresolvable callees.
pub const BUILTIN_FILE: &str = "<builtin>";

/// Globally unique symbol identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SymbolId(String);

impl SymbolId {
    /// Mint an ID for a declared entity.
    ///
    /// `scope_path` is the `/`-joined chain of enclosing named scopes, empty
    /// for top-level declarations. `kind_tag` disambiguates kinds that may
    /// share a name with a callable in the same scope.
    pub fn local(file: &str, scope_path: &str, name: &str, kind_tag: Option<&str>) -> Self {
        let mut id = String::with_capacity(file.len() + scope_path.len() + name.len() + 8);
        id.push_str(file);
        id.push('#');
        if !scope_path.is_empty() {
            id.push_str(scope_path);
            id.push('#');
        }
        id.push_str(name);
        if let Some(tag) = kind_tag {
            id.push(':');
            id.push_str(tag);
        }
        Self(id)
    }

    /// The module symbol for a file.
    pub fn module(file: &str) -> Self {
        Self::local(file, "", MODULE_NAME, None)
    }

    /// Stable synthetic ID for a language built-in.
    pub fn builtin(language: &str, name: &str) -> Self {
        Self(format!("builtin:{}:{}", language, name))
    }

    /// Synthetic callee for an unresolved call target; keeps the edge alive.
    pub fn synthetic(name: &str) -> Self {
        Self::local(BUILTIN_FILE, "", name, None)
    }

    /// `<anon:row:col>` segment for anonymous entities.
    pub fn anonymous_segment(point: Point) -> String {
        format!("<anon:{}:{}>", point.row, point.column)
    }

    pub fn is_builtin(&self) -> bool {
        self.0.starts_with("builtin:")
    }

    pub fn is_synthetic(&self) -> bool {
        self.0.starts_with(BUILTIN_FILE)
    }

    /// File component, `None` for builtins.
    pub fn file(&self) -> Option<&str> {
        if self.is_builtin() {
            return None;
        }
        self.0.split('#').next()
    }

    /// Trailing name component with any kind tag stripped. Builtin IDs
    /// report their identifier, not the `builtin:` prefix.
    pub fn name(&self) -> &str {
        if self.is_builtin() {
            return self.0.rsplit(':').next().unwrap_or(&self.0);
        }
        let tail = self.0.rsplit('#').next().unwrap_or(&self.0);
        // Anonymous names contain ':' internally, so only strip a tag that
        // follows the closing '>'.
        if tail.starts_with('<') {
            match tail.rfind(">:") {
                Some(idx) => &tail[..=idx],
                None => tail,
            }
        } else {
            tail.split(':').next().unwrap_or(tail)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<SymbolId> for String {
    fn from(id: SymbolId) -> String {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_top_level_collapses_path() {
        let id = SymbolId::local("ops.ts", "", "add", None);
        assert_eq!(id.as_str(), "ops.ts#add");
    }

    #[test]
    fn test_nested_path() {
        let id = SymbolId::local("lib.py", "C", "f", None);
        assert_eq!(id.as_str(), "lib.py#C#f");
        assert_eq!(id.file(), Some("lib.py"));
        assert_eq!(id.name(), "f");
    }

    #[test]
    fn test_kind_tag() {
        let id = SymbolId::local("a.js", "", "A", Some("class"));
        assert_eq!(id.as_str(), "a.js#A:class");
        assert_eq!(id.name(), "A");
    }

    #[test]
    fn test_module_symbol() {
        assert_eq!(SymbolId::module("main.py").as_str(), "main.py#<module>");
    }

    #[test]
    fn test_builtin() {
        let id = SymbolId::builtin("python", "print");
        assert_eq!(id.as_str(), "builtin:python:print");
        assert!(id.is_builtin());
        assert_eq!(id.file(), None);
        assert_eq!(id.name(), "print");
    }

    #[test]
    fn test_anonymous_segment() {
        let seg = SymbolId::anonymous_segment(Point::new(3, 12));
        assert_eq!(seg, "<anon:3:12>");
        let id = SymbolId::local("a.js", "outer", &seg, None);
        assert_eq!(id.name(), "<anon:3:12>");
    }

    #[test]
    fn test_synthetic_callee() {
        let id = SymbolId::synthetic("setTimeout");
        assert_eq!(id.as_str(), "<builtin>#setTimeout");
        assert!(id.is_synthetic());
    }

    #[test]
    fn test_deterministic() {
        let a = SymbolId::local("x.rs", "m", "f", None);
        let b = SymbolId::local("x.rs", "m", "f", None);
        assert_eq!(a, b);
    }
}
