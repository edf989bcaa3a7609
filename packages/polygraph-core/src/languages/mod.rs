//! Language support
//!
//! The per-language pieces (scope boundary extraction, capture walking,
//! import/export extraction, constructor detection, hoisting, builtins)
//! form a policy capability set. The core layers are generic over
//! [`LanguagePolicy`]; adding a language means implementing the trait.

mod ecma;
mod javascript;
mod policy;
mod python;
mod rust;
mod typescript;

pub use javascript::JavascriptPolicy;
pub use policy::{
    CallCapture, DefCapture, ExportCapture, ImportCapture, LanguagePolicy, ParamCapture,
    RefCapture, ScopeCapture,
};
pub use python::PythonPolicy;
pub use rust::RustPolicy;
pub use typescript::TypescriptPolicy;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::errors::{AnalysisError, Result};

/// Supported source languages.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Javascript,
    Typescript,
    Python,
    Rust,
}

impl Language {
    pub const ALL: [Language; 4] = [
        Language::Javascript,
        Language::Typescript,
        Language::Python,
        Language::Rust,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Javascript => "javascript",
            Language::Typescript => "typescript",
            Language::Python => "python",
            Language::Rust => "rust",
        }
    }

    pub fn from_name(name: &str) -> Option<Language> {
        match name {
            "javascript" | "js" => Some(Language::Javascript),
            "typescript" | "ts" => Some(Language::Typescript),
            "python" | "py" => Some(Language::Python),
            "rust" | "rs" => Some(Language::Rust),
            _ => None,
        }
    }

    pub fn from_extension(ext: &str) -> Option<Language> {
        match ext {
            "js" | "jsx" | "mjs" | "cjs" => Some(Language::Javascript),
            "ts" | "tsx" => Some(Language::Typescript),
            "py" | "pyi" => Some(Language::Python),
            "rs" => Some(Language::Rust),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Language> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Language::from_extension)
    }

    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            Language::Javascript => &["js", "jsx", "mjs", "cjs"],
            Language::Typescript => &["ts", "tsx"],
            Language::Python => &["py", "pyi"],
            Language::Rust => &["rs"],
        }
    }

    /// Tree-sitter grammar for a file of this language. TSX needs its own
    /// grammar variant; everything else is extension-independent.
    pub fn grammar(&self, path: &Path) -> tree_sitter::Language {
        match self {
            Language::Javascript => tree_sitter_javascript::language(),
            Language::Typescript => {
                let tsx = path
                    .extension()
                    .and_then(|e| e.to_str())
                    .map(|e| e == "tsx")
                    .unwrap_or(false);
                if tsx {
                    tree_sitter_typescript::language_tsx()
                } else {
                    tree_sitter_typescript::language_typescript()
                }
            }
            Language::Python => tree_sitter_python::language(),
            Language::Rust => tree_sitter_rust::language(),
        }
    }

    /// A parser configured for a file of this language.
    pub fn parser(&self, path: &Path) -> Result<tree_sitter::Parser> {
        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(&self.grammar(path))
            .map_err(|e| AnalysisError::language(self.as_str(), e.to_string()))?;
        Ok(parser)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The policy implementation for a language.
pub fn policy_for(language: Language) -> &'static dyn LanguagePolicy {
    match language {
        Language::Javascript => &JavascriptPolicy,
        Language::Typescript => &TypescriptPolicy,
        Language::Python => &PythonPolicy,
        Language::Rust => &RustPolicy,
    }
}
