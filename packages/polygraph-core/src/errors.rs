//! Error types
//!
//! Two tiers. `AnalysisError` is the fatal tier: configuration problems and
//! internal failures that stop the run before or during setup. Everything the
//! pipeline can survive is reified as an `ErrorRecord` value embedded in the
//! project result, per the layer it came from.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::shared::models::Span;

/// Pipeline layer an error record originates from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layer {
    Walker,
    Parse,
    ScopeTree,
    Extraction,
    TypeTracking,
    CallDetection,
    ModuleGraph,
    TypeRegistry,
    Inheritance,
    SymbolTable,
    Resolution,
}

/// Kind taxonomy of non-fatal errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Parse,
    Scope,
    Extract,
    Import,
    Resolve,
    Cycle,
    Io,
}

/// A non-fatal error attached to the project result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub file: String,
    pub layer: Layer,
    pub kind: ErrorKind,
    pub message: String,
    pub span: Option<Span>,
}

impl ErrorRecord {
    pub fn new(
        file: impl Into<String>,
        layer: Layer,
        kind: ErrorKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            file: file.into(),
            layer,
            kind,
            message: message.into(),
            span: None,
        }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    pub fn parse(file: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(file, Layer::Parse, ErrorKind::Parse, message)
    }

    pub fn io(file: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(file, Layer::Walker, ErrorKind::Io, message)
    }

    pub fn cycle(file: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(file, Layer::Inheritance, ErrorKind::Cycle, message)
    }
}

/// Fatal errors surfaced by the public entry point.
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// Misconfiguration detected before analysis begins.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Tree-sitter grammar failed to initialize.
    #[error("failed to initialize language {language}: {reason}")]
    Language { language: String, reason: String },

    /// The analysis was cancelled via its token.
    #[error("analysis cancelled")]
    Cancelled,

    /// Root-level I/O failure (the root itself, not an individual file).
    #[error("I/O error for {path}: {reason}")]
    Io { path: String, reason: String },

    /// Bugs.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AnalysisError {
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config(reason.into())
    }

    pub fn language(language: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Language {
            language: language.into(),
            reason: reason.into(),
        }
    }

    pub fn io(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Io {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn internal(reason: impl Into<String>) -> Self {
        Self::Internal(reason.into())
    }

    /// Category string for logs and metrics.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::Language { .. } => "language",
            Self::Cancelled => "cancelled",
            Self::Io { .. } => "io",
            Self::Internal(_) => "internal",
        }
    }
}

/// Result alias for fatal-capable operations.
pub type Result<T> = std::result::Result<T, AnalysisError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AnalysisError::config("empty include set");
        assert_eq!(err.to_string(), "invalid configuration: empty include set");
        assert_eq!(err.category(), "config");
    }

    #[test]
    fn test_record_builders() {
        let rec = ErrorRecord::parse("main.py", "syntax error").with_span(Span::zero());
        assert_eq!(rec.layer, Layer::Parse);
        assert_eq!(rec.kind, ErrorKind::Parse);
        assert!(rec.span.is_some());
    }
}
