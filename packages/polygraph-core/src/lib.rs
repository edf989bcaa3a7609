//! polygraph-core: cross-file code graph construction for polyglot
//! repositories
//!
//! Given a root directory, parses every matching JavaScript, TypeScript,
//! Python, and Rust source with tree-sitter and builds a queryable code
//! graph: a call graph, a class hierarchy with transitive closure, and a
//! symbol index with globally unique IDs.
//!
//! Analysis runs in nine strictly ordered layers:
//! - per file (parallel): scope tree, entity extraction, local type
//!   tracking, call detection;
//! - project-wide (deterministic folds): module graph, type registry,
//!   inheritance resolution, global symbol table, reference resolution.
//!
//! ```no_run
//! use polygraph_core::{analyze_project, AnalysisConfig};
//!
//! # async fn run() -> polygraph_core::Result<()> {
//! let config = AnalysisConfig::new("/path/to/repo");
//! let graph = analyze_project(&config).await?;
//! println!("{} files, {} symbols", graph.file_count(), graph.symbols.len());
//! # Ok(())
//! # }
//! ```

pub mod analysis;
pub mod config;
pub mod errors;
pub mod graph;
pub mod languages;
pub mod pipeline;
pub mod project;
pub mod shared;

pub use config::AnalysisConfig;
pub use errors::{AnalysisError, ErrorKind, ErrorRecord, Layer, Result};
pub use graph::{CallGraph, FileGraph, ProjectGraph, ProjectMetadata, SymbolIndex};
pub use languages::Language;
pub use pipeline::{analyze_project, Analyzer};
pub use project::{ClassHierarchy, ModuleGraph, ResolutionStats};
pub use shared::models::{
    CallKind, CallRecord, DefKind, Definition, Location, Point, Reference, ResolutionState,
    ScopeId, ScopeKind, Span, SymbolId, Visibility,
};
