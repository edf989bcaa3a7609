//! Project code graph
//!
//! The terminal artifact: per-file analyses enriched with resolution
//! results, the module graph, call graph, class hierarchy, and symbol index,
//! plus run metadata. Everything is serde-serializable and deterministic:
//! re-analyzing the same tree yields byte-identical JSON modulo
//! `analysis_time_ms`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::call_graph::CallGraph;
use super::symbol_index::SymbolIndex;
use crate::analysis::FileAnalysis;
use crate::errors::ErrorRecord;
use crate::languages::Language;
use crate::project::{ClassHierarchy, ModuleGraph, ResolutionStats, ResolvedImport};
use crate::shared::models::{CallKind, CallRecord, ResolvedReference, SymbolId};

/// One file's analysis enriched with its resolution results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileGraph {
    pub analysis: FileAnalysis,
    /// Imports with their resolved target paths.
    pub imports: Vec<ResolvedImport>,
    pub resolved_references: Vec<ResolvedReference>,
    pub function_calls: Vec<CallRecord>,
    pub method_calls: Vec<CallRecord>,
    pub constructor_calls: Vec<CallRecord>,
}

impl FileGraph {
    /// Split a file's resolved call records by kind; the analysis itself is
    /// consumed, not mutated.
    pub fn assemble(
        analysis: FileAnalysis,
        imports: Vec<ResolvedImport>,
        resolved_references: Vec<ResolvedReference>,
        calls: Vec<CallRecord>,
    ) -> Self {
        let mut function_calls = Vec::new();
        let mut method_calls = Vec::new();
        let mut constructor_calls = Vec::new();
        for record in calls {
            match record.kind {
                CallKind::Direct => function_calls.push(record),
                CallKind::Method => method_calls.push(record),
                CallKind::Constructor => constructor_calls.push(record),
            }
        }
        Self {
            analysis,
            imports,
            resolved_references,
            function_calls,
            method_calls,
            constructor_calls,
        }
    }

    pub fn errors(&self) -> &[ErrorRecord] {
        &self.analysis.errors
    }
}

/// Run metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectMetadata {
    pub root_path: String,
    pub file_count: usize,
    pub analysis_time_ms: u64,
    pub language_stats: BTreeMap<Language, usize>,
    pub resolution: ResolutionStats,
}

/// The complete project code graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectGraph {
    pub files: BTreeMap<String, FileGraph>,
    pub modules: ModuleGraph,
    pub calls: CallGraph,
    pub classes: ClassHierarchy,
    pub symbols: SymbolIndex,
    /// Project-level errors (walker, module graph, inheritance cycles);
    /// per-file errors live in their file's analysis.
    pub errors: Vec<ErrorRecord>,
    pub metadata: ProjectMetadata,
}

impl ProjectGraph {
    pub fn file(&self, path: &str) -> Option<&FileGraph> {
        self.files.get(path)
    }

    /// Callers of a symbol, through the call graph.
    pub fn callers_of(&self, symbol: &SymbolId) -> Vec<&CallRecord> {
        self.calls.calls_to(symbol)
    }

    /// Callees of a symbol.
    pub fn callees_of(&self, symbol: &SymbolId) -> Vec<&CallRecord> {
        self.calls.calls_from(symbol)
    }

    /// All errors: project-level plus per-file.
    pub fn all_errors(&self) -> impl Iterator<Item = &ErrorRecord> {
        self.errors
            .iter()
            .chain(self.files.values().flat_map(|f| f.analysis.errors.iter()))
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }
}
