//! Analysis pipeline
//!
//! The public entry point. Asynchronous, suspending only at file-I/O
//! boundaries and at the join barrier between the per-file phase and the
//! project phase. Layers 1–4 fan out over files on a rayon pool sized by the
//! configuration; layers 5–9 fold single-threaded over path-sorted results,
//! so output is reproducible regardless of scheduling. Cancellation is
//! observed between files and at every layer boundary.

pub mod walker;

use rayon::prelude::*;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span};

use crate::analysis::{analyze_source, FileAnalysis};
use crate::config::AnalysisConfig;
use crate::errors::{AnalysisError, ErrorRecord, Result};
use crate::graph::{CallGraph, FileGraph, ProjectGraph, ProjectMetadata, SymbolIndex};
use crate::project::{
    ClassHierarchy, ModuleGraph, PackageManifests, Resolver, SymbolTable, TypeRegistry,
};
use walker::{SourceFile, WalkOutput};

/// Project analyzer. Construction validates the configuration; the only
/// fatal failures happen before analysis begins.
pub struct Analyzer {
    config: AnalysisConfig,
}

impl Analyzer {
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Analyze the configured root.
    pub async fn analyze(&self) -> Result<ProjectGraph> {
        self.analyze_with_cancel(CancellationToken::new()).await
    }

    /// Analyze with external cancellation. The token is honored between
    /// files and at layer boundaries; mid-file work finishes first.
    pub async fn analyze_with_cancel(&self, cancel: CancellationToken) -> Result<ProjectGraph> {
        let started = Instant::now();
        let compiled = self.config.validate()?;
        let mut project_errors: Vec<ErrorRecord> = Vec::new();

        // Discovery (blocking walk, off the async thread).
        let walk_config = self.config.clone();
        let walked: WalkOutput = tokio::task::spawn_blocking(move || {
            let _span = info_span!("walk").entered();
            walker::walk(&walk_config, &compiled)
        })
        .await
        .map_err(|e| AnalysisError::internal(format!("walker task: {}", e)))?;
        project_errors.extend(walked.errors.iter().cloned());

        // File reads suspend here; every unreadable file is skipped with an
        // error record rather than failing the run.
        let mut contents: Vec<(SourceFile, String)> = Vec::with_capacity(walked.sources.len());
        for source in &walked.sources {
            if cancel.is_cancelled() {
                return Err(AnalysisError::Cancelled);
            }
            match tokio::fs::read_to_string(&source.abs_path).await {
                Ok(text) => contents.push((source.clone(), text)),
                Err(err) => {
                    project_errors.push(ErrorRecord::io(&source.rel_path, err.to_string()));
                }
            }
        }

        let mut manifests = PackageManifests::new();
        for (rel_path, abs_path) in &walked.manifests {
            if let Ok(text) = tokio::fs::read_to_string(abs_path).await {
                if rel_path.ends_with("package.json") {
                    manifests.add_package_json(rel_path, &text);
                } else {
                    manifests.add_cargo_toml(rel_path, &text);
                }
            }
        }

        // Per-file phase: L1–L4 fan out over files. Each worker acquires its
        // parser for one file and releases it with the tree on completion.
        let parallelism = self.config.parallelism();
        let fan_cancel = cancel.clone();
        let mut analyses: Vec<FileAnalysis> = tokio::task::spawn_blocking(move || {
            let _span = info_span!("per_file", files = contents.len()).entered();
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(parallelism)
                .build()
                .map_err(|e| AnalysisError::internal(format!("worker pool: {}", e)))?;
            let analyses = pool.install(|| {
                contents
                    .par_iter()
                    .filter(|_| !fan_cancel.is_cancelled())
                    .map(|(source, text)| {
                        match source.language.parser(&source.abs_path) {
                            Ok(mut parser) => analyze_source(
                                &source.rel_path,
                                source.language,
                                text,
                                &mut parser,
                            ),
                            Err(err) => FileAnalysis::failed(
                                &source.rel_path,
                                source.language,
                                ErrorRecord::parse(&source.rel_path, err.to_string()),
                            ),
                        }
                    })
                    .collect()
            });
            Ok::<Vec<FileAnalysis>, AnalysisError>(analyses)
        })
        .await
        .map_err(|e| AnalysisError::internal(format!("analysis task: {}", e)))??;

        if cancel.is_cancelled() {
            return Err(AnalysisError::Cancelled);
        }

        // Deterministic order for all project-wide folds.
        analyses.sort_by(|a, b| a.file_path.cmp(&b.file_path));
        debug!(files = analyses.len(), "per-file phase complete");

        // L5: module graph.
        let (modules, import_errors) = {
            let _span = info_span!("module_graph").entered();
            ModuleGraph::build(&analyses, &walked.file_set, &manifests)
        };
        project_errors.extend(import_errors);
        if cancel.is_cancelled() {
            return Err(AnalysisError::Cancelled);
        }

        // L6–L8: registries, frozen before resolution.
        let registry = TypeRegistry::build(&analyses);
        let (hierarchy, cycle_errors) = ClassHierarchy::build(&registry, &modules);
        project_errors.extend(cycle_errors);
        let symbols = SymbolTable::build(&analyses, &modules);
        if cancel.is_cancelled() {
            return Err(AnalysisError::Cancelled);
        }

        // L9: resolution.
        let resolution = {
            let _span = info_span!("resolution").entered();
            let resolver = Resolver::new(&analyses, &modules, &registry, &hierarchy, &symbols);
            resolver.resolve_project(&analyses)
        };

        // Terminal artifacts.
        let calls = CallGraph::build(&analyses, &resolution);
        let symbol_index = SymbolIndex::build(&symbols, &resolution);

        let mut metadata = ProjectMetadata {
            root_path: self.config.root_path.display().to_string(),
            file_count: analyses.len(),
            analysis_time_ms: 0,
            language_stats: Default::default(),
            resolution: resolution.stats.clone(),
        };
        for analysis in &analyses {
            *metadata.language_stats.entry(analysis.language).or_insert(0) += 1;
        }

        let mut resolution = resolution;
        let mut files = std::collections::BTreeMap::new();
        for analysis in analyses {
            let path = analysis.file_path.clone();
            let imports = modules.resolved_imports(&path).to_vec();
            let references = resolution
                .references_by_file
                .remove(&path)
                .unwrap_or_default();
            let records = resolution.calls_by_file.remove(&path).unwrap_or_default();
            files.insert(
                path,
                FileGraph::assemble(analysis, imports, references, records),
            );
        }

        metadata.analysis_time_ms = started.elapsed().as_millis() as u64;
        info!(
            files = metadata.file_count,
            ms = metadata.analysis_time_ms,
            "analysis complete"
        );

        Ok(ProjectGraph {
            files,
            modules,
            calls,
            classes: hierarchy,
            symbols: symbol_index,
            errors: project_errors,
            metadata,
        })
    }
}

/// One-shot convenience entry point.
pub async fn analyze_project(config: &AnalysisConfig) -> Result<ProjectGraph> {
    Analyzer::new(config.clone())?.analyze().await
}
