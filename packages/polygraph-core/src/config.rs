//! Analysis configuration
//!
//! The configuration envelope is validated once, before any analysis starts;
//! bad globs, a missing root, or an empty language set are the only fatal
//! conditions in the system. The envelope is passed by reference afterwards
//! and never mutated.

use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::errors::{AnalysisError, Result};
use crate::languages::Language;

/// Directories nobody wants analyzed.
const DEFAULT_EXCLUDES: &[&str] = &[
    "**/node_modules/**",
    "**/target/**",
    "**/.git/**",
    "**/__pycache__/**",
    "**/dist/**",
    "**/build/**",
    "**/.venv/**",
];

/// Project analysis configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    pub root_path: PathBuf,
    pub include_patterns: Vec<String>,
    pub exclude_patterns: Vec<String>,
    /// Files larger than this are skipped with an error record.
    pub max_file_size: Option<u64>,
    pub languages: BTreeSet<Language>,
    /// Worker count for the per-file phase; defaults to available cores.
    pub max_parallelism: Option<usize>,
}

impl AnalysisConfig {
    pub fn new(root_path: impl Into<PathBuf>) -> Self {
        Self {
            root_path: root_path.into(),
            include_patterns: vec!["**/*".to_string()],
            exclude_patterns: DEFAULT_EXCLUDES.iter().map(|s| s.to_string()).collect(),
            max_file_size: Some(2 * 1024 * 1024),
            languages: Language::ALL.into_iter().collect(),
            max_parallelism: None,
        }
    }

    pub fn with_include_patterns(mut self, patterns: Vec<String>) -> Self {
        self.include_patterns = patterns;
        self
    }

    pub fn with_exclude_patterns(mut self, patterns: Vec<String>) -> Self {
        self.exclude_patterns = patterns;
        self
    }

    pub fn with_languages(mut self, languages: impl IntoIterator<Item = Language>) -> Self {
        self.languages = languages.into_iter().collect();
        self
    }

    pub fn with_max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = Some(bytes);
        self
    }

    pub fn with_max_parallelism(mut self, workers: usize) -> Self {
        self.max_parallelism = Some(workers);
        self
    }

    /// Validate and compile the envelope. Fails fast on misconfiguration.
    pub fn validate(&self) -> Result<CompiledConfig> {
        if !self.root_path.exists() {
            return Err(AnalysisError::config(format!(
                "root path does not exist: {}",
                self.root_path.display()
            )));
        }
        if !self.root_path.is_dir() {
            return Err(AnalysisError::config(format!(
                "root path is not a directory: {}",
                self.root_path.display()
            )));
        }
        if self.languages.is_empty() {
            return Err(AnalysisError::config("no languages selected"));
        }
        if self.include_patterns.is_empty() {
            return Err(AnalysisError::config("empty include pattern set"));
        }

        let include = compile_globs(&self.include_patterns)?;
        let exclude = compile_globs(&self.exclude_patterns)?;
        Ok(CompiledConfig { include, exclude })
    }

    pub fn parallelism(&self) -> usize {
        self.max_parallelism
            .unwrap_or_else(num_cpus::get)
            .max(1)
    }
}

fn compile_globs(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern)
            .map_err(|e| AnalysisError::config(format!("bad glob pattern {:?}: {}", pattern, e)))?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| AnalysisError::config(format!("glob set: {}", e)))
}

/// Compiled matchers derived from a validated configuration.
#[derive(Debug, Clone)]
pub struct CompiledConfig {
    include: GlobSet,
    exclude: GlobSet,
}

impl CompiledConfig {
    /// Whether a root-relative path should be analyzed.
    pub fn matches(&self, relative: &Path) -> bool {
        self.include.is_match(relative) && !self.exclude.is_match(relative)
    }

    /// Whether a path is excluded outright (independent of includes); the
    /// walker still records non-included files for module resolution.
    pub fn matches_exclude_only(&self, relative: &Path) -> bool {
        self.exclude.is_match(relative)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_cover_all_languages() {
        let config = AnalysisConfig::new(".");
        assert_eq!(config.languages.len(), 4);
    }

    #[test]
    fn test_missing_root_fails_validation() {
        let config = AnalysisConfig::new("/definitely/not/here");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bad_glob_fails_validation() {
        let config =
            AnalysisConfig::new(".").with_include_patterns(vec!["src/[".to_string()]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_exclude_wins() {
        let config = AnalysisConfig::new(".");
        let compiled = config.validate().unwrap();
        assert!(compiled.matches(Path::new("src/main.py")));
        assert!(!compiled.matches(Path::new("node_modules/lib/index.js")));
    }

    #[test]
    fn test_empty_languages_rejected() {
        let config = AnalysisConfig::new(".").with_languages(Vec::<Language>::new());
        assert!(config.validate().is_err());
    }
}
