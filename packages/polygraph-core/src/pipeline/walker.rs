//! File discovery
//!
//! Walks the root with `walkdir`, applies the configured glob filters, and
//! produces three things: the source files to analyze, a `FileSet` snapshot
//! of everything under the root (module resolution probes against this, not
//! the live filesystem), and the package manifests found along the way.

use std::path::PathBuf;
use tracing::debug;
use walkdir::WalkDir;

use crate::config::{AnalysisConfig, CompiledConfig};
use crate::errors::ErrorRecord;
use crate::languages::Language;
use crate::project::FileSet;

/// One file selected for analysis.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub rel_path: String,
    pub abs_path: PathBuf,
    pub language: Language,
    pub size: u64,
}

/// Walker output.
#[derive(Debug, Default)]
pub struct WalkOutput {
    /// Analyzable sources, sorted by relative path.
    pub sources: Vec<SourceFile>,
    /// Every non-excluded file under the root.
    pub file_set: FileSet,
    /// Manifests to parse for bare-specifier resolution.
    pub manifests: Vec<(String, PathBuf)>,
    pub errors: Vec<ErrorRecord>,
}

pub fn walk(config: &AnalysisConfig, compiled: &CompiledConfig) -> WalkOutput {
    let mut output = WalkOutput::default();
    let mut all_files = Vec::new();

    for entry in WalkDir::new(&config.root_path).follow_links(false) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                let path = err
                    .path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default();
                output.errors.push(ErrorRecord::io(path, err.to_string()));
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(rel) = entry.path().strip_prefix(&config.root_path) else {
            continue;
        };
        let rel_path = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        // The exclude set gates everything, the include set only sources.
        if compiled.matches_exclude_only(rel) {
            continue;
        }
        all_files.push(rel_path.clone());

        let name = entry.file_name().to_string_lossy();
        if name == "package.json" || name == "Cargo.toml" {
            output
                .manifests
                .push((rel_path.clone(), entry.path().to_path_buf()));
        }

        if !compiled.matches(rel) {
            continue;
        }
        let Some(language) = Language::from_path(entry.path()) else {
            continue;
        };
        if !config.languages.contains(&language) {
            continue;
        }

        let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
        if let Some(max) = config.max_file_size {
            if size > max {
                output.errors.push(ErrorRecord::io(
                    rel_path.clone(),
                    format!("file exceeds max_file_size ({} > {} bytes)", size, max),
                ));
                continue;
            }
        }

        output.sources.push(SourceFile {
            rel_path,
            abs_path: entry.path().to_path_buf(),
            language,
            size,
        });
    }

    // Directory iteration order is filesystem-dependent; sort everything so
    // re-analysis is reproducible.
    output.sources.sort_by(|a, b| a.rel_path.cmp(&b.rel_path));
    output.manifests.sort_by(|a, b| a.0.cmp(&b.0));
    output
        .errors
        .sort_by(|a, b| (&a.file, &a.message).cmp(&(&b.file, &b.message)));
    output.file_set = FileSet::new(all_files);
    debug!(
        sources = output.sources.len(),
        files = output.file_set.len(),
        "walk complete"
    );
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn fixture() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::create_dir_all(dir.path().join("node_modules/junk")).unwrap();
        fs::write(dir.path().join("src/main.py"), "x = 1\n").unwrap();
        fs::write(dir.path().join("src/lib.rs"), "pub fn f() {}\n").unwrap();
        fs::write(dir.path().join("src/notes.txt"), "not code").unwrap();
        fs::write(dir.path().join("node_modules/junk/index.js"), ";").unwrap();
        fs::write(dir.path().join("package.json"), "{\"name\": \"x\"}").unwrap();
        dir
    }

    #[test]
    fn test_walk_selects_sources_and_skips_excluded() {
        let dir = fixture();
        let config = AnalysisConfig::new(dir.path());
        let compiled = config.validate().unwrap();
        let output = walk(&config, &compiled);

        let paths: Vec<&str> = output.sources.iter().map(|s| s.rel_path.as_str()).collect();
        assert_eq!(paths, vec!["src/lib.rs", "src/main.py"]);
        assert!(output.file_set.contains("src/notes.txt"));
        assert!(!output.file_set.contains("node_modules/junk/index.js"));
        assert_eq!(output.manifests.len(), 1);
    }

    #[test]
    fn test_max_file_size_skip_is_recorded() {
        let dir = fixture();
        fs::write(dir.path().join("src/big.py"), "x = 1\n".repeat(100)).unwrap();
        let config = AnalysisConfig::new(dir.path()).with_max_file_size(10);
        let compiled = config.validate().unwrap();
        let output = walk(&config, &compiled);

        assert!(output.sources.iter().all(|s| s.rel_path != "src/big.py"));
        assert!(output
            .errors
            .iter()
            .any(|e| e.file == "src/big.py" && e.message.contains("max_file_size")));
    }

    #[test]
    fn test_language_filter() {
        let dir = fixture();
        let config = AnalysisConfig::new(dir.path()).with_languages([Language::Python]);
        let compiled = config.validate().unwrap();
        let output = walk(&config, &compiled);

        assert_eq!(output.sources.len(), 1);
        assert_eq!(output.sources[0].language, Language::Python);
    }
}
