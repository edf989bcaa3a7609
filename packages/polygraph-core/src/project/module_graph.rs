//! Module graph (layer 5)
//!
//! Maps every import record to a file in the project. Resolution consults a
//! `FileSet` snapshot taken by the walker rather than the live filesystem,
//! so the fold is pure and input-order independent. File-level dependency
//! edges feed a petgraph digraph for cycle detection (Tarjan SCC) and a
//! deterministic topological order (Kahn, sorted tie-break).

use once_cell::sync::Lazy;
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use tracing::debug;

use crate::analysis::FileAnalysis;
use crate::errors::{ErrorKind, ErrorRecord, Layer};
use crate::languages::Language;
use crate::shared::models::{ExportRecord, ImportRecord};

static NODE_BUILTINS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "assert", "buffer", "child_process", "cluster", "console", "constants", "crypto", "dgram",
        "dns", "events", "fs", "http", "http2", "https", "module", "net", "os", "path", "perf_hooks",
        "process", "querystring", "readline", "repl", "stream", "string_decoder", "timers", "tls",
        "tty", "url", "util", "v8", "vm", "worker_threads", "zlib",
    ]
    .into_iter()
    .collect()
});

static PYTHON_STDLIB: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "abc", "argparse", "asyncio", "base64", "collections", "contextlib", "copy", "csv",
        "dataclasses", "datetime", "enum", "functools", "glob", "hashlib", "heapq", "io",
        "itertools", "json", "logging", "math", "os", "pathlib", "pickle", "random", "re",
        "shutil", "socket", "string", "struct", "subprocess", "sys", "tempfile", "threading",
        "time", "typing", "unittest", "urllib", "uuid", "warnings", "weakref",
    ]
    .into_iter()
    .collect()
});

const RUST_BUILTIN_CRATES: &[&str] = &["std", "core", "alloc", "proc_macro", "test"];

const JS_EXTENSIONS: &[&str] = &["ts", "tsx", "js", "jsx", "mjs", "cjs"];

// ───────────────────────────────────────────────────────────────────────────
// File set
// ───────────────────────────────────────────────────────────────────────────

/// Snapshot of every file under the root (sources and manifests alike),
/// keyed by root-relative `/`-separated path.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileSet {
    files: BTreeSet<String>,
}

impl FileSet {
    pub fn new(paths: impl IntoIterator<Item = String>) -> Self {
        Self {
            files: paths.into_iter().collect(),
        }
    }

    pub fn contains(&self, path: &str) -> bool {
        self.files.contains(path)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.files.iter().map(|s| s.as_str())
    }
}

/// Directory part of a relative path, empty for top-level files.
pub(crate) fn dir_of(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[..idx],
        None => "",
    }
}

/// Join `base` and `rel`, normalizing `.` and `..`. Returns `None` when the
/// path escapes the root.
pub(crate) fn join_normalize(base: &str, rel: &str) -> Option<String> {
    let mut parts: Vec<&str> = base.split('/').filter(|s| !s.is_empty()).collect();
    for segment in rel.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop()?;
            }
            other => parts.push(other),
        }
    }
    Some(parts.join("/"))
}

fn parent_dir(dir: &str) -> Option<&str> {
    if dir.is_empty() {
        return None;
    }
    Some(match dir.rfind('/') {
        Some(idx) => &dir[..idx],
        None => "",
    })
}

fn join(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", dir, name)
    }
}

// ───────────────────────────────────────────────────────────────────────────
// Package manifests
// ───────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NpmPackage {
    pub name: String,
    pub dir: String,
    pub entry: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CargoPackage {
    pub name: String,
    pub dir: String,
}

/// Parsed package manifests found under the root.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PackageManifests {
    pub npm: Vec<NpmPackage>,
    pub cargo: Vec<CargoPackage>,
}

#[derive(Deserialize)]
struct PackageJson {
    name: Option<String>,
    main: Option<String>,
    module: Option<String>,
}

#[derive(Deserialize)]
struct CargoToml {
    package: Option<CargoTomlPackage>,
}

#[derive(Deserialize)]
struct CargoTomlPackage {
    name: Option<String>,
}

impl PackageManifests {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a `package.json` by its root-relative path.
    pub fn add_package_json(&mut self, rel_path: &str, content: &str) {
        let parsed: PackageJson = match serde_json::from_str(content) {
            Ok(p) => p,
            Err(_) => return,
        };
        let Some(name) = parsed.name else { return };
        self.npm.push(NpmPackage {
            name,
            dir: dir_of(rel_path).to_string(),
            entry: parsed.main.or(parsed.module),
        });
    }

    /// Register a `Cargo.toml` by its root-relative path.
    pub fn add_cargo_toml(&mut self, rel_path: &str, content: &str) {
        let parsed: CargoToml = match toml::from_str(content) {
            Ok(p) => p,
            Err(_) => return,
        };
        let Some(name) = parsed.package.and_then(|p| p.name) else {
            return;
        };
        self.cargo.push(CargoPackage {
            name,
            dir: dir_of(rel_path).to_string(),
        });
    }

    fn npm_package(&self, name: &str) -> Option<&NpmPackage> {
        self.npm.iter().find(|p| p.name == name)
    }

    fn cargo_package(&self, name: &str) -> Option<&CargoPackage> {
        let normalized = name.replace('-', "_");
        self.cargo
            .iter()
            .find(|p| p.name == name || p.name.replace('-', "_") == normalized)
    }
}

// ───────────────────────────────────────────────────────────────────────────
// Resolution
// ───────────────────────────────────────────────────────────────────────────

/// Where an import points after resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "path")]
pub enum ImportTarget {
    /// A file inside the project.
    File(String),
    /// A recognized builtin or third-party module; deliberately unresolved.
    External,
    /// Nothing matched; recorded as an import error.
    Unresolved,
}

/// An import record together with its resolved target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedImport {
    pub record: ImportRecord,
    pub target: ImportTarget,
}

impl ResolvedImport {
    pub fn target_file(&self) -> Option<&str> {
        match &self.target {
            ImportTarget::File(path) => Some(path),
            _ => None,
        }
    }
}

/// Pure import-path resolver over a file-set snapshot.
pub struct ModuleResolver<'a> {
    files: &'a FileSet,
    manifests: &'a PackageManifests,
}

impl<'a> ModuleResolver<'a> {
    pub fn new(files: &'a FileSet, manifests: &'a PackageManifests) -> Self {
        Self { files, manifests }
    }

    pub fn resolve(
        &self,
        importer: &str,
        record: &ImportRecord,
        language: Language,
    ) -> ImportTarget {
        match language {
            Language::Javascript | Language::Typescript => {
                self.resolve_js(importer, &record.source)
            }
            Language::Python => self.resolve_python(importer, &record.source),
            Language::Rust => self.resolve_rust(importer, record),
        }
    }

    // JS/TS: relative paths with known extensions or index files; bare
    // specifiers against package manifests; Node builtins stay external.
    fn resolve_js(&self, importer: &str, source: &str) -> ImportTarget {
        if source.starts_with('.') {
            let base = dir_of(importer);
            let Some(joined) = join_normalize(base, source) else {
                return ImportTarget::Unresolved;
            };
            return self
                .probe_js_candidates(&joined)
                .map(ImportTarget::File)
                .unwrap_or(ImportTarget::Unresolved);
        }

        let bare = source.strip_prefix("node:").unwrap_or(source);
        let package_name = if bare.starts_with('@') {
            bare.splitn(3, '/').take(2).collect::<Vec<_>>().join("/")
        } else {
            bare.split('/').next().unwrap_or(bare).to_string()
        };
        if NODE_BUILTINS.contains(package_name.as_str()) {
            return ImportTarget::External;
        }

        if let Some(package) = self.manifests.npm_package(&package_name) {
            let subpath = bare.strip_prefix(&package_name).unwrap_or("");
            let subpath = subpath.trim_start_matches('/');
            let candidate = if subpath.is_empty() {
                match &package.entry {
                    Some(entry) => join_normalize(&package.dir, entry),
                    None => Some(join(&package.dir, "index")),
                }
            } else {
                Some(join(&package.dir, subpath))
            };
            if let Some(candidate) = candidate {
                if let Some(hit) = self.probe_js_candidates(&candidate) {
                    return ImportTarget::File(hit);
                }
            }
        }
        ImportTarget::External
    }

    fn probe_js_candidates(&self, base: &str) -> Option<String> {
        if self.files.contains(base) && has_js_extension(base) {
            return Some(base.to_string());
        }
        for ext in JS_EXTENSIONS {
            let candidate = format!("{}.{}", base, ext);
            if self.files.contains(&candidate) {
                return Some(candidate);
            }
        }
        for ext in JS_EXTENSIONS {
            let candidate = format!("{}/index.{}", base, ext);
            if self.files.contains(&candidate) {
                return Some(candidate);
            }
        }
        None
    }

    // Python: N leading dots climb N-1 parents; absolute imports resolve
    // against the topmost package root, then the project root. Standard
    // library modules are recognized and left external; anything else that
    // fails every probe is unresolved.
    fn resolve_python(&self, importer: &str, source: &str) -> ImportTarget {
        if source.starts_with('.') {
            let dots = source.chars().take_while(|c| *c == '.').count();
            let rest = &source[dots..];
            let mut base = dir_of(importer).to_string();
            for _ in 0..dots.saturating_sub(1) {
                match parent_dir(&base) {
                    Some(parent) => base = parent.to_string(),
                    None => return ImportTarget::Unresolved,
                }
            }
            return self
                .probe_python_module(&base, rest)
                .map(ImportTarget::File)
                .unwrap_or(ImportTarget::Unresolved);
        }

        let top = source.split('.').next().unwrap_or(source);
        let mut bases = Vec::new();
        if let Some(package_base) = self.python_package_base(importer) {
            bases.push(package_base);
        }
        bases.push(String::new());
        bases.push(dir_of(importer).to_string());
        bases.dedup();

        for base in &bases {
            if let Some(hit) = self.probe_python_module(base, source) {
                return ImportTarget::File(hit);
            }
        }

        if PYTHON_STDLIB.contains(top) {
            return ImportTarget::External;
        }
        ImportTarget::Unresolved
    }

    /// Directory above the topmost ancestor package (`__init__.py` chain).
    fn python_package_base(&self, importer: &str) -> Option<String> {
        let mut dir = dir_of(importer).to_string();
        let mut topmost: Option<String> = None;
        loop {
            if self.files.contains(&join(&dir, "__init__.py")) {
                topmost = Some(dir.clone());
                match parent_dir(&dir) {
                    Some(parent) => dir = parent.to_string(),
                    None => break,
                }
            } else {
                break;
            }
        }
        topmost.map(|top| parent_dir(&top).unwrap_or("").to_string())
    }

    fn probe_python_module(&self, base: &str, dotted: &str) -> Option<String> {
        let rel = dotted.replace('.', "/");
        if rel.is_empty() {
            let candidate = join(base, "__init__.py");
            return self.files.contains(&candidate).then_some(candidate);
        }
        let stem = join_normalize(base, &rel)?;
        let file = format!("{}.py", stem);
        if self.files.contains(&file) {
            return Some(file);
        }
        let package = format!("{}/__init__.py", stem);
        if self.files.contains(&package) {
            return Some(package);
        }
        None
    }

    // Rust: self/super/crate prefixes, per-segment `name.rs` then
    // `name/mod.rs`, builtin crates external, workspace members via
    // Cargo.toml.
    fn resolve_rust(&self, importer: &str, record: &ImportRecord) -> ImportTarget {
        let source = record.source.as_str();
        let segments: Vec<&str> = source.split("::").filter(|s| !s.is_empty()).collect();
        if segments.is_empty() {
            return ImportTarget::Unresolved;
        }
        let first = segments[0];

        if RUST_BUILTIN_CRATES.contains(&first) {
            return ImportTarget::External;
        }

        let (base, rest): (String, &[&str]) = match first {
            "crate" => match self.rust_crate_root(importer) {
                Some(root_file) => {
                    if segments.len() == 1 {
                        return ImportTarget::File(root_file);
                    }
                    (dir_of(&root_file).to_string(), &segments[1..])
                }
                None => return ImportTarget::Unresolved,
            },
            "self" => (dir_of(importer).to_string(), &segments[1..]),
            "super" => {
                let mut dir = dir_of(importer).to_string();
                let mut idx = 0;
                while idx < segments.len() && segments[idx] == "super" {
                    match parent_dir(&dir) {
                        Some(parent) => dir = parent.to_string(),
                        None => return ImportTarget::Unresolved,
                    }
                    idx += 1;
                }
                (dir, &segments[idx..])
            }
            _ => {
                if let Some(package) = self.manifests.cargo_package(first) {
                    let src = join(&package.dir, "src");
                    if segments.len() == 1 {
                        let lib = join(&src, "lib.rs");
                        if self.files.contains(&lib) {
                            return ImportTarget::File(lib);
                        }
                        return ImportTarget::External;
                    }
                    (src, &segments[1..])
                } else {
                    // Sibling module path in the same crate.
                    let dir = dir_of(importer).to_string();
                    if let Some(hit) = self.resolve_rust_segments(&dir, &segments) {
                        return ImportTarget::File(hit);
                    }
                    return ImportTarget::External;
                }
            }
        };

        if rest.is_empty() {
            // `use self::x` style paths already consumed everything; the
            // binding names an item in the base module.
            let own = join(&base, "mod.rs");
            if self.files.contains(&own) {
                return ImportTarget::File(own);
            }
            if let Some(root) = self.rust_crate_root(importer) {
                if dir_of(&root) == base {
                    return ImportTarget::File(root);
                }
            }
            return ImportTarget::Unresolved;
        }

        self.resolve_rust_segments(&base, rest)
            .map(ImportTarget::File)
            .unwrap_or(ImportTarget::Unresolved)
    }

    /// Resolve a `::` path against a directory, dropping trailing item
    /// segments until a module file matches.
    fn resolve_rust_segments(&self, base: &str, segments: &[&str]) -> Option<String> {
        for take in (1..=segments.len()).rev() {
            if let Some(hit) = self.try_rust_module_path(base, &segments[..take]) {
                return Some(hit);
            }
        }
        None
    }

    fn try_rust_module_path(&self, base: &str, segments: &[&str]) -> Option<String> {
        let mut dir = base.to_string();
        for (i, segment) in segments.iter().enumerate() {
            let last = i + 1 == segments.len();
            let file = join(&dir, &format!("{}.rs", segment));
            let module_dir = join(&dir, &format!("{}/mod.rs", segment));
            if last {
                if self.files.contains(&file) {
                    return Some(file);
                }
                if self.files.contains(&module_dir) {
                    return Some(module_dir);
                }
                return None;
            }
            if self.files.contains(&file) || self.files.contains(&module_dir) {
                dir = join(&dir, segment);
            } else {
                return None;
            }
        }
        None
    }

    /// Nearest `lib.rs` or `main.rs` walking up from the importer.
    fn rust_crate_root(&self, importer: &str) -> Option<String> {
        let mut dir = dir_of(importer).to_string();
        loop {
            for root in ["lib.rs", "main.rs"] {
                let candidate = join(&dir, root);
                if self.files.contains(&candidate) {
                    return Some(candidate);
                }
            }
            match parent_dir(&dir) {
                Some(parent) => dir = parent.to_string(),
                None => return None,
            }
        }
    }
}

fn has_js_extension(path: &str) -> bool {
    path.rsplit('.')
        .next()
        .map(|ext| JS_EXTENSIONS.contains(&ext))
        .unwrap_or(false)
}

// ───────────────────────────────────────────────────────────────────────────
// Module graph
// ───────────────────────────────────────────────────────────────────────────

/// Project-wide module graph: resolved imports, export surfaces, dependency
/// maps, cycles, and a deterministic topological order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModuleGraph {
    pub imports_by_file: BTreeMap<String, Vec<ResolvedImport>>,
    pub exports_by_file: BTreeMap<String, Vec<ExportRecord>>,
    /// file → re-export source text → resolved target, for chasing
    /// `export ... from` / `pub use` chains.
    pub re_export_targets: BTreeMap<String, BTreeMap<String, ImportTarget>>,
    pub dependencies: BTreeMap<String, Vec<String>>,
    pub dependents: BTreeMap<String, Vec<String>>,
    pub cycles: Vec<Vec<String>>,
    pub topological_order: Vec<String>,
}

impl ModuleGraph {
    /// Fold over per-file analyses (callers pass them sorted by path).
    pub fn build(
        analyses: &[FileAnalysis],
        files: &FileSet,
        manifests: &PackageManifests,
    ) -> (ModuleGraph, Vec<ErrorRecord>) {
        let resolver = ModuleResolver::new(files, manifests);
        let mut graph = ModuleGraph::default();
        let mut errors = Vec::new();

        for analysis in analyses {
            let mut resolved = Vec::with_capacity(analysis.imports.len());
            for record in &analysis.imports {
                let target = resolver.resolve(&analysis.file_path, record, analysis.language);
                if target == ImportTarget::Unresolved {
                    errors.push(
                        ErrorRecord::new(
                            &analysis.file_path,
                            Layer::ModuleGraph,
                            ErrorKind::Import,
                            format!("cannot resolve import {:?}", record.source),
                        )
                        .with_span(record.location.span),
                    );
                }
                resolved.push(ResolvedImport {
                    record: record.clone(),
                    target,
                });
            }
            graph
                .imports_by_file
                .insert(analysis.file_path.clone(), resolved);
            graph
                .exports_by_file
                .insert(analysis.file_path.clone(), analysis.exports.clone());

            // Re-export sources resolve like imports of the same file.
            let mut re_exports = BTreeMap::new();
            for export in &analysis.exports {
                if let Some(source) = &export.re_export_source {
                    if re_exports.contains_key(source) {
                        continue;
                    }
                    let synthetic = ImportRecord::new(
                        "",
                        "",
                        source.clone(),
                        crate::shared::models::ImportKind::Named,
                        export.location.clone(),
                    );
                    let target =
                        resolver.resolve(&analysis.file_path, &synthetic, analysis.language);
                    re_exports.insert(source.clone(), target);
                }
            }
            if !re_exports.is_empty() {
                graph
                    .re_export_targets
                    .insert(analysis.file_path.clone(), re_exports);
            }
        }

        graph.build_dependency_maps();
        debug!(
            files = graph.imports_by_file.len(),
            cycles = graph.cycles.len(),
            "module graph built"
        );
        (graph, errors)
    }

    fn build_dependency_maps(&mut self) {
        let mut petgraph: DiGraph<String, ()> = DiGraph::new();
        let mut index: HashMap<String, NodeIndex> = HashMap::new();
        for path in self.imports_by_file.keys() {
            let idx = petgraph.add_node(path.clone());
            index.insert(path.clone(), idx);
        }

        for (path, imports) in &self.imports_by_file {
            let deps: BTreeSet<String> = imports
                .iter()
                .filter_map(|i| i.target_file())
                .filter(|target| *target != path)
                .map(|t| t.to_string())
                .collect();
            for dep in &deps {
                if let (Some(&from), Some(&to)) = (index.get(path), index.get(dep)) {
                    petgraph.add_edge(from, to, ());
                }
                self.dependents
                    .entry(dep.clone())
                    .or_default()
                    .push(path.clone());
            }
            self.dependencies
                .insert(path.clone(), deps.into_iter().collect());
        }
        for list in self.dependents.values_mut() {
            list.sort();
            list.dedup();
        }

        // Cycles via Tarjan SCC; anything larger than one node is a cycle.
        self.cycles = tarjan_scc(&petgraph)
            .into_iter()
            .filter(|scc| scc.len() > 1)
            .map(|scc| {
                let mut names: Vec<String> =
                    scc.into_iter().map(|i| petgraph[i].clone()).collect();
                names.sort();
                names
            })
            .collect();
        self.cycles.sort();

        // Kahn's algorithm with a sorted frontier for reproducible output;
        // cycle members are appended in path order at the end.
        let mut in_degree: BTreeMap<String, usize> = self
            .imports_by_file
            .keys()
            .map(|path| (path.clone(), 0))
            .collect();
        for deps in self.dependencies.values() {
            for dep in deps {
                if let Some(count) = in_degree.get_mut(dep) {
                    *count += 1;
                }
            }
        }
        let mut frontier: BTreeSet<String> = in_degree
            .iter()
            .filter(|(_, count)| **count == 0)
            .map(|(path, _)| path.clone())
            .collect();
        let mut order = Vec::with_capacity(in_degree.len());
        while let Some(path) = frontier.iter().next().cloned() {
            frontier.remove(&path);
            order.push(path.clone());
            for dep in self.dependencies.get(&path).cloned().unwrap_or_default() {
                if let Some(count) = in_degree.get_mut(&dep) {
                    *count -= 1;
                    if *count == 0 {
                        frontier.insert(dep);
                    }
                }
            }
        }
        for path in in_degree.keys() {
            if !order.contains(path) {
                order.push(path.clone());
            }
        }
        self.topological_order = order;
    }

    pub fn resolved_imports(&self, file: &str) -> &[ResolvedImport] {
        self.imports_by_file
            .get(file)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn exports(&self, file: &str) -> &[ExportRecord] {
        self.exports_by_file
            .get(file)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// The resolved import binding `local` in `file`, if any.
    pub fn import_of(&self, file: &str, local: &str) -> Option<&ResolvedImport> {
        self.resolved_imports(file)
            .iter()
            .find(|i| i.record.local_name == local)
    }

    /// Namespace imports of `file` (for `ns.member()` dispatch).
    pub fn namespace_import_of(&self, file: &str, local: &str) -> Option<&ResolvedImport> {
        self.resolved_imports(file)
            .iter()
            .find(|i| i.record.local_name == local && i.record.is_namespace())
    }

    /// Resolved target of a re-export source declared in `file`.
    pub fn re_export_target(&self, file: &str, source: &str) -> Option<&str> {
        match self.re_export_targets.get(file)?.get(source)? {
            ImportTarget::File(path) => Some(path),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::models::{ImportKind, Location};

    fn file_set(paths: &[&str]) -> FileSet {
        FileSet::new(paths.iter().map(|s| s.to_string()))
    }

    fn record(source: &str, kind: ImportKind) -> ImportRecord {
        ImportRecord::new("x", "x", source, kind, Location::default())
    }

    #[test]
    fn test_join_normalize() {
        assert_eq!(join_normalize("src", "./ops").as_deref(), Some("src/ops"));
        assert_eq!(join_normalize("src/a", "../b").as_deref(), Some("src/b"));
        assert_eq!(join_normalize("", "../escape"), None);
    }

    #[test]
    fn test_js_relative_with_extension_probe() {
        let files = file_set(&["src/main.ts", "src/ops.ts"]);
        let manifests = PackageManifests::new();
        let resolver = ModuleResolver::new(&files, &manifests);

        let target = resolver.resolve(
            "src/main.ts",
            &record("./ops", ImportKind::Named),
            Language::Typescript,
        );
        assert_eq!(target, ImportTarget::File("src/ops.ts".to_string()));
    }

    #[test]
    fn test_js_directory_index() {
        let files = file_set(&["src/main.ts", "src/math/index.ts"]);
        let manifests = PackageManifests::new();
        let resolver = ModuleResolver::new(&files, &manifests);

        let target = resolver.resolve(
            "src/main.ts",
            &record("./math", ImportKind::Namespace),
            Language::Typescript,
        );
        assert_eq!(target, ImportTarget::File("src/math/index.ts".to_string()));
    }

    #[test]
    fn test_js_node_builtin_external() {
        let files = file_set(&["index.js"]);
        let manifests = PackageManifests::new();
        let resolver = ModuleResolver::new(&files, &manifests);

        let target = resolver.resolve(
            "index.js",
            &record("node:fs", ImportKind::Namespace),
            Language::Javascript,
        );
        assert_eq!(target, ImportTarget::External);
    }

    #[test]
    fn test_js_bare_specifier_via_manifest() {
        let files = file_set(&["app/main.js", "packages/lib/src/index.js"]);
        let mut manifests = PackageManifests::new();
        manifests.add_package_json(
            "packages/lib/package.json",
            r#"{"name": "lib", "main": "./src/index.js"}"#,
        );
        let resolver = ModuleResolver::new(&files, &manifests);

        let target = resolver.resolve(
            "app/main.js",
            &record("lib", ImportKind::Default),
            Language::Javascript,
        );
        assert_eq!(
            target,
            ImportTarget::File("packages/lib/src/index.js".to_string())
        );
    }

    #[test]
    fn test_python_relative_dots() {
        let files = file_set(&["pkg/sub/main.py", "pkg/utils.py", "pkg/__init__.py"]);
        let manifests = PackageManifests::new();
        let resolver = ModuleResolver::new(&files, &manifests);

        // Two dots: one parent up from pkg/sub.
        let target = resolver.resolve(
            "pkg/sub/main.py",
            &record("..utils", ImportKind::Named),
            Language::Python,
        );
        assert_eq!(target, ImportTarget::File("pkg/utils.py".to_string()));
    }

    #[test]
    fn test_python_absolute_from_package_root() {
        let files = file_set(&[
            "pkg/__init__.py",
            "pkg/lib.py",
            "pkg/sub/__init__.py",
            "pkg/sub/main.py",
        ]);
        let manifests = PackageManifests::new();
        let resolver = ModuleResolver::new(&files, &manifests);

        let target = resolver.resolve(
            "pkg/sub/main.py",
            &record("pkg.lib", ImportKind::Named),
            Language::Python,
        );
        assert_eq!(target, ImportTarget::File("pkg/lib.py".to_string()));
    }

    #[test]
    fn test_python_stdlib_external_unknown_unresolved() {
        let files = file_set(&["main.py"]);
        let manifests = PackageManifests::new();
        let resolver = ModuleResolver::new(&files, &manifests);

        let os = resolver.resolve(
            "main.py",
            &record("os", ImportKind::Namespace),
            Language::Python,
        );
        assert_eq!(os, ImportTarget::External);

        let missing = resolver.resolve(
            "main.py",
            &record("vendorlib", ImportKind::Namespace),
            Language::Python,
        );
        assert_eq!(missing, ImportTarget::Unresolved);
    }

    #[test]
    fn test_python_name_then_package_init() {
        let files = file_set(&["main.py", "lib/__init__.py"]);
        let manifests = PackageManifests::new();
        let resolver = ModuleResolver::new(&files, &manifests);

        let target = resolver.resolve(
            "main.py",
            &record("lib", ImportKind::Namespace),
            Language::Python,
        );
        assert_eq!(target, ImportTarget::File("lib/__init__.py".to_string()));
    }

    #[test]
    fn test_rust_crate_path() {
        let files = file_set(&["src/lib.rs", "src/a.rs", "src/b.rs"]);
        let manifests = PackageManifests::new();
        let resolver = ModuleResolver::new(&files, &manifests);

        let target = resolver.resolve(
            "src/b.rs",
            &record("crate::a", ImportKind::Named),
            Language::Rust,
        );
        assert_eq!(target, ImportTarget::File("src/a.rs".to_string()));
    }

    #[test]
    fn test_rust_mod_rs_fallback() {
        let files = file_set(&["src/main.rs", "src/util/mod.rs"]);
        let manifests = PackageManifests::new();
        let resolver = ModuleResolver::new(&files, &manifests);

        let target = resolver.resolve(
            "src/main.rs",
            &record("crate::util", ImportKind::Named),
            Language::Rust,
        );
        assert_eq!(target, ImportTarget::File("src/util/mod.rs".to_string()));
    }

    #[test]
    fn test_rust_std_external() {
        let files = file_set(&["src/main.rs"]);
        let manifests = PackageManifests::new();
        let resolver = ModuleResolver::new(&files, &manifests);

        let target = resolver.resolve(
            "src/main.rs",
            &record("std::collections", ImportKind::Named),
            Language::Rust,
        );
        assert_eq!(target, ImportTarget::External);
    }

    #[test]
    fn test_rust_workspace_member() {
        let files = file_set(&["app/src/main.rs", "libs/util/src/lib.rs"]);
        let mut manifests = PackageManifests::new();
        manifests.add_cargo_toml("libs/util/Cargo.toml", "[package]\nname = \"util\"\n");
        let resolver = ModuleResolver::new(&files, &manifests);

        let target = resolver.resolve(
            "app/src/main.rs",
            &record("util", ImportKind::Namespace),
            Language::Rust,
        );
        assert_eq!(target, ImportTarget::File("libs/util/src/lib.rs".to_string()));
    }

    #[test]
    fn test_dependency_maps_and_topo_determinism() {
        use crate::analysis::FileAnalysis;
        use crate::languages::Language;

        fn analysis_with_import(path: &str, source: &str) -> FileAnalysis {
            let code = format!("from {} import x\n", source);
            let mut parser = Language::Python
                .parser(std::path::Path::new(path))
                .unwrap();
            crate::analysis::analyze_source(path, Language::Python, &code, &mut parser)
        }

        let files = file_set(&["a.py", "b.py", "c.py"]);
        let manifests = PackageManifests::new();
        let a = analysis_with_import("a.py", "b");
        let b = analysis_with_import("b.py", "c");
        let c = {
            let mut parser = Language::Python.parser(std::path::Path::new("c.py")).unwrap();
            crate::analysis::analyze_source("c.py", Language::Python, "x = 1\n", &mut parser)
        };

        let (graph1, errors) =
            ModuleGraph::build(&[a.clone(), b.clone(), c.clone()], &files, &manifests);
        assert!(errors.is_empty());
        assert_eq!(graph1.dependencies["a.py"], vec!["b.py".to_string()]);
        assert_eq!(graph1.dependents["b.py"], vec!["a.py".to_string()]);

        // Input permutation changes nothing.
        let (graph2, _) = ModuleGraph::build(&[c, a, b], &files, &manifests);
        assert_eq!(graph1.topological_order, graph2.topological_order);
        assert_eq!(
            serde_json::to_string(&graph1).unwrap(),
            serde_json::to_string(&graph2).unwrap()
        );
    }

    #[test]
    fn test_cycle_detection() {
        use crate::languages::Language;

        let files = file_set(&["a.py", "b.py"]);
        let manifests = PackageManifests::new();
        let make = |path: &str, target: &str| {
            let code = format!("from {} import x\n", target);
            let mut parser = Language::Python
                .parser(std::path::Path::new(path))
                .unwrap();
            crate::analysis::analyze_source(path, Language::Python, &code, &mut parser)
        };

        let (graph, _) = ModuleGraph::build(&[make("a.py", "b"), make("b.py", "a")], &files, &manifests);
        assert_eq!(graph.cycles.len(), 1);
        assert_eq!(
            graph.cycles[0],
            vec!["a.py".to_string(), "b.py".to_string()]
        );
        // Cyclic graphs still produce a complete order.
        assert_eq!(graph.topological_order.len(), 2);
    }
}
