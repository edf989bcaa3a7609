//! Global symbol table (layer 8)
//!
//! Records a final entry for every definition in the project, the export
//! surface of every file, and stable synthetic IDs for language builtins.
//! Re-exports bind the re-exporter's name to the upstream definition; a Rust
//! `pub use` additionally keeps its own alias entry whose `alias_of` points
//! at the upstream symbol, so both addresses stay queryable.
//!
//! Collection fans out over files with rayon into a lock-free map, then
//! folds into ordered maps so serialized output is deterministic.

use dashmap::DashMap;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::module_graph::ModuleGraph;
use crate::analysis::FileAnalysis;
use crate::languages::{policy_for, Language};
use crate::shared::models::{DefKind, ImportKind, Span, SymbolId, Visibility, BUILTIN_FILE};

/// One symbol in the global table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolEntry {
    pub id: SymbolId,
    pub name: String,
    pub kind: DefKind,
    pub file: String,
    pub span: Span,
    pub visibility: Visibility,
    pub is_exported: bool,
    pub is_imported: bool,
    /// Upstream symbol for re-export alias entries.
    pub alias_of: Option<SymbolId>,
}

/// Project-wide symbol table, frozen before reference resolution.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SymbolTable {
    entries: BTreeMap<SymbolId, SymbolEntry>,
    /// file → export name → definition symbol (direct bindings only; glob
    /// re-exports are chased through [`SymbolTable::resolve_export`]).
    exports: BTreeMap<String, BTreeMap<String, SymbolId>>,
}

impl SymbolTable {
    pub fn build(analyses: &[FileAnalysis], modules: &ModuleGraph) -> SymbolTable {
        // Parallel collection; first definition of an ID wins (duplicates can
        // only come from rebindings of one variable).
        let collected: DashMap<SymbolId, SymbolEntry> = DashMap::new();
        analyses.par_iter().for_each(|analysis| {
            for def in &analysis.definitions {
                let entry = SymbolEntry {
                    id: def.id.clone(),
                    name: def.name.clone(),
                    kind: def.kind,
                    file: analysis.file_path.clone(),
                    span: def.location.span,
                    visibility: def.visibility,
                    is_exported: def.is_exported,
                    is_imported: def.kind == DefKind::Import,
                    alias_of: None,
                };
                collected.entry(def.id.clone()).or_insert(entry);
            }
        });

        let mut table = SymbolTable {
            entries: collected.into_iter().collect(),
            exports: BTreeMap::new(),
        };

        // Builtins for every language present in the project.
        let languages: BTreeSet<Language> = analyses.iter().map(|a| a.language).collect();
        for language in languages {
            for name in policy_for(language).builtins() {
                let id = SymbolId::builtin(language.as_str(), name);
                table.entries.entry(id.clone()).or_insert(SymbolEntry {
                    id,
                    name: name.to_string(),
                    kind: DefKind::Function,
                    file: BUILTIN_FILE.to_string(),
                    span: Span::zero(),
                    visibility: Visibility::Public,
                    is_exported: false,
                    is_imported: false,
                    alias_of: None,
                });
            }
        }

        // Export surfaces: direct bindings now, re-export chains after.
        for analysis in analyses {
            let mut surface = BTreeMap::new();
            for export in &analysis.exports {
                if let Some(symbol) = &export.symbol {
                    surface.insert(export.export_name.clone(), symbol.clone());
                }
            }
            table.exports.insert(analysis.file_path.clone(), surface);
        }

        // Chase named re-exports into the static surface and attach alias
        // entries to their import definitions.
        let mut resolved_bindings = Vec::new();
        for analysis in analyses {
            for export in &analysis.exports {
                if export.re_export_source.is_none() || export.is_glob() {
                    continue;
                }
                if let Some(upstream) = table.resolve_export_inner(
                    modules,
                    &analysis.file_path,
                    &export.export_name,
                    &mut BTreeSet::new(),
                ) {
                    resolved_bindings.push((
                        analysis.file_path.clone(),
                        export.export_name.clone(),
                        upstream,
                    ));
                }
            }
        }
        for (file, name, upstream) in resolved_bindings {
            let alias_id = SymbolId::local(&file, "", &name, DefKind::Import.tag());
            if let Some(alias_entry) = table.entries.get_mut(&alias_id) {
                alias_entry.alias_of = Some(upstream.clone());
                alias_entry.is_exported = true;
            }
            table
                .exports
                .entry(file)
                .or_default()
                .insert(name, upstream);
        }

        table
    }

    pub fn get(&self, id: &SymbolId) -> Option<&SymbolEntry> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &SymbolId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SymbolEntry> {
        self.entries.values()
    }

    /// Direct export binding, no chain following.
    pub fn export_of(&self, file: &str, name: &str) -> Option<&SymbolId> {
        self.exports.get(file)?.get(name)
    }

    /// Resolve an exported name in `file`, following re-export chains
    /// (renames and globs) with a cycle guard.
    pub fn resolve_export(
        &self,
        modules: &ModuleGraph,
        file: &str,
        name: &str,
    ) -> Option<SymbolId> {
        self.resolve_export_inner(modules, file, name, &mut BTreeSet::new())
    }

    fn resolve_export_inner(
        &self,
        modules: &ModuleGraph,
        file: &str,
        name: &str,
        visited: &mut BTreeSet<(String, String)>,
    ) -> Option<SymbolId> {
        if !visited.insert((file.to_string(), name.to_string())) {
            return None;
        }
        if let Some(symbol) = self.export_of(file, name) {
            return Some(symbol.clone());
        }
        for export in modules.exports(file) {
            let Some(source) = &export.re_export_source else {
                continue;
            };
            let (matches, upstream_name) = if export.is_glob() {
                (true, name)
            } else if export.export_name == name {
                (true, export.local_name.as_str())
            } else {
                (false, name)
            };
            if !matches {
                continue;
            }
            if let Some(target) = modules.re_export_target(file, source) {
                let target = target.to_string();
                if let Some(symbol) =
                    self.resolve_export_inner(modules, &target, upstream_name, visited)
                {
                    return Some(symbol);
                }
            }
        }

        // Glob imports at module level re-bind upstream names, which makes
        // them part of this module's surface (Python package `__init__`
        // files lean on this).
        for import in modules.resolved_imports(file) {
            if import.record.kind != ImportKind::Glob {
                continue;
            }
            if let Some(target) = import.target_file() {
                let target = target.to_string();
                if let Some(symbol) = self.resolve_export_inner(modules, &target, name, visited) {
                    return Some(symbol);
                }
            }
        }
        None
    }
}
