//! Symbol index
//!
//! The global symbol table enriched with back-references: for every symbol,
//! where it is called and where it is referenced.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::project::{ResolutionOutput, SymbolEntry, SymbolTable};
use crate::shared::models::{Location, SymbolId};

/// A symbol with its use sites.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexedSymbol {
    pub entry: SymbolEntry,
    /// Call sites whose callee resolved to this symbol.
    pub call_sites: Vec<Location>,
    /// References bound to this symbol.
    pub references: Vec<Location>,
}

/// Queryable index over every declared (and builtin) symbol.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SymbolIndex {
    entries: BTreeMap<SymbolId, IndexedSymbol>,
}

impl SymbolIndex {
    pub fn build(table: &SymbolTable, resolution: &ResolutionOutput) -> SymbolIndex {
        let mut index = SymbolIndex::default();
        for entry in table.iter() {
            index.entries.insert(
                entry.id.clone(),
                IndexedSymbol {
                    entry: entry.clone(),
                    call_sites: Vec::new(),
                    references: Vec::new(),
                },
            );
        }

        for records in resolution.calls_by_file.values() {
            for record in records {
                if let Some(indexed) = index.entries.get_mut(&record.callee) {
                    indexed.call_sites.push(record.location.clone());
                }
            }
        }
        for references in resolution.references_by_file.values() {
            for resolved in references {
                if let Some(symbol) = resolved.state.symbol() {
                    if let Some(indexed) = index.entries.get_mut(symbol) {
                        indexed
                            .references
                            .push(resolved.reference.location.clone());
                    }
                }
            }
        }
        index
    }

    pub fn get(&self, id: &SymbolId) -> Option<&IndexedSymbol> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &SymbolId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &IndexedSymbol> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All symbols declared in one file.
    pub fn in_file<'a>(&'a self, file: &'a str) -> impl Iterator<Item = &'a IndexedSymbol> {
        self.entries.values().filter(move |s| s.entry.file == file)
    }
}
