//! Import and export records

use serde::{Deserialize, Serialize};

use super::scope::ScopeId;
use super::span::Location;
use super::symbol_id::SymbolId;

/// Shape of an import binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportKind {
    /// `import x from 'm'` / CommonJS default interop.
    Default,
    /// `import { x } from 'm'`, `from m import x`, `use m::x`.
    Named,
    /// Whole-module binding: `import * as ns`, `import m`, `require(...)`.
    Namespace,
    /// `from m import *`, `use m::*`.
    Glob,
    /// `import 'm'` for effect only; binds nothing.
    SideEffect,
}

/// One imported binding, before path resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportRecord {
    /// Name bound in the importing file.
    pub local_name: String,
    /// Name in the source module; `*` for namespace and glob imports.
    pub external_name: String,
    /// Module path text as written (`./ops`, `lib`, `crate::a`).
    pub source: String,
    pub kind: ImportKind,
    pub location: Location,
    pub scope: ScopeId,
}

impl ImportRecord {
    pub fn new(
        local_name: impl Into<String>,
        external_name: impl Into<String>,
        source: impl Into<String>,
        kind: ImportKind,
        location: Location,
    ) -> Self {
        Self {
            local_name: local_name.into(),
            external_name: external_name.into(),
            source: source.into(),
            kind,
            location,
            scope: ScopeId::ROOT,
        }
    }

    pub fn with_scope(mut self, scope: ScopeId) -> Self {
        self.scope = scope;
        self
    }

    pub fn is_namespace(&self) -> bool {
        matches!(self.kind, ImportKind::Namespace)
    }
}

/// One exported binding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportRecord {
    /// Name inside the exporting file.
    pub local_name: String,
    /// Name visible to importers; differs from `local_name` on renames.
    pub export_name: String,
    /// Definition symbol, when resolvable within the file at extraction time.
    pub symbol: Option<SymbolId>,
    pub is_default: bool,
    /// Source module for re-exports (`export { x } from '...'`, `pub use`).
    pub re_export_source: Option<String>,
    pub location: Location,
}

impl ExportRecord {
    pub fn new(
        local_name: impl Into<String>,
        export_name: impl Into<String>,
        location: Location,
    ) -> Self {
        Self {
            local_name: local_name.into(),
            export_name: export_name.into(),
            symbol: None,
            is_default: false,
            re_export_source: None,
            location,
        }
    }

    pub fn with_symbol(mut self, symbol: SymbolId) -> Self {
        self.symbol = Some(symbol);
        self
    }

    pub fn default_export(mut self) -> Self {
        self.is_default = true;
        self
    }

    pub fn re_exported_from(mut self, source: impl Into<String>) -> Self {
        self.re_export_source = Some(source.into());
        self
    }

    /// Glob re-export (`export * from 'm'`, `pub use m::*`).
    pub fn is_glob(&self) -> bool {
        self.export_name == "*"
    }
}
