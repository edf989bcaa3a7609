//! Project-wide layers (5–9)
//!
//! Single-threaded folds over the per-file analyses, in strict order:
//! module graph, type registry, inheritance, symbol table, resolution. All
//! registries are frozen before the resolution pass reads them.

pub mod inheritance;
pub mod module_graph;
pub mod resolve;
pub mod symbol_table;
pub mod type_registry;

pub use inheritance::{ClassHierarchy, ClassNode};
pub use module_graph::{
    FileSet, ImportTarget, ModuleGraph, PackageManifests, ResolvedImport,
};
pub use resolve::{ResolutionOutput, ResolutionStats, Resolver};
pub use symbol_table::{SymbolEntry, SymbolTable};
pub use type_registry::{MethodEntry, PropertyEntry, TypeEntry, TypeRegistry};
