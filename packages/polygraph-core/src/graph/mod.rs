//! Terminal graph artifacts

mod call_graph;
mod code_graph;
mod symbol_index;

pub use call_graph::{CallGraph, CallGraphNode};
pub use code_graph::{FileGraph, ProjectGraph, ProjectMetadata};
pub use symbol_index::{IndexedSymbol, SymbolIndex};
