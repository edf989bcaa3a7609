//! Call graph
//!
//! Nodes keyed by symbol ID, edges indexed into a flat list. Synthetic and
//! builtin callees become nodes too, so every edge endpoint exists in the
//! node set. Entry points are the nodes no edge calls.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::analysis::FileAnalysis;
use crate::project::ResolutionOutput;
use crate::shared::models::{CallKind, CallRecord, DefKind, SymbolId};

/// One node of the call graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallGraphNode {
    pub symbol: SymbolId,
    pub signature: String,
    /// Outgoing edge indices.
    pub calls: Vec<usize>,
    /// Incoming edge indices.
    pub called_by: Vec<usize>,
    pub is_entry_point: bool,
}

impl CallGraphNode {
    fn new(symbol: SymbolId, signature: String) -> Self {
        Self {
            symbol,
            signature,
            calls: Vec::new(),
            called_by: Vec::new(),
            is_entry_point: false,
        }
    }
}

/// The project call graph.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CallGraph {
    pub nodes: BTreeMap<SymbolId, CallGraphNode>,
    pub edges: Vec<CallRecord>,
}

impl CallGraph {
    pub fn build(analyses: &[FileAnalysis], resolution: &ResolutionOutput) -> CallGraph {
        let mut graph = CallGraph::default();

        // Every callable definition (and every module) is a node, called or
        // not, so entry-point detection sees the whole surface.
        for analysis in analyses {
            for def in &analysis.definitions {
                if def.kind.is_callable() || def.kind == DefKind::Module {
                    let signature = match def.callable_info() {
                        Some(info) => format!("{}({})", def.name, info.params.join(", ")),
                        None => def.name.clone(),
                    };
                    graph
                        .nodes
                        .entry(def.id.clone())
                        .or_insert_with(|| CallGraphNode::new(def.id.clone(), signature));
                }
            }
        }

        // Edges, in path order (the resolution output is a sorted map).
        for records in resolution.calls_by_file.values() {
            for record in records {
                let index = graph.edges.len();
                graph.edges.push(record.clone());
                graph.ensure_node(&record.caller).calls.push(index);
                graph.ensure_node(&record.callee).called_by.push(index);
            }
        }

        for node in graph.nodes.values_mut() {
            node.is_entry_point = node.called_by.is_empty();
        }
        graph
    }

    fn ensure_node(&mut self, symbol: &SymbolId) -> &mut CallGraphNode {
        self.nodes.entry(symbol.clone()).or_insert_with(|| {
            CallGraphNode::new(symbol.clone(), symbol.name().to_string())
        })
    }

    pub fn node(&self, symbol: &SymbolId) -> Option<&CallGraphNode> {
        self.nodes.get(symbol)
    }

    /// Outgoing edges of a symbol.
    pub fn calls_from(&self, symbol: &SymbolId) -> Vec<&CallRecord> {
        self.nodes
            .get(symbol)
            .map(|n| n.calls.iter().map(|&i| &self.edges[i]).collect())
            .unwrap_or_default()
    }

    /// Incoming edges of a symbol.
    pub fn calls_to(&self, symbol: &SymbolId) -> Vec<&CallRecord> {
        self.nodes
            .get(symbol)
            .map(|n| n.called_by.iter().map(|&i| &self.edges[i]).collect())
            .unwrap_or_default()
    }

    pub fn entry_points(&self) -> impl Iterator<Item = &CallGraphNode> {
        self.nodes.values().filter(|n| n.is_entry_point)
    }

    pub fn method_edges(&self) -> impl Iterator<Item = &CallRecord> {
        self.edges.iter().filter(|e| e.kind == CallKind::Method)
    }

    /// Every edge endpoint exists in the node set; violations are bugs.
    pub fn check_integrity(&self) -> bool {
        self.edges
            .iter()
            .all(|e| self.nodes.contains_key(&e.caller) && self.nodes.contains_key(&e.callee))
    }
}
