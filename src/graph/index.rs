//! In-memory cross-reference graph with a key index.
//!
//! Uses `petgraph` for the graph structure and a `HashMap` for O(1) lookups
//! by [`NodeKey`].

use std::collections::HashMap;

use petgraph::Direction;
use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;

use crate::model::NodeKey;

use super::{EdgeData, EdgeKind, NodeData};

/// Directed graph of verses and topics, indexed by key.
///
/// At most one edge exists per `(source, target, kind)`; a canonical and a
/// suggested edge may share the same pair.
#[derive(Clone, Default)]
pub struct CrossRefGraph {
    graph: DiGraph<NodeData, EdgeData>,
    node_index: HashMap<NodeKey, NodeIndex>,
}

/// Edge totals by kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct EdgeCounts {
    pub canonical: usize,
    pub jaccard: usize,
    #[serde(rename = "use")]
    pub use_: usize,
}

impl CrossRefGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node, or replace the data of the node with the same key.
    pub fn add_node(&mut self, data: NodeData) -> NodeIndex {
        if let Some(&idx) = self.node_index.get(data.key()) {
            self.graph[idx] = data;
            return idx;
        }
        let key = data.key().clone();
        let idx = self.graph.add_node(data);
        self.node_index.insert(key, idx);
        idx
    }

    /// Insert an edge unless one with the same endpoints and kind exists.
    ///
    /// Returns `false` for a duplicate.
    pub fn add_edge(&mut self, source: NodeIndex, target: NodeIndex, data: EdgeData) -> bool {
        if self.has_edge_of(source, target, data.kind) {
            return false;
        }
        self.graph.add_edge(source, target, data);
        true
    }

    pub fn index_of(&self, key: &NodeKey) -> Option<NodeIndex> {
        self.node_index.get(key).copied()
    }

    pub fn node(&self, key: &NodeKey) -> Option<&NodeData> {
        self.index_of(key).map(|idx| &self.graph[idx])
    }

    pub fn node_at(&self, idx: NodeIndex) -> &NodeData {
        &self.graph[idx]
    }

    pub fn contains_node(&self, key: &NodeKey) -> bool {
        self.node_index.contains_key(key)
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Whether an edge `source -> target` of exactly this kind exists.
    pub fn has_edge_of(&self, source: NodeIndex, target: NodeIndex, kind: Option<EdgeKind>) -> bool {
        self.graph
            .edges_connecting(source, target)
            .any(|e| e.weight().kind == kind)
    }

    /// Whether any edge joins the pair, in either direction.
    pub fn connected(&self, a: NodeIndex, b: NodeIndex) -> bool {
        self.graph.find_edge(a, b).is_some() || self.graph.find_edge(b, a).is_some()
    }

    /// Node indices in insertion order.
    pub fn node_indices(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.node_indices()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &NodeData> + '_ {
        self.graph.node_weights()
    }

    /// Every edge as `(source, target, data)`.
    pub fn edges(&self) -> impl Iterator<Item = (&NodeData, &NodeData, &EdgeData)> + '_ {
        self.graph
            .edge_references()
            .map(|e| (&self.graph[e.source()], &self.graph[e.target()], e.weight()))
    }

    /// Edges leaving or entering a node.
    pub fn edges_directed(
        &self,
        idx: NodeIndex,
        direction: Direction,
    ) -> impl Iterator<Item = (NodeIndex, &EdgeData)> + '_ {
        self.graph.edges_directed(idx, direction).map(move |e| {
            let other = match direction {
                Direction::Outgoing => e.target(),
                Direction::Incoming => e.source(),
            };
            (other, e.weight())
        })
    }

    pub fn edge_counts(&self) -> EdgeCounts {
        let mut counts = EdgeCounts::default();
        for edge in self.graph.edge_weights() {
            match edge.kind {
                None => counts.canonical += 1,
                Some(EdgeKind::Jaccard) => counts.jaccard += 1,
                Some(EdgeKind::Use) => counts.use_ += 1,
            }
        }
        counts
    }

    /// A copy with every topic node and its edges removed.
    pub fn strip_topics(&self) -> CrossRefGraph {
        let mut out = CrossRefGraph::new();
        let mut remap: HashMap<NodeIndex, NodeIndex> = HashMap::new();
        for idx in self.graph.node_indices() {
            let node = &self.graph[idx];
            if node.is_verse() {
                remap.insert(idx, out.add_node(node.clone()));
            }
        }
        for e in self.graph.edge_references() {
            if let (Some(&s), Some(&t)) = (remap.get(&e.source()), remap.get(&e.target())) {
                out.graph.add_edge(s, t, *e.weight());
            }
        }
        out
    }

    /// Remove every suggested edge, leaving the canonical graph.
    pub fn clear_suggested(&mut self) -> usize {
        let suggested: Vec<EdgeIndex> = self
            .graph
            .edge_indices()
            .filter(|&e| !self.graph[e].is_canonical())
            .collect();
        // Remove from the highest index down; petgraph swaps the last edge in.
        for &e in suggested.iter().rev() {
            self.graph.remove_edge(e);
        }
        suggested.len()
    }
}

impl std::fmt::Debug for CrossRefGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CrossRefGraph")
            .field("nodes", &self.node_count())
            .field("edges", &self.edge_count())
            .finish()
    }
}
