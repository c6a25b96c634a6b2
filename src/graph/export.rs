//! Read-only outputs of a built graph.
//!
//! - [`Snapshot`]: node-link JSON of the whole graph, the persisted form
//!   every downstream consumer loads.
//! - [`connections`]: per-verse incoming, outgoing and suggested lists.
//! - [`navigation_tree`]: volume, book, chapter and verse hierarchy for the
//!   sidebar.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use petgraph::Direction;
use serde::{Deserialize, Serialize};

use crate::canon::{BookCode, Volume, sort_verse_keys};
use crate::error::{GraphError, GraphResult};
use crate::model::NodeKey;

use super::{CrossRefGraph, EdgeData, EdgeKind, NodeData};

// ── Snapshot ────────────────────────────────────────────────────────────

/// One edge of a [`Snapshot`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub source: NodeKey,
    pub target: NodeKey,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<EdgeKind>,
}

/// Node-link form of a [`CrossRefGraph`], in canonical order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub directed: bool,
    pub multigraph: bool,
    pub nodes: Vec<NodeData>,
    pub links: Vec<Link>,
}

impl Snapshot {
    pub fn from_graph(graph: &CrossRefGraph) -> Self {
        let mut nodes: Vec<NodeData> = graph.nodes().cloned().collect();
        nodes.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));

        let mut links: Vec<(_, _, Link)> = graph
            .edges()
            .map(|(s, t, e)| {
                (
                    s.sort_key(),
                    t.sort_key(),
                    Link {
                        source: s.key().clone(),
                        target: t.key().clone(),
                        kind: e.kind,
                    },
                )
            })
            .collect();
        links.sort_by(|a, b| (&a.0, &a.1, a.2.kind).cmp(&(&b.0, &b.1, b.2.kind)));

        Self {
            directed: true,
            multigraph: true,
            nodes,
            links: links.into_iter().map(|(_, _, link)| link).collect(),
        }
    }

    /// Rebuild the graph. A link to an absent node fails.
    pub fn into_graph(self) -> GraphResult<CrossRefGraph> {
        let mut graph = CrossRefGraph::new();
        for node in self.nodes {
            graph.add_node(node);
        }
        for link in self.links {
            let missing = |key: &NodeKey| GraphError::MissingNode {
                key: key.to_string(),
                source_key: link.source.to_string(),
                target_key: link.target.to_string(),
            };
            let s = graph.index_of(&link.source).ok_or_else(|| missing(&link.source))?;
            let t = graph.index_of(&link.target).ok_or_else(|| missing(&link.target))?;
            graph.add_edge(s, t, EdgeData { kind: link.kind });
        }
        Ok(graph)
    }

    pub fn write(&self, path: &Path) -> GraphResult<()> {
        write_json(path, self)
    }

    pub fn read(path: &Path) -> GraphResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| snapshot_error(path, e))?;
        serde_json::from_str(&content).map_err(|e| snapshot_error(path, e))
    }
}

/// Write any serializable output as pretty JSON.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> GraphResult<()> {
    let json = serde_json::to_string_pretty(value).map_err(|e| snapshot_error(path, e))?;
    std::fs::write(path, json).map_err(|e| snapshot_error(path, e))
}

fn snapshot_error(path: &Path, e: impl std::fmt::Display) -> GraphError {
    GraphError::Snapshot {
        path: path.display().to_string(),
        message: e.to_string(),
    }
}

// ── Connections ─────────────────────────────────────────────────────────

/// Adjacency record of one verse. Empty lists are omitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    pub volume: Volume,
    pub book: BookCode,
    pub chapter: u32,
    pub verse: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub incoming: Vec<NodeKey>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub outgoing: Vec<NodeKey>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggested: Vec<NodeKey>,
}

/// Per-verse connections with topics stripped. Canonical edges split into
/// incoming and outgoing; a suggested edge in either direction lands in
/// `suggested`. Lists are in canonical order.
pub fn connections(graph: &CrossRefGraph) -> BTreeMap<NodeKey, Connection> {
    let graph = graph.strip_topics();
    let mut out = BTreeMap::new();
    for idx in graph.node_indices() {
        let NodeData::Verse {
            id,
            volume,
            book,
            chapter,
            verse,
            ..
        } = graph.node_at(idx)
        else {
            continue;
        };
        let mut incoming = BTreeSet::new();
        let mut outgoing = BTreeSet::new();
        let mut suggested = BTreeSet::new();
        for direction in [Direction::Incoming, Direction::Outgoing] {
            for (other, edge) in graph.edges_directed(idx, direction) {
                let key = graph.node_at(other).key().clone();
                match (edge.is_canonical(), direction) {
                    (false, _) => suggested.insert(key),
                    (true, Direction::Incoming) => incoming.insert(key),
                    (true, Direction::Outgoing) => outgoing.insert(key),
                };
            }
        }
        out.insert(
            id.clone(),
            Connection {
                volume: *volume,
                book: *book,
                chapter: *chapter,
                verse: *verse,
                incoming: sorted(incoming),
                outgoing: sorted(outgoing),
                suggested: sorted(suggested),
            },
        );
    }
    out
}

fn sorted(keys: BTreeSet<NodeKey>) -> Vec<NodeKey> {
    let mut keys: Vec<NodeKey> = keys.into_iter().collect();
    sort_verse_keys(&mut keys);
    keys
}

// ── Navigation tree ─────────────────────────────────────────────────────

/// A node of the sidebar tree. Leaves carry the verse key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeNode {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<NodeKey>,
    pub folder: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    fn folder(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            key: None,
            folder: true,
            children: Vec::new(),
        }
    }
}

/// Volume → book → chapter → verse, in canonical order, over verse nodes.
pub fn navigation_tree(graph: &CrossRefGraph) -> Vec<TreeNode> {
    let mut verses: BTreeMap<(usize, u32, u32, &str), (Volume, BookCode, u32, u32)> =
        BTreeMap::new();
    for node in graph.nodes() {
        if let NodeData::Verse {
            volume,
            book,
            chapter,
            verse,
            ..
        } = node
        {
            verses.insert(node.sort_key(), (*volume, *book, *chapter, *verse));
        }
    }

    let mut tree: Vec<TreeNode> = Vec::new();
    let mut last: Option<(Volume, BookCode, u32)> = None;
    for ((.., key), (volume, book, chapter, verse)) in verses {
        let same_volume = last.is_some_and(|(v, ..)| v == volume);
        let same_book = same_volume && last.is_some_and(|(_, b, _)| b == book);
        let same_chapter = same_book && last.is_some_and(|(.., c)| c == chapter);
        if !same_volume {
            tree.push(TreeNode::folder(volume.name()));
        }
        let Some(volume_node) = tree.last_mut() else {
            continue;
        };
        if !same_book {
            volume_node.children.push(TreeNode::folder(book.name()));
        }
        let Some(book_node) = volume_node.children.last_mut() else {
            continue;
        };
        if !same_chapter {
            book_node
                .children
                .push(TreeNode::folder(format!("{book} {chapter}")));
        }
        let Some(chapter_node) = book_node.children.last_mut() else {
            continue;
        };
        chapter_node.children.push(TreeNode {
            title: verse.to_string(),
            key: Some(NodeKey::from(key)),
            folder: false,
            children: Vec::new(),
        });
        last = Some((volume, book, chapter));
    }
    tree
}
