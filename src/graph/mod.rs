//! Cross-reference graph: verse and topic nodes joined by footnote edges.
//!
//! - **Builder** ([`build`]): materializes a corrected [`ScriptureGraph`]
//!   into a [`CrossRefGraph`], one node per verse or topic and one edge per
//!   distinct reference.
//! - **Similarity** ([`similarity`]): adds bidirectional suggested edges
//!   tagged `jaccard` or `use`.
//! - **Export** ([`export`]): node-link snapshot, per-verse connections and
//!   the navigation tree consumed by the serving layer.
//!
//! [`ScriptureGraph`]: crate::model::ScriptureGraph

pub mod build;
pub mod export;
pub mod index;
pub mod similarity;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::canon::{BookCode, Volume, verse_sort_key};
use crate::model::{GuidePrefix, NodeKey};

pub use build::{BuildReport, GraphBuilder};
pub use index::CrossRefGraph;
pub use similarity::{AugmentMode, AugmentReport, SimilarityAugmenter};

/// A node of the graph, tagged by `kind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeData {
    Verse {
        id: NodeKey,
        volume: Volume,
        book: BookCode,
        chapter: u32,
        verse: u32,
        /// Verse text, kept so similarity can be recomputed from a snapshot.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        text: Option<String>,
    },
    Topic {
        id: NodeKey,
        volume: Volume,
        source: GuidePrefix,
        title: String,
    },
}

impl NodeData {
    pub fn key(&self) -> &NodeKey {
        match self {
            Self::Verse { id, .. } | Self::Topic { id, .. } => id,
        }
    }

    pub fn volume(&self) -> Volume {
        match self {
            Self::Verse { volume, .. } | Self::Topic { volume, .. } => *volume,
        }
    }

    pub fn is_verse(&self) -> bool {
        matches!(self, Self::Verse { .. })
    }

    pub fn is_topic(&self) -> bool {
        matches!(self, Self::Topic { .. })
    }

    /// Canonical sort key. Topics sort after every verse, by key.
    pub fn sort_key(&self) -> (usize, u32, u32, &str) {
        match self {
            Self::Verse {
                id,
                book,
                chapter,
                verse,
                ..
            } => {
                let (order, chapter, verse) = verse_sort_key(*book, *chapter, *verse);
                (order, chapter, verse, id.as_str())
            }
            Self::Topic { id, .. } => (usize::MAX, 0, 0, id.as_str()),
        }
    }
}

/// Origin of a suggested edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    /// Shared-neighbor overlap.
    Jaccard,
    /// Sentence-embedding similarity.
    Use,
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Jaccard => "jaccard",
            Self::Use => "use",
        })
    }
}

/// Edge data stored on petgraph edges. Canonical footnote edges carry no
/// kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<EdgeKind>,
}

impl EdgeData {
    pub fn canonical() -> Self {
        Self { kind: None }
    }

    pub fn suggested(kind: EdgeKind) -> Self {
        Self { kind: Some(kind) }
    }

    pub fn is_canonical(&self) -> bool {
        self.kind.is_none()
    }
}
