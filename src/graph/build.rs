//! Materialize corrected records into a [`CrossRefGraph`].

use serde::Serialize;
use tracing::{info, warn};

use crate::canon::Volume;
use crate::error::{GraphError, GraphResult};
use crate::model::{NodeKey, Reference, ScriptureGraph, Topic, Verse};

use super::{CrossRefGraph, EdgeData, NodeData};

/// Counts from one build.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildReport {
    pub nodes: usize,
    pub edges: usize,
    /// References collapsed onto an existing edge.
    pub duplicates: usize,
    /// References with a topic endpoint, skipped because topics are excluded.
    pub skipped_topic_edges: usize,
}

/// Builds the cross-reference graph.
#[derive(Debug, Clone)]
pub struct GraphBuilder {
    include_topics: bool,
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self {
            include_topics: true,
        }
    }
}

impl GraphBuilder {
    pub fn new(include_topics: bool) -> Self {
        Self { include_topics }
    }

    /// One node per verse (and topic, when included), one edge per distinct
    /// reference. A reference to a node that was never created fails, as does
    /// a reference from a node to itself.
    pub fn build(&self, records: &ScriptureGraph) -> GraphResult<(CrossRefGraph, BuildReport)> {
        let mut graph = CrossRefGraph::new();
        let mut report = BuildReport::default();

        for verse in records.verses.values() {
            graph.add_node(verse_node(verse));
        }
        if self.include_topics {
            for topic in records.topics.values() {
                graph.add_node(topic_node(topic)?);
            }
        }

        for Reference { source, target } in &records.references {
            if source == target {
                return Err(GraphError::SelfReference {
                    source_key: source.to_string(),
                    target_key: target.to_string(),
                });
            }
            if !self.include_topics && (source.is_topic() || target.is_topic()) {
                report.skipped_topic_edges += 1;
                continue;
            }
            let missing = |key: &NodeKey| GraphError::MissingNode {
                key: key.to_string(),
                source_key: source.to_string(),
                target_key: target.to_string(),
            };
            let s = graph.index_of(source).ok_or_else(|| missing(source))?;
            let t = graph.index_of(target).ok_or_else(|| missing(target))?;
            if !graph.add_edge(s, t, EdgeData::canonical()) {
                report.duplicates += 1;
            }
        }

        report.nodes = graph.node_count();
        report.edges = graph.edge_count();
        if report.duplicates > 0 {
            warn!(duplicates = report.duplicates, "collapsed duplicate references");
        }
        info!(
            nodes = report.nodes,
            edges = report.edges,
            skipped_topic_edges = report.skipped_topic_edges,
            "built graph"
        );
        Ok((graph, report))
    }
}

fn verse_node(verse: &Verse) -> NodeData {
    NodeData::Verse {
        id: verse.key(),
        volume: verse.book.volume(),
        book: verse.book,
        chapter: verse.chapter,
        verse: verse.verse,
        text: verse.text.clone(),
    }
}

fn topic_node(topic: &Topic) -> GraphResult<NodeData> {
    let book = topic.source.book().ok_or_else(|| GraphError::UnknownBook {
        book: topic.source.to_string(),
    })?;
    let volume = book.volume();
    if volume != Volume::StudyHelps {
        return Err(GraphError::UnknownBook {
            book: book.to_string(),
        });
    }
    Ok(NodeData::Topic {
        id: topic.key(),
        volume,
        source: topic.source,
        title: topic.title.clone(),
    })
}
