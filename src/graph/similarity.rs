//! Suggested edges from structural and semantic similarity.
//!
//! Both passes work on the verse-only, undirected view of the graph and
//! insert bidirectional edges tagged with their origin. Neighborhoods come
//! from canonical edges only, so the candidate set never depends on edges a
//! previous run suggested.

use std::collections::{BTreeSet, HashMap};

use petgraph::Direction;
use petgraph::graph::NodeIndex;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::SimilarityConfig;
use crate::embed::{TextEmbedder, angular_similarity, embed_batched, normalize_verse_text};
use crate::error::{SimilarityError, SimilarityResult};

use super::{CrossRefGraph, EdgeData, EdgeKind, NodeData};

/// What counts as "already connected" when inserting a suggested pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AugmentMode {
    /// Any existing edge between the pair blocks it.
    #[default]
    Idempotent,
    /// Only a canonical edge or an edge of the same kind blocks it, so one
    /// pair may carry both a `jaccard` and a `use` suggestion.
    Additive,
}

/// Pairs inserted by one augmentation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AugmentReport {
    pub jaccard_candidates: usize,
    pub jaccard_pairs: usize,
    pub semantic_candidates: usize,
    pub semantic_pairs: usize,
}

/// A candidate pair with `a < b`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredPair {
    pub a: NodeIndex,
    pub b: NodeIndex,
    pub score: f64,
}

/// Runs the similarity passes configured in [`SimilarityConfig`].
pub struct SimilarityAugmenter<'a> {
    config: &'a SimilarityConfig,
    embedder: Option<&'a dyn TextEmbedder>,
}

impl<'a> SimilarityAugmenter<'a> {
    pub fn new(config: &'a SimilarityConfig, embedder: &'a dyn TextEmbedder) -> Self {
        Self {
            config,
            embedder: Some(embedder),
        }
    }

    /// An augmenter without a text embedder. Fails if the text pass is
    /// enabled.
    pub fn structural(config: &'a SimilarityConfig) -> Self {
        Self {
            config,
            embedder: None,
        }
    }

    /// Jaccard first, then semantic, each as enabled.
    pub fn augment(&self, graph: &mut CrossRefGraph) -> SimilarityResult<AugmentReport> {
        if self.config.run_semantic && self.embedder.is_none() {
            return Err(SimilarityError::MissingEmbedder);
        }
        let mut report = AugmentReport::default();
        if self.config.run_jaccard {
            let pairs = jaccard_pairs(
                graph,
                self.config.min_shared_neighbors,
                self.config.jaccard_threshold,
            );
            report.jaccard_candidates = pairs.len();
            report.jaccard_pairs = insert_pairs(graph, &pairs, EdgeKind::Jaccard, self.config.mode);
        }
        if let (true, Some(embedder)) = (self.config.run_semantic, self.embedder) {
            let pairs = semantic_pairs(
                graph,
                embedder,
                self.config.semantic_threshold,
                self.config.batch_size,
            )?;
            report.semantic_candidates = pairs.len();
            report.semantic_pairs = insert_pairs(graph, &pairs, EdgeKind::Use, self.config.mode);
        }
        info!(
            jaccard = report.jaccard_pairs,
            semantic = report.semantic_pairs,
            "added suggested edges"
        );
        Ok(report)
    }
}

/// Undirected canonical neighborhoods of every verse node, restricted to
/// verse neighbors and excluding the node itself.
pub fn neighborhoods(graph: &CrossRefGraph) -> HashMap<NodeIndex, BTreeSet<NodeIndex>> {
    let mut out: HashMap<NodeIndex, BTreeSet<NodeIndex>> = HashMap::new();
    for idx in graph.node_indices() {
        if !graph.node_at(idx).is_verse() {
            continue;
        }
        let set = out.entry(idx).or_default();
        for direction in [Direction::Outgoing, Direction::Incoming] {
            for (other, edge) in graph.edges_directed(idx, direction) {
                if edge.is_canonical() && other != idx && graph.node_at(other).is_verse() {
                    set.insert(other);
                }
            }
        }
    }
    out
}

/// Pairs sharing at least `min_shared` neighbors with a Jaccard score above
/// `threshold`, sorted by node index.
///
/// Candidates are enumerated through common neighbors, the sparse form of
/// the nonzero entries of `A·A`.
pub fn jaccard_pairs(graph: &CrossRefGraph, min_shared: usize, threshold: f64) -> Vec<ScoredPair> {
    let neighbors = neighborhoods(graph);
    let mut shared: HashMap<(NodeIndex, NodeIndex), usize> = HashMap::new();
    for set in neighbors.values() {
        let members: Vec<NodeIndex> = set.iter().copied().collect();
        for (i, &a) in members.iter().enumerate() {
            for &b in &members[i + 1..] {
                *shared.entry((a, b)).or_insert(0) += 1;
            }
        }
    }

    let mut pairs: Vec<ScoredPair> = shared
        .into_iter()
        .filter(|&(_, count)| count >= min_shared.max(1))
        .filter_map(|((a, b), count)| {
            let union = neighbors[&a].len() + neighbors[&b].len() - count;
            let score = jaccard_score(count, union);
            (score > threshold).then_some(ScoredPair { a, b, score })
        })
        .collect();
    pairs.sort_by_key(|p| (p.a, p.b));
    debug!(candidates = pairs.len(), "jaccard candidates");
    pairs
}

/// `shared / union`, with the degenerate `0 / 0` mapped to zero.
fn jaccard_score(shared: usize, union: usize) -> f64 {
    let score = shared as f64 / union as f64;
    if score.is_nan() { 0.0 } else { score }
}

/// Verse pairs whose angular text similarity exceeds `threshold`, sorted by
/// node index. Verses without text are left out.
pub fn semantic_pairs(
    graph: &CrossRefGraph,
    embedder: &dyn TextEmbedder,
    threshold: f64,
    batch_size: usize,
) -> SimilarityResult<Vec<ScoredPair>> {
    let (nodes, texts): (Vec<NodeIndex>, Vec<String>) = graph
        .node_indices()
        .filter_map(|idx| match graph.node_at(idx) {
            NodeData::Verse {
                text: Some(text), ..
            } => {
                let normalized = normalize_verse_text(text);
                (!normalized.is_empty()).then_some((idx, normalized))
            }
            _ => None,
        })
        .unzip();
    let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
    let vectors = embed_batched(embedder, &refs, batch_size)?;
    debug!(verses = vectors.len(), "embedded verse texts");

    let mut pairs: Vec<ScoredPair> = (0..vectors.len())
        .into_par_iter()
        .flat_map_iter(|i| {
            let vectors = &vectors;
            let nodes = &nodes;
            (i + 1..vectors.len()).filter_map(move |j| {
                let score = angular_similarity(&vectors[i], &vectors[j]);
                (score > threshold).then(|| {
                    let (a, b) = if nodes[i] < nodes[j] {
                        (nodes[i], nodes[j])
                    } else {
                        (nodes[j], nodes[i])
                    };
                    ScoredPair { a, b, score }
                })
            })
        })
        .collect();
    pairs.sort_by_key(|p| (p.a, p.b));
    Ok(pairs)
}

/// Insert both directions of every unblocked pair. Returns the number of
/// pairs inserted.
fn insert_pairs(
    graph: &mut CrossRefGraph,
    pairs: &[ScoredPair],
    kind: EdgeKind,
    mode: AugmentMode,
) -> usize {
    let mut inserted = 0;
    for pair in pairs {
        if pair.a == pair.b || blocked(graph, pair.a, pair.b, kind, mode) {
            continue;
        }
        graph.add_edge(pair.a, pair.b, EdgeData::suggested(kind));
        graph.add_edge(pair.b, pair.a, EdgeData::suggested(kind));
        inserted += 1;
    }
    inserted
}

fn blocked(
    graph: &CrossRefGraph,
    a: NodeIndex,
    b: NodeIndex,
    kind: EdgeKind,
    mode: AugmentMode,
) -> bool {
    match mode {
        AugmentMode::Idempotent => graph.connected(a, b),
        AugmentMode::Additive => [None, Some(kind)].into_iter().any(|k| {
            graph.has_edge_of(a, b, k) || graph.has_edge_of(b, a, k)
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canon::{BookCode, Volume};
    use crate::embed::HashingEmbedder;
    use crate::model::{GuidePrefix, NodeKey};

    fn verse(g: &mut CrossRefGraph, key: &str, text: Option<&str>) -> NodeIndex {
        let (book, cv) = key.rsplit_once(' ').unwrap();
        let (chapter, verse) = cv.split_once(':').unwrap();
        let book = BookCode::from_abbrev(book).unwrap();
        g.add_node(NodeData::Verse {
            id: NodeKey::from(key),
            volume: book.volume(),
            book,
            chapter: chapter.parse().unwrap(),
            verse: verse.parse().unwrap(),
            text: text.map(str::to_string),
        })
    }

    /// `a` and `b` both cite `x` and `y`; `c` cites only `x`.
    fn diamond() -> (CrossRefGraph, [NodeIndex; 5]) {
        let mut g = CrossRefGraph::new();
        let a = verse(&mut g, "Gen. 1:1", Some("in the beginning god created the heaven"));
        let b = verse(&mut g, "John 1:1", Some("in the beginning was the word"));
        let c = verse(&mut g, "Moses 2:1", Some("a wholly different matter of lineage"));
        let x = verse(&mut g, "Heb. 11:3", None);
        let y = verse(&mut g, "D&C 93:29", None);
        for (s, t) in [(a, x), (a, y), (b, x), (y, b), (c, x)] {
            g.add_edge(s, t, EdgeData::canonical());
        }
        (g, [a, b, c, x, y])
    }

    fn config() -> SimilarityConfig {
        SimilarityConfig {
            run_semantic: false,
            ..SimilarityConfig::default()
        }
    }

    fn assert_symmetric(g: &CrossRefGraph) {
        for idx in g.node_indices() {
            for (other, edge) in g.edges_directed(idx, Direction::Outgoing) {
                assert_ne!(idx, other, "self edge");
                if let Some(kind) = edge.kind {
                    assert!(g.has_edge_of(other, idx, Some(kind)));
                }
            }
        }
    }

    #[test]
    fn jaccard_needs_more_than_one_shared_neighbor() {
        let (g, [a, b, _, x, y]) = diamond();
        let pairs = jaccard_pairs(&g, 2, 0.0);
        // a,b share {x, y}; x,y share {a, b}. c shares only x with a and b.
        let found: Vec<(NodeIndex, NodeIndex)> = pairs.iter().map(|p| (p.a, p.b)).collect();
        assert_eq!(found, vec![(a, b), (x, y)]);
        assert!((pairs[0].score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn jaccard_edges_are_bidirectional_and_tagged() {
        let (mut g, [a, b, ..]) = diamond();
        let cfg = config();
        let embedder = HashingEmbedder::default();
        let report = SimilarityAugmenter::new(&cfg, &embedder).augment(&mut g).unwrap();
        assert_eq!(report.jaccard_pairs, 2);
        assert!(g.has_edge_of(a, b, Some(EdgeKind::Jaccard)));
        assert!(g.has_edge_of(b, a, Some(EdgeKind::Jaccard)));
        assert_symmetric(&g);
    }

    #[test]
    fn rerunning_adds_nothing() {
        let (mut g, _) = diamond();
        let cfg = SimilarityConfig {
            semantic_threshold: 0.5,
            ..SimilarityConfig::default()
        };
        let embedder = HashingEmbedder::default();
        let augmenter = SimilarityAugmenter::new(&cfg, &embedder);
        augmenter.augment(&mut g).unwrap();
        let edges = g.edge_count();
        let again = augmenter.augment(&mut g).unwrap();
        assert_eq!(again.jaccard_pairs + again.semantic_pairs, 0);
        assert_eq!(g.edge_count(), edges);
        assert_symmetric(&g);

        let additive = SimilarityConfig {
            mode: AugmentMode::Additive,
            ..cfg.clone()
        };
        let augmenter = SimilarityAugmenter::new(&additive, &embedder);
        augmenter.augment(&mut g).unwrap();
        let edges = g.edge_count();
        augmenter.augment(&mut g).unwrap();
        assert_eq!(g.edge_count(), edges);
    }

    #[test]
    fn existing_canonical_edge_blocks_suggestion() {
        let (mut g, [a, b, ..]) = diamond();
        g.add_edge(a, b, EdgeData::canonical());
        let pairs = jaccard_pairs(&g, 2, 0.0);
        assert_eq!(insert_pairs(&mut g, &pairs, EdgeKind::Jaccard, AugmentMode::Additive), 1);
        assert!(!g.has_edge_of(a, b, Some(EdgeKind::Jaccard)));
    }

    #[test]
    fn modes_differ_on_cross_kind_pairs() {
        let (mut g, [a, b, ..]) = diamond();
        g.add_edge(a, b, EdgeData::suggested(EdgeKind::Jaccard));
        g.add_edge(b, a, EdgeData::suggested(EdgeKind::Jaccard));
        let pairs = [ScoredPair { a, b, score: 0.9 }];

        let mut idem = g.clone();
        assert_eq!(insert_pairs(&mut idem, &pairs, EdgeKind::Use, AugmentMode::Idempotent), 0);
        assert_eq!(insert_pairs(&mut g, &pairs, EdgeKind::Use, AugmentMode::Additive), 1);
        assert!(g.has_edge_of(b, a, Some(EdgeKind::Use)));
    }

    #[test]
    fn semantic_pass_links_similar_text_only() {
        let mut g = CrossRefGraph::new();
        let a = verse(&mut g, "1 Ne. 3:7", Some("I will go and do the things which the Lord hath commanded"));
        let b = verse(&mut g, "1 Ne. 17:3", Some("go and do the things which the Lord hath commanded"));
        let c = verse(&mut g, "Jacob 5:3", Some("the tame olive tree waxed old and began to decay"));
        let _empty = verse(&mut g, "Gen. 1:2", Some("  "));
        g.add_node(NodeData::Topic {
            id: NodeKey::from("TG Obedience"),
            volume: Volume::StudyHelps,
            source: GuidePrefix::Tg,
            title: "Obedience".into(),
        });

        let pairs = semantic_pairs(&g, &HashingEmbedder::default(), 0.77, 2).unwrap();
        let found: Vec<(NodeIndex, NodeIndex)> = pairs.iter().map(|p| (p.a, p.b)).collect();
        assert_eq!(found, vec![(a, b)]);
        assert!(pairs.iter().all(|p| p.a != c && p.b != c));
    }

    #[test]
    fn structural_augmenter_refuses_the_text_pass() {
        let (mut g, _) = diamond();
        let edges = g.edge_count();
        let cfg = SimilarityConfig::default();
        let err = SimilarityAugmenter::structural(&cfg).augment(&mut g).unwrap_err();
        assert!(matches!(err, SimilarityError::MissingEmbedder));
        assert_eq!(g.edge_count(), edges);

        let report = SimilarityAugmenter::structural(&config()).augment(&mut g).unwrap();
        assert_eq!(report.jaccard_pairs, 2);
    }

    #[test]
    fn degenerate_scores_are_zero() {
        assert_eq!(jaccard_score(0, 0), 0.0);
        assert_eq!(jaccard_score(1, 4), 0.25);
    }
}
