//! Full corpus rebuild: aggregate → correct topics → build → augment.
//!
//! Every stage fails fast; a rebuild either produces a complete graph or
//! the first error with the snippet that caused it.

use std::collections::BTreeSet;

use tracing::info;

use crate::citation::ReferenceParser;
use crate::config::PipelineConfig;
use crate::corpus::{AggregateStats, CorpusAggregator, CorpusEntry};
use crate::embed::{TextEmbedder, load_embedder};
use crate::error::ScriptureResult;
use crate::extract::PageExtractor;
use crate::graph::{AugmentReport, BuildReport, CrossRefGraph, GraphBuilder, SimilarityAugmenter};
use crate::model::{NodeKey, ScriptureGraph};
use crate::topics::TopicCorrector;

/// Named stage of a rebuild, used in log records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageKind {
    Aggregate,
    CorrectTopics,
    Build,
    Augment,
}

impl StageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Aggregate => "aggregate",
            Self::CorrectTopics => "correct-topics",
            Self::Build => "build",
            Self::Augment => "augment",
        }
    }
}

/// Everything a rebuild produced.
#[derive(Debug)]
pub struct Rebuild {
    /// Aggregated records with corrected references.
    pub records: ScriptureGraph,
    pub graph: CrossRefGraph,
    pub aggregate: AggregateStats,
    pub build: BuildReport,
    pub augment: AugmentReport,
}

/// Rebuild with the configured sentence model. The model is only loaded
/// when the text pass is enabled.
pub fn rebuild(entries: &[CorpusEntry], config: &PipelineConfig) -> ScriptureResult<Rebuild> {
    config.validate()?;
    if !config.similarity.run_semantic {
        return run(entries, config, None);
    }
    let embedder = load_embedder(&config.similarity.model)?;
    run(entries, config, Some(embedder.as_ref()))
}

/// Rebuild with a caller-supplied text embedder.
pub fn rebuild_with(
    entries: &[CorpusEntry],
    config: &PipelineConfig,
    embedder: &dyn TextEmbedder,
) -> ScriptureResult<Rebuild> {
    config.validate()?;
    run(entries, config, Some(embedder))
}

fn run(
    entries: &[CorpusEntry],
    config: &PipelineConfig,
    embedder: Option<&dyn TextEmbedder>,
) -> ScriptureResult<Rebuild> {
    let tables = config.citation_tables()?;

    info!(stage = StageKind::Aggregate.as_str(), entries = entries.len());
    let parser = ReferenceParser::new(tables.clone())?;
    let aggregator = CorpusAggregator::new(PageExtractor::new(parser));
    let (mut records, aggregate) = aggregator.aggregate(entries)?;

    info!(stage = StageKind::CorrectTopics.as_str(), references = records.references.len());
    let topics: BTreeSet<NodeKey> = records.topics.keys().cloned().collect();
    let known: BTreeSet<NodeKey> = records.verses.keys().cloned().chain(topics.iter().cloned()).collect();
    records.references = TopicCorrector::new(&tables).correct(&known, &topics, &records.references)?;

    info!(stage = StageKind::Build.as_str(), include_topics = config.graph.include_topics);
    let (mut graph, build) = GraphBuilder::new(config.graph.include_topics).build(&records)?;

    info!(stage = StageKind::Augment.as_str(), mode = ?config.similarity.mode);
    let augmenter = match embedder {
        Some(embedder) => SimilarityAugmenter::new(&config.similarity, embedder),
        None => SimilarityAugmenter::structural(&config.similarity),
    };
    let augment = augmenter.augment(&mut graph)?;

    Ok(Rebuild {
        records,
        graph,
        aggregate,
        build,
        augment,
    })
}
