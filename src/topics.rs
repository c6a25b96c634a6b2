//! Topic reference correction.
//!
//! Footnotes cite topics by an abbreviated title (`TG Lost`) while the guide
//! page carries the full alias list (`TG Lose, Lost`). This pass rewrites such
//! endpoints to the canonical key before the graph is built.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, info};

use crate::citation::CitationTables;
use crate::error::{TopicError, TopicResult};
use crate::model::{NodeKey, Reference};

/// Resolves abbreviated topic keys against the known topic titles.
pub struct TopicCorrector<'a> {
    tables: &'a CitationTables,
}

impl<'a> TopicCorrector<'a> {
    pub fn new(tables: &'a CitationTables) -> Self {
        Self { tables }
    }

    /// Return a corrected copy of `references`.
    ///
    /// Endpoints found in `known_nodes` or `topics` are kept. Other topic
    /// endpoints are resolved by the manual alias table, then by the whole
    /// title, then by an alias segment of a known title, then by a substring
    /// match. Verse endpoints pass through unchanged. A corrected reference
    /// that points at its own source is an error.
    pub fn correct(
        &self,
        known_nodes: &BTreeSet<NodeKey>,
        topics: &BTreeSet<NodeKey>,
        references: &[Reference],
    ) -> TopicResult<Vec<Reference>> {
        let mut resolved: BTreeMap<NodeKey, NodeKey> = BTreeMap::new();
        let mut corrected = 0usize;
        let mut out = Vec::with_capacity(references.len());

        for reference in references {
            let mut endpoints = [reference.source.clone(), reference.target.clone()];
            for key in &mut endpoints {
                if !key.is_topic() || known_nodes.contains(key) || topics.contains(key) {
                    continue;
                }
                let canonical = match resolved.get(key) {
                    Some(canonical) => canonical.clone(),
                    None => {
                        let canonical = self.resolve(key, &reference.source, topics)?;
                        debug!(from = %key, to = %canonical, "corrected topic reference");
                        resolved.insert(key.clone(), canonical.clone());
                        canonical
                    }
                };
                *key = canonical;
                corrected += 1;
            }
            let [source, target] = endpoints;
            if source == target {
                return Err(TopicError::SelfReference {
                    key: source.to_string(),
                    cited: reference.target.to_string(),
                });
            }
            out.push(Reference { source, target });
        }

        info!(
            corrected,
            distinct = resolved.len(),
            "topic references corrected"
        );
        Ok(out)
    }

    /// Resolve one abbreviated key. Each stage must match exactly one topic
    /// of the same guide; several matches fail instead of picking one.
    fn resolve(
        &self,
        key: &NodeKey,
        source: &NodeKey,
        topics: &BTreeSet<NodeKey>,
    ) -> TopicResult<NodeKey> {
        if let Some(alias) = self.tables.topic_alias(key) {
            return Ok(alias);
        }
        let unresolved = || TopicError::Unresolved {
            key: key.to_string(),
            source_key: source.to_string(),
        };
        let (prefix, title) = key.as_topic().ok_or_else(unresolved)?;
        let wanted = title.to_lowercase();

        let candidates: Vec<Candidate<'_>> = topics
            .iter()
            .filter_map(|topic| {
                let (guide, full) = topic.as_topic()?;
                (guide == prefix).then(|| Candidate {
                    key: topic,
                    title: full.to_lowercase(),
                    segments: alias_segments(full),
                })
            })
            .collect();

        for stage in [Stage::Title, Stage::Segment, Stage::Substring] {
            let found: Vec<&NodeKey> = candidates
                .iter()
                .filter(|c| stage.matches(c, &wanted))
                .map(|c| c.key)
                .collect();
            match found.as_slice() {
                [] => continue,
                [one] => return Ok((*one).clone()),
                many => {
                    return Err(TopicError::Ambiguous {
                        key: key.to_string(),
                        source_key: source.to_string(),
                        candidates: many
                            .iter()
                            .map(|k| k.as_str())
                            .collect::<Vec<_>>()
                            .join("; "),
                    });
                }
            }
        }
        Err(unresolved())
    }
}

struct Candidate<'a> {
    key: &'a NodeKey,
    title: String,
    segments: Vec<String>,
}

/// Matching stages, tried in order.
#[derive(Clone, Copy)]
enum Stage {
    /// The whole lowercased title.
    Title,
    /// One comma-separated alias segment.
    Segment,
    Substring,
}

impl Stage {
    fn matches(self, candidate: &Candidate<'_>, wanted: &str) -> bool {
        match self {
            Self::Title => candidate.title == wanted,
            Self::Segment => candidate.segments.iter().any(|s| s == wanted),
            Self::Substring => candidate.title.contains(wanted),
        }
    }
}

/// The comma-separated alternate titles of a full topic title, lowercased.
fn alias_segments(title: &str) -> Vec<String> {
    title
        .split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}
