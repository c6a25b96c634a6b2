//! Core record types produced by extraction.
//!
//! A [`ScriptureGraph`] is the graph-of-record: verses and topics keyed by
//! their canonical [`NodeKey`], plus the raw list of references between them.
//! Every document contributes one `ScriptureGraph`, and the corpus is the
//! fold of those through [`ScriptureGraph::merge`].

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::canon::{BookCode, verse_sort_key};

/// Canonical string identifier of a verse (`"1 Ne. 3:7"`) or topic
/// (`"TG Faith"`). Used as the graph's node identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeKey(String);

impl NodeKey {
    pub fn verse(book: BookCode, chapter: u32, verse: u32) -> Self {
        Self(format!("{book} {chapter}:{verse}"))
    }

    pub fn topic(source: GuidePrefix, title: &str) -> Self {
        Self(format!("{source} {title}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Split a topic key into its guide prefix and title.
    ///
    /// Returns `None` for verse keys.
    pub fn as_topic(&self) -> Option<(GuidePrefix, &str)> {
        let (prefix, title) = self.0.split_once(' ')?;
        let source = GuidePrefix::from_code(prefix)?;
        Some((source, title))
    }

    pub fn is_topic(&self) -> bool {
        self.as_topic().is_some()
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeKey {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for NodeKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for NodeKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// The study guide a topic belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GuidePrefix {
    /// Topical Guide.
    #[serde(rename = "TG")]
    Tg,
    /// Index to the Triple Combination.
    #[serde(rename = "ITC")]
    Itc,
}

impl GuidePrefix {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tg => "TG",
            Self::Itc => "ITC",
        }
    }

    pub fn from_code(s: &str) -> Option<Self> {
        match s {
            "TG" => Some(Self::Tg),
            "ITC" => Some(Self::Itc),
            _ => None,
        }
    }

    /// The Study Helps book this guide is filed under.
    pub fn book(&self) -> Option<BookCode> {
        BookCode::from_abbrev(self.as_str())
    }
}

impl fmt::Display for GuidePrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single verse. Identity is `(book, chapter, verse)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verse {
    pub book: BookCode,
    pub chapter: u32,
    pub verse: u32,
    /// Verse text with verse numbers and footnote markers removed.
    pub text: Option<String>,
}

impl Verse {
    pub fn new(book: BookCode, chapter: u32, verse: u32, text: impl Into<String>) -> Self {
        Self {
            book,
            chapter,
            verse,
            text: Some(text.into()),
        }
    }

    pub fn key(&self) -> NodeKey {
        NodeKey::verse(self.book, self.chapter, self.verse)
    }

    pub fn sort_key(&self) -> (usize, u32, u32) {
        verse_sort_key(self.book, self.chapter, self.verse)
    }
}

/// A topical guide or index entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    pub source: GuidePrefix,
    pub title: String,
}

impl Topic {
    pub fn new(source: GuidePrefix, title: impl Into<String>) -> Self {
        Self {
            source,
            title: title.into(),
        }
    }

    pub fn key(&self) -> NodeKey {
        NodeKey::topic(self.source, &self.title)
    }
}

/// A directed edge candidate from a citing node to a cited node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Reference {
    pub source: NodeKey,
    pub target: NodeKey,
}

impl Reference {
    pub fn new(source: impl Into<NodeKey>, target: impl Into<NodeKey>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }
}

/// Accumulated verses, topics and references.
///
/// Verses and topics merge last-write-wins by key; references append
/// without deduplication (that happens when the graph is built).
#[derive(Debug, Clone, Default)]
pub struct ScriptureGraph {
    pub verses: BTreeMap<NodeKey, Verse>,
    pub topics: BTreeMap<NodeKey, Topic>,
    pub references: Vec<Reference>,
}

impl ScriptureGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_verse(&mut self, verse: Verse) {
        self.verses.insert(verse.key(), verse);
    }

    pub fn insert_topic(&mut self, topic: Topic) {
        self.topics.insert(topic.key(), topic);
    }

    pub fn push_reference(&mut self, reference: Reference) {
        self.references.push(reference);
    }

    /// Fold another document's records into this one.
    pub fn merge(&mut self, other: ScriptureGraph) {
        self.verses.extend(other.verses);
        self.topics.extend(other.topics);
        self.references.extend(other.references);
    }

    pub fn is_empty(&self) -> bool {
        self.verses.is_empty() && self.topics.is_empty() && self.references.is_empty()
    }
}
