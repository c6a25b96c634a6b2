//! Citation parsing: free-text footnote fragments into node keys.
//!
//! A fragment may carry scripture citations (`Prov. 22:1 (1-3); 23:2`),
//! guide clauses (`TG Affliction; Blessing`), or both. Anything the grammar
//! does not recognise must be explained by the curated [`CitationTables`];
//! otherwise parsing fails so the rebuild stops at the offending text.
//!
//! Verse ranges contribute only their anchor verse: `Isa. 42:1 (1, 3-4)`
//! cites `Isa. 42:1`.

pub mod tables;

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use crate::canon::{BookCode, Volume};
use crate::error::{CitationError, CitationResult, ConfigError, ConfigResult};
use crate::model::{GuidePrefix, NodeKey};

pub use tables::CitationTables;

// ── Grammar ─────────────────────────────────────────────────────────────

/// Optional work name, book fragment, then one or more `chapter:verse`
/// groups (each with an optional parenthetical range) separated by `; `.
static RE_SCRIPTURE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?:\b(JST)\s+)?(\d?\s?[\w\s&—]+\.?)\s((?:\d+:\d+(?:\s?\([\d\s,\-–]+\))?(?:;\s)?)+)",
    )
    .unwrap()
});

static RE_CHAPTER_VERSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+):(\d+)").unwrap());

/// A guide clause: `TG` or `ITC` followed by `;`-separated titles running
/// to the end of the clause. Titles keep all their commas
/// (`Jesus Christ, Types of, in Anticipation`).
static RE_GUIDE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b(TG|ITC)\s([^.:]+)").unwrap());

/// Parses citation fragments against the grammar and exception tables.
#[derive(Debug, Clone)]
pub struct ReferenceParser {
    tables: CitationTables,
    /// `(pattern, replacement)` rewriting one-verse sections to verse 1.
    one_verse: Vec<(Regex, String)>,
}

impl ReferenceParser {
    pub fn new(tables: CitationTables) -> ConfigResult<Self> {
        let one_verse = tables
            .one_verse_sections
            .iter()
            .map(|section| {
                let pattern = format!(r"{}([.;,]|$)", regex::escape(section));
                Regex::new(&pattern)
                    .map(|re| (re, format!("{section}:1$1")))
                    .map_err(|e| ConfigError::Invalid {
                        message: format!("one_verse_sections entry \"{section}\": {e}"),
                    })
            })
            .collect::<ConfigResult<Vec<_>>>()?;
        Ok(Self { tables, one_verse })
    }

    /// A parser over the bundled tables.
    pub fn bundled() -> ConfigResult<Self> {
        Self::new(CitationTables::bundled()?)
    }

    pub fn tables(&self) -> &CitationTables {
        &self.tables
    }

    /// Apply the fixed normalization table.
    ///
    /// Returns the normalized text and whether any chapter-only fragment
    /// was removed.
    pub fn normalize(&self, text: &str) -> (String, bool) {
        let mut out = text.replace(['\u{a0}', '\u{2009}'], " ");
        for (re, replacement) in &self.one_verse {
            if re.is_match(&out) {
                out = re.replace_all(&out, replacement.as_str()).into_owned();
            }
        }
        let mut stripped = false;
        for fragment in &self.tables.chapter_only {
            if out.contains(fragment.as_str()) {
                out = out.replace(fragment.as_str(), "");
                stripped = true;
            }
        }
        (out, stripped)
    }

    /// Parse a citation fragment into its target keys.
    ///
    /// Targets are de-duplicated and returned in first-seen order. Fails
    /// with [`CitationError::Syntax`] when nothing was recognised and the
    /// text is not covered by an ignorable prefix.
    pub fn parse(&self, text: &str) -> CitationResult<Vec<NodeKey>> {
        let (normalized, stripped) = self.normalize(text);
        let mut targets = Vec::new();
        self.scripture_targets(&normalized, &mut targets);
        guide_targets(&normalized, &mut targets);

        if targets.is_empty() {
            let trimmed = text.trim();
            let residue_only = stripped && !normalized.chars().any(char::is_alphanumeric);
            if self.tables.is_ignored(trimmed) || residue_only {
                debug!(text = trimmed, "citation ignored");
                return Ok(targets);
            }
            return Err(CitationError::Syntax {
                text: text.to_string(),
            });
        }
        Ok(targets)
    }

    /// Scripture citations only, never failing. Used for guide entries,
    /// where a prose phrase precedes the citations.
    pub fn parse_scripture(&self, text: &str) -> Vec<NodeKey> {
        let (normalized, _) = self.normalize(text);
        let mut targets = Vec::new();
        self.scripture_targets(&normalized, &mut targets);
        targets
    }

    fn scripture_targets(&self, text: &str, out: &mut Vec<NodeKey>) {
        for caps in RE_SCRIPTURE.captures_iter(text) {
            let fragment = caps[2].trim();
            if caps.get(1).is_some() || fragment.split_whitespace().any(|w| w == "JST") {
                debug!(fragment, "JST citation has no verse node");
                continue;
            }
            let Some(book) = self.resolve_book(fragment) else {
                continue;
            };
            for piece in caps[3].split(';') {
                let Some(cv) = RE_CHAPTER_VERSE.captures(piece.trim()) else {
                    continue;
                };
                let (Ok(chapter), Ok(verse)) = (cv[1].parse::<u32>(), cv[2].parse::<u32>()) else {
                    continue;
                };
                push_unique(out, NodeKey::verse(book, chapter, verse));
            }
        }
    }

    /// Validate a book fragment. Prose preceding the book (as in guide
    /// entries) is tolerated by taking the longest trailing abbreviation.
    fn resolve_book(&self, fragment: &str) -> Option<BookCode> {
        let book = match BookCode::from_abbrev(fragment) {
            Some(book) => Some(book),
            None if self.tables.is_soft_skip(fragment) => {
                debug!(fragment, "soft-skipped citation group");
                return None;
            }
            None => {
                let words: Vec<&str> = fragment.split_whitespace().collect();
                (1..words.len()).find_map(|start| BookCode::from_abbrev(&words[start..].join(" ")))
            }
        };
        match book {
            Some(book) if book.volume() == Volume::StudyHelps => {
                debug!(fragment, "study-help citation has no verse node");
                None
            }
            Some(book) => Some(book),
            None => {
                warn!(fragment, "discarded citation group with unknown book");
                None
            }
        }
    }
}

fn guide_targets(text: &str, out: &mut Vec<NodeKey>) {
    for caps in RE_GUIDE.captures_iter(text) {
        let Some(source) = GuidePrefix::from_code(&caps[1]) else {
            continue;
        };
        for title in caps[2].split(';') {
            let title = title.trim().trim_end_matches(['.', ',']).trim();
            if !title.is_empty() {
                push_unique(out, NodeKey::topic(source, title));
            }
        }
    }
}

fn push_unique(out: &mut Vec<NodeKey>, key: NodeKey) {
    if !out.contains(&key) {
        out.push(key);
    }
}
