//! Curated exception tables for the citation grammar.
//!
//! The long tail of irregular corpus prose is handled by data, not control
//! flow. The tables are bundled into the binary via `include_str!` and may be
//! replaced by an external TOML file with the same shape.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::canon::BookCode;
use crate::error::{ConfigError, ConfigResult};
use crate::model::NodeKey;

const BUNDLED_TOML: &str = include_str!("../../data/citations.toml");

/// Immutable exception tables consulted by the parser, extractors and
/// topic corrector.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CitationTables {
    /// One-verse sections cited without a verse number, e.g. `"D&C 13"`.
    pub one_verse_sections: Vec<String>,
    /// Chapter-only fragments removed before matching, e.g. `"D&C 74."`.
    pub chapter_only: Vec<String>,
    /// Prefixes of citation texts that may legitimately yield no target.
    pub ignored_prefixes: Vec<String>,
    /// Prefixes of book fragments that are prose, not books.
    pub soft_skip_prefixes: Vec<String>,
    /// Prefixes of unnumbered verse elements that are skipped.
    pub verse_exceptions: Vec<String>,
    /// Book abbreviations whose pages contribute no references.
    pub reference_exempt_books: Vec<String>,
    /// Manual topic key overrides, abbreviated key to canonical key.
    pub topic_aliases: BTreeMap<String, String>,
}

impl CitationTables {
    /// The tables shipped with the crate.
    pub fn bundled() -> ConfigResult<Self> {
        Self::from_toml(BUNDLED_TOML, "(bundled citations.toml)")
    }

    /// Load replacement tables from a TOML file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_toml(&content, &path.display().to_string())
    }

    fn from_toml(content: &str, origin: &str) -> ConfigResult<Self> {
        let tables: Self = toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: origin.to_string(),
            message: e.to_string(),
        })?;
        tables.validate()?;
        Ok(tables)
    }

    /// Check every entry that names a book or topic.
    pub fn validate(&self) -> ConfigResult<()> {
        for section in &self.one_verse_sections {
            let valid = section
                .rsplit_once(' ')
                .is_some_and(|(book, number)| {
                    BookCode::from_abbrev(book).is_some() && number.parse::<u32>().is_ok()
                });
            if !valid {
                return Err(ConfigError::Invalid {
                    message: format!("one_verse_sections entry \"{section}\" is not `<book> <number>`"),
                });
            }
        }
        for book in &self.reference_exempt_books {
            if BookCode::from_abbrev(book).is_none() {
                return Err(ConfigError::Invalid {
                    message: format!("reference_exempt_books entry \"{book}\" is not a book"),
                });
            }
        }
        for (from, to) in &self.topic_aliases {
            for key in [from, to] {
                if !NodeKey::from(key.as_str()).is_topic() {
                    return Err(ConfigError::Invalid {
                        message: format!("topic_aliases entry \"{key}\" is not a TG/ITC key"),
                    });
                }
            }
        }
        Ok(())
    }

    pub fn is_ignored(&self, text: &str) -> bool {
        self.ignored_prefixes.iter().any(|p| text.starts_with(p.as_str()))
    }

    pub fn is_soft_skip(&self, fragment: &str) -> bool {
        self.soft_skip_prefixes
            .iter()
            .any(|p| fragment.starts_with(p.as_str()))
    }

    pub fn is_verse_exception(&self, text: &str) -> bool {
        self.verse_exceptions.iter().any(|p| text.starts_with(p.as_str()))
    }

    pub fn is_reference_exempt(&self, book: BookCode) -> bool {
        self.reference_exempt_books.iter().any(|b| b == book.abbrev())
    }

    pub fn topic_alias(&self, key: &NodeKey) -> Option<NodeKey> {
        self.topic_aliases
            .get(key.as_str())
            .map(|k| NodeKey::from(k.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_tables_parse_and_validate() {
        let tables = CitationTables::bundled().unwrap();
        assert!(tables.one_verse_sections.contains(&"D&C 13".to_string()));
        assert!(tables.is_ignored("HEB wife"));
        assert!(tables.is_ignored("4 Ne. heading"));
        assert!(!tables.is_ignored("Prov. 22:1"));
        assert!(tables.is_verse_exception("After prayer, the minutes were read"));
    }

    #[test]
    fn every_alias_maps_topic_to_topic() {
        let tables = CitationTables::bundled().unwrap();
        for (from, to) in &tables.topic_aliases {
            assert!(NodeKey::from(from.as_str()).is_topic(), "{from}");
            assert!(NodeKey::from(to.as_str()).is_topic(), "{to}");
            assert_ne!(from, to);
        }
    }

    #[test]
    fn invalid_entries_are_rejected() {
        let err = CitationTables::from_toml("one_verse_sections = [\"Hezekiah 4\"]", "t").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));

        let err = CitationTables::from_toml("[topic_aliases]\n\"Faith\" = \"TG Faith\"", "t")
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));

        let err = CitationTables::from_toml("ignored_prefixes = 3", "t").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("tables.toml");
        std::fs::write(&path, "ignored_prefixes = [\"Footnote\"]\n").unwrap();
        let tables = CitationTables::load(&path).unwrap();
        assert!(tables.is_ignored("Footnote text"));
        assert!(tables.topic_aliases.is_empty());
    }
}
