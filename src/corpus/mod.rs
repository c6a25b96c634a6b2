//! Corpus aggregation: classify archive entries, extract each page and fold
//! the per-page records into one [`ScriptureGraph`].
//!
//! Page extraction is pure, so pages are extracted in parallel with rayon.
//! The fold runs afterwards in input order, which keeps last-write-wins
//! deterministic.

pub mod epub;

use std::path::Path;

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{CorpusError, CorpusResult, ExtractResult};
use crate::extract::{PageExtractor, parse_page};
use crate::model::{GuidePrefix, ScriptureGraph};

pub use epub::EpubArchive;

/// Structural pages that carry neither verses nor topics.
const STRUCTURAL_PREFIXES: &[&str] = &[
    "abr_fac",
    "bofm",
    "cover",
    "dc-testament",
    "history-",
    "od_",
    "pgp",
    "triple-",
    "triple_",
];

/// What an archive entry contains, judged by its file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentClass {
    /// Bible Dictionary page. Never extracted.
    BookData,
    TopicGuide,
    /// Index to the Triple Combination.
    Index,
    Skip,
    VerseChapter,
}

/// Classify an entry by the basename of its path.
pub fn classify(path: &str) -> DocumentClass {
    let lower = path.to_lowercase();
    if !(lower.ends_with(".xhtml") || lower.ends_with(".html")) {
        return DocumentClass::Skip;
    }
    let basename = path.rsplit('/').next().unwrap_or(path);
    if basename.starts_with("bd_") {
        DocumentClass::BookData
    } else if basename.starts_with("tg_") {
        DocumentClass::TopicGuide
    } else if basename.starts_with("triple-index_") {
        DocumentClass::Index
    } else if STRUCTURAL_PREFIXES.iter().any(|p| basename.starts_with(p)) {
        DocumentClass::Skip
    } else {
        DocumentClass::VerseChapter
    }
}

/// One document of the corpus.
#[derive(Debug, Clone)]
pub struct CorpusEntry {
    pub path: String,
    pub content: String,
}

impl CorpusEntry {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }
}

/// Page and record counts of one aggregation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AggregateStats {
    pub chapter_pages: usize,
    /// Chapter-classified pages without a chapter number.
    pub front_matter_pages: usize,
    pub guide_pages: usize,
    pub index_pages: usize,
    pub book_data_pages: usize,
    pub skipped_pages: usize,
    pub verses: usize,
    pub topics: usize,
    pub references: usize,
}

/// Extracts every page of a corpus into one graph-of-record.
#[derive(Debug, Clone)]
pub struct CorpusAggregator {
    extractor: PageExtractor,
}

/// The records of a single page and what kind of page it was.
struct PageRecords {
    class: DocumentClass,
    front_matter: bool,
    records: ScriptureGraph,
}

impl CorpusAggregator {
    pub fn new(extractor: PageExtractor) -> Self {
        Self { extractor }
    }

    /// Extract and merge all entries. The first failing page aborts.
    pub fn aggregate(
        &self,
        entries: &[CorpusEntry],
    ) -> ExtractResult<(ScriptureGraph, AggregateStats)> {
        let pages = entries
            .par_iter()
            .map(|entry| self.extract_entry(entry))
            .collect::<ExtractResult<Vec<_>>>()?;

        let mut graph = ScriptureGraph::new();
        let mut stats = AggregateStats::default();
        for page in pages {
            match page.class {
                DocumentClass::VerseChapter if page.front_matter => stats.front_matter_pages += 1,
                DocumentClass::VerseChapter => stats.chapter_pages += 1,
                DocumentClass::TopicGuide => stats.guide_pages += 1,
                DocumentClass::Index => stats.index_pages += 1,
                DocumentClass::BookData => stats.book_data_pages += 1,
                DocumentClass::Skip => stats.skipped_pages += 1,
            }
            graph.merge(page.records);
        }
        stats.verses = graph.verses.len();
        stats.topics = graph.topics.len();
        stats.references = graph.references.len();
        info!(
            verses = stats.verses,
            topics = stats.topics,
            references = stats.references,
            "aggregated corpus"
        );
        Ok((graph, stats))
    }

    fn extract_entry(&self, entry: &CorpusEntry) -> ExtractResult<PageRecords> {
        let class = classify(&entry.path);
        let prefix = match class {
            DocumentClass::TopicGuide => Some(GuidePrefix::Tg),
            DocumentClass::Index => Some(GuidePrefix::Itc),
            DocumentClass::VerseChapter => None,
            DocumentClass::BookData | DocumentClass::Skip => {
                return Ok(PageRecords {
                    class,
                    front_matter: false,
                    records: ScriptureGraph::new(),
                });
            }
        };

        let document = parse_page(&entry.content);
        let (front_matter, records) = match prefix {
            Some(prefix) => {
                let page = self.extractor.extract_guide(&entry.path, &document, prefix)?;
                (false, page.into_records())
            }
            None => {
                let page = self.extractor.extract_chapter(&entry.path, &document)?;
                (page.header.is_none(), page.into_records())
            }
        };
        debug!(
            path = %entry.path,
            verses = records.verses.len(),
            references = records.references.len(),
            "extracted page"
        );
        Ok(PageRecords {
            class,
            front_matter,
            records,
        })
    }
}

/// Read every `.xhtml`/`.html` file under a directory, sorted by path.
///
/// Paths are recorded relative to `root` with `/` separators so they
/// classify the same way archive entries do.
pub fn read_directory(root: &Path) -> CorpusResult<Vec<CorpusEntry>> {
    let mut entries = Vec::new();
    let mut pending = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        let listing = std::fs::read_dir(&dir).map_err(|e| CorpusError::Io {
            path: dir.display().to_string(),
            source: e,
        })?;
        for item in listing {
            let path = item
                .map_err(|e| CorpusError::Io {
                    path: dir.display().to_string(),
                    source: e,
                })?
                .path();
            if path.is_dir() {
                pending.push(path);
                continue;
            }
            if classify(&path.to_string_lossy()) == DocumentClass::Skip {
                continue;
            }
            let content = std::fs::read_to_string(&path).map_err(|e| CorpusError::Io {
                path: path.display().to_string(),
                source: e,
            })?;
            let relative = path.strip_prefix(root).unwrap_or(&path);
            let name = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            entries.push(CorpusEntry::new(name, content));
        }
    }
    entries.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::citation::ReferenceParser;
    use crate::model::NodeKey;

    fn aggregator() -> CorpusAggregator {
        CorpusAggregator::new(PageExtractor::new(ReferenceParser::bundled().unwrap()))
    }

    fn chapter(title: &str, number: u32, verse_text: &str) -> String {
        format!(
            r#"<html><head><title>{title} Chapter {number}</title></head><body>
               <p class="titleNumber">Chapter {number}</p>
               <p class="verse"><span class="verseNumber">1</span>{verse_text}</p>
               </body></html>"#
        )
    }

    #[test]
    fn classify_by_basename() {
        assert_eq!(classify("OEBPS/bd_aaron.xhtml"), DocumentClass::BookData);
        assert_eq!(classify("OEBPS/tg_faith.xhtml"), DocumentClass::TopicGuide);
        assert_eq!(classify("OEBPS/triple-index_zion.xhtml"), DocumentClass::Index);
        assert_eq!(classify("OEBPS/triple-title.xhtml"), DocumentClass::Skip);
        assert_eq!(classify("OEBPS/od_1.xhtml"), DocumentClass::Skip);
        assert_eq!(classify("OEBPS/cover.xhtml"), DocumentClass::Skip);
        assert_eq!(classify("OEBPS/styles.css"), DocumentClass::Skip);
        assert_eq!(classify("OEBPS/gen_1.xhtml"), DocumentClass::VerseChapter);
        assert_eq!(classify("1-ne_3.html"), DocumentClass::VerseChapter);
    }

    #[test]
    fn later_pages_overwrite_earlier_verses() {
        let entries = vec![
            CorpusEntry::new("gen_1.xhtml", chapter("Genesis", 1, "first")),
            CorpusEntry::new("gen_1-dup.xhtml", chapter("Genesis", 1, "second")),
            CorpusEntry::new("bd_aaron.xhtml", "<html></html>"),
            CorpusEntry::new("cover.xhtml", "<html></html>"),
            CorpusEntry::new(
                "gen.xhtml",
                "<html><head><title>Genesis</title></head><body></body></html>",
            ),
        ];
        let (graph, stats) = aggregator().aggregate(&entries).unwrap();
        assert_eq!(
            graph.verses[&NodeKey::from("Gen. 1:1")].text.as_deref(),
            Some("second")
        );
        assert_eq!(stats.chapter_pages, 2);
        assert_eq!(stats.front_matter_pages, 1);
        assert_eq!(stats.book_data_pages, 1);
        assert_eq!(stats.skipped_pages, 1);
        assert_eq!(stats.verses, 1);
    }

    #[test]
    fn guide_pages_become_topics() {
        let entries = vec![CorpusEntry::new(
            "tg_faith.xhtml",
            r#"<html><body><h1>Faith</h1><p class="entry">by faith, Gen. 1:1.</p></body></html>"#,
        )];
        let (graph, stats) = aggregator().aggregate(&entries).unwrap();
        assert!(graph.topics.contains_key(&NodeKey::from("TG Faith")));
        assert_eq!(graph.references.len(), 1);
        assert_eq!(stats.guide_pages, 1);
    }

    #[test]
    fn failing_page_aborts() {
        let entries = vec![CorpusEntry::new(
            "gen_1.xhtml",
            r#"<html><head><title>Genesis Chapter 1</title></head><body>
               <p class="titleNumber">Chapter 1</p><p class="verse">no number</p></body></html>"#,
        )];
        assert!(aggregator().aggregate(&entries).is_err());
    }

    #[test]
    fn read_directory_collects_pages() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("OEBPS")).unwrap();
        std::fs::write(dir.path().join("OEBPS/gen_1.xhtml"), chapter("Genesis", 1, "x")).unwrap();
        std::fs::write(dir.path().join("OEBPS/style.css"), "p {}").unwrap();
        std::fs::write(dir.path().join("tg_faith.xhtml"), "<html></html>").unwrap();

        let entries = read_directory(dir.path()).unwrap();
        let paths: Vec<&str> = entries.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["OEBPS/gen_1.xhtml", "tg_faith.xhtml"]);
    }
}
