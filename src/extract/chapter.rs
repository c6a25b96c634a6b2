//! Chapter pages: header identity, verse text and footnote references.

use std::collections::BTreeMap;

use scraper::{ElementRef, Html};
use tracing::debug;

use crate::canon::BookCode;
use crate::error::{ExtractError, ExtractResult};
use crate::model::{NodeKey, Reference, ScriptureGraph, Verse};

use super::{
    PageExtractor, SEL_LABEL_VERSE, SEL_LIST_ITEM, SEL_PARAGRAPH, SEL_TITLE, SEL_TITLE_NUMBER,
    SEL_VERSE, collapse_whitespace, element_text, has_class,
};

/// Records extracted from one chapter page.
#[derive(Debug, Default)]
pub struct ChapterPage {
    /// `(book, chapter)`, or `None` for pages without a chapter number
    /// (tables of contents, front matter).
    pub header: Option<(BookCode, u32)>,
    pub verses: BTreeMap<NodeKey, Verse>,
    pub references: Vec<Reference>,
}

impl ChapterPage {
    pub fn into_records(self) -> ScriptureGraph {
        ScriptureGraph {
            verses: self.verses,
            topics: BTreeMap::new(),
            references: self.references,
        }
    }
}

impl PageExtractor {
    /// Extract a chapter page. `page` names the page in errors.
    pub fn extract_chapter(&self, page: &str, document: &Html) -> ExtractResult<ChapterPage> {
        let Some((book, chapter)) = read_header(document)? else {
            debug!(page, "no chapter number; skipping");
            return Ok(ChapterPage::default());
        };

        let verses = self.read_verses(document, book, chapter)?;
        let references = if self.tables().is_reference_exempt(book) {
            Vec::new()
        } else {
            self.read_references(page, document, book, chapter)?
        };

        Ok(ChapterPage {
            header: Some((book, chapter)),
            verses,
            references,
        })
    }

    fn read_verses(
        &self,
        document: &Html,
        book: BookCode,
        chapter: u32,
    ) -> ExtractResult<BTreeMap<NodeKey, Verse>> {
        let mut verses = BTreeMap::new();
        for el in document.select(&SEL_VERSE) {
            let mut number = None;
            let mut raw = String::new();
            collect_verse(el, &mut number, &mut raw);
            let text = collapse_whitespace(&raw);

            let Some(number) = number else {
                if self.tables().is_verse_exception(&text) {
                    debug!(%book, chapter, text, "skipping unnumbered verse element");
                    continue;
                }
                return Err(ExtractError::MissingVerseNumber {
                    book: book.to_string(),
                    chapter,
                    text,
                });
            };
            let verse = parse_number("verse number", &number)?;
            let record = Verse::new(book, chapter, verse, text);
            verses.insert(record.key(), record);
        }
        Ok(verses)
    }

    /// Footnote lists. The verse label is only printed on the first item
    /// for a verse, so the current source carries across items.
    fn read_references(
        &self,
        page: &str,
        document: &Html,
        book: BookCode,
        chapter: u32,
    ) -> ExtractResult<Vec<Reference>> {
        let mut references = Vec::new();
        let mut source: Option<NodeKey> = None;

        for item in document.select(&SEL_LIST_ITEM) {
            if let Some(label) = item.select(&SEL_LABEL_VERSE).next() {
                let verse = parse_number("verse label", &element_text(label))?;
                source = Some(NodeKey::verse(book, chapter, verse));
            }

            for p in item.select(&SEL_PARAGRAPH) {
                if p.value().attr("class").is_some() {
                    continue;
                }
                let text = element_text(p);
                if text.is_empty() {
                    continue;
                }
                let Some(source) = source.as_ref() else {
                    return Err(ExtractError::MissingSource {
                        page: page.to_string(),
                        text,
                    });
                };
                let targets =
                    self.parser()
                        .parse(&text)
                        .map_err(|e| ExtractError::Citation {
                            page: page.to_string(),
                            source: e,
                        })?;
                for target in targets {
                    if &target == source {
                        return Err(ExtractError::SelfReference {
                            key: target.to_string(),
                            text,
                        });
                    }
                    references.push(Reference::new(source.clone(), target));
                }
            }
        }
        Ok(references)
    }
}

/// Read the `(book, chapter)` identity of a page.
///
/// Pages without a `.titleNumber` are not chapters and yield `None`.
pub fn read_header(document: &Html) -> ExtractResult<Option<(BookCode, u32)>> {
    let Some(title_number) = document.select(&SEL_TITLE_NUMBER).next() else {
        return Ok(None);
    };
    let title = document
        .select(&SEL_TITLE)
        .next()
        .map(element_text)
        .unwrap_or_default();
    let name = title
        .split("Chapter")
        .next()
        .unwrap_or_default()
        .split("Section")
        .next()
        .unwrap_or_default()
        .trim();
    let book = BookCode::from_name(name)
        .ok_or_else(|| ExtractError::UnknownHeader { title: title.clone() })?;

    let label = title_number
        .text()
        .map(str::trim)
        .find(|t| !t.is_empty())
        .unwrap_or_default();
    let number = label.split_whitespace().last().unwrap_or_default();
    let chapter = parse_number("chapter number", number)?;
    Ok(Some((book, chapter)))
}

/// Walk a verse element, capturing its verse number and the text outside
/// verse numbers and footnote markers.
fn collect_verse(el: ElementRef<'_>, number: &mut Option<String>, text: &mut String) {
    for child in el.children() {
        if let Some(t) = child.value().as_text() {
            text.push_str(t);
        } else if let Some(child) = ElementRef::wrap(child) {
            if has_class(child, "verseNumber") {
                if number.is_none() {
                    *number = Some(element_text(child));
                }
            } else if !has_class(child, "marker") {
                collect_verse(child, number, text);
            }
        }
    }
}

fn parse_number(what: &str, text: &str) -> ExtractResult<u32> {
    text.trim()
        .parse()
        .map_err(|_| ExtractError::MalformedNumber {
            what: what.to_string(),
            text: text.to_string(),
        })
}
