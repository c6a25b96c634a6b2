//! Per-document extraction of verses, topics and references.
//!
//! Pages are parsed with `scraper` into a queryable element tree. Each page
//! is extracted independently into a [`ScriptureGraph`] fragment: the
//! extractor holds no state across pages, so extraction order never matters.

pub mod chapter;
pub mod guide;

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

use crate::citation::{CitationTables, ReferenceParser};

pub use chapter::ChapterPage;
pub use guide::GuidePage;

// ── Selectors ───────────────────────────────────────────────────────────

static SEL_TITLE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("title").unwrap());
static SEL_TITLE_NUMBER: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".titleNumber").unwrap());
static SEL_VERSE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".verse-first, .verse").unwrap());
static SEL_LIST_ITEM: LazyLock<Selector> = LazyLock::new(|| Selector::parse(".listItem").unwrap());
static SEL_LABEL_VERSE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".label-verse").unwrap());
static SEL_PARAGRAPH: LazyLock<Selector> = LazyLock::new(|| Selector::parse("p").unwrap());
static SEL_GUIDE_TITLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".title, h1").unwrap());
static SEL_ENTRY: LazyLock<Selector> = LazyLock::new(|| Selector::parse(".entry").unwrap());
static SEL_SEE_ALSO: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".seeAlso, p").unwrap());

/// Extracts records from parsed corpus pages.
#[derive(Debug, Clone)]
pub struct PageExtractor {
    parser: ReferenceParser,
}

impl PageExtractor {
    pub fn new(parser: ReferenceParser) -> Self {
        Self { parser }
    }

    pub fn parser(&self) -> &ReferenceParser {
        &self.parser
    }

    pub fn tables(&self) -> &CitationTables {
        self.parser.tables()
    }
}

/// Parse page markup into an element tree.
pub fn parse_page(content: &str) -> Html {
    Html::parse_document(content)
}

fn has_class(el: ElementRef<'_>, class: &str) -> bool {
    el.value().classes().any(|c| c == class)
}

/// All descendant text of an element, whitespace-collapsed.
fn element_text(el: ElementRef<'_>) -> String {
    collapse_whitespace(&el.text().collect::<String>())
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapse_whitespace_joins_runs() {
        assert_eq!(collapse_whitespace("  In the\n beginning\t God "), "In the beginning God");
    }

    #[test]
    fn class_lookup() {
        let html = parse_page(r#"<p class="verse first">x</p>"#);
        let el = html.select(&SEL_PARAGRAPH).next().unwrap();
        assert!(has_class(el, "verse"));
        assert!(has_class(el, "first"));
        assert!(!has_class(el, "verse-first"));
        assert_eq!(element_text(el), "x");
    }
}
