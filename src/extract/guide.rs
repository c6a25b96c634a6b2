//! Topical Guide and Triple Combination index pages.
//!
//! A guide page is one topic. Its entries are short prose phrases followed
//! by scripture citations, and a "See also" clause links related topics.

use std::collections::BTreeMap;

use scraper::Html;
use tracing::debug;

use crate::error::{CitationError, ExtractError, ExtractResult};
use crate::model::{GuidePrefix, NodeKey, Reference, ScriptureGraph, Topic};

use super::{
    PageExtractor, SEL_ENTRY, SEL_GUIDE_TITLE, SEL_SEE_ALSO, SEL_TITLE, element_text, has_class,
};

const SEE_ALSO: &str = "See also";

/// Labels the document `<title>` may carry before the topic title.
const TITLE_LABELS: &[&str] = &["Index to the Triple Combination", "Topical Guide", "Index"];

/// Records extracted from one guide page.
#[derive(Debug)]
pub struct GuidePage {
    pub topic: Topic,
    pub references: Vec<Reference>,
}

impl GuidePage {
    pub fn into_records(self) -> ScriptureGraph {
        let mut records = ScriptureGraph::new();
        records.insert_topic(self.topic);
        records.references = self.references;
        records
    }
}

impl PageExtractor {
    /// Extract a guide page filed under `prefix`.
    pub fn extract_guide(
        &self,
        page: &str,
        document: &Html,
        prefix: GuidePrefix,
    ) -> ExtractResult<GuidePage> {
        let title = read_title(document).ok_or_else(|| ExtractError::MissingTitle {
            page: page.to_string(),
        })?;
        let topic = Topic::new(prefix, title);
        let source = topic.key();

        let mut targets = Vec::new();
        for entry in document.select(&SEL_ENTRY) {
            let text = element_text(entry);
            if text.is_empty() {
                continue;
            }
            let found = self.parser().parse_scripture(&text);
            if found.is_empty() {
                if self.tables().is_ignored(&text) {
                    debug!(page, text, "guide entry ignored");
                    continue;
                }
                return Err(ExtractError::Citation {
                    page: page.to_string(),
                    source: CitationError::Syntax { text },
                });
            }
            targets.extend(found);
        }

        for el in document.select(&SEL_SEE_ALSO) {
            let text = element_text(el);
            if !has_class(el, "seeAlso") && !text.starts_with(SEE_ALSO) {
                continue;
            }
            targets.extend(see_also_targets(&text, prefix));
        }

        let mut seen = BTreeMap::new();
        let mut references = Vec::new();
        for target in targets {
            if target == source {
                return Err(ExtractError::SelfReference {
                    key: source.to_string(),
                    text: page.to_string(),
                });
            }
            if seen.insert(target.clone(), ()).is_none() {
                references.push(Reference::new(source.clone(), target));
            }
        }
        debug!(page, topic = %source, references = references.len(), "guide page");

        Ok(GuidePage { topic, references })
    }
}

/// Topic title from `.title`, `<h1>`, or the document `<title>` with its
/// guide label removed.
fn read_title(document: &Html) -> Option<String> {
    if let Some(el) = document.select(&SEL_GUIDE_TITLE).next() {
        let text = element_text(el);
        if !text.is_empty() {
            return Some(text);
        }
    }
    let mut title = element_text(document.select(&SEL_TITLE).next()?);
    for label in TITLE_LABELS {
        if let Some(rest) = title.strip_prefix(label) {
            title = rest
                .trim_start_matches([':', '|', '-', '—', ' '])
                .to_string();
            break;
        }
    }
    (!title.is_empty()).then_some(title)
}

/// Topic targets of a "See also" clause. Items inherit the page's guide
/// prefix unless they name their own; Bible Dictionary items have no node.
fn see_also_targets(text: &str, prefix: GuidePrefix) -> Vec<NodeKey> {
    let body = text.strip_prefix(SEE_ALSO).unwrap_or(text);
    let mut current = prefix;
    let mut out = Vec::new();
    for item in body.split(';') {
        let item = item.trim().trim_end_matches(['.', ',']).trim();
        if item.is_empty() {
            continue;
        }
        let title = match item.split_once(' ') {
            Some(("BD", _)) => continue,
            Some((code, rest)) => match GuidePrefix::from_code(code) {
                Some(named) => {
                    current = named;
                    rest.trim()
                }
                None => item,
            },
            None => item,
        };
        out.push(NodeKey::topic(current, title));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::citation::ReferenceParser;
    use crate::extract::parse_page;

    fn extractor() -> PageExtractor {
        PageExtractor::new(ReferenceParser::bundled().unwrap())
    }

    fn targets(page: &GuidePage) -> Vec<&str> {
        page.references.iter().map(|r| r.target.as_str()).collect()
    }

    const FAITH: &str = r#"
    <html><head><title>Topical Guide | Faith</title></head><body>
      <h1 class="title">Faith</h1>
      <p class="entry">faith is the substance of things hoped for, Heb. 11:1 (1-6).</p>
      <p class="entry">by faith ye are saved, Eph. 2:8; Moro. 7:33.</p>
      <p class="seeAlso">See also Belief; Hope; BD Faith; ITC Faith in Christ</p>
    </body></html>"#;

    #[test]
    fn reads_topic_entries_and_see_also() {
        let page = extractor()
            .extract_guide("tg_faith.xhtml", &parse_page(FAITH), GuidePrefix::Tg)
            .unwrap();
        assert_eq!(page.topic.key().as_str(), "TG Faith");
        assert_eq!(
            targets(&page),
            vec![
                "Heb. 11:1",
                "Eph. 2:8",
                "Moro. 7:33",
                "TG Belief",
                "TG Hope",
                "ITC Faith in Christ",
            ]
        );
        assert!(page.references.iter().all(|r| r.source.as_str() == "TG Faith"));
    }

    #[test]
    fn title_falls_back_to_document_title() {
        let html = parse_page(
            r#"<html><head><title>Index to the Triple Combination: Zion</title></head><body>
               <p class="entry">city of holiness, Moses 7:18.</p></body></html>"#,
        );
        let page = extractor()
            .extract_guide("triple-index_zion.xhtml", &html, GuidePrefix::Itc)
            .unwrap();
        assert_eq!(page.topic.key().as_str(), "ITC Zion");
        assert_eq!(targets(&page), vec!["Moses 7:18"]);
    }

    #[test]
    fn see_also_paragraph_without_class() {
        let html = parse_page(
            r#"<html><head><title>Hope</title></head><body><h1>Hope</h1>
               <p>See also Faith.</p><p>Some unrelated prose.</p></body></html>"#,
        );
        let page = extractor()
            .extract_guide("tg_hope.xhtml", &html, GuidePrefix::Tg)
            .unwrap();
        assert_eq!(targets(&page), vec!["TG Faith"]);
    }

    #[test]
    fn entry_without_citation_is_an_error() {
        let html = parse_page(
            r#"<html><body><h1>Hope</h1><p class="entry">a bright hope</p></body></html>"#,
        );
        let err = extractor()
            .extract_guide("tg_hope.xhtml", &html, GuidePrefix::Tg)
            .unwrap_err();
        assert!(matches!(
            err,
            ExtractError::Citation { source: CitationError::Syntax { .. }, .. }
        ));
    }

    #[test]
    fn self_reference_is_an_error() {
        let html = parse_page(
            r#"<html><body><h1>Hope</h1><p class="seeAlso">See also Hope</p></body></html>"#,
        );
        let err = extractor()
            .extract_guide("tg_hope.xhtml", &html, GuidePrefix::Tg)
            .unwrap_err();
        assert!(matches!(err, ExtractError::SelfReference { .. }));
    }

    #[test]
    fn missing_title_is_an_error() {
        let html = parse_page("<html><body><p class=\"entry\">Gen. 1:1</p></body></html>");
        let err = extractor()
            .extract_guide("tg_blank.xhtml", &html, GuidePrefix::Tg)
            .unwrap_err();
        assert!(matches!(err, ExtractError::MissingTitle { .. }));
    }

    #[test]
    fn see_also_prefixes_carry_forward() {
        let keys = see_also_targets("See also TG Light; Truth; ITC Light of Christ.", GuidePrefix::Itc);
        let keys: Vec<&str> = keys.iter().map(NodeKey::as_str).collect();
        assert_eq!(keys, vec!["TG Light", "TG Truth", "ITC Light of Christ"]);
    }
}
