//! Candidate scanning
//!
//! Walks block, inline and table-cell elements and keeps short fragments
//! that carry both a price keyword and a currency amount. The length limit
//! applies to the raw text, so indentation inside a container counts.

use carttotal_core_types::{limits, Candidate};
use tracing::{debug, info};

use crate::document::{DocumentQuery, NodeRef};
use crate::keywords::contains_price_indicators;
use crate::selector::build_selector;

const DEFAULT_TAGS: &[&str] = &["div", "span", "p", "section", "article", "td", "th"];

#[derive(Debug, Clone)]
pub struct ScannerConfig {
    pub tags: Vec<String>,
    pub max_text_chars: usize,
    pub max_selector_depth: usize,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            tags: DEFAULT_TAGS.iter().map(|tag| tag.to_string()).collect(),
            max_text_chars: limits::MAX_CANDIDATE_TEXT_CHARS,
            max_selector_depth: limits::MAX_SELECTOR_DEPTH,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CandidateScanner {
    config: ScannerConfig,
}

impl CandidateScanner {
    pub fn new(config: ScannerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    /// Scans the document for price-like fragments, in document order.
    pub fn scan<D>(&self, doc: &D) -> Vec<Candidate>
    where
        D: DocumentQuery + ?Sized,
    {
        self.scan_nodes(doc)
            .into_iter()
            .map(|(_, candidate)| candidate)
            .collect()
    }

    /// Like [`scan`](Self::scan), keeping the node each candidate came from.
    pub fn scan_nodes<D>(&self, doc: &D) -> Vec<(NodeRef, Candidate)>
    where
        D: DocumentQuery + ?Sized,
    {
        let tags: Vec<&str> = self.config.tags.iter().map(String::as_str).collect();
        let elements = doc.elements_by_tag(&tags);
        let mut candidates = Vec::new();

        for element in elements {
            let Some(raw) = doc.text_content(element) else {
                continue;
            };
            // Measured before normalization: markup indentation marks a container.
            if raw.chars().count() > self.config.max_text_chars {
                continue;
            }
            let text = normalize_text(raw);
            if text.is_empty() {
                continue;
            }
            if !contains_price_indicators(&text) {
                continue;
            }
            match build_selector(doc, element, self.config.max_selector_depth) {
                Some(locator) => candidates.push((element, Candidate::from_locator(locator, text))),
                None => debug!(node = element.index(), "no selector for candidate node"),
            }
        }

        info!(candidates = candidates.len(), "scanned price candidates");
        candidates
    }
}

/// Collapses whitespace runs into single spaces.
pub fn normalize_text(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::HtmlDocument;

    #[test]
    fn keeps_only_keyword_and_currency_fragments() {
        let doc = HtmlDocument::parse(
            r#"<body>
                <span>$19.99</span>
                <span>Order total</span>
                <span>Order total: $19.99</span>
            </body>"#,
        );
        let candidates = CandidateScanner::default().scan(&doc);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].text, "Order total: $19.99");
        assert_eq!(candidates[0].tag, "span");
    }

    #[test]
    fn rejects_long_containers() {
        let filler = "item ".repeat(30);
        let html = format!("<body><div>{filler} Total $5.00</div></body>");
        let doc = HtmlDocument::parse(&html);
        assert!(CandidateScanner::default().scan(&doc).is_empty());
    }

    #[test]
    fn indented_container_is_rejected() {
        let pad = " ".repeat(40);
        let html = format!(
            "<body><div>\n{pad}<span>Subtotal $40.00</span>\n{pad}<span>Grand Total $43.00</span>\n</div></body>"
        );
        let doc = HtmlDocument::parse(&html);
        let texts: Vec<String> = CandidateScanner::default()
            .scan(&doc)
            .into_iter()
            .map(|candidate| candidate.text)
            .collect();
        assert_eq!(texts, vec!["Subtotal $40.00", "Grand Total $43.00"]);
    }

    #[test]
    fn whitespace_is_collapsed() {
        assert_eq!(normalize_text("  Grand\n   Total\t$4.00 "), "Grand Total $4.00");
    }

    #[test]
    fn ignores_tags_outside_the_configured_set() {
        let doc = HtmlDocument::parse("<body><li>Total $4.00</li></body>");
        assert!(CandidateScanner::default().scan(&doc).is_empty());
    }
}
