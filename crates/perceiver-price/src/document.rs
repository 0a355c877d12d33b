//! Read-only document query interface
//!
//! The pipeline never mutates the page. It only needs to enumerate elements
//! by tag, read text/id/classes, walk parents and children, and resolve a
//! selector back to an element.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Node, Selector as CssSelector};

use crate::errors::DomError;

static ANY_ELEMENT: Lazy<CssSelector> =
    Lazy::new(|| CssSelector::parse("*").expect("universal selector parses"));

static TITLE: Lazy<CssSelector> =
    Lazy::new(|| CssSelector::parse("title").expect("title selector parses"));

/// Subtrees whose text never renders.
const HIDDEN_TEXT_TAGS: &[&str] = &["script", "style", "noscript", "template"];

/// Opaque handle to an element; only meaningful for the document that issued it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeRef(usize);

impl NodeRef {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Document traversal surface consumed by the scanner and the resolvers.
pub trait DocumentQuery {
    /// Elements whose tag is in `tags`, in document order.
    fn elements_by_tag(&self, tags: &[&str]) -> Vec<NodeRef>;

    /// Lower-case tag name.
    fn tag_name(&self, node: NodeRef) -> Option<&str>;

    /// Concatenated descendant text, unnormalized; script and style contents are skipped.
    fn text_content(&self, node: NodeRef) -> Option<&str>;

    fn id(&self, node: NodeRef) -> Option<&str>;

    /// Raw `class` attribute.
    fn class_attr(&self, node: NodeRef) -> Option<&str>;

    fn parent(&self, node: NodeRef) -> Option<NodeRef>;

    /// Element children in document order.
    fn children(&self, node: NodeRef) -> Vec<NodeRef>;

    fn element_by_id(&self, id: &str) -> Option<NodeRef>;

    /// All elements matching a CSS selector, in document order.
    fn query_selector_all(&self, css: &str) -> Result<Vec<NodeRef>, DomError>;

    fn query_selector(&self, css: &str) -> Result<Option<NodeRef>, DomError> {
        Ok(self.query_selector_all(css)?.into_iter().next())
    }

    fn class_list(&self, node: NodeRef) -> Vec<&str> {
        self.class_attr(node)
            .map(|raw| raw.split_whitespace().collect())
            .unwrap_or_default()
    }

    fn is_body(&self, node: NodeRef) -> bool {
        self.tag_name(node) == Some("body")
    }
}

#[derive(Debug, Clone)]
struct ElementNode {
    tag: String,
    id: Option<String>,
    class_attr: Option<String>,
    text: String,
    parent: Option<NodeRef>,
    children: Vec<NodeRef>,
}

/// HTML document backed by `scraper`.
///
/// Element data is flattened into an arena at parse time so node handles are
/// plain indices; the parsed tree is kept for CSS selector matching.
pub struct HtmlDocument {
    html: Html,
    nodes: Vec<ElementNode>,
}

impl HtmlDocument {
    pub fn parse(source: &str) -> Self {
        let html = Html::parse_document(source);
        let nodes = {
            let elements: Vec<ElementRef<'_>> = html.select(&ANY_ELEMENT).collect();
            let positions: HashMap<_, usize> = elements
                .iter()
                .enumerate()
                .map(|(index, element)| (element.id(), index))
                .collect();

            elements
                .iter()
                .map(|element| {
                    let value = element.value();
                    ElementNode {
                        tag: value.name().to_ascii_lowercase(),
                        id: value.id().map(str::to_string),
                        class_attr: value.attr("class").map(str::to_string),
                        text: visible_text(*element),
                        parent: element
                            .parent()
                            .and_then(ElementRef::wrap)
                            .and_then(|parent| positions.get(&parent.id()).copied())
                            .map(NodeRef),
                        children: element
                            .children()
                            .filter_map(ElementRef::wrap)
                            .filter_map(|child| positions.get(&child.id()).copied())
                            .map(NodeRef)
                            .collect(),
                    }
                })
                .collect()
        };

        Self { html, nodes }
    }

    pub fn title(&self) -> Option<String> {
        self.html
            .select(&TITLE)
            .next()
            .map(|title| title.text().collect::<String>().trim().to_string())
    }

    pub fn element_count(&self) -> usize {
        self.nodes.len()
    }

    fn node(&self, node: NodeRef) -> Option<&ElementNode> {
        self.nodes.get(node.0)
    }
}

fn visible_text(element: ElementRef<'_>) -> String {
    let mut text = String::new();
    push_visible_text(element, &mut text);
    text
}

fn push_visible_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(fragment) => out.push_str(fragment),
            Node::Element(inner) if HIDDEN_TEXT_TAGS.contains(&inner.name()) => {}
            Node::Element(_) => {
                if let Some(inner) = ElementRef::wrap(child) {
                    push_visible_text(inner, out);
                }
            }
            _ => {}
        }
    }
}

impl DocumentQuery for HtmlDocument {
    fn elements_by_tag(&self, tags: &[&str]) -> Vec<NodeRef> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| tags.iter().any(|tag| tag.eq_ignore_ascii_case(&node.tag)))
            .map(|(index, _)| NodeRef(index))
            .collect()
    }

    fn tag_name(&self, node: NodeRef) -> Option<&str> {
        self.node(node).map(|n| n.tag.as_str())
    }

    fn text_content(&self, node: NodeRef) -> Option<&str> {
        self.node(node).map(|n| n.text.as_str())
    }

    fn id(&self, node: NodeRef) -> Option<&str> {
        self.node(node).and_then(|n| n.id.as_deref())
    }

    fn class_attr(&self, node: NodeRef) -> Option<&str> {
        self.node(node).and_then(|n| n.class_attr.as_deref())
    }

    fn parent(&self, node: NodeRef) -> Option<NodeRef> {
        self.node(node).and_then(|n| n.parent)
    }

    fn children(&self, node: NodeRef) -> Vec<NodeRef> {
        self.node(node)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    fn element_by_id(&self, id: &str) -> Option<NodeRef> {
        self.nodes
            .iter()
            .position(|node| node.id.as_deref() == Some(id))
            .map(NodeRef)
    }

    fn query_selector_all(&self, css: &str) -> Result<Vec<NodeRef>, DomError> {
        let selector = CssSelector::parse(css)
            .map_err(|err| DomError::invalid_selector(css, err.to_string()))?;
        let order: HashMap<_, usize> = self
            .html
            .select(&ANY_ELEMENT)
            .enumerate()
            .map(|(index, element)| (element.id(), index))
            .collect();

        Ok(self
            .html
            .select(&selector)
            .filter_map(|element| order.get(&element.id()).copied())
            .map(NodeRef)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<html><head><title> Checkout </title></head><body>
        <div id="summary" class="order  summary"><span>Subtotal</span><span>Total $5.00</span></div>
        </body></html>"#;

    #[test]
    fn arena_links_parents_and_children() {
        let doc = HtmlDocument::parse(PAGE);
        let summary = doc.element_by_id("summary").unwrap();
        let children = doc.children(summary);
        assert_eq!(children.len(), 2);
        assert_eq!(doc.parent(children[1]), Some(summary));
        assert_eq!(doc.tag_name(children[1]), Some("span"));
        assert_eq!(doc.class_list(summary), vec!["order", "summary"]);
        assert!(doc.is_body(doc.parent(summary).unwrap()));
    }

    #[test]
    fn script_and_style_text_is_not_visible() {
        let doc = HtmlDocument::parse(
            r#"<body><div id="pay">Pay<script>var order_total="$9.99"</script><style>.t{}</style> now</div></body>"#,
        );
        let pay = doc.element_by_id("pay").unwrap();
        assert_eq!(doc.text_content(pay), Some("Pay now"));
        assert!(crate::CandidateScanner::default().scan(&doc).is_empty());
    }

    #[test]
    fn query_selector_maps_back_to_handles() {
        let doc = HtmlDocument::parse(PAGE);
        let node = doc
            .query_selector("div#summary > span:nth-of-type(2)")
            .unwrap()
            .unwrap();
        assert_eq!(doc.text_content(node), Some("Total $5.00"));
    }

    #[test]
    fn invalid_selector_is_an_error() {
        let doc = HtmlDocument::parse(PAGE);
        assert!(matches!(
            doc.query_selector("div[[["),
            Err(DomError::InvalidSelector { .. })
        ));
    }

    #[test]
    fn reads_title() {
        let doc = HtmlDocument::parse(PAGE);
        assert_eq!(doc.title().as_deref(), Some("Checkout"));
    }
}
