//! Selector generation and resolution
//!
//! Paths are built bottom-up: an ancestor with an id anchors the path and
//! ends the walk; otherwise each level contributes its tag, up to three
//! classes and an `:nth-of-type` index when same-tag siblings exist. A walk
//! that reaches `<body>` is rooted at `body` so the path stays unambiguous.

use carttotal_core_types::Selector;
use tracing::{debug, warn};

use crate::document::{DocumentQuery, NodeRef};

const MAX_CLASSES_PER_LEVEL: usize = 3;

/// Builds a re-resolvable selector for `node`, walking at most `max_depth` levels.
pub fn build_selector<D>(doc: &D, node: NodeRef, max_depth: usize) -> Option<Selector>
where
    D: DocumentQuery + ?Sized,
{
    let tag = doc.tag_name(node)?.to_string();
    let mut parts: Vec<String> = Vec::new();
    let mut current = Some(node);
    let mut reached_body = false;

    while let Some(element) = current {
        if doc.is_body(element) {
            reached_body = true;
            break;
        }
        if parts.len() >= max_depth {
            break;
        }

        let mut part = doc.tag_name(element)?.to_string();

        if let Some(id) = doc.id(element).filter(|id| !id.is_empty()) {
            part.push('#');
            part.push_str(&css_escape(id));
            parts.push(part);
            break;
        }

        let classes: Vec<String> = doc
            .class_list(element)
            .into_iter()
            .take(MAX_CLASSES_PER_LEVEL)
            .map(css_escape)
            .collect();
        if !classes.is_empty() {
            part.push('.');
            part.push_str(&classes.join("."));
        }

        let parent = doc.parent(element);
        if let Some(parent) = parent {
            let element_tag = doc.tag_name(element);
            let same_tag: Vec<NodeRef> = doc
                .children(parent)
                .into_iter()
                .filter(|sibling| doc.tag_name(*sibling) == element_tag)
                .collect();
            if same_tag.len() > 1 {
                if let Some(position) = same_tag.iter().position(|sibling| *sibling == element) {
                    part.push_str(&format!(":nth-of-type({})", position + 1));
                }
            }
        }

        parts.push(part);
        current = parent;
    }

    if parts.is_empty() {
        return None;
    }
    if reached_body {
        parts.push("body".to_string());
    }
    parts.reverse();

    Some(
        Selector::new(parts.join(" > "), tag)
            .with_id(doc.id(node).map(str::to_string))
            .with_class_name(doc.class_attr(node).map(str::to_string)),
    )
}

/// Resolves a selector against the current document: id first, then path.
///
/// An unparseable path is logged and treated as unresolved.
pub fn resolve_selector<D>(doc: &D, selector: &Selector) -> Option<NodeRef>
where
    D: DocumentQuery + ?Sized,
{
    if let Some(id) = selector.id.as_deref().filter(|id| !id.is_empty() && *id != "none") {
        if let Some(node) = doc.element_by_id(id) {
            return Some(node);
        }
        debug!(id, "cached id no longer present");
    }

    if selector.path.is_empty() {
        return None;
    }

    match doc.query_selector(&selector.path) {
        Ok(node) => node,
        Err(err) => {
            warn!(path = %selector.path, %err, "invalid cached selector");
            None
        }
    }
}

/// Escapes an identifier for use in a CSS selector (CSSOM `CSS.escape`).
pub fn css_escape(ident: &str) -> String {
    let chars: Vec<char> = ident.chars().collect();
    let mut out = String::with_capacity(ident.len());

    for (index, &ch) in chars.iter().enumerate() {
        let code = ch as u32;
        if ch == '\0' {
            out.push('\u{FFFD}');
        } else if (0x01..=0x1F).contains(&code)
            || code == 0x7F
            || (index == 0 && ch.is_ascii_digit())
            || (index == 1 && ch.is_ascii_digit() && chars[0] == '-')
        {
            out.push_str(&format!("\\{:x} ", code));
        } else if index == 0 && ch == '-' && chars.len() == 1 {
            out.push_str("\\-");
        } else if code >= 0x80 || ch == '-' || ch == '_' || ch.is_ascii_alphanumeric() {
            out.push(ch);
        } else {
            out.push('\\');
            out.push(ch);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::HtmlDocument;

    #[test]
    fn escapes_like_cssom() {
        assert_eq!(css_escape("total"), "total");
        assert_eq!(css_escape("1st"), "\\31 st");
        assert_eq!(css_escape("-2x"), "-\\32 x");
        assert_eq!(css_escape("-"), "\\-");
        assert_eq!(css_escape("a:b.c"), "a\\:b\\.c");
    }

    #[test]
    fn id_ancestor_anchors_the_path() {
        let doc = HtmlDocument::parse(
            r#"<body><div id="cart"><p class="row big">x</p><p class="row">Total $3.00</p></div></body>"#,
        );
        let target = doc.query_selector_all("p").unwrap()[1];
        let selector = build_selector(&doc, target, 5).unwrap();
        assert_eq!(selector.path, "div#cart > p.row:nth-of-type(2)");
        assert_eq!(selector.tag, "p");
        assert_eq!(selector.class_name.as_deref(), Some("row"));
        assert_eq!(resolve_selector(&doc, &selector), Some(target));
    }

    #[test]
    fn walk_reaching_body_is_rooted() {
        let doc = HtmlDocument::parse(r#"<body><section><span>Total $1.00</span></section></body>"#);
        let target = doc.elements_by_tag(&["span"])[0];
        let selector = build_selector(&doc, target, 5).unwrap();
        assert_eq!(selector.path, "body > section > span");
        assert_eq!(resolve_selector(&doc, &selector), Some(target));
    }

    #[test]
    fn depth_is_bounded() {
        let doc = HtmlDocument::parse(
            "<body><div><div><div><div><div><div><span>Total $1.00</span></div></div></div></div></div></div></body>",
        );
        let target = doc.elements_by_tag(&["span"])[0];
        let selector = build_selector(&doc, target, 5).unwrap();
        assert_eq!(selector.path.split(" > ").count(), 5);
        assert!(!selector.path.starts_with("body"));
    }

    #[test]
    fn id_lookup_wins_over_stale_path() {
        let doc = HtmlDocument::parse(r#"<body><b id="grand">Total $9.00</b></body>"#);
        let selector = Selector::new("div.gone > span", "b").with_id(Some("grand".into()));
        assert_eq!(resolve_selector(&doc, &selector), doc.element_by_id("grand"));
    }

    #[test]
    fn invalid_path_resolves_to_none() {
        let doc = HtmlDocument::parse("<body><p>x</p></body>");
        let selector = Selector::new("p:::", "p");
        assert_eq!(resolve_selector(&doc, &selector), None);
    }
}
