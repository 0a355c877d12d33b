//! Page-level heuristics that do not need the model.

use carttotal_core_types::PriceBounds;
use tracing::{debug, warn};

use crate::currency::extract_amount;
use crate::document::DocumentQuery;

const CHECKOUT_KEYWORDS: &[&str] = &[
    "checkout",
    "cart",
    "basket",
    "bag",
    "payment",
    "order",
    "purchase",
    "buy",
    "shopping-cart",
];

/// Probed in order by [`extract_price_manually`].
pub const MANUAL_PRICE_SELECTORS: &[&str] = &[
    r#"[class*="total"]"#,
    r#"[class*="price"]"#,
    r#"[class*="amount"]"#,
    r#"[class*="cost"]"#,
    r#"[id*="total"]"#,
    r#"[id*="price"]"#,
    r#"[id*="amount"]"#,
    ".grand-total",
    ".order-total",
    ".cart-total",
    ".checkout-total",
    ".final-price",
];

/// Whether the URL (including its path) or the title suggests a checkout flow.
pub fn is_checkout_page(url: &str, title: &str) -> bool {
    let url = url.to_lowercase();
    let title = title.to_lowercase();
    CHECKOUT_KEYWORDS
        .iter()
        .any(|keyword| url.contains(keyword) || title.contains(keyword))
}

/// First in-bounds amount inside an element whose class or id looks price-related.
pub fn extract_price_manually<D>(doc: &D, bounds: &PriceBounds) -> Option<f64>
where
    D: DocumentQuery + ?Sized,
{
    for css in MANUAL_PRICE_SELECTORS {
        let nodes = match doc.query_selector_all(css) {
            Ok(nodes) => nodes,
            Err(err) => {
                warn!(%err, "skipping heuristic selector");
                continue;
            }
        };
        for node in nodes {
            let amount = doc
                .text_content(node)
                .and_then(|text| extract_amount(text, bounds));
            if let Some(amount) = amount {
                debug!(selector = css, amount, "heuristic selector matched");
                return Some(amount);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::HtmlDocument;

    #[test]
    fn detects_checkout_urls_and_titles() {
        assert!(is_checkout_page("https://shop.test/Checkout/step-2", ""));
        assert!(is_checkout_page("https://shop.test/", "Your Basket"));
        assert!(!is_checkout_page("https://news.test/article", "Headlines"));
    }

    #[test]
    fn manual_extraction_follows_selector_priority() {
        let doc = HtmlDocument::parse(
            r#"<body>
                <div id="price-box">$99.00</div>
                <div class="summary-total">$12.34</div>
            </body>"#,
        );
        assert_eq!(
            extract_price_manually(&doc, &PriceBounds::default()),
            Some(12.34)
        );
    }

    #[test]
    fn manual_extraction_skips_zero_amounts() {
        let doc = HtmlDocument::parse(r#"<body><span class="total">$0.00</span></body>"#);
        assert_eq!(extract_price_manually(&doc, &PriceBounds::default()), None);
    }
}
