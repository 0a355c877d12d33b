use carttotal_core_types::{PriceBounds, Selector};
use perceiver_price::{extract_amount, resolve_selector, DocumentQuery};
use tracing::debug;

/// Cache fast path: first cached selector whose node text holds an in-bounds amount.
///
/// A selector that no longer resolves is skipped, never evicted.
pub fn resolve_known<D>(doc: &D, selectors: &[Selector], bounds: &PriceBounds) -> Option<f64>
where
    D: DocumentQuery + ?Sized,
{
    for selector in selectors {
        let Some(node) = resolve_selector(doc, selector) else {
            debug!(%selector, "cached selector did not resolve");
            continue;
        };
        let amount = doc
            .text_content(node)
            .and_then(|text| extract_amount(text, bounds));
        match amount {
            Some(amount) => {
                debug!(%selector, amount, "cached selector resolved");
                return Some(amount);
            }
            None => debug!(%selector, "cached selector holds no usable amount"),
        }
    }
    None
}
