//! USD amount recognition
//!
//! Four shapes are recognised, each with optional thousands separators and
//! optional cents: `$123.45`, `123.45$`, `USD 123.45`, `123.45 USD`.

use carttotal_core_types::PriceBounds;
use once_cell::sync::Lazy;
use regex::Regex;

const AMOUNT: &str = r"(\d+(?:,\d{3})*(?:\.\d{2})?)";

static CURRENCY_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        format!(r"\$\s*{AMOUNT}"),
        format!(r"{AMOUNT}\s*\$"),
        format!(r"(?i)USD\s*{AMOUNT}"),
        format!(r"(?i){AMOUNT}\s*USD"),
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("currency pattern compiles"))
    .collect()
});

/// Returns `true` when any currency shape occurs in `text`.
pub fn has_currency(text: &str) -> bool {
    CURRENCY_PATTERNS.iter().any(|pattern| pattern.is_match(text))
}

/// Parses a captured amount such as `1,234.56`.
pub fn parse_amount(raw: &str) -> Option<f64> {
    let cleaned: String = raw.chars().filter(|ch| *ch != ',').collect();
    cleaned.parse::<f64>().ok().filter(|value| value.is_finite())
}

/// First in-bounds amount found in `text`.
///
/// Patterns are tried in order; each pattern contributes only its first
/// match, and an out-of-bounds match falls through to the next pattern.
pub fn extract_amount(text: &str, bounds: &PriceBounds) -> Option<f64> {
    CURRENCY_PATTERNS.iter().find_map(|pattern| {
        pattern
            .captures(text)
            .and_then(|caps| caps.get(1))
            .and_then(|amount| parse_amount(amount.as_str()))
            .filter(|amount| bounds.contains(*amount))
    })
}
