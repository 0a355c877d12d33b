use crate::currency::has_currency;

/// Words that mark a fragment as price-related (matched case-insensitively).
pub const PRICE_KEYWORDS: &[&str] = &[
    "total", "amount", "price", "cost", "sum", "grand", "final", "checkout", "order", "cart",
    "payment", "due", "balance",
];

pub fn contains_price_keyword(text: &str) -> bool {
    let lower = text.to_lowercase();
    PRICE_KEYWORDS.iter().any(|keyword| lower.contains(keyword))
}

/// Both a keyword and a currency shape are required; either alone is noise.
pub fn contains_price_indicators(text: &str) -> bool {
    contains_price_keyword(text) && has_currency(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requires_keyword_and_currency() {
        assert!(contains_price_indicators("Order TOTAL: $12.00"));
        assert!(!contains_price_indicators("$12.00"));
        assert!(!contains_price_indicators("Order total pending"));
    }
}
