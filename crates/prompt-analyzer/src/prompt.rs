//! Prompt texts sent to the model.

use carttotal_core_types::Window;

pub const SYSTEM_PROMPT: &str = r#"You are an expert at extracting final cart totals from e-commerce checkout pages.

KEY RULES:
- Always return JSON in exact format: {"index": number, "text": string, "amount": number, "confidence": number, "explanation": string}
- Extract ONLY the final total amount, ignore subtotals, taxes, shipping
- Convert currency strings to numbers (e.g., "$15.07" becomes 15.07)
- If uncertain, set low confidence score
- If no clear total found, return amount: null

PRIORITY ORDER for finding totals:
1. "Grand Total", "Order Total", "Final Total"
2. "Total", "Amount Due", "You Pay"
3. Last/largest price in a container with multiple prices

Always respond with valid JSON only."#;

/// User turn for one window; the window is embedded as pretty JSON.
pub fn analysis_prompt(window: &Window) -> String {
    let containers = serde_json::to_string_pretty(window).unwrap_or_else(|_| "[]".to_string());
    format!(
        r#"Analyze these containers and find the FINAL CART TOTAL or ORDER TOTAL.

CONTAINERS TO ANALYZE:
{containers}

INSTRUCTIONS:
1. Look for keywords like: "total", "grand total", "order total", "final", "amount due", "checkout total"
2. Extract the FINAL numeric amount (not subtotals, taxes, or individual items)
3. If multiple prices exist in one container, choose the FINAL/TOTAL amount
4. Parse currency amounts like $15.07, $23.56, etc.

REQUIRED OUTPUT FORMAT (JSON only):
{{
  "index": <index_of_container_with_final_total>,
  "text": <full_text_of_that_container>,
  "amount": <numeric_value_only_no_currency_symbol>,
  "confidence": <0_to_1_score>,
  "explanation": "<brief_reason>"
}}

Return JSON only - no other text:"#
    )
}
