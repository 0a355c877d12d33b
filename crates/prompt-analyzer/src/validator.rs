use carttotal_core_types::limits::DEFAULT_CONFIDENCE;
use carttotal_core_types::{AnalysisResult, OriginalMap};
use serde_json::{Map, Value};
use tracing::{debug, warn};

const DEFAULT_EXPLANATION: &str = "model analysis";

/// Returns the JSON object embedded in a model reply.
///
/// Accepts a bare object, a fenced code block, or the first brace-balanced
/// object inside surrounding prose.
pub fn extract_json_object(raw: &str) -> Option<String> {
    if raw.trim_start().starts_with('{') {
        return balanced_object(raw).or_else(|| Some(trim_symmetric(raw)));
    }

    let fence = "```";
    if let Some(start) = raw.find(fence) {
        let after_fence = &raw[start + fence.len()..];
        let after_lang = after_fence.trim_start_matches(|c: char| c.is_alphanumeric() || c == '_');
        if let Some(end) = after_lang.find(fence) {
            if let Some(object) = balanced_object(&after_lang[..end]) {
                return Some(object);
            }
        }
    }

    balanced_object(raw)
}

/// First `{ ... }` span with balanced braces, ignoring braces inside strings.
fn balanced_object(raw: &str) -> Option<String> {
    let start = raw.find('{')?;
    let mut depth = 0i32;
    let mut in_string = false;
    let mut escaped = false;
    for (offset, ch) in raw[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(raw[start..=start + offset].to_string());
                }
            }
            _ => {}
        }
    }
    None
}

fn trim_symmetric(value: &str) -> String {
    value.trim().trim_matches('`').trim().to_string()
}

/// Turns an untrusted model reply into an [`AnalysisResult`].
#[derive(Clone, Copy, Debug, Default)]
pub struct ResultValidator;

impl ResultValidator {
    pub fn new() -> Self {
        Self
    }

    /// `None` whenever the reply cannot be trusted. Never fails.
    pub fn parse(&self, raw: &str, original_map: &OriginalMap) -> Option<AnalysisResult> {
        let Some(json) = extract_json_object(raw) else {
            warn!(reply_len = raw.len(), "model reply holds no JSON object");
            return None;
        };
        let object = match serde_json::from_str::<Value>(&json) {
            Ok(Value::Object(object)) => object,
            Ok(_) => {
                warn!("model reply JSON is not an object");
                return None;
            }
            Err(err) => {
                warn!(%err, "model reply JSON did not parse");
                return None;
            }
        };

        let (Some(raw_amount), Some(raw_index)) = (object.get("amount"), object.get("index")) else {
            warn!("model reply is missing amount or index");
            return None;
        };
        let Some(index) = as_index(raw_index) else {
            warn!(index = %raw_index, "model reply index is not a non-negative integer");
            return None;
        };
        let Some(candidate) = original_map.get(index) else {
            warn!(index, "model reply references an unknown candidate");
            return None;
        };

        let result = AnalysisResult {
            amount: coerce_amount(raw_amount),
            confidence: confidence(&object),
            explanation: object
                .get("explanation")
                .and_then(Value::as_str)
                .filter(|text| !text.trim().is_empty())
                .unwrap_or(DEFAULT_EXPLANATION)
                .to_string(),
            selectors: vec![candidate.locator.clone()],
        };
        debug!(
            index,
            amount = ?result.amount,
            confidence = result.confidence,
            "model reply validated"
        );
        Some(result)
    }
}

fn as_index(value: &Value) -> Option<usize> {
    if let Some(index) = value.as_u64() {
        return usize::try_from(index).ok();
    }
    let float = value.as_f64()?;
    if float >= 0.0 && float.fract() == 0.0 && float <= usize::MAX as f64 {
        Some(float as usize)
    } else {
        None
    }
}

/// Numbers pass through; numeric strings such as `"1,234.56"` or `"$15.07"` are parsed.
fn coerce_amount(value: &Value) -> Option<f64> {
    let amount = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => {
            let cleaned: String = text
                .trim()
                .trim_start_matches('$')
                .chars()
                .filter(|ch| *ch != ',')
                .collect();
            cleaned.trim().parse::<f64>().ok()
        }
        _ => None,
    };
    amount.filter(|amount| amount.is_finite())
}

fn confidence(object: &Map<String, Value>) -> f64 {
    object
        .get("confidence")
        .and_then(Value::as_f64)
        .filter(|value| value.is_finite())
        .map(|value| value.clamp(0.0, 1.0))
        .unwrap_or(DEFAULT_CONFIDENCE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use carttotal_core_types::{Candidate, Selector};

    fn map() -> OriginalMap {
        let mut map = OriginalMap::new();
        map.insert(
            2,
            Candidate::from_locator(Selector::new("div.total", "div"), "Grand Total $43.00"),
        );
        map
    }

    #[test]
    fn extracts_from_fenced_block() {
        let input = "Here you go:\n```json\n{\"index\":2}\n```";
        assert_eq!(extract_json_object(input).unwrap(), "{\"index\":2}");
    }

    #[test]
    fn fenced_block_with_prose_yields_the_object() {
        let input = "```\nHere is the answer: {\"index\":2,\"amount\":43,\"confidence\":0.9}\n```";
        assert_eq!(
            extract_json_object(input).unwrap(),
            "{\"index\":2,\"amount\":43,\"confidence\":0.9}"
        );
        let result = ResultValidator.parse(input, &map()).unwrap();
        assert_eq!(result.amount, Some(43.0));
        assert_eq!(result.confidence, 0.9);
    }

    #[test]
    fn empty_fence_falls_back_to_prose_object() {
        let input = "```\nnothing here\n``` but {\"index\":2,\"amount\":1.5}";
        assert_eq!(
            extract_json_object(input).unwrap(),
            "{\"index\":2,\"amount\":1.5}"
        );
    }

    #[test]
    fn extracts_first_balanced_object_from_prose() {
        let input = r#"Sure! {"index": 2, "explanation": "brace } inside"} and {"index": 9}"#;
        assert_eq!(
            extract_json_object(input).unwrap(),
            r#"{"index": 2, "explanation": "brace } inside"}"#
        );
    }

    #[test]
    fn accepts_zero_amount_and_defaults_the_rest() {
        let result = ResultValidator
            .parse(r#"{"index": 2, "amount": 0}"#, &map())
            .unwrap();
        assert_eq!(result.amount, Some(0.0));
        assert_eq!(result.confidence, DEFAULT_CONFIDENCE);
        assert_eq!(result.explanation, DEFAULT_EXPLANATION);
        assert_eq!(result.selectors[0].path, "div.total");
    }

    #[test]
    fn explicit_zero_confidence_is_kept() {
        let result = ResultValidator
            .parse(r#"{"index": 2, "amount": 43, "confidence": 0}"#, &map())
            .unwrap();
        assert_eq!(result.confidence, 0.0);
    }

    #[test]
    fn string_amounts_are_coerced() {
        let result = ResultValidator
            .parse(r#"{"index": 2.0, "amount": "$1,043.00"}"#, &map())
            .unwrap();
        assert_eq!(result.amount, Some(1043.0));
    }

    #[test]
    fn rejects_untrusted_replies() {
        let validator = ResultValidator::new();
        assert!(validator
            .parse("I think the total is fifteen dollars", &map())
            .is_none());
        assert!(validator.parse(r#"{"index": 2}"#, &map()).is_none());
        assert!(validator.parse(r#"{"amount": 43}"#, &map()).is_none());
        assert!(validator
            .parse(r#"{"index": 7, "amount": 43}"#, &map())
            .is_none());
        assert!(validator
            .parse(r#"{"index": -1, "amount": 43}"#, &map())
            .is_none());
        assert!(validator.parse(r#"{"index": 2, "amount": }"#, &map()).is_none());
    }
}
