//! Yotpo `bottom_lines` response types.
//!
//! The endpoint wraps results as `{"response": {"bottomlines": [...]}}`.
//! Anything without that shape fails deserialization, which the client
//! reports as a schema error rather than an empty page.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};

/// Top-level envelope of a `bottom_lines` response.
#[derive(Debug, Deserialize)]
pub struct BottomLinesEnvelope {
    pub response: BottomLinesResponse,
}

#[derive(Debug, Deserialize)]
pub struct BottomLinesResponse {
    pub bottomlines: Vec<WireBottomline>,
}

/// One bottomline as sent on the wire.
#[derive(Debug, Deserialize)]
pub struct WireBottomline {
    /// Store-side product identifier; the provider sends it as a string but
    /// older stores may have numeric keys.
    #[serde(deserialize_with = "string_or_number")]
    pub domain_key: String,
    #[serde(deserialize_with = "decimal_from_any")]
    pub product_score: Decimal,
    pub total_reviews: u32,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number for domain_key, got {other}"
        ))),
    }
}

fn decimal_from_any<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => s,
        serde_json::Value::Number(n) => n.to_string(),
        other => {
            return Err(serde::de::Error::custom(format!(
                "expected number for product_score, got {other}"
            )))
        }
    };
    let raw = raw.trim();
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .map_err(|e| serde::de::Error::custom(format!("invalid product_score {raw:?}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_numeric_score_and_string_key() {
        let json = r#"{"domain_key":"1042","product_score":4.75,"total_reviews":8}"#;
        let wire: WireBottomline = serde_json::from_str(json).unwrap();
        assert_eq!(wire.domain_key, "1042");
        assert_eq!(wire.product_score, Decimal::new(475, 2));
        assert_eq!(wire.total_reviews, 8);
    }

    #[test]
    fn accepts_numeric_domain_key_and_string_score() {
        let json = r#"{"domain_key":1042,"product_score":"3.5","total_reviews":0}"#;
        let wire: WireBottomline = serde_json::from_str(json).unwrap();
        assert_eq!(wire.domain_key, "1042");
        assert_eq!(wire.product_score, Decimal::new(35, 1));
    }

    #[test]
    fn negative_review_count_is_rejected() {
        let json = r#"{"domain_key":"a","product_score":1,"total_reviews":-1}"#;
        assert!(serde_json::from_str::<WireBottomline>(json).is_err());
    }

    #[test]
    fn envelope_without_bottomlines_is_rejected() {
        let json = r#"{"response":{"pagination":{"page":1}}}"#;
        assert!(serde_json::from_str::<BottomLinesEnvelope>(json).is_err());
    }

    #[test]
    fn null_bottomlines_is_rejected() {
        let json = r#"{"response":{"bottomlines":null}}"#;
        assert!(serde_json::from_str::<BottomLinesEnvelope>(json).is_err());
    }
}
