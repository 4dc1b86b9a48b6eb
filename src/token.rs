/*
 * Responsibility
 * - decode 済みトークン (claims) の型
 * - middleware は中身を解釈しない。「ある / ない」だけを見る
 */
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Verified claim payload produced by a [`TokenDecoder`](crate::TokenDecoder).
///
/// The pipeline treats it as opaque; handlers and probes read claims by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DecodedToken {
    claims: Map<String, Value>,
}

impl DecodedToken {
    pub fn new(claims: Map<String, Value>) -> Self {
        Self { claims }
    }

    pub fn claims(&self) -> &Map<String, Value> {
        &self.claims
    }

    pub fn claim(&self, name: &str) -> Option<&Value> {
        self.claims.get(name)
    }

    /// `sub` claim, when it is a string.
    pub fn subject(&self) -> Option<&str> {
        self.claim("sub").and_then(Value::as_str)
    }

    pub fn into_claims(self) -> Map<String, Value> {
        self.claims
    }
}

impl From<Map<String, Value>> for DecodedToken {
    fn from(claims: Map<String, Value>) -> Self {
        Self::new(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn token(value: Value) -> DecodedToken {
        match value {
            Value::Object(map) => DecodedToken::new(map),
            _ => panic!("claims must be an object"),
        }
    }

    #[test]
    fn subject_reads_string_sub() {
        let t = token(json!({"sub": "42", "name": "John"}));
        assert_eq!(t.subject(), Some("42"));
        assert_eq!(t.claim("name"), Some(&json!("John")));
    }

    #[test]
    fn subject_ignores_non_string_sub() {
        let t = token(json!({"sub": 42}));
        assert_eq!(t.subject(), None);
    }

    #[test]
    fn serializes_as_plain_claim_object() {
        let t = token(json!({"sub": "1", "exp": 10}));
        let v = serde_json::to_value(&t).unwrap();
        assert_eq!(v, json!({"sub": "1", "exp": 10}));
    }
}
