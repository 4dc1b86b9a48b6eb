//! Commits the decode outcome into the request attributes.

use axum::extract::Request;
use tracing::debug;

use crate::context::{Attribute, Attributes, AttributesExt};
use crate::services::auth::decoder::DecodeError;
use crate::settings::AttributeNames;
use crate::token::DecodedToken;

/// Outcome of the extract + decode phase.
///
/// - `Ok(Some(_))`: a token was found and decoded
/// - `Ok(None)`: no extractor found a token (anonymous request)
/// - `Err(_)`: a token was found but could not be decoded
pub type TokenOutcome = Result<Option<DecodedToken>, DecodeError>;

pub trait TokenInjector: Send + Sync {
    fn inject(&self, outcome: TokenOutcome, request: Request) -> Request;
}

/// Writes decoded tokens to one attribute and error messages to another.
#[derive(Debug, Clone, Default)]
pub struct AttributeInjector {
    names: AttributeNames,
}

impl AttributeInjector {
    pub const ERROR_PREFIX: &'static str = "Token error: ";

    pub fn new(names: AttributeNames) -> Self {
        Self { names }
    }

    pub fn names(&self) -> &AttributeNames {
        &self.names
    }
}

impl TokenInjector for AttributeInjector {
    fn inject(&self, outcome: TokenOutcome, request: Request) -> Request {
        match outcome {
            Ok(Some(token)) => request.with_attribute(self.names.token(), token),
            Ok(None) => request.with_attribute(self.names.token(), Attribute::Absent),
            Err(err) => {
                debug!(attribute = self.names.error(), error = %err, "writing token error");
                request.with_attribute(
                    self.names.error(),
                    format!("{}{err}", Self::ERROR_PREFIX),
                )
            }
        }
    }
}

/// Reads back a decoded token written by [`AttributeInjector`].
#[derive(Debug, Clone)]
pub struct AttributeTokenProvider {
    name: String,
}

impl AttributeTokenProvider {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn token<'r>(&self, request: &'r Request) -> Option<&'r DecodedToken> {
        request
            .extensions()
            .get::<Attributes>()?
            .token(&self.name)
    }
}

impl Default for AttributeTokenProvider {
    fn default() -> Self {
        Self::new(AttributeNames::TOKEN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use serde_json::{Value, json};

    fn request() -> Request {
        Request::builder().uri("/").body(Body::empty()).unwrap()
    }

    fn decoded(value: Value) -> DecodedToken {
        match value {
            Value::Object(map) => DecodedToken::new(map),
            _ => panic!("claims must be an object"),
        }
    }

    #[test]
    fn success_writes_token_and_leaves_error_alone() {
        let token = decoded(json!({"sub": "1"}));
        let req = request().with_attribute("token.error", "stale");
        let req = AttributeInjector::default().inject(Ok(Some(token.clone())), req);

        let attrs = req.attributes();
        assert_eq!(attrs.token("token"), Some(&token));
        assert_eq!(attrs.text("token.error"), Some("stale"));
    }

    #[test]
    fn not_found_writes_absent_marker() {
        let req = AttributeInjector::default().inject(Ok(None), request());

        let attrs = req.attributes();
        assert_eq!(attrs.get("token"), Some(&Attribute::Absent));
        assert!(attrs.get("token.error").is_none());
    }

    #[test]
    fn failure_writes_prefixed_message_only() {
        let req = AttributeInjector::default().inject(Err(DecodeError::Expired), request());

        let attrs = req.attributes();
        assert_eq!(attrs.text("token.error"), Some("Token error: expired token"));
        assert!(attrs.get("token").is_none());
    }

    #[test]
    fn custom_names_are_used() {
        let names = AttributeNames::with_error("jwt", "jwt_problem").unwrap();
        let injector = AttributeInjector::new(names);

        let req = injector.inject(Err(DecodeError::InvalidSignature), request());
        assert_eq!(
            req.attributes().text("jwt_problem"),
            Some("Token error: signature verification failed")
        );
    }

    #[test]
    fn provider_returns_exactly_what_was_injected() {
        let token = decoded(json!({"sub": "1", "roles": ["a", "b"], "n": 1.5}));
        let req = AttributeInjector::default().inject(Ok(Some(token.clone())), request());

        assert_eq!(AttributeTokenProvider::default().token(&req), Some(&token));
        assert_eq!(AttributeTokenProvider::new("other").token(&req), None);
    }
}
