//! Factory: preconfigured token / predicate middlewares from a few parameters.
//!
//! ```ignore
//! let factory = AuthFactory::with_secret(&config.token_secret)?;
//! let decode = factory.decode_tokens(&TokenSettings::default())?;
//! let assert = factory.assert_tokens(&AttributeNames::default());
//! ```
use std::sync::Arc;

use axum::extract::Request;

use crate::error::ConfigError;
use crate::middleware::predicate::{PredicateMiddleware, TokenPresent, TokenProbe};
use crate::middleware::responders::JsonErrorResponder;
use crate::middleware::token::TokenMiddleware;
use crate::services::auth::decoder::TokenDecoder;
use crate::services::auth::injector::AttributeInjector;
use crate::services::auth::jwt::JwtDecoder;
use crate::settings::{AttributeNames, TokenSettings};
use crate::token::DecodedToken;

/// Produces a decoder for every token middleware the factory builds.
pub type DecoderFactory = Arc<dyn Fn() -> Arc<dyn TokenDecoder> + Send + Sync>;

#[derive(Clone, Default)]
pub struct AuthFactory {
    decoder_factory: Option<DecoderFactory>,
}

impl std::fmt::Debug for AuthFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthFactory")
            .field("decoder_factory", &self.decoder_factory.is_some())
            .finish()
    }
}

impl AuthFactory {
    /// Without a decoder factory only the predicate middlewares can be built.
    pub fn new(decoder_factory: Option<DecoderFactory>) -> Self {
        Self { decoder_factory }
    }

    /// Factory decoding HMAC-signed JWTs with `secret`.
    pub fn with_secret(secret: &str) -> Result<Self, ConfigError> {
        Ok(Self::new(Some(Self::default_decoder_factory(secret)?)))
    }

    /// Validates the secret up front so that building middlewares later cannot fail on it.
    pub fn default_decoder_factory(secret: &str) -> Result<DecoderFactory, ConfigError> {
        let decoder: Arc<dyn TokenDecoder> = Arc::new(JwtDecoder::new(secret)?);
        Ok(Arc::new(move || Arc::clone(&decoder)))
    }

    /// Token middleware reading the sources named in `settings`, in order header → cookie.
    pub fn decode_tokens(&self, settings: &TokenSettings) -> Result<TokenMiddleware, ConfigError> {
        let decoder_factory = self
            .decoder_factory
            .as_ref()
            .ok_or(ConfigError::MissingDecoder)?;

        Ok(TokenMiddleware::from_shared(decoder_factory())
            .with_extractors(settings.extractors()?)
            .with_injector(AttributeInjector::new(settings.attributes.clone())))
    }

    /// Requires a decoded token; 401 with the error attribute as JSON otherwise.
    pub fn assert_tokens(&self, names: &AttributeNames) -> PredicateMiddleware {
        PredicateMiddleware::new(TokenPresent::new(names), JsonErrorResponder::new(names))
    }

    /// Requires a decoded token accepted by `probe`; 401 with a JSON error otherwise.
    pub fn inspect_tokens<F>(&self, probe: F, names: &AttributeNames) -> PredicateMiddleware
    where
        F: Fn(&DecodedToken, &Request) -> bool + Send + Sync + 'static,
    {
        let probe = TokenProbe::new(names, move |token: Option<&DecodedToken>, req: &Request| {
            token.is_some_and(|token| probe(token, req))
        });
        PredicateMiddleware::new(probe, JsonErrorResponder::new(names))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{Attribute, AttributesExt};
    use crate::services::auth::decoder::DecodeError;
    use axum::body::Body;
    use axum::http::{StatusCode, header};

    fn request(headers: &[(&str, &str)]) -> Request {
        let mut builder = Request::builder().uri("/");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(Body::empty()).unwrap()
    }

    fn rejecting_factory() -> AuthFactory {
        let decoder: Arc<dyn TokenDecoder> =
            Arc::new(|_: &str| -> Result<DecodedToken, DecodeError> { Err(DecodeError::Expired) });
        AuthFactory::new(Some(Arc::new(move || Arc::clone(&decoder))))
    }

    #[test]
    fn decode_tokens_requires_decoder() {
        let err = AuthFactory::new(None)
            .decode_tokens(&TokenSettings::default())
            .unwrap_err();
        assert_eq!(err, ConfigError::MissingDecoder);
    }

    #[test]
    fn empty_secret_fails_fast() {
        assert_eq!(
            AuthFactory::with_secret("").unwrap_err(),
            ConfigError::EmptySecret
        );
    }

    #[test]
    fn decode_tokens_honours_custom_names() {
        let settings = TokenSettings::default()
            .with_attributes(AttributeNames::new("jwt").unwrap())
            .with_header(None);
        let mw = rejecting_factory().decode_tokens(&settings).unwrap();

        // header disabled: the bearer header is ignored
        let req = mw.process(request(&[("authorization", "Bearer abc")]));
        assert_eq!(req.attributes().get("jwt"), Some(&Attribute::Absent));

        let req = mw.process(request(&[(header::COOKIE.as_str(), "token=abc")]));
        assert_eq!(
            req.attributes().text("jwt.error"),
            Some("Token error: expired token")
        );
    }

    #[test]
    fn assert_tokens_rejects_with_401() {
        let gate = AuthFactory::default().assert_tokens(&AttributeNames::default());
        let response = gate.check(&request(&[])).unwrap_err();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
    }

    #[test]
    fn inspect_tokens_requires_token_and_probe() {
        let names = AttributeNames::default();
        let gate = AuthFactory::default()
            .inspect_tokens(|token, _req| token.subject() == Some("42"), &names);

        let token = |sub: &str| {
            let mut claims = serde_json::Map::new();
            claims.insert("sub".into(), sub.into());
            DecodedToken::new(claims)
        };

        assert!(gate.check(&request(&[])).is_err());
        assert!(gate
            .check(&request(&[]).with_attribute("token", token("7")))
            .is_err());
        assert!(gate
            .check(&request(&[]).with_attribute("token", token("42")))
            .is_ok());
    }
}
