//! Token detection → decoding → attributes.
//!
//! Single pass: EXTRACT → DECODE → INJECT → next.
//!
//! - Extractors are tried in order, the first non-empty raw token wins.
//! - The decoder only runs when a raw token was found.
//! - Decoding failures become data (the error attribute); this middleware never
//!   answers with an error response itself. Gating is the job of
//!   [`PredicateMiddleware`](crate::PredicateMiddleware).

use std::sync::Arc;

use axum::{
    Router,
    extract::{Request, State},
    middleware::{self, Next},
    response::Response,
};
use tracing::{debug, info};

use crate::services::auth::decoder::{DecodeError, TokenDecoder};
use crate::services::auth::extractors::{
    CookieExtractor, HeaderExtractor, TokenExtractor, extract_first,
};
use crate::services::auth::injector::{AttributeInjector, TokenInjector, TokenOutcome};
use crate::token::DecodedToken;

pub struct TokenMiddleware {
    decoder: Arc<dyn TokenDecoder>,
    extractors: Vec<Box<dyn TokenExtractor>>,
    injector: Box<dyn TokenInjector>,
}

impl std::fmt::Debug for TokenMiddleware {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenMiddleware")
            .field("extractors", &self.extractors.len())
            .finish_non_exhaustive()
    }
}

impl TokenMiddleware {
    /// Middleware reading `Authorization: Bearer <token>` then the `token` cookie,
    /// writing to the `token` / `token.error` attributes.
    pub fn new(decoder: impl TokenDecoder + 'static) -> Self {
        Self::from_shared(Arc::new(decoder))
    }

    pub fn from_shared(decoder: Arc<dyn TokenDecoder>) -> Self {
        Self {
            decoder,
            extractors: vec![
                Box::new(HeaderExtractor::default()),
                Box::new(CookieExtractor::default()),
            ],
            injector: Box::new(AttributeInjector::default()),
        }
    }

    pub fn with_extractors(mut self, extractors: Vec<Box<dyn TokenExtractor>>) -> Self {
        self.extractors = extractors;
        self
    }

    pub fn with_injector(mut self, injector: impl TokenInjector + 'static) -> Self {
        self.injector = Box::new(injector);
        self
    }

    pub fn extract_token(&self, request: &Request) -> Option<String> {
        let token = extract_first(&self.extractors, request);
        if token.is_none() {
            info!("token not found");
        }
        token
    }

    /// `Ok(None)` when there is nothing to decode.
    pub fn decode_token(&self, raw: Option<&str>) -> Result<Option<DecodedToken>, DecodeError> {
        raw.map(|raw| self.decoder.decode(raw)).transpose()
    }

    /// Annotates the request with the extraction/decoding outcome.
    pub fn process(&self, request: Request) -> Request {
        let raw = self.extract_token(&request);
        let outcome: TokenOutcome = self.decode_token(raw.as_deref());

        match &outcome {
            Ok(Some(_)) => debug!("token decoded"),
            Ok(None) => {}
            Err(err) => debug!(error = %err, "token rejected by decoder"),
        }

        self.injector.inject(outcome, request)
    }

    /// Runs this middleware in front of every route of `router`.
    pub fn apply<S>(self, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        router.layer(middleware::from_fn_with_state(
            Arc::new(self),
            token_middleware,
        ))
    }
}

async fn token_middleware(
    State(token): State<Arc<TokenMiddleware>>,
    req: Request,
    next: Next,
) -> Response {
    next.run(token.process(req)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{Attribute, AttributesExt};
    use crate::services::auth::extractors::AttributeExtractor;
    use axum::body::Body;
    use axum::http::header;
    use serde_json::{Value, json};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn decoded(value: Value) -> DecodedToken {
        match value {
            Value::Object(map) => DecodedToken::new(map),
            _ => panic!("claims must be an object"),
        }
    }

    // Decodes "<sub>" into {"sub": "<sub>"}, fails on anything starting with "bad".
    fn fake_decoder(raw: &str) -> Result<DecodedToken, DecodeError> {
        if raw.starts_with("bad") {
            return Err(DecodeError::Malformed("wrong number of segments".into()));
        }
        Ok(decoded(json!({"sub": raw})))
    }

    fn request(headers: &[(&str, &str)]) -> Request {
        let mut builder = Request::builder().uri("/");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn header_token_is_decoded_into_token_attribute() {
        let mw = TokenMiddleware::new(fake_decoder);
        let req = mw.process(request(&[("authorization", "Bearer alice")]));

        let attrs = req.attributes();
        assert_eq!(attrs.token("token").and_then(|t| t.subject()), Some("alice"));
        assert!(attrs.get("token.error").is_none());
    }

    #[test]
    fn cookie_is_used_when_header_missing() {
        let mw = TokenMiddleware::new(fake_decoder);
        let req = mw.process(request(&[(header::COOKIE.as_str(), "token=  bob  ")]));

        assert_eq!(
            req.attributes().token("token").and_then(|t| t.subject()),
            Some("bob")
        );
    }

    #[test]
    fn header_wins_over_cookie() {
        let mw = TokenMiddleware::new(fake_decoder);
        let req = mw.process(request(&[
            ("authorization", "Bearer header-user"),
            (header::COOKIE.as_str(), "token=cookie-user"),
        ]));

        assert_eq!(
            req.attributes().token("token").and_then(|t| t.subject()),
            Some("header-user")
        );
    }

    #[test]
    fn non_bearer_header_falls_back_to_cookie() {
        let mw = TokenMiddleware::new(fake_decoder);
        let req = mw.process(request(&[
            ("authorization", "Basic xyz"),
            (header::COOKIE.as_str(), "token=cookie-user"),
        ]));

        assert_eq!(
            req.attributes().token("token").and_then(|t| t.subject()),
            Some("cookie-user")
        );
    }

    #[test]
    fn decoder_failure_is_captured_as_error_attribute() {
        let mw = TokenMiddleware::new(fake_decoder);
        let req = mw.process(request(&[("authorization", "Bearer bad.token.value")]));

        let attrs = req.attributes();
        assert!(attrs.get("token").is_none());
        let error = attrs.text("token.error").unwrap();
        assert!(error.starts_with("Token error: "), "{error}");
    }

    #[test]
    fn missing_token_writes_absent_and_skips_decoder() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let mw = TokenMiddleware::new(move |raw: &str| {
            counter.fetch_add(1, Ordering::SeqCst);
            fake_decoder(raw)
        });

        let req = mw.process(request(&[]));

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(req.attributes().get("token"), Some(&Attribute::Absent));
    }

    #[test]
    fn decoder_runs_once_per_request() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let mw = TokenMiddleware::new(move |raw: &str| {
            counter.fetch_add(1, Ordering::SeqCst);
            fake_decoder(raw)
        });

        mw.process(request(&[
            ("authorization", "Bearer a"),
            (header::COOKIE.as_str(), "token=b"),
        ]));

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn rerun_with_attribute_extractor_first_is_stable() {
        let mw = TokenMiddleware::new(fake_decoder).with_extractors(vec![
            Box::new(AttributeExtractor::new("token.raw")),
            Box::new(HeaderExtractor::default()),
        ]);
        let req = request(&[("authorization", "Bearer from-header")])
            .with_attribute("token.raw", "from-attribute");

        let once = mw.process(req);
        let first = once.attributes().token("token").cloned();
        let twice = mw.process(once);

        assert_eq!(first.as_ref().and_then(|t| t.subject()), Some("from-attribute"));
        assert_eq!(twice.attributes().token("token").cloned(), first);
    }

    #[test]
    fn no_extractors_means_no_token() {
        let mw = TokenMiddleware::new(fake_decoder).with_extractors(Vec::new());
        let req = mw.process(request(&[("authorization", "Bearer alice")]));

        assert_eq!(req.attributes().get("token"), Some(&Attribute::Absent));
    }
}
