//! Raw token extractors.
//!
//! Each extractor looks at exactly one place in the request and returns the raw token
//! string it found there. The token middleware tries them in order and stops at the
//! first non-empty result.

use axum::extract::Request;
use axum::http::HeaderName;
use axum_extra::extract::cookie::CookieJar;
use tracing::debug;

use crate::context::AttributesExt;
use crate::error::ConfigError;
use crate::settings::{AttributeNames, TokenSettings};

pub trait TokenExtractor: Send + Sync {
    fn extract(&self, request: &Request) -> Option<String>;
}

impl<F> TokenExtractor for F
where
    F: Fn(&Request) -> Option<String> + Send + Sync,
{
    fn extract(&self, request: &Request) -> Option<String> {
        self(request)
    }
}

/// First non-empty token produced by `extractors`, in order.
pub fn extract_first(extractors: &[Box<dyn TokenExtractor>], request: &Request) -> Option<String> {
    extractors
        .iter()
        .filter_map(|extractor| extractor.extract(request))
        .find(|token| !token.is_empty())
}

/// Token part of a `Bearer <token>` header value.
///
/// The scheme is matched case-insensitively, the token must not contain whitespace.
pub fn bearer_token(value: &str) -> Option<&str> {
    let (scheme, rest) = value.split_once(char::is_whitespace)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }

    let token = rest.trim();
    if token.is_empty() || token.contains(char::is_whitespace) {
        return None;
    }
    Some(token)
}

/// `Authorization: Bearer <token>` (or any other header carrying the Bearer scheme).
#[derive(Debug, Clone)]
pub struct HeaderExtractor {
    header: HeaderName,
}

impl HeaderExtractor {
    pub fn new(header: &str) -> Result<Self, ConfigError> {
        let header = HeaderName::from_bytes(header.as_bytes())
            .map_err(|_| ConfigError::InvalidHeaderName(header.to_string()))?;
        Ok(Self { header })
    }

    pub fn header(&self) -> &HeaderName {
        &self.header
    }
}

impl Default for HeaderExtractor {
    fn default() -> Self {
        Self {
            header: axum::http::header::AUTHORIZATION,
        }
    }
}

impl TokenExtractor for HeaderExtractor {
    fn extract(&self, request: &Request) -> Option<String> {
        for value in request.headers().get_all(&self.header) {
            let Ok(value) = value.to_str() else {
                debug!(header = %self.header, "skipping non-ascii header value");
                continue;
            };

            if let Some(token) = bearer_token(value) {
                debug!(header = %self.header, "using Bearer token from request header");
                return Some(token.to_string());
            }
            debug!(header = %self.header, "Bearer token not present in request header");
        }
        None
    }
}

/// Bare token stored in a cookie. Surrounding whitespace is dropped.
#[derive(Debug, Clone)]
pub struct CookieExtractor {
    name: String,
}

impl CookieExtractor {
    pub fn new(name: impl Into<String>) -> Result<Self, ConfigError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ConfigError::EmptyCookieName);
        }
        Ok(Self { name })
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Default for CookieExtractor {
    fn default() -> Self {
        Self {
            name: TokenSettings::COOKIE_NAME.to_string(),
        }
    }
}

impl TokenExtractor for CookieExtractor {
    fn extract(&self, request: &Request) -> Option<String> {
        let jar = CookieJar::from_headers(request.headers());
        let token = jar.get(&self.name)?.value().trim();
        if token.is_empty() {
            return None;
        }

        debug!(cookie = %self.name, "using bare token from cookie");
        Some(token.to_string())
    }
}

/// Raw token written to an attribute by an earlier stage.
///
/// The value is trusted and returned as is. Only `Text` attributes count.
#[derive(Debug, Clone)]
pub struct AttributeExtractor {
    name: String,
}

impl AttributeExtractor {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Default for AttributeExtractor {
    fn default() -> Self {
        Self::new(AttributeNames::TOKEN)
    }
}

impl TokenExtractor for AttributeExtractor {
    fn extract(&self, request: &Request) -> Option<String> {
        request.attributes().text(&self.name).map(str::to_string)
    }
}
