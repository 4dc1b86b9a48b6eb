//! Pipeline configuration.
//!
//! Defaults:
//! - token attribute: `token`
//! - error attribute: `<token attribute>.error`
//! - header: `Authorization` (Bearer scheme)
//! - cookie: `token`

use crate::error::ConfigError;
use crate::services::auth::extractors::{CookieExtractor, HeaderExtractor, TokenExtractor};

/// Names of the attributes the token pipeline writes and the gate reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeNames {
    token: String,
    error: String,
}

impl AttributeNames {
    pub const TOKEN: &'static str = "token";
    pub const ERROR_SUFFIX: &'static str = ".error";

    /// Error attribute derived as `<token>.error`.
    pub fn new(token: impl Into<String>) -> Result<Self, ConfigError> {
        let token = token.into();
        let error = format!("{token}{}", Self::ERROR_SUFFIX);
        Self::with_error(token, error)
    }

    pub fn with_error(
        token: impl Into<String>,
        error: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let token = token.into();
        let error = error.into();

        if token.is_empty() || error.is_empty() {
            return Err(ConfigError::EmptyAttributeName);
        }
        if token == error {
            return Err(ConfigError::AttributeNameClash(token));
        }

        Ok(Self { token, error })
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn error(&self) -> &str {
        &self.error
    }
}

impl Default for AttributeNames {
    fn default() -> Self {
        Self {
            token: Self::TOKEN.to_string(),
            error: format!("{}{}", Self::TOKEN, Self::ERROR_SUFFIX),
        }
    }
}

/// Where to look for raw tokens and where to put the outcome.
///
/// `header_name` / `cookie_name` set to `None` disable that source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSettings {
    pub attributes: AttributeNames,
    pub header_name: Option<String>,
    pub cookie_name: Option<String>,
}

impl TokenSettings {
    pub const HEADER_NAME: &'static str = "Authorization";
    pub const COOKIE_NAME: &'static str = "token";

    pub fn with_attributes(mut self, attributes: AttributeNames) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn with_header(mut self, header_name: Option<String>) -> Self {
        self.header_name = header_name;
        self
    }

    pub fn with_cookie(mut self, cookie_name: Option<String>) -> Self {
        self.cookie_name = cookie_name;
        self
    }

    /// Extractors in priority order: header first, then cookie.
    pub fn extractors(&self) -> Result<Vec<Box<dyn TokenExtractor>>, ConfigError> {
        let mut extractors: Vec<Box<dyn TokenExtractor>> = Vec::new();

        if let Some(header) = &self.header_name {
            extractors.push(Box::new(HeaderExtractor::new(header)?));
        }
        if let Some(cookie) = &self.cookie_name {
            extractors.push(Box::new(CookieExtractor::new(cookie.clone())?));
        }

        Ok(extractors)
    }
}

impl Default for TokenSettings {
    fn default() -> Self {
        Self {
            attributes: AttributeNames::default(),
            header_name: Some(Self::HEADER_NAME.to_string()),
            cookie_name: Some(Self::COOKIE_NAME.to_string()),
        }
    }
}
