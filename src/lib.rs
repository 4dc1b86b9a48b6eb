//! Token extraction and gating middleware for axum.
//!
//! Two pipeline stages:
//! - [`TokenMiddleware`] finds a raw token (header, cookie, attribute), decodes it
//!   and writes the outcome into the request [`Attributes`]. It never rejects a request.
//! - [`PredicateMiddleware`] reads those attributes and either calls the next stage
//!   or answers with an error response (401 by default).
//!
//! ```ignore
//! let factory = AuthFactory::with_secret("my-secret")?;
//! let names = AttributeNames::default();
//!
//! let protected = factory.assert_tokens(&names).apply(protected_routes);
//! let app = factory
//!     .decode_tokens(&TokenSettings::default())?
//!     .apply(Router::new().merge(public_routes).merge(protected));
//! ```

pub mod context;
pub mod error;
pub mod middleware;
pub mod services;
pub mod settings;
pub mod token;

pub use context::{Attribute, Attributes, AttributesExt};
pub use error::ConfigError;
pub use middleware::predicate::{
    ErrorHook, Predicate, PredicateMiddleware, TokenPresent, TokenProbe,
};
pub use middleware::responders::{
    ErrorMessagePassJson, ErrorResponder, JsonErrorResponder, StatusResponder, write_json_error,
};
pub use middleware::token::TokenMiddleware;
pub use services::auth::decoder::{DecodeError, TokenDecoder};
pub use services::auth::extractors::{
    AttributeExtractor, CookieExtractor, HeaderExtractor, TokenExtractor, bearer_token,
};
pub use services::auth::factory::{AuthFactory, DecoderFactory};
pub use services::auth::injector::{AttributeInjector, AttributeTokenProvider, TokenInjector};
pub use services::auth::jwt::JwtDecoder;
pub use settings::{AttributeNames, TokenSettings};
pub use token::DecodedToken;
