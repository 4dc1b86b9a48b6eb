//! Error responses for the predicate middleware.
//!
//! Body shape (when JSON is used):
//! - string errors: `{"error": {"message": "<string>"}}`
//! - anything else: `{"error": <data>}`

use axum::{
    body::Body,
    extract::Request,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};

use crate::context::{Attribute, AttributesExt};
use crate::middleware::predicate::ErrorHook;
use crate::settings::AttributeNames;

/// Builds the response returned when the predicate fails.
pub trait ErrorResponder: Send + Sync {
    fn respond(&self, request: &Request) -> Response;
}

impl<F> ErrorResponder for F
where
    F: Fn(&Request) -> Response + Send + Sync,
{
    fn respond(&self, request: &Request) -> Response {
        self(request)
    }
}

/// Bare status, empty body. Defaults to 401.
#[derive(Debug, Clone, Copy)]
pub struct StatusResponder(pub StatusCode);

impl Default for StatusResponder {
    fn default() -> Self {
        Self(StatusCode::UNAUTHORIZED)
    }
}

impl ErrorResponder for StatusResponder {
    fn respond(&self, _request: &Request) -> Response {
        self.0.into_response()
    }
}

/// Status plus a JSON body built from the error attribute.
///
/// When the error attribute is missing (no token at all, or a token the predicate
/// did not like) `fallback` is used as the message.
#[derive(Debug, Clone)]
pub struct JsonErrorResponder {
    error_attribute: String,
    status: StatusCode,
    fallback: String,
}

impl JsonErrorResponder {
    pub const FALLBACK_MESSAGE: &'static str = "No valid token found.";

    pub fn new(names: &AttributeNames) -> Self {
        Self {
            error_attribute: names.error().to_string(),
            status: StatusCode::UNAUTHORIZED,
            fallback: Self::FALLBACK_MESSAGE.to_string(),
        }
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    pub fn with_fallback(mut self, message: impl Into<String>) -> Self {
        self.fallback = message.into();
        self
    }
}

impl ErrorResponder for JsonErrorResponder {
    fn respond(&self, request: &Request) -> Response {
        let error = error_value(request, &self.error_attribute, &self.fallback);
        write_json_error(self.status.into_response(), error)
    }
}

/// Hook copying the error attribute into the candidate response as JSON.
///
/// Keeps status and headers of the candidate; falls back to "No token found."
/// when the error attribute is empty.
#[derive(Debug, Clone)]
pub struct ErrorMessagePassJson {
    error_attribute: String,
    fallback: String,
}

impl ErrorMessagePassJson {
    pub const FALLBACK_MESSAGE: &'static str = "No token found.";

    pub fn new(names: &AttributeNames) -> Self {
        Self {
            error_attribute: names.error().to_string(),
            fallback: Self::FALLBACK_MESSAGE.to_string(),
        }
    }
}

impl ErrorHook for ErrorMessagePassJson {
    fn on_error(&self, request: &Request, response: &Response) -> Option<Response> {
        let mut candidate = Response::new(Body::empty());
        *candidate.status_mut() = response.status();
        *candidate.version_mut() = response.version();
        *candidate.headers_mut() = response.headers().clone();

        let error = error_value(request, &self.error_attribute, &self.fallback);
        Some(write_json_error(candidate, error))
    }
}

/// Replaces the body of `response` with the JSON error document.
pub fn write_json_error(response: Response, error: Value) -> Response {
    let document = match error {
        Value::String(message) => json!({ "error": { "message": message } }),
        data => json!({ "error": data }),
    };

    let (mut parts, _) = response.into_parts();
    parts.headers.remove(header::CONTENT_LENGTH);
    parts.headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    Response::from_parts(parts, Body::from(document.to_string()))
}

fn error_value(request: &Request, attribute: &str, fallback: &str) -> Value {
    match request.attribute(attribute) {
        Some(Attribute::Absent) | None => Value::String(fallback.to_string()),
        Some(error) => error.to_json(),
    }
}
