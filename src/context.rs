//! Per-request attribute store.
//!
//! Responsibility:
//! - Named slots shared between pipeline stages (`token`, `token.error`, ...)
//! - Copy-on-write: `with_attribute` returns a new store, readers of the old one are unaffected
//! - Lives in `http::Extensions`, so it travels with the request through axum/tower

use std::collections::HashMap;
use std::sync::Arc;

use axum::http::{Extensions, Request, request::Parts};
use serde_json::Value;

use crate::token::DecodedToken;

/// Value held by a named attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum Attribute {
    /// The slot was checked and nothing was found.
    Absent,
    Token(DecodedToken),
    Text(String),
    Data(Value),
}

impl Attribute {
    pub fn as_token(&self) -> Option<&DecodedToken> {
        match self {
            Attribute::Token(token) => Some(token),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Attribute::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Attribute::Absent)
    }

    /// Decoded token or a JSON object.
    pub fn is_structured(&self) -> bool {
        matches!(self, Attribute::Token(_) | Attribute::Data(Value::Object(_)))
    }

    /// JSON view used when an attribute is written into a response body.
    pub fn to_json(&self) -> Value {
        match self {
            Attribute::Absent => Value::Null,
            Attribute::Token(token) => Value::Object(token.claims().clone()),
            Attribute::Text(text) => Value::String(text.clone()),
            Attribute::Data(value) => value.clone(),
        }
    }
}

impl From<DecodedToken> for Attribute {
    fn from(token: DecodedToken) -> Self {
        Attribute::Token(token)
    }
}

impl From<String> for Attribute {
    fn from(text: String) -> Self {
        Attribute::Text(text)
    }
}

impl From<&str> for Attribute {
    fn from(text: &str) -> Self {
        Attribute::Text(text.to_string())
    }
}

impl From<Value> for Attribute {
    fn from(value: Value) -> Self {
        Attribute::Data(value)
    }
}

/// Immutable key/value store attached to one request.
#[derive(Debug, Clone, Default)]
pub struct Attributes {
    entries: Arc<HashMap<String, Attribute>>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store attached to `extensions`, or an empty one.
    pub fn from_extensions(extensions: &Extensions) -> Self {
        extensions.get::<Attributes>().cloned().unwrap_or_default()
    }

    pub fn get(&self, name: &str) -> Option<&Attribute> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn token(&self, name: &str) -> Option<&DecodedToken> {
        self.get(name).and_then(Attribute::as_token)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Attribute::as_text)
    }

    pub fn with_attribute(&self, name: impl Into<String>, value: impl Into<Attribute>) -> Self {
        let mut entries = HashMap::clone(&self.entries);
        entries.insert(name.into(), value.into());
        Self {
            entries: Arc::new(entries),
        }
    }

    pub fn without_attribute(&self, name: &str) -> Self {
        if !self.contains(name) {
            return self.clone();
        }
        let mut entries = HashMap::clone(&self.entries);
        entries.remove(name);
        Self {
            entries: Arc::new(entries),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Attribute access on requests.
///
/// Writing consumes the request and hands back the updated one, so a stage can only
/// publish attributes by passing the request on.
pub trait AttributesExt: Sized {
    fn attributes(&self) -> Attributes;

    fn attribute(&self, name: &str) -> Option<Attribute> {
        self.attributes().get(name).cloned()
    }

    fn with_attribute(self, name: impl Into<String>, value: impl Into<Attribute>) -> Self;
}

impl<B> AttributesExt for Request<B> {
    fn attributes(&self) -> Attributes {
        Attributes::from_extensions(self.extensions())
    }

    fn with_attribute(mut self, name: impl Into<String>, value: impl Into<Attribute>) -> Self {
        let next = self.attributes().with_attribute(name, value);
        self.extensions_mut().insert(next);
        self
    }
}

impl AttributesExt for Parts {
    fn attributes(&self) -> Attributes {
        Attributes::from_extensions(&self.extensions)
    }

    fn with_attribute(mut self, name: impl Into<String>, value: impl Into<Attribute>) -> Self {
        let next = self.attributes().with_attribute(name, value);
        self.extensions.insert(next);
        self
    }
}
