//! Decoder contract.
//!
//! A decoder turns a raw token string into a [`DecodedToken`] or reports why it could not.
//! Failures are returned, never swallowed: the injector needs the reason to fill the
//! error attribute.

use jsonwebtoken::errors::{Error as JwtError, ErrorKind};
use thiserror::Error;

use crate::token::DecodedToken;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("empty token")]
    Empty,

    #[error("malformed token: {0}")]
    Malformed(String),

    #[error("signature verification failed")]
    InvalidSignature,

    #[error("algorithm not allowed")]
    AlgorithmNotAllowed,

    #[error("expired token")]
    Expired,

    #[error("token not valid yet")]
    NotYetValid,

    /// Custom decoders reject tokens for their own reasons.
    #[error("{0}")]
    Rejected(String),
}

impl From<JwtError> for DecodeError {
    fn from(e: JwtError) -> Self {
        match e.kind() {
            ErrorKind::InvalidSignature => Self::InvalidSignature,
            ErrorKind::ExpiredSignature => Self::Expired,
            ErrorKind::ImmatureSignature => Self::NotYetValid,
            ErrorKind::InvalidAlgorithm | ErrorKind::InvalidAlgorithmName => {
                Self::AlgorithmNotAllowed
            }
            _ => Self::Malformed(e.to_string()),
        }
    }
}

pub trait TokenDecoder: Send + Sync {
    fn decode(&self, raw: &str) -> Result<DecodedToken, DecodeError>;
}

impl<F> TokenDecoder for F
where
    F: Fn(&str) -> Result<DecodedToken, DecodeError> + Send + Sync,
{
    fn decode(&self, raw: &str) -> Result<DecodedToken, DecodeError> {
        self(raw)
    }
}
