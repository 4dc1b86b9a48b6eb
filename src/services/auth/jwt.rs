use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::ConfigError;
use crate::services::auth::decoder::{DecodeError, TokenDecoder};
use crate::token::DecodedToken;

/// HMAC-signed JWT decoder.
///
/// Only checks that the token was signed with the shared secret and that its temporal
/// claims hold:
/// - `exp`: not expired
/// - `nbf`: not used before intended
/// - `iat`: not issued in the future
///
/// None of them is required to be present. Everything else (issuer, audience, subject)
/// is left to the application.
///
/// - Key material is intentionally not printable via Debug.
#[derive(Clone)]
pub struct JwtDecoder {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl fmt::Debug for JwtDecoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Do not print key material
        f.debug_struct("JwtDecoder")
            .field("algorithms", &self.validation.algorithms)
            .field("leeway", &self.validation.leeway)
            .finish()
    }
}

impl JwtDecoder {
    pub const DEFAULT_ALGORITHMS: [&'static str; 3] = ["HS256", "HS512", "HS384"];

    /// Decoder accepting the default HMAC algorithms.
    pub fn new(secret: &str) -> Result<Self, ConfigError> {
        Self::with_algorithms(secret, &Self::DEFAULT_ALGORITHMS)
    }

    pub fn with_algorithms<S: AsRef<str>>(
        secret: &str,
        algorithms: &[S],
    ) -> Result<Self, ConfigError> {
        if secret.is_empty() {
            return Err(ConfigError::EmptySecret);
        }

        let algorithms = algorithms
            .iter()
            .map(|name| parse_hmac_algorithm(name.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        let first = *algorithms.first().ok_or(ConfigError::NoAlgorithms)?;

        let mut validation = Validation::new(first);
        validation.algorithms = algorithms;
        validation.required_spec_claims = HashSet::new();
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.validate_aud = false;
        validation.leeway = 0;

        Ok(Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        })
    }

    /// Allowed clock skew for `exp`, `nbf` and `iat`, in seconds.
    pub fn with_leeway(mut self, leeway_seconds: u64) -> Self {
        self.validation.leeway = leeway_seconds;
        self
    }

    pub fn algorithms(&self) -> &[Algorithm] {
        &self.validation.algorithms
    }

    pub fn leeway(&self) -> u64 {
        self.validation.leeway
    }

    // jsonwebtoken has no iat check; a token issued in the future is treated like nbf.
    fn check_issued_at(&self, claims: &Map<String, Value>) -> Result<(), DecodeError> {
        let Some(iat) = claims.get("iat").and_then(Value::as_i64) else {
            return Ok(());
        };

        let now = chrono::Utc::now().timestamp();
        let leeway = i64::try_from(self.validation.leeway).unwrap_or(i64::MAX);
        if iat > now.saturating_add(leeway) {
            return Err(DecodeError::NotYetValid);
        }
        Ok(())
    }
}

impl TokenDecoder for JwtDecoder {
    fn decode(&self, raw: &str) -> Result<DecodedToken, DecodeError> {
        if raw.trim().is_empty() {
            return Err(DecodeError::Empty);
        }

        let data = jsonwebtoken::decode::<Map<String, Value>>(
            raw,
            &self.decoding_key,
            &self.validation,
        )
        .map_err(|err| {
            debug!(error = %err, "jwt decoding failed");
            DecodeError::from(err)
        })?;

        self.check_issued_at(&data.claims).inspect_err(|err| {
            debug!(error = %err, "jwt issued in the future");
        })?;

        Ok(DecodedToken::new(data.claims))
    }
}

fn parse_hmac_algorithm(name: &str) -> Result<Algorithm, ConfigError> {
    match Algorithm::from_str(name) {
        Ok(alg @ (Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512)) => Ok(alg),
        _ => Err(ConfigError::UnsupportedAlgorithm(name.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{EncodingKey, Header};
    use serde_json::json;

    const SECRET: &str = "Dont-Tell-Anyone";

    fn now() -> i64 {
        chrono::Utc::now().timestamp()
    }

    fn sign(alg: Algorithm, secret: &str, claims: Value) -> String {
        jsonwebtoken::encode(
            &Header::new(alg),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn decodes_valid_token() {
        let decoder = JwtDecoder::new(SECRET).unwrap();
        let raw = sign(
            Algorithm::HS256,
            SECRET,
            json!({"sub": "1234567890", "name": "John Doe", "iat": now() - 10}),
        );

        let token = decoder.decode(&raw).unwrap();
        assert_eq!(token.subject(), Some("1234567890"));
        assert_eq!(token.claim("name"), Some(&json!("John Doe")));
    }

    #[test]
    fn accepts_every_default_algorithm() {
        let decoder = JwtDecoder::new(SECRET).unwrap();
        for alg in [Algorithm::HS256, Algorithm::HS384, Algorithm::HS512] {
            let raw = sign(alg, SECRET, json!({"sub": "a"}));
            assert!(decoder.decode(&raw).is_ok(), "{alg:?} should be accepted");
        }
    }

    #[test]
    fn rejects_algorithm_outside_the_list() {
        let decoder = JwtDecoder::with_algorithms(SECRET, &["HS256"]).unwrap();
        let raw = sign(Algorithm::HS512, SECRET, json!({"sub": "a"}));
        assert_eq!(decoder.decode(&raw), Err(DecodeError::AlgorithmNotAllowed));
    }

    #[test]
    fn rejects_wrong_secret() {
        let decoder = JwtDecoder::new(SECRET).unwrap();
        let raw = sign(Algorithm::HS256, "another-secret", json!({"sub": "a"}));
        assert_eq!(decoder.decode(&raw), Err(DecodeError::InvalidSignature));
    }

    #[test]
    fn rejects_expired_token() {
        let decoder = JwtDecoder::new(SECRET).unwrap();
        let raw = sign(Algorithm::HS256, SECRET, json!({"exp": now() - 100}));
        assert_eq!(decoder.decode(&raw), Err(DecodeError::Expired));
    }

    #[test]
    fn leeway_tolerates_small_skew() {
        let decoder = JwtDecoder::new(SECRET).unwrap().with_leeway(300);
        let raw = sign(Algorithm::HS256, SECRET, json!({"exp": now() - 100}));
        assert!(decoder.decode(&raw).is_ok());
    }

    #[test]
    fn rejects_token_used_before_nbf() {
        let decoder = JwtDecoder::new(SECRET).unwrap();
        let raw = sign(Algorithm::HS256, SECRET, json!({"nbf": now() + 3600}));
        assert_eq!(decoder.decode(&raw), Err(DecodeError::NotYetValid));
    }

    #[test]
    fn rejects_token_issued_in_the_future() {
        let decoder = JwtDecoder::new(SECRET).unwrap();
        let raw = sign(Algorithm::HS256, SECRET, json!({"iat": now() + 3600}));
        assert_eq!(decoder.decode(&raw), Err(DecodeError::NotYetValid));
    }

    #[test]
    fn rejects_garbage() {
        let decoder = JwtDecoder::new(SECRET).unwrap();
        assert!(matches!(
            decoder.decode("bad.token.value"),
            Err(DecodeError::Malformed(_))
        ));
        assert!(matches!(
            decoder.decode("not-a-jwt"),
            Err(DecodeError::Malformed(_))
        ));
        assert_eq!(decoder.decode("  "), Err(DecodeError::Empty));
    }

    #[test]
    fn empty_secret_is_a_setup_error() {
        assert_eq!(JwtDecoder::new("").unwrap_err(), ConfigError::EmptySecret);
    }

    #[test]
    fn only_hmac_algorithms_are_configurable() {
        assert_eq!(
            JwtDecoder::with_algorithms(SECRET, &["RS256"]).unwrap_err(),
            ConfigError::UnsupportedAlgorithm("RS256".into())
        );
        assert_eq!(
            JwtDecoder::with_algorithms(SECRET, &["nope"]).unwrap_err(),
            ConfigError::UnsupportedAlgorithm("nope".into())
        );
        assert_eq!(
            JwtDecoder::with_algorithms::<&str>(SECRET, &[]).unwrap_err(),
            ConfigError::NoAlgorithms
        );
    }
}
