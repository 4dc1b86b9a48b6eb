/*
 * Responsibility
 * - 環境変数の読み込み (PORT, TOKEN_SECRET, token の取り出し元/attribute 名, HTTP 制限)
 * - 設定値のバリデーション (不足なら起動失敗)
 * - token_gate の設定型 (TokenSettings / JwtDecoder) への変換
 */
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use token_gate::{AttributeNames, JwtDecoder, TokenSettings};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    pub fn parse(value: Option<&str>) -> Self {
        match value
            .unwrap_or("development")
            .to_ascii_lowercase()
            .as_str()
        {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

/// `-` turns a token source off.
const DISABLED: &str = "-";

#[derive(Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,

    pub token_secret: String,
    pub token_algorithms: Vec<String>,
    pub token_leeway_seconds: u64,
    pub token_settings: TokenSettings,

    pub request_timeout: Duration,
    pub request_body_limit_bytes: usize,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Do not print the secret
        f.debug_struct("Config")
            .field("addr", &self.addr)
            .field("app_env", &self.app_env)
            .field("token_algorithms", &self.token_algorithms)
            .field("token_leeway_seconds", &self.token_leeway_seconds)
            .field("token_settings", &self.token_settings)
            .field("request_timeout", &self.request_timeout)
            .field("request_body_limit_bytes", &self.request_body_limit_bytes)
            .finish_non_exhaustive()
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_vars(|key| std::env::var(key).ok())
    }

    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port: u16 = match var("PORT") {
            Some(s) => s.parse().map_err(|_| ConfigError::Invalid("PORT"))?,
            None => 3000,
        };
        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::parse(var("APP_ENV").as_deref());

        let token_secret = var("TOKEN_SECRET")
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::Missing("TOKEN_SECRET"))?;

        let token_algorithms = match var("TOKEN_ALGORITHMS") {
            Some(list) => list
                .split(',')
                .map(|s| s.trim().to_ascii_uppercase())
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>(),
            None => JwtDecoder::DEFAULT_ALGORITHMS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        };

        let token_leeway_seconds = var("TOKEN_LEEWAY_SECONDS")
            .map(|v| v.parse::<u64>())
            .transpose()
            .map_err(|_| ConfigError::Invalid("TOKEN_LEEWAY_SECONDS"))?
            .unwrap_or(0);

        let token_attribute =
            var("TOKEN_ATTRIBUTE").unwrap_or_else(|| AttributeNames::TOKEN.to_string());
        let attributes = match var("TOKEN_ERROR_ATTRIBUTE") {
            Some(error) => AttributeNames::with_error(token_attribute, error),
            None => AttributeNames::new(token_attribute),
        }
        .map_err(|_| ConfigError::Invalid("TOKEN_ATTRIBUTE"))?;

        let token_settings = TokenSettings::default()
            .with_attributes(attributes)
            .with_header(source(var("TOKEN_HEADER"), TokenSettings::HEADER_NAME))
            .with_cookie(source(var("TOKEN_COOKIE"), TokenSettings::COOKIE_NAME));

        let request_timeout = var("REQUEST_TIMEOUT_SECONDS")
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(30));

        let request_body_limit_bytes = var("REQUEST_BODY_LIMIT_BYTES")
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(1024 * 1024);

        Ok(Self {
            addr,
            app_env,
            token_secret,
            token_algorithms,
            token_leeway_seconds,
            token_settings,
            request_timeout,
            request_body_limit_bytes,
        })
    }

    pub fn decoder(&self) -> Result<JwtDecoder, token_gate::ConfigError> {
        Ok(JwtDecoder::with_algorithms(&self.token_secret, self.token_algorithms.as_slice())?
            .with_leeway(self.token_leeway_seconds))
    }
}

fn source(value: Option<String>, default: &str) -> Option<String> {
    match value {
        Some(v) if v.trim() == DISABLED => None,
        Some(v) if !v.trim().is_empty() => Some(v.trim().to_string()),
        _ => Some(default.to_string()),
    }
}
