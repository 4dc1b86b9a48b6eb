/*
 * Responsibility
 * - 構築時 (setup) の設定エラー
 * - リクエスト処理中には発生しない。起動時に fail fast させる
 */
use thiserror::Error;

/// Mistakes in how a middleware or decoder was put together.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("the secret key may not be empty")]
    EmptySecret,

    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("at least one algorithm is required")]
    NoAlgorithms,

    #[error("decoder factory not provided")]
    MissingDecoder,

    #[error("attribute name may not be empty")]
    EmptyAttributeName,

    #[error("token and error attributes must differ, both are '{0}'")]
    AttributeNameClash(String),

    #[error("invalid header name: {0}")]
    InvalidHeaderName(String),

    #[error("cookie name may not be empty")]
    EmptyCookieName,
}
