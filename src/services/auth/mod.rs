pub mod decoder;
pub mod extractors;
pub mod factory;
pub mod injector;
pub mod jwt;

pub use decoder::{DecodeError, TokenDecoder};
pub use factory::AuthFactory;
pub use jwt::JwtDecoder;
