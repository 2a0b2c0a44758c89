//! Token generation, verification and refresh.

pub mod jwt;
pub mod service;

pub use jwt::{JwtError, JwtSigner};
pub use service::TokenService;
