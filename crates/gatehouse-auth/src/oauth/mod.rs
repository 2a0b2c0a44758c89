//! OAuth2 third-party login support.

pub mod provider;
pub mod state;

pub use provider::{IdentityProvider, OidcProvider, ProviderRegistry};
pub use state::{AUTH_REQUEST_COOKIE, AuthorizationRequest};
