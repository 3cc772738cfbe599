//! GitHub OAuth: authorization URLs everywhere; code exchange and profile
//! resolution with the `server` feature.

mod authorize;
#[cfg(feature = "server")]
mod config;
mod error;
#[cfg(feature = "server")]
mod github;
#[cfg(feature = "server")]
mod profile;
#[cfg(feature = "server")]
mod token;

pub use authorize::{is_placeholder, parse_scopes, AuthorizationRequest};
#[cfg(feature = "server")]
pub use config::OAuthConfig;
pub use error::{AuthError, API_ERROR, MISSING_CODE, MISSING_PAYLOAD, SERVER_ERROR};
#[cfg(feature = "server")]
pub use github::GitHubOAuth;
#[cfg(feature = "server")]
pub use profile::ProfileResolver;
#[cfg(feature = "server")]
pub use token::TokenExchangeClient;

pub use oauth2::{AuthUrl, ClientId, RedirectUrl, Scope};
