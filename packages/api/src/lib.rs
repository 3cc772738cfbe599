//! # API crate: GitHub OAuth and the callback relay
//!
//! Everything that talks to GitHub lives here. The web binary wraps [`relay`] in
//! HTTP routes; the browser client reuses [`auth`] to build authorization URLs and,
//! when explicitly enabled, to exchange codes itself.
//!
//! ## Modules
//!
//! | Module | Feature gate | Purpose |
//! |--------|-------------|---------|
//! | [`auth`] | partly `server` | Authorization URLs and errors always; code exchange and profile resolution with `server` |
//! | `relay` | `server` | Callback decision core: params in, redirect or JSON outcome out |
//! | `settings` | `server` | Layered configuration (defaults, `relay.toml`, environment) |
//! | `testing` | `testing` | In-process mock of GitHub's endpoints for tests |
//!
//! Without `server` the crate pulls in no HTTP client and reads no environment,
//! which is what the browser build wants.

pub mod auth;
#[cfg(feature = "server")]
pub mod relay;
#[cfg(feature = "server")]
pub mod settings;
#[cfg(all(feature = "server", any(test, feature = "testing")))]
pub mod testing;

pub use store::{Session, UserProfile};
