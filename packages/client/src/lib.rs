//! Browser side of the GitHub login: start the flow, pick up its result, keep the
//! session.

pub mod auth;
pub mod config;
pub mod location;

pub use auth::{parse_callback, strip_callback_params, AuthOrchestrator, AuthState, Callback};
pub use config::ClientConfig;
#[cfg(all(target_arch = "wasm32", feature = "web"))]
pub use location::BrowserLocation;
pub use location::{Location, MemoryLocation};
