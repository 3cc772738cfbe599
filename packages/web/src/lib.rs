//! HTTP surface of the GitHub login relay.
//!
//! | Route | Methods | Purpose |
//! |-------|---------|---------|
//! | `/auth/callback` | GET, OPTIONS | OAuth redirect URI registered with GitHub |
//! | `/api/auth/github/callback` | GET, OPTIONS | Same handler, kept for older app builds |
//! | `/healthz` | GET | Liveness probe |

use std::any::Any;
use std::sync::Arc;

use api::auth::{AuthError, GitHubOAuth, OAuthConfig};
use api::relay::RelayMode;
use api::settings::Settings;
use axum::http::{header, HeaderValue};
use axum::routing::{any, get};
use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use url::Url;

pub mod relay;

#[derive(Clone)]
pub struct AppState {
    pub oauth: Arc<GitHubOAuth>,
    /// Where results are sent back to in redirect mode.
    pub app_origin: Url,
    pub mode: RelayMode,
}

impl AppState {
    pub fn from_settings(settings: &Settings) -> Result<Self, AuthError> {
        let config = OAuthConfig::from_settings(&settings.github, &settings.http)?;
        let app_origin = Url::parse(&settings.relay.app_origin).map_err(|e| {
            AuthError::Configuration(format!("invalid relay.app_origin: {e}"))
        })?;

        Ok(Self {
            oauth: Arc::new(GitHubOAuth::new(config)?),
            app_origin,
            mode: settings.relay.mode,
        })
    }
}

/// Build the relay router.
pub fn app(state: AppState) -> Router {
    let mode = state.mode;
    let app_origin = state.app_origin.clone();

    let router = Router::new()
        .route("/auth/callback", any(relay::github_callback))
        .route("/api/auth/github/callback", any(relay::github_callback))
        .route("/healthz", get(healthz))
        .with_state(state);

    with_layers(router, mode, app_origin)
}

/// Panic capture, CORS in JSON mode, and request tracing.
pub fn with_layers(router: Router, mode: RelayMode, app_origin: Url) -> Router {
    let router = router.layer(CatchPanicLayer::custom(move |err: Box<dyn Any + Send + 'static>| {
        relay::panic_response(err, mode, &app_origin)
    }));

    // Outside the panic layer so captured panics get CORS headers too
    let router = match mode {
        RelayMode::Json => router
            .layer(SetResponseHeaderLayer::if_not_present(
                header::ACCESS_CONTROL_ALLOW_ORIGIN,
                HeaderValue::from_static("*"),
            ))
            .layer(SetResponseHeaderLayer::if_not_present(
                header::ACCESS_CONTROL_ALLOW_METHODS,
                HeaderValue::from_static("GET, POST, OPTIONS"),
            ))
            .layer(SetResponseHeaderLayer::if_not_present(
                header::ACCESS_CONTROL_ALLOW_HEADERS,
                HeaderValue::from_static("Content-Type"),
            )),
        RelayMode::Redirect => router,
    };

    router.layer(TraceLayer::new_for_http())
}

async fn healthz() -> &'static str {
    "ok"
}
