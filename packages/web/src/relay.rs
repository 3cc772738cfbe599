//! Callback route handlers.

use std::any::Any;

use api::relay::{handle_callback, CallbackParams, RelayMode, RelayOutcome};
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::{header, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use url::Url;

use crate::AppState;

/// GitHub redirects here after the user approves or declines.
pub async fn github_callback(
    State(state): State<AppState>,
    method: Method,
    query: Result<Query<CallbackParams>, QueryRejection>,
) -> Response {
    if method == Method::OPTIONS {
        return StatusCode::OK.into_response();
    }
    if method != Method::GET {
        tracing::warn!(%method, "Rejected callback request method");
        return method_not_allowed(state.mode);
    }

    let params = match query {
        Ok(Query(params)) => params,
        Err(rejection) => {
            tracing::warn!("Undecodable callback query: {}", rejection);
            CallbackParams::default()
        }
    };

    let outcome = handle_callback(&state.oauth, params).await;
    respond(&outcome, state.mode, &state.app_origin)
}

/// Render an outcome in the configured mode.
pub fn respond(outcome: &RelayOutcome, mode: RelayMode, app_origin: &Url) -> Response {
    match mode {
        RelayMode::Redirect => {
            let location = outcome.redirect_url(app_origin);
            (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
        }
        RelayMode::Json => (outcome.status(), Json(outcome.json_body())).into_response(),
    }
}

/// Response for a panic captured anywhere below the router.
pub fn panic_response(err: Box<dyn Any + Send + 'static>, mode: RelayMode, app_origin: &Url) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    tracing::error!("Relay handler panicked: {}", detail);

    respond(&RelayOutcome::server_error("internal error"), mode, app_origin)
}

fn method_not_allowed(mode: RelayMode) -> Response {
    let allow = [(header::ALLOW, "GET, OPTIONS")];
    match mode {
        RelayMode::Redirect => (StatusCode::METHOD_NOT_ALLOWED, allow).into_response(),
        RelayMode::Json => (
            StatusCode::METHOD_NOT_ALLOWED,
            allow,
            Json(serde_json::json!({
                "success": false,
                "error": "method_not_allowed",
                "error_description": "Method not allowed",
            })),
        )
            .into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{app, with_layers};
    use api::auth::GitHubOAuth;
    use api::testing::{MockGitHub, MockResponse, TOKEN_FIXTURE};
    use axum::body::Body;
    use axum::http::Request;
    use axum::routing::get;
    use axum::Router;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tower::ServiceExt;

    const ORIGIN: &str = "http://localhost:5173/";

    fn state_for(mock: &MockGitHub, mode: RelayMode) -> AppState {
        AppState {
            oauth: Arc::new(GitHubOAuth::new(mock.oauth_config()).unwrap()),
            app_origin: Url::parse(ORIGIN).unwrap(),
            mode,
        }
    }

    fn request(method: Method, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    fn location_query(response: &Response) -> (Url, HashMap<String, String>) {
        let location = response
            .headers()
            .get(header::LOCATION)
            .unwrap()
            .to_str()
            .unwrap();
        let url = Url::parse(location).unwrap();
        let query = url.query_pairs().into_owned().collect();
        (url, query)
    }

    async fn json_body(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_success_redirects_with_session() {
        let mock = MockGitHub::builder().start().await;
        let app = app(state_for(&mock, RelayMode::Redirect));

        let response = app
            .oneshot(request(Method::GET, "/auth/callback?code=good&state=xyz"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FOUND);
        assert!(response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .is_none());
        let (url, query) = location_query(&response);
        assert_eq!(url.origin().ascii_serialization(), "http://localhost:5173");
        assert_eq!(query["auth"], "success");
        assert_eq!(query["token"], TOKEN_FIXTURE);
        assert_eq!(query["state"], "xyz");
        let user: serde_json::Value = serde_json::from_str(&query["user"]).unwrap();
        assert_eq!(user["login"], "octocat");
    }

    #[tokio::test]
    async fn test_legacy_route_is_served() {
        let mock = MockGitHub::builder().start().await;
        let app = app(state_for(&mock, RelayMode::Redirect));

        let response = app
            .oneshot(request(Method::GET, "/api/auth/github/callback?code=good"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(mock.token_calls(), 1);
    }

    #[tokio::test]
    async fn test_missing_code_redirects_without_exchange() {
        let mock = MockGitHub::builder().start().await;
        let app = app(state_for(&mock, RelayMode::Redirect));

        let response = app
            .oneshot(request(Method::GET, "/auth/callback"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FOUND);
        let (_, query) = location_query(&response);
        assert_eq!(query["error"], "missing_code");
        assert_eq!(mock.token_calls(), 0);
        assert_eq!(mock.user_calls(), 0);
    }

    #[tokio::test]
    async fn test_bad_code_redirects_api_error() {
        let mock = MockGitHub::builder()
            .token(MockResponse::ok(serde_json::json!({
                "error": "bad_verification_code",
                "error_description": "The code passed is incorrect or expired."
            })))
            .start()
            .await;
        let app = app(state_for(&mock, RelayMode::Redirect));

        let response = app
            .oneshot(request(Method::GET, "/auth/callback?code=stale&state=s"))
            .await
            .unwrap();

        let (_, query) = location_query(&response);
        assert_eq!(query["error"], "api_error");
        assert_eq!(query["state"], "s");
        assert_eq!(mock.user_calls(), 0);
    }

    #[tokio::test]
    async fn test_json_success_has_cors() {
        let mock = MockGitHub::builder().start().await;
        let app = app(state_for(&mock, RelayMode::Json));

        let response = app
            .oneshot(request(Method::GET, "/auth/callback?code=good"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "*"
        );
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_METHODS],
            "GET, POST, OPTIONS"
        );
        let body = json_body(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["access_token"], TOKEN_FIXTURE);
        assert_eq!(body["user"]["id"], 583231);
    }

    #[tokio::test]
    async fn test_json_missing_code_is_bad_request() {
        let mock = MockGitHub::builder().start().await;
        let app = app(state_for(&mock, RelayMode::Json));

        let response = app
            .oneshot(request(Method::GET, "/auth/callback?state=only"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "missing_code");
    }

    #[tokio::test]
    async fn test_json_transport_failure_is_server_error() {
        let mock = MockGitHub::builder()
            .token(MockResponse::status(503, serde_json::json!({})))
            .start()
            .await;
        let app = app(state_for(&mock, RelayMode::Json));

        let response = app
            .oneshot(request(Method::GET, "/auth/callback?code=good"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = json_body(response).await;
        assert_eq!(body["error"], "api_error");
    }

    #[tokio::test]
    async fn test_options_preflight() {
        let mock = MockGitHub::builder().start().await;
        let app = app(state_for(&mock, RelayMode::Json));

        let response = app
            .oneshot(request(Method::OPTIONS, "/auth/callback"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_HEADERS],
            "Content-Type"
        );
        assert_eq!(mock.token_calls(), 0);
    }

    #[tokio::test]
    async fn test_other_methods_rejected() {
        let mock = MockGitHub::builder().start().await;

        for method in [Method::POST, Method::DELETE, Method::PUT] {
            let response = app(state_for(&mock, RelayMode::Redirect))
                .oneshot(request(method, "/auth/callback?code=good"))
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
            assert_eq!(response.headers()[header::ALLOW], "GET, OPTIONS");
        }
        assert_eq!(mock.token_calls(), 0);
    }

    #[tokio::test]
    async fn test_healthz() {
        let mock = MockGitHub::builder().start().await;

        let response = app(state_for(&mock, RelayMode::Redirect))
            .oneshot(request(Method::GET, "/healthz"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&bytes[..], b"ok");
    }

    async fn boom() -> &'static str {
        panic!("handler blew up")
    }

    #[tokio::test]
    async fn test_panic_becomes_server_error_redirect() {
        let router = Router::new().route("/boom", get(boom));
        let app = with_layers(router, RelayMode::Redirect, Url::parse(ORIGIN).unwrap());

        let response = app.oneshot(request(Method::GET, "/boom")).await.unwrap();

        assert_eq!(response.status(), StatusCode::FOUND);
        let (_, query) = location_query(&response);
        assert_eq!(query["error"], "server_error");
    }

    #[tokio::test]
    async fn test_panic_becomes_server_error_json() {
        let router = Router::new().route("/boom", get(boom));
        let app = with_layers(router, RelayMode::Json, Url::parse(ORIGIN).unwrap());

        let response = app.oneshot(request(Method::GET, "/boom")).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        let body = json_body(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "server_error");
    }
}
