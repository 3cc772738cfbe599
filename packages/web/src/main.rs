use anyhow::Context;
use api::settings::Settings;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};
use web::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug")),
        )
        .with(fmt::layer())
        .init();

    let settings = Settings::load().context("failed to load settings")?;
    let state = AppState::from_settings(&settings).context("invalid GitHub OAuth configuration")?;
    tracing::info!(mode = ?state.mode, app_origin = %state.app_origin, "Relay configured");

    let listener = tokio::net::TcpListener::bind(&settings.relay.bind)
        .await
        .with_context(|| format!("failed to bind {}", settings.relay.bind))?;
    tracing::info!("Relay listening on {}", listener.local_addr()?);

    axum::serve(listener, web::app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
