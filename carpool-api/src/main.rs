use std::net::SocketAddr;
use anyhow::Context;
use axum::http::HeaderValue;
use carpool_api::{app, AppState};
use carpool_core::PasswordHasher;
use carpool_store::{Config, Store};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "carpool_api=debug,carpool_core=debug,carpool_store=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!(backend = ?config.database.backend, "Starting carpool API on port {}", config.server.port);

    let store = Store::open(&config.database).await.context("Failed to open store")?;
    let hasher = PasswordHasher::new(config.password).context("Invalid password settings")?;
    let origin = HeaderValue::from_str(&config.cors.allowed_origin)
        .context("cors.allowed_origin is not a valid header value")?;

    let app = app(AppState::new(store.repositories.clone(), hasher), origin);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    store.close().await;
    tracing::info!("Shut down cleanly");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
