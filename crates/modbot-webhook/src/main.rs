//! Webhook binary: env configuration, client wiring and the axum server.

use std::sync::Arc;

use anyhow::{Context, Result};
use modbot_comments::{CommentsClient, CommentsConfig};
use modbot_core::{MessageCatalog, Responder};
use modbot_perspective::{PerspectiveClient, PerspectiveConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod routes;

use config::WebhookConfig;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = WebhookConfig::from_env().context("invalid webhook configuration")?;

    let scorer = PerspectiveClient::new(PerspectiveConfig {
        analyze_url: config.perspective_url.clone(),
        api_key: config.perspective_api_key.clone(),
        request_timeout_ms: config.request_timeout_ms,
    })
    .context("failed to build toxicity scorer client")?;
    let poster = CommentsClient::new(CommentsConfig {
        add_comment_url: config.comments_add_url.clone(),
        device_token: config.comments_api_key.clone(),
        request_timeout_ms: config.request_timeout_ms,
    })
    .context("failed to build comment poster client")?;

    let responder = Arc::new(Responder::new(
        config.responder.clone(),
        MessageCatalog::default(),
        Arc::new(scorer),
        Arc::new(poster),
    ));

    let app = routes::router(responder);
    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    info!(addr = %config.bind_addr, bot_id = config.responder.bot_id, "webhook listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        return;
    }
    info!("shutdown requested");
}
