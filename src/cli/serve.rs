//! Serve command - run the webhook server

use crate::cli::context::CommandContext;
use stackbot::error::{Error, Result};
use stackbot::server::{AppState, build_router};
use stackbot::webhook::Router;
use std::net::SocketAddr;
use std::path::Path;
use tracing::info;

/// Run the webhook server until the process is stopped
pub async fn run_serve(
    config_path: Option<&Path>,
    token: Option<String>,
    webhook_secret: String,
    listen: Option<SocketAddr>,
) -> Result<()> {
    if webhook_secret.is_empty() {
        return Err(Error::Config("webhook secret must not be empty".to_string()));
    }

    let ctx = CommandContext::new(config_path, token).await?;
    let addr = listen.unwrap_or(ctx.config.server.listen);

    let state = AppState::new(
        webhook_secret,
        ctx.provider(),
        ctx.config.stack.clone(),
        Router::default(),
    );
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "listening for webhooks");
    axum::serve(listener, app).await?;
    Ok(())
}
