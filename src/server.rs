//! HTTP server for the webhook endpoint.
//!
//! # Endpoints
//!
//! - `POST /webhook` - Accepts GitHub webhook deliveries (returns 202 Accepted)
//! - `GET /health` - Returns 200 if the server is running
//!
//! Each accepted `pull_request` delivery is handled on its own tokio task;
//! the response does not wait for the stacking steps.

use crate::config::StackSettings;
use crate::platform::PlatformProvider;
use crate::webhook::{Router, handle_event, parse_webhook, verify_signature};
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// Header name for GitHub event type.
const HEADER_EVENT: &str = "x-github-event";
/// Header name for GitHub delivery ID.
const HEADER_DELIVERY: &str = "x-github-delivery";
/// Header name for GitHub signature.
const HEADER_SIGNATURE: &str = "x-hub-signature-256";

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    webhook_secret: Vec<u8>,
    provider: Arc<dyn PlatformProvider>,
    settings: StackSettings,
    router: Router,
}

impl AppState {
    /// Create the state shared by all handlers
    pub fn new(
        webhook_secret: impl Into<Vec<u8>>,
        provider: Arc<dyn PlatformProvider>,
        settings: StackSettings,
        router: Router,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                webhook_secret: webhook_secret.into(),
                provider,
                settings,
                router,
            }),
        }
    }

    /// Webhook secret
    pub fn webhook_secret(&self) -> &[u8] {
        &self.inner.webhook_secret
    }

    /// Stacking settings
    pub fn settings(&self) -> &StackSettings {
        &self.inner.settings
    }
}

/// Errors that can occur when accepting a webhook
#[derive(Debug, Error)]
pub enum WebhookError {
    /// Missing required header
    #[error("missing required header: {0}")]
    MissingHeader(&'static str),

    /// Invalid signature
    #[error("invalid signature")]
    InvalidSignature,

    /// Payload could not be parsed
    #[error(transparent)]
    InvalidPayload(crate::error::Error),

    /// Could not build a platform client for the event's repository
    #[error("platform unavailable: {0}")]
    Platform(crate::error::Error),
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::MissingHeader(_) | Self::InvalidPayload(_) => StatusCode::BAD_REQUEST,
            Self::InvalidSignature => StatusCode::UNAUTHORIZED,
            Self::Platform(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.to_string()).into_response()
    }
}

/// Accept one GitHub webhook delivery
pub async fn webhook_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, &'static str), WebhookError> {
    let event_type = get_header(&headers, HEADER_EVENT)?;
    let delivery = get_header(&headers, HEADER_DELIVERY)?;
    let signature = get_header(&headers, HEADER_SIGNATURE)?;

    if !verify_signature(&body, &signature, state.webhook_secret()) {
        warn!(delivery = %delivery, "invalid webhook signature");
        return Err(WebhookError::InvalidSignature);
    }

    let Some(event) = parse_webhook(&event_type, &body).map_err(WebhookError::InvalidPayload)?
    else {
        debug!(delivery = %delivery, event_type = %event_type, "ignoring event");
        return Ok((StatusCode::ACCEPTED, "Ignored"));
    };

    let platform = state
        .inner
        .provider
        .for_repo(&event.repo)
        .map_err(WebhookError::Platform)?;

    debug!(
        delivery = %delivery,
        repo = %event.repo,
        action = %event.action,
        pr_number = event.pull_request.number,
        "accepted webhook"
    );

    tokio::spawn(async move {
        let inner = &state.inner;
        handle_event(
            &inner.router,
            platform.as_ref(),
            &inner.settings,
            &event,
            Some(delivery),
        )
        .await;
    });

    Ok((StatusCode::ACCEPTED, "Accepted"))
}

/// Liveness probe
pub async fn health_handler() -> &'static str {
    "OK"
}

/// Extracts a required header value as a string
fn get_header(headers: &HeaderMap, name: &'static str) -> Result<String, WebhookError> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
        .ok_or(WebhookError::MissingHeader(name))
}

/// Builds the axum Router with all endpoints
pub fn build_router(state: AppState) -> axum::Router {
    use axum::routing::{get, post};

    axum::Router::new()
        .route("/webhook", post(webhook_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}
