//! Replay command - run one saved webhook payload through the router

use crate::cli::context::CommandContext;
use anstream::println;
use stackbot::error::{Error, Result};
use stackbot::platform::PlatformProvider;
use stackbot::webhook::{Router, handle_event, parse_webhook};
use std::path::Path;

/// Handle a stored delivery as if it had just arrived
pub async fn run_replay(
    config_path: Option<&Path>,
    token: Option<String>,
    event_type: &str,
    payload_path: &Path,
) -> Result<()> {
    let payload = std::fs::read(payload_path)?;
    let event = parse_webhook(event_type, &payload)?.ok_or_else(|| {
        Error::Payload(format!("event type {event_type} is not handled"))
    })?;

    let ctx = CommandContext::new(config_path, token).await?;
    let platform = ctx.provider().for_repo(&event.repo)?;
    let router = Router::default();

    let completed = handle_event(
        &router,
        platform.as_ref(),
        &ctx.config.stack,
        &event,
        None,
    )
    .await;

    let steps = router.steps_for(&event.action);
    for step in steps {
        let mark = if completed.contains(step) { "ok" } else { "failed" };
        println!("{:<12} {mark}", step.name());
    }
    if steps.is_empty() {
        println!("no steps for pull_request.{}", event.action);
    }
    Ok(())
}
