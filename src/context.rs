//! Per-event request context
//!
//! Everything a component needs to act on one webhook delivery travels in an
//! [`EventContext`]: the platform client bound to the event's repository, the
//! stacking settings, and the identity of the event for logging.

use crate::config::StackSettings;
use crate::error::Result;
use crate::platform::PlatformService;
use crate::stack::ShadowBranches;
use crate::types::RepoId;
use std::fmt;
use std::future::Future;
use tracing::error;

/// Identity of the event being handled, used in every failure log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventIdentity {
    /// Webhook event name (e.g. `pull_request`)
    pub name: String,
    /// Action within the event (e.g. `opened`)
    pub action: String,
    /// Delivery id, when the event came in over HTTP
    pub delivery: Option<String>,
}

impl EventIdentity {
    /// Identity for an event without a delivery id
    pub fn new(name: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            action: action.into(),
            delivery: None,
        }
    }
}

impl fmt::Display for EventIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.name, self.action)
    }
}

/// Context for handling one event
pub struct EventContext<'a> {
    /// Platform service bound to the event's repository
    pub platform: &'a dyn PlatformService,
    /// Stacking identifiers
    pub settings: &'a StackSettings,
    /// Event identity
    pub event: EventIdentity,
}

impl<'a> EventContext<'a> {
    /// Create a context
    pub const fn new(
        platform: &'a dyn PlatformService,
        settings: &'a StackSettings,
        event: EventIdentity,
    ) -> Self {
        Self {
            platform,
            settings,
            event,
        }
    }

    /// Shadow branch manager for this event's repository
    pub const fn shadow(&self) -> ShadowBranches<'_> {
        ShadowBranches::new(self.platform, self.settings).for_event(&self.event)
    }

    /// Repository the platform client is bound to
    pub fn repo(&self) -> RepoId {
        let config = self.platform.config();
        RepoId::new(config.owner.as_str(), config.repo.as_str())
    }

    /// Run one sub-operation inside a failure boundary.
    ///
    /// A failure is logged with the event identity and PR number and turned
    /// into `None`, so sibling sub-operations of the same event still run.
    /// Nothing is retried.
    pub async fn isolate<T, F>(&self, step: &'static str, pr_number: u64, op: F) -> Option<T>
    where
        F: Future<Output = Result<T>>,
    {
        match op.await {
            Ok(value) => Some(value),
            Err(e) => {
                error!(
                    event = %self.event,
                    repo = %self.repo(),
                    delivery = self.event.delivery.as_deref().unwrap_or("-"),
                    pr_number,
                    step,
                    error = %e,
                    "error while processing event"
                );
                None
            }
        }
    }
}
