//! Event routing: which stacking steps run for which `pull_request` action

use crate::config::StackSettings;
use crate::context::{EventContext, EventIdentity};
use crate::platform::PlatformService;
use crate::stack::{
    attach_to_dependency, cascade_reparent, publish_dependency_status,
    unstack_if_directive_removed,
};
use crate::webhook::events::{PrAction, PullRequestEvent};
use std::collections::HashMap;
use tracing::{debug, info};

/// One stacking step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    /// Retarget the PR onto its declared dependency
    Attach,
    /// Recompute the dependency check run and label
    Status,
    /// Revert the base if the directive was removed
    Unstack,
    /// Move this PR's own shadow branch to its new head
    FollowHead,
    /// Re-parent dependents and tear down this PR's shadow branch
    Cascade,
}

impl Step {
    /// Step name used in logs
    pub const fn name(self) -> &'static str {
        match self {
            Self::Attach => "attach",
            Self::Status => "status",
            Self::Unstack => "unstack",
            Self::FollowHead => "follow-head",
            Self::Cascade => "cascade",
        }
    }
}

/// Dispatch table from PR action to the ordered steps it runs
#[derive(Debug, Clone)]
pub struct Router {
    routes: HashMap<PrAction, Vec<Step>>,
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
            .route(PrAction::Opened, &[Step::Attach, Step::Status])
            .route(PrAction::Reopened, &[Step::Attach, Step::Status])
            .route(PrAction::Edited, &[Step::Attach, Step::Status, Step::Unstack])
            .route(PrAction::Synchronize, &[Step::Status, Step::FollowHead])
            .route(PrAction::Closed, &[Step::Cascade])
    }
}

impl Router {
    /// Empty table
    pub fn new() -> Self {
        Self {
            routes: HashMap::new(),
        }
    }

    /// Register the steps for an action, replacing any previous entry
    #[must_use]
    pub fn route(mut self, action: PrAction, steps: &[Step]) -> Self {
        self.routes.insert(action, steps.to_vec());
        self
    }

    /// Steps registered for `action`
    pub fn steps_for(&self, action: &PrAction) -> &[Step] {
        self.routes.get(action).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Run every step for `event`, each in its own failure boundary.
    ///
    /// Returns the steps that completed without error.
    pub async fn dispatch(&self, ctx: &EventContext<'_>, event: &PullRequestEvent) -> Vec<Step> {
        let steps = self.steps_for(&event.action);
        if steps.is_empty() {
            debug!(event = %ctx.event, "no steps registered");
            return Vec::new();
        }

        info!(
            event = %ctx.event,
            pr_number = event.pull_request.number,
            repo = %event.repo,
            "handling event"
        );

        // The PR as later steps should see it; attach may retarget it
        let mut pr = event.pull_request.clone();
        let default_branch = ctx
            .settings
            .default_branch
            .as_deref()
            .unwrap_or(&event.default_branch);
        let mut completed = Vec::with_capacity(steps.len());

        for &step in steps {
            let number = pr.number;
            let ok = match step {
                Step::Attach => {
                    let attached = ctx
                        .isolate(step.name(), number, attach_to_dependency(ctx, &pr))
                        .await;
                    match attached {
                        Some(Some(new_base)) => {
                            pr.base_ref = new_base;
                            true
                        }
                        Some(None) => true,
                        None => false,
                    }
                }
                Step::Status => ctx
                    .isolate(step.name(), number, publish_dependency_status(ctx, &pr))
                    .await
                    .is_some(),
                Step::Unstack => ctx
                    .isolate(
                        step.name(),
                        number,
                        unstack_if_directive_removed(
                            ctx,
                            &pr,
                            event.previous_body.as_deref(),
                            default_branch,
                        ),
                    )
                    .await
                    .is_some(),
                Step::FollowHead => {
                    ctx.shadow().force_update(number, &pr.head_sha).await;
                    true
                }
                Step::Cascade => ctx
                    .isolate(step.name(), number, cascade_reparent(ctx, &pr))
                    .await
                    .is_some(),
            };
            if ok {
                completed.push(step);
            }
        }

        completed
    }
}

/// Build the context for one delivery and run it through `router`
pub async fn handle_event(
    router: &Router,
    platform: &dyn PlatformService,
    settings: &StackSettings,
    event: &PullRequestEvent,
    delivery: Option<String>,
) -> Vec<Step> {
    let identity = EventIdentity {
        name: "pull_request".to_string(),
        action: event.action.to_string(),
        delivery,
    };
    let ctx = EventContext::new(platform, settings, identity);
    router.dispatch(&ctx, event).await
}
