//! Dependency status: the check run and label that tell reviewers a PR is
//! still waiting on the PR it is stacked on

use crate::context::EventContext;
use crate::error::{AbsenceExt, Result};
use crate::stack::directive::Directive;
use crate::stack::shadow::branch_name_for;
use crate::types::{CheckConclusion, CheckOutput, CheckRunReport, CheckStatus, PullRequest};
use tracing::debug;

/// Effective stacking state of a PR
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependencyStatus {
    /// No effective dependency
    NoDependency,
    /// Stacked on this PR, which is still open
    Waiting(u64),
}

impl DependencyStatus {
    /// Combine the declared directive with the actual base branch.
    ///
    /// A directive alone is not enough: the PR may not have been retargeted
    /// yet, or its base may have been reset by hand.
    pub fn evaluate(directive: Directive, base_ref: &str, branch_prefix: &str) -> Self {
        match directive.depends_on {
            Some(dep) if base_ref == branch_name_for(branch_prefix, dep) => Self::Waiting(dep),
            _ => Self::NoDependency,
        }
    }

    /// Whether the PR is waiting on a dependency
    pub const fn is_waiting(self) -> bool {
        matches!(self, Self::Waiting(_))
    }

    /// Check-run payload for this status
    pub fn report(self, check_name: &str) -> CheckRunReport {
        let (conclusion, text) = match self {
            Self::NoDependency => (
                CheckConclusion::Success,
                "This PR has no dependencies!".to_string(),
            ),
            Self::Waiting(dep) => (
                CheckConclusion::Failure,
                format!("Waiting for #{dep} to be merged or closed"),
            ),
        };
        CheckRunReport {
            name: check_name.to_string(),
            status: CheckStatus::Completed,
            conclusion,
            output: CheckOutput {
                title: text.clone(),
                summary: text,
            },
        }
    }
}

/// Recompute and publish the dependency status of `pr`.
///
/// The check run on the head commit is updated in place when one exists,
/// otherwise created. The label toggle runs in its own failure boundary so a
/// label error never blocks the check run.
pub async fn publish_dependency_status(
    ctx: &EventContext<'_>,
    pr: &PullRequest,
) -> Result<DependencyStatus> {
    let settings = ctx.settings;
    let directive = Directive::for_pull_request(&pr.body, pr.number);
    let status = DependencyStatus::evaluate(directive, &pr.base_ref, &settings.branch_prefix);
    let report = status.report(&settings.check_name);

    let runs = ctx
        .platform
        .list_check_runs(&pr.head_sha, &settings.check_name)
        .await?;

    // Prefer the run GitHub associates with this PR; any run of ours on the
    // head commit is otherwise good enough to update.
    let existing = runs
        .iter()
        .filter(|run| run.name == settings.check_name)
        .find(|run| run.pull_requests.contains(&pr.number))
        .or_else(|| runs.iter().find(|run| run.name == settings.check_name));

    match existing {
        Some(run) => {
            ctx.platform.update_check_run(run.id, &report).await?;
            debug!(pr_number = pr.number, check_run_id = run.id, ?status, "updated check run");
        }
        None => {
            ctx.platform.create_check_run(&pr.head_sha, &report).await?;
            debug!(pr_number = pr.number, ?status, "created check run");
        }
    }

    ctx.isolate("toggle-label", pr.number, toggle_label(ctx, pr, status))
        .await;

    Ok(status)
}

/// Make label presence match `status`, based on the labels in the payload
async fn toggle_label(ctx: &EventContext<'_>, pr: &PullRequest, status: DependencyStatus) -> Result<()> {
    let label = &ctx.settings.label;
    let has_label = pr.has_label(label);

    if status.is_waiting() && !has_label {
        ctx.platform.add_label(pr.number, label).await?;
        debug!(pr_number = pr.number, label = %label, "added label");
    } else if !status.is_waiting() && has_label {
        if ctx
            .platform
            .remove_label(pr.number, label)
            .await
            .absent_ok()?
            .is_some()
        {
            debug!(pr_number = pr.number, label = %label, "removed label");
        }
    }
    Ok(())
}
