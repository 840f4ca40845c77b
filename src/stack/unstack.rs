//! Unstacking a PR whose author removed its directive

use crate::context::EventContext;
use crate::error::Result;
use crate::stack::directive::Directive;
use crate::types::PullRequest;
use tracing::info;

/// Revert `pr` to `default_branch` if this edit removed its directive.
///
/// `previous_body` is the description before the edit; without it the edit
/// did not touch the description and nothing happens. Only the
/// "had a directive, now has none" transition is handled here. Adding or
/// changing a directive is left to the stacking flow. Returns whether the
/// base was reverted.
pub async fn unstack_if_directive_removed(
    ctx: &EventContext<'_>,
    pr: &PullRequest,
    previous_body: Option<&str>,
    default_branch: &str,
) -> Result<bool> {
    let Some(previous_body) = previous_body else {
        return Ok(false);
    };

    let current = Directive::for_pull_request(&pr.body, pr.number).depends_on;
    let previous = Directive::for_pull_request(previous_body, pr.number).depends_on;

    if current.is_some() || previous.is_none() {
        return Ok(false);
    }

    ctx.platform.update_pr_base(pr.number, default_branch).await?;
    info!(
        pr_number = pr.number,
        previous_dep = previous,
        base = default_branch,
        "directive removed, unstacked PR"
    );
    Ok(true)
}
