//! Stacking a PR onto the dependency its description declares

use crate::context::EventContext;
use crate::error::Result;
use crate::stack::directive::Directive;
use crate::types::PullRequest;
use tracing::{debug, info};

/// Retarget `pr` onto the shadow branch of its declared dependency.
///
/// Creates (and on first creation protects) the shadow branch at the
/// dependency's head. A protection failure is logged and does not undo or
/// hide the retarget. Returns the new base branch when the PR was
/// retargeted, `None` when there was nothing to do.
pub async fn attach_to_dependency(
    ctx: &EventContext<'_>,
    pr: &PullRequest,
) -> Result<Option<String>> {
    let Some(dep) = Directive::for_pull_request(&pr.body, pr.number).depends_on else {
        return Ok(None);
    };

    let shadow = ctx.shadow();
    let branch = shadow.branch_name_for(dep);

    if pr.base_ref == branch {
        debug!(pr_number = pr.number, branch = %branch, "already stacked");
        return Ok(None);
    }

    let Some(dependency) = ctx
        .isolate("get-dependency", pr.number, ctx.platform.get_pull_request(dep))
        .await
    else {
        return Ok(None);
    };

    if !dependency.state.is_open() {
        debug!(pr_number = pr.number, dep, state = %dependency.state, "dependency is not open");
        return Ok(None);
    }

    let created = shadow
        .create_follower_branch(dep, &dependency.head_sha)
        .await;

    ctx.platform.update_pr_base(pr.number, &branch).await?;
    info!(
        pr_number = pr.number,
        dep,
        branch = %branch,
        restacked = shadow.is_shadow_branch(&pr.base_ref),
        "stacked PR onto dependency"
    );

    // The retarget has happened; an unprotected branch must not hide it
    if created {
        ctx.isolate("protect", pr.number, shadow.protect(dep)).await;
    }

    Ok(Some(branch))
}
