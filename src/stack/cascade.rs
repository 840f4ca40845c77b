//! Cascade re-parenting when a dependency PR closes
//!
//! Every open PR based on the closing PR's shadow branch is moved onto the
//! closing PR's own base, then the shadow branch is torn down. Only one level
//! is flattened: grandchildren keep targeting their parent's shadow branch
//! and are handled when that parent closes.

use crate::context::EventContext;
use crate::error::Result;
use crate::types::PullRequest;
use tracing::{debug, info};

/// Outcome of one cascade
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CascadeReport {
    /// Dependents moved onto the closing PR's base
    pub reparented: Vec<u64>,
    /// Dependents whose retarget failed
    pub failed: Vec<u64>,
}

/// Re-parent the dependents of `closing` and tear down its shadow branch.
///
/// A failing search aborts the whole cascade, teardown included: deleting a
/// branch that still has PRs based on it would close those PRs.
pub async fn cascade_reparent(ctx: &EventContext<'_>, closing: &PullRequest) -> Result<CascadeReport> {
    let shadow = ctx.shadow();
    let branch = shadow.branch_name_for(closing.number);
    let per_page = ctx.settings.search_page_size;
    let mut report = CascadeReport::default();

    let mut page = 1;
    loop {
        let dependents = ctx
            .platform
            .search_open_prs_by_base(&branch, page, per_page)
            .await?;
        debug!(branch = %branch, page, count = dependents.len(), "found dependents");

        for &dependent in &dependents {
            let moved = ctx
                .isolate(
                    "reparent",
                    dependent,
                    ctx.platform.update_pr_base(dependent, &closing.base_ref),
                )
                .await;
            if moved.is_some() {
                info!(
                    pr_number = dependent,
                    from = %branch,
                    to = %closing.base_ref,
                    "re-parented dependent"
                );
                report.reparented.push(dependent);
            } else {
                report.failed.push(dependent);
            }
        }

        if dependents.len() < usize::from(per_page) {
            break;
        }
        page += 1;
    }

    shadow.unprotect_and_delete(closing.number).await;
    Ok(report)
}
