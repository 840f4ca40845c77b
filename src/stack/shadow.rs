//! Shadow branches: synthetic branches that mirror a dependency PR's head
//!
//! A PR stacked on #N targets `<prefix>N`. That branch is force-moved every
//! time #N gets new commits and torn down when #N closes.

use crate::config::StackSettings;
use crate::context::EventIdentity;
use crate::error::{AbsenceExt, Error, Result};
use crate::platform::PlatformService;
use crate::types::ProtectionPolicy;
use tracing::{debug, warn};

/// Manages the shadow branches of one repository
#[derive(Clone, Copy)]
pub struct ShadowBranches<'a> {
    platform: &'a dyn PlatformService,
    settings: &'a StackSettings,
    event: Option<&'a EventIdentity>,
}

impl<'a> ShadowBranches<'a> {
    /// Create a manager outside of any event
    pub const fn new(platform: &'a dyn PlatformService, settings: &'a StackSettings) -> Self {
        Self {
            platform,
            settings,
            event: None,
        }
    }

    /// Attach the event being handled; its identity goes into failure logs
    #[must_use]
    pub const fn for_event(mut self, event: &'a EventIdentity) -> Self {
        self.event = Some(event);
        self
    }

    /// Event this manager acts for, if any
    pub const fn event(&self) -> Option<&'a EventIdentity> {
        self.event
    }

    /// Name of the shadow branch for PR `pr_number`
    pub fn branch_name_for(&self, pr_number: u64) -> String {
        branch_name_for(&self.settings.branch_prefix, pr_number)
    }

    /// Whether `branch` is a shadow branch under the configured prefix
    pub fn is_shadow_branch(&self, branch: &str) -> bool {
        self.dependency_of(branch).is_some()
    }

    /// PR number mirrored by `branch`, if it is a shadow branch
    pub fn dependency_of(&self, branch: &str) -> Option<u64> {
        dependency_of(&self.settings.branch_prefix, branch)
    }

    /// Whether the shadow branch for `pr_number` exists.
    ///
    /// Fails open: any error reads as `false`.
    pub async fn exists(&self, pr_number: u64) -> bool {
        let branch = self.branch_name_for(pr_number);
        match self.platform.get_branch_sha(&branch).await.absent_ok() {
            Ok(sha) => sha.is_some(),
            Err(e) => {
                debug!(branch = %branch, error = %e, "branch lookup failed, treating as absent");
                false
            }
        }
    }

    /// Create the shadow branch for `pr_number` at `sha`.
    ///
    /// Returns `true` only if the branch was created by this call. If it
    /// already exists it is force-moved to `sha` instead and `false` is
    /// returned. Other failures are logged and also return `false`.
    pub async fn create_follower_branch(&self, pr_number: u64, sha: &str) -> bool {
        let branch = self.branch_name_for(pr_number);
        match self.platform.create_branch(&branch, sha).await {
            Ok(()) => {
                debug!(branch = %branch, sha, "created shadow branch");
                true
            }
            Err(Error::AlreadyExists(_)) => {
                debug!(branch = %branch, sha, "shadow branch already exists");
                self.force_update(pr_number, sha).await;
                false
            }
            Err(e) => {
                self.warn_failure(pr_number, &branch, "create", &e);
                false
            }
        }
    }

    /// Force-move the shadow branch for `pr_number` to `sha`.
    ///
    /// Best effort: a missing branch or any other failure is ignored, and a
    /// torn-down branch is not recreated.
    pub async fn force_update(&self, pr_number: u64, sha: &str) {
        let branch = self.branch_name_for(pr_number);
        match self.platform.update_branch(&branch, sha, true).await {
            Ok(()) => debug!(branch = %branch, sha, "moved shadow branch"),
            Err(e) => debug!(branch = %branch, error = %e, "shadow branch not moved"),
        }
    }

    /// Protect the shadow branch for `pr_number` so the dependency check
    /// shows up on every PR targeting it
    pub async fn protect(&self, pr_number: u64) -> Result<()> {
        let branch = self.branch_name_for(pr_number);
        let policy = ProtectionPolicy::for_shadow_branch(&self.settings.check_name);
        self.platform.set_branch_protection(&branch, &policy).await?;
        debug!(branch = %branch, "protected shadow branch");
        Ok(())
    }

    /// Remove protection from, then delete, the shadow branch for
    /// `pr_number`. Both halves are best effort.
    pub async fn unprotect_and_delete(&self, pr_number: u64) {
        let branch = self.branch_name_for(pr_number);

        match self.platform.remove_branch_protection(&branch).await.absent_ok() {
            Ok(Some(())) => debug!(branch = %branch, "removed branch protection"),
            Ok(None) => {}
            Err(e) => self.warn_failure(pr_number, &branch, "unprotect", &e),
        }

        match self.platform.delete_branch(&branch).await.absent_ok() {
            Ok(Some(())) => debug!(branch = %branch, "deleted shadow branch"),
            Ok(None) => {}
            Err(e) => self.warn_failure(pr_number, &branch, "delete", &e),
        }
    }

    fn warn_failure(&self, pr_number: u64, branch: &str, op: &'static str, e: &Error) {
        let event = self.event.map_or_else(|| "-".to_string(), ToString::to_string);
        let delivery = self.event.and_then(|ev| ev.delivery.as_deref()).unwrap_or("-");
        warn!(
            event = %event,
            delivery,
            pr_number,
            branch = %branch,
            op,
            error = %e,
            "shadow branch operation failed"
        );
    }
}

/// Shadow branch name for `pr_number` under `prefix`
pub fn branch_name_for(prefix: &str, pr_number: u64) -> String {
    format!("{prefix}{pr_number}")
}

/// PR number a shadow branch mirrors, if `branch` is one
pub fn dependency_of(prefix: &str, branch: &str) -> Option<u64> {
    let digits = branch.strip_prefix(prefix)?;
    // Reject leading zeros so the inverse stays exact
    if digits.is_empty() || digits.starts_with('0') || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}
