//! Hosting platform services
//!
//! The stacking logic only ever talks to the platform through
//! [`PlatformService`], so every component can be exercised against an
//! in-memory implementation.

mod github;

pub use github::{GitHubProvider, GitHubService};

use crate::error::Result;
use crate::types::{CheckRun, CheckRunReport, PlatformConfig, ProtectionPolicy, PullRequest, RepoId};
use async_trait::async_trait;
use std::sync::Arc;

/// Platform service trait for the operations stacking needs
///
/// Expected absence (missing ref, label or protection rule) is reported as
/// [`Error::NotFound`](crate::error::Error::NotFound) so callers can tell it
/// apart from real failures.
#[async_trait]
pub trait PlatformService: Send + Sync {
    /// Get the platform configuration
    fn config(&self) -> &PlatformConfig;

    // =========================================================================
    // Pull requests
    // =========================================================================

    /// Fetch a PR by number
    async fn get_pull_request(&self, pr_number: u64) -> Result<PullRequest>;

    /// Change the base branch of a PR
    async fn update_pr_base(&self, pr_number: u64, new_base: &str) -> Result<()>;

    /// One page of open PR numbers whose base branch is `base`.
    ///
    /// `page` starts at 1. A page shorter than `per_page` is the last one.
    async fn search_open_prs_by_base(&self, base: &str, page: u32, per_page: u8)
    -> Result<Vec<u64>>;

    // =========================================================================
    // Branch refs
    // =========================================================================

    /// Commit SHA a branch points at
    async fn get_branch_sha(&self, branch: &str) -> Result<String>;

    /// Create a branch at `sha`; `AlreadyExists` if it is already there
    async fn create_branch(&self, branch: &str, sha: &str) -> Result<()>;

    /// Move a branch to `sha`, optionally forcing a non-fast-forward update
    async fn update_branch(&self, branch: &str, sha: &str, force: bool) -> Result<()>;

    /// Delete a branch
    async fn delete_branch(&self, branch: &str) -> Result<()>;

    // =========================================================================
    // Branch protection
    // =========================================================================

    /// Replace the protection rules on a branch
    async fn set_branch_protection(&self, branch: &str, policy: &ProtectionPolicy) -> Result<()>;

    /// Remove all protection from a branch
    async fn remove_branch_protection(&self, branch: &str) -> Result<()>;

    // =========================================================================
    // Check runs
    // =========================================================================

    /// Check runs named `name` on commit `head_sha`
    async fn list_check_runs(&self, head_sha: &str, name: &str) -> Result<Vec<CheckRun>>;

    /// Create a check run on `head_sha`
    async fn create_check_run(&self, head_sha: &str, report: &CheckRunReport) -> Result<()>;

    /// Update an existing check run in place
    async fn update_check_run(&self, check_run_id: u64, report: &CheckRunReport) -> Result<()>;

    // =========================================================================
    // Labels
    // =========================================================================

    /// Add a label to a PR
    async fn add_label(&self, pr_number: u64, label: &str) -> Result<()>;

    /// Remove a label from a PR
    async fn remove_label(&self, pr_number: u64, label: &str) -> Result<()>;
}

/// Builds a platform service for the repository an event belongs to
pub trait PlatformProvider: Send + Sync {
    /// Service bound to `repo`
    fn for_repo(&self, repo: &RepoId) -> Result<Arc<dyn PlatformService>>;
}
