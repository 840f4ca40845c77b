//! Core types for stackbot

use serde::{Deserialize, Serialize};

/// Repository identity (owner + name)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoId {
    /// Repository owner (user or organization)
    pub owner: String,
    /// Repository name
    pub name: String,
}

impl RepoId {
    /// Create a repository id
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// Parse `owner/name`
    pub fn parse(s: &str) -> Option<Self> {
        let (owner, name) = s.split_once('/')?;
        if owner.is_empty() || name.is_empty() || name.contains('/') {
            return None;
        }
        Some(Self::new(owner, name))
    }
}

impl std::fmt::Display for RepoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Platform configuration
#[derive(Debug, Clone)]
pub struct PlatformConfig {
    /// Repository owner (user or organization)
    pub owner: String,
    /// Repository name
    pub repo: String,
    /// Custom host (None for github.com)
    pub host: Option<String>,
}

/// PR state (open, closed, merged)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrState {
    /// PR is open
    Open,
    /// PR was closed without merging
    Closed,
    /// PR was merged
    Merged,
}

impl PrState {
    /// Whether the PR is still open
    pub const fn is_open(self) -> bool {
        matches!(self, Self::Open)
    }
}

impl std::fmt::Display for PrState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open => write!(f, "open"),
            Self::Closed => write!(f, "closed"),
            Self::Merged => write!(f, "merged"),
        }
    }
}

/// A pull request as seen at the time of one event.
///
/// Never cached across events; the platform is the source of truth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    /// PR number
    pub number: u64,
    /// PR description (empty when the PR has no body)
    pub body: String,
    /// Base branch name
    pub base_ref: String,
    /// Head commit SHA
    pub head_sha: String,
    /// Current state
    pub state: PrState,
    /// Label names currently attached
    pub labels: Vec<String>,
}

impl PullRequest {
    /// Whether a label with this name is attached
    pub fn has_label(&self, name: &str) -> bool {
        self.labels.iter().any(|l| l == name)
    }
}

/// Lifecycle status of a check run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    /// Waiting to start
    Queued,
    /// Running
    InProgress,
    /// Finished, has a conclusion
    Completed,
}

/// Conclusion of a completed check run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckConclusion {
    /// Passing
    Success,
    /// Failing
    Failure,
}

/// Title and summary shown on a check run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckOutput {
    /// Short title
    pub title: String,
    /// Markdown summary
    pub summary: String,
}

/// The payload published for a check run (create or update)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckRunReport {
    /// Check-run name
    pub name: String,
    /// Status (always completed for dependency checks)
    pub status: CheckStatus,
    /// Conclusion
    pub conclusion: CheckConclusion,
    /// Title and summary
    pub output: CheckOutput,
}

/// An existing check run attached to a commit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckRun {
    /// Check-run id
    pub id: u64,
    /// Check-run name
    pub name: String,
    /// Commit the run is attached to
    pub head_sha: String,
    /// Status reported by the platform
    pub status: CheckStatus,
    /// Conclusion, if completed
    pub conclusion: Option<CheckConclusion>,
    /// Numbers of the PRs the platform associates with this run
    pub pull_requests: Vec<u64>,
}

/// Branch protection applied to a shadow branch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtectionPolicy {
    /// Required status-check contexts
    pub required_checks: Vec<String>,
    /// Whether the branch must be up to date before merging
    pub strict: bool,
    /// Whether administrators are subject to the rules
    pub enforce_admins: bool,
    /// Whether force pushes are allowed
    pub allow_force_pushes: bool,
}

impl ProtectionPolicy {
    /// Policy for a shadow branch: require `check_name` (non-strict), enforce
    /// for admins, no reviews, no push restrictions, allow force pushes.
    pub fn for_shadow_branch(check_name: &str) -> Self {
        Self {
            required_checks: vec![check_name.to_string()],
            strict: false,
            enforce_admins: true,
            allow_force_pushes: true,
        }
    }
}
