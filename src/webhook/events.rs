//! Typed `pull_request` webhook events.
//!
//! Only the fields stacking needs are parsed. Other event types are ignored
//! rather than rejected.

use crate::error::{Error, Result};
use crate::types::{PrState, PullRequest, RepoId};
use serde::Deserialize;
use std::fmt;

/// Action performed on a pull request
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PrAction {
    /// PR was opened
    Opened,
    /// PR was reopened
    Reopened,
    /// Title, body or base changed
    Edited,
    /// New commits were pushed
    Synchronize,
    /// PR was closed, merged or not
    Closed,
    /// Any action stacking doesn't act on
    Other(String),
}

impl PrAction {
    fn parse(action: &str) -> Self {
        match action {
            "opened" => Self::Opened,
            "reopened" => Self::Reopened,
            "edited" => Self::Edited,
            "synchronize" => Self::Synchronize,
            "closed" => Self::Closed,
            other => Self::Other(other.to_string()),
        }
    }

    /// Action name as it appears in the payload
    pub fn as_str(&self) -> &str {
        match self {
            Self::Opened => "opened",
            Self::Reopened => "reopened",
            Self::Edited => "edited",
            Self::Synchronize => "synchronize",
            Self::Closed => "closed",
            Self::Other(s) => s,
        }
    }
}

impl fmt::Display for PrAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed `pull_request` event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestEvent {
    /// Repository the PR belongs to
    pub repo: RepoId,
    /// Repository default branch
    pub default_branch: String,
    /// What happened
    pub action: PrAction,
    /// The PR after the change
    pub pull_request: PullRequest,
    /// Description before the edit, only for edits that changed it
    pub previous_body: Option<String>,
}

// Raw payload structures. Option is used where GitHub may omit or null a
// field; everything else is required.

#[derive(Deserialize)]
struct RawPayload {
    action: String,
    pull_request: RawPullRequest,
    repository: RawRepository,
    changes: Option<RawChanges>,
}

#[derive(Deserialize)]
struct RawPullRequest {
    number: u64,
    body: Option<String>,
    state: String,
    #[serde(default)]
    merged: bool,
    base: RawRef,
    head: RawHead,
    #[serde(default)]
    labels: Vec<RawLabel>,
}

#[derive(Deserialize)]
struct RawRef {
    #[serde(rename = "ref")]
    ref_field: String,
}

#[derive(Deserialize)]
struct RawHead {
    sha: String,
}

#[derive(Deserialize)]
struct RawLabel {
    name: String,
}

#[derive(Deserialize)]
struct RawRepository {
    name: String,
    owner: RawOwner,
    default_branch: String,
}

#[derive(Deserialize)]
struct RawOwner {
    login: String,
}

#[derive(Deserialize)]
struct RawChanges {
    body: Option<RawChange>,
}

#[derive(Deserialize)]
struct RawChange {
    from: Option<String>,
}

/// Parse a webhook payload.
///
/// Returns `Ok(None)` for event types other than `pull_request`.
pub fn parse_webhook(event_type: &str, payload: &[u8]) -> Result<Option<PullRequestEvent>> {
    if event_type != "pull_request" {
        return Ok(None);
    }
    parse_pull_request(payload).map(Some)
}

fn parse_pull_request(payload: &[u8]) -> Result<PullRequestEvent> {
    let raw: RawPayload =
        serde_json::from_slice(payload).map_err(|e| Error::Payload(e.to_string()))?;

    let pr = raw.pull_request;
    let state = match (pr.state.as_str(), pr.merged) {
        ("open", _) => PrState::Open,
        ("closed", true) => PrState::Merged,
        ("closed", false) => PrState::Closed,
        (other, _) => {
            return Err(Error::Payload(format!("unknown pull request state: {other}")));
        }
    };

    Ok(PullRequestEvent {
        repo: RepoId::new(raw.repository.owner.login, raw.repository.name),
        default_branch: raw.repository.default_branch,
        action: PrAction::parse(&raw.action),
        pull_request: PullRequest {
            number: pr.number,
            body: pr.body.unwrap_or_default(),
            base_ref: pr.base.ref_field,
            head_sha: pr.head.sha,
            state,
            labels: pr.labels.into_iter().map(|l| l.name).collect(),
        },
        previous_body: raw.changes.and_then(|c| c.body).and_then(|b| b.from),
    })
}
