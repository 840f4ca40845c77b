//! Shared test fixtures

#![allow(dead_code)]

mod mock_platform;

pub use mock_platform::{MockPlatformService, MockProvider, SearchCall, UpdateBaseCall};

use stackbot::config::StackSettings;
use stackbot::context::{EventContext, EventIdentity};
use stackbot::types::{PlatformConfig, PrState, PullRequest, RepoId};
use stackbot::webhook::{PrAction, PullRequestEvent};

/// Platform config for the test repository
pub fn github_config() -> PlatformConfig {
    PlatformConfig {
        owner: "octo".to_string(),
        repo: "widgets".to_string(),
        host: None,
    }
}

/// Fresh mock for the test repository
pub fn mock() -> MockPlatformService {
    MockPlatformService::with_config(github_config())
}

/// Default stacking settings
pub fn settings() -> StackSettings {
    StackSettings::default()
}

/// Context for one `pull_request.<action>` event
pub fn event_ctx<'a>(
    platform: &'a MockPlatformService,
    settings: &'a StackSettings,
    action: &str,
) -> EventContext<'a> {
    EventContext::new(platform, settings, EventIdentity::new("pull_request", action))
}

/// Open PR with the given body and base; head SHA is `head-<number>`
pub fn make_pr(number: u64, body: &str, base: &str) -> PullRequest {
    PullRequest {
        number,
        body: body.to_string(),
        base_ref: base.to_string(),
        head_sha: format!("head-{number}"),
        state: PrState::Open,
        labels: Vec::new(),
    }
}

/// Event for `pr` in the test repository (default branch `main`)
pub fn make_event(action: PrAction, pr: PullRequest, previous_body: Option<&str>) -> PullRequestEvent {
    PullRequestEvent {
        repo: RepoId::new("octo", "widgets"),
        default_branch: "main".to_string(),
        action,
        pull_request: pr,
        previous_body: previous_body.map(ToString::to_string),
    }
}
