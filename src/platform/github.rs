//! GitHub platform service implementation

use crate::error::{Error, Result};
use crate::platform::{PlatformProvider, PlatformService};
use crate::types::{
    CheckConclusion, CheckRun, CheckRunReport, CheckStatus, PlatformConfig, PrState,
    ProtectionPolicy, PullRequest, RepoId,
};
use async_trait::async_trait;
use octocrab::Octocrab;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::debug;

/// Public GitHub API endpoint
const GITHUB_API: &str = "https://api.github.com";

/// API base URL for a host (`None` for github.com)
fn api_base_for(host: Option<&str>) -> String {
    host.map_or_else(|| GITHUB_API.to_string(), |h| format!("https://{h}/api/v3"))
}

// Raw response types for endpoints called over plain HTTP

#[derive(Deserialize)]
struct ApiErrorBody {
    message: String,
}

#[derive(Deserialize)]
struct RefResponse {
    object: RefObject,
}

#[derive(Deserialize)]
struct RefObject {
    sha: String,
}

#[derive(Deserialize)]
struct CheckRunsResponse {
    check_runs: Vec<RawCheckRun>,
}

#[derive(Deserialize)]
struct RawCheckRun {
    id: u64,
    name: String,
    head_sha: String,
    status: String,
    conclusion: Option<String>,
    #[serde(default)]
    pull_requests: Vec<RawCheckRunPr>,
}

#[derive(Deserialize)]
struct RawCheckRunPr {
    number: u64,
}

impl From<RawCheckRun> for CheckRun {
    fn from(run: RawCheckRun) -> Self {
        let status = match run.status.as_str() {
            "completed" => CheckStatus::Completed,
            "in_progress" => CheckStatus::InProgress,
            // queued, waiting, requested, pending
            _ => CheckStatus::Queued,
        };
        let conclusion = match run.conclusion.as_deref() {
            Some("success") => Some(CheckConclusion::Success),
            Some(_) => Some(CheckConclusion::Failure),
            None => None,
        };
        Self {
            id: run.id,
            name: run.name,
            head_sha: run.head_sha,
            status,
            conclusion,
            pull_requests: run.pull_requests.into_iter().map(|p| p.number).collect(),
        }
    }
}

/// GitHub service using octocrab
///
/// Pull requests, labels and search go through octocrab. Git refs, branch
/// protection and check runs are plain REST calls so their error statuses can
/// be classified precisely.
pub struct GitHubService {
    client: Octocrab,
    config: PlatformConfig,
    /// Token for raw HTTP requests
    token: String,
    /// HTTP client for raw requests
    http_client: Client,
    /// API base URL for raw requests
    api_base: String,
}

impl GitHubService {
    /// Create a new GitHub service
    pub fn new(token: &str, owner: String, repo: String, host: Option<String>) -> Result<Self> {
        let api_base = api_base_for(host.as_deref());
        let mut service = Self::with_api_base(token, owner, repo, &api_base)?;
        service.config.host = host;
        Ok(service)
    }

    /// Create a service against an explicit API base URL
    pub fn with_api_base(token: &str, owner: String, repo: String, api_base: &str) -> Result<Self> {
        let api_base = api_base.trim_end_matches('/').to_string();

        let client = Octocrab::builder()
            .personal_token(token.to_string())
            .base_uri(api_base.as_str())
            .map_err(|e| Error::GitHubApi(e.to_string()))?
            .build()
            .map_err(|e| Error::GitHubApi(e.to_string()))?;

        let http_client = Client::builder()
            .user_agent("stackbot")
            .build()
            .map_err(|e| Error::GitHubApi(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            config: PlatformConfig {
                owner,
                repo,
                host: None,
            },
            token: token.to_string(),
            http_client,
            api_base,
        })
    }

    fn repo_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/{path}",
            self.api_base, self.config.owner, self.config.repo
        )
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http_client
            .request(method, self.repo_url(path))
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28")
    }

    /// Send a raw request, turning non-success statuses into classified errors
    async fn send(&self, builder: RequestBuilder, what: &str) -> Result<Response> {
        let response = builder
            .send()
            .await
            .map_err(|e| Error::GitHubApi(format!("{what}: {e}")))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response
            .json::<ApiErrorBody>()
            .await
            .map_or_else(|_| status.to_string(), |b| b.message);
        debug!(%status, what, message = %message, "GitHub request failed");
        Err(Error::from_status(status.as_u16(), message))
    }

    fn protection_path(branch: &str) -> String {
        format!("branches/{}/protection", urlencoding::encode(branch))
    }
}

/// Helper to convert an octocrab PR to our `PullRequest` type
fn pr_from_octocrab(pr: &octocrab::models::pulls::PullRequest) -> PullRequest {
    let state = match pr.state {
        Some(octocrab::models::IssueState::Open) => PrState::Open,
        Some(octocrab::models::IssueState::Closed) if pr.merged_at.is_some() => PrState::Merged,
        // IssueState is non-exhaustive, so use wildcard for Closed and any future variants
        Some(_) | None => PrState::Closed,
    };

    PullRequest {
        number: pr.number,
        body: pr.body.clone().unwrap_or_default(),
        base_ref: pr.base.ref_field.clone(),
        head_sha: pr.head.sha.clone(),
        state,
        labels: pr
            .labels
            .as_ref()
            .map(|labels| labels.iter().map(|l| l.name.clone()).collect())
            .unwrap_or_default(),
    }
}

fn check_run_body(report: &CheckRunReport) -> Value {
    json!({
        "name": report.name,
        "status": report.status,
        "conclusion": report.conclusion,
        "completed_at": chrono::Utc::now().to_rfc3339(),
        "output": {
            "title": report.output.title,
            "summary": report.output.summary,
        },
    })
}

#[async_trait]
impl PlatformService for GitHubService {
    fn config(&self) -> &PlatformConfig {
        &self.config
    }

    async fn get_pull_request(&self, pr_number: u64) -> Result<PullRequest> {
        debug!(pr_number, "getting PR");
        let pr = self
            .client
            .pulls(&self.config.owner, &self.config.repo)
            .get(pr_number)
            .await?;

        let result = pr_from_octocrab(&pr);
        debug!(pr_number, state = %result.state, "got PR");
        Ok(result)
    }

    async fn update_pr_base(&self, pr_number: u64, new_base: &str) -> Result<()> {
        debug!(pr_number, new_base, "updating PR base");
        self.client
            .pulls(&self.config.owner, &self.config.repo)
            .update(pr_number)
            .base(new_base)
            .send()
            .await?;

        debug!(pr_number, "updated PR base");
        Ok(())
    }

    async fn search_open_prs_by_base(
        &self,
        base: &str,
        page: u32,
        per_page: u8,
    ) -> Result<Vec<u64>> {
        let query = format!(
            "is:pr state:open repo:{}/{} base:{base}",
            self.config.owner, self.config.repo
        );
        debug!(query = %query, page, "searching PRs");

        let results = self
            .client
            .search()
            .issues_and_pull_requests(&query)
            .per_page(per_page)
            .page(page)
            .send()
            .await?;

        let numbers: Vec<u64> = results.items.iter().map(|i| i.number).collect();
        debug!(page, count = numbers.len(), "searched PRs");
        Ok(numbers)
    }

    async fn get_branch_sha(&self, branch: &str) -> Result<String> {
        let response = self
            .send(
                self.request(Method::GET, &format!("git/ref/heads/{branch}")),
                "get ref",
            )
            .await?;

        let reference: RefResponse = response
            .json()
            .await
            .map_err(|e| Error::GitHubApi(format!("Failed to parse ref: {e}")))?;
        Ok(reference.object.sha)
    }

    async fn create_branch(&self, branch: &str, sha: &str) -> Result<()> {
        debug!(branch, sha, "creating branch");
        let body = json!({ "ref": format!("refs/heads/{branch}"), "sha": sha });
        self.send(
            self.request(Method::POST, "git/refs").json(&body),
            "create ref",
        )
        .await?;
        Ok(())
    }

    async fn update_branch(&self, branch: &str, sha: &str, force: bool) -> Result<()> {
        debug!(branch, sha, force, "updating branch");
        let body = json!({ "sha": sha, "force": force });
        self.send(
            self.request(Method::PATCH, &format!("git/refs/heads/{branch}"))
                .json(&body),
            "update ref",
        )
        .await?;
        Ok(())
    }

    async fn delete_branch(&self, branch: &str) -> Result<()> {
        debug!(branch, "deleting branch");
        self.send(
            self.request(Method::DELETE, &format!("git/refs/heads/{branch}")),
            "delete ref",
        )
        .await?;
        Ok(())
    }

    async fn set_branch_protection(&self, branch: &str, policy: &ProtectionPolicy) -> Result<()> {
        debug!(branch, "setting branch protection");
        let body = json!({
            "required_status_checks": {
                "strict": policy.strict,
                "contexts": policy.required_checks,
            },
            "enforce_admins": policy.enforce_admins,
            "required_pull_request_reviews": null,
            "restrictions": null,
            "allow_force_pushes": policy.allow_force_pushes,
        });
        self.send(
            self.request(Method::PUT, &Self::protection_path(branch))
                .json(&body),
            "update branch protection",
        )
        .await?;
        Ok(())
    }

    async fn remove_branch_protection(&self, branch: &str) -> Result<()> {
        debug!(branch, "removing branch protection");
        self.send(
            self.request(Method::DELETE, &Self::protection_path(branch)),
            "delete branch protection",
        )
        .await?;
        Ok(())
    }

    async fn list_check_runs(&self, head_sha: &str, name: &str) -> Result<Vec<CheckRun>> {
        let response = self
            .send(
                self.request(Method::GET, &format!("commits/{head_sha}/check-runs"))
                    .query(&[("check_name", name), ("filter", "latest")]),
                "list check runs",
            )
            .await?;

        let runs: CheckRunsResponse = response
            .json()
            .await
            .map_err(|e| Error::GitHubApi(format!("Failed to parse check runs: {e}")))?;

        debug!(head_sha, count = runs.check_runs.len(), "listed check runs");
        Ok(runs.check_runs.into_iter().map(CheckRun::from).collect())
    }

    async fn create_check_run(&self, head_sha: &str, report: &CheckRunReport) -> Result<()> {
        debug!(head_sha, conclusion = ?report.conclusion, "creating check run");
        let mut body = check_run_body(report);
        body["head_sha"] = json!(head_sha);
        self.send(
            self.request(Method::POST, "check-runs").json(&body),
            "create check run",
        )
        .await?;
        Ok(())
    }

    async fn update_check_run(&self, check_run_id: u64, report: &CheckRunReport) -> Result<()> {
        debug!(check_run_id, conclusion = ?report.conclusion, "updating check run");
        self.send(
            self.request(Method::PATCH, &format!("check-runs/{check_run_id}"))
                .json(&check_run_body(report)),
            "update check run",
        )
        .await?;
        Ok(())
    }

    async fn add_label(&self, pr_number: u64, label: &str) -> Result<()> {
        debug!(pr_number, label, "adding label");
        self.client
            .issues(&self.config.owner, &self.config.repo)
            .add_labels(pr_number, &[label.to_string()])
            .await?;
        Ok(())
    }

    async fn remove_label(&self, pr_number: u64, label: &str) -> Result<()> {
        debug!(pr_number, label, "removing label");
        self.client
            .issues(&self.config.owner, &self.config.repo)
            .remove_label(pr_number, label)
            .await?;
        Ok(())
    }
}

/// Creates a [`GitHubService`] per repository from one token
pub struct GitHubProvider {
    token: String,
    host: Option<String>,
    api_base: String,
}

impl GitHubProvider {
    /// Provider for github.com or a GitHub Enterprise host
    pub fn new(token: impl Into<String>, host: Option<String>) -> Self {
        let api_base = api_base_for(host.as_deref());
        Self {
            token: token.into(),
            host,
            api_base,
        }
    }
}

impl PlatformProvider for GitHubProvider {
    fn for_repo(&self, repo: &RepoId) -> Result<Arc<dyn PlatformService>> {
        let mut service = GitHubService::with_api_base(
            &self.token,
            repo.owner.clone(),
            repo.name.clone(),
            &self.api_base,
        )?;
        service.config.host.clone_from(&self.host);
        Ok(Arc::new(service))
    }
}
