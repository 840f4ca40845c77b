//! Authentication for GitHub
//!
//! Supports an explicit token, environment variables and the `gh` CLI.

use crate::error::{Error, Result};
use tokio::process::Command;
use tracing::debug;

/// Environment variables checked for a token, in order
const TOKEN_ENV_VARS: [&str; 2] = ["GITHUB_TOKEN", "GH_TOKEN"];

/// Source of authentication token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthSource {
    /// Token passed on the command line
    Explicit,
    /// Token from environment variable
    EnvVar,
    /// Token from the `gh` CLI
    Cli,
}

/// Resolved GitHub credentials
#[derive(Clone)]
pub struct GitHubAuthConfig {
    /// API token
    pub token: String,
    /// Where the token came from
    pub source: AuthSource,
}

impl std::fmt::Debug for GitHubAuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubAuthConfig")
            .field("token", &"<redacted>")
            .field("source", &self.source)
            .finish()
    }
}

/// Pick the first non-empty token from `candidates`
fn first_token<I>(candidates: I) -> Option<String>
where
    I: IntoIterator<Item = Option<String>>,
{
    candidates
        .into_iter()
        .flatten()
        .map(|t| t.trim().to_string())
        .find(|t| !t.is_empty())
}

/// Resolve a GitHub token.
///
/// Order: `explicit`, `GITHUB_TOKEN`, `GH_TOKEN`, then `gh auth token`
/// (with `--hostname` for Enterprise hosts).
pub async fn get_github_auth(
    explicit: Option<String>,
    host: Option<&str>,
) -> Result<GitHubAuthConfig> {
    if let Some(token) = first_token([explicit]) {
        return Ok(GitHubAuthConfig {
            token,
            source: AuthSource::Explicit,
        });
    }

    if let Some(token) = first_token(TOKEN_ENV_VARS.map(|v| std::env::var(v).ok())) {
        debug!("using GitHub token from environment");
        return Ok(GitHubAuthConfig {
            token,
            source: AuthSource::EnvVar,
        });
    }

    let mut cmd = Command::new("gh");
    cmd.args(["auth", "token"]);
    if let Some(h) = host {
        cmd.args(["--hostname", h]);
    }

    let output = cmd
        .output()
        .await
        .map_err(|e| Error::Auth(format!("no token in environment and gh is unavailable: {e}")))?;

    if !output.status.success() {
        return Err(Error::Auth(
            "no token in environment and `gh auth token` failed; run `gh auth login` or set GITHUB_TOKEN".to_string(),
        ));
    }

    let token = first_token([Some(String::from_utf8_lossy(&output.stdout).into_owned())])
        .ok_or_else(|| Error::Auth("`gh auth token` returned an empty token".to_string()))?;

    debug!("using GitHub token from gh CLI");
    Ok(GitHubAuthConfig {
        token,
        source: AuthSource::Cli,
    })
}
