//! Shared command context for CLI commands
//!
//! Extracts the setup shared by serve, replay and inspect.

use stackbot::auth::{GitHubAuthConfig, get_github_auth};
use stackbot::config::{Config, load_config};
use stackbot::error::Result;
use stackbot::platform::GitHubProvider;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Shared context for CLI commands that talk to GitHub
pub struct CommandContext {
    /// Loaded configuration
    pub config: Config,
    /// Resolved credentials
    pub auth: GitHubAuthConfig,
}

impl CommandContext {
    /// Load config and resolve credentials
    pub async fn new(config_path: Option<&Path>, token: Option<String>) -> Result<Self> {
        let config = load_config(config_path)?;
        let auth = get_github_auth(token, config.github.host.as_deref()).await?;
        debug!(source = ?auth.source, host = ?config.github.host, "resolved GitHub credentials");
        Ok(Self { config, auth })
    }

    /// Platform provider for these credentials
    pub fn provider(&self) -> Arc<GitHubProvider> {
        Arc::new(GitHubProvider::new(
            self.auth.token.clone(),
            self.config.github.host.clone(),
        ))
    }
}
