//! Configuration loaded from `<config_dir>/stackbot/config.toml`.
//!
//! Every field has a default, so a missing file or a partial file is fine.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Directory name for stackbot within the user config dir.
const CONFIG_DIR: &str = "stackbot";

/// Filename for the config file.
const CONFIG_FILE: &str = "config.toml";

/// Default prefix for shadow branches.
pub const DEFAULT_BRANCH_PREFIX: &str = "stackbot/pr-";

/// Default check-run name.
pub const DEFAULT_CHECK_NAME: &str = "stacked-dependencies";

/// Default advisory label.
pub const DEFAULT_LABEL: &str = "stacked";

/// Default page size for the cascade search.
pub const DEFAULT_SEARCH_PAGE_SIZE: u8 = 100;

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Stacking identifiers and behaviour
    pub stack: StackSettings,
    /// GitHub connection settings
    pub github: GitHubSettings,
    /// Webhook server settings
    pub server: ServerSettings,
}

/// Identifiers shared by every component
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StackSettings {
    /// Shadow branch prefix; the PR number is appended
    pub branch_prefix: String,
    /// Name of the dependency-status check run
    pub check_name: String,
    /// Advisory label present while a PR is waiting on its dependency
    pub label: String,
    /// Page size used when searching for dependents
    pub search_page_size: u8,
    /// Branch to revert to on unstack; the repository default when unset
    pub default_branch: Option<String>,
}

impl Default for StackSettings {
    fn default() -> Self {
        Self {
            branch_prefix: DEFAULT_BRANCH_PREFIX.to_string(),
            check_name: DEFAULT_CHECK_NAME.to_string(),
            label: DEFAULT_LABEL.to_string(),
            search_page_size: DEFAULT_SEARCH_PAGE_SIZE,
            default_branch: None,
        }
    }
}

/// GitHub connection settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GitHubSettings {
    /// GitHub Enterprise host (None for github.com)
    pub host: Option<String>,
}

/// Webhook server settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Address to listen on
    pub listen: SocketAddr,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from(([0, 0, 0, 0], 3000)),
        }
    }
}

impl Config {
    /// Check invariants that serde can't express.
    pub fn validate(&self) -> Result<()> {
        if self.stack.branch_prefix.is_empty() {
            return Err(Error::Config("stack.branch_prefix must not be empty".into()));
        }
        if self.stack.check_name.is_empty() {
            return Err(Error::Config("stack.check_name must not be empty".into()));
        }
        if self.stack.label.is_empty() {
            return Err(Error::Config("stack.label must not be empty".into()));
        }
        if self.stack.search_page_size == 0 {
            return Err(Error::Config("stack.search_page_size must be at least 1".into()));
        }
        Ok(())
    }
}

/// Default config file path, if the platform has a config dir.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(CONFIG_DIR).join(CONFIG_FILE))
}

/// Load configuration.
///
/// An explicit path must exist. Without one, the default path is used when
/// present and defaults otherwise.
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    let path = match explicit {
        Some(p) => p.to_path_buf(),
        None => match default_config_path() {
            Some(p) if p.exists() => p,
            _ => return Ok(Config::default()),
        },
    };

    let content = fs::read_to_string(&path)
        .map_err(|e| Error::Config(format!("failed to read {}: {e}", path.display())))?;

    let config: Config = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("failed to parse {}: {e}", path.display())))?;

    config.validate()?;
    Ok(config)
}
