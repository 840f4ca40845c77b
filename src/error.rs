//! Error types for stackbot

use thiserror::Error;

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced while talking to the hosting platform or handling events
#[derive(Debug, Error)]
pub enum Error {
    /// The requested resource does not exist (ref, label, protection rule)
    #[error("not found: {0}")]
    NotFound(String),

    /// A create call hit a resource that already exists
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// GitHub API call failed
    #[error("GitHub API error: {0}")]
    GitHubApi(String),

    /// Generic platform failure (used by non-GitHub implementations and tests)
    #[error("platform error: {0}")]
    Platform(String),

    /// Could not obtain an API token
    #[error("authentication error: {0}")]
    Auth(String),

    /// Invalid or unreadable configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// Webhook payload did not have the expected shape
    #[error("invalid webhook payload: {0}")]
    Payload(String),

    /// I/O failure
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this error is an expected absence rather than a real failure.
    ///
    /// Absence (missing ref, missing label, unconfigured protection) is a
    /// normal outcome for the best-effort operations and is never logged as
    /// an error.
    pub const fn is_absence(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Classify a failed API response by HTTP status and message.
    ///
    /// GitHub reports a missing git ref as 422 "Reference does not exist"
    /// rather than 404, so both count as absence.
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            404 => Self::NotFound(message),
            422 if message.contains("does not exist") => Self::NotFound(message),
            422 if message.contains("already exists") => Self::AlreadyExists(message),
            _ => Self::GitHubApi(format!("{status}: {message}")),
        }
    }
}

impl From<octocrab::Error> for Error {
    fn from(err: octocrab::Error) -> Self {
        if let octocrab::Error::GitHub { source, .. } = &err {
            return Self::from_status(source.status_code.as_u16(), source.message.clone());
        }
        Self::GitHubApi(err.to_string())
    }
}

/// Extension for collapsing expected absence into `None`.
pub trait AbsenceExt<T> {
    /// Map `NotFound` to `Ok(None)`, keep every other error.
    fn absent_ok(self) -> Result<Option<T>>;
}

impl<T> AbsenceExt<T> for Result<T> {
    fn absent_ok(self) -> Result<Option<T>> {
        match self {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.is_absence() => Ok(None),
            Err(e) => Err(e),
        }
    }
}
