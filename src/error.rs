//! Error taxonomy for cms-release runs.
//!
//! Resolution, fetch and publish failures abort the run. Notification
//! failures are represented here too, but the pipeline logs and drops them.

use thiserror::Error;

/// Main error type for release operations.
#[derive(Error, Debug)]
pub enum ReleaseError {
    // Cli args errors
    #[error("Invalid arguments: {0}")]
    InvalidArgs(String),

    // Configuration errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to load package manifest: {0}")]
    Manifest(String),

    // Core pipeline errors
    #[error("No previous version found below {current}")]
    NoPreviousVersion { current: String },

    #[error("Failed to fetch history: {0}")]
    Fetch(String),

    #[error("Failed to publish release: {0}")]
    Publish(String),

    #[error("Notification failed: {0}")]
    Notification(String),

    // Version/parsing errors - automatic conversions via #[from]
    #[error("Invalid version format: {0}")]
    InvalidVersion(#[from] semver::Error),

    #[error("Template rendering failed: {0}")]
    TemplateError(#[from] tera::Error),

    #[error("TOML parse error: {0}")]
    TomlParseError(#[from] toml::de::Error),

    #[error("Git operation failed: {0}")]
    GitError(#[from] git2::Error),

    #[error("Git URL parse error: {0}")]
    GitUrlError(#[from] git_url_parse::GitUrlParseError),

    #[error("URL parse error: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("Regular expression error: {0}")]
    RegexError(#[from] regex::Error),

    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] log::SetLoggerError),

    // Network/API errors
    #[error("Network request failed: {0}")]
    NetworkError(String),

    #[error("API authentication failed: {0}")]
    AuthenticationError(String),

    #[error("API rate limit exceeded")]
    RateLimitExceeded,

    // Generic wrapper for other errors
    #[error(transparent)]
    Other(#[from] color_eyre::Report),
}

/// Result type alias using ReleaseError
pub type Result<T> = std::result::Result<T, ReleaseError>;

impl ReleaseError {
    /// Create a fetch error with context
    pub fn fetch(msg: impl Into<String>) -> Self {
        Self::Fetch(msg.into())
    }

    /// Create a publish error with context
    pub fn publish(msg: impl Into<String>) -> Self {
        Self::Publish(msg.into())
    }

    /// Create a notification error with context
    pub fn notification(msg: impl Into<String>) -> Self {
        Self::Notification(msg.into())
    }

    /// Create an invalid config error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create a manifest error
    pub fn manifest(msg: impl Into<String>) -> Self {
        Self::Manifest(msg.into())
    }

    /// Create an error for a run with no usable previous release
    pub fn no_previous_version(current: impl Into<String>) -> Self {
        Self::NoPreviousVersion {
            current: current.into(),
        }
    }
}

// Generic I/O errors are wrapped in the Other variant
impl From<std::io::Error> for ReleaseError {
    fn from(err: std::io::Error) -> Self {
        Self::Other(color_eyre::Report::from(err))
    }
}

// Implement From for reqwest errors (network/API)
impl From<reqwest::Error> for ReleaseError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_status()
            && let Some(status) = err.status()
        {
            return match status.as_u16() {
                401 | 403 => Self::AuthenticationError(err.to_string()),
                429 => Self::RateLimitExceeded,
                _ => Self::NetworkError(err.to_string()),
            };
        }

        Self::NetworkError(err.to_string())
    }
}

// Implement From for reqwest header errors (needs custom message)
impl From<reqwest::header::InvalidHeaderValue> for ReleaseError {
    fn from(err: reqwest::header::InvalidHeaderValue) -> Self {
        Self::AuthenticationError(format!("Invalid header value: {}", err))
    }
}

// Implement From for octocrab errors (GitHub API)
impl From<octocrab::Error> for ReleaseError {
    fn from(err: octocrab::Error) -> Self {
        match &err {
            octocrab::Error::GitHub { source, .. }
                if source.message.contains("rate limit") =>
            {
                Self::RateLimitExceeded
            }
            _ => Self::NetworkError(format!("GitHub API error: {}", err)),
        }
    }
}
