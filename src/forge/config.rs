//! Configuration for the GitHub connection.
use secrecy::SecretString;

/// Default GitHub API endpoint.
pub const DEFAULT_API_BASE_URL: &str = "https://api.github.com";
/// User agent sent with API requests.
pub const USER_AGENT: &str = "cms-release";

/// Remote repository connection configuration for authenticating and
/// interacting with GitHub.
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    /// Remote forge host (e.g., "github.com").
    pub host: String,
    /// URL scheme (http or https).
    pub scheme: String,
    /// Repository owner.
    pub owner: String,
    /// Repository name.
    pub repo: String,
    /// REST API base URL.
    pub api_base_url: String,
    /// Access token for authentication.
    pub token: SecretString,
    /// Log mutating calls instead of performing them.
    pub dry_run: bool,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            host: "".to_string(),
            scheme: "".to_string(),
            owner: "".to_string(),
            repo: "".to_string(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            token: SecretString::from("".to_string()),
            dry_run: false,
        }
    }
}

impl RemoteConfig {
    /// Web URL of the repository.
    pub fn repo_url(&self) -> String {
        format!("{}://{}/{}/{}", self.scheme, self.host, self.owner, self.repo)
    }

    /// Base URL for release links.
    pub fn release_link_base_url(&self) -> String {
        format!("{}/releases/tag", self.repo_url())
    }
}
