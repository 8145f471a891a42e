//! CLI argument parsing and GitHub remote configuration.
use clap::{Parser, Subcommand};
use git_url_parse::GitUrl;
use secrecy::SecretString;
use std::{env, path::PathBuf};

use crate::{
    config::Config,
    error::{ReleaseError, Result},
    forge::config::{DEFAULT_API_BASE_URL, RemoteConfig},
};

const GITHUB_HOST: &str = "github.com";

/// Global CLI arguments for repository configuration and debugging.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    #[arg(long, env = "GITHUB_WORKSPACE", global = true)]
    /// Checkout to release from. Defaults to the current directory.
    pub base_path: Option<PathBuf>,

    #[arg(long, default_value = "", global = true)]
    /// GitHub repository URL (https://github.com/owner/repo). Defaults to
    /// the owner and repo in release.toml.
    pub github_repo: String,

    #[arg(
        long,
        env = "RELEASE_TOKEN",
        default_value = "",
        hide_env_values = true,
        global = true
    )]
    /// GitHub token used to list and publish releases.
    pub token: String,

    #[arg(long, default_value_t = false, global = true)]
    /// Log mutating GitHub calls instead of performing them.
    pub dry_run: bool,

    #[arg(long, default_value_t = false, global = true)]
    /// Enable debug logging.
    pub debug: bool,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Options only relevant when publishing.
#[derive(clap::Args, Debug, Default, Clone)]
pub struct ReleaseArgs {
    #[arg(long)]
    /// Build artifact to attach to the release.
    pub artifact: Option<PathBuf>,

    #[arg(long)]
    /// Asset name for the artifact. Defaults to its file name.
    pub artifact_name: Option<String>,

    #[arg(long, default_value_t = false)]
    /// Create the release as a draft.
    pub draft: bool,

    #[arg(long, env = "RELEASE_NOTIFICATION_URL")]
    /// Slack incoming webhook to announce the release on.
    pub webhook_url: Option<String>,

    #[arg(long, env = "SENTRY_AUTH_TOKEN", hide_env_values = true)]
    /// Sentry token. When set a source-map release is created.
    pub sentry_auth_token: Option<String>,
}

impl ReleaseArgs {
    /// Webhook URL, ignoring empty values from the environment.
    pub fn webhook_url(&self) -> Option<&str> {
        self.webhook_url.as_deref().filter(|url| !url.is_empty())
    }

    pub fn sentry_auth_token(&self) -> Option<SecretString> {
        self.sentry_auth_token
            .as_deref()
            .filter(|token| !token.is_empty())
            .map(|token| SecretString::from(token.to_string()))
    }
}

/// Release operation subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate the changelog and publish the release.
    Release(ReleaseArgs),

    /// Generate the changelog and print the release notes without
    /// publishing.
    Changelog,
}

impl Args {
    /// Directory the release is built from.
    pub fn base_path(&self) -> Result<PathBuf> {
        match &self.base_path {
            Some(path) if !path.as_os_str().is_empty() => Ok(path.clone()),
            _ => Ok(env::current_dir()?),
        }
    }

    /// Configure remote repository connection from CLI arguments, falling
    /// back to the repository named in the config.
    pub fn get_remote(&self, config: &Config) -> Result<RemoteConfig> {
        if self.token.is_empty() {
            return Err(ReleaseError::InvalidArgs(
                "must set release token (--token or RELEASE_TOKEN)".into(),
            ));
        }

        let mut remote = if self.github_repo.is_empty() {
            RemoteConfig {
                host: GITHUB_HOST.into(),
                scheme: "https".into(),
                owner: config.owner.clone(),
                repo: config.repo.clone(),
                ..Default::default()
            }
        } else {
            parse_github_repo(&self.github_repo)?
        };

        remote.token = SecretString::from(self.token.clone());
        remote.dry_run = self.dry_run;

        Ok(remote)
    }
}

/// Parse a GitHub repository URL into a remote without credentials.
fn parse_github_repo(github_repo: &str) -> Result<RemoteConfig> {
    let parsed = GitUrl::parse(github_repo)?;

    match parsed.scheme {
        git_url_parse::Scheme::Http | git_url_parse::Scheme::Https => {}
        _ => {
            return Err(ReleaseError::InvalidArgs(
                "only http and https schemes are supported for repo urls"
                    .into(),
            ));
        }
    }

    let host = parsed.host.ok_or_else(|| {
        ReleaseError::InvalidArgs(
            "unable to parse host from github repo".into(),
        )
    })?;

    let owner = parsed.owner.ok_or_else(|| {
        ReleaseError::InvalidArgs(
            "unable to parse owner from github repo".into(),
        )
    })?;

    let scheme = parsed.scheme.to_string();

    let api_base_url = if host == GITHUB_HOST {
        DEFAULT_API_BASE_URL.to_string()
    } else {
        format!("{scheme}://{host}/api/v3")
    };

    Ok(RemoteConfig {
        host,
        scheme,
        owner,
        repo: parsed.name,
        api_base_url,
        ..Default::default()
    })
}
