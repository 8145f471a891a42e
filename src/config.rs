//! Configuration loading and parsing for `release.toml` files.
//!
//! Every field is optional. Defaults describe the CMS repository the tool
//! was built for, so a checkout without a config file still releases.
use log::*;
use semver::Version;
use serde::Deserialize;
use std::{fs, path::Path};

use crate::{changelog::DEFAULT_EMOJI_ORDER, error::Result};

/// Default configuration filename.
pub const DEFAULT_CONFIG_FILE: &str = "release.toml";
/// Default changelog filename, relative to the base path.
pub const DEFAULT_CHANGELOG_FILE: &str = "changelog.md";
/// Releases returned per page when listing releases.
pub const DEFAULT_PAGE_SIZE: u8 = 100;
/// First major released from the single monorepo.
pub const MONOREPO_SINCE_MAJOR: u64 = 5;
/// Appended to every release body unless `footer` is overridden.
pub const DEFAULT_FOOTER: &str = "🪄 Love open source? We're hiring \
    [JavaScript Engineers](https://careers.ghost.org/) to work on Ghost \
    full-time";

/// Where the changelog history comes from.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Layout {
    /// Everything lives in the primary repository.
    Monorepo,
    /// A second repository is checked out inside the primary one.
    Dual {
        /// Repository name under the same owner.
        secondary_repo: String,
        /// Checkout path of the secondary repository relative to the product
        /// directory.
        secondary_folder: String,
    },
}

impl Default for Layout {
    fn default() -> Self {
        Self::Dual {
            secondary_repo: "Admin".into(),
            secondary_folder: "core/client".into(),
        }
    }
}

/// Changelog read-back settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ChangelogConfig {
    /// Only user-facing (emoji prefixed) commits reach release notes.
    pub filter_emoji_commits: bool,
    /// Emoji markers in display order.
    pub emoji_order: Vec<String>,
}

impl Default for ChangelogConfig {
    fn default() -> Self {
        Self {
            filter_emoji_commits: true,
            emoji_order: DEFAULT_EMOJI_ORDER
                .iter()
                .map(|e| e.to_string())
                .collect(),
        }
    }
}

/// Chat webhook settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    /// Username the message is posted as.
    pub username: String,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            username: "Ghost".into(),
        }
    }
}

/// Source-map release settings for Sentry.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SentryConfig {
    pub url: String,
    pub org: String,
    pub projects: Vec<String>,
    /// Prepended to the version to form the Sentry release name.
    pub release_prefix: String,
}

impl Default for SentryConfig {
    fn default() -> Self {
        Self {
            url: "https://sentry.io".into(),
            org: "ghost-foundation".into(),
            projects: vec!["ghost".into()],
            release_prefix: "ghost@".into(),
        }
    }
}

/// Root configuration structure for `release.toml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// GitHub owner of the product repository.
    pub owner: String,
    /// GitHub name of the product repository.
    pub repo: String,
    /// Human readable product name used in messages.
    pub product_name: String,
    /// `name` of the product's package manifest.
    pub package_name: String,
    /// Product directory inside a workspace root.
    pub core_path: String,
    /// Marker of sub-package release names to ignore.
    pub namespace_marker: String,
    pub changelog_file: String,
    /// Number of release pages to search for the previous version.
    pub release_pages: u32,
    pub draft: bool,
    pub prerelease: bool,
    /// Tera template appended to the release body. Receives `version`,
    /// `tag` and `previous_tag`.
    pub footer: Option<String>,
    /// Changelog layout. Picked from the version when not set.
    pub layout: Option<Layout>,
    pub changelog: ChangelogConfig,
    pub notify: NotifyConfig,
    pub sentry: SentryConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            owner: "TryGhost".into(),
            repo: "Ghost".into(),
            product_name: "Ghost".into(),
            package_name: "ghost".into(),
            core_path: "ghost/core".into(),
            namespace_marker: "@tryghost".into(),
            changelog_file: DEFAULT_CHANGELOG_FILE.into(),
            release_pages: 1,
            draft: false,
            prerelease: false,
            footer: Some(DEFAULT_FOOTER.into()),
            layout: None,
            changelog: ChangelogConfig::default(),
            notify: NotifyConfig::default(),
            sentry: SentryConfig::default(),
        }
    }
}

impl Config {
    /// Load `release.toml` from `base_path`, falling back to defaults.
    pub fn load(base_path: &Path) -> Result<Self> {
        let file = base_path.join(DEFAULT_CONFIG_FILE);

        if !file.exists() {
            debug!("no {} found: using defaults", file.display());
            return Ok(Self::default());
        }

        info!("loading configuration from {}", file.display());
        let content = fs::read_to_string(&file)?;
        let config: Config = toml::from_str(&content)?;

        Ok(config)
    }

    /// The changelog layout for `version`.
    pub fn layout_for(&self, version: &Version) -> Layout {
        if let Some(layout) = self.layout.clone() {
            return layout;
        }

        if version.major >= MONOREPO_SINCE_MAJOR {
            Layout::Monorepo
        } else {
            Layout::default()
        }
    }
}
