//! Best-effort release notifications.
//!
//! Notifiers run after a release is published. Their failures are reported
//! as [`ReleaseError::Notification`](crate::error::ReleaseError) and logged
//! by the pipeline without failing the run.
use async_trait::async_trait;

use crate::Result;

/// Sentry source-map release records.
pub mod sentry;

/// Slack incoming webhook.
pub mod slack;

/// What notifiers know about the published release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseSummary {
    pub product_name: String,
    /// Bare version, e.g. `5.2.0`.
    pub version: String,
    /// Tag the release was published under.
    pub tag: String,
    pub release_url: String,
    /// Final changelog entries.
    pub changelog: Vec<String>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Short name used in log output.
    fn name(&self) -> String;
    async fn notify(&self, release: &ReleaseSummary) -> Result<()>;
}
