//! Traits related to remote git forges
use async_trait::async_trait;

use crate::{
    Result,
    forge::{
        config::RemoteConfig,
        request::{CreateReleaseRequest, ReleaseHandle, UploadArtifactRequest},
    },
    version::ReleaseRecord,
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Forge: Send + Sync {
    fn remote_config(&self) -> RemoteConfig;
    /// One page of releases, most recent first.
    async fn list_releases(
        &self,
        page: u32,
        per_page: u8,
    ) -> Result<Vec<ReleaseRecord>>;
    async fn create_release(
        &self,
        req: CreateReleaseRequest,
    ) -> Result<ReleaseHandle>;
    async fn upload_artifact(&self, req: UploadArtifactRequest) -> Result<()>;
}
