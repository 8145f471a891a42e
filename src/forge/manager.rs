//! Manager that wraps forge implementations
use log::*;

use crate::{
    Result,
    forge::{
        config::RemoteConfig,
        request::{CreateReleaseRequest, ReleaseHandle, UploadArtifactRequest},
        traits::Forge,
    },
    version::ReleaseRecord,
};

pub struct ForgeManager {
    forge: Box<dyn Forge>,
    remote_config: RemoteConfig,
}

impl ForgeManager {
    pub fn new(forge: Box<dyn Forge>) -> Self {
        let remote_config = forge.remote_config();
        Self {
            forge,
            remote_config,
        }
    }

    pub fn remote_config(&self) -> RemoteConfig {
        self.remote_config.clone()
    }

    /// Collect up to `pages` pages of releases, stopping at the first short
    /// page.
    pub async fn list_releases(
        &self,
        pages: u32,
        per_page: u8,
    ) -> Result<Vec<ReleaseRecord>> {
        let mut releases = vec![];

        for page in 1..=pages.max(1) {
            debug!("listing releases page {page} ({per_page} per page)");
            let batch = self.forge.list_releases(page, per_page).await?;
            let count = batch.len();
            releases.extend(batch);

            if count < per_page as usize {
                break;
            }
        }

        info!("found {} releases", releases.len());

        Ok(releases)
    }

    pub async fn create_release(
        &self,
        req: CreateReleaseRequest,
    ) -> Result<ReleaseHandle> {
        if self.remote_config.dry_run {
            warn!("dry_run: would create release: req: {:#?}", req);
            return Ok(ReleaseHandle {
                id: 0,
                html_url: format!(
                    "{}/{}",
                    self.remote_config.release_link_base_url(),
                    req.tag
                ),
                upload_url: "".into(),
            });
        }

        self.forge.create_release(req).await
    }

    pub async fn upload_artifact(
        &self,
        req: UploadArtifactRequest,
    ) -> Result<()> {
        if self.remote_config.dry_run {
            warn!(
                "dry_run: would upload artifact: {} as {}",
                req.local_path.display(),
                req.display_name
            );
            return Ok(());
        }

        self.forge.upload_artifact(req).await
    }
}
