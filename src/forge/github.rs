//! Implements the Forge trait for Github
use async_trait::async_trait;
use log::*;
use octocrab::Octocrab;
use reqwest::{
    Client, Url,
    header::{CONTENT_TYPE, HeaderMap, HeaderValue},
};
use secrecy::ExposeSecret;
use std::path::Path;

use crate::{
    Result,
    error::ReleaseError,
    forge::{
        config::{RemoteConfig, USER_AGENT},
        request::{CreateReleaseRequest, ReleaseHandle, UploadArtifactRequest},
        traits::Forge,
    },
    version::ReleaseRecord,
};

/// GitHub forge implementation. Release listing and creation go through
/// octocrab; artifact bytes are posted with reqwest to the upload URL
/// returned on creation.
pub struct Github {
    config: RemoteConfig,
    octocrab: Octocrab,
    client: Client,
}

impl Github {
    /// Create Github client with token authentication.
    pub fn new(config: RemoteConfig) -> Result<Self> {
        let token = config.token.expose_secret().to_string();

        let octocrab = Octocrab::builder()
            .personal_token(token.clone())
            .base_uri(config.api_base_url.clone())?
            .build()?;

        let mut headers = HeaderMap::new();

        let token_value =
            HeaderValue::from_str(format!("token {}", token).as_str())?;

        headers.append("Authorization", token_value);

        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            config,
            octocrab,
            client,
        })
    }
}

/// Resolve the upload URL template into the URL for `name`.
pub fn upload_target(upload_url: &str, name: &str) -> Result<Url> {
    let base = match upload_url.find('{') {
        Some(idx) => &upload_url[..idx],
        None => upload_url,
    };

    let mut url = Url::parse(base)?;
    url.query_pairs_mut().append_pair("name", name);

    Ok(url)
}

/// Content type used for an uploaded artifact.
pub fn artifact_content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("zip") => "application/zip",
        Some("gz") | Some("tgz") => "application/gzip",
        Some("json") => "application/json",
        _ => "application/octet-stream",
    }
}

#[async_trait]
impl Forge for Github {
    fn remote_config(&self) -> RemoteConfig {
        self.config.clone()
    }

    async fn list_releases(
        &self,
        page: u32,
        per_page: u8,
    ) -> Result<Vec<ReleaseRecord>> {
        let releases = self
            .octocrab
            .repos(&self.config.owner, &self.config.repo)
            .releases()
            .list()
            .per_page(per_page)
            .page(page)
            .send()
            .await
            .map_err(|err| {
                ReleaseError::fetch(format!("failed to list releases: {err}"))
            })?;

        Ok(releases
            .items
            .into_iter()
            .map(|release| {
                ReleaseRecord::new(
                    release.name.as_deref(),
                    &release.tag_name,
                    release.prerelease,
                )
            })
            .collect())
    }

    async fn create_release(
        &self,
        req: CreateReleaseRequest,
    ) -> Result<ReleaseHandle> {
        let release = self
            .octocrab
            .repos(&self.config.owner, &self.config.repo)
            .releases()
            .create(&req.tag)
            .name(&req.title)
            .body(&req.body)
            .draft(req.draft)
            .prerelease(req.prerelease)
            .send()
            .await
            .map_err(|err| {
                ReleaseError::publish(format!(
                    "failed to create release {}: {err}",
                    req.tag
                ))
            })?;

        info!("created release: {}", release.html_url);

        Ok(ReleaseHandle {
            id: release.id.0,
            html_url: release.html_url.to_string(),
            upload_url: release.upload_url,
        })
    }

    async fn upload_artifact(&self, req: UploadArtifactRequest) -> Result<()> {
        let url = upload_target(&req.handle.upload_url, &req.display_name)?;

        let content = tokio::fs::read(&req.local_path).await.map_err(|err| {
            ReleaseError::publish(format!(
                "failed to read artifact {}: {err}",
                req.local_path.display()
            ))
        })?;

        debug!(
            "uploading {} bytes from {} to {url}",
            content.len(),
            req.local_path.display()
        );

        let request = self
            .client
            .post(url)
            .header(CONTENT_TYPE, artifact_content_type(&req.local_path))
            .body(content)
            .build()?;

        self.client
            .execute(request)
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|err| {
                ReleaseError::publish(format!(
                    "failed to upload {}: {err}",
                    req.display_name
                ))
            })?;

        info!("uploaded artifact: {}", req.display_name);

        Ok(())
    }
}
