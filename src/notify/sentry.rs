use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::*;
use reqwest::{
    Client, Url,
    header::{HeaderMap, HeaderValue},
};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

use crate::{
    Result,
    config::SentryConfig,
    error::ReleaseError,
    notify::{Notifier, ReleaseSummary},
};

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct CreateSentryRelease {
    pub version: String,
    pub projects: Vec<String>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct FinalizeSentryRelease {
    #[serde(rename = "dateReleased")]
    pub date_released: String,
}

/// Creates and finalizes a Sentry release so uploaded source maps resolve
/// against the published version.
pub struct SentryReleases {
    config: SentryConfig,
    base_url: Url,
    client: Client,
}

impl SentryReleases {
    pub fn new(config: SentryConfig, token: SecretString) -> Result<Self> {
        let mut headers = HeaderMap::new();

        let token_value = HeaderValue::from_str(
            format!("Bearer {}", token.expose_secret()).as_str(),
        )?;

        headers.append("Authorization", token_value);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        let base_url = organization_releases_url(&config)?;

        Ok(Self {
            config,
            base_url,
            client,
        })
    }

    pub fn release_name(&self, version: &str) -> String {
        format!("{}{version}", self.config.release_prefix)
    }

    async fn create(&self, name: &str) -> Result<()> {
        let request = self
            .client
            .post(self.base_url.clone())
            .json(&CreateSentryRelease {
                version: name.to_string(),
                projects: self.config.projects.clone(),
            })
            .build()?;

        self.client
            .execute(request)
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|err| {
                ReleaseError::notification(format!(
                    "failed to create sentry release {name}: {err}"
                ))
            })?;

        Ok(())
    }

    async fn finalize(
        &self,
        name: &str,
        released: DateTime<Utc>,
    ) -> Result<()> {
        let url = self.base_url.join(&format!("{name}/"))?;

        let request = self
            .client
            .put(url)
            .json(&FinalizeSentryRelease {
                date_released: released.to_rfc3339(),
            })
            .build()?;

        self.client
            .execute(request)
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|err| {
                ReleaseError::notification(format!(
                    "failed to finalize sentry release {name}: {err}"
                ))
            })?;

        Ok(())
    }
}

/// `{url}/api/0/organizations/{org}/releases/`
pub fn organization_releases_url(config: &SentryConfig) -> Result<Url> {
    let base = format!(
        "{}/api/0/organizations/{}/releases/",
        config.url.trim_end_matches('/'),
        config.org
    );

    Url::parse(&base).map_err(|err| {
        ReleaseError::notification(format!("invalid sentry url {base}: {err}"))
    })
}

#[async_trait]
impl Notifier for SentryReleases {
    fn name(&self) -> String {
        "sentry".into()
    }

    async fn notify(&self, release: &ReleaseSummary) -> Result<()> {
        let name = self.release_name(&release.version);

        debug!("creating sentry release {name}");
        self.create(&name).await?;
        self.finalize(&name, Utc::now()).await?;

        info!("finalized sentry release {name}");

        Ok(())
    }
}
