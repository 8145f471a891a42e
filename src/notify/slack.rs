use async_trait::async_trait;
use log::*;
use reqwest::{Client, Url};
use serde::Serialize;

use crate::{
    Result,
    error::ReleaseError,
    notify::{Notifier, ReleaseSummary},
};

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct SlackText {
    #[serde(rename = "type")]
    pub kind: String,
    pub text: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct SlackBlock {
    #[serde(rename = "type")]
    pub kind: String,
    pub text: SlackText,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct SlackMessage {
    pub username: String,
    pub blocks: Vec<SlackBlock>,
}

impl SlackMessage {
    /// Single markdown section announcing `release`.
    pub fn for_release(username: &str, release: &ReleaseSummary) -> Self {
        let text = format!(
            "👻 *{} v{} is loose!* - {}\n\n{}",
            release.product_name,
            release.version,
            release.release_url,
            release.changelog.join("\n")
        );

        Self {
            username: username.to_string(),
            blocks: vec![SlackBlock {
                kind: "section".into(),
                text: SlackText {
                    kind: "mrkdwn".into(),
                    text,
                },
            }],
        }
    }
}

/// Posts release announcements to a Slack incoming webhook.
pub struct SlackWebhook {
    url: Url,
    username: String,
    client: Client,
}

impl SlackWebhook {
    pub fn new(url: &str, username: &str) -> Result<Self> {
        let url = Url::parse(url).map_err(|err| {
            ReleaseError::notification(format!("invalid webhook url: {err}"))
        })?;

        Ok(Self {
            url,
            username: username.to_string(),
            client: Client::new(),
        })
    }
}

#[async_trait]
impl Notifier for SlackWebhook {
    fn name(&self) -> String {
        "slack".into()
    }

    async fn notify(&self, release: &ReleaseSummary) -> Result<()> {
        let message = SlackMessage::for_release(&self.username, release);

        debug!("posting release message to webhook");

        self.client
            .post(self.url.clone())
            .json(&message)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|err| {
                ReleaseError::notification(format!("webhook failed: {err}"))
            })?;

        info!("sent release notification for {}", release.tag);

        Ok(())
    }
}
