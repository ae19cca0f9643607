use crate::config::GraphAccount;
use crate::content::metadata::truncate_chars;
use crate::error::UploadError;
use crate::models::{EngagementStats, PlatformVariant, RemoteContent, VideoArtifact};
use crate::platform::Platform;
use crate::upload::{Uploader, check};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

const GRAPH: &str = "https://graph.facebook.com/v18.0";
const RUPLOAD: &str = "https://rupload.facebook.com/ig-api-upload/v18.0";
const STATUS_POLLS: u32 = 30;
const POLL_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Deserialize)]
struct IdResp {
    id: String,
}

#[derive(Deserialize)]
struct ContainerStatus {
    #[serde(default)]
    status_code: Option<String>,
}

#[derive(Deserialize)]
struct Permalink {
    #[serde(default)]
    permalink: Option<String>,
}

#[derive(Deserialize)]
struct Insights {
    #[serde(default)]
    data: Vec<Metric>,
}

#[derive(Deserialize)]
struct Metric {
    name: String,
    #[serde(default)]
    values: Vec<MetricValue>,
}

#[derive(Deserialize)]
struct MetricValue {
    #[serde(default)]
    value: i64,
}

fn insights_to_stats(insights: Insights) -> EngagementStats {
    let mut stats = EngagementStats::default();
    for m in insights.data {
        let v = m.values.first().map(|v| v.value).unwrap_or(0);
        match m.name.as_str() {
            "plays" | "views" => stats.views = v,
            "likes" => stats.likes = v,
            "comments" => stats.comments = v,
            "shares" => stats.shares = v,
            _ => {}
        }
    }
    stats
}

/// Graph API Reels publishing: resumable container upload, then publish.
pub struct InstagramUploader {
    http: Client,
    account: GraphAccount,
}

impl InstagramUploader {
    pub fn new(http: Client, account: GraphAccount) -> Self {
        Self { http, account }
    }

    async fn wait_until_ready(&self, container_id: &str) -> Result<(), UploadError> {
        for _ in 0..STATUS_POLLS {
            let resp = self
                .http
                .get(format!("{GRAPH}/{container_id}"))
                .query(&[
                    ("fields", "status_code"),
                    ("access_token", self.account.access_token.as_str()),
                ])
                .send()
                .await?;
            let status: ContainerStatus = check(resp, "container status")
                .await?
                .json()
                .await
                .map_err(|e| UploadError::Api(format!("container status parse failed: {e}")))?;
            match status.status_code.as_deref() {
                Some("FINISHED") => return Ok(()),
                Some("ERROR") | Some("EXPIRED") => {
                    return Err(UploadError::Api("Reel container processing failed".into()));
                }
                _ => tokio::time::sleep(POLL_INTERVAL).await,
            }
        }
        Err(UploadError::Api("Reel container not ready in time".into()))
    }
}

#[async_trait]
impl Uploader for InstagramUploader {
    fn platform(&self) -> Platform {
        Platform::Instagram
    }

    async fn authenticate(&self) -> Result<(), UploadError> {
        let resp = self
            .http
            .get(format!("{GRAPH}/{}", self.account.account_id))
            .query(&[
                ("fields", "id"),
                ("access_token", self.account.access_token.as_str()),
            ])
            .send()
            .await?;
        check(resp, "account lookup").await.map(|_| ())
    }

    async fn upload(
        &self,
        video: &VideoArtifact,
        variant: &PlatformVariant,
    ) -> Result<RemoteContent, UploadError> {
        let bytes = tokio::fs::read(&video.path).await?;
        let caption = truncate_chars(&variant.description, 2200);

        let resp = self
            .http
            .post(format!("{GRAPH}/{}/media", self.account.account_id))
            .query(&[
                ("media_type", "REELS"),
                ("upload_type", "resumable"),
                ("caption", caption.as_str()),
                ("access_token", self.account.access_token.as_str()),
            ])
            .send()
            .await?;
        let container: IdResp = check(resp, "create container")
            .await?
            .json()
            .await
            .map_err(|e| UploadError::Api(format!("container parse failed: {e}")))?;

        let resp = self
            .http
            .post(format!("{RUPLOAD}/{}", container.id))
            .header("Authorization", format!("OAuth {}", self.account.access_token))
            .header("offset", "0")
            .header("file_size", bytes.len().to_string())
            .body(bytes)
            .timeout(Duration::from_secs(600))
            .send()
            .await?;
        check(resp, "transfer").await?;

        self.wait_until_ready(&container.id).await?;

        let resp = self
            .http
            .post(format!("{GRAPH}/{}/media_publish", self.account.account_id))
            .query(&[
                ("creation_id", container.id.as_str()),
                ("access_token", self.account.access_token.as_str()),
            ])
            .send()
            .await?;
        let media: IdResp = check(resp, "publish")
            .await?
            .json()
            .await
            .map_err(|e| UploadError::Api(format!("publish parse failed: {e}")))?;

        let url = match self
            .http
            .get(format!("{GRAPH}/{}", media.id))
            .query(&[
                ("fields", "permalink"),
                ("access_token", self.account.access_token.as_str()),
            ])
            .send()
            .await
        {
            Ok(resp) if resp.status().is_success() => {
                resp.json::<Permalink>().await.ok().and_then(|p| p.permalink)
            }
            _ => None,
        };

        Ok(RemoteContent { id: media.id, url })
    }

    async fn fetch_stats(&self, remote_id: &str) -> Result<Option<EngagementStats>, UploadError> {
        let resp = self
            .http
            .get(format!("{GRAPH}/{remote_id}/insights"))
            .query(&[
                ("metric", "plays,likes,comments,shares"),
                ("access_token", self.account.access_token.as_str()),
            ])
            .send()
            .await?;
        let insights: Insights = check(resp, "insights")
            .await?
            .json()
            .await
            .map_err(|e| UploadError::Api(format!("insights parse failed: {e}")))?;
        Ok(Some(insights_to_stats(insights)))
    }
}
