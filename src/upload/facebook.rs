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

#[derive(Deserialize)]
struct StartResp {
    video_id: String,
    upload_url: String,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct Summary {
    total_count: i64,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct Edge {
    summary: Summary,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct VideoFields {
    views: i64,
    likes: Edge,
    comments: Edge,
}

/// Page Reels via the three-phase `video_reels` endpoint.
pub struct FacebookUploader {
    http: Client,
    page: GraphAccount,
}

impl FacebookUploader {
    pub fn new(http: Client, page: GraphAccount) -> Self {
        Self { http, page }
    }
}

#[async_trait]
impl Uploader for FacebookUploader {
    fn platform(&self) -> Platform {
        Platform::Facebook
    }

    async fn authenticate(&self) -> Result<(), UploadError> {
        let resp = self
            .http
            .get(format!("{GRAPH}/me"))
            .query(&[("access_token", self.page.access_token.as_str())])
            .send()
            .await?;
        check(resp, "token check").await.map(|_| ())
    }

    async fn upload(
        &self,
        video: &VideoArtifact,
        variant: &PlatformVariant,
    ) -> Result<RemoteContent, UploadError> {
        let bytes = tokio::fs::read(&video.path).await?;
        let reels = format!("{GRAPH}/{}/video_reels", self.page.account_id);

        let resp = self
            .http
            .post(&reels)
            .query(&[
                ("upload_phase", "start"),
                ("access_token", self.page.access_token.as_str()),
            ])
            .send()
            .await?;
        let start: StartResp = check(resp, "start")
            .await?
            .json()
            .await
            .map_err(|e| UploadError::Api(format!("start response parse failed: {e}")))?;

        let resp = self
            .http
            .post(&start.upload_url)
            .header("Authorization", format!("OAuth {}", self.page.access_token))
            .header("offset", "0")
            .header("file_size", bytes.len().to_string())
            .body(bytes)
            .timeout(Duration::from_secs(600))
            .send()
            .await?;
        check(resp, "transfer").await?;

        let description = truncate_chars(&variant.description, 1000);
        let resp = self
            .http
            .post(&reels)
            .query(&[
                ("upload_phase", "finish"),
                ("video_id", start.video_id.as_str()),
                ("video_state", "PUBLISHED"),
                ("description", description.as_str()),
                ("access_token", self.page.access_token.as_str()),
            ])
            .send()
            .await?;
        check(resp, "finish").await?;

        Ok(RemoteContent {
            url: Some(format!("https://www.facebook.com/reel/{}", start.video_id)),
            id: start.video_id,
        })
    }

    async fn fetch_stats(&self, remote_id: &str) -> Result<Option<EngagementStats>, UploadError> {
        let resp = self
            .http
            .get(format!("{GRAPH}/{remote_id}"))
            .query(&[
                ("fields", "views,likes.summary(true),comments.summary(true)"),
                ("access_token", self.page.access_token.as_str()),
            ])
            .send()
            .await?;
        let fields: VideoFields = check(resp, "video fields")
            .await?
            .json()
            .await
            .map_err(|e| UploadError::Api(format!("video fields parse failed: {e}")))?;
        Ok(Some(EngagementStats {
            views: fields.views,
            likes: fields.likes.summary.total_count,
            comments: fields.comments.summary.total_count,
            shares: 0,
        }))
    }
}
