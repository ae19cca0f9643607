use crate::config::OAuthClient;
use crate::error::UploadError;
use crate::models::{EngagementStats, PlatformVariant, RemoteContent, VideoArtifact};
use crate::platform::Platform;
use crate::upload::token_cache::{ClientAuth, OAuthSession, TokenCache};
use crate::upload::{Uploader, check};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

const TOKEN_URL: &str = "https://api.x.com/2/oauth2/token";
const MEDIA_URL: &str = "https://api.x.com/2/media/upload";
const CHUNK_SIZE: usize = 1024 * 1024;
const MAX_TWEET_CHARS: usize = 280;
const MAX_STATUS_POLLS: u32 = 60;

#[derive(Deserialize)]
struct MediaResponse {
    data: MediaData,
}

#[derive(Deserialize)]
struct MediaData {
    id: String,
    #[serde(default)]
    processing_info: Option<ProcessingInfo>,
}

#[derive(Deserialize)]
struct ProcessingInfo {
    state: String,
    #[serde(default)]
    check_after_secs: Option<u64>,
}

#[derive(Deserialize)]
struct TweetResponse {
    data: TweetData,
}

#[derive(Deserialize)]
struct TweetData {
    id: String,
    #[serde(default)]
    public_metrics: Option<PublicMetrics>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct PublicMetrics {
    impression_count: i64,
    like_count: i64,
    reply_count: i64,
    retweet_count: i64,
}

/// Tweet body: the description cut to 280 chars, then tags appended one at a
/// time while they still fit.
pub fn compose_tweet(description: &str, tags: &[String]) -> String {
    let mut text: String = description.trim().chars().take(MAX_TWEET_CHARS).collect();
    for tag in tags {
        let hashtag = format!("#{tag}");
        if text.contains(&hashtag) {
            continue;
        }
        let candidate = format!("{text} {hashtag}");
        if candidate.chars().count() > MAX_TWEET_CHARS {
            break;
        }
        text = candidate;
    }
    text
}

/// X API v2: chunked media upload then a tweet carrying the video.
pub struct TwitterUploader {
    http: Client,
    session: OAuthSession,
}

impl TwitterUploader {
    pub fn new(http: Client, creds: OAuthClient, cache: TokenCache) -> Self {
        let session = OAuthSession::new(
            Platform::Twitter,
            http.clone(),
            TOKEN_URL,
            creds,
            ClientAuth::Basic,
            cache,
        );
        Self { http, session }
    }

    async fn upload_media(&self, token: &str, data: &[u8]) -> Result<String, UploadError> {
        let init_body = json!({
            "media_type": "video/mp4",
            "total_bytes": data.len(),
            "media_category": "tweet_video",
        });
        let resp = self
            .http
            .post(format!("{MEDIA_URL}/initialize"))
            .bearer_auth(token)
            .json(&init_body)
            .send()
            .await?;
        let init: MediaResponse = check(resp, "media initialize")
            .await?
            .json()
            .await
            .map_err(|e| UploadError::Api(format!("initialize parse failed: {e}")))?;
        let media_id = init.data.id;

        for (segment_index, chunk) in data.chunks(CHUNK_SIZE).enumerate() {
            let part = reqwest::multipart::Part::bytes(chunk.to_vec())
                .mime_str("video/mp4")
                .map_err(|e| UploadError::Api(format!("invalid mime type: {e}")))?;
            let form = reqwest::multipart::Form::new()
                .text("segment_index", segment_index.to_string())
                .part("media", part);
            let resp = self
                .http
                .post(format!("{MEDIA_URL}/{media_id}/append"))
                .bearer_auth(token)
                .multipart(form)
                .send()
                .await?;
            check(resp, &format!("append segment {segment_index}")).await?;
        }

        let resp = self
            .http
            .post(format!("{MEDIA_URL}/{media_id}/finalize"))
            .bearer_auth(token)
            .send()
            .await?;
        let finalized: MediaResponse = check(resp, "media finalize")
            .await?
            .json()
            .await
            .map_err(|e| UploadError::Api(format!("finalize parse failed: {e}")))?;

        if let Some(info) = finalized.data.processing_info {
            if info.state != "succeeded" {
                self.wait_for_processing(token, &media_id, info.check_after_secs)
                    .await?;
            }
        }
        Ok(media_id)
    }

    async fn wait_for_processing(
        &self,
        token: &str,
        media_id: &str,
        mut wait_secs: Option<u64>,
    ) -> Result<(), UploadError> {
        for _ in 0..MAX_STATUS_POLLS {
            tokio::time::sleep(Duration::from_secs(wait_secs.unwrap_or(5))).await;
            let resp = self
                .http
                .get(MEDIA_URL)
                .bearer_auth(token)
                .query(&[("command", "STATUS"), ("media_id", media_id)])
                .send()
                .await?;
            let status: MediaResponse = check(resp, "media status")
                .await?
                .json()
                .await
                .map_err(|e| UploadError::Api(format!("status parse failed: {e}")))?;
            let Some(info) = status.data.processing_info else {
                return Ok(());
            };
            match info.state.as_str() {
                "succeeded" => return Ok(()),
                "failed" => return Err(UploadError::Api("media processing failed".into())),
                _ => wait_secs = info.check_after_secs,
            }
        }
        Err(UploadError::Api("media processing did not finish".into()))
    }
}

#[async_trait]
impl Uploader for TwitterUploader {
    fn platform(&self) -> Platform {
        Platform::Twitter
    }

    async fn authenticate(&self) -> Result<(), UploadError> {
        self.session.access_token().await.map(|_| ())
    }

    async fn upload(
        &self,
        video: &VideoArtifact,
        variant: &PlatformVariant,
    ) -> Result<RemoteContent, UploadError> {
        let token = self.session.access_token().await?;
        let data = tokio::fs::read(&video.path).await?;
        let media_id = self.upload_media(&token, &data).await?;

        let body = json!({
            "text": compose_tweet(&variant.description, &variant.tags),
            "media": {"media_ids": [media_id]},
        });
        let resp = self
            .http
            .post("https://api.x.com/2/tweets")
            .bearer_auth(&token)
            .json(&body)
            .send()
            .await?;
        let tweet: TweetResponse = check(resp, "create tweet")
            .await?
            .json()
            .await
            .map_err(|e| UploadError::Api(format!("tweet parse failed: {e}")))?;

        Ok(RemoteContent {
            url: Some(format!("https://x.com/i/status/{}", tweet.data.id)),
            id: tweet.data.id,
        })
    }

    async fn fetch_stats(&self, remote_id: &str) -> Result<Option<EngagementStats>, UploadError> {
        let token = self.session.access_token().await?;
        let resp = self
            .http
            .get(format!("https://api.x.com/2/tweets/{remote_id}"))
            .bearer_auth(&token)
            .query(&[("tweet.fields", "public_metrics")])
            .send()
            .await?;
        let tweet: TweetResponse = check(resp, "tweet lookup")
            .await?
            .json()
            .await
            .map_err(|e| UploadError::Api(format!("tweet parse failed: {e}")))?;

        Ok(tweet.data.public_metrics.map(|m| EngagementStats {
            views: m.impression_count,
            likes: m.like_count,
            comments: m.reply_count,
            shares: m.retweet_count,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn tags_are_added_while_they_fit() {
        let desc = "a".repeat(270);
        let text = compose_tweet(&desc, &tags(&["ootd", "fashiontips"]));
        assert_eq!(text, format!("{desc} #ootd"));
        assert!(text.chars().count() <= 280);
    }

    #[test]
    fn long_descriptions_are_cut() {
        let text = compose_tweet(&"b".repeat(400), &tags(&["style"]));
        assert_eq!(text.chars().count(), 280);
    }

    #[test]
    fn tags_already_present_are_skipped() {
        let text = compose_tweet("New drop #style", &tags(&["style", "fashion"]));
        assert_eq!(text, "New drop #style #fashion");
    }
}
