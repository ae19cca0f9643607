use crate::config::OAuthClient;
use crate::content::metadata::truncate_chars;
use crate::error::{UploadError, snippet};
use crate::models::{EngagementStats, PlatformVariant, RemoteContent, VideoArtifact};
use crate::platform::Platform;
use crate::upload::Uploader;
use crate::upload::token_cache::{ClientAuth, OAuthSession, TokenCache};
use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::LOCATION;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const UPLOAD_URL: &str =
    "https://www.googleapis.com/upload/youtube/v3/videos?uploadType=resumable&part=snippet,status";
const PEOPLE_AND_BLOGS: &str = "26";

#[derive(Deserialize)]
struct Inserted {
    id: String,
}

#[derive(Deserialize)]
struct VideoList {
    #[serde(default)]
    items: Vec<VideoItem>,
}

#[derive(Deserialize)]
struct VideoItem {
    statistics: Statistics,
}

/// The Data API reports counts as decimal strings.
#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct Statistics {
    view_count: Option<String>,
    like_count: Option<String>,
    comment_count: Option<String>,
}

fn count(v: &Option<String>) -> i64 {
    v.as_deref().and_then(|s| s.parse().ok()).unwrap_or(0)
}

pub struct YouTubeUploader {
    http: Client,
    session: OAuthSession,
}

impl YouTubeUploader {
    pub fn new(http: Client, creds: OAuthClient, cache: TokenCache) -> Self {
        let session = OAuthSession::new(
            Platform::YouTube,
            http.clone(),
            TOKEN_URL,
            creds,
            ClientAuth::Body,
            cache,
        );
        Self { http, session }
    }
}

fn snippet_body(variant: &PlatformVariant) -> serde_json::Value {
    let mut description = variant.description.clone();
    if !description.contains("#Shorts") {
        description.push_str("\n\n#Shorts");
    }
    json!({
        "snippet": {
            "title": truncate_chars(&variant.title, 100),
            "description": truncate_chars(&description, 5000),
            "tags": variant.tags,
            "categoryId": PEOPLE_AND_BLOGS,
        },
        "status": {
            "privacyStatus": "public",
            "selfDeclaredMadeForKids": false,
        },
    })
}

#[async_trait]
impl Uploader for YouTubeUploader {
    fn platform(&self) -> Platform {
        Platform::YouTube
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
        let bytes = tokio::fs::read(&video.path).await?;

        let resp = self
            .http
            .post(UPLOAD_URL)
            .bearer_auth(&token)
            .header("X-Upload-Content-Type", "video/mp4")
            .header("X-Upload-Content-Length", bytes.len().to_string())
            .json(&snippet_body(variant))
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(UploadError::Api(format!(
                "resumable session HTTP {}: {}",
                status.as_u16(),
                snippet(&text)
            )));
        }
        let session_url = resp
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| UploadError::Api("resumable session without Location".into()))?;

        let resp = self
            .http
            .put(session_url)
            .bearer_auth(&token)
            .header("Content-Type", "video/mp4")
            .body(bytes)
            .timeout(Duration::from_secs(900))
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(UploadError::Api(format!(
                "video upload HTTP {}: {}",
                status.as_u16(),
                snippet(&text)
            )));
        }
        let inserted: Inserted = resp
            .json()
            .await
            .map_err(|e| UploadError::Api(format!("upload response parse failed: {e}")))?;

        Ok(RemoteContent {
            url: Some(format!("https://youtube.com/shorts/{}", inserted.id)),
            id: inserted.id,
        })
    }

    async fn fetch_stats(&self, remote_id: &str) -> Result<Option<EngagementStats>, UploadError> {
        let token = self.session.access_token().await?;
        let resp = self
            .http
            .get("https://www.googleapis.com/youtube/v3/videos")
            .bearer_auth(&token)
            .query(&[("part", "statistics"), ("id", remote_id)])
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(UploadError::Api(format!(
                "statistics HTTP {}",
                resp.status().as_u16()
            )));
        }
        let list: VideoList = resp
            .json()
            .await
            .map_err(|e| UploadError::Api(format!("statistics parse failed: {e}")))?;

        Ok(list.items.into_iter().next().map(|item| EngagementStats {
            views: count(&item.statistics.view_count),
            likes: count(&item.statistics.like_count),
            comments: count(&item.statistics.comment_count),
            shares: 0,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body_marks_short_and_category() {
        let v = PlatformVariant {
            title: "x".repeat(120),
            description: "desc".into(),
            tags: vec!["fashion".into()],
        };
        let body = snippet_body(&v);
        assert_eq!(body["snippet"]["categoryId"], "26");
        assert_eq!(body["snippet"]["title"].as_str().unwrap().len(), 100);
        assert!(body["snippet"]["description"].as_str().unwrap().ends_with("#Shorts"));
    }

    #[test]
    fn statistics_parse_string_counts() {
        let raw = r#"{"items":[{"statistics":{"viewCount":"1200","likeCount":"33"}}]}"#;
        let list: VideoList = serde_json::from_str(raw).unwrap();
        let s = &list.items[0].statistics;
        assert_eq!(count(&s.view_count), 1200);
        assert_eq!(count(&s.comment_count), 0);
    }
}
