use crate::content::metadata::truncate_chars;
use crate::error::{UploadError, snippet};
use crate::models::{EngagementStats, PlatformVariant, RemoteContent, VideoArtifact};
use crate::platform::Platform;
use crate::upload::Uploader;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

const API: &str = "https://open.tiktokapis.com/v2";
const SINGLE_CHUNK_MAX: u64 = 64 * 1024 * 1024;
const CHUNK_SIZE: u64 = 10 * 1024 * 1024;

#[derive(Deserialize)]
struct InitResp {
    data: InitData,
}

#[derive(Deserialize)]
struct InitData {
    publish_id: String,
    upload_url: String,
}

/// Chunking for the Content Posting API: files up to 64 MB go in one piece,
/// larger files in 10 MB chunks with the remainder folded into the last one.
/// Returns `(chunk_size, total_chunk_count)`.
pub fn chunk_plan(size: u64) -> (u64, u64) {
    if size <= SINGLE_CHUNK_MAX {
        (size, 1)
    } else {
        (CHUNK_SIZE, size / CHUNK_SIZE)
    }
}

/// Content Posting API, direct post from a local file.
pub struct TikTokUploader {
    http: Client,
    access_token: String,
}

impl TikTokUploader {
    pub fn new(http: Client, access_token: impl Into<String>) -> Self {
        Self {
            http,
            access_token: access_token.into(),
        }
    }
}

#[async_trait]
impl Uploader for TikTokUploader {
    fn platform(&self) -> Platform {
        Platform::TikTok
    }

    async fn authenticate(&self) -> Result<(), UploadError> {
        let resp = self
            .http
            .post(format!("{API}/post/publish/creator_info/query/"))
            .bearer_auth(&self.access_token)
            .header("Content-Type", "application/json; charset=UTF-8")
            .send()
            .await?;
        match resp.status() {
            s if s.is_success() => Ok(()),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(UploadError::Auth(format!(
                "access token rejected (HTTP {})",
                resp.status().as_u16()
            ))),
            s => Err(UploadError::Api(format!("creator info HTTP {}", s.as_u16()))),
        }
    }

    async fn upload(
        &self,
        video: &VideoArtifact,
        variant: &PlatformVariant,
    ) -> Result<RemoteContent, UploadError> {
        let bytes = tokio::fs::read(&video.path).await?;
        let size = bytes.len() as u64;
        if size == 0 {
            return Err(UploadError::Validation("video file is empty".into()));
        }
        let (chunk_size, total_chunks) = chunk_plan(size);

        let body = json!({
            "post_info": {
                "title": truncate_chars(&variant.description, 2200),
                "privacy_level": "PUBLIC_TO_EVERYONE",
                "disable_comment": false,
                "disable_duet": false,
                "disable_stitch": false,
            },
            "source_info": {
                "source": "FILE_UPLOAD",
                "video_size": size,
                "chunk_size": chunk_size,
                "total_chunk_count": total_chunks,
            },
        });

        let resp = self
            .http
            .post(format!("{API}/post/publish/video/init/"))
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(UploadError::Api(format!(
                "init HTTP {}: {}",
                status.as_u16(),
                snippet(&text)
            )));
        }
        let init: InitResp = resp
            .json()
            .await
            .map_err(|e| UploadError::Api(format!("init response parse failed: {e}")))?;

        for idx in 0..total_chunks {
            let start = idx * chunk_size;
            let end = if idx + 1 == total_chunks { size } else { start + chunk_size };
            let resp = self
                .http
                .put(&init.data.upload_url)
                .header("Content-Type", "video/mp4")
                .header("Content-Range", format!("bytes {}-{}/{}", start, end - 1, size))
                .body(bytes[start as usize..end as usize].to_vec())
                .timeout(Duration::from_secs(600))
                .send()
                .await?;
            if !resp.status().is_success() {
                return Err(UploadError::Api(format!(
                    "chunk {} of {} HTTP {}",
                    idx + 1,
                    total_chunks,
                    resp.status().as_u16()
                )));
            }
        }

        Ok(RemoteContent {
            id: init.data.publish_id,
            url: None,
        })
    }

    async fn fetch_stats(&self, _remote_id: &str) -> Result<Option<EngagementStats>, UploadError> {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_files_are_one_chunk() {
        assert_eq!(chunk_plan(5_000_000), (5_000_000, 1));
    }

    #[test]
    fn large_files_fold_remainder_into_last_chunk() {
        let size = 100 * 1024 * 1024 + 123;
        let (chunk, count) = chunk_plan(size);
        assert_eq!(chunk, 10 * 1024 * 1024);
        assert_eq!(count, 10);
    }
}
