pub mod facebook;
pub mod instagram;
pub mod tiktok;
pub mod token_cache;
pub mod twitter;
pub mod youtube;

use crate::error::{UploadError, snippet};
use crate::models::{EngagementStats, PlatformVariant, RemoteContent, UploadResult, VideoArtifact, VideoMetadata};
use crate::platform::Platform;
use crate::{logok, logw};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Publishing client for one destination platform.
#[async_trait]
pub trait Uploader: Send + Sync {
    fn platform(&self) -> Platform;

    /// Make sure usable credentials are at hand, refreshing if needed.
    async fn authenticate(&self) -> Result<(), UploadError>;

    async fn upload(
        &self,
        video: &VideoArtifact,
        variant: &PlatformVariant,
    ) -> Result<RemoteContent, UploadError>;

    /// Current engagement numbers, or `None` where the platform offers none.
    async fn fetch_stats(&self, remote_id: &str) -> Result<Option<EngagementStats>, UploadError>;
}

/// Reject empty files and videos over the platform's size or duration limit.
pub async fn validate(video: &VideoArtifact, platform: Platform) -> Result<(), UploadError> {
    let limits = platform.limits();
    let size = tokio::fs::metadata(&video.path).await?.len();
    if size == 0 {
        return Err(UploadError::Validation("video file is empty".into()));
    }
    if size > limits.max_file_size_bytes() {
        return Err(UploadError::Validation(format!(
            "{:.1} MB exceeds {} MB",
            size as f64 / (1024.0 * 1024.0),
            limits.max_file_size_mb
        )));
    }
    if video.duration_secs > limits.max_duration_secs {
        return Err(UploadError::Validation(format!(
            "{:.1}s exceeds {}s",
            video.duration_secs, limits.max_duration_secs
        )));
    }
    Ok(())
}

/// Pass a successful response through; map 401/403 onto `Auth` and anything
/// else onto `Api`.
pub(crate) async fn check(resp: reqwest::Response, step: &str) -> Result<reqwest::Response, UploadError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let text = resp.text().await.unwrap_or_default();
    let detail = format!("{step} HTTP {}: {}", status.as_u16(), snippet(&text));
    if matches!(status.as_u16(), 401 | 403) {
        return Err(UploadError::Auth(detail));
    }
    Err(UploadError::Api(detail))
}

async fn publish_one(
    uploader: Arc<dyn Uploader>,
    video: VideoArtifact,
    variant: PlatformVariant,
) -> Result<RemoteContent, UploadError> {
    uploader.authenticate().await?;
    validate(&video, uploader.platform()).await?;
    uploader.upload(&video, &variant).await
}

/// Fans a video out to several platforms at once on a bounded pool.
pub struct UploadDispatcher {
    uploaders: HashMap<Platform, Arc<dyn Uploader>>,
    workers: usize,
}

impl UploadDispatcher {
    pub fn new(uploaders: Vec<Arc<dyn Uploader>>, workers: usize) -> Self {
        Self {
            uploaders: uploaders.into_iter().map(|u| (u.platform(), u)).collect(),
            workers: workers.max(1),
        }
    }

    pub fn uploader(&self, platform: Platform) -> Option<Arc<dyn Uploader>> {
        self.uploaders.get(&platform).cloned()
    }

    pub fn platforms(&self) -> Vec<Platform> {
        let mut out: Vec<Platform> = self.uploaders.keys().copied().collect();
        out.sort();
        out
    }

    /// Exactly one result per distinct requested platform, in request order.
    /// A failure or panic in one platform's task never affects the others.
    pub async fn publish(
        &self,
        video: &VideoArtifact,
        metadata: &VideoMetadata,
        platforms: &[Platform],
    ) -> Vec<UploadResult> {
        let mut requested: Vec<Platform> = Vec::with_capacity(platforms.len());
        for p in platforms {
            if !requested.contains(p) {
                requested.push(*p);
            }
        }

        let permits = Arc::new(Semaphore::new(self.workers));
        let mut set = JoinSet::new();
        let mut task_platform = HashMap::new();
        let mut results: HashMap<Platform, UploadResult> = HashMap::new();

        for &platform in &requested {
            let Some(uploader) = self.uploader(platform) else {
                results.insert(
                    platform,
                    UploadResult::failed(platform, "no uploader configured"),
                );
                continue;
            };
            let video = video.clone();
            let variant = metadata.variant_for(platform);
            let permits = permits.clone();
            let handle = set.spawn(async move {
                let _permit = permits.acquire_owned().await;
                publish_one(uploader, video, variant).await
            });
            task_platform.insert(handle.id(), platform);
        }

        while let Some(joined) = set.join_next_with_id().await {
            let (platform, result) = match joined {
                Ok((id, outcome)) => {
                    let Some(&platform) = task_platform.get(&id) else {
                        continue;
                    };
                    let result = match outcome {
                        Ok(remote) => {
                            logok(format!(
                                "{} upload succeeded: {}",
                                platform,
                                remote.url.as_deref().unwrap_or(&remote.id)
                            ));
                            UploadResult::succeeded(platform, remote)
                        }
                        Err(e) => {
                            logw(format!("{} upload failed: {}", platform, e));
                            UploadResult::failed(platform, e)
                        }
                    };
                    (platform, result)
                }
                Err(join_err) => {
                    let Some(&platform) = task_platform.get(&join_err.id()) else {
                        continue;
                    };
                    tracing::error!(platform = %platform, error = %join_err, "upload task aborted");
                    (platform, UploadResult::failed(platform, format!("upload task aborted: {join_err}")))
                }
            };
            results.insert(platform, result);
        }

        requested
            .into_iter()
            .map(|p| {
                results
                    .remove(&p)
                    .unwrap_or_else(|| UploadResult::failed(p, "upload task produced no result"))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn artifact(path: PathBuf, duration_secs: f64) -> VideoArtifact {
        VideoArtifact {
            path,
            duration_secs,
            width: 1080,
            height: 1920,
            size_bytes: 0,
        }
    }

    #[tokio::test]
    async fn validation_checks_duration_and_existence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("v.mp4");
        tokio::fs::write(&path, b"fake").await.unwrap();

        assert!(validate(&artifact(path.clone(), 45.0), Platform::YouTube).await.is_ok());
        let err = validate(&artifact(path.clone(), 75.0), Platform::TikTok).await.unwrap_err();
        assert!(matches!(err, UploadError::Validation(_)));
        assert!(validate(&artifact(path, 75.0), Platform::Instagram).await.is_ok());

        let missing = validate(&artifact(dir.path().join("nope.mp4"), 10.0), Platform::YouTube).await;
        assert!(matches!(missing, Err(UploadError::Io(_))));
    }

    #[tokio::test]
    async fn empty_file_is_rejected_on_every_platform() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.mp4");
        tokio::fs::write(&path, b"").await.unwrap();

        for platform in Platform::ALL {
            let err = validate(&artifact(path.clone(), 30.0), platform).await.unwrap_err();
            assert!(err.to_string().contains("empty"), "{platform}: {err}");
        }
    }
}
