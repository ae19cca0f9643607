use crate::error::ProviderError;
use crate::media::{MediaAsset, MediaKind, Orientation, StockMediaProvider};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::path::Path;

const PROVIDER: &str = "pexels";
const MAX_CLIPS: usize = 3;

#[derive(Deserialize)]
struct SearchResp {
    #[serde(default)]
    videos: Vec<Video>,
}

#[derive(Deserialize)]
struct Video {
    id: u64,
    #[serde(default)]
    video_files: Vec<VideoFile>,
}

#[derive(Debug, Clone, Deserialize)]
struct VideoFile {
    link: String,
    #[serde(default)]
    file_type: Option<String>,
    #[serde(default)]
    height: Option<u32>,
}

/// Stock video clips.
pub struct Pexels {
    client: Client,
    api_key: String,
}

impl Pexels {
    pub fn new(client: Client, api_key: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
        }
    }
}

/// Tallest MP4 rendition no taller than 1920, else the first file.
fn pick_file(files: &[VideoFile]) -> Option<&VideoFile> {
    files
        .iter()
        .filter(|f| f.file_type.as_deref().is_none_or(|t| t == "video/mp4"))
        .filter(|f| f.height.is_some_and(|h| h <= 1920))
        .max_by_key(|f| f.height.unwrap_or(0))
        .or_else(|| files.first())
}

pub(crate) fn file_stem(provider: &str, keyword: &str, idx: usize) -> String {
    let clean: String = keyword
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!("{provider}_{clean}_{idx}")
}

#[async_trait]
impl StockMediaProvider for Pexels {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn fetch(
        &self,
        keyword: &str,
        orientation: Orientation,
        dest_dir: &Path,
    ) -> Result<Vec<MediaAsset>, ProviderError> {
        let resp = self
            .client
            .get("https://api.pexels.com/videos/search")
            .header("Authorization", &self.api_key)
            .query(&[
                ("query", keyword),
                ("per_page", "5"),
                ("orientation", orientation.as_str()),
            ])
            .send()
            .await
            .map_err(ProviderError::network(PROVIDER))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ProviderError::from_status(PROVIDER, status, body));
        }
        let found: SearchResp = resp.json().await.map_err(|e| ProviderError::Parse {
            provider: PROVIDER,
            message: e.to_string(),
        })?;

        let mut assets = Vec::new();
        for video in found.videos.iter().take(MAX_CLIPS) {
            let Some(file) = pick_file(&video.video_files) else {
                continue;
            };
            let path = dest_dir.join(format!("{}.mp4", file_stem(PROVIDER, keyword, assets.len())));
            match crate::api::download(&self.client, PROVIDER, &file.link, &path).await {
                Ok(()) => assets.push(MediaAsset {
                    path,
                    kind: MediaKind::Video,
                    provider: PROVIDER,
                }),
                Err(e) => tracing::warn!(provider = PROVIDER, video_id = video.id, error = %e, "clip download failed"),
            }
        }
        Ok(assets)
    }
}
