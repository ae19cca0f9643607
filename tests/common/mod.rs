#![allow(dead_code)]

use async_trait::async_trait;
use fashion_shorts::content::TextProvider;
use fashion_shorts::error::{MediaError, ProviderError, UploadError};
use fashion_shorts::media::{
    MediaAsset, MediaKind, Orientation, RenderSpec, SpeechProvider, StockMediaProvider,
    VideoRenderer,
};
use fashion_shorts::models::{
    EngagementStats, PlatformVariant, RemoteContent, TrendItem, VideoArtifact,
};
use fashion_shorts::platform::Platform;
use fashion_shorts::trends::TrendSource;
use fashion_shorts::upload::Uploader;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

pub const NARRATION_SECS: f64 = 40.0;

pub enum MockText {
    Fails(&'static str),
    Blank(&'static str),
    Answers(&'static str, &'static str),
}

#[async_trait]
impl TextProvider for MockText {
    fn name(&self) -> &'static str {
        match self {
            MockText::Fails(n) | MockText::Blank(n) | MockText::Answers(n, _) => *n,
        }
    }

    async fn complete(&self, _prompt: &str, _max_tokens: u32) -> Result<String, ProviderError> {
        match self {
            MockText::Fails(provider) => Err(ProviderError::Http {
                provider: *provider,
                status: 503,
                body: "unavailable".into(),
            }),
            MockText::Blank(_) => Ok("   ".into()),
            MockText::Answers(_, text) => Ok(text.to_string()),
        }
    }
}

pub enum MockSpeech {
    Fails(&'static str),
    Writes(&'static str),
}

#[async_trait]
impl SpeechProvider for MockSpeech {
    fn name(&self) -> &'static str {
        match self {
            MockSpeech::Fails(n) | MockSpeech::Writes(n) => *n,
        }
    }

    async fn synthesize(&self, _text: &str, out_path: &Path) -> Result<(), ProviderError> {
        match self {
            MockSpeech::Fails(provider) => Err(ProviderError::Auth {
                provider: *provider,
                status: 401,
            }),
            MockSpeech::Writes(provider) => {
                let provider = *provider;
                tokio::fs::write(out_path, b"fake mp3 bytes")
                    .await
                    .map_err(|source| ProviderError::Io { provider, source })
            }
        }
    }
}

pub enum MockStock {
    Empty(&'static str),
    Images(&'static str, usize),
}

#[async_trait]
impl StockMediaProvider for MockStock {
    fn name(&self) -> &'static str {
        match self {
            MockStock::Empty(n) | MockStock::Images(n, _) => *n,
        }
    }

    async fn fetch(
        &self,
        keyword: &str,
        _orientation: Orientation,
        dest_dir: &Path,
    ) -> Result<Vec<MediaAsset>, ProviderError> {
        let (provider, count) = match self {
            MockStock::Empty(_) => return Ok(Vec::new()),
            MockStock::Images(p, n) => (*p, *n),
        };
        let mut out = Vec::new();
        for i in 0..count {
            let path = dest_dir.join(format!("{provider}_{keyword}_{i}.jpg"));
            tokio::fs::write(&path, b"jpeg")
                .await
                .map_err(|source| ProviderError::Io { provider, source })?;
            out.push(MediaAsset {
                path,
                kind: MediaKind::Image,
                provider,
            });
        }
        Ok(out)
    }
}

/// Renderer that writes placeholder files and remembers which assets it saw.
#[derive(Clone, Default)]
pub struct FakeRenderer {
    pub seen: Arc<Mutex<Vec<&'static str>>>,
}

#[async_trait]
impl VideoRenderer for FakeRenderer {
    async fn probe_duration(&self, _path: &Path) -> Result<f64, MediaError> {
        Ok(NARRATION_SECS)
    }

    async fn render_segment(
        &self,
        asset: &MediaAsset,
        _duration_secs: f64,
        _spec: &RenderSpec,
        out: &Path,
    ) -> Result<(), MediaError> {
        self.seen.lock().unwrap().push(asset.provider);
        write(out, b"segment").await
    }

    async fn concat_segments(&self, _segments: &[PathBuf], out: &Path) -> Result<(), MediaError> {
        write(out, b"visuals").await
    }

    async fn finalize(
        &self,
        _visuals: &Path,
        _narration: &Path,
        subtitles: &Path,
        spec: &RenderSpec,
        out: &Path,
    ) -> Result<VideoArtifact, MediaError> {
        assert!(subtitles.exists(), "captions are written before finalize");
        write(out, b"final video").await?;
        Ok(VideoArtifact {
            path: out.to_path_buf(),
            duration_secs: NARRATION_SECS,
            width: spec.width,
            height: spec.height,
            size_bytes: 11,
        })
    }
}

async fn write(path: &Path, data: &[u8]) -> Result<(), MediaError> {
    tokio::fs::write(path, data)
        .await
        .map_err(|source| MediaError::Io {
            path: path.to_path_buf(),
            source,
        })
}

pub enum Outcome {
    Publishes,
    RejectsAuth,
    Panics,
}

pub struct MockUploader {
    pub platform: Platform,
    pub outcome: Outcome,
}

impl MockUploader {
    pub fn arc(platform: Platform, outcome: Outcome) -> Arc<dyn Uploader> {
        Arc::new(Self { platform, outcome })
    }
}

#[async_trait]
impl Uploader for MockUploader {
    fn platform(&self) -> Platform {
        self.platform
    }

    async fn authenticate(&self) -> Result<(), UploadError> {
        match self.outcome {
            Outcome::RejectsAuth => Err(UploadError::Auth("token revoked".into())),
            _ => Ok(()),
        }
    }

    async fn upload(
        &self,
        _video: &VideoArtifact,
        _variant: &PlatformVariant,
    ) -> Result<RemoteContent, UploadError> {
        match self.outcome {
            Outcome::Panics => panic!("uploader blew up"),
            _ => Ok(RemoteContent {
                id: format!("{}-123", self.platform),
                url: Some(format!("https://example.test/{}/123", self.platform)),
            }),
        }
    }

    async fn fetch_stats(&self, _remote_id: &str) -> Result<Option<EngagementStats>, UploadError> {
        Ok(Some(EngagementStats {
            views: 1000,
            likes: 50,
            comments: 5,
            shares: 2,
        }))
    }
}

pub struct FixedSource(pub Vec<TrendItem>);

#[async_trait]
impl TrendSource for FixedSource {
    fn name(&self) -> &'static str {
        "fixed"
    }

    async fn fetch(&self) -> anyhow::Result<Vec<TrendItem>> {
        Ok(self.0.clone())
    }
}

pub struct BrokenSource;

#[async_trait]
impl TrendSource for BrokenSource {
    fn name(&self) -> &'static str {
        "broken"
    }

    async fn fetch(&self) -> anyhow::Result<Vec<TrendItem>> {
        anyhow::bail!("HTTP 500")
    }
}

pub fn video_file(dir: &Path) -> VideoArtifact {
    let path = dir.join("clip.mp4");
    std::fs::write(&path, b"video").unwrap();
    VideoArtifact {
        path,
        duration_secs: 45.0,
        width: 1080,
        height: 1920,
        size_bytes: 5,
    }
}
