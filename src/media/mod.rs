pub mod captions;

use crate::error::{MediaError, ProviderError};
use crate::models::{Script, VideoArtifact, VideoMetadata};
use crate::{logi, logok, logw};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

pub const WATERMARK: &str = "@FashionAI";
const MAX_KEYWORDS: usize = 3;
const DEFAULT_KEYWORD: &str = "fashion";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Video,
    Image,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Portrait,
    Landscape,
}

impl Orientation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Orientation::Portrait => "portrait",
            Orientation::Landscape => "landscape",
        }
    }
}

/// A stock clip or image already downloaded to local disk.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaAsset {
    pub path: PathBuf,
    pub kind: MediaKind,
    pub provider: &'static str,
}

/// Target output format.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderSpec {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub watermark: String,
}

impl Default for RenderSpec {
    fn default() -> Self {
        Self {
            width: 1080,
            height: 1920,
            fps: 30,
            watermark: WATERMARK.to_string(),
        }
    }
}

impl RenderSpec {
    pub fn orientation(&self) -> Orientation {
        if self.height >= self.width {
            Orientation::Portrait
        } else {
            Orientation::Landscape
        }
    }
}

#[async_trait]
pub trait SpeechProvider: Send + Sync {
    fn name(&self) -> &'static str;
    /// Write narration audio for `text` to `out_path`.
    async fn synthesize(&self, text: &str, out_path: &Path) -> Result<(), ProviderError>;
}

#[async_trait]
pub trait StockMediaProvider: Send + Sync {
    fn name(&self) -> &'static str;
    /// Search for `keyword` and download hits into `dest_dir`.
    async fn fetch(
        &self,
        keyword: &str,
        orientation: Orientation,
        dest_dir: &Path,
    ) -> Result<Vec<MediaAsset>, ProviderError>;
}

/// Encoding backend. The production implementation shells out to ffmpeg.
#[async_trait]
pub trait VideoRenderer: Send + Sync {
    async fn probe_duration(&self, path: &Path) -> Result<f64, MediaError>;
    async fn render_segment(
        &self,
        asset: &MediaAsset,
        duration_secs: f64,
        spec: &RenderSpec,
        out: &Path,
    ) -> Result<(), MediaError>;
    async fn concat_segments(&self, segments: &[PathBuf], out: &Path) -> Result<(), MediaError>;
    async fn finalize(
        &self,
        visuals: &Path,
        narration: &Path,
        subtitles: &Path,
        spec: &RenderSpec,
        out: &Path,
    ) -> Result<VideoArtifact, MediaError>;
}

/// Turns a script into a finished vertical video.
pub struct MediaAssembler {
    speech: Vec<Box<dyn SpeechProvider>>,
    stock: Vec<Box<dyn StockMediaProvider>>,
    renderer: Box<dyn VideoRenderer>,
    spec: RenderSpec,
}

impl MediaAssembler {
    pub fn new(
        speech: Vec<Box<dyn SpeechProvider>>,
        stock: Vec<Box<dyn StockMediaProvider>>,
        renderer: Box<dyn VideoRenderer>,
    ) -> Self {
        Self {
            speech,
            stock,
            renderer,
            spec: RenderSpec::default(),
        }
    }

    pub fn with_spec(mut self, spec: RenderSpec) -> Self {
        self.spec = spec;
        self
    }

    pub async fn assemble(
        &self,
        script: &Script,
        metadata: &VideoMetadata,
        dest: &Path,
    ) -> Result<VideoArtifact, MediaError> {
        let work = tempfile::Builder::new()
            .prefix("fashion-shorts-")
            .tempdir()
            .map_err(|source| MediaError::Io {
                path: std::env::temp_dir(),
                source,
            })?;
        let work_dir = work.path();

        let narration = work_dir.join("narration.mp3");
        self.narrate(&script.text, &narration).await?;
        let audio_secs = self.renderer.probe_duration(&narration).await?;
        logi(format!("Narration ready: {:.1}s", audio_secs));

        let media_dir = work_dir.join("media");
        create_dir(&media_dir).await?;
        let keywords = search_keywords(&metadata.keywords);
        let assets = self.gather_visuals(&keywords, &media_dir).await;
        if assets.is_empty() {
            return Err(MediaError::NoVisuals(keywords));
        }

        let per_segment = audio_secs / assets.len() as f64;
        let mut segments = Vec::with_capacity(assets.len());
        for (i, asset) in assets.iter().enumerate() {
            let seg = work_dir.join(format!("seg_{i:02}.mp4"));
            self.renderer
                .render_segment(asset, per_segment, &self.spec, &seg)
                .await?;
            segments.push(seg);
        }
        logi(format!(
            "Rendered {} segments of {:.1}s each",
            segments.len(),
            per_segment
        ));

        let visuals = work_dir.join("visuals.mp4");
        self.renderer.concat_segments(&segments, &visuals).await?;

        let subtitles = work_dir.join("captions.srt");
        let caps = captions::build_captions(&script.text, audio_secs, captions::WORDS_PER_CAPTION);
        captions::write_srt(&caps, &subtitles)
            .await
            .map_err(|e| MediaError::Render(format!("{e:#}")))?;

        if let Some(parent) = dest.parent() {
            create_dir(parent).await?;
        }
        let artifact = self
            .renderer
            .finalize(&visuals, &narration, &subtitles, &self.spec, dest)
            .await?;

        logok(format!(
            "Video assembled: {} ({:.1}s, {} bytes)",
            artifact.path.display(),
            artifact.duration_secs,
            artifact.size_bytes
        ));
        Ok(artifact)
    }

    async fn narrate(&self, text: &str, out: &Path) -> Result<(), MediaError> {
        for provider in &self.speech {
            match provider.synthesize(text, out).await {
                Ok(()) if non_empty_file(out).await => {
                    logi(format!("Narration synthesized by {}", provider.name()));
                    return Ok(());
                }
                Ok(()) => {
                    tracing::warn!(provider = provider.name(), "speech provider wrote no audio");
                }
                Err(e) => {
                    tracing::warn!(provider = provider.name(), error = %e, "speech provider failed");
                }
            }
        }
        Err(MediaError::Tts)
    }

    /// For each keyword, the first provider that returns anything wins.
    async fn gather_visuals(&self, keywords: &[String], dir: &Path) -> Vec<MediaAsset> {
        let mut assets = Vec::new();
        for keyword in keywords {
            for provider in &self.stock {
                match provider.fetch(keyword, self.spec.orientation(), dir).await {
                    Ok(found) if !found.is_empty() => {
                        tracing::info!(
                            provider = provider.name(),
                            keyword = keyword.as_str(),
                            count = found.len(),
                            "stock media fetched"
                        );
                        assets.extend(found);
                        break;
                    }
                    Ok(_) => {
                        tracing::info!(
                            provider = provider.name(),
                            keyword = keyword.as_str(),
                            "no stock media"
                        );
                    }
                    Err(e) => {
                        tracing::warn!(provider = provider.name(), keyword = keyword.as_str(), error = %e, "stock media provider failed");
                    }
                }
            }
        }
        if assets.is_empty() {
            logw(format!("No visuals for keywords {:?}", keywords));
        }
        assets
    }
}

/// Up to three non-blank keywords, or the generic default.
pub fn search_keywords(keywords: &[String]) -> Vec<String> {
    let picked: Vec<String> = keywords
        .iter()
        .map(|k| k.trim())
        .filter(|k| !k.is_empty())
        .take(MAX_KEYWORDS)
        .map(str::to_string)
        .collect();
    if picked.is_empty() {
        vec![DEFAULT_KEYWORD.to_string()]
    } else {
        picked
    }
}

async fn non_empty_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.len() > 0)
        .unwrap_or(false)
}

async fn create_dir(path: &Path) -> Result<(), MediaError> {
    tokio::fs::create_dir_all(path)
        .await
        .map_err(|source| MediaError::Io {
            path: path.to_path_buf(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keywords_are_capped_with_default() {
        let kws: Vec<String> = ["blazer", " ", "tailoring", "wool", "office"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(search_keywords(&kws), vec!["blazer", "tailoring", "wool"]);
        assert_eq!(search_keywords(&[]), vec!["fashion"]);
    }

    #[test]
    fn portrait_by_default() {
        assert_eq!(RenderSpec::default().orientation(), Orientation::Portrait);
    }
}
