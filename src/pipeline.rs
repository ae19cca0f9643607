use crate::api::elevenlabs::ElevenLabs;
use crate::api::google_tts::GoogleTranslateTts;
use crate::api::huggingface::HuggingFace;
use crate::api::ollama::Ollama;
use crate::api::openai::ChatCompletions;
use crate::api::pexels::Pexels;
use crate::api::unsplash::Unsplash;
use crate::api::{cookie_client, http_client};
use crate::config::Config;
use crate::content::{ContentGenerator, TextProvider};
use crate::ffmpeg::FfmpegRenderer;
use crate::media::{MediaAssembler, SpeechProvider, StockMediaProvider};
use crate::models::{Script, TrendItem, UploadResult, VideoArtifact};
use crate::platform::Platform;
use crate::storage::{AnalyticsTotals, Database, PlatformPerformance, StoredTrend};
use crate::trends::google::GoogleTrendsSource;
use crate::trends::reddit::RedditSource;
use crate::trends::twitter::TwitterSource;
use crate::trends::{TrendAggregator, TrendSource};
use crate::upload::facebook::FacebookUploader;
use crate::upload::instagram::InstagramUploader;
use crate::upload::tiktok::TikTokUploader;
use crate::upload::token_cache::TokenCache;
use crate::upload::twitter::TwitterUploader;
use crate::upload::youtube::YouTubeUploader;
use crate::upload::{UploadDispatcher, Uploader};
use crate::{logi, logok, logw};
use anyhow::{Context, Result};
use chrono::{Local, Utc};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Number of recent uploads refreshed per analytics pass.
const ANALYTICS_BATCH: i64 = 50;

/// Knobs the orchestrator needs beyond its components.
#[derive(Debug, Clone)]
pub struct AgentSettings {
    pub platforms: Vec<Platform>,
    pub output_dir: PathBuf,
    pub daily_videos_count: usize,
    pub stagger: Duration,
}

impl AgentSettings {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            platforms: cfg.enabled_platforms.clone(),
            output_dir: cfg.output_dir.clone(),
            daily_videos_count: cfg.daily_videos_count,
            stagger: Duration::from_secs(cfg.upload_stagger_minutes * 60),
        }
    }
}

/// One trend that made it all the way to a rendered video.
#[derive(Debug, Clone)]
pub struct ProducedVideo {
    pub trend_title: String,
    /// Scroll-stopping opening line, reported alongside the video.
    pub hook: String,
    pub script: Script,
    pub video: VideoArtifact,
}

/// Outcome of one daily cycle.
#[derive(Debug, Clone, Default)]
pub struct CycleSummary {
    pub run_id: String,
    pub trends_found: usize,
    pub videos_created: usize,
    pub uploads_succeeded: usize,
    pub uploads_failed: usize,
    pub produced: Vec<ProducedVideo>,
    pub results: Vec<UploadResult>,
    /// One line per item that produced no video.
    pub failures: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct Report {
    pub totals: AnalyticsTotals,
    pub platforms: Vec<PlatformPerformance>,
}

/// The whole pipeline: trends, content, media, uploads, persistence.
pub struct Agent {
    trends: TrendAggregator,
    content: ContentGenerator,
    media: MediaAssembler,
    uploads: UploadDispatcher,
    db: Database,
    settings: AgentSettings,
}

impl Agent {
    pub fn new(
        trends: TrendAggregator,
        content: ContentGenerator,
        media: MediaAssembler,
        uploads: UploadDispatcher,
        db: Database,
        settings: AgentSettings,
    ) -> Self {
        Self {
            trends,
            content,
            media,
            uploads,
            db,
            settings,
        }
    }

    /// Wire every provider and uploader that has credentials configured.
    pub async fn from_config(cfg: &Config) -> Result<Self> {
        let http = http_client()?;

        let mut sources: Vec<Box<dyn TrendSource>> = Vec::new();
        if let Some(creds) = &cfg.reddit {
            sources.push(Box::new(RedditSource::new(http.clone(), creds.clone())));
        }
        if cfg.google_trends_enabled {
            sources.push(Box::new(GoogleTrendsSource::new(cookie_client()?)));
        }
        if let Some(bearer) = &cfg.twitter_bearer_token {
            sources.push(Box::new(TwitterSource::new(http.clone(), bearer.clone())));
        }

        let mut text: Vec<Box<dyn TextProvider>> = Vec::new();
        if let Some(key) = &cfg.groq_key {
            text.push(Box::new(ChatCompletions::groq(http.clone(), key.clone())));
        }
        if let Some(key) = &cfg.openai_key {
            text.push(Box::new(ChatCompletions::openai(http.clone(), key.clone())));
        }
        if let Some(key) = &cfg.huggingface_key {
            text.push(Box::new(HuggingFace::new(http.clone(), key.clone())));
        }
        if cfg.ollama_enabled {
            text.push(Box::new(Ollama::new(http.clone(), cfg.ollama_base_url.clone())));
        }

        let mut speech: Vec<Box<dyn SpeechProvider>> = Vec::new();
        if let Some(key) = &cfg.elevenlabs_key {
            speech.push(Box::new(ElevenLabs::new(
                http.clone(),
                key.clone(),
                cfg.eleven_voice_id.clone(),
                cfg.eleven_model_id.clone(),
            )));
        }
        speech.push(Box::new(GoogleTranslateTts::new(http.clone())));

        let mut stock: Vec<Box<dyn StockMediaProvider>> = Vec::new();
        if let Some(key) = &cfg.pexels_key {
            stock.push(Box::new(Pexels::new(http.clone(), key.clone())));
        }
        if let Some(key) = &cfg.unsplash_key {
            stock.push(Box::new(Unsplash::new(http.clone(), key.clone())));
        }
        if stock.is_empty() {
            logw("No stock media provider configured; videos cannot be assembled");
        }

        let cache = TokenCache::new(cfg.token_dir());
        let mut uploaders: Vec<Arc<dyn Uploader>> = Vec::new();
        for &platform in &cfg.enabled_platforms {
            let uploader: Option<Arc<dyn Uploader>> = match platform {
                Platform::YouTube => cfg.youtube.clone().map(|creds| {
                    Arc::new(YouTubeUploader::new(http.clone(), creds, cache.clone())) as Arc<dyn Uploader>
                }),
                Platform::TikTok => cfg.tiktok_access_token.clone().map(|token| {
                    Arc::new(TikTokUploader::new(http.clone(), token)) as Arc<dyn Uploader>
                }),
                Platform::Instagram => cfg.instagram.clone().map(|account| {
                    Arc::new(InstagramUploader::new(http.clone(), account)) as Arc<dyn Uploader>
                }),
                Platform::Twitter => cfg.twitter.clone().map(|creds| {
                    Arc::new(TwitterUploader::new(http.clone(), creds, cache.clone())) as Arc<dyn Uploader>
                }),
                Platform::Facebook => cfg.facebook.clone().map(|page| {
                    Arc::new(FacebookUploader::new(http.clone(), page)) as Arc<dyn Uploader>
                }),
            };
            match uploader {
                Some(u) => uploaders.push(u),
                None => logw(format!("{platform} enabled without credentials, skipping")),
            }
        }

        let db = Database::connect(&cfg.database_path).await?;

        let agent = Self::new(
            TrendAggregator::new(sources, cfg.similarity_threshold),
            ContentGenerator::new(text),
            MediaAssembler::new(speech, stock, Box::new(FfmpegRenderer)),
            UploadDispatcher::new(uploaders, cfg.upload_workers),
            db,
            AgentSettings::from_config(cfg),
        );
        tracing::info!(
            sources = ?agent.trends.source_names(),
            text_providers = ?agent.content.provider_names(),
            platforms = ?agent.uploads.platforms(),
            "agent ready"
        );
        Ok(agent)
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Detect trends, then for each: write, render, publish, record.
    /// A failing item is logged and skipped; the cycle always completes.
    pub async fn run_cycle(&self) -> Result<CycleSummary> {
        let run_id = Utc::now().format("%Y%m%dT%H%M%SZ").to_string();
        let limit = self.settings.daily_videos_count;
        logi(format!("Starting cycle {run_id} ({limit} videos)"));

        // Only this cycle's deduplicated trends are produced.
        let fresh = self.trends.fetch(limit).await;
        let mut queue = Vec::with_capacity(fresh.len());
        for item in fresh {
            let id = self.db.save_trend(&item).await.context("saving trend")?;
            queue.push(StoredTrend { id, item });
        }
        let mut summary = CycleSummary {
            run_id: run_id.clone(),
            trends_found: queue.len(),
            ..CycleSummary::default()
        };
        logi(format!("{} new trends queued for production", queue.len()));

        let total = queue.len();
        for (i, stored) in queue.into_iter().enumerate() {
            let n = i + 1;
            self.db.mark_trend_used(stored.id).await?;
            match self.produce(&stored.item, Some(stored.id), n, &run_id).await {
                Ok((produced, results)) => {
                    summary.videos_created += 1;
                    summary.produced.push(produced);
                    for r in &results {
                        if r.success {
                            summary.uploads_succeeded += 1;
                        } else {
                            summary.uploads_failed += 1;
                        }
                    }
                    summary.results.extend(results);
                }
                Err(e) => {
                    logw(format!("Item {n}/{total} \"{}\" failed: {e:#}", stored.item.title));
                    summary
                        .failures
                        .push(format!("{}: {e:#}", stored.item.title));
                }
            }

            if n < total && !self.settings.stagger.is_zero() {
                logi(format!(
                    "Waiting {} minutes before the next video",
                    self.settings.stagger.as_secs() / 60
                ));
                tokio::time::sleep(self.settings.stagger).await;
            }
        }

        logok(format!(
            "Cycle {run_id} done: {} videos, {} uploads ok, {} failed",
            summary.videos_created, summary.uploads_succeeded, summary.uploads_failed
        ));
        Ok(summary)
    }

    async fn produce(
        &self,
        trend: &TrendItem,
        trend_id: Option<i64>,
        n: usize,
        run_id: &str,
    ) -> Result<(ProducedVideo, Vec<UploadResult>)> {
        let (script, metadata) = self.content.generate(trend).await;
        let hook = self.content.generate_hook(trend).await;
        logi(format!("Hook: {hook}"));

        let dest = video_path(&self.settings.output_dir, n);
        logi(format!("Creating video \"{}\"", metadata.title));
        let video = self
            .media
            .assemble(&script, &metadata, &dest)
            .await
            .with_context(|| format!("assembling {}", dest.display()))?;

        let video_id = self.db.save_video(trend_id, &script, &metadata, &video).await?;

        let results = self
            .uploads
            .publish(&video, &metadata, &self.settings.platforms)
            .await;
        for result in &results {
            self.db.save_upload(video_id, run_id, result).await?;
            match (&result.url, &result.error) {
                (Some(url), _) => logi(format!("  {}: {}", result.platform, url)),
                (None, Some(err)) => logi(format!("  {}: failed ({})", result.platform, err)),
                (None, None) => logi(format!("  {}: published", result.platform)),
            }
        }
        let produced = ProducedVideo {
            trend_title: trend.title.clone(),
            hook,
            script,
            video,
        };
        Ok((produced, results))
    }

    /// Refresh engagement numbers for the most recent successful uploads.
    /// Returns how many uploads got fresh stats.
    pub async fn update_analytics(&self) -> Result<usize> {
        let recent = self.db.recent_uploads(ANALYTICS_BATCH).await?;
        let mut updated = 0;
        for upload in recent {
            let Some(uploader) = self.uploads.uploader(upload.platform) else {
                continue;
            };
            match uploader.fetch_stats(&upload.remote_id).await {
                Ok(Some(stats)) => {
                    self.db.upsert_analytics(upload.id, &stats).await?;
                    tracing::debug!(platform = %upload.platform, views = stats.views, "analytics updated");
                    updated += 1;
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(platform = %upload.platform, error = %e, "analytics fetch failed");
                }
            }
        }
        logok(format!("Analytics refreshed for {updated} uploads"));
        Ok(updated)
    }

    pub async fn report(&self) -> Result<Report> {
        let report = Report {
            totals: self.db.total_analytics().await?,
            platforms: self.db.platform_performance().await?,
        };
        let t = &report.totals;
        logi(format!(
            "Totals: {} videos, {} uploads, {} views, {} likes, {} comments, {} shares",
            t.videos, t.uploads, t.views, t.likes, t.comments, t.shares
        ));
        for p in &report.platforms {
            logi(format!(
                "  {}: {} uploads, {} views, {:.0} avg views",
                p.platform, p.uploads, p.views, p.avg_views
            ));
        }
        Ok(report)
    }
}

/// `<dir>/fashion_short_<YYYYmmdd_HHMMSS>_<n>.mp4`
pub fn video_path(output_dir: &Path, n: usize) -> PathBuf {
    output_dir.join(format!(
        "fashion_short_{}_{n}.mp4",
        Local::now().format("%Y%m%d_%H%M%S")
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn video_names_carry_timestamp_and_index() {
        let p = video_path(Path::new("out"), 3);
        let name = p.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("fashion_short_"));
        assert!(name.ends_with("_3.mp4"));
        // fashion_short_ + YYYYmmdd_HHMMSS + _3.mp4
        assert_eq!(name.len(), "fashion_short_".len() + 15 + "_3.mp4".len());
        assert_eq!(p.parent(), Some(Path::new("out")));
    }
}
