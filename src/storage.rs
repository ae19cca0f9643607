use crate::models::{EngagementStats, Script, TrendItem, UploadResult, VideoArtifact, VideoMetadata};
use crate::platform::Platform;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::path::Path;
use std::str::FromStr;

#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

#[derive(Clone, Debug)]
pub struct StoredTrend {
    pub id: i64,
    pub item: TrendItem,
}

/// A successful upload that can be polled for engagement.
#[derive(Clone, Debug)]
pub struct RecentUpload {
    pub id: i64,
    pub platform: Platform,
    pub remote_id: String,
    pub url: Option<String>,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct AnalyticsTotals {
    pub videos: i64,
    pub uploads: i64,
    pub views: i64,
    pub likes: i64,
    pub comments: i64,
    pub shares: i64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PlatformPerformance {
    pub platform: String,
    pub uploads: i64,
    pub views: i64,
    pub likes: i64,
    pub avg_views: f64,
}

impl Database {
    pub async fn connect(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .with_context(|| format!("creating {}", parent.display()))?;
            }
        }
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .with_context(|| format!("opening database {}", path.display()))?;

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    /// Single-connection in-memory database, used by tests and dry runs.
    pub async fn connect_in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(
            "\
            CREATE TABLE IF NOT EXISTS trends (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                source TEXT NOT NULL,
                title TEXT NOT NULL,
                keywords TEXT NOT NULL DEFAULT '[]',
                score INTEGER NOT NULL DEFAULT 0,
                url TEXT,
                description TEXT,
                discovered_at TEXT NOT NULL,
                used INTEGER NOT NULL DEFAULT 0
            );
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "\
            CREATE TABLE IF NOT EXISTS videos (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                trend_id INTEGER REFERENCES trends(id),
                script TEXT NOT NULL,
                provider TEXT NOT NULL,
                metadata TEXT NOT NULL,
                file_path TEXT NOT NULL,
                duration_secs REAL NOT NULL,
                size_bytes INTEGER NOT NULL,
                created_at TEXT NOT NULL
            );
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "\
            CREATE TABLE IF NOT EXISTS uploads (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                video_id INTEGER NOT NULL REFERENCES videos(id),
                run_id TEXT NOT NULL,
                platform TEXT NOT NULL,
                success INTEGER NOT NULL,
                remote_id TEXT,
                url TEXT,
                error TEXT,
                uploaded_at TEXT NOT NULL,
                UNIQUE(video_id, platform, run_id)
            );
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "\
            CREATE TABLE IF NOT EXISTS analytics (
                upload_id INTEGER PRIMARY KEY REFERENCES uploads(id),
                views INTEGER NOT NULL DEFAULT 0,
                likes INTEGER NOT NULL DEFAULT 0,
                comments INTEGER NOT NULL DEFAULT 0,
                shares INTEGER NOT NULL DEFAULT 0,
                last_updated TEXT NOT NULL
            );
            ",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn save_trend(&self, trend: &TrendItem) -> Result<i64> {
        let keywords = serde_json::to_string(&trend.keywords)?;
        let row = sqlx::query(
            "\
            INSERT INTO trends (source, title, keywords, score, url, description, discovered_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING id;
            ",
        )
        .bind(&trend.source)
        .bind(&trend.title)
        .bind(keywords)
        .bind(trend.score)
        .bind(&trend.url)
        .bind(&trend.description)
        .bind(trend.discovered_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.try_get("id")?)
    }

    pub async fn mark_trend_used(&self, trend_id: i64) -> Result<()> {
        sqlx::query("UPDATE trends SET used = 1 WHERE id = ?;")
            .bind(trend_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Highest-scoring trends not yet turned into a video.
    pub async fn unused_trends(&self, limit: i64) -> Result<Vec<StoredTrend>> {
        let rows = sqlx::query(
            "\
            SELECT id, source, title, keywords, score, url, description, discovered_at
            FROM trends
            WHERE used = 0
            ORDER BY score DESC, id ASC
            LIMIT ?;
            ",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let keywords: String = row.try_get("keywords")?;
            out.push(StoredTrend {
                id: row.try_get("id")?,
                item: TrendItem {
                    source: row.try_get("source")?,
                    title: row.try_get("title")?,
                    keywords: serde_json::from_str(&keywords).unwrap_or_default(),
                    score: row.try_get("score")?,
                    discovered_at: row.try_get("discovered_at")?,
                    url: row.try_get("url")?,
                    description: row.try_get("description")?,
                },
            });
        }
        Ok(out)
    }

    pub async fn save_video(
        &self,
        trend_id: Option<i64>,
        script: &Script,
        metadata: &VideoMetadata,
        video: &VideoArtifact,
    ) -> Result<i64> {
        let metadata = serde_json::to_string(metadata)?;
        let row = sqlx::query(
            "\
            INSERT INTO videos (trend_id, script, provider, metadata, file_path, duration_secs, size_bytes, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING id;
            ",
        )
        .bind(trend_id)
        .bind(&script.text)
        .bind(&script.provider)
        .bind(metadata)
        .bind(video.path.to_string_lossy().into_owned())
        .bind(video.duration_secs)
        .bind(video.size_bytes as i64)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(row.try_get("id")?)
    }

    /// One row per (video, platform, run); a repeated save within the same run
    /// overwrites the earlier outcome.
    pub async fn save_upload(&self, video_id: i64, run_id: &str, result: &UploadResult) -> Result<i64> {
        let row = sqlx::query(
            "\
            INSERT INTO uploads (video_id, run_id, platform, success, remote_id, url, error, uploaded_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (video_id, platform, run_id)
            DO UPDATE SET
                success = EXCLUDED.success,
                remote_id = EXCLUDED.remote_id,
                url = EXCLUDED.url,
                error = EXCLUDED.error,
                uploaded_at = EXCLUDED.uploaded_at
            RETURNING id;
            ",
        )
        .bind(video_id)
        .bind(run_id)
        .bind(result.platform.as_str())
        .bind(result.success)
        .bind(&result.remote_id)
        .bind(&result.url)
        .bind(&result.error)
        .bind(result.timestamp)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.try_get("id")?)
    }

    pub async fn upsert_analytics(&self, upload_id: i64, stats: &EngagementStats) -> Result<()> {
        sqlx::query(
            "\
            INSERT INTO analytics (upload_id, views, likes, comments, shares, last_updated)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT (upload_id)
            DO UPDATE SET
                views = EXCLUDED.views,
                likes = EXCLUDED.likes,
                comments = EXCLUDED.comments,
                shares = EXCLUDED.shares,
                last_updated = EXCLUDED.last_updated;
            ",
        )
        .bind(upload_id)
        .bind(stats.views)
        .bind(stats.likes)
        .bind(stats.comments)
        .bind(stats.shares)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn total_analytics(&self) -> Result<AnalyticsTotals> {
        let row = sqlx::query(
            "\
            SELECT
                (SELECT COUNT(*) FROM videos) AS videos,
                (SELECT COUNT(*) FROM uploads WHERE success = 1) AS uploads,
                COALESCE(SUM(views), 0) AS views,
                COALESCE(SUM(likes), 0) AS likes,
                COALESCE(SUM(comments), 0) AS comments,
                COALESCE(SUM(shares), 0) AS shares
            FROM analytics;
            ",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(AnalyticsTotals {
            videos: row.try_get("videos")?,
            uploads: row.try_get("uploads")?,
            views: row.try_get("views")?,
            likes: row.try_get("likes")?,
            comments: row.try_get("comments")?,
            shares: row.try_get("shares")?,
        })
    }

    /// Successful uploads and engagement per platform, best average first.
    pub async fn platform_performance(&self) -> Result<Vec<PlatformPerformance>> {
        let rows = sqlx::query(
            "\
            SELECT
                u.platform AS platform,
                COUNT(u.id) AS uploads,
                COALESCE(SUM(a.views), 0) AS views,
                COALESCE(SUM(a.likes), 0) AS likes,
                COALESCE(AVG(a.views), 0.0) AS avg_views
            FROM uploads u
            LEFT JOIN analytics a ON a.upload_id = u.id
            WHERE u.success = 1
            GROUP BY u.platform
            ORDER BY avg_views DESC, u.platform ASC;
            ",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(PlatformPerformance {
                platform: row.try_get("platform")?,
                uploads: row.try_get("uploads")?,
                views: row.try_get("views")?,
                likes: row.try_get("likes")?,
                avg_views: row.try_get("avg_views")?,
            });
        }
        Ok(out)
    }

    /// Most recent successful uploads that carry a remote id.
    pub async fn recent_uploads(&self, limit: i64) -> Result<Vec<RecentUpload>> {
        let rows = sqlx::query(
            "\
            SELECT id, platform, remote_id, url, uploaded_at
            FROM uploads
            WHERE success = 1 AND remote_id IS NOT NULL
            ORDER BY uploaded_at DESC, id DESC
            LIMIT ?;
            ",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let platform: String = row.try_get("platform")?;
            let Ok(platform) = platform.parse::<Platform>() else {
                tracing::warn!(platform = %platform, "skipping upload with unknown platform");
                continue;
            };
            out.push(RecentUpload {
                id: row.try_get("id")?,
                platform,
                remote_id: row.try_get("remote_id")?,
                url: row.try_get("url")?,
                uploaded_at: row.try_get("uploaded_at")?,
            });
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RemoteContent;
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    fn fixture() -> (Script, VideoMetadata, VideoArtifact) {
        let script = Script::new("short script text", "template");
        let metadata = VideoMetadata {
            title: "t".into(),
            description: "d".into(),
            hashtags: vec!["#fashion".into()],
            keywords: vec!["fashion".into()],
            variants: BTreeMap::new(),
        };
        let video = VideoArtifact {
            path: PathBuf::from("out.mp4"),
            duration_secs: 40.0,
            width: 1080,
            height: 1920,
            size_bytes: 1234,
        };
        (script, metadata, video)
    }

    #[tokio::test]
    async fn trends_round_through_the_unused_queue() {
        let db = Database::connect_in_memory().await.unwrap();
        let low = db
            .save_trend(&TrendItem::new("reddit", "Low", 10).with_keywords(["a", "b"]))
            .await
            .unwrap();
        let high = db.save_trend(&TrendItem::new("reddit", "High", 90)).await.unwrap();

        let unused = db.unused_trends(10).await.unwrap();
        assert_eq!(unused.iter().map(|t| t.id).collect::<Vec<_>>(), vec![high, low]);
        assert_eq!(unused[1].item.keywords, vec!["a", "b"]);

        db.mark_trend_used(high).await.unwrap();
        let unused = db.unused_trends(10).await.unwrap();
        assert_eq!(unused.len(), 1);
        assert_eq!(unused[0].item.title, "Low");
    }

    #[tokio::test]
    async fn repeated_upload_in_one_run_keeps_a_single_row() {
        let db = Database::connect_in_memory().await.unwrap();
        let (script, metadata, video) = fixture();
        let video_id = db.save_video(None, &script, &metadata, &video).await.unwrap();

        let failed = UploadResult::failed(Platform::YouTube, "quota");
        let first = db.save_upload(video_id, "run-1", &failed).await.unwrap();
        let ok = UploadResult::succeeded(
            Platform::YouTube,
            RemoteContent { id: "abc".into(), url: None },
        );
        let second = db.save_upload(video_id, "run-1", &ok).await.unwrap();
        assert_eq!(first, second);

        db.save_upload(video_id, "run-2", &ok).await.unwrap();
        let recent = db.recent_uploads(50).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert!(recent.iter().all(|u| u.remote_id == "abc"));
    }

    #[tokio::test]
    async fn analytics_aggregate_per_platform() {
        let db = Database::connect_in_memory().await.unwrap();
        let (script, metadata, video) = fixture();
        let video_id = db.save_video(None, &script, &metadata, &video).await.unwrap();

        let yt = db
            .save_upload(
                video_id,
                "r",
                &UploadResult::succeeded(Platform::YouTube, RemoteContent { id: "y".into(), url: None }),
            )
            .await
            .unwrap();
        let fb = db
            .save_upload(
                video_id,
                "r",
                &UploadResult::succeeded(Platform::Facebook, RemoteContent { id: "f".into(), url: None }),
            )
            .await
            .unwrap();
        db.save_upload(video_id, "r", &UploadResult::failed(Platform::TikTok, "nope"))
            .await
            .unwrap();

        let stats = EngagementStats { views: 100, likes: 10, comments: 2, shares: 1 };
        db.upsert_analytics(yt, &stats).await.unwrap();
        db.upsert_analytics(yt, &EngagementStats { views: 300, ..stats }).await.unwrap();
        db.upsert_analytics(fb, &EngagementStats { views: 50, ..stats }).await.unwrap();

        let totals = db.total_analytics().await.unwrap();
        assert_eq!(totals.videos, 1);
        assert_eq!(totals.uploads, 2);
        assert_eq!(totals.views, 350);
        assert_eq!(totals.likes, 20);

        let perf = db.platform_performance().await.unwrap();
        assert_eq!(perf.len(), 2);
        assert_eq!(perf[0].platform, "youtube");
        assert_eq!(perf[0].views, 300);
        assert_eq!(perf[1].platform, "facebook");
    }
}
