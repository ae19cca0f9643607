use crate::models::{PlatformVariant, TrendItem, VideoMetadata};
use crate::platform::Platform;
use serde::Deserialize;
use std::collections::BTreeMap;

#[derive(Debug, Deserialize)]
struct RawMetadata {
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    hashtags: Vec<String>,
    #[serde(default)]
    keywords: Vec<String>,
}

pub(crate) fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

fn ellipsize(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    format!("{}...", truncate_chars(s, max.saturating_sub(3)))
}

/// Strip a surrounding markdown code fence, if present.
fn strip_fence(raw: &str) -> &str {
    let raw = raw.trim();
    let inner = if let Some((_, rest)) = raw.split_once("```json") {
        rest
    } else if let Some((_, rest)) = raw.split_once("```") {
        rest
    } else {
        return raw;
    };
    inner.split("```").next().unwrap_or(inner).trim()
}

/// Parse a model's JSON metadata answer. `None` when it is unusable.
pub fn parse_metadata(raw: &str, trend: &TrendItem) -> Option<VideoMetadata> {
    let parsed: RawMetadata = serde_json::from_str(strip_fence(raw)).ok()?;
    let title = parsed.title.trim();
    if title.is_empty() {
        return None;
    }

    let hashtags: Vec<String> = parsed
        .hashtags
        .iter()
        .map(|h| h.trim().trim_start_matches('#').replace(' ', ""))
        .filter(|h| !h.is_empty())
        .map(|h| format!("#{h}"))
        .collect();

    let keywords = if parsed.keywords.is_empty() {
        trend.keywords.clone()
    } else {
        parsed.keywords
    };

    Some(VideoMetadata {
        title: truncate_chars(title, 100),
        description: parsed.description.trim().to_string(),
        hashtags,
        keywords,
        variants: BTreeMap::new(),
    })
}

fn hashtag_line(tags: &[String], max: usize) -> String {
    tags.iter()
        .take(max)
        .map(|t| format!("#{t}"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Title/description/tags tuned to one platform's conventions.
pub fn adapt_for_platform(meta: &VideoMetadata, platform: Platform) -> PlatformVariant {
    let tags = meta.tags();
    let (title, description) = match platform {
        Platform::YouTube => (
            format!("{} #Shorts", meta.title),
            format!("{}\n\n#Shorts #Fashion", meta.description),
        ),
        Platform::TikTok => (
            meta.title.clone(),
            format!("{}\n\n{}", ellipsize(&meta.description, 100), hashtag_line(&tags, 5)),
        ),
        Platform::Instagram => (
            meta.title.clone(),
            format!("{}\n\n{}", meta.description, hashtag_line(&tags, 30)),
        ),
        Platform::Twitter => (
            meta.title.clone(),
            format!("{} {}", truncate_chars(&meta.description, 200), hashtag_line(&tags, 3)),
        ),
        Platform::Facebook => (
            meta.title.clone(),
            truncate_chars(
                &format!("{}\n\n{}", meta.description, hashtag_line(&tags, 10)),
                1000,
            ),
        ),
    };
    PlatformVariant {
        title,
        description: description.trim_end().to_string(),
        tags,
    }
}

/// Fill `meta.variants` for every platform.
pub fn with_variants(mut meta: VideoMetadata) -> VideoMetadata {
    meta.variants = Platform::ALL
        .into_iter()
        .map(|p| (p, adapt_for_platform(&meta, p)))
        .collect();
    meta
}
