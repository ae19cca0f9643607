use crate::platform::Platform;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Speaking rate used for duration estimates.
pub const WORDS_PER_SECOND: f64 = 2.5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendItem {
    pub source: String,
    pub title: String,
    pub keywords: Vec<String>,
    pub score: i64,
    pub discovered_at: DateTime<Utc>,
    pub url: Option<String>,
    pub description: Option<String>,
}

impl TrendItem {
    pub fn new(source: impl Into<String>, title: impl Into<String>, score: i64) -> Self {
        Self {
            source: source.into(),
            title: title.into(),
            keywords: Vec::new(),
            score,
            discovered_at: Utc::now(),
            url: None,
            description: None,
        }
    }

    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Script {
    pub text: String,
    pub estimated_duration_secs: f64,
    pub provider: String,
}

impl Script {
    pub fn new(text: impl Into<String>, provider: impl Into<String>) -> Self {
        let text = text.into();
        let words = text.split_whitespace().count() as f64;
        Self {
            estimated_duration_secs: words / WORDS_PER_SECOND,
            text,
            provider: provider.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformVariant {
    pub title: String,
    pub description: String,
    /// Bare tags without the leading `#`.
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoMetadata {
    pub title: String,
    pub description: String,
    pub hashtags: Vec<String>,
    pub keywords: Vec<String>,
    pub variants: BTreeMap<Platform, PlatformVariant>,
}

impl VideoMetadata {
    /// Platform-adapted copy, or the base fields when no variant was derived.
    pub fn variant_for(&self, platform: Platform) -> PlatformVariant {
        self.variants.get(&platform).cloned().unwrap_or_else(|| PlatformVariant {
            title: self.title.clone(),
            description: self.description.clone(),
            tags: self.tags(),
        })
    }

    pub fn tags(&self) -> Vec<String> {
        self.hashtags
            .iter()
            .map(|h| h.trim_start_matches('#').to_string())
            .filter(|t| !t.is_empty())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoArtifact {
    pub path: PathBuf,
    pub duration_secs: f64,
    pub width: u32,
    pub height: u32,
    pub size_bytes: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadResult {
    pub platform: Platform,
    pub success: bool,
    pub remote_id: Option<String>,
    pub url: Option<String>,
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl UploadResult {
    pub fn succeeded(platform: Platform, remote: RemoteContent) -> Self {
        Self {
            platform,
            success: true,
            remote_id: Some(remote.id),
            url: remote.url,
            error: None,
            timestamp: Utc::now(),
        }
    }

    pub fn failed(platform: Platform, error: impl ToString) -> Self {
        Self {
            platform,
            success: false,
            remote_id: None,
            url: None,
            error: Some(error.to_string()),
            timestamp: Utc::now(),
        }
    }
}

/// Identifier of a published post as returned by a platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteContent {
    pub id: String,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngagementStats {
    pub views: i64,
    pub likes: i64,
    pub comments: i64,
    pub shares: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_estimates_duration_from_word_count() {
        let script = Script::new("one two three four five", "template");
        assert!((script.estimated_duration_secs - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn variant_falls_back_to_base_fields() {
        let meta = VideoMetadata {
            title: "T".into(),
            description: "D".into(),
            hashtags: vec!["#fashion".into(), "#".into()],
            keywords: vec![],
            variants: BTreeMap::new(),
        };
        let v = meta.variant_for(Platform::TikTok);
        assert_eq!(v.title, "T");
        assert_eq!(v.tags, vec!["fashion".to_string()]);
    }
}
