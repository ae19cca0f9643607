pub mod fallback;
pub mod google;
pub mod reddit;
pub mod similarity;
pub mod twitter;

use crate::models::TrendItem;
use anyhow::Result;
use async_trait::async_trait;

pub use similarity::{extract_keywords, is_fashion_related, title_similarity};

/// A read API that yields trend candidates.
#[async_trait]
pub trait TrendSource: Send + Sync {
    fn name(&self) -> &'static str;
    async fn fetch(&self) -> Result<Vec<TrendItem>>;
}

pub struct TrendAggregator {
    sources: Vec<Box<dyn TrendSource>>,
    threshold: f64,
    use_fallback: bool,
}

impl TrendAggregator {
    pub fn new(sources: Vec<Box<dyn TrendSource>>, threshold: f64) -> Self {
        Self {
            sources,
            threshold,
            use_fallback: true,
        }
    }

    /// Disable the curated list used when every source comes back empty.
    pub fn without_fallback(mut self) -> Self {
        self.use_fallback = false;
        self
    }

    pub fn source_names(&self) -> Vec<&'static str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    /// Query every source, merge, dedupe and rank. Source failures are logged
    /// and contribute nothing.
    pub async fn fetch(&self, limit: usize) -> Vec<TrendItem> {
        let mut all = Vec::new();
        for source in &self.sources {
            match source.fetch().await {
                Ok(mut items) => {
                    tracing::info!(source = source.name(), count = items.len(), "trend source fetched");
                    all.append(&mut items);
                }
                Err(e) => {
                    tracing::warn!(source = source.name(), error = %e, "trend source failed");
                }
            }
        }

        if all.is_empty() && self.use_fallback {
            tracing::warn!("no trends from any source, using curated fallback list");
            all = fallback::fallback_trends(limit);
        }

        let mut unique = dedupe(all, self.threshold);
        unique.truncate(limit);
        tracing::info!(count = unique.len(), "unique trends selected");
        unique
    }
}

/// Remove near-duplicate titles, keeping the higher-scored item of any pair
/// whose similarity exceeds `threshold`. Output is sorted by score descending.
pub fn dedupe(mut items: Vec<TrendItem>, threshold: f64) -> Vec<TrendItem> {
    items.sort_by(|a, b| b.score.cmp(&a.score));

    let mut kept: Vec<TrendItem> = Vec::with_capacity(items.len());
    for item in items {
        let duplicate = kept
            .iter()
            .any(|k| title_similarity(&k.title, &item.title) > threshold);
        if duplicate {
            tracing::debug!(title = %item.title, "dropping near-duplicate trend");
            continue;
        }
        kept.push(item);
    }
    kept
}

/// Keep trends whose title or keywords mention any word of `niche`.
pub fn filter_niche(items: &[TrendItem], niche: &str, limit: usize) -> Vec<TrendItem> {
    let niche_words: Vec<String> = niche
        .to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect();

    items
        .iter()
        .filter(|t| {
            let text = format!("{} {}", t.title, t.keywords.join(" ")).to_lowercase();
            niche_words.iter().any(|w| text.contains(w.as_str()))
        })
        .take(limit)
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trend(title: &str, score: i64) -> TrendItem {
        TrendItem::new("test", title, score)
    }

    #[test]
    fn higher_score_survives_near_duplicate() {
        let out = dedupe(
            vec![
                trend("Oversized blazer styling tips", 10),
                trend("oversized blazer styling tips!", 50),
            ],
            0.7,
        );
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].score, 50);
    }

    #[test]
    fn output_is_sorted_descending() {
        let out = dedupe(
            vec![
                trend("Cargo pants comeback", 5),
                trend("Dopamine dressing colors", 300),
                trend("Trench coat style guide", 40),
            ],
            0.7,
        );
        let scores: Vec<i64> = out.iter().map(|t| t.score).collect();
        assert_eq!(scores, vec![300, 40, 5]);
    }

    #[test]
    fn niche_filter_matches_keywords() {
        let items = vec![
            trend("Winter layering", 1).with_keywords(["streetwear"]),
            trend("Old money style guide", 2),
        ];
        let out = filter_niche(&items, "Streetwear", 5);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].title, "Winter layering");
    }
}
