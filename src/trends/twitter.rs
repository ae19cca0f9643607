use crate::models::TrendItem;
use crate::logw;
use crate::trends::{TrendSource, extract_keywords};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::future::Future;

pub const HASHTAGS: &[&str] = &[
    "#fashion",
    "#ootd",
    "#streetwear",
    "#fashiontrends",
    "#style",
    "#outfitinspo",
    "#fashionista",
];

const QUERIED_HASHTAGS: usize = 5;
const MIN_ENGAGEMENT: i64 = 50;

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<Tweet>,
}

#[derive(Deserialize)]
struct Tweet {
    text: String,
    public_metrics: Metrics,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
struct Metrics {
    like_count: i64,
    retweet_count: i64,
}

/// Recent-search over a few fashion hashtags, scored by likes plus retweets.
pub struct TwitterSource {
    client: Client,
    bearer_token: String,
}

impl TwitterSource {
    pub fn new(client: Client, bearer_token: String) -> Self {
        Self {
            client,
            bearer_token,
        }
    }
}

#[async_trait]
impl TrendSource for TwitterSource {
    fn name(&self) -> &'static str {
        "twitter"
    }

    async fn fetch(&self) -> Result<Vec<TrendItem>> {
        let tags: Vec<&'static str> = HASHTAGS.iter().take(QUERIED_HASHTAGS).copied().collect();
        gather(tags, |tag| self.search(tag)).await
    }
}

impl TwitterSource {
    async fn search(&self, tag: &str) -> Result<Vec<TrendItem>> {
        let query = format!("{tag} -is:retweet lang:en");
        let resp = self
            .client
            .get("https://api.x.com/2/tweets/search/recent")
            .bearer_auth(&self.bearer_token)
            .query(&[
                ("query", query.as_str()),
                ("max_results", "10"),
                ("tweet.fields", "public_metrics,created_at"),
            ])
            .send()
            .await
            .context("Twitter search request failed")?;

        let status = resp.status();
        if !status.is_success() {
            anyhow::bail!("Twitter search for {tag} returned HTTP {}", status.as_u16());
        }
        let body: SearchResponse = resp.json().await.context("Twitter search parse failed")?;
        Ok(tweets_to_trends(body.data))
    }
}

/// Run `search` for every tag, skipping tags that fail. Errors only when
/// every tag failed.
async fn gather<'a, F, Fut>(
    tags: impl IntoIterator<Item = &'a str>,
    mut search: F,
) -> Result<Vec<TrendItem>>
where
    F: FnMut(&'a str) -> Fut,
    Fut: Future<Output = Result<Vec<TrendItem>>>,
{
    let mut out = Vec::new();
    let mut succeeded = 0;
    let mut last_err = None;
    for tag in tags {
        match search(tag).await {
            Ok(items) => {
                succeeded += 1;
                out.extend(items);
            }
            Err(e) => {
                logw(format!("Twitter search for {tag} failed: {e:#}"));
                last_err = Some(e);
            }
        }
    }
    match last_err {
        Some(e) if succeeded == 0 => Err(e),
        _ => Ok(out),
    }
}

fn tweets_to_trends(tweets: Vec<Tweet>) -> Vec<TrendItem> {
    tweets
        .into_iter()
        .filter_map(|t| {
            let engagement = t.public_metrics.like_count + t.public_metrics.retweet_count;
            if engagement <= MIN_ENGAGEMENT {
                return None;
            }
            let title: String = t.text.chars().take(100).collect();
            let mut item =
                TrendItem::new("twitter", title, engagement).with_keywords(extract_keywords(&t.text));
            if let Some(ts) = t.created_at {
                item.discovered_at = ts;
            }
            item.description = Some(t.text);
            Some(item)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engagement_is_likes_plus_retweets() {
        let raw = r#"{"data":[
            {"text":"Cargo pants are back #streetwear","public_metrics":{"like_count":40,"retweet_count":30,"reply_count":1},"created_at":"2024-03-01T10:00:00Z"},
            {"text":"meh","public_metrics":{"like_count":20,"retweet_count":30}}
        ]}"#;
        let body: SearchResponse = serde_json::from_str(raw).unwrap();
        let items = tweets_to_trends(body.data);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].score, 70);
        assert_eq!(items[0].keywords, vec!["pants".to_string(), "streetwear".to_string()]);
    }

    #[tokio::test]
    async fn failing_hashtag_keeps_the_others() {
        let items = gather(["#fashion", "#ootd", "#style"], |tag| async move {
            if tag == "#ootd" {
                anyhow::bail!("HTTP 429");
            }
            Ok::<_, anyhow::Error>(vec![TrendItem::new("twitter", tag, 60)])
        })
        .await
        .unwrap();
        let titles: Vec<&str> = items.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["#fashion", "#style"]);
    }

    #[tokio::test]
    async fn every_hashtag_failing_is_an_error() {
        let err = gather(["#fashion", "#ootd"], |_| async {
            Err::<Vec<TrendItem>, _>(anyhow::anyhow!("HTTP 503"))
        })
            .await
            .unwrap_err();
        assert!(err.to_string().contains("503"));
    }

    #[test]
    fn missing_data_is_empty() {
        let body: SearchResponse = serde_json::from_str(r#"{"meta":{"result_count":0}}"#).unwrap();
        assert!(body.data.is_empty());
    }
}
