use crate::config::RedditCredentials;
use crate::models::TrendItem;
use crate::trends::{TrendSource, extract_keywords};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;

pub const SUBREDDITS: &[&str] = &[
    "fashion",
    "streetwear",
    "malefashion",
    "femalefashion",
    "streetwearstartup",
    "sneakers",
    "fashionreps",
    "DesignerReps",
    "frugalmalefashion",
    "frugalfemalefashion",
];

const MIN_SCORE: i64 = 100;
const HOT_LIMIT: u32 = 50;

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Deserialize)]
struct ListingData {
    children: Vec<Child>,
}

#[derive(Deserialize)]
struct Child {
    data: Post,
}

#[derive(Deserialize)]
struct Post {
    title: String,
    #[serde(default)]
    selftext: String,
    score: i64,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    created_utc: f64,
}

/// Hot posts across the fashion subreddits, via application-only OAuth.
pub struct RedditSource {
    client: Client,
    creds: RedditCredentials,
}

impl RedditSource {
    pub fn new(client: Client, creds: RedditCredentials) -> Self {
        Self { client, creds }
    }

    async fn access_token(&self) -> Result<String> {
        let resp = self
            .client
            .post("https://www.reddit.com/api/v1/access_token")
            .basic_auth(&self.creds.client_id, Some(&self.creds.client_secret))
            .header("User-Agent", &self.creds.user_agent)
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .context("Reddit token request failed")?;

        let status = resp.status();
        if !status.is_success() {
            anyhow::bail!("Reddit token request returned HTTP {}", status.as_u16());
        }
        let token: TokenResponse = resp.json().await.context("Reddit token parse failed")?;
        Ok(token.access_token)
    }
}

#[async_trait]
impl TrendSource for RedditSource {
    fn name(&self) -> &'static str {
        "reddit"
    }

    async fn fetch(&self) -> Result<Vec<TrendItem>> {
        let token = self.access_token().await?;
        let url = format!(
            "https://oauth.reddit.com/r/{}/hot?limit={HOT_LIMIT}",
            SUBREDDITS.join("+")
        );

        let resp = self
            .client
            .get(url)
            .bearer_auth(token)
            .header("User-Agent", &self.creds.user_agent)
            .send()
            .await
            .context("Reddit listing request failed")?;

        let status = resp.status();
        if !status.is_success() {
            anyhow::bail!("Reddit listing returned HTTP {}", status.as_u16());
        }
        let listing: Listing = resp.json().await.context("Reddit listing parse failed")?;

        Ok(posts_to_trends(
            listing.data.children.into_iter().map(|c| c.data),
        ))
    }
}

fn posts_to_trends(posts: impl Iterator<Item = Post>) -> Vec<TrendItem> {
    posts
        .filter(|p| p.score >= MIN_SCORE)
        .map(|p| {
            let mut item = TrendItem::new("reddit", p.title.clone(), p.score)
                .with_keywords(extract_keywords(&p.title));
            if let Some(ts) = DateTime::<Utc>::from_timestamp(p.created_utc as i64, 0) {
                item.discovered_at = ts;
            }
            item.url = p.url;
            if !p.selftext.is_empty() {
                item.description = Some(p.selftext.chars().take(500).collect());
            }
            item
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn low_score_posts_are_dropped() {
        let raw = r#"{"data":{"children":[
            {"data":{"title":"Best leather jacket under 200","selftext":"","score":450,"url":"https://r.it/a","created_utc":1700000000.0}},
            {"data":{"title":"Rate my fit","selftext":"pls","score":12,"created_utc":1700000000.0}}
        ]}}"#;
        let listing: Listing = serde_json::from_str(raw).unwrap();
        let items = posts_to_trends(listing.data.children.into_iter().map(|c| c.data));
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].score, 450);
        assert_eq!(items[0].keywords, vec!["jacket".to_string()]);
        assert_eq!(items[0].discovered_at.timestamp(), 1_700_000_000);
    }
}
