use crate::logw;
use crate::models::TrendItem;
use crate::trends::{TrendSource, is_fashion_related};
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::{Datelike, Utc};
use once_cell::sync::OnceCell;
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};

const HOME: &str = "https://trends.google.com/?geo=US";
const DAILY_RSS: &str = "https://trends.google.com/trending/rss?geo=US";
const EXPLORE: &str = "https://trends.google.com/trends/api/explore";
const MULTILINE: &str = "https://trends.google.com/trends/api/widgetdata/multiline";

const TRENDING_CHECKED: usize = 20;
const TRENDING_SCORE: i64 = 80;
const MIN_INTEREST: i64 = 20;

/// Daily trending searches filtered to fashion, plus last-day interest in a
/// few fixed fashion queries.
pub struct GoogleTrendsSource {
    client: Client,
}

impl GoogleTrendsSource {
    /// `client` should keep cookies; the explore API refuses cookieless calls.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    async fn trending_searches(&self) -> Result<Vec<TrendItem>> {
        let resp = self
            .client
            .get(DAILY_RSS)
            .send()
            .await
            .context("Google Trends RSS request failed")?;
        let status = resp.status();
        if !status.is_success() {
            anyhow::bail!("Google Trends RSS returned HTTP {}", status.as_u16());
        }
        let xml = resp.text().await.context("Google Trends RSS read failed")?;
        Ok(fashion_searches(&parse_rss_titles(&xml)))
    }

    async fn interest(&self) -> Result<Vec<TrendItem>> {
        let queries = fashion_queries(Utc::now().year());

        // Seeds the session cookie.
        self.client.get(HOME).send().await.context("Google Trends home request failed")?;

        let req = json!({
            "comparisonItem": queries
                .iter()
                .map(|q| json!({"keyword": q, "geo": "US", "time": "now 1-d"}))
                .collect::<Vec<_>>(),
            "category": 0,
            "property": "",
        });
        let explore: Explore = self.get_guarded(EXPLORE, &req.to_string(), None).await?;
        let widget = explore
            .widgets
            .into_iter()
            .find(|w| w.id == "TIMESERIES")
            .ok_or_else(|| anyhow!("Google Trends explore answer has no TIMESERIES widget"))?;

        let series: Multiline = self
            .get_guarded(MULTILINE, &widget.request.to_string(), Some(widget.token.as_str()))
            .await?;
        Ok(interest_trends(&queries, &series))
    }

    async fn get_guarded<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        req: &str,
        token: Option<&str>,
    ) -> Result<T> {
        let mut query = vec![("hl", "en-US"), ("tz", "360"), ("req", req)];
        if let Some(token) = token {
            query.push(("token", token));
        }
        let resp = self
            .client
            .get(url)
            .query(&query)
            .send()
            .await
            .with_context(|| format!("Google Trends request to {url} failed"))?;
        let status = resp.status();
        if !status.is_success() {
            anyhow::bail!("Google Trends {url} returned HTTP {}", status.as_u16());
        }
        let body = resp.text().await?;
        serde_json::from_str(strip_guard(&body))
            .with_context(|| format!("Google Trends {url} parse failed"))
    }
}

#[async_trait]
impl TrendSource for GoogleTrendsSource {
    fn name(&self) -> &'static str {
        "google_trends"
    }

    async fn fetch(&self) -> Result<Vec<TrendItem>> {
        let (trending, interest) = tokio::join!(self.trending_searches(), self.interest());
        match (trending, interest) {
            (Err(a), Err(b)) => Err(a.context(format!("interest lookup also failed: {b:#}"))),
            (trending, interest) => {
                let mut out = Vec::new();
                for part in [trending, interest] {
                    match part {
                        Ok(items) => out.extend(items),
                        Err(e) => logw(format!("Google Trends partially failed: {e:#}")),
                    }
                }
                Ok(out)
            }
        }
    }
}

#[derive(Deserialize)]
struct Explore {
    #[serde(default)]
    widgets: Vec<Widget>,
}

#[derive(Deserialize)]
struct Widget {
    id: String,
    #[serde(default)]
    token: String,
    #[serde(default)]
    request: Value,
}

#[derive(Deserialize)]
struct Multiline {
    default: Timeline,
}

#[derive(Deserialize)]
struct Timeline {
    #[serde(rename = "timelineData", default)]
    timeline_data: Vec<Point>,
}

#[derive(Deserialize)]
struct Point {
    #[serde(default)]
    value: Vec<i64>,
}

fn fashion_queries(year: i32) -> Vec<String> {
    vec![
        "fashion trends".into(),
        "street style".into(),
        "outfit ideas".into(),
        format!("fashion {year}"),
    ]
}

/// The JSON API prefixes every answer with `)]}'` (sometimes followed by a comma).
fn strip_guard(body: &str) -> &str {
    body.trim_start()
        .strip_prefix(")]}'")
        .map(|rest| rest.trim_start_matches(',').trim_start())
        .unwrap_or(body)
}

fn parse_rss_titles(xml: &str) -> Vec<String> {
    static RE_ITEM_TITLE: OnceCell<Regex> = OnceCell::new();
    let re = RE_ITEM_TITLE.get_or_init(|| Regex::new(r"(?s)<item>.*?<title>(.*?)</title>").unwrap());
    re.captures_iter(xml)
        .map(|c| decode_entities(strip_cdata(c[1].trim())))
        .filter(|t| !t.is_empty())
        .collect()
}

fn strip_cdata(s: &str) -> &str {
    s.strip_prefix("<![CDATA[")
        .and_then(|rest| rest.strip_suffix("]]>"))
        .unwrap_or(s)
}

fn decode_entities(s: &str) -> String {
    s.replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

fn fashion_searches(titles: &[String]) -> Vec<TrendItem> {
    titles
        .iter()
        .take(TRENDING_CHECKED)
        .filter(|t| is_fashion_related(t))
        .map(|t| TrendItem::new("google_trends", t.clone(), TRENDING_SCORE).with_keywords([t.clone()]))
        .collect()
}

/// One trend per query whose mean interest over the window exceeds the floor.
fn interest_trends(queries: &[String], series: &Multiline) -> Vec<TrendItem> {
    let points = &series.default.timeline_data;
    if points.is_empty() {
        return Vec::new();
    }
    queries
        .iter()
        .enumerate()
        .filter_map(|(i, query)| {
            let values: Vec<i64> = points.iter().filter_map(|p| p.value.get(i).copied()).collect();
            if values.is_empty() {
                return None;
            }
            let mean = values.iter().sum::<i64>() / values.len() as i64;
            (mean > MIN_INTEREST).then(|| {
                TrendItem::new("google_trends", format!("Growing interest in {query}"), mean)
                    .with_keywords([query.clone()])
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rss_titles_are_decoded_and_filtered_to_fashion() {
        let xml = r#"<rss><channel><title>Daily Search Trends</title>
            <item><title>Met Gala outfit recap</title><ht:approx_traffic>200K+</ht:approx_traffic></item>
            <item><title><![CDATA[Lakers vs Celtics]]></title></item>
            <item><title>Zara &amp; H&amp;M street style</title></item>
        </channel></rss>"#;
        let titles = parse_rss_titles(xml);
        assert_eq!(
            titles,
            vec!["Met Gala outfit recap", "Lakers vs Celtics", "Zara & H&M street style"]
        );

        let items = fashion_searches(&titles);
        assert_eq!(items.len(), 2);
        assert!(items.iter().all(|t| t.source == "google_trends" && t.score == 80));
        assert_eq!(items[0].keywords, vec!["Met Gala outfit recap".to_string()]);
    }

    #[test]
    fn interest_keeps_queries_above_the_floor() {
        let body = r#")]}',
{"default":{"timelineData":[
  {"time":"1","value":[30,10,50,0],"hasData":[true,true,true,false]},
  {"time":"2","value":[40,20,70,0]}
]}}"#;
        let series: Multiline = serde_json::from_str(strip_guard(body)).unwrap();
        let queries = fashion_queries(2025);
        let items = interest_trends(&queries, &series);

        let got: Vec<(&str, i64)> = items.iter().map(|t| (t.title.as_str(), t.score)).collect();
        assert_eq!(
            got,
            vec![
                ("Growing interest in fashion trends", 35),
                ("Growing interest in outfit ideas", 60),
            ]
        );
    }

    #[test]
    fn explore_guard_without_comma() {
        let body = ")]}'\n{\"widgets\":[{\"id\":\"TIMESERIES\",\"token\":\"abc\",\"request\":{\"time\":\"now 1-d\"}}]}";
        let explore: Explore = serde_json::from_str(strip_guard(body)).unwrap();
        assert_eq!(explore.widgets[0].token, "abc");
        assert_eq!(explore.widgets[0].request["time"], "now 1-d");
    }
}
