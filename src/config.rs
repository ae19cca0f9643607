use crate::platform::Platform;
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.7;

#[derive(Debug, Clone, PartialEq)]
pub struct OAuthClient {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GraphAccount {
    pub account_id: String,
    pub access_token: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RedditCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub user_agent: String,
}

/// Runtime settings, sourced from the process environment (and `.env`).
#[derive(Debug, Clone)]
pub struct Config {
    pub groq_key: Option<String>,
    pub openai_key: Option<String>,
    pub huggingface_key: Option<String>,
    pub ollama_enabled: bool,
    pub ollama_base_url: String,

    pub reddit: Option<RedditCredentials>,
    pub google_trends_enabled: bool,
    pub twitter_bearer_token: Option<String>,

    pub pexels_key: Option<String>,
    pub unsplash_key: Option<String>,
    pub elevenlabs_key: Option<String>,
    pub eleven_voice_id: String,
    pub eleven_model_id: String,

    pub youtube: Option<OAuthClient>,
    pub tiktok_access_token: Option<String>,
    pub instagram: Option<GraphAccount>,
    pub twitter: Option<OAuthClient>,
    pub facebook: Option<GraphAccount>,
    pub enabled_platforms: Vec<Platform>,

    pub output_dir: PathBuf,
    pub data_dir: PathBuf,
    pub database_path: PathBuf,
    pub daily_videos_count: usize,
    pub upload_stagger_minutes: u64,
    pub upload_workers: usize,
    pub similarity_threshold: f64,
    pub log_level: String,
}

fn default_voice_id() -> String {
    "JBFqnCBsd6RMkjVDRZzb".to_string()
}

fn default_model_id() -> String {
    "eleven_multilingual_v2".to_string()
}

impl Config {
    /// Load `.env` (if any) and read the process environment.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let reddit = match (get("REDDIT_CLIENT_ID"), get("REDDIT_CLIENT_SECRET")) {
            (Some(client_id), Some(client_secret)) => Some(RedditCredentials {
                client_id,
                client_secret,
                user_agent: get("REDDIT_USER_AGENT")
                    .unwrap_or_else(|| "fashion_agent_v1.0".to_string()),
            }),
            _ => None,
        };

        let oauth = |prefix: &str| {
            match (
                get(&format!("{prefix}_CLIENT_ID")),
                get(&format!("{prefix}_CLIENT_SECRET")),
                get(&format!("{prefix}_REFRESH_TOKEN")),
            ) {
                (Some(client_id), Some(client_secret), Some(refresh_token)) => Some(OAuthClient {
                    client_id,
                    client_secret,
                    refresh_token,
                }),
                _ => None,
            }
        };

        let graph = |id_key: &str, token_key: &str| match (get(id_key), get(token_key)) {
            (Some(account_id), Some(access_token)) => Some(GraphAccount {
                account_id,
                access_token,
            }),
            _ => None,
        };

        let data_dir = PathBuf::from(get("DATA_DIR").unwrap_or_else(|| "data".to_string()));
        let database_path = get("DATABASE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join("agent.db"));

        let mut cfg = Config {
            groq_key: get("GROQ_API_KEY"),
            openai_key: get("OPENAI_API_KEY"),
            huggingface_key: get("HUGGINGFACE_API_KEY"),
            ollama_enabled: parse_bool(get("OLLAMA_ENABLED").as_deref()),
            ollama_base_url: get("OLLAMA_BASE_URL")
                .unwrap_or_else(|| "http://localhost:11434".to_string()),
            reddit,
            google_trends_enabled: get("GOOGLE_TRENDS_ENABLED")
                .map_or(true, |v| parse_bool(Some(v.as_str()))),
            twitter_bearer_token: get("TWITTER_BEARER_TOKEN"),
            pexels_key: get("PEXELS_API_KEY"),
            unsplash_key: get("UNSPLASH_ACCESS_KEY"),
            elevenlabs_key: get("ELEVENLABS_API_KEY"),
            eleven_voice_id: get("ELEVENLABS_VOICE_ID").unwrap_or_else(default_voice_id),
            eleven_model_id: get("ELEVENLABS_MODEL_ID").unwrap_or_else(default_model_id),
            youtube: oauth("YOUTUBE"),
            tiktok_access_token: get("TIKTOK_ACCESS_TOKEN"),
            instagram: graph("INSTAGRAM_USER_ID", "INSTAGRAM_ACCESS_TOKEN"),
            twitter: oauth("TWITTER"),
            facebook: graph("FACEBOOK_PAGE_ID", "FACEBOOK_ACCESS_TOKEN"),
            enabled_platforms: Vec::new(),
            output_dir: PathBuf::from(get("OUTPUT_DIR").unwrap_or_else(|| "output/videos".to_string())),
            data_dir,
            database_path,
            daily_videos_count: parse_num(get("DAILY_VIDEOS_COUNT"), "DAILY_VIDEOS_COUNT", 10)?,
            upload_stagger_minutes: parse_num(
                get("UPLOAD_STAGGER_MINUTES"),
                "UPLOAD_STAGGER_MINUTES",
                60,
            )?,
            upload_workers: parse_num(get("UPLOAD_WORKERS"), "UPLOAD_WORKERS", 4)?,
            similarity_threshold: parse_num(
                get("SIMILARITY_THRESHOLD"),
                "SIMILARITY_THRESHOLD",
                DEFAULT_SIMILARITY_THRESHOLD,
            )?,
            log_level: get("LOG_LEVEL")
                .map(|v| v.to_ascii_lowercase())
                .unwrap_or_else(|| "info".to_string()),
        };

        if !(0.0..=1.0).contains(&cfg.similarity_threshold) {
            anyhow::bail!(
                "SIMILARITY_THRESHOLD must be within 0..=1, got {}",
                cfg.similarity_threshold
            );
        }
        if cfg.upload_workers == 0 {
            anyhow::bail!("UPLOAD_WORKERS must be at least 1");
        }

        cfg.enabled_platforms = match get("ENABLED_PLATFORMS") {
            Some(list) => {
                let mut platforms = Vec::new();
                for name in list.split(',').filter(|s| !s.trim().is_empty()) {
                    let platform = Platform::from_str(name)
                        .with_context(|| format!("ENABLED_PLATFORMS entry {name:?}"))?;
                    if !cfg.has_credentials(platform) {
                        anyhow::bail!("{platform} is enabled but its credentials are missing");
                    }
                    if !platforms.contains(&platform) {
                        platforms.push(platform);
                    }
                }
                platforms
            }
            None => Platform::ALL
                .into_iter()
                .filter(|p| cfg.has_credentials(*p))
                .collect(),
        };

        Ok(cfg)
    }

    pub fn has_credentials(&self, platform: Platform) -> bool {
        match platform {
            Platform::YouTube => self.youtube.is_some(),
            Platform::TikTok => self.tiktok_access_token.is_some(),
            Platform::Instagram => self.instagram.is_some(),
            Platform::Twitter => self.twitter.is_some(),
            Platform::Facebook => self.facebook.is_some(),
        }
    }

    pub fn token_dir(&self) -> PathBuf {
        self.data_dir.join("tokens")
    }
}

fn parse_bool(value: Option<&str>) -> bool {
    matches!(
        value.map(|v| v.to_ascii_lowercase()).as_deref(),
        Some("1" | "true" | "yes" | "on")
    )
}

fn parse_num<T>(value: Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match value {
        Some(raw) => raw
            .parse::<T>()
            .with_context(|| format!("{key}: invalid value {raw:?}")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_environment_is_empty() {
        let cfg = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(cfg.daily_videos_count, 10);
        assert_eq!(cfg.upload_stagger_minutes, 60);
        assert_eq!(cfg.similarity_threshold, 0.7);
        assert_eq!(cfg.output_dir, PathBuf::from("output/videos"));
        assert_eq!(cfg.database_path, PathBuf::from("data/agent.db"));
        assert!(cfg.enabled_platforms.is_empty());
        assert!(!cfg.ollama_enabled);
        assert!(cfg.google_trends_enabled);
    }

    #[test]
    fn platforms_default_to_those_with_credentials() {
        let cfg = Config::from_lookup(lookup(&[
            ("TIKTOK_ACCESS_TOKEN", "tok"),
            ("FACEBOOK_PAGE_ID", "123"),
            ("FACEBOOK_ACCESS_TOKEN", "fb"),
            ("INSTAGRAM_USER_ID", "only-half"),
        ]))
        .unwrap();
        assert_eq!(
            cfg.enabled_platforms,
            vec![Platform::TikTok, Platform::Facebook]
        );
    }

    #[test]
    fn explicitly_enabled_platform_without_credentials_is_fatal() {
        let err = Config::from_lookup(lookup(&[("ENABLED_PLATFORMS", "youtube")])).unwrap_err();
        assert!(err.to_string().contains("youtube"));
    }

    #[test]
    fn bad_numbers_are_rejected() {
        assert!(Config::from_lookup(lookup(&[("DAILY_VIDEOS_COUNT", "ten")])).is_err());
        assert!(Config::from_lookup(lookup(&[("SIMILARITY_THRESHOLD", "1.5")])).is_err());
        assert!(Config::from_lookup(lookup(&[("UPLOAD_WORKERS", "0")])).is_err());
    }

    #[test]
    fn blank_values_count_as_unset() {
        let cfg = Config::from_lookup(lookup(&[
            ("GROQ_API_KEY", "  "),
            ("OLLAMA_ENABLED", "True"),
            ("GOOGLE_TRENDS_ENABLED", "off"),
        ]))
        .unwrap();
        assert!(cfg.groq_key.is_none());
        assert!(cfg.ollama_enabled);
        assert!(!cfg.google_trends_enabled);
    }
}
