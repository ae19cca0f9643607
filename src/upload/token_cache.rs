use crate::config::OAuthClient;
use crate::error::{UploadError, snippet};
use crate::platform::Platform;
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::sync::Mutex;

/// Seconds shaved off a token's lifetime so it is never used right at expiry.
const EXPIRY_MARGIN_SECS: i64 = 60;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedToken {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub expires_at: DateTime<Utc>,
}

impl CachedToken {
    pub fn is_fresh(&self) -> bool {
        self.expires_at - Duration::seconds(EXPIRY_MARGIN_SECS) > Utc::now()
    }
}

/// One JSON file per platform under the token directory.
#[derive(Debug, Clone)]
pub struct TokenCache {
    dir: PathBuf,
}

impl TokenCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self, platform: Platform) -> PathBuf {
        self.dir.join(format!("{}.json", platform.as_str()))
    }

    /// A missing or corrupt file reads as "no token".
    pub async fn load(&self, platform: Platform) -> Option<CachedToken> {
        let raw = tokio::fs::read_to_string(self.path(platform)).await.ok()?;
        match serde_json::from_str(&raw) {
            Ok(token) => Some(token),
            Err(e) => {
                tracing::warn!(platform = %platform, error = %e, "ignoring unreadable token cache");
                None
            }
        }
    }

    pub async fn store(&self, platform: Platform, token: &CachedToken) -> Result<(), UploadError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let json = serde_json::to_string_pretty(token)
            .map_err(|e| UploadError::Api(format!("token serialize: {e}")))?;
        tokio::fs::write(self.path(platform), json).await?;
        Ok(())
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
}

/// How the client authenticates to the token endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientAuth {
    /// `client_id`/`client_secret` in the form body.
    Body,
    /// HTTP Basic with the client credentials.
    Basic,
}

/// Access token for a refresh-token OAuth2 client, cached on disk.
pub struct OAuthSession {
    platform: Platform,
    http: Client,
    token_url: String,
    creds: OAuthClient,
    auth: ClientAuth,
    cache: TokenCache,
    current: Mutex<Option<CachedToken>>,
}

impl OAuthSession {
    pub fn new(
        platform: Platform,
        http: Client,
        token_url: impl Into<String>,
        creds: OAuthClient,
        auth: ClientAuth,
        cache: TokenCache,
    ) -> Self {
        Self {
            platform,
            http,
            token_url: token_url.into(),
            creds,
            auth,
            cache,
            current: Mutex::new(None),
        }
    }

    /// A fresh access token: in memory, then on disk, then refreshed.
    pub async fn access_token(&self) -> Result<String, UploadError> {
        let mut current = self.current.lock().await;
        if let Some(tok) = current.as_ref().filter(|t| t.is_fresh()) {
            return Ok(tok.access_token.clone());
        }

        let cached = self.cache.load(self.platform).await;
        if let Some(tok) = cached.as_ref().filter(|t| t.is_fresh()) {
            tracing::debug!(platform = %self.platform, "using cached access token");
            *current = Some(tok.clone());
            return Ok(tok.access_token.clone());
        }

        // Rotated refresh tokens are only ever persisted in the cache.
        let refresh_token = cached
            .and_then(|t| t.refresh_token)
            .unwrap_or_else(|| self.creds.refresh_token.clone());
        let token = self.refresh(&refresh_token).await?;
        if let Err(e) = self.cache.store(self.platform, &token).await {
            tracing::warn!(platform = %self.platform, error = %e, "could not persist token cache");
        }
        let access = token.access_token.clone();
        *current = Some(token);
        Ok(access)
    }

    async fn refresh(&self, refresh_token: &str) -> Result<CachedToken, UploadError> {
        let mut form = vec![
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ];
        let mut req = self.http.post(&self.token_url);
        match self.auth {
            ClientAuth::Body => {
                form.push(("client_id", self.creds.client_id.as_str()));
                form.push(("client_secret", self.creds.client_secret.as_str()));
            }
            ClientAuth::Basic => {
                form.push(("client_id", self.creds.client_id.as_str()));
                req = req.basic_auth(&self.creds.client_id, Some(&self.creds.client_secret));
            }
        }

        let resp = req.form(&form).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(UploadError::Auth(format!(
                "token refresh returned HTTP {}: {}",
                status.as_u16(),
                snippet(&text)
            )));
        }

        let parsed: TokenResponse = resp
            .json()
            .await
            .map_err(|e| UploadError::Auth(format!("token response parse failed: {e}")))?;
        tracing::info!(platform = %self.platform, "access token refreshed");
        Ok(CachedToken {
            access_token: parsed.access_token,
            refresh_token: parsed.refresh_token.or_else(|| Some(refresh_token.to_string())),
            expires_at: Utc::now() + Duration::seconds(parsed.expires_in.unwrap_or(3600)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn freshness_respects_margin() {
        let tok = CachedToken {
            access_token: "a".into(),
            refresh_token: None,
            expires_at: Utc::now() + Duration::seconds(30),
        };
        assert!(!tok.is_fresh());
        let tok = CachedToken {
            expires_at: Utc::now() + Duration::hours(1),
            ..tok
        };
        assert!(tok.is_fresh());
    }

    #[tokio::test]
    async fn cache_round_trips_and_tolerates_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let cache = TokenCache::new(dir.path().join("tokens"));
        assert!(cache.load(Platform::YouTube).await.is_none());

        let tok = CachedToken {
            access_token: "abc".into(),
            refresh_token: Some("r".into()),
            expires_at: Utc::now() + Duration::hours(1),
        };
        cache.store(Platform::YouTube, &tok).await.unwrap();
        assert_eq!(cache.load(Platform::YouTube).await, Some(tok));

        tokio::fs::write(cache.path(Platform::Twitter), "not json").await.unwrap();
        assert!(cache.load(Platform::Twitter).await.is_none());
    }
}
