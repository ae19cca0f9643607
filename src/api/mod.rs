pub mod elevenlabs;
pub mod google_tts;
pub mod huggingface;
pub mod ollama;
pub mod openai;
pub mod pexels;
pub mod unsplash;

use anyhow::{Context, Result};
use reqwest::{Client, ClientBuilder};
use std::time::Duration;

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

fn builder() -> ClientBuilder {
    Client::builder()
        .user_agent(USER_AGENT)
        .connect_timeout(Duration::from_secs(10))
        .timeout(Duration::from_secs(120))
        .gzip(true)
}

/// Shared HTTP client. Individual calls override the timeout where needed.
pub fn http_client() -> Result<Client> {
    builder().build().context("Failed to build HTTP client")
}

/// Client that keeps cookies between requests, for endpoints that hand out a
/// session cookie before answering API calls.
pub fn cookie_client() -> Result<Client> {
    builder()
        .cookie_store(true)
        .build()
        .context("Failed to build cookie HTTP client")
}

/// Fetch a remote file into `dest`.
pub(crate) async fn download(
    client: &Client,
    provider: &'static str,
    url: &str,
    dest: &std::path::Path,
) -> std::result::Result<(), crate::error::ProviderError> {
    use crate::error::ProviderError;

    let resp = client
        .get(url)
        .timeout(Duration::from_secs(60))
        .send()
        .await
        .map_err(ProviderError::network(provider))?;
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(ProviderError::from_status(provider, status, body));
    }

    let bytes = resp.bytes().await.map_err(ProviderError::network(provider))?;
    if bytes.is_empty() {
        return Err(ProviderError::Empty { provider });
    }
    tokio::fs::write(dest, &bytes)
        .await
        .map_err(|source| ProviderError::Io { provider, source })
}
