use crate::api::pexels::file_stem;
use crate::error::ProviderError;
use crate::media::{MediaAsset, MediaKind, Orientation, StockMediaProvider};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::path::Path;

const PROVIDER: &str = "unsplash";
const MAX_IMAGES: usize = 5;

#[derive(Deserialize)]
struct SearchResp {
    #[serde(default)]
    results: Vec<Photo>,
}

#[derive(Deserialize)]
struct Photo {
    urls: PhotoUrls,
}

#[derive(Deserialize)]
struct PhotoUrls {
    regular: String,
}

/// Stock photos, rendered as slow-zoom stills.
pub struct Unsplash {
    client: Client,
    access_key: String,
}

impl Unsplash {
    pub fn new(client: Client, access_key: impl Into<String>) -> Self {
        Self {
            client,
            access_key: access_key.into(),
        }
    }
}

#[async_trait]
impl StockMediaProvider for Unsplash {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn fetch(
        &self,
        keyword: &str,
        orientation: Orientation,
        dest_dir: &Path,
    ) -> Result<Vec<MediaAsset>, ProviderError> {
        let resp = self
            .client
            .get("https://api.unsplash.com/search/photos")
            .header("Authorization", format!("Client-ID {}", self.access_key))
            .query(&[
                ("query", keyword),
                ("per_page", "5"),
                ("orientation", orientation.as_str()),
            ])
            .send()
            .await
            .map_err(ProviderError::network(PROVIDER))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ProviderError::from_status(PROVIDER, status, body));
        }
        let found: SearchResp = resp.json().await.map_err(|e| ProviderError::Parse {
            provider: PROVIDER,
            message: e.to_string(),
        })?;

        let mut assets = Vec::new();
        for photo in found.results.iter().take(MAX_IMAGES) {
            let path = dest_dir.join(format!("{}.jpg", file_stem(PROVIDER, keyword, assets.len())));
            match crate::api::download(&self.client, PROVIDER, &photo.urls.regular, &path).await {
                Ok(()) => assets.push(MediaAsset {
                    path,
                    kind: MediaKind::Image,
                    provider: PROVIDER,
                }),
                Err(e) => tracing::warn!(provider = PROVIDER, error = %e, "image download failed"),
            }
        }
        Ok(assets)
    }
}
