use crate::error::ProviderError;
use crate::media::SpeechProvider;
use async_trait::async_trait;
use reqwest::Client;
use std::path::Path;
use tokio::fs;

const PROVIDER: &str = "elevenlabs";

pub struct ElevenLabs {
    client: Client,
    api_key: String,
    voice_id: String,
    model_id: String,
}

impl ElevenLabs {
    pub fn new(
        client: Client,
        api_key: impl Into<String>,
        voice_id: impl Into<String>,
        model_id: impl Into<String>,
    ) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            voice_id: voice_id.into(),
            model_id: model_id.into(),
        }
    }
}

#[async_trait]
impl SpeechProvider for ElevenLabs {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn synthesize(&self, text: &str, out_path: &Path) -> Result<(), ProviderError> {
        let url = format!(
            "https://api.elevenlabs.io/v1/text-to-speech/{}?output_format=mp3_44100_128",
            self.voice_id
        );

        let body = serde_json::json!({
            "text": text,
            "model_id": self.model_id,
        });

        let resp = self
            .client
            .post(url)
            .header("xi-api-key", &self.api_key)
            .json(&body)
            .timeout(std::time::Duration::from_secs(300))
            .send()
            .await
            .map_err(ProviderError::network(PROVIDER))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ProviderError::from_status(PROVIDER, status, body));
        }

        let bytes = resp.bytes().await.map_err(ProviderError::network(PROVIDER))?;
        if bytes.is_empty() {
            return Err(ProviderError::Empty { provider: PROVIDER });
        }
        fs::write(out_path, &bytes)
            .await
            .map_err(|source| ProviderError::Io {
                provider: PROVIDER,
                source,
            })
    }
}
