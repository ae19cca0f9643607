use crate::content::TextProvider;
use crate::error::ProviderError;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

const PROVIDER: &str = "ollama";

#[derive(Deserialize)]
struct GenerateResp {
    #[serde(default)]
    response: String,
}

/// Local Ollama server, non-streaming `/api/generate`.
pub struct Ollama {
    client: Client,
    base_url: String,
    model: String,
}

impl Ollama {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            model: "llama3.1".to_string(),
        }
    }
}

#[async_trait]
impl TextProvider for Ollama {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String, ProviderError> {
        let body = json!({
            "model": self.model,
            "prompt": prompt,
            "stream": false,
            "options": {"num_predict": max_tokens, "temperature": 0.8},
        });

        let resp = self
            .client
            .post(format!("{}/api/generate", self.base_url.trim_end_matches('/')))
            .json(&body)
            .timeout(Duration::from_secs(300))
            .send()
            .await
            .map_err(ProviderError::network(PROVIDER))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ProviderError::from_status(PROVIDER, status, body));
        }

        let parsed: GenerateResp = resp.json().await.map_err(|e| ProviderError::Parse {
            provider: PROVIDER,
            message: e.to_string(),
        })?;

        let text = parsed.response.trim();
        if text.is_empty() {
            return Err(ProviderError::Empty { provider: PROVIDER });
        }
        Ok(text.to_string())
    }
}
