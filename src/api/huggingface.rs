use crate::content::TextProvider;
use crate::error::ProviderError;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

const PROVIDER: &str = "huggingface";
const DEFAULT_MODEL: &str = "mistralai/Mistral-7B-Instruct-v0.2";

#[derive(Deserialize)]
struct Generated {
    generated_text: String,
}

/// Hosted inference API, text-generation task.
pub struct HuggingFace {
    client: Client,
    api_key: String,
    model: String,
}

impl HuggingFace {
    pub fn new(client: Client, api_key: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
        }
    }
}

#[async_trait]
impl TextProvider for HuggingFace {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String, ProviderError> {
        let body = json!({
            "inputs": prompt,
            "parameters": {
                "max_new_tokens": max_tokens,
                "temperature": 0.8,
                "return_full_text": false,
            },
        });

        let resp = self
            .client
            .post(format!("https://api-inference.huggingface.co/models/{}", self.model))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(ProviderError::network(PROVIDER))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ProviderError::from_status(PROVIDER, status, body));
        }

        let out: Vec<Generated> = resp.json().await.map_err(|e| ProviderError::Parse {
            provider: PROVIDER,
            message: e.to_string(),
        })?;

        out.into_iter()
            .next()
            .map(|g| g.generated_text.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or(ProviderError::Empty { provider: PROVIDER })
    }
}
