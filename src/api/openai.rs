use crate::content::TextProvider;
use crate::error::ProviderError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

pub const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Serialize)]
struct Msg<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct Req<'a> {
    model: &'a str,
    messages: Vec<Msg<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct Resp {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMsg,
}

#[derive(Deserialize)]
struct ChoiceMsg {
    #[serde(default)]
    content: Option<String>,
}

/// Any backend speaking the OpenAI chat-completions protocol (OpenAI, Groq).
pub struct ChatCompletions {
    client: Client,
    name: &'static str,
    base_url: String,
    api_key: String,
    model: String,
}

impl ChatCompletions {
    pub fn new(
        client: Client,
        name: &'static str,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            client,
            name,
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    pub fn groq(client: Client, api_key: impl Into<String>) -> Self {
        Self::new(client, "groq", GROQ_BASE_URL, api_key, "llama-3.1-70b-versatile")
    }

    pub fn openai(client: Client, api_key: impl Into<String>) -> Self {
        Self::new(client, "openai", OPENAI_BASE_URL, api_key, "gpt-4o-mini")
    }
}

#[async_trait]
impl TextProvider for ChatCompletions {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String, ProviderError> {
        if self.api_key.is_empty() {
            return Err(ProviderError::NotConfigured { provider: self.name });
        }

        let req = Req {
            model: &self.model,
            messages: vec![Msg {
                role: "user",
                content: prompt,
            }],
            temperature: 0.8,
            max_tokens,
        };

        let resp = self
            .client
            .post(format!("{}/chat/completions", self.base_url.trim_end_matches('/')))
            .bearer_auth(&self.api_key)
            .json(&req)
            .send()
            .await
            .map_err(ProviderError::network(self.name))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ProviderError::from_status(self.name, status, body));
        }

        let parsed: Resp = resp.json().await.map_err(|e| ProviderError::Parse {
            provider: self.name,
            message: e.to_string(),
        })?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or(ProviderError::Empty { provider: self.name })
    }
}
