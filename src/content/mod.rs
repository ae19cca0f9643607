pub mod metadata;
pub mod template;

use crate::error::ProviderError;
use crate::models::{Script, TrendItem, VideoMetadata};
use crate::{logi, logw};
use async_trait::async_trait;

const SCRIPT_MAX_TOKENS: u32 = 300;
const METADATA_MAX_TOKENS: u32 = 400;
const HOOK_MAX_TOKENS: u32 = 40;

/// A text-generation backend.
#[async_trait]
pub trait TextProvider: Send + Sync {
    fn name(&self) -> &'static str;
    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String, ProviderError>;
}

#[derive(Debug, Clone)]
pub struct GeneratedContent {
    pub trend: TrendItem,
    pub script: Script,
    pub metadata: VideoMetadata,
}

/// Writes scripts and metadata through an ordered provider chain, with a
/// deterministic template when every provider fails.
pub struct ContentGenerator {
    providers: Vec<Box<dyn TextProvider>>,
}

impl ContentGenerator {
    pub fn new(providers: Vec<Box<dyn TextProvider>>) -> Self {
        Self { providers }
    }

    pub fn provider_names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// First non-blank answer in priority order, with the name of its provider.
    async fn complete(&self, prompt: &str, max_tokens: u32) -> Option<(String, &'static str)> {
        for provider in &self.providers {
            match provider.complete(prompt, max_tokens).await {
                Ok(text) if !text.trim().is_empty() => {
                    return Some((text.trim().to_string(), provider.name()));
                }
                Ok(_) => {
                    let err = ProviderError::Empty {
                        provider: provider.name(),
                    };
                    tracing::warn!(provider = provider.name(), error = %err, "text provider failed");
                }
                Err(e) => {
                    tracing::warn!(provider = provider.name(), error = %e, "text provider failed");
                }
            }
        }
        None
    }

    pub async fn generate_script(&self, trend: &TrendItem) -> Script {
        let prompt = template::script_prompt(trend);
        match self.complete(&prompt, SCRIPT_MAX_TOKENS).await {
            Some((text, provider)) => {
                logi(format!("Script for \"{}\" written by {}", trend.title, provider));
                Script::new(text, provider)
            }
            None => {
                logw(format!(
                    "All text providers failed, using template script for \"{}\"",
                    trend.title
                ));
                Script::new(template::fallback_script(trend), "template")
            }
        }
    }

    /// A single scroll-stopping opening line for the trend.
    pub async fn generate_hook(&self, trend: &TrendItem) -> String {
        let answer = self
            .complete(&template::hook_prompt(trend), HOOK_MAX_TOKENS)
            .await
            .and_then(|(text, _)| first_line(&text));
        answer.unwrap_or_else(|| template::fallback_hook(trend))
    }

    pub async fn generate_metadata(&self, script: &Script, trend: &TrendItem) -> VideoMetadata {
        let prompt = template::metadata_prompt(&script.text, trend);
        let parsed = match self.complete(&prompt, METADATA_MAX_TOKENS).await {
            Some((raw, provider)) => {
                let meta = metadata::parse_metadata(&raw, trend);
                if meta.is_none() {
                    tracing::warn!(provider, "metadata answer was not usable JSON");
                }
                meta
            }
            None => None,
        };
        let base = parsed.unwrap_or_else(|| template::fallback_metadata(&script.text, trend));
        metadata::with_variants(base)
    }

    pub async fn generate(&self, trend: &TrendItem) -> (Script, VideoMetadata) {
        let script = self.generate_script(trend).await;
        let meta = self.generate_metadata(&script, trend).await;
        (script, meta)
    }

    /// One content item per trend, in input order.
    pub async fn generate_batch(&self, trends: &[TrendItem]) -> Vec<GeneratedContent> {
        let mut out = Vec::with_capacity(trends.len());
        for trend in trends {
            let (script, metadata) = self.generate(trend).await;
            out.push(GeneratedContent {
                trend: trend.clone(),
                script,
                metadata,
            });
        }
        logi(format!("Generated content for {} trends", out.len()));
        out
    }
}

/// First non-empty line with surrounding quotes removed.
fn first_line(text: &str) -> Option<String> {
    text.lines()
        .map(|l| l.trim().trim_matches(|c: char| c == '"' || c == '\u{201c}' || c == '\u{201d}').trim())
        .find(|l| !l.is_empty())
        .map(str::to_string)
}
