use crate::error::ProviderError;
use crate::media::SpeechProvider;
use async_trait::async_trait;
use reqwest::Client;
use std::path::Path;
use tokio::fs;

const PROVIDER: &str = "google_tts";
const MAX_CHUNK_CHARS: usize = 200;

/// The public Translate speech endpoint. Keyless, so it serves as the
/// secondary voice. Long text is split into chunks and the MP3 frames are
/// joined byte-wise.
pub struct GoogleTranslateTts {
    client: Client,
    lang: String,
}

impl GoogleTranslateTts {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            lang: "en".to_string(),
        }
    }
}

/// Split on word boundaries into pieces of at most `max` chars. A single word
/// longer than `max` is hard-split.
pub fn chunk_text(text: &str, max: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let needed = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };
        if needed > max && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
        }
        if word.chars().count() > max {
            let chars: Vec<char> = word.chars().collect();
            for piece in chars.chunks(max) {
                chunks.push(piece.iter().collect());
            }
            continue;
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

#[async_trait]
impl SpeechProvider for GoogleTranslateTts {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn synthesize(&self, text: &str, out_path: &Path) -> Result<(), ProviderError> {
        let chunks = chunk_text(text, MAX_CHUNK_CHARS);
        if chunks.is_empty() {
            return Err(ProviderError::Empty { provider: PROVIDER });
        }

        let total = chunks.len().to_string();
        let mut audio = Vec::new();
        for (idx, chunk) in chunks.iter().enumerate() {
            let idx = idx.to_string();
            let textlen = chunk.chars().count().to_string();
            let resp = self
                .client
                .get("https://translate.google.com/translate_tts")
                .query(&[
                    ("ie", "UTF-8"),
                    ("client", "tw-ob"),
                    ("tl", self.lang.as_str()),
                    ("q", chunk.as_str()),
                    ("total", total.as_str()),
                    ("idx", idx.as_str()),
                    ("textlen", textlen.as_str()),
                ])
                .send()
                .await
                .map_err(ProviderError::network(PROVIDER))?;

            let status = resp.status();
            if !status.is_success() {
                let body = resp.text().await.unwrap_or_default();
                return Err(ProviderError::from_status(PROVIDER, status, body));
            }
            let bytes = resp.bytes().await.map_err(ProviderError::network(PROVIDER))?;
            audio.extend_from_slice(&bytes);
        }

        if audio.is_empty() {
            return Err(ProviderError::Empty { provider: PROVIDER });
        }
        fs::write(out_path, &audio)
            .await
            .map_err(|source| ProviderError::Io {
                provider: PROVIDER,
                source,
            })
    }
}
