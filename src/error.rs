use std::path::PathBuf;
use thiserror::Error;

/// Failure of a single external provider call. Every variant advances a
/// fallback chain to its next provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("{provider}: not configured")]
    NotConfigured { provider: &'static str },
    #[error("{provider}: network error: {source}")]
    Network {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("{provider}: authentication rejected (HTTP {status})")]
    Auth { provider: &'static str, status: u16 },
    #[error("{provider}: HTTP {status}: {body}")]
    Http {
        provider: &'static str,
        status: u16,
        body: String,
    },
    #[error("{provider}: empty response")]
    Empty { provider: &'static str },
    #[error("{provider}: unexpected response: {message}")]
    Parse {
        provider: &'static str,
        message: String,
    },
    #[error("{provider}: io error: {source}")]
    Io {
        provider: &'static str,
        #[source]
        source: std::io::Error,
    },
}

impl ProviderError {
    /// Map a non-success HTTP status onto `Auth` or `Http`.
    pub fn from_status(provider: &'static str, status: reqwest::StatusCode, body: String) -> Self {
        match status.as_u16() {
            401 | 403 => ProviderError::Auth {
                provider,
                status: status.as_u16(),
            },
            code => ProviderError::Http {
                provider,
                status: code,
                body: snippet(&body),
            },
        }
    }

    pub fn network(provider: &'static str) -> impl FnOnce(reqwest::Error) -> Self {
        move |source| ProviderError::Network { provider, source }
    }
}

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("speech synthesis failed on every provider")]
    Tts,
    #[error("no stock media found for keywords {0:?}")]
    NoVisuals(Vec<String>),
    #[error("render step failed: {0}")]
    Render(String),
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error("video rejected by platform limits: {0}")]
    Validation(String),
    #[error("platform API error: {0}")]
    Api(String),
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub(crate) fn snippet(body: &str) -> String {
    body.chars().take(400).collect()
}
