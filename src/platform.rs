use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Destination services a finished video can be published to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    YouTube,
    TikTok,
    Instagram,
    Twitter,
    Facebook,
}

/// Upload limits enforced before a submission is attempted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlatformLimits {
    pub max_duration_secs: f64,
    pub max_file_size_mb: u64,
}

impl PlatformLimits {
    pub fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_mb * 1024 * 1024
    }
}

impl Platform {
    pub const ALL: [Platform; 5] = [
        Platform::YouTube,
        Platform::TikTok,
        Platform::Instagram,
        Platform::Twitter,
        Platform::Facebook,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::YouTube => "youtube",
            Platform::TikTok => "tiktok",
            Platform::Instagram => "instagram",
            Platform::Twitter => "twitter",
            Platform::Facebook => "facebook",
        }
    }

    pub fn limits(&self) -> PlatformLimits {
        let (max_duration_secs, max_file_size_mb) = match self {
            Platform::YouTube => (60.0, 256),
            Platform::TikTok => (60.0, 287),
            Platform::Instagram => (90.0, 100),
            Platform::Twitter => (140.0, 512),
            Platform::Facebook => (60.0, 100),
        };
        PlatformLimits {
            max_duration_secs,
            max_file_size_mb,
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "youtube" => Ok(Platform::YouTube),
            "tiktok" => Ok(Platform::TikTok),
            "instagram" => Ok(Platform::Instagram),
            "twitter" | "x" => Ok(Platform::Twitter),
            "facebook" => Ok(Platform::Facebook),
            other => anyhow::bail!("unknown platform: {other}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_names_case_insensitively() {
        assert_eq!("YouTube".parse::<Platform>().unwrap(), Platform::YouTube);
        assert_eq!(" x ".parse::<Platform>().unwrap(), Platform::Twitter);
        assert!("myspace".parse::<Platform>().is_err());
    }

    #[test]
    fn instagram_allows_longer_reels() {
        assert_eq!(Platform::Instagram.limits().max_duration_secs, 90.0);
        assert_eq!(Platform::Instagram.limits().max_file_size_bytes(), 100 * 1024 * 1024);
    }
}
