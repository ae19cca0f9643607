use anyhow::{Context, Result};
use std::fmt::Write as _;
use std::path::Path;
use tokio::fs;
use tokio::io::AsyncWriteExt;

pub const WORDS_PER_CAPTION: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct Caption {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

/// Split `script` into groups of `per_caption` words spread over `duration`.
///
/// Each word gets time in proportion to its length plus one (for the gap), so
/// caption boundaries always fall between words. The last caption ends exactly
/// at `duration`.
pub fn build_captions(script: &str, duration: f64, per_caption: usize) -> Vec<Caption> {
    let words: Vec<&str> = script.split_whitespace().collect();
    if words.is_empty() || duration <= 0.0 || per_caption == 0 {
        return Vec::new();
    }

    let weight = |w: &str| (w.chars().count() + 1) as f64;
    let total: f64 = words.iter().map(|w| weight(w)).sum();

    let mut captions = Vec::with_capacity(words.len().div_ceil(per_caption));
    let mut elapsed = 0.0;
    for (i, group) in words.chunks(per_caption).enumerate() {
        let start = elapsed / total * duration;
        elapsed += group.iter().map(|w| weight(w)).sum::<f64>();
        let last = (i + 1) * per_caption >= words.len();
        let end = if last { duration } else { elapsed / total * duration };
        captions.push(Caption {
            start,
            end,
            text: group.join(" "),
        });
    }
    captions
}

fn srt_timestamp(secs: f64) -> String {
    let total_ms = (secs.max(0.0) * 1000.0).round() as u64;
    let (h, rem) = (total_ms / 3_600_000, total_ms % 3_600_000);
    let (m, rem) = (rem / 60_000, rem % 60_000);
    let (s, ms) = (rem / 1000, rem % 1000);
    format!("{h:02}:{m:02}:{s:02},{ms:03}")
}

pub fn to_srt(captions: &[Caption]) -> String {
    let mut out = String::new();
    for (i, c) in captions.iter().enumerate() {
        let _ = write!(
            out,
            "{}\n{} --> {}\n{}\n\n",
            i + 1,
            srt_timestamp(c.start),
            srt_timestamp(c.end),
            c.text
        );
    }
    out
}

pub async fn write_srt(captions: &[Caption], path: &Path) -> Result<()> {
    let mut out = fs::File::create(path)
        .await
        .with_context(|| format!("create srt: {}", path.display()))?;
    out.write_all(to_srt(captions).as_bytes()).await?;
    out.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_three_words_and_covers_duration() {
        let caps = build_captions("one two three four five six seven", 14.0, 3);
        assert_eq!(caps.len(), 3);
        assert_eq!(caps[0].text, "one two three");
        assert_eq!(caps[2].text, "seven");
        assert_eq!(caps[0].start, 0.0);
        assert_eq!(caps[2].end, 14.0);
        for pair in caps.windows(2) {
            assert!((pair[0].end - pair[1].start).abs() < 1e-9);
        }
    }

    #[test]
    fn longer_words_get_more_time() {
        let caps = build_captions("a b c extraordinarily long words", 10.0, 3);
        let first = caps[0].end - caps[0].start;
        let second = caps[1].end - caps[1].start;
        assert!(second > first);
    }

    #[test]
    fn empty_script_has_no_captions() {
        assert!(build_captions("   ", 10.0, 3).is_empty());
    }

    #[test]
    fn srt_format() {
        let caps = vec![Caption {
            start: 0.0,
            end: 61.5,
            text: "Quiet luxury now".into(),
        }];
        assert_eq!(to_srt(&caps), "1\n00:00:00,000 --> 00:01:01,500\nQuiet luxury now\n\n");
    }
}
