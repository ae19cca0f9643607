use crate::content::metadata::truncate_chars;
use crate::models::{TrendItem, VideoMetadata};
use rand::seq::SliceRandom;
use std::collections::BTreeMap;

pub const TARGET_DURATION_SECS: u32 = 45;

pub const HOOKS: &[&str] = &[
    "Did you know...",
    "This is trending right now:",
    "Everyone's wearing this:",
    "The fashion industry doesn't want you to know:",
    "3 seconds to learn this trend:",
    "POV: You're about to look expensive:",
    "Stop wearing this, wear this instead:",
];

pub const CTAS: &[&str] = &[
    "Follow for daily fashion tips!",
    "Save this for later!",
    "Tag someone who needs this!",
    "Which outfit would you wear? Comment below!",
    "Double tap if you agree!",
];

/// Opening lines used when no provider writes a hook. `{title}` is replaced.
pub const VIRAL_HOOKS: &[&str] = &[
    "This {title} trend is going viral...",
    "POV: You just discovered {title}",
    "Everyone's talking about {title}",
    "The fashion industry doesn't want you to know about {title}",
    "3 seconds to learn {title}",
    "Stop scrolling! This is about {title}",
];

pub const DEFAULT_HASHTAGS: &[&str] = &["#fashion", "#style", "#trending", "#ootd", "#fashiontips"];
const DEFAULT_KEYWORDS: &[&str] = &["fashion", "style", "trend"];

/// Script used when no provider produced one.
pub fn fallback_script(trend: &TrendItem) -> String {
    format!(
        "Did you know this is trending right now?\n\n{}\n\nHere's what makes it special:\n\u{2022} Unique style\n\u{2022} Easy to wear\n\u{2022} Perfect for any occasion\n\nTry this trend and stand out!\n\nFollow for daily fashion tips!",
        trend.title
    )
}

pub fn fallback_hook(trend: &TrendItem) -> String {
    let mut rng = rand::thread_rng();
    let hook = VIRAL_HOOKS.choose(&mut rng).copied().unwrap_or(VIRAL_HOOKS[0]);
    hook.replace("{title}", &trend.title)
}

pub fn fallback_metadata(script: &str, trend: &TrendItem) -> VideoMetadata {
    let keywords = if trend.keywords.is_empty() {
        DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect()
    } else {
        trend.keywords.clone()
    };
    VideoMetadata {
        title: truncate_chars(&trend.title, 60),
        description: truncate_chars(script, 200),
        hashtags: DEFAULT_HASHTAGS.iter().map(|h| h.to_string()).collect(),
        keywords,
        variants: BTreeMap::new(),
    }
}

pub fn script_prompt(trend: &TrendItem) -> String {
    let mut rng = rand::thread_rng();
    let hook = HOOKS.choose(&mut rng).copied().unwrap_or(HOOKS[0]);
    let cta = CTAS.choose(&mut rng).copied().unwrap_or(CTAS[0]);
    let words = (TARGET_DURATION_SECS as f64 * crate::models::WORDS_PER_SECOND) as u32;

    format!(
        "Create a {d}-second YouTube Shorts/TikTok/Reels script about this fashion trend:\n\n\
         Trend: {title}\nContext: {context}\nKeywords: {keywords}\n\n\
         Requirements:\n\
         1. Start with this hook style: \"{hook}\"\n\
         2. Write for voiceover (natural, conversational tone)\n\
         3. Keep it {d} seconds when spoken (approximately {words} words)\n\
         4. Make it educational yet entertaining\n\
         5. Include 3 specific styling tips or facts\n\
         6. End with: \"{cta}\"\n\
         7. Use simple language, short sentences\n\n\
         Output only the script text, no extra formatting or labels.",
        d = TARGET_DURATION_SECS,
        title = trend.title,
        context = trend.description.as_deref().unwrap_or(""),
        keywords = trend.keywords.join(", "),
    )
}

pub fn hook_prompt(trend: &TrendItem) -> String {
    format!(
        "Write one opening line for a short fashion video about \"{title}\".\n\
         It must stop people scrolling within 3 seconds, at most 12 words.\n\
         Output only the line.",
        title = trend.title,
    )
}

pub fn metadata_prompt(script: &str, trend: &TrendItem) -> String {
    format!(
        "Based on this short-form video script, generate metadata:\n\n\
         Script: {script}\n\nOriginal trend: {title}\n\n\
         Generate:\n\
         1. A catchy title (max 60 characters, clickable, uses numbers or questions)\n\
         2. A description (max 200 characters, includes value prop)\n\
         3. 10 relevant hashtags (mix of popular and niche)\n\
         4. 5 search keywords\n\n\
         Format as JSON:\n\
         {{\"title\": \"...\", \"description\": \"...\", \"hashtags\": [\"tag1\", ...], \"keywords\": [\"keyword1\", ...]}}",
        title = trend.title,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_script_interpolates_title() {
        let trend = TrendItem::new("fallback", "Cargo pants comeback", 200);
        let script = fallback_script(&trend);
        assert!(script.starts_with("Did you know this is trending right now?\n\nCargo pants comeback\n"));
        assert!(script.ends_with("Follow for daily fashion tips!"));
    }

    #[test]
    fn fallback_hook_names_the_trend() {
        let trend = TrendItem::new("fallback", "Quiet luxury", 200);
        let hook = fallback_hook(&trend);
        assert!(
            VIRAL_HOOKS.iter().any(|h| h.replace("{title}", "Quiet luxury") == hook),
            "{hook}"
        );
    }

    #[test]
    fn fallback_metadata_uses_defaults_without_keywords() {
        let long = "x".repeat(90);
        let trend = TrendItem::new("fallback", long, 1);
        let meta = fallback_metadata("short script", &trend);
        assert_eq!(meta.title.chars().count(), 60);
        assert_eq!(meta.description, "short script");
        assert_eq!(meta.keywords, vec!["fashion", "style", "trend"]);
        assert_eq!(meta.hashtags[0], "#fashion");
    }

    #[test]
    fn prompt_mentions_trend_and_word_target() {
        let trend = TrendItem::new("reddit", "Quiet luxury", 10).with_keywords(["luxury"]);
        let prompt = script_prompt(&trend);
        assert!(prompt.contains("Trend: Quiet luxury"));
        assert!(prompt.contains("approximately 112 words"));
    }
}
