use once_cell::sync::OnceCell;
use regex::Regex;
use std::collections::HashSet;
use strsim::normalized_levenshtein;

const FASHION_TERMS: &[&str] = &[
    "fashion", "style", "outfit", "clothing", "wear", "dress", "shoes", "sneakers",
    "streetwear", "designer", "brand", "trend", "look", "aesthetic", "fit", "drip", "ootd",
    "vintage", "luxury", "casual", "formal", "accessories", "jewelry", "bag", "jacket", "coat",
    "pants", "jeans", "shirt", "hoodie", "sweater", "boots", "sustainable",
];

const MAX_KEYWORDS: usize = 5;

/// Similarity of two titles in `[0, 1]`.
///
/// Takes the larger of normalized Levenshtein similarity and word-set Jaccard
/// overlap, so reordered titles ("blazer styling tips" / "tips styling blazer")
/// still compare as near-duplicates. Case-insensitive and symmetric.
pub fn title_similarity(a: &str, b: &str) -> f64 {
    let a = a.trim().to_lowercase();
    let b = b.trim().to_lowercase();
    if a == b {
        return 1.0;
    }

    let edit = normalized_levenshtein(&a, &b);

    let wa = words(&a);
    let wb = words(&b);
    let union = wa.union(&wb).count();
    let jaccard = if union == 0 {
        0.0
    } else {
        wa.intersection(&wb).count() as f64 / union as f64
    };

    edit.max(jaccard)
}

fn words(s: &str) -> HashSet<String> {
    s.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn is_fashion_related(text: &str) -> bool {
    let lower = text.to_lowercase();
    FASHION_TERMS.iter().any(|t| lower.contains(t))
}

/// Pull up to five fashion-related words (longer than 3 chars) out of free text.
pub fn extract_keywords(text: &str) -> Vec<String> {
    static RE_NOISE: OnceCell<Regex> = OnceCell::new();
    static RE_WORD: OnceCell<Regex> = OnceCell::new();
    let re_noise = RE_NOISE.get_or_init(|| Regex::new(r"https?://\S+|@\S+|#").unwrap());
    let re_word = RE_WORD.get_or_init(|| Regex::new(r"\b\w+\b").unwrap());

    let lower = text.to_lowercase();
    let cleaned = re_noise.replace_all(&lower, "");

    let mut out: Vec<String> = Vec::new();
    for m in re_word.find_iter(&cleaned) {
        let word = m.as_str();
        if word.chars().count() > 3 && is_fashion_related(word) && !out.iter().any(|w| w == word) {
            out.push(word.to_string());
            if out.len() == MAX_KEYWORDS {
                break;
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_titles_ignore_case() {
        assert_eq!(title_similarity("Cargo Pants", "cargo pants"), 1.0);
    }

    #[test]
    fn reordered_words_are_similar() {
        let s = title_similarity("oversized blazer styling tips", "styling tips oversized blazer");
        assert!(s > 0.7, "got {s}");
    }

    #[test]
    fn unrelated_titles_are_not_similar() {
        let s = title_similarity("Y2K fashion comeback", "Trench coat style guide");
        assert!(s < 0.5, "got {s}");
    }

    #[test]
    fn similarity_is_symmetric() {
        let a = "Quiet luxury aesthetic explained";
        let b = "Quiet luxury explained simply";
        assert_eq!(title_similarity(a, b), title_similarity(b, a));
    }

    #[test]
    fn keywords_skip_urls_mentions_and_short_words() {
        let kws = extract_keywords("@stylist loves this #streetwear hoodie https://x.co/fashion fit");
        assert_eq!(kws, vec!["streetwear".to_string(), "hoodie".to_string()]);
    }

    #[test]
    fn keywords_are_capped_and_unique() {
        let kws = extract_keywords(
            "fashion fashion style outfit clothing dress shoes sneakers designer",
        );
        assert_eq!(kws.len(), 5);
        assert_eq!(kws[0], "fashion");
        assert_eq!(kws[1], "style");
    }

    #[test]
    fn keywords_come_only_from_the_fashion_vocabulary() {
        assert!(extract_keywords("Oversized blazer styling tips").is_empty());
        assert_eq!(
            extract_keywords("Leather jacket outfit ideas"),
            vec!["jacket".to_string(), "outfit".to_string()]
        );
    }
}
