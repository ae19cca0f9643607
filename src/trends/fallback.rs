use crate::models::TrendItem;
use crate::trends::extract_keywords;
use chrono::{Datelike, Utc};
use rand::Rng;
use rand::seq::SliceRandom;

const TEMPLATES: &[&str] = &[
    "Winter layering essentials for {year}",
    "Spring fashion must-haves",
    "Summer outfit ideas that are trending",
    "Fall wardrobe staples everyone needs",
    "Quiet luxury aesthetic explained",
    "Old money style guide",
    "Coastal grandmother fashion trend",
    "Dark academia outfit ideas",
    "Clean girl aesthetic looks",
    "Y2K fashion comeback",
    "90s minimalist style",
    "Cottagecore outfit inspiration",
    "Oversized blazer styling tips",
    "Wide leg pants outfit ideas",
    "Platform shoes trend",
    "Cargo pants comeback",
    "Leather jacket outfit ideas",
    "Chunky loafer styling",
    "Maxi skirt outfit combinations",
    "Trench coat style guide",
    "Dopamine dressing colors",
    "Monochrome outfit ideas",
    "Neutral tones fashion",
    "Bold color blocking trends",
    "Thrift store fashion finds",
    "Sustainable fashion brands",
    "Capsule wardrobe essentials",
    "Vintage clothing styling tips",
    "Bella Hadid street style",
    "Hailey Bieber outfit recreation",
    "Zendaya fashion moments",
    "Korean street fashion trends",
    "Amazon fashion finds under $50",
    "Zara trending items",
    "H&M outfit ideas",
    "Shein haul favorites",
    "How to style oversized clothing",
    "Layering tips for petites",
    "Outfit formulas that always work",
    "Mix and match capsule wardrobe",
    "Trending jewelry {year}",
    "Designer bag dupes",
    "Sunglasses trends",
    "Belt styling ideas",
    "Fashion for curvy bodies",
    "Tall girl outfit ideas",
    "Petite styling hacks",
    "Date night outfit ideas",
    "Business casual lookbook",
    "Gym to brunch outfits",
    "Wedding guest dress code",
];

/// Curated trends used when no live source produced anything.
pub fn fallback_trends(limit: usize) -> Vec<TrendItem> {
    let mut rng = rand::thread_rng();
    let mut templates: Vec<&str> = TEMPLATES.to_vec();
    templates.shuffle(&mut rng);

    let year = Utc::now().year().to_string();
    templates
        .into_iter()
        .take(limit)
        .map(|template| {
            let title = template.replace("{year}", &year);
            let mut keywords = extract_keywords(&title);
            if keywords.is_empty() {
                keywords = vec!["fashion".into(), "style".into(), "outfit".into()];
            }
            let mut item = TrendItem::new("fallback", title.clone(), rng.gen_range(100..=500))
                .with_keywords(keywords);
            item.description = Some(format!("Trending topic: {title}"));
            item
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_respects_limit_and_fills_keywords() {
        let items = fallback_trends(7);
        assert_eq!(items.len(), 7);
        for item in &items {
            assert_eq!(item.source, "fallback");
            assert!(!item.keywords.is_empty());
            assert!((100..=500).contains(&item.score));
            assert!(!item.title.contains("{year}"));
        }
    }

    #[test]
    fn whole_list_is_reachable() {
        assert_eq!(TEMPLATES.len(), 51);
        let titles: Vec<String> = fallback_trends(TEMPLATES.len())
            .into_iter()
            .map(|t| t.title)
            .collect();
        assert_eq!(titles.len(), 51);
        for expected in ["Zendaya fashion moments", "H&M outfit ideas", "Petite styling hacks"] {
            assert!(titles.iter().any(|t| t == expected), "missing {expected}");
        }
    }
}
