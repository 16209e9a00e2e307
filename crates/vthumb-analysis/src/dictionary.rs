//! Channel dictionary builder.
//!
//! Extracts a weighted vocabulary from a channel's titles and descriptions:
//! - plain words are weighted by TF-IDF, summed over documents
//! - hashtags are weighted by frequency × [`HASHTAG_MULTIPLIER`]
//! - three-word phrases by frequency × [`PHRASE_MULTIPLIER`]
//!
//! Niche and primary category are scored against fixed keyword clusters.
//! Pure function of the corpus; identical input yields identical output.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use vthumb_models::channel::MAX_KEYWORDS;
use vthumb_models::{ChannelDictionary, ChannelDocument, KeywordWeight};

pub const HASHTAG_MULTIPLIER: f64 = 2.0;
pub const PHRASE_MULTIPLIER: f64 = 1.5;
pub const DEFAULT_NICHE: &str = "general";
pub const DEFAULT_CATEGORY: &str = "other";

const PHRASE_LEN: usize = 3;

const STOP_WORDS: &[&str] = &[
    "the", "and", "for", "are", "but", "not", "you", "your", "all", "any", "can", "had", "her",
    "his", "was", "one", "our", "out", "has", "have", "this", "that", "with", "from", "they",
    "them", "will", "what", "when", "where", "which", "who", "why", "its", "into", "about",
    "just", "than", "then", "there", "their", "these", "those", "been", "were", "also", "more",
    "some", "such", "only", "over", "very", "get", "got", "did", "does", "here", "each",
    "would", "could", "should", "because", "while", "she", "him", "off", "too", "own", "both",
];

const NICHE_CLUSTERS: &[(&str, &[&str])] = &[
    (
        "gaming",
        &[
            "game", "games", "gaming", "gameplay", "minecraft", "fortnite", "playthrough",
            "speedrun", "boss", "walkthrough", "esports", "console", "xbox", "playstation",
            "nintendo",
        ],
    ),
    (
        "cooking",
        &[
            "recipe", "recipes", "cooking", "cook", "kitchen", "food", "baking", "bake", "chef",
            "meal", "dinner", "breakfast", "dessert", "ingredients",
        ],
    ),
    (
        "tech",
        &[
            "tech", "technology", "unboxing", "iphone", "android", "laptop", "gadget", "gadgets",
            "software", "setup", "coding", "programming", "computer",
        ],
    ),
    (
        "fitness",
        &[
            "workout", "fitness", "gym", "exercise", "training", "muscle", "cardio", "yoga",
            "abs", "strength", "diet",
        ],
    ),
    (
        "education",
        &[
            "tutorial", "learn", "lesson", "course", "explained", "education", "science",
            "history", "math", "study", "beginners",
        ],
    ),
    (
        "music",
        &[
            "music", "song", "songs", "cover", "guitar", "piano", "beat", "album", "lyrics",
            "remix", "singing", "producer",
        ],
    ),
    (
        "business",
        &[
            "business", "money", "marketing", "startup", "entrepreneur", "finance", "investing",
            "income", "sales", "stocks", "crypto", "productivity",
        ],
    ),
    (
        "vlog",
        &["vlog", "daily", "life", "routine", "travel", "family", "morning", "trip", "week"],
    ),
    (
        "beauty",
        &[
            "makeup", "beauty", "skincare", "hair", "fashion", "outfit", "nails", "haul",
            "cosmetics",
        ],
    ),
];

const CATEGORY_CLUSTERS: &[(&str, &[&str])] = &[
    (
        "tutorial",
        &[
            "how", "tutorial", "guide", "tips", "learn", "step", "beginners", "explained", "easy",
            "tricks",
        ],
    ),
    (
        "review",
        &["review", "unboxing", "comparison", "worth", "tested", "honest", "versus"],
    ),
    (
        "entertainment",
        &[
            "funny", "challenge", "prank", "reaction", "reacting", "epic", "fails", "moments",
        ],
    ),
    (
        "news",
        &["news", "update", "breaking", "announced", "report", "latest", "today"],
    ),
    (
        "story",
        &["story", "storytime", "journey", "experience", "happened"],
    ),
    (
        "listicle",
        &["top", "best", "ranking", "ranked", "things", "reasons", "ways"],
    ),
];

/// Lowercase, strip punctuation except `#`, drop short tokens and stop words.
pub fn tokenize(text: &str) -> Vec<String> {
    let cleaned: String = text
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '#' { c } else { ' ' })
        .collect();

    cleaned
        .split_whitespace()
        .filter_map(normalize_token)
        .collect()
}

fn normalize_token(token: &str) -> Option<String> {
    let bare = token.trim_start_matches('#');
    if bare.chars().count() <= 2 || bare.contains('#') || STOP_WORDS.contains(&bare) {
        return None;
    }
    if token.starts_with('#') {
        Some(format!("#{}", bare))
    } else {
        Some(bare.to_string())
    }
}

fn is_hashtag(token: &str) -> bool {
    token.starts_with('#')
}

/// Token statistics for one document.
#[derive(Default)]
struct DocumentTerms {
    words: BTreeMap<String, usize>,
    word_total: usize,
}

/// Build a channel dictionary from its documents.
pub fn build_dictionary(
    channel_id: &str,
    documents: &[ChannelDocument],
    now: DateTime<Utc>,
) -> ChannelDictionary {
    let mut weights: BTreeMap<String, f64> = BTreeMap::new();
    let mut hashtags: BTreeMap<String, usize> = BTreeMap::new();
    let mut phrases: BTreeMap<String, usize> = BTreeMap::new();
    let mut per_doc: Vec<DocumentTerms> = Vec::with_capacity(documents.len());

    for doc in documents {
        let mut terms = DocumentTerms::default();

        // Phrases never span the title/description boundary
        for field in [doc.title.as_str(), doc.description.as_str()] {
            let tokens = tokenize(field);
            let mut words: Vec<&str> = Vec::with_capacity(tokens.len());

            for token in &tokens {
                if is_hashtag(token) {
                    *hashtags.entry(token.clone()).or_default() += 1;
                } else {
                    *terms.words.entry(token.clone()).or_default() += 1;
                    terms.word_total += 1;
                    words.push(token);
                }
            }

            for window in words.windows(PHRASE_LEN) {
                *phrases.entry(window.join(" ")).or_default() += 1;
            }
        }

        per_doc.push(terms);
    }

    let mut doc_frequency: BTreeMap<&str, usize> = BTreeMap::new();
    for terms in &per_doc {
        for word in terms.words.keys() {
            *doc_frequency.entry(word.as_str()).or_default() += 1;
        }
    }

    let total_docs = per_doc.len() as f64;
    for terms in &per_doc {
        if terms.word_total == 0 {
            continue;
        }
        for (word, count) in &terms.words {
            let tf = *count as f64 / terms.word_total as f64;
            let df = doc_frequency.get(word.as_str()).copied().unwrap_or(0) as f64;
            let idf = (total_docs / (df + 1.0)).ln();
            *weights.entry(word.clone()).or_default() += tf * idf;
        }
    }

    // Terms present in nearly every document have negative idf
    for weight in weights.values_mut() {
        *weight = weight.max(0.0);
    }

    for (tag, count) in hashtags {
        *weights.entry(tag).or_default() += count as f64 * HASHTAG_MULTIPLIER;
    }
    for (phrase, count) in phrases {
        *weights.entry(phrase).or_default() += count as f64 * PHRASE_MULTIPLIER;
    }

    let keywords = rank_keywords(weights, MAX_KEYWORDS);
    let niche_scores = score_clusters(NICHE_CLUSTERS, &keywords);
    let categories = score_clusters(CATEGORY_CLUSTERS, &keywords);

    ChannelDictionary {
        channel_id: channel_id.to_string(),
        niche: best_cluster(NICHE_CLUSTERS, &niche_scores, DEFAULT_NICHE),
        primary_category: best_cluster(CATEGORY_CLUSTERS, &categories, DEFAULT_CATEGORY),
        keywords,
        categories,
        last_updated: now,
    }
}

/// Sort by weight descending, ties alphabetically, and keep the top `limit`.
fn rank_keywords(weights: BTreeMap<String, f64>, limit: usize) -> Vec<KeywordWeight> {
    let mut ranked: Vec<KeywordWeight> = weights
        .into_iter()
        .map(|(word, weight)| KeywordWeight { word, weight })
        .collect();

    ranked.sort_by(|a, b| {
        b.weight
            .total_cmp(&a.weight)
            .then_with(|| a.word.cmp(&b.word))
    });
    ranked.truncate(limit);
    ranked
}

/// Each keyword matching a cluster contributes `1 + weight` to its score.
fn score_clusters(
    clusters: &[(&str, &[&str])],
    keywords: &[KeywordWeight],
) -> BTreeMap<String, f64> {
    let mut scores = BTreeMap::new();

    for (name, terms) in clusters {
        let score: f64 = keywords
            .iter()
            .filter(|k| {
                k.word
                    .split_whitespace()
                    .map(|part| part.trim_start_matches('#'))
                    .any(|part| terms.contains(&part))
            })
            .map(|k| 1.0 + k.weight)
            .sum();

        if score > 0.0 {
            scores.insert(name.to_string(), score);
        }
    }

    scores
}

/// Highest-scoring cluster; earlier table entries win ties.
fn best_cluster(
    clusters: &[(&str, &[&str])],
    scores: &BTreeMap<String, f64>,
    default: &str,
) -> String {
    let mut best: Option<(&str, f64)> = None;

    for (name, _) in clusters {
        let score = scores.get(*name).copied().unwrap_or(0.0);
        if score <= 0.0 {
            continue;
        }
        match best {
            Some((_, current)) if current >= score => {}
            _ => best = Some((name, score)),
        }
    }

    best.map(|(name, _)| name.to_string())
        .unwrap_or_else(|| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    fn cooking_corpus() -> Vec<ChannelDocument> {
        vec![
            ChannelDocument::new(
                "10 Tips for Faster Cooking",
                "Quick weeknight dinner recipe ideas #cooking #recipe",
            ),
            ChannelDocument::new(
                "Easy Pasta Recipe in 15 Minutes",
                "The best pasta for busy nights. #cooking",
            ),
            ChannelDocument::new(
                "Kitchen Knife Skills for Beginners",
                "Learn to chop onions like a chef",
            ),
            ChannelDocument::new(
                "Sourdough Bread Baking Guide",
                "Step by step sourdough bread baking at home",
            ),
        ]
    }

    #[test]
    fn test_tokenize_strips_punctuation_and_stop_words() {
        let tokens = tokenize("The BEST pasta, ever!! #Cooking is fun: a to-do");
        assert_eq!(tokens, vec!["best", "pasta", "ever", "#cooking", "fun"]);
    }

    #[test]
    fn test_build_is_idempotent() {
        let docs = cooking_corpus();
        let first = build_dictionary("chan", &docs, now());
        let second = build_dictionary("chan", &docs, now());
        assert_eq!(first, second);
    }

    #[test]
    fn test_keywords_sorted_and_non_negative() {
        let dict = build_dictionary("chan", &cooking_corpus(), now());
        assert!(!dict.keywords.is_empty());
        assert!(dict.keywords.len() <= MAX_KEYWORDS);
        assert!(dict.keywords.iter().all(|k| k.weight >= 0.0));
        for pair in dict.keywords.windows(2) {
            assert!(pair[0].weight >= pair[1].weight);
            if pair[0].weight == pair[1].weight {
                assert!(pair[0].word < pair[1].word);
            }
        }
    }

    #[test]
    fn test_hashtags_weighted_by_frequency() {
        let dict = build_dictionary("chan", &cooking_corpus(), now());
        let cooking_tag = dict
            .keywords
            .iter()
            .find(|k| k.word == "#cooking")
            .unwrap();
        assert!((cooking_tag.weight - 2.0 * HASHTAG_MULTIPLIER).abs() < 1e-9);
        assert_eq!(dict.keywords[0].word, "#cooking");
    }

    #[test]
    fn test_phrases_weighted_by_frequency() {
        let docs = vec![
            ChannelDocument::new("Sourdough bread baking", ""),
            ChannelDocument::new("More sourdough bread baking", ""),
            ChannelDocument::new("Pizza night", ""),
        ];
        let dict = build_dictionary("chan", &docs, now());
        let phrase = dict
            .keywords
            .iter()
            .find(|k| k.word == "sourdough bread baking")
            .unwrap();
        assert!((phrase.weight - 2.0 * PHRASE_MULTIPLIER).abs() < 1e-9);
    }

    #[test]
    fn test_single_document_keeps_phrases() {
        let docs = vec![ChannelDocument::new("Sourdough bread baking guide", "")];
        let dict = build_dictionary("chan", &docs, now());

        for phrase in ["sourdough bread baking", "bread baking guide"] {
            let keyword = dict.keywords.iter().find(|k| k.word == phrase).unwrap();
            assert!((keyword.weight - PHRASE_MULTIPLIER).abs() < 1e-9);
        }
        // Words in every document carry no TF-IDF weight
        let word = dict.keywords.iter().find(|k| k.word == "sourdough").unwrap();
        assert_eq!(word.weight, 0.0);
    }

    #[test]
    fn test_niche_and_category() {
        let dict = build_dictionary("chan", &cooking_corpus(), now());
        assert_eq!(dict.niche, "cooking");
        assert_eq!(dict.primary_category, "tutorial");
        assert!(dict.categories.contains_key("tutorial"));
    }

    #[test]
    fn test_empty_corpus_uses_defaults() {
        let dict = build_dictionary("chan", &[], now());
        assert!(dict.keywords.is_empty());
        assert_eq!(dict.niche, DEFAULT_NICHE);
        assert_eq!(dict.primary_category, DEFAULT_CATEGORY);
        assert!(dict.categories.is_empty());
    }
}
