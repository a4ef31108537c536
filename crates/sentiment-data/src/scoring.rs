//! Word-list sentiment scoring, ported from the panel's text-scoring
//! engine: a bag of finance-specific positive/negative terms, a small
//! negation window, and recency decay. Produces a score in [-1, 1].

use chrono::{DateTime, Utc};
use std::collections::HashSet;

const NEGATION_WORDS: &[&str] = &[
    "not", "no", "never", "don't", "doesn't", "didn't", "isn't", "aren't", "wasn't", "weren't",
    "won't", "wouldn't", "couldn't", "shouldn't", "hardly", "barely", "neither", "nor", "without",
];

const NEGATION_WINDOW: usize = 3;

const POSITIVE_WORDS: &[&str] = &[
    "bullish", "rally", "surge", "gain", "profit", "growth", "beat", "upgrade", "outperform",
    "strong", "positive", "rise", "increase", "breakthrough", "momentum", "buy", "recommend",
    "optimistic", "record", "advance", "dividend", "buyback", "accretive", "upside", "recovery",
    "rebound", "expansion", "robust", "overweight", "raised", "guidance", "upgraded",
];

const NEGATIVE_WORDS: &[&str] = &[
    "bearish", "decline", "loss", "fall", "plunge", "crash", "miss", "downgrade", "underperform",
    "weak", "negative", "drop", "decrease", "concern", "risk", "fail", "disappoint", "slump",
    "sell", "warning", "pessimistic", "retreat", "fear", "dilution", "headwind", "lawsuit",
    "recall", "investigation", "default", "bankruptcy", "layoff", "downside", "overvalued",
    "lowered", "suspended",
];

fn word_score(text: &str) -> i32 {
    let lower = text.to_lowercase();
    let words: Vec<&str> = lower
        .split(|c: char| c.is_whitespace() || ",;.!?".contains(c))
        .filter(|w| !w.is_empty())
        .collect();

    let positive: HashSet<&str> = POSITIVE_WORDS.iter().copied().collect();
    let negative: HashSet<&str> = NEGATIVE_WORDS.iter().copied().collect();
    let negation: HashSet<&str> = NEGATION_WORDS.iter().copied().collect();

    let negation_positions: Vec<usize> = words
        .iter()
        .enumerate()
        .filter(|(_, w)| negation.contains(*w))
        .map(|(i, _)| i)
        .collect();

    let mut score = 0;
    for (i, word) in words.iter().enumerate() {
        let is_positive = positive.contains(word);
        let is_negative = negative.contains(word);
        if !is_positive && !is_negative {
            continue;
        }
        let negated = negation_positions
            .iter()
            .any(|&pos| pos < i && (i - pos) <= NEGATION_WINDOW);
        if is_positive {
            score += if negated { -1 } else { 1 };
        } else {
            score += if negated { 1 } else { -1 };
        }
    }
    score
}

fn recency_weight(published_at: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let age_hours = (now - published_at).num_hours();
    if age_hours < 24 {
        1.0
    } else if age_hours < 48 {
        0.7
    } else if age_hours < 168 {
        0.4
    } else {
        0.2
    }
}

pub struct TextItem<'a> {
    pub text: &'a str,
    pub published_at: DateTime<Utc>,
}

/// Combine per-item word scores into a single [-1, 1] sentiment and a
/// sample count. An empty item list is neutral with zero samples.
pub fn score_items(items: &[TextItem]) -> (f64, u64) {
    if items.is_empty() {
        return (0.0, 0);
    }

    let now = Utc::now();
    let mut total_score = 0.0;
    let mut total_weight = 0.0;

    for item in items {
        let raw = word_score(item.text) as f64;
        let weight = recency_weight(item.published_at, now);
        total_score += raw * weight;
        total_weight += weight;
    }

    let avg = if total_weight > 0.0 {
        total_score / total_weight
    } else {
        0.0
    };

    // tanh squashes unbounded word-count scores into [-1, 1] smoothly.
    let normalized = (avg / 3.0).tanh();
    (normalized, items.len() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_items_are_neutral() {
        assert_eq!(score_items(&[]), (0.0, 0));
    }

    #[test]
    fn bullish_text_scores_positive() {
        let items = vec![TextItem {
            text: "Strong earnings beat, analysts upgrade guidance, rally continues",
            published_at: Utc::now(),
        }];
        let (score, count) = score_items(&items);
        assert!(score > 0.0, "expected positive score, got {score}");
        assert_eq!(count, 1);
    }

    #[test]
    fn negated_positive_word_flips_sign() {
        let items = vec![TextItem {
            text: "This stock is not bullish at all",
            published_at: Utc::now(),
        }];
        let (score, _) = score_items(&items);
        assert!(score < 0.0, "expected negated score, got {score}");
    }

    #[test]
    fn stale_items_are_down_weighted_against_fresh() {
        let items = vec![
            TextItem {
                text: "bullish rally surge record gains",
                published_at: Utc::now(),
            },
            TextItem {
                text: "bearish plunge crash warning",
                published_at: Utc::now() - chrono::Duration::hours(200),
            },
        ];
        let (score, count) = score_items(&items);
        assert!(score > 0.0, "fresh bullish item should dominate, got {score}");
        assert_eq!(count, 2);
    }
}
