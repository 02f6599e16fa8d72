//! "Bits per 100 words" density score.
//!
//! This is a UI heuristic, not an information-theoretic measure: lexical
//! variety plus small bonuses for links and quantitative content, scaled into
//! `[0.0, 4.0]` and rounded to one decimal.

use crate::text_stats::{self, TextStats};

pub const MAX_SCORE: f64 = 4.0;
const LINK_BONUS: f64 = 0.2;
const EQUATION_BONUS: f64 = 0.2;

pub fn score(stats: &TextStats) -> f64 {
    if stats.words == 0 {
        return 0.0;
    }
    let vocab_ratio = stats.unique as f64 / stats.words as f64;
    let mut base = vocab_ratio;
    if stats.has_link {
        base += LINK_BONUS;
    }
    if stats.has_equation {
        base += EQUATION_BONUS;
    }
    let bits_per_100 = (base * 4.0).clamp(0.0, MAX_SCORE);
    (bits_per_100 * 10.0).round() / 10.0
}

pub fn score_text(text: &str) -> f64 {
    score(&text_stats::analyze(text))
}

/// Label shown next to a comment handle.
pub fn label(score: f64) -> String {
    if score == 0.0 {
        "density: —".to_string()
    } else {
        format!("density: {score} bits / 100w")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pangram_scores_max() {
        let stats = text_stats::analyze("The quick brown fox jumps over the lazy dog");
        assert_eq!(stats.words, 9);
        // "The" and "the" collapse to one unique word
        assert_eq!(stats.unique, 8);
        assert_eq!(score(&stats), 3.6);
    }

    #[test]
    fn all_unique_nine_words_is_four() {
        let stats = TextStats { words: 9, unique: 9, has_link: false, has_equation: false };
        assert_eq!(score(&stats), 4.0);
    }

    #[test]
    fn bonuses_are_capped() {
        let stats = TextStats { words: 10, unique: 10, has_link: true, has_equation: true };
        assert_eq!(score(&stats), MAX_SCORE);
    }

    #[test]
    fn repetitive_text_scores_low() {
        let stats = text_stats::analyze("yes yes yes yes yes yes yes yes yes yes");
        assert_eq!(score(&stats), 0.4);
    }

    #[test]
    fn bonus_applies_to_repetitive_text() {
        let stats = TextStats { words: 10, unique: 1, has_link: true, has_equation: false };
        // (0.1 + 0.2) * 4 = 1.2
        assert_eq!(score(&stats), 1.2);
    }

    #[test]
    fn empty_is_zero_and_labelled_with_dash() {
        assert_eq!(score_text(""), 0.0);
        assert_eq!(label(0.0), "density: —");
        assert_eq!(label(2.5), "density: 2.5 bits / 100w");
        assert_eq!(label(4.0), "density: 4 bits / 100w");
    }
}
