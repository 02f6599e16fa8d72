//! Word / vocabulary / evidence statistics for a chunk of comment text.
//!
//! This is the single place the link and equation patterns live; the density
//! scorer, the classifier and the depth meter all go through [`analyze`].

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static URL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"https?://\S+").unwrap());
// a URL or a bracketed numeric citation like [3]
static LINK_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)https?://\S+|\[[0-9]+\]").unwrap());
static EQUATION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[=<>]\s*[0-9]|(?-u:\b)O\([A-Za-z0-9_^]+\)|(?-u:\b)ETA(?-u:\b)|(?-u:\b)sum(?-u:\b)|∑|∫|≈|≥|≤").unwrap()
});

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TextStats {
    pub words: usize,
    pub unique: usize,
    pub has_link: bool,
    pub has_equation: bool,
}

/// Collapse whitespace runs, drop URLs and trim.
pub fn clean(text: &str) -> String {
    let normalized = WHITESPACE_RE.replace_all(text, " ");
    URL_RE.replace_all(&normalized, "").trim().to_string()
}

pub fn has_link(text: &str) -> bool {
    LINK_RE.is_match(text)
}

pub fn has_equation(text: &str) -> bool {
    EQUATION_RE.is_match(text)
}

/// Total over any input: empty or whitespace-only text (or text that is only
/// URLs) yields the all-zero result.
pub fn analyze(text: &str) -> TextStats {
    let cleaned = clean(text);
    if cleaned.is_empty() {
        return TextStats::default();
    }
    let words: Vec<&str> = cleaned.split(' ').filter(|w| !w.is_empty()).collect();
    let unique: HashSet<String> = words.iter().map(|w| w.to_lowercase()).collect();
    TextStats {
        words: words.len(),
        unique: unique.len(),
        // evidence patterns look at the raw text so stripped URLs still count
        has_link: has_link(text),
        has_equation: has_equation(text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_and_blank_inputs_are_zero() {
        assert_eq!(analyze(""), TextStats::default());
        assert_eq!(analyze("   \n\t  "), TextStats::default());
    }

    #[test]
    fn url_only_text_has_no_words() {
        let s = analyze("https://example.com/a/b");
        assert_eq!(s.words, 0);
        assert!(!s.has_link);
    }

    #[test]
    fn counts_words_and_case_insensitive_uniques() {
        let s = analyze("The the  THE cat\nsat");
        assert_eq!(s.words, 5);
        assert_eq!(s.unique, 3);
        assert!(!s.has_link);
        assert!(!s.has_equation);
    }

    #[test]
    fn urls_are_stripped_before_counting_but_still_detected() {
        let s = analyze("see https://arxiv.org/abs/1234 for details");
        assert_eq!(s.words, 3);
        assert!(s.has_link);
    }

    #[test]
    fn bracketed_citations_count_as_links() {
        assert!(analyze("as shown in [12] the effect holds").has_link);
        assert!(!analyze("as shown in [a] the effect holds").has_link);
    }

    #[test]
    fn equation_patterns() {
        for text in [
            "x = 3",
            "latency < 5ms",
            "runs in O(n^2) time",
            "ETA next week",
            "take the sum of parts",
            "∑ over all i",
            "∫ f dx",
            "pi ≈ 3.14",
            "a ≥ b",
            "a ≤ b",
        ] {
            assert!(analyze(text).has_equation, "expected equation in {text:?}");
        }
        for text in ["summary of the idea", "beta test", "x equals y"] {
            assert!(!analyze(text).has_equation, "unexpected equation in {text:?}");
        }
    }

    #[test]
    fn only_ascii_digits_count() {
        // Arabic-Indic and fullwidth digits
        assert!(!has_equation("x = ٣"));
        assert!(!has_equation("x = ３"));
        assert!(!has_equation("runs in O(ñ) time"));
        assert!(!has_link("see [٣]"));
        assert!(has_link("see [3]"));
    }
}
