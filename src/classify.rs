use serde::{Deserialize, Serialize};

use crate::text_stats::TextStats;

/// Thresholds for the "dense" predicate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassifierPolicy {
    /// Long comments are dense regardless of anything else.
    pub long_words: usize,
    /// Minimum length for a cited/linked comment to count.
    pub cited_words: usize,
    pub absolute_threshold: f64,
}

impl Default for ClassifierPolicy {
    fn default() -> Self {
        Self { long_words: 80, cited_words: 40, absolute_threshold: 1.5 }
    }
}

impl ClassifierPolicy {
    /// `thread_median` is the median density of the thread; the relative rule
    /// only fires when that median is positive.
    pub fn is_dense(&self, stats: &TextStats, density: f64, thread_median: f64) -> bool {
        stats.words >= self.long_words
            || (stats.has_link && stats.words >= self.cited_words)
            || stats.has_equation
            || density >= self.absolute_threshold
            || (thread_median > 0.0 && density >= thread_median)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Dense,
    All,
}

impl ViewMode {
    pub fn shows(self, dense: bool) -> bool {
        match self {
            ViewMode::Dense => dense,
            ViewMode::All => true,
        }
    }
}

/// Median of `values`; even-length inputs average the two middle values and
/// an empty input yields 0.
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        sorted[mid]
    } else {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    }
}
