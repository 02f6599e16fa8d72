//! Thread-wide "depth" gauge: median comment length, citation rate and
//! equation rate folded into one score.

use serde::{Deserialize, Serialize};

use crate::classify::median;
use crate::text_stats;

const MEDIAN_WORDS_CAP: f64 = 200.0;
const SOURCES_PER_10_CAP: f64 = 6.0;
const EQUATION_FRACTION_CAP: f64 = 0.8;

/// How the raw `[0, 100]` score is shown on the gauge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum DepthDisplay {
    /// Remap into `[floor, ceiling]` so the gauge never reads empty or full.
    Banded { floor: f64, ceiling: f64 },
    Raw,
}

impl Default for DepthDisplay {
    fn default() -> Self {
        DepthDisplay::Banded { floor: 40.0, ceiling: 80.0 }
    }
}

impl DepthDisplay {
    pub fn apply(&self, raw: f64) -> u32 {
        let raw = raw.clamp(0.0, 100.0);
        match *self {
            DepthDisplay::Raw => raw.round() as u32,
            DepthDisplay::Banded { floor, ceiling } => {
                let shown = (floor + raw / 100.0 * (ceiling - floor)).round();
                // only an all-zero thread may sit on the floor
                if raw > 0.0 && shown <= floor {
                    (floor + 1.0).min(ceiling) as u32
                } else {
                    shown as u32
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DepthReading {
    pub comments: usize,
    pub median_words: f64,
    pub link_count: usize,
    pub equation_count: usize,
    pub sources_per_10: f64,
    pub equation_fraction: f64,
    pub raw_score: f64,
    pub score: u32,
}

impl DepthReading {
    pub fn summary(&self) -> String {
        format!(
            "Depth {} / 100 · median {} words, {} sources, {}% equations/models",
            self.score,
            self.median_words.round(),
            self.link_count,
            (self.equation_fraction * 100.0).round(),
        )
    }

    /// Gauge width as a CSS percentage.
    pub fn fill_percent(&self) -> String {
        format!("{}%", self.score)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DepthMeter {
    pub display: DepthDisplay,
}

impl DepthMeter {
    pub fn new(display: DepthDisplay) -> Self {
        Self { display }
    }

    /// Aggregate over every comment body on the page. Returns `None` when
    /// there are no comments at all.
    pub fn measure<'a, I>(&self, bodies: I) -> Option<DepthReading>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut word_counts = Vec::new();
        let mut comments = 0usize;
        let mut link_count = 0usize;
        let mut equation_count = 0usize;

        for body in bodies {
            comments += 1;
            let stats = text_stats::analyze(body);
            if stats.words > 0 {
                word_counts.push(stats.words as f64);
            }
            if stats.has_link {
                link_count += 1;
            }
            if stats.has_equation {
                equation_count += 1;
            }
        }
        if comments == 0 {
            return None;
        }

        let median_words = median(&word_counts);
        let total = comments.max(1) as f64;
        let sources_per_10 = link_count as f64 / total * 10.0;
        let equation_fraction = equation_count as f64 / total;

        let raw = median_words.min(MEDIAN_WORDS_CAP) / MEDIAN_WORDS_CAP * 40.0
            + sources_per_10.min(SOURCES_PER_10_CAP) * 6.0
            + equation_fraction.min(EQUATION_FRACTION_CAP) * 40.0;
        let raw_score = raw.clamp(0.0, 100.0);

        Some(DepthReading {
            comments,
            median_words,
            link_count,
            equation_count,
            sources_per_10,
            equation_fraction,
            raw_score,
            score: self.display.apply(raw_score),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_comments_no_reading() {
        assert!(DepthMeter::default().measure(Vec::<&str>::new()).is_none());
    }

    #[test]
    fn empty_bodies_sit_on_the_floor() {
        let r = DepthMeter::default().measure(["", "   "]).unwrap();
        assert_eq!(r.raw_score, 0.0);
        assert_eq!(r.score, 40);
        assert_eq!(r.summary(), "Depth 40 / 100 · median 0 words, 0 sources, 0% equations/models");
    }

    #[test]
    fn median_ignores_empty_comments() {
        let r = DepthMeter::default()
            .measure(["a b c d e f g h i j", "", "a b c d e f g h i j k l m n o p q r s t u v w x y z a b c d"])
            .unwrap();
        assert_eq!(r.median_words, 20.0);
        assert_eq!(r.comments, 3);
    }

    #[test]
    fn saturated_thread_tops_out() {
        let long = "word ".repeat(250) + "see [1] and x = 2";
        let r = DepthMeter::default().measure([long.as_str(), long.as_str()]).unwrap();
        // 40 + 36 + 32
        assert_eq!(r.raw_score, 100.0);
        assert_eq!(r.score, 80);
        assert_eq!(DepthMeter::new(DepthDisplay::Raw).measure([long.as_str()]).unwrap().score, 100);
    }

    #[test]
    fn tiny_positive_raw_lifts_off_the_floor() {
        let r = DepthMeter::default().measure(["hi"]).unwrap();
        assert!(r.raw_score > 0.0);
        assert_eq!(r.score, 41);
    }

    #[test]
    fn mixed_thread() {
        // one cited comment out of two, no equations, word counts 6 and 5
        let r = DepthMeter::default().measure(["one two three four five [2]", "a b c d e"]).unwrap();
        assert_eq!(r.link_count, 1);
        assert_eq!(r.sources_per_10, 5.0);
        // 5.5/200*40 + 5*6 = 1.1 + 30
        assert!((r.raw_score - 31.1).abs() < 1e-9);
        assert_eq!(r.score, 52);
        assert_eq!(r.fill_percent(), "52%");
    }
}
