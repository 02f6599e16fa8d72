//! Page metrics panel: local view counter and the thread depth gauge.

use crate::depth_meter::{DepthMeter, DepthReading};
use crate::local_state::{LocalState, Namespace};

pub struct MetricsPanel {
    path: String,
    state: LocalState,
    meter: DepthMeter,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Gauge {
    pub fill: String,
    pub text: String,
    pub reading: DepthReading,
}

impl MetricsPanel {
    pub fn new(path: impl Into<String>, state: LocalState, meter: DepthMeter) -> Self {
        Self { path: path.into(), state, meter }
    }

    /// Counts this page load. A failed write shows 1.
    pub fn record_view(&self) -> u64 {
        let count = self.state.load::<u64>(Namespace::Views, &self.path).unwrap_or(0).saturating_add(1);
        match self.state.save(Namespace::Views, &self.path, &count) {
            Ok(()) => count,
            Err(e) => {
                log::warn!("view counter for {} not saved: {e}", self.path);
                1
            }
        }
    }

    /// `None` when the page has no comments; the gauge stays hidden then.
    pub fn gauge<'a, I>(&self, bodies: I) -> Option<Gauge>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let reading = self.meter.measure(bodies)?;
        Some(Gauge { fill: reading.fill_percent(), text: reading.summary(), reading })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::local_state::{StateBackend, StateError};
    use std::sync::Arc;

    struct ReadOnly;
    impl StateBackend for ReadOnly {
        fn read(&self, _key: &str) -> Result<Option<String>, StateError> {
            Ok(Some(r#"{"schema":1,"data":41}"#.to_string()))
        }
        fn write(&self, _key: &str, _value: &str) -> Result<(), StateError> {
            Err(StateError::Io(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "quota")))
        }
        fn remove(&self, _key: &str) -> Result<(), StateError> {
            Ok(())
        }
    }

    #[test]
    fn views_count_per_path() {
        let state = LocalState::in_memory();
        let a = MetricsPanel::new("/a", state.clone(), DepthMeter::default());
        assert_eq!(a.record_view(), 1);
        assert_eq!(a.record_view(), 2);
        assert_eq!(MetricsPanel::new("/b", state, DepthMeter::default()).record_view(), 1);
    }

    #[test]
    fn storage_failure_shows_one() {
        let panel = MetricsPanel::new("/a", LocalState::new(Arc::new(ReadOnly)), DepthMeter::default());
        assert_eq!(panel.record_view(), 1);
    }

    #[test]
    fn gauge_hidden_without_comments() {
        let panel = MetricsPanel::new("/a", LocalState::in_memory(), DepthMeter::default());
        assert!(panel.gauge(Vec::<&str>::new()).is_none());
        let g = panel.gauge(["x = 1 see [1]"]).unwrap();
        assert_eq!(g.fill, format!("{}%", g.reading.score));
        assert!(g.text.starts_with(&format!("Depth {} / 100", g.reading.score)));
        assert!((40..=80).contains(&g.reading.score));
    }
}
