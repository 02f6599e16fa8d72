//! Margin annotations: pinned ones shipped with the page, then the reader's
//! own, kept in local state per slug.

use serde::{Deserialize, Serialize};

use crate::local_state::{LocalState, Namespace};
use crate::thread::DEFAULT_HANDLE;

const READER_HANDLE: &str = "reader";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    #[serde(default)]
    pub quote: String,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub handle: String,
    #[serde(default)]
    pub pinned: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationView {
    pub quote: String,
    pub note: String,
    pub meta: String,
}

impl From<&Annotation> for AnnotationView {
    fn from(a: &Annotation) -> Self {
        let handle = if a.handle.is_empty() { DEFAULT_HANDLE } else { &a.handle };
        Self {
            quote: format!("“{}”", a.quote.trim()),
            note: a.note.clone(),
            meta: if a.pinned { format!("Pinned · {handle}") } else { handle.to_string() },
        }
    }
}

pub struct Annotations {
    slug: String,
    pinned: Vec<Annotation>,
    state: LocalState,
}

impl Annotations {
    /// `pinned_json` is the page's pinned list; anything that is not a JSON
    /// array of annotations counts as no pins.
    pub fn new(slug: impl Into<String>, pinned_json: Option<&str>, state: LocalState) -> Self {
        let pinned = pinned_json
            .and_then(|raw| match serde_json::from_str::<Vec<Annotation>>(raw) {
                Ok(list) => Some(list),
                Err(e) => {
                    log::debug!("ignoring pinned annotations: {e}");
                    None
                }
            })
            .unwrap_or_default();
        Self { slug: slug.into(), pinned, state }
    }

    fn local(&self) -> Vec<Annotation> {
        self.state.load(Namespace::Annotations, &self.slug).unwrap_or_default()
    }

    /// Pinned first, then local. Nothing is shown while the toggle is off.
    pub fn render(&self, show: bool) -> Vec<AnnotationView> {
        if !show {
            return Vec::new();
        }
        self.pinned.iter().chain(self.local().iter()).map(AnnotationView::from).collect()
    }

    /// Both quote and note are required.
    pub fn add(&self, quote: &str, note: &str) -> Option<Annotation> {
        let (quote, note) = (quote.trim(), note.trim());
        if quote.is_empty() || note.is_empty() {
            return None;
        }
        let item = Annotation {
            quote: quote.to_string(),
            note: note.to_string(),
            handle: READER_HANDLE.to_string(),
            pinned: false,
        };
        let mut items = self.local();
        items.push(item.clone());
        self.state.save_or_log(Namespace::Annotations, &self.slug, &items);
        Some(item)
    }
}
