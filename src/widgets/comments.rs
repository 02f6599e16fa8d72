//! Comment list widget: density labels, dense/all view toggle, deep-thread
//! collapse, optimistic submission and per-comment reports.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::classify::{ClassifierPolicy, ViewMode};
use crate::collapse::CollapseState;
use crate::density;
use crate::local_state::{LocalState, Namespace};
use crate::models::{NewComment, NewReport};
use crate::outbox::{Mutation, Outbox, Transport};
use crate::session::Session;
use crate::thread::{CommentId, Thread, ThreadError};

/// A comment as rendered by the page template.
#[derive(Debug, Clone, Deserialize)]
pub struct SeedComment {
    pub handle: String,
    pub body: String,
    #[serde(default)]
    pub replies: Vec<SeedComment>,
}

/// What the page needs to draw one comment row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommentRow {
    pub id: CommentId,
    pub handle: String,
    pub body: String,
    pub depth: u32,
    pub density_score: f64,
    pub word_count: usize,
    pub density_label: String,
    pub dense: bool,
    /// Unroll/collapse control text for deep comments.
    pub toggle: Option<String>,
    pub collapsed: bool,
}

/// Locally remembered report, keyed by page path and comment handle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalReport {
    pub at: i64,
    pub reason: String,
}

pub struct CommentWidget {
    thread: Thread,
    view: ViewMode,
    policy: ClassifierPolicy,
}

impl CommentWidget {
    pub fn new(slug: impl Into<String>, policy: ClassifierPolicy) -> Self {
        Self { thread: Thread::new(slug), view: ViewMode::default(), policy }
    }

    /// Build from the server-rendered tree, depth-first.
    pub fn from_seed(slug: impl Into<String>, seed: &[SeedComment], policy: ClassifierPolicy) -> Result<Self, ThreadError> {
        let mut w = Self::new(slug, policy);
        for c in seed {
            let id = w.thread.push_top_level(&c.handle, &c.body);
            w.seed_replies(id, &c.replies)?;
        }
        Ok(w)
    }

    fn seed_replies(&mut self, parent: CommentId, replies: &[SeedComment]) -> Result<(), ThreadError> {
        for r in replies {
            let id = self.thread.reply(parent, &r.handle, &r.body)?;
            self.seed_replies(id, &r.replies)?;
        }
        Ok(())
    }

    pub fn thread(&self) -> &Thread {
        &self.thread
    }

    pub fn view(&self) -> ViewMode {
        self.view
    }

    pub fn set_view(&mut self, view: ViewMode) {
        self.view = view;
    }

    pub fn toggle_collapse(&mut self, id: CommentId) -> Option<CollapseState> {
        self.thread.toggle_collapse(id)
    }

    pub fn reply(&mut self, parent: CommentId, handle: &str, body: &str) -> Result<CommentId, ThreadError> {
        self.thread.reply(parent, handle, body)
    }

    /// Rows currently on screen, in display order.
    pub fn rows(&self) -> Vec<CommentRow> {
        self.thread
            .visible(self.view, &self.policy)
            .into_iter()
            .map(|c| {
                let stats = c.stats();
                let score = density::score(&stats);
                CommentRow {
                    id: c.id,
                    handle: c.handle.clone(),
                    body: c.body.clone(),
                    depth: c.depth,
                    density_score: score,
                    word_count: stats.words,
                    density_label: density::label(score),
                    dense: self.thread.is_dense(c, &self.policy),
                    toggle: self.thread.toggle_label(c.id),
                    collapsed: self.thread.collapse_state(c.id) == Some(CollapseState::Collapsed),
                }
            })
            .collect()
    }

    /// Insert the comment locally at depth 0 and queue it for the backend.
    /// Blank text is ignored.
    pub fn submit<T: Transport>(
        &mut self,
        handle_field: &str,
        text: &str,
        session: &Session,
        outbox: &mut Outbox<T>,
    ) -> Option<(CommentId, Uuid)> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        let handle = session.comment_handle(handle_field);
        let id = self.thread.push_top_level(&handle, text);
        let delivery = outbox.enqueue(Mutation::Comment(NewComment {
            slug: Some(self.thread.slug.clone()),
            handle: Some(handle),
            body: Some(text.to_string()),
            tags: None,
        }));
        Some((id, delivery))
    }

    /// Remember the report locally and queue it for moderation.
    pub fn report<T: Transport>(
        &self,
        id: CommentId,
        reason: &str,
        page_path: &str,
        state: &LocalState,
        outbox: &mut Outbox<T>,
        now: DateTime<Utc>,
    ) -> Option<Uuid> {
        let comment = self.thread.get(id)?;
        let scope = format!("{page_path}:{}", comment.handle);
        state.save_or_log(Namespace::Reports, &scope, &LocalReport { at: now.timestamp_millis(), reason: reason.to_string() });
        Some(outbox.enqueue(Mutation::Report(NewReport {
            slug: Some(self.thread.slug.clone()),
            handle: Some(comment.handle.clone()),
            reason: Some(reason.to_string()),
        })))
    }
}
