//! Client-side comment thread model.
//!
//! Density and word counts are never stored: they are recomputed from the
//! body on every access so they cannot drift from it.

use serde::{Deserialize, Serialize};

use crate::classify::{self, ClassifierPolicy, ViewMode};
use crate::collapse::{CollapseState, ThreadCollapser};
use crate::density;
use crate::text_stats::{self, TextStats};

pub type CommentId = u64;

pub const DEFAULT_HANDLE: &str = "anon";

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ThreadError {
    #[error("unknown parent comment {0}")]
    UnknownParent(CommentId),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub parent: Option<CommentId>,
    pub handle: String,
    pub body: String,
    pub depth: u32,
}

impl Comment {
    pub fn stats(&self) -> TextStats {
        text_stats::analyze(&self.body)
    }
    pub fn density_score(&self) -> f64 {
        density::score(&self.stats())
    }
    pub fn word_count(&self) -> usize {
        self.stats().words
    }
}

fn handle_or_default(handle: &str) -> String {
    let h = handle.trim();
    if h.is_empty() { DEFAULT_HANDLE.to_string() } else { h.to_string() }
}

/// Ordered comments of one slug plus the thread-relative density threshold.
#[derive(Debug, Clone, Default)]
pub struct Thread {
    pub slug: String,
    comments: Vec<Comment>,
    next_id: CommentId,
    density_threshold: f64,
    collapser: ThreadCollapser,
}

impl Thread {
    pub fn new(slug: impl Into<String>) -> Self {
        Self { slug: slug.into(), ..Default::default() }
    }

    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    pub fn get(&self, id: CommentId) -> Option<&Comment> {
        self.comments.iter().find(|c| c.id == id)
    }

    pub fn len(&self) -> usize {
        self.comments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.comments.is_empty()
    }

    /// New top-level comments always sit at depth 0.
    pub fn push_top_level(&mut self, handle: &str, body: &str) -> CommentId {
        self.insert(None, 0, handle, body)
    }

    pub fn reply(&mut self, parent: CommentId, handle: &str, body: &str) -> Result<CommentId, ThreadError> {
        let depth = self.get(parent).ok_or(ThreadError::UnknownParent(parent))?.depth + 1;
        Ok(self.insert(Some(parent), depth, handle, body))
    }

    fn insert(&mut self, parent: Option<CommentId>, depth: u32, handle: &str, body: &str) -> CommentId {
        self.next_id += 1;
        let id = self.next_id;
        self.comments.push(Comment {
            id,
            parent,
            handle: handle_or_default(handle),
            body: body.to_string(),
            depth,
        });
        self.recompute_threshold();
        id
    }

    /// Median density over every comment, zeros included.
    pub fn recompute_threshold(&mut self) {
        let scores: Vec<f64> = self.comments.iter().map(Comment::density_score).collect();
        self.density_threshold = classify::median(&scores);
    }

    pub fn density_threshold(&self) -> f64 {
        self.density_threshold
    }

    pub fn is_dense(&self, comment: &Comment, policy: &ClassifierPolicy) -> bool {
        let stats = comment.stats();
        policy.is_dense(&stats, density::score(&stats), self.density_threshold)
    }

    pub fn direct_replies(&self, id: CommentId) -> usize {
        self.comments.iter().filter(|c| c.parent == Some(id)).count()
    }

    pub fn collapse_state(&self, id: CommentId) -> Option<CollapseState> {
        let c = self.get(id)?;
        self.collapser.state(id, c.depth)
    }

    pub fn toggle_collapse(&mut self, id: CommentId) -> Option<CollapseState> {
        let depth = self.get(id)?.depth;
        self.collapser.toggle(id, depth)
    }

    /// Label for the unroll/collapse control, `None` for shallow comments.
    pub fn toggle_label(&self, id: CommentId) -> Option<String> {
        let state = self.collapse_state(id)?;
        Some(ThreadCollapser::label(state, self.direct_replies(id)))
    }

    fn hidden_by_collapse(&self, comment: &Comment) -> bool {
        let mut parent = comment.parent;
        while let Some(pid) = parent {
            let Some(p) = self.get(pid) else { break };
            if self.collapser.state(p.id, p.depth) == Some(CollapseState::Collapsed) {
                return true;
            }
            parent = p.parent;
        }
        false
    }

    /// Comments to render, in insertion order, after the view filter and
    /// collapsed ancestors are applied.
    pub fn visible(&self, view: ViewMode, policy: &ClassifierPolicy) -> Vec<&Comment> {
        self.comments
            .iter()
            .filter(|c| view.shows(self.is_dense(c, policy)))
            .filter(|c| !self.hidden_by_collapse(c))
            .collect()
    }
}
