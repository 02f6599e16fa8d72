use std::collections::HashSet;

/// Depth at which a comment starts collapsed.
pub const COLLAPSE_DEPTH: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollapseState {
    Collapsed,
    Expanded,
}

/// Local (non-persisted) unroll/collapse toggle state for deep comments.
///
/// Deep comments are collapsed unless explicitly expanded, so comments added
/// after construction start collapsed too.
#[derive(Debug, Clone, Default)]
pub struct ThreadCollapser {
    expanded: HashSet<u64>,
}

impl ThreadCollapser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_collapsible(depth: u32) -> bool {
        depth >= COLLAPSE_DEPTH
    }

    pub fn state(&self, id: u64, depth: u32) -> Option<CollapseState> {
        if !Self::is_collapsible(depth) {
            return None;
        }
        if self.expanded.contains(&id) {
            Some(CollapseState::Expanded)
        } else {
            Some(CollapseState::Collapsed)
        }
    }

    /// Flip the state of a deep comment; shallow comments have no toggle.
    pub fn toggle(&mut self, id: u64, depth: u32) -> Option<CollapseState> {
        match self.state(id, depth)? {
            CollapseState::Collapsed => {
                self.expanded.insert(id);
                Some(CollapseState::Expanded)
            }
            CollapseState::Expanded => {
                self.expanded.remove(&id);
                Some(CollapseState::Collapsed)
            }
        }
    }

    pub fn label(state: CollapseState, replies: usize) -> String {
        match state {
            CollapseState::Collapsed => unroll_label(replies),
            CollapseState::Expanded => "Collapse thread".to_string(),
        }
    }
}

pub fn unroll_label(replies: usize) -> String {
    let noun = if replies == 1 { "reply" } else { "replies" };
    format!("Unroll thread ({replies} {noun})")
}
