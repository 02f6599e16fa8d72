//! Per-thread scratch chat kept only in local state for a week.

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::local_state::{LocalState, Namespace};
use crate::thread::DEFAULT_HANDLE;

pub const RETENTION_DAYS: i64 = 7;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    #[serde(default)]
    pub handle: String,
    #[serde(default)]
    pub text: String,
    /// Milliseconds since the Unix epoch.
    #[serde(default)]
    pub at: i64,
}

impl ChatMessage {
    pub fn meta(&self) -> String {
        let handle = if self.handle.is_empty() { DEFAULT_HANDLE } else { &self.handle };
        match Utc.timestamp_millis_opt(self.at).single() {
            Some(at) => format!("{handle} · {}", at.format("%Y-%m-%d %H:%M")),
            None => handle.to_string(),
        }
    }
}

pub struct LabChat {
    slug: String,
    state: LocalState,
}

impl LabChat {
    pub fn new(slug: impl Into<String>, state: LocalState) -> Self {
        Self { slug: slug.into(), state }
    }

    /// Messages from the last week with non-empty text, oldest first.
    pub fn messages(&self, now: DateTime<Utc>) -> Vec<ChatMessage> {
        let cutoff = (now - Duration::days(RETENTION_DAYS)).timestamp_millis();
        let mut msgs: Vec<ChatMessage> = self
            .state
            .load::<Vec<ChatMessage>>(Namespace::LabChat, &self.slug)
            .unwrap_or_default()
            .into_iter()
            .filter(|m| m.at > 0 && m.at >= cutoff && !m.text.is_empty())
            .collect();
        msgs.sort_by_key(|m| m.at);
        msgs
    }

    /// Appends a message; blank text is ignored. Expired messages are
    /// dropped from storage on the way.
    pub fn post(&self, handle: &str, text: &str, now: DateTime<Utc>) -> Option<ChatMessage> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        let handle = handle.trim();
        let msg = ChatMessage {
            handle: if handle.is_empty() { DEFAULT_HANDLE.to_string() } else { handle.to_string() },
            text: text.to_string(),
            at: now.timestamp_millis(),
        };
        let mut msgs = self.messages(now);
        msgs.push(msg.clone());
        self.state.save_or_log(Namespace::LabChat, &self.slug, &msgs);
        Some(msg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(ms: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(ms).unwrap()
    }

    const DAY: i64 = 24 * 60 * 60 * 1000;

    #[test]
    fn post_trims_and_defaults_handle() {
        let chat = LabChat::new("post-1", LocalState::in_memory());
        assert!(chat.post("x", "   ", at(DAY)).is_none());
        let m = chat.post("  ", " hi there ", at(DAY)).unwrap();
        assert_eq!(m.handle, "anon");
        assert_eq!(m.text, "hi there");
        assert_eq!(chat.messages(at(DAY)), vec![m]);
    }

    #[test]
    fn old_and_empty_messages_are_dropped_and_sorted() {
        let state = LocalState::in_memory();
        let now = 30 * DAY;
        let stored = vec![
            ChatMessage { handle: "b".into(), text: "newer".into(), at: now - DAY },
            ChatMessage { handle: "a".into(), text: "stale".into(), at: now - 8 * DAY },
            ChatMessage { handle: "c".into(), text: "".into(), at: now - DAY },
            ChatMessage { handle: "d".into(), text: "older".into(), at: now - 6 * DAY },
        ];
        state.save(Namespace::LabChat, "post-1", &stored).unwrap();
        let chat = LabChat::new("post-1", state);
        let texts: Vec<_> = chat.messages(at(now)).into_iter().map(|m| m.text).collect();
        assert_eq!(texts, vec!["older", "newer"]);
    }

    #[test]
    fn chats_are_scoped_by_slug() {
        let state = LocalState::in_memory();
        LabChat::new("a", state.clone()).post("h", "one", at(DAY));
        assert!(LabChat::new("b", state).messages(at(DAY)).is_empty());
    }

    #[test]
    fn meta_line() {
        let m = ChatMessage { handle: String::new(), text: "x".into(), at: 0 };
        assert_eq!(m.meta(), "anon · 1970-01-01 00:00");
    }
}
