use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::local_state::{LocalState, Namespace};

pub const SAVED_STATUS: &str =
    "Preferences saved locally. In a live deployment this would send a magic-link-style confirmation.";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedPrefs {
    pub dense: bool,
    pub changelog: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedSubscription {
    pub email: String,
    pub prefs: FeedPrefs,
    pub at: i64,
}

pub struct EmailFeeds {
    state: LocalState,
}

impl EmailFeeds {
    pub fn new(state: LocalState) -> Self {
        Self { state }
    }

    pub fn current(&self) -> Option<FeedSubscription> {
        self.state.load(Namespace::EmailFeed, "")
    }

    /// Saves the preferences and returns the status line to show, or `None`
    /// for a blank email.
    pub fn subscribe(&self, email: &str, prefs: FeedPrefs, now: DateTime<Utc>) -> Option<&'static str> {
        let email = email.trim();
        if email.is_empty() {
            return None;
        }
        let sub = FeedSubscription { email: email.to_string(), prefs, at: now.timestamp_millis() };
        self.state.save_or_log(Namespace::EmailFeed, "", &sub);
        Some(SAVED_STATUS)
    }
}
