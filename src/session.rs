//! The reader's local profile, passed explicitly to the widgets that need an
//! active handle. Every mutation is saved back to local state.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::local_state::{LocalState, Namespace};
use crate::models::NewAccountRequest;
use crate::thread::DEFAULT_HANDLE;

const DEFAULT_DELTA_TOPIC: &str = "Changed mind";

/// A "changed my mind" entry on the profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Delta {
    pub topic: String,
    #[serde(default)]
    pub note: String,
    /// Milliseconds since the Unix epoch.
    pub at: i64,
}

impl Delta {
    pub fn line(&self) -> String {
        let mut line = self.topic.clone();
        if !self.note.is_empty() {
            line.push_str(" — ");
            line.push_str(&self.note);
        }
        if let Some(at) = Utc.timestamp_millis_opt(self.at).single() {
            line.push_str(&format!(" · {}", at.format("%Y-%m-%d")));
        }
        line
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub email: String,
    #[serde(default)]
    pub handle: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub links: Vec<String>,
    #[serde(default)]
    pub deltas: Vec<Delta>,
}

/// Profile form input; `links` is the raw comma-separated field.
#[derive(Debug, Clone, Default)]
pub struct ProfileForm {
    pub handle: String,
    pub bio: String,
    pub status: String,
    pub links: String,
}

pub struct Session {
    state: LocalState,
    account: Option<Account>,
}

impl Session {
    pub fn load(state: LocalState) -> Self {
        let account = state.load(Namespace::Account, "");
        Self { state, account }
    }

    pub fn account(&self) -> Option<&Account> {
        self.account.as_ref()
    }

    fn save(&self) {
        match &self.account {
            Some(a) => {
                self.state.save_or_log(Namespace::Account, "", a);
            }
            None => {
                if let Err(e) = self.state.clear(Namespace::Account, "") {
                    log::warn!("clearing account failed: {e}");
                }
            }
        }
    }

    /// Blank emails are ignored.
    pub fn login(&mut self, email: &str) -> Option<&Account> {
        let email = email.trim();
        if email.is_empty() {
            return None;
        }
        let account = self.account.get_or_insert_with(Account::default);
        account.email = email.to_string();
        self.save();
        self.account.as_ref()
    }

    pub fn logout(&mut self) {
        self.account = None;
        self.save();
    }

    pub fn save_profile(&mut self, form: &ProfileForm) -> &Account {
        let account = self.account.get_or_insert_with(Account::default);
        account.handle = form.handle.trim().to_string();
        account.bio = form.bio.trim().to_string();
        account.status = form.status.trim().to_string();
        let links = form.links.trim();
        account.links = if links.is_empty() { Vec::new() } else { links.split(',').map(|s| s.trim().to_string()).collect() };
        self.save();
        self.account.get_or_insert_with(Account::default)
    }

    /// Records a delta; both fields blank is a no-op.
    pub fn record_delta(&mut self, topic: &str, note: &str, now: DateTime<Utc>) -> bool {
        let (topic, note) = (topic.trim(), note.trim());
        if topic.is_empty() && note.is_empty() {
            return false;
        }
        let account = self.account.get_or_insert_with(Account::default);
        account.deltas.push(Delta {
            topic: if topic.is_empty() { DEFAULT_DELTA_TOPIC.to_string() } else { topic.to_string() },
            note: note.to_string(),
            at: now.timestamp_millis(),
        });
        self.save();
        true
    }

    pub fn deltas_newest_first(&self) -> Vec<&Delta> {
        let mut out: Vec<&Delta> = self.account.iter().flat_map(|a| a.deltas.iter()).collect();
        out.sort_by(|a, b| b.at.cmp(&a.at));
        out
    }

    pub fn summary(&self) -> String {
        let Some(a) = &self.account else { return String::new() };
        let mut parts = Vec::new();
        if !a.handle.is_empty() {
            parts.push(format!("@{}", a.handle));
        }
        if !a.bio.is_empty() {
            parts.push(format!("\"{}\"", a.bio));
        }
        if !a.status.is_empty() {
            parts.push(format!("Working on: {}", a.status));
        }
        if !a.links.is_empty() {
            parts.push(format!("Links: {}", a.links.join(", ")));
        }
        parts.join(" · ")
    }

    pub fn active_handle(&self) -> Option<&str> {
        self.account.as_ref().map(|a| a.handle.as_str()).filter(|h| !h.is_empty())
    }

    /// Handle for a new comment: the form field, else `@<active handle>`,
    /// else `anon`.
    pub fn comment_handle(&self, field: &str) -> String {
        let field = field.trim();
        if !field.is_empty() {
            return field.to_string();
        }
        match self.active_handle() {
            Some(h) => format!("@{h}"),
            None => DEFAULT_HANDLE.to_string(),
        }
    }

    /// Account/invite request for the backend built from the profile.
    pub fn invite_request(&self, invite: Option<serde_json::Value>) -> Option<NewAccountRequest> {
        let a = self.account.as_ref()?;
        let req = NewAccountRequest {
            email: Some(a.email.clone()),
            handle: Some(a.handle.clone()),
            bio: Some(a.bio.clone()),
            status: Some(a.status.clone()),
            links: Some(a.links.clone()),
            invite,
        };
        req.effective_email().map(|_| req)
    }
}
