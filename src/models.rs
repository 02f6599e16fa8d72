use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value; // free-form invite metadata
use utoipa::ToSchema;

pub const READER_ROLE: &str = "reader";
pub const ANON_HANDLE: &str = "anon";

/// Treat `""` like an absent field, the way the site's JS payloads do.
fn present(v: &Option<String>) -> Option<&str> {
    v.as_deref().filter(|s| !s.is_empty())
}

/// ISO-8601 UTC with milliseconds, e.g. `2024-05-01T12:00:00.000Z`.
pub fn timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

// ---------------- request payloads (also queued by the client outbox) -----

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct NewComment {
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub handle: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct NewAccountRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub handle: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub links: Option<Vec<String>>,
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub invite: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct NewReport {
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub handle: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
}

// ---------------- persisted YAML records ----------------------------------

/// One entry of `<slug>.comments` in the comments document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentRecord {
    pub handle: String,
    pub role: String,
    pub tags: Vec<String>,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountRequestRecord {
    pub at: String,
    pub email: String,
    pub handle: String,
    pub bio: String,
    pub status: String,
    pub links: Vec<String>,
    pub invite: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRecord {
    pub at: String,
    pub slug: String,
    pub handle: String,
    pub reason: String,
}

impl NewComment {
    /// `(slug, record)` or `None` when slug or body is missing.
    pub fn into_record(self) -> Option<(String, CommentRecord)> {
        let slug = present(&self.slug)?.to_string();
        let body = present(&self.body)?.to_string();
        let handle = present(&self.handle).unwrap_or(ANON_HANDLE).to_string();
        Some((
            slug,
            CommentRecord { handle, role: READER_ROLE.into(), tags: self.tags.unwrap_or_default(), body },
        ))
    }
}

impl NewAccountRequest {
    /// Top-level email, falling back to `invite.email`.
    pub fn effective_email(&self) -> Option<String> {
        if let Some(e) = present(&self.email) {
            return Some(e.to_string());
        }
        self.invite
            .as_ref()
            .and_then(|i| i.get("email"))
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }

    pub fn into_record(self, at: String) -> Option<AccountRequestRecord> {
        let email = self.effective_email()?;
        Some(AccountRequestRecord {
            at,
            email,
            handle: self.handle.unwrap_or_default(),
            bio: self.bio.unwrap_or_default(),
            status: self.status.unwrap_or_default(),
            links: self.links.unwrap_or_default(),
            invite: self.invite.filter(|v| !v.is_null()),
        })
    }
}

impl NewReport {
    pub fn into_record(self, at: String) -> Option<ReportRecord> {
        let slug = present(&self.slug)?.to_string();
        let reason = present(&self.reason)?.to_string();
        Some(ReportRecord { at, slug, handle: self.handle.unwrap_or_default(), reason })
    }
}

// ---------------- responses ------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OkResponse {
    pub ok: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub ok: bool,
    /// Milliseconds since the Unix epoch.
    pub ts: i64,
}
