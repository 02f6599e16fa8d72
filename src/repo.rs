//! Append-only writes into the shared YAML documents.
//!
//! Every write is FETCH → MUTATE → conditional WRITE. A version conflict
//! re-runs the whole cycle (bounded by the retry policy) so the append is
//! re-applied on top of whatever the other writer committed.

use std::sync::Arc;

use log::{error, warn};
use serde::Serialize;
use serde_yaml::{Mapping, Value};

use crate::config::{DocumentPaths, RetryPolicy};
use crate::models::{AccountRequestRecord, CommentRecord, ReportRecord};
use crate::store::{DocumentStore, StoreError};

#[derive(thiserror::Error, Debug)]
pub enum RepoError {
    #[error("not found")]
    NotFound,
    /// Still conflicting after every retry; safe to retry later.
    #[error("conflict")]
    Conflict,
    #[error("malformed document: {0}")]
    Malformed(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl RepoError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, RepoError::Conflict)
    }
}

impl From<StoreError> for RepoError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound => RepoError::NotFound,
            StoreError::Conflict => RepoError::Conflict,
            other => RepoError::Internal(other.to_string()),
        }
    }
}

pub type RepoResult<T> = Result<T, RepoError>;

/// What to do when the document does not exist yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingPolicy {
    Required,
    CreateEmpty,
}

pub struct DocumentRepo {
    store: Arc<dyn DocumentStore>,
    paths: DocumentPaths,
    retry: RetryPolicy,
}

fn parse_document(text: &str) -> RepoResult<Mapping> {
    let value: Value = serde_yaml::from_str(text).map_err(|e| RepoError::Malformed(e.to_string()))?;
    match value {
        Value::Null => Ok(Mapping::new()),
        Value::Mapping(m) => Ok(m),
        _ => Err(RepoError::Malformed("document root is not a mapping".into())),
    }
}

fn to_yaml<T: Serialize>(record: &T) -> RepoResult<Value> {
    serde_yaml::to_value(record).map_err(|e| RepoError::Internal(e.to_string()))
}

fn key(k: &str) -> Value {
    Value::String(k.to_string())
}

/// `map[field]` as a sequence, replacing any non-sequence value with `[]`.
fn sequence_at<'a>(map: &'a mut Mapping, field: &str) -> &'a mut Vec<Value> {
    let k = key(field);
    if !matches!(map.get(&k), Some(Value::Sequence(_))) {
        map.insert(k.clone(), Value::Sequence(Vec::new()));
    }
    match map.get_mut(&k) {
        Some(Value::Sequence(seq)) => seq,
        _ => unreachable!("sequence inserted above"),
    }
}

/// Append a comment under `slug`, creating `{title: slug, comments: []}`
/// when the slug has no usable entry.
pub fn append_comment_to(doc: &mut Mapping, slug: &str, record: &CommentRecord) -> RepoResult<()> {
    let k = key(slug);
    if !matches!(doc.get(&k), Some(Value::Mapping(_))) {
        let mut entry = Mapping::new();
        entry.insert(key("title"), key(slug));
        entry.insert(key("comments"), Value::Sequence(Vec::new()));
        doc.insert(k.clone(), Value::Mapping(entry));
    }
    let value = to_yaml(record)?;
    match doc.get_mut(&k) {
        Some(Value::Mapping(entry)) => sequence_at(entry, "comments").push(value),
        _ => unreachable!("entry inserted above"),
    }
    Ok(())
}

pub fn append_to_list<T: Serialize>(doc: &mut Mapping, field: &str, record: &T) -> RepoResult<()> {
    let value = to_yaml(record)?;
    sequence_at(doc, field).push(value);
    Ok(())
}

impl DocumentRepo {
    pub fn new(store: Arc<dyn DocumentStore>, paths: DocumentPaths, retry: RetryPolicy) -> Self {
        Self { store, paths, retry }
    }

    pub fn paths(&self) -> &DocumentPaths {
        &self.paths
    }

    pub async fn append_comment(&self, slug: &str, record: CommentRecord) -> RepoResult<()> {
        let message = format!("Add dense comment to {slug}");
        self.read_modify_write(&self.paths.comments, MissingPolicy::Required, &message, |doc| {
            append_comment_to(doc, slug, &record)
        })
        .await
    }

    pub async fn append_account_request(&self, record: AccountRequestRecord) -> RepoResult<()> {
        self.read_modify_write(
            &self.paths.invites,
            MissingPolicy::CreateEmpty,
            "Append dense account / invite request",
            |doc| append_to_list(doc, "requests", &record),
        )
        .await
    }

    pub async fn append_report(&self, record: ReportRecord) -> RepoResult<()> {
        self.read_modify_write(
            &self.paths.reports,
            MissingPolicy::CreateEmpty,
            "Append dense moderation report",
            |doc| append_to_list(doc, "reports", &record),
        )
        .await
    }

    pub async fn read_modify_write<F>(&self, path: &str, missing: MissingPolicy, message: &str, mutate: F) -> RepoResult<()>
    where
        F: Fn(&mut Mapping) -> RepoResult<()> + Send + Sync,
    {
        let max_attempts = self.retry.max_attempts.max(1);
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            let (mut doc, version) = match self.store.fetch(path).await {
                Ok(v) => (parse_document(&v.text)?, Some(v.version)),
                Err(StoreError::NotFound) if missing == MissingPolicy::CreateEmpty => (Mapping::new(), None),
                Err(e) => return Err(e.into()),
            };
            mutate(&mut doc)?;
            let text = serde_yaml::to_string(&Value::Mapping(doc)).map_err(|e| RepoError::Internal(e.to_string()))?;
            match self.store.put(path, version.as_deref(), &text, message).await {
                Ok(_) => return Ok(()),
                Err(StoreError::Conflict) if attempt < max_attempts => {
                    let delay = self.retry.backoff(attempt);
                    warn!("version conflict writing {path} (attempt {attempt}/{max_attempts}); retrying in {}ms", delay.as_millis());
                    tokio::time::sleep(delay).await;
                }
                Err(StoreError::Conflict) => {
                    error!("giving up on {path} after {attempt} conflicting writes");
                    return Err(RepoError::Conflict);
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}
