//! Versioned document store: "get current content + version token" and
//! "put new content if the token still matches".

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use log::{error, info, warn};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not_found")]
    NotFound,
    /// The version token no longer matches the stored document.
    #[error("conflict")]
    Conflict,
    #[error("denied: {0}")]
    Denied(String),
    #[error("unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Versioned {
    pub text: String,
    pub version: String,
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn fetch(&self, path: &str) -> Result<Versioned, StoreError>;
    /// Write `text` at `path`. `version` must be the token from the last
    /// fetch, or `None` to create a document that does not exist yet.
    /// Returns the new version token.
    async fn put(&self, path: &str, version: Option<&str>, text: &str, message: &str) -> Result<String, StoreError>;
}

// ---------------- GitHub contents API ----------------------------------

#[derive(Debug, Clone)]
pub struct GitHubConfig {
    pub token: Option<String>,
    pub owner: String,
    pub repo: String,
    pub api_base: String,
    pub branch: Option<String>,
}

pub struct GitHubStore {
    client: reqwest::Client,
    cfg: GitHubConfig,
}

#[derive(Deserialize)]
struct ContentsFile {
    sha: String,
    #[serde(default)]
    content: String,
    /// `base64` for inline content; files over 1 MB come back as `none`
    /// with empty `content`.
    #[serde(default)]
    encoding: Option<String>,
}

const JSON_MEDIA_TYPE: &str = "application/vnd.github+json";
const RAW_MEDIA_TYPE: &str = "application/vnd.github.raw";

#[derive(Deserialize)]
struct PutResponse {
    content: ContentsFile,
}

impl GitHubStore {
    pub fn new(cfg: GitHubConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("dense-backend")
            .timeout(Duration::from_secs(20))
            .build()?;
        if cfg.token.is_none() {
            warn!("GITHUB_TOKEN is not set; GitHub writes will fail");
        }
        info!("GitHub document store targeting {}/{}", cfg.owner, cfg.repo);
        Ok(Self { client, cfg })
    }

    fn url_for(&self, path: &str) -> String {
        let encoded: Vec<String> = path.split('/').map(|seg| urlencoding::encode(seg).into_owned()).collect();
        format!(
            "{}/repos/{}/{}/contents/{}",
            self.cfg.api_base.trim_end_matches('/'),
            self.cfg.owner,
            self.cfg.repo,
            encoded.join("/")
        )
    }

    fn get(&self, path: &str, accept: &str) -> reqwest::RequestBuilder {
        let mut req = self.request(reqwest::Method::GET, &self.url_for(path), accept);
        if let Some(branch) = &self.cfg.branch {
            req = req.query(&[("ref", branch)]);
        }
        req
    }

    /// Body of a file too large for inline content.
    async fn fetch_raw(&self, path: &str) -> Result<String, StoreError> {
        let resp = self.get(path, RAW_MEDIA_TYPE).send().await.map_err(|e| StoreError::Unavailable(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            // the file was listed a moment ago; never let this read as "missing"
            return Err(match classify_status(status, body) {
                StoreError::NotFound => StoreError::Unavailable(format!("raw read of {path} returned 404")),
                other => other,
            });
        }
        resp.text().await.map_err(|e| StoreError::Unavailable(format!("non utf-8 document {path}: {e}")))
    }

    fn request(&self, method: reqwest::Method, url: &str, accept: &str) -> reqwest::RequestBuilder {
        let mut req = self.client.request(method, url).header(reqwest::header::ACCEPT, accept);
        if let Some(token) = &self.cfg.token {
            req = req.bearer_auth(token);
        }
        req
    }
}

fn classify_status(status: reqwest::StatusCode, body: String) -> StoreError {
    use reqwest::StatusCode;
    match status {
        StatusCode::NOT_FOUND => StoreError::NotFound,
        StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => StoreError::Conflict,
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => StoreError::Denied(format!("{status}: {body}")),
        _ => StoreError::Unavailable(format!("{status}: {body}")),
    }
}

#[async_trait]
impl DocumentStore for GitHubStore {
    async fn fetch(&self, path: &str) -> Result<Versioned, StoreError> {
        let resp = self
            .get(path, JSON_MEDIA_TYPE)
            .send()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(classify_status(status, body));
        }
        let file: ContentsFile = resp.json().await.map_err(|e| StoreError::Unavailable(e.to_string()))?;
        let text = match file.encoding.as_deref() {
            Some("base64") => {
                // GitHub wraps base64 content at 60 columns
                let compact: String = file.content.chars().filter(|c| !c.is_whitespace()).collect();
                let bytes = BASE64.decode(compact).map_err(|e| StoreError::Unavailable(format!("bad base64 for {path}: {e}")))?;
                String::from_utf8(bytes).map_err(|e| StoreError::Unavailable(format!("non utf-8 document {path}: {e}")))?
            }
            other => {
                info!("{path} has no inline content (encoding {other:?}); reading raw");
                self.fetch_raw(path).await?
            }
        };
        // a stale raw read is caught by the sha check on put
        Ok(Versioned { text, version: file.sha })
    }

    async fn put(&self, path: &str, version: Option<&str>, text: &str, message: &str) -> Result<String, StoreError> {
        let mut body = serde_json::json!({
            "message": message,
            "content": BASE64.encode(text.as_bytes()),
        });
        if let Some(sha) = version {
            body["sha"] = serde_json::Value::String(sha.to_string());
        }
        if let Some(branch) = &self.cfg.branch {
            body["branch"] = serde_json::Value::String(branch.clone());
        }
        let resp = self
            .request(reqwest::Method::PUT, &self.url_for(path), JSON_MEDIA_TYPE)
            .json(&body)
            .send()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let err = classify_status(status, body);
            if !matches!(err, StoreError::Conflict) {
                error!("put {path} failed: {err}");
            }
            return Err(err);
        }
        let put: PutResponse = resp.json().await.map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(put.content.sha)
    }
}

// ---------------- in-memory store (dev + tests) ---------------------------

pub fn content_version(text: &str) -> String {
    hex::encode(Sha256::digest(text.as_bytes()))
}

#[derive(Default, Clone)]
pub struct InMemoryStore {
    docs: Arc<Mutex<HashMap<String, Versioned>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(self, path: &str, text: &str) -> Self {
        if let Ok(mut docs) = self.docs.lock() {
            docs.insert(path.to_string(), Versioned { text: text.to_string(), version: content_version(text) });
        }
        self
    }

    pub fn snapshot(&self, path: &str) -> Option<Versioned> {
        self.docs.lock().ok()?.get(path).cloned()
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn fetch(&self, path: &str) -> Result<Versioned, StoreError> {
        self.snapshot(path).ok_or(StoreError::NotFound)
    }

    async fn put(&self, path: &str, version: Option<&str>, text: &str, _message: &str) -> Result<String, StoreError> {
        let mut docs = self.docs.lock().map_err(|_| StoreError::Unavailable("store lock poisoned".into()))?;
        let current = docs.get(path).map(|d| d.version.as_str());
        if current != version {
            return Err(StoreError::Conflict);
        }
        let new_version = content_version(text);
        docs.insert(path.to_string(), Versioned { text: text.to_string(), version: new_version.clone() });
        Ok(new_version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn inmem_conditional_put() {
        let s = InMemoryStore::new().with_document("a.yml", "x: 1\n");
        let v = s.fetch("a.yml").await.unwrap();
        let v2 = s.put("a.yml", Some(&v.version), "x: 2\n", "m").await.unwrap();
        assert_ne!(v.version, v2);
        // stale token
        assert!(matches!(s.put("a.yml", Some(&v.version), "x: 3\n", "m").await, Err(StoreError::Conflict)));
        // create over an existing doc
        assert!(matches!(s.put("a.yml", None, "x: 3\n", "m").await, Err(StoreError::Conflict)));
        // create new
        s.put("b.yml", None, "y: 1\n", "m").await.unwrap();
        assert_eq!(s.fetch("b.yml").await.unwrap().text, "y: 1\n");
    }

    #[tokio::test]
    async fn missing_document_is_not_found() {
        let s = InMemoryStore::new();
        assert!(matches!(s.fetch("nope.yml").await, Err(StoreError::NotFound)));
    }
}
