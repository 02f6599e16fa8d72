use async_trait::async_trait;
use log::info;
use std::time::Duration;

use crate::models::AccountRequestRecord;

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("transport: {0}")]
    Transport(String),
    #[error("webhook returned {0}")]
    Status(u16),
}

/// Outbound "someone asked for an account" hook.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn account_requested(&self, request: &AccountRequestRecord) -> Result<(), NotifyError>;
}

pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(Duration::from_secs(10)).build()?;
        Ok(Self { client, url: url.into() })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn account_requested(&self, request: &AccountRequestRecord) -> Result<(), NotifyError> {
        let who = if request.handle.is_empty() { request.email.clone() } else { format!("@{} <{}>", request.handle, request.email) };
        let payload = serde_json::json!({
            "text": format!("New dense account / invite request from {who}"),
            "request": request,
        });
        let resp = self
            .client
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(NotifyError::Status(resp.status().as_u16()));
        }
        info!("account request notification delivered");
        Ok(())
    }
}
