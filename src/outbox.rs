//! Client-side delivery queue for mutations bound for the backend.
//!
//! Submissions are enqueued (and persisted) first, so the UI can update
//! optimistically, then delivered in FIFO order. Transient failures are
//! retried with backoff; a rejected mutation (4xx other than 408/429) is
//! dropped and marked failed. Delivery status is queryable per mutation id
//! until acknowledged; only the most recent finished statuses are kept.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::time::Duration;
use uuid::Uuid;

use crate::config::RetryPolicy;
use crate::local_state::{LocalState, Namespace};
use crate::models::{NewAccountRequest, NewComment, NewReport};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload", rename_all = "lowercase")]
pub enum Mutation {
    Comment(NewComment),
    Account(NewAccountRequest),
    Report(NewReport),
}

impl Mutation {
    pub fn endpoint(&self) -> &'static str {
        match self {
            Mutation::Comment(_) => "/api/dense/comment",
            Mutation::Account(_) => "/api/dense/account",
            Mutation::Report(_) => "/api/dense/report",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum DeliveryStatus {
    Pending,
    Retrying { attempts: u32 },
    Delivered,
    Failed { reason: String },
}

#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    /// The backend refused the payload; retrying will not help.
    #[error("rejected with status {0}")]
    Rejected(u16),
    #[error("transient: {0}")]
    Transient(String),
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn deliver(&self, mutation: &Mutation) -> Result<(), DeliveryError>;
}

/// Posts mutations as JSON to the dense backend.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(Duration::from_secs(15)).build()?;
        Ok(Self { client, base_url: base_url.into() })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn deliver(&self, mutation: &Mutation) -> Result<(), DeliveryError> {
        let url = format!("{}{}", self.base_url.trim_end_matches('/'), mutation.endpoint());
        let req = self.client.post(url);
        let req = match mutation {
            Mutation::Comment(p) => req.json(p),
            Mutation::Account(p) => req.json(p),
            Mutation::Report(p) => req.json(p),
        };
        let resp = req.send().await.map_err(|e| DeliveryError::Transient(e.to_string()))?;
        classify_response(resp.status())
    }
}

fn classify_response(status: reqwest::StatusCode) -> Result<(), DeliveryError> {
    use reqwest::StatusCode;
    match status {
        s if s.is_success() => Ok(()),
        StatusCode::REQUEST_TIMEOUT | StatusCode::TOO_MANY_REQUESTS => {
            Err(DeliveryError::Transient(format!("server answered {status}")))
        }
        s if s.is_client_error() => Err(DeliveryError::Rejected(s.as_u16())),
        _ => Err(DeliveryError::Transient(format!("server answered {status}"))),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Queued {
    id: Uuid,
    mutation: Mutation,
    attempts: u32,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FlushReport {
    pub delivered: usize,
    pub failed: usize,
    /// Mutations still queued after this flush.
    pub remaining: usize,
}

const OUTBOX_SCOPE: &str = "queue";
/// Delivered/failed statuses retained for callers that never acknowledge.
const MAX_FINISHED: usize = 256;

pub struct Outbox<T: Transport> {
    transport: T,
    policy: RetryPolicy,
    queue: VecDeque<Queued>,
    statuses: HashMap<Uuid, DeliveryStatus>,
    /// Ids with a terminal status, oldest first.
    finished: VecDeque<Uuid>,
    state: Option<LocalState>,
}

impl<T: Transport> Outbox<T> {
    pub fn new(transport: T, policy: RetryPolicy) -> Self {
        Self {
            transport,
            policy,
            queue: VecDeque::new(),
            statuses: HashMap::new(),
            finished: VecDeque::new(),
            state: None,
        }
    }

    /// Outbox whose queue survives restarts; undelivered mutations from a
    /// previous session are reloaded as pending.
    pub fn persistent(transport: T, policy: RetryPolicy, state: LocalState) -> Self {
        let queue: VecDeque<Queued> = state.load(Namespace::Outbox, OUTBOX_SCOPE).unwrap_or_default();
        let statuses = queue.iter().map(|q| (q.id, DeliveryStatus::Pending)).collect();
        Self { transport, policy, queue, statuses, finished: VecDeque::new(), state: Some(state) }
    }

    fn persist(&self) {
        if let Some(state) = &self.state {
            state.save_or_log(Namespace::Outbox, OUTBOX_SCOPE, &self.queue);
        }
    }

    pub fn enqueue(&mut self, mutation: Mutation) -> Uuid {
        let id = Uuid::new_v4();
        self.queue.push_back(Queued { id, mutation, attempts: 0 });
        self.statuses.insert(id, DeliveryStatus::Pending);
        self.persist();
        id
    }

    pub fn status(&self, id: Uuid) -> Option<&DeliveryStatus> {
        self.statuses.get(&id)
    }

    /// Current status of `id`; a delivered or failed status is forgotten
    /// once returned here.
    pub fn acknowledge(&mut self, id: Uuid) -> Option<DeliveryStatus> {
        let status = self.statuses.get(&id)?;
        if !matches!(status, DeliveryStatus::Delivered | DeliveryStatus::Failed { .. }) {
            return Some(status.clone());
        }
        self.finished.retain(|f| *f != id);
        self.statuses.remove(&id)
    }

    fn finish(&mut self, id: Uuid, status: DeliveryStatus) {
        self.statuses.insert(id, status);
        self.finished.push_back(id);
        while self.finished.len() > MAX_FINISHED {
            if let Some(oldest) = self.finished.pop_front() {
                self.statuses.remove(&oldest);
            }
        }
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Deliver queued mutations in order. Stops at the first mutation that
    /// is still failing transiently after `max_attempts` tries this flush,
    /// leaving it (and everything behind it) queued for the next flush.
    pub async fn flush(&mut self) -> FlushReport {
        let mut report = FlushReport::default();
        let max_attempts = self.policy.max_attempts.max(1);
        'queue: while let Some(head) = self.queue.front().cloned() {
            let mut tries = 0u32;
            loop {
                tries += 1;
                let result = self.transport.deliver(&head.mutation).await;
                let attempts = head.attempts + tries;
                match result {
                    Ok(()) => {
                        self.queue.pop_front();
                        self.finish(head.id, DeliveryStatus::Delivered);
                        report.delivered += 1;
                        break;
                    }
                    Err(DeliveryError::Rejected(code)) => {
                        log::warn!("outbox: {} rejected with {code}; dropping", head.mutation.endpoint());
                        self.queue.pop_front();
                        self.finish(head.id, DeliveryStatus::Failed { reason: format!("rejected with status {code}") });
                        report.failed += 1;
                        break;
                    }
                    Err(DeliveryError::Transient(e)) => {
                        self.statuses.insert(head.id, DeliveryStatus::Retrying { attempts });
                        if let Some(q) = self.queue.front_mut() {
                            q.attempts = attempts;
                        }
                        if tries >= max_attempts {
                            log::warn!("outbox: {} still failing after {attempts} attempts: {e}", head.mutation.endpoint());
                            break 'queue;
                        }
                        tokio::time::sleep(self.policy.backoff(tries)).await;
                    }
                }
            }
        }
        self.persist();
        report.remaining = self.queue.len();
        report
    }
}
