//! Stats submission.
//!
//! # Responsibilities
//! - Assign each event a correlation id unique to this router process
//! - Submit queue push, payload write and expiry as one atomic batch
//! - Keep submission off the response path
//!
//! # Design Decisions
//! - Ids combine this router's port with an atomic counter, so co-located
//!   routers sharing one stats queue never collide
//! - Submission failures are logged and counted, never surfaced to clients

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::task::JoinHandle;

use crate::config::StatsConfig;
use crate::observability::metrics;
use crate::stats::event::StatsEvent;
use crate::store::{RuleStore, StoreError};

#[derive(Error, Debug)]
pub enum StatsError {
    #[error("failed to encode stats event: {0}")]
    Encode(#[from] serde_json::Error),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Generator of per-process correlation ids.
#[derive(Debug)]
pub struct CorrelationIds {
    port: u16,
    next: AtomicU64,
}

impl CorrelationIds {
    pub fn new(port: u16) -> Self {
        Self {
            port,
            next: AtomicU64::new(0),
        }
    }

    pub fn next_id(&self) -> String {
        let n = self.next.fetch_add(1, Ordering::Relaxed) + 1;
        format!("alice:req:{}-{}", self.port, n)
    }
}

pub struct StatsRecorder {
    store: Arc<dyn RuleStore>,
    ids: CorrelationIds,
    config: StatsConfig,
}

impl StatsRecorder {
    pub fn new(store: Arc<dyn RuleStore>, router_port: u16, config: StatsConfig) -> Self {
        Self {
            store,
            ids: CorrelationIds::new(router_port),
            config,
        }
    }

    /// Store key holding the payload for correlation id `id`.
    pub fn record_key(&self, id: &str) -> String {
        format!("{}{}", self.config.event_key_prefix, id)
    }

    /// Submit `event` and wait for the store to acknowledge it.
    ///
    /// Returns the correlation id the event was queued under.
    pub async fn record(&self, event: &StatsEvent) -> Result<String, StatsError> {
        let payload = serde_json::to_string(event)?;
        let id = self.ids.next_id();

        self.store
            .submit_stats(
                &self.config.queue_key,
                &id,
                &self.record_key(&id),
                &payload,
                Duration::from_secs(self.config.ttl_secs),
            )
            .await?;

        tracing::trace!(id = %id, "Stats event recorded");
        Ok(id)
    }

    /// Submit `event` in the background.
    ///
    /// Returns `None` when stats are disabled.
    pub fn dispatch(self: &Arc<Self>, event: StatsEvent) -> Option<JoinHandle<()>> {
        if !self.config.enabled {
            return None;
        }

        let recorder = Arc::clone(self);
        Some(tokio::spawn(async move {
            if let Err(e) = recorder.record(&event).await {
                metrics::record_stats_failure();
                tracing::warn!(error = %e, application = ?event.application, "Failed to record stats event");
            }
        }))
    }
}
