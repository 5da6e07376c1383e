//! In-process rule store.
//!
//! Mirrors the Redis semantics the router depends on: hashes, rotating lists
//! with a blocking wait, and expiring stats records written as one batch.
//! Used by the test suite and by local runs with `store.url = "memory://"`.
//!
//! Nothing consumes the stats queues here, so every write prunes expired
//! records together with the queue entries pointing at them.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use tokio::sync::Notify;
use tokio::time::Instant;

use super::{RuleStore, StoreError};

#[derive(Debug, Default)]
struct StatsState {
    /// `(id, record_key)` per queue entry, most recent first.
    queues: HashMap<String, VecDeque<(String, String)>>,
    records: HashMap<String, (String, Instant)>,
}

impl StatsState {
    fn prune(&mut self, now: Instant) {
        self.records.retain(|_, (_, expires_at)| now < *expires_at);
        let records = &self.records;
        for queue in self.queues.values_mut() {
            queue.retain(|(_, record_key)| records.contains_key(record_key));
        }
        self.queues.retain(|_, queue| !queue.is_empty());
    }
}

/// Rule store held entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    hashes: DashMap<String, HashMap<String, String>>,
    lists: DashMap<String, VecDeque<String>>,
    pushed: Notify,
    stats: Mutex<StatsState>,
    unavailable: AtomicBool,
    failing: DashSet<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set one field of a hash (HSET).
    pub fn set_field(&self, key: &str, field: &str, value: impl Into<String>) {
        self.hashes
            .entry(key.to_string())
            .or_default()
            .insert(field.to_string(), value.into());
    }

    /// Push a value onto the head of a list (LPUSH) and wake blocked rotations.
    pub fn push(&self, key: &str, value: impl Into<String>) {
        self.lists
            .entry(key.to_string())
            .or_default()
            .push_front(value.into());
        self.pushed.notify_waiters();
    }

    /// Remove every occurrence of `value` from a list (LREM 0).
    pub fn remove(&self, key: &str, value: &str) {
        if let Some(mut list) = self.lists.get_mut(key) {
            list.retain(|v| v != value);
        }
    }

    /// Snapshot of a list, head first.
    pub fn list(&self, key: &str) -> Vec<String> {
        self.lists
            .get(key)
            .map(|l| l.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Make every subsequent call fail, or recover.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Ids queued on a stats queue, most recent first.
    pub fn queued(&self, queue: &str) -> Vec<String> {
        let stats = self.stats.lock().unwrap_or_else(|e| e.into_inner());
        stats
            .queues
            .get(queue)
            .map(|q| q.iter().map(|(id, _)| id.clone()).collect())
            .unwrap_or_default()
    }

    /// Payload stored under `key`, unless it has expired.
    pub fn record(&self, key: &str) -> Option<String> {
        let stats = self.stats.lock().unwrap_or_else(|e| e.into_inner());
        stats
            .records
            .get(key)
            .filter(|(_, expires_at)| Instant::now() < *expires_at)
            .map(|(payload, _)| payload.clone())
    }

    /// Make every subsequent call touching `key` fail.
    pub fn fail_key(&self, key: &str) {
        self.failing.insert(key.to_string());
    }

    fn check_available(&self, key: &str) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store marked unavailable".into()));
        }
        if self.failing.contains(key) {
            return Err(StoreError::Unavailable(format!("{} marked failing", key)));
        }
        Ok(())
    }

    fn try_rotate(&self, key: &str) -> Option<String> {
        let mut list = self.lists.get_mut(key)?;
        let value = list.pop_back()?;
        list.push_front(value.clone());
        Some(value)
    }
}

#[async_trait]
impl RuleStore for MemoryStore {
    async fn hash_get_many(
        &self,
        key: &str,
        fields: &[String],
    ) -> Result<Vec<Option<String>>, StoreError> {
        self.check_available(key)?;
        let hash = self.hashes.get(key);
        Ok(fields
            .iter()
            .map(|f| hash.as_ref().and_then(|h| h.get(f).cloned()))
            .collect())
    }

    async fn rotate(&self, key: &str, timeout: Duration) -> Result<Option<String>, StoreError> {
        self.check_available(key)?;
        let deadline = Instant::now() + timeout;

        loop {
            // Register interest before checking so a push in between is not lost.
            let notified = self.pushed.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if let Some(value) = self.try_rotate(key) {
                return Ok(Some(value));
            }

            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return Ok(None);
            }
        }
    }

    async fn submit_stats(
        &self,
        queue: &str,
        id: &str,
        record_key: &str,
        payload: &str,
        ttl: Duration,
    ) -> Result<(), StoreError> {
        self.check_available(queue)?;
        self.check_available(record_key)?;
        let now = Instant::now();
        let mut stats = self.stats.lock().unwrap_or_else(|e| e.into_inner());
        stats.prune(now);
        stats
            .queues
            .entry(queue.to_string())
            .or_default()
            .push_front((id.to_string(), record_key.to_string()));
        stats
            .records
            .insert(record_key.to_string(), (payload.to_string(), now + ttl));
        Ok(())
    }
}
