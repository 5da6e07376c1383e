//! Redis-backed rule store.
//!
//! # Responsibilities
//! - Hold the long-lived connection shared by every request
//! - HMGET for rule and flag lookups
//! - Rotating selection via RPOPLPUSH / BRPOPLPUSH on a single list
//! - MULTI/EXEC batch for stats events
//!
//! # Design Decisions
//! - Lookups and stats share one multiplexed `ConnectionManager`
//! - A blocking pop would stall every command pipelined behind it on the
//!   shared connection, so BRPOPLPUSH only runs on a dedicated connection,
//!   and only after a non-blocking RPOPLPUSH found the pool empty
//! - Dedicated connections are capped by a semaphore; a waiter that gets no
//!   slot before its deadline makes one last non-blocking attempt

use std::sync::Arc;
use std::time::Duration;

use ::redis::aio::ConnectionManager;
use async_trait::async_trait;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::time::Instant;

use super::{RuleStore, StoreError};

/// Rule store talking to a shared Redis instance.
#[derive(Clone)]
pub struct RedisStore {
    client: ::redis::Client,
    shared: ConnectionManager,
    /// Slots for connections that may block on an empty pool.
    blocking: Arc<Semaphore>,
}

impl RedisStore {
    /// Open a client for `url` and establish the shared connection.
    ///
    /// At most `max_blocking` dedicated connections wait on empty pools at
    /// any time.
    pub async fn connect(url: &str, max_blocking: usize) -> Result<Self, StoreError> {
        let client = ::redis::Client::open(url)?;
        let shared = ConnectionManager::new(client.clone()).await?;

        tracing::info!(url = %url, max_blocking = max_blocking, "Connected to rule store");

        Ok(Self {
            client,
            shared,
            blocking: Arc::new(Semaphore::new(max_blocking)),
        })
    }

    async fn rotate_now(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.shared.clone();
        let moved: Option<String> = ::redis::cmd("RPOPLPUSH")
            .arg(key)
            .arg(key)
            .query_async(&mut conn)
            .await?;
        Ok(moved)
    }
}

/// Wait until `deadline` for a blocking slot.
///
/// Returns the slot with the time left before `deadline`, or `None` when
/// no slot (or no time) remains.
async fn blocking_slot(
    slots: &Arc<Semaphore>,
    deadline: Instant,
) -> Option<(OwnedSemaphorePermit, Duration)> {
    let permit = tokio::time::timeout_at(deadline, slots.clone().acquire_owned())
        .await
        .ok()?
        .ok()?;
    let remaining = deadline.saturating_duration_since(Instant::now());
    // BRPOPLPUSH treats a zero timeout as "block forever".
    if remaining.is_zero() {
        return None;
    }
    Some((permit, remaining))
}

#[async_trait]
impl RuleStore for RedisStore {
    async fn hash_get_many(
        &self,
        key: &str,
        fields: &[String],
    ) -> Result<Vec<Option<String>>, StoreError> {
        if fields.is_empty() {
            return Ok(Vec::new());
        }

        let mut conn = self.shared.clone();
        let values: Vec<Option<String>> = ::redis::cmd("HMGET")
            .arg(key)
            .arg(fields)
            .query_async(&mut conn)
            .await?;
        Ok(values)
    }

    async fn rotate(&self, key: &str, timeout: Duration) -> Result<Option<String>, StoreError> {
        let deadline = Instant::now() + timeout;
        if let Some(moved) = self.rotate_now(key).await? {
            return Ok(Some(moved));
        }

        tracing::debug!(key = %key, timeout = ?timeout, "Pool empty, waiting for a member");

        let Some((_permit, remaining)) = blocking_slot(&self.blocking, deadline).await else {
            tracing::debug!(key = %key, "No blocking slot before deadline");
            return self.rotate_now(key).await;
        };

        let mut dedicated = self.client.get_multiplexed_async_connection().await?;
        let moved: Option<String> = ::redis::cmd("BRPOPLPUSH")
            .arg(key)
            .arg(key)
            .arg(remaining.as_secs_f64())
            .query_async(&mut dedicated)
            .await?;
        Ok(moved)
    }

    async fn submit_stats(
        &self,
        queue: &str,
        id: &str,
        record_key: &str,
        payload: &str,
        ttl: Duration,
    ) -> Result<(), StoreError> {
        let mut conn = self.shared.clone();
        let () = ::redis::pipe()
            .atomic()
            .cmd("LPUSH")
            .arg(queue)
            .arg(id)
            .ignore()
            .cmd("SET")
            .arg(record_key)
            .arg(payload)
            .ignore()
            .cmd("EXPIRE")
            .arg(record_key)
            .arg(ttl.as_secs().max(1))
            .ignore()
            .query_async(&mut conn)
            .await?;
        Ok(())
    }
}
