//! Rule store subsystem.
//!
//! # Data Flow
//! ```text
//! Pipeline stage
//!     → keys.rs (build the keyspace name for the lookup)
//!     → RuleStore (one round trip)
//!         - redis.rs  (shared Redis, many routers)
//!         - memory.rs (in-process, tests and local runs)
//!     → raw JSON strings handed back to the routing layer for decoding
//! ```
//!
//! # Design Decisions
//! - The router only reads rules and rotates pools; it never writes them
//! - Rotation (pop tail + push head of the same list) is one atomic store call
//! - Stats submission is a single atomic batch of three commands
//! - Store clients are built once at startup and shared behind `Arc`

pub mod keys;
pub mod memory;
pub mod redis;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

pub use self::memory::MemoryStore;
pub use self::redis::RedisStore;

/// Errors raised by a rule store round trip.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The Redis command or connection failed.
    #[error("redis error: {0}")]
    Redis(#[from] ::redis::RedisError),

    /// The round trip did not complete within the allotted time.
    #[error("store call timed out after {0:?}")]
    Timeout(Duration),

    /// The store refused the call for another reason.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Contract the routing pipeline consumes from the shared key-value store.
#[async_trait]
pub trait RuleStore: Send + Sync + 'static {
    /// Fetch several fields of one hash in a single round trip.
    ///
    /// The result has exactly one entry per requested field, in request
    /// order; missing fields come back as `None`.
    async fn hash_get_many(
        &self,
        key: &str,
        fields: &[String],
    ) -> Result<Vec<Option<String>>, StoreError>;

    /// Atomically pop the tail of the list `key` and push it back onto its
    /// head, returning the moved value.
    ///
    /// Waits up to `timeout` for the list to become non-empty and returns
    /// `Ok(None)` if it stays empty.
    async fn rotate(&self, key: &str, timeout: Duration) -> Result<Option<String>, StoreError>;

    /// Enqueue `id` on `queue`, store `payload` under `record_key` and
    /// expire it after `ttl`, all as one atomic batch.
    async fn submit_stats(
        &self,
        queue: &str,
        id: &str,
        record_key: &str,
        payload: &str,
        ttl: Duration,
    ) -> Result<(), StoreError>;
}
