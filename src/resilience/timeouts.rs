//! Timeout enforcement for store round trips.
//!
//! # Responsibilities
//! - Bound every lookup stage so a hung store call fails the request
//! - Bound selection stages beyond the store-side blocking wait
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - A timeout is reported as a store error, so it maps to 500

use std::future::Future;
use std::time::Duration;

use crate::store::StoreError;

/// Run `fut`, failing with `StoreError::Timeout` if it exceeds `limit`.
pub async fn bounded<T, F>(limit: Duration, fut: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::Timeout(limit)),
    }
}
