//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Pipeline stage:
//!     → timeouts.rs (deadline on the store round trip)
//!     → On expiry: StoreError::Timeout → 500 for the request
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every store call has a deadline
//! - No retries: a failed request is answered, the next one starts fresh

pub mod timeouts;
