//! Usage stats subsystem.
//!
//! # Data Flow
//! ```text
//! Pipeline exit (any outcome)
//!     → event.rs (StatsEvent from the request context)
//!     → recorder.rs (correlation id, JSON payload)
//!     → store: LPUSH queue id / SET record payload / EXPIRE record ttl
//!     → consumed by the metrics aggregator
//! ```

pub mod event;
pub mod recorder;

pub use event::StatsEvent;
pub use recorder::{CorrelationIds, StatsError, StatsRecorder};
