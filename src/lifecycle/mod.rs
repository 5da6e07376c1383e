//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Parse args → Load config → Validate → Logging/metrics → Store → Listener
//!
//! Background (heartbeat.rs):
//!     Periodic registration with the control plane
//!
//! Shutdown (shutdown.rs, signals.rs):
//!     SIGTERM/SIGINT → broadcast → heartbeat exits, server drains → Exit
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then store, then listeners
//! - Long-lived clients are built once here and passed down explicitly

pub mod heartbeat;
pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
