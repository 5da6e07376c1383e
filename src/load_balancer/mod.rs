//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! Path resolved → (application, process) identified
//!     → rotating.rs (rotate alice.http|backends:<app>:<process>)
//!     → backend.rs (decode Backend: machine, port, instance)
//!     → rotating.rs (rotate alice.http|passers:<machine>)
//!     → backend.rs (decode Passer: port)
//!     → Return (machine, passer port) or error
//! ```
//!
//! # Design Decisions
//! - Load balancer holds no state; the pool order lives in the shared store
//! - One selection algorithm, instantiated per pool kind
//! - Pool membership is managed elsewhere; removed members stop being picked
//! - An empty pool is waited on briefly, then reported as exhausted (503)

pub mod backend;
pub mod rotating;

pub use backend::{Backend, Passer};
pub use rotating::{PoolMember, RotatingSelector, Selected};
