//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (host, path)
//!     → domain.rs (hostname candidates → alice.http|domains → application)
//!     → maintenance.rs (alice.http|applications:<app> → cache version, gate)
//!     → path.rs (path candidates → alice.http|paths:<app> → process)
//!     → Return: resolved context or RouteError
//!
//! Every lookup:
//!     candidates (matcher.rs, most specific first)
//!     → one HMGET round trip
//!     → first non-empty value → rule.rs (decode actions)
//! ```
//!
//! # Design Decisions
//! - Rules live in the shared store and are read per request, never cached
//! - No regex in hot path (wildcard suffixes and path prefixes only)
//! - Deterministic: same store contents always resolve the same way
//! - First match wins (ordered by specificity)

pub mod domain;
pub mod maintenance;
pub mod matcher;
pub mod path;
pub mod rule;

pub use domain::DomainResolver;
pub use maintenance::{FlagSet, MaintenanceGate};
pub use path::PathResolver;
pub use rule::{Action, Rule};
