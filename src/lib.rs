//! HTTP router for the alice application fleet.
//!
//! Resolves each request to an application, a process, a backend instance
//! and the passer on that backend's machine, using rules held in a shared
//! store, then forwards it and records a usage event.

pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod load_balancer;
pub mod observability;
pub mod pipeline;
pub mod resilience;
pub mod routing;
pub mod stats;
pub mod store;

pub use config::RouterConfig;
pub use error::{RouteError, Terminal};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use pipeline::{Decision, Pipeline, RouteRequest};
pub use store::{MemoryStore, RedisStore, RuleStore};
