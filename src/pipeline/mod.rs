//! Routing decision pipeline.
//!
//! # Data Flow
//! ```text
//! RouteRequest (hostname, path, headers)
//!     → context.rs (RequestContext, filled stage by stage)
//!     → orchestrator.rs
//!         domain → maintenance gate → path → backend pool → passer pool
//!     → decision.rs (Forward instruction or Terminal response)
//!     → stats event dispatched on every exit
//! ```

pub mod context;
pub mod decision;
pub mod etag;
pub mod orchestrator;

pub use context::{RequestContext, RouteRequest};
pub use decision::{Decision, ForwardInstruction, TerminalResponse};
pub use etag::EtagRewrite;
pub use orchestrator::Pipeline;
