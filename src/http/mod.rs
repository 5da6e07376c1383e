//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (extract hostname, path, headers)
//!     → [pipeline decides passer or terminal response]
//!     → request.rs (retarget request at machine:passer_port)
//!     → response.rs (routing headers, ETag rewrite, terminal pages)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use server::{AppState, HttpServer};
