//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → command line / environment overrides (lifecycle::startup)
//!     → validation.rs (semantic checks)
//!     → RouterConfig (validated, immutable)
//!     → handed to each subsystem at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults so the router runs with no file at all
//! - Validation separates syntactic (serde) from semantic checks
//! - Routing rules are not configuration; they live in the rule store

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{check_config, load_config, ConfigError};
pub use schema::{
    HeartbeatConfig, ListenerConfig, LogFormat, ObservabilityConfig, RouterConfig, StatsConfig,
    StoreConfig, TimeoutConfig,
};
pub use validation::ValidationError;
