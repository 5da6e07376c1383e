//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, ports valid)
//! - Validate addresses and store URLs
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RouterConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::RouterConfig;

const STORE_SCHEMES: [&str; 4] = ["redis://", "rediss://", "redis+unix://", "memory://"];
const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field} must not be empty")]
    Empty { field: &'static str },

    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("store.url {0:?} has an unsupported scheme")]
    StoreScheme(String),

    #[error("observability.metrics_address {0:?} is not a socket address")]
    MetricsAddress(String),

    #[error("observability.log_level {0:?} is not a known level")]
    LogLevel(String),
}

pub fn validate_config(config: &RouterConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.host.trim().is_empty() {
        errors.push(ValidationError::Empty { field: "listener.host" });
    }
    if config.listener.port == 0 {
        errors.push(ValidationError::Zero { field: "listener.port" });
    }
    if config.listener.bind_address.trim().is_empty() {
        errors.push(ValidationError::Empty { field: "listener.bind_address" });
    }

    if !STORE_SCHEMES.iter().any(|s| config.store.url.starts_with(s)) {
        errors.push(ValidationError::StoreScheme(config.store.url.clone()));
    }
    // Zero would make the store block forever on an empty pool.
    if config.store.selection_timeout_secs == 0 {
        errors.push(ValidationError::Zero { field: "store.selection_timeout_secs" });
    }
    if config.store.lookup_timeout_ms == 0 {
        errors.push(ValidationError::Zero { field: "store.lookup_timeout_ms" });
    }
    if config.store.max_blocking_connections == 0 {
        errors.push(ValidationError::Zero { field: "store.max_blocking_connections" });
    }

    if config.stats.enabled {
        if config.stats.queue_key.is_empty() {
            errors.push(ValidationError::Empty { field: "stats.queue_key" });
        }
        if config.stats.ttl_secs == 0 {
            errors.push(ValidationError::Zero { field: "stats.ttl_secs" });
        }
    }

    if config.heartbeat.enabled {
        if config.heartbeat.alice_host.trim().is_empty() {
            errors.push(ValidationError::Empty { field: "heartbeat.alice_host" });
        }
        if config.heartbeat.alice_port == 0 {
            errors.push(ValidationError::Zero { field: "heartbeat.alice_port" });
        }
        if config.heartbeat.interval_secs == 0 {
            errors.push(ValidationError::Zero { field: "heartbeat.interval_secs" });
        }
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::Zero { field: "timeouts.request_secs" });
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }
    if !LOG_LEVELS.contains(&config.observability.log_level.as_str()) {
        errors.push(ValidationError::LogLevel(config.observability.log_level.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
