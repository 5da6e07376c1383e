//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the router.
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the router.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RouterConfig {
    /// Listener configuration (identity and bind address).
    pub listener: ListenerConfig,

    /// Rule store connection and timeouts.
    pub store: StoreConfig,

    /// Usage stats submission.
    pub stats: StatsConfig,

    /// Registration with the control plane.
    pub heartbeat: HeartbeatConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Hostname this router announces and reports in stats.
    pub host: String,

    /// Port to listen on.
    pub port: u16,

    /// Interface to bind (e.g., "0.0.0.0").
    pub bind_address: String,
}

impl ListenerConfig {
    /// `host:port` identity of this router.
    pub fn identity(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn socket_address(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5200,
            bind_address: "0.0.0.0".to_string(),
        }
    }
}

/// Rule store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StoreConfig {
    /// `redis://...` for a shared Redis, `memory://` for an in-process store.
    pub url: String,

    /// How long a selection waits on an empty pool, in seconds.
    pub selection_timeout_secs: u64,

    /// Upper bound on one rule lookup, in milliseconds.
    pub lookup_timeout_ms: u64,

    /// Dedicated connections allowed to block on empty pools at once.
    pub max_blocking_connections: usize,
}

impl StoreConfig {
    pub fn selection_timeout(&self) -> Duration {
        Duration::from_secs(self.selection_timeout_secs)
    }

    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_millis(self.lookup_timeout_ms)
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_string(),
            selection_timeout_secs: 5,
            lookup_timeout_ms: 2000,
            max_blocking_connections: 16,
        }
    }
}

/// Stats submission configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StatsConfig {
    /// Record a usage event per request.
    pub enabled: bool,

    /// List the correlation ids are pushed onto.
    pub queue_key: String,

    /// Prefix of the per-event payload key.
    pub event_key_prefix: String,

    /// Payload expiry in seconds.
    pub ttl_secs: u64,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            queue_key: "fnordmetric-queue".to_string(),
            event_key_prefix: "fnordmetric-event-".to_string(),
            ttl_secs: 60,
        }
    }
}

/// Control plane registration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HeartbeatConfig {
    /// Announce this router periodically.
    pub enabled: bool,

    /// Control plane host.
    pub alice_host: String,

    /// Control plane port.
    pub alice_port: u16,

    /// Delay before the first announcement, in seconds.
    pub initial_delay_secs: u64,

    /// Interval between announcements, in seconds.
    pub interval_secs: u64,
}

impl HeartbeatConfig {
    pub fn register_url(&self) -> String {
        format!(
            "http://{}:{}/api_v1/register.json",
            self.alice_host, self.alice_port
        )
    }
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            alice_host: "localhost".to_string(),
            alice_port: 5000,
            initial_delay_secs: 30,
            interval_secs: 600,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for routing and forwarding) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
