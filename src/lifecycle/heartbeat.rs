//! Registration with the control plane.
//!
//! # Responsibilities
//! - Announce this router (`{type: "router", machine, port}`) periodically
//! - Remember the router id the control plane hands back
//!
//! # Design Decisions
//! - First announcement is delayed so the router is serving before it is listed
//! - Failures are logged and counted; the next tick simply tries again

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::broadcast;

use crate::config::{HeartbeatConfig, ListenerConfig};
use crate::observability::metrics;

const ROUTER_ID_HEADER: &str = "x-alice-router-id";
const PING_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Announcement {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub machine: String,
    pub port: u16,
}

pub struct Heartbeat {
    client: reqwest::Client,
    url: String,
    config: HeartbeatConfig,
    announcement: Announcement,
    /// Zero until the control plane assigns one.
    router_id: AtomicU64,
}

impl Heartbeat {
    pub fn new(config: HeartbeatConfig, listener: &ListenerConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(PING_TIMEOUT).build()?;
        Ok(Self {
            client,
            url: config.register_url(),
            config,
            announcement: Announcement {
                kind: "router",
                machine: listener.host.clone(),
                port: listener.port,
            },
            router_id: AtomicU64::new(0),
        })
    }

    /// Router id assigned by the control plane, once known.
    pub fn router_id(&self) -> Option<u64> {
        match self.router_id.load(Ordering::Relaxed) {
            0 => None,
            id => Some(id),
        }
    }

    /// Send one announcement.
    pub async fn ping(&self) -> Result<(), reqwest::Error> {
        let response = self
            .client
            .post(&self.url)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&[&self.announcement])
            .send()
            .await?;

        let assigned = response
            .headers()
            .get(ROUTER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok());
        if let Some(id) = assigned {
            self.router_id.store(id, Ordering::Relaxed);
        }

        tracing::debug!(url = %self.url, status = %response.status(), router_id = ?assigned, "Heartbeat sent");
        Ok(())
    }

    /// Announce on schedule until `shutdown` fires.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        if !self.config.enabled {
            tracing::info!("Heartbeat disabled");
            return;
        }

        tracing::info!(
            url = %self.url,
            initial_delay = self.config.initial_delay_secs,
            interval = self.config.interval_secs,
            "Heartbeat starting"
        );

        let start = tokio::time::Instant::now() + Duration::from_secs(self.config.initial_delay_secs);
        let mut ticker = tokio::time::interval_at(start, Duration::from_secs(self.config.interval_secs));

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let result = self.ping().await;
                    metrics::record_heartbeat(result.is_ok());
                    if let Err(e) = result {
                        tracing::warn!(url = %self.url, error = %e, "Failed to ping control plane");
                    }
                }
                _ = shutdown.recv() => {
                    tracing::info!("Heartbeat received shutdown signal, exiting loop");
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_announcement_shape() {
        let announcement = Announcement {
            kind: "router",
            machine: "r1.internal".into(),
            port: 5200,
        };
        assert_eq!(
            serde_json::to_value([&announcement]).unwrap(),
            serde_json::json!([{"type": "router", "machine": "r1.internal", "port": 5200}])
        );
    }

    #[test]
    fn test_router_id_unknown_initially() {
        let hb = Heartbeat::new(HeartbeatConfig::default(), &ListenerConfig::default()).unwrap();
        assert_eq!(hb.router_id(), None);
        assert_eq!(hb.url, "http://localhost:5000/api_v1/register.json");
    }
}
