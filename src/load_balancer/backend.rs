//! Backend instances and the passers that relay to them.
//!
//! # Responsibilities
//! - Decode backend pool entries `[rule_id, machine, port, instance]`
//! - Decode passer pool entries `[rule_id, port]`
//!
//! # Design Decisions
//! - Ports and instance ids may be stored as JSON numbers or strings
//! - The backend port is informational; the passer port is the next hop

use serde_json::Value;

use crate::error::Stage;
use crate::load_balancer::rotating::PoolMember;
use crate::routing::rule::scalar_to_string;

/// One instance of an application process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Backend {
    pub machine: String,
    /// Port the instance declared; forwarded to the passer as metadata.
    pub port: String,
    pub instance: Option<String>,
}

impl PoolMember for Backend {
    const STAGE: Stage = Stage::Backend;

    fn decode(fields: &[Value]) -> Result<Self, String> {
        let machine = fields
            .first()
            .and_then(Value::as_str)
            .filter(|m| !m.is_empty())
            .ok_or_else(|| "backend entry has no machine".to_string())?;
        let port = fields
            .get(1)
            .and_then(scalar_to_string)
            .ok_or_else(|| "backend entry has no port".to_string())?;
        let instance = fields.get(2).and_then(scalar_to_string);

        Ok(Self {
            machine: machine.to_string(),
            port,
            instance,
        })
    }
}

/// Local forwarding endpoint on a machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Passer {
    pub port: u16,
}

impl PoolMember for Passer {
    const STAGE: Stage = Stage::Passer;

    fn decode(fields: &[Value]) -> Result<Self, String> {
        let raw = fields
            .first()
            .and_then(scalar_to_string)
            .ok_or_else(|| "passer entry has no port".to_string())?;
        let port = raw
            .trim()
            .parse::<u16>()
            .map_err(|e| format!("invalid passer port {:?}: {}", raw, e))?;
        Ok(Self { port })
    }
}
