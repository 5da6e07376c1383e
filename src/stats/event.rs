//! Usage event emitted once per request.

use serde::{Deserialize, Serialize};

use crate::pipeline::context::RequestContext;

/// Snapshot of what the pipeline had resolved when the request exited.
///
/// Failures before backend selection legitimately lack machine and instance,
/// so unset fields are left out of the JSON rather than sent empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsEvent {
    #[serde(rename = "_type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub machine: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub router: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub process: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
}

impl StatsEvent {
    pub fn from_context(ctx: &RequestContext) -> Self {
        Self {
            kind: "request".to_string(),
            machine: ctx.machine.clone(),
            router: Some(ctx.router.clone()).filter(|r| !r.is_empty()),
            passer: ctx.passer.clone(),
            application: ctx.application.clone(),
            process: ctx.process.clone(),
            instance: ctx.instance.clone(),
        }
    }
}
