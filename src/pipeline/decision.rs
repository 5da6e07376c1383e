//! What the pipeline tells the transport to do.

use axum::http::HeaderMap;

use crate::error::Terminal;
use crate::pipeline::etag::EtagRewrite;

/// Forward the request to a passer.
#[derive(Debug, Clone)]
pub struct ForwardInstruction {
    /// Machine running the passer.
    pub machine: String,
    /// Passer port on that machine.
    pub port: u16,
    /// Headers to set on the forwarded request, replacing inbound values.
    pub request_headers: HeaderMap,
    /// Headers to set on the response returned to the client.
    pub response_headers: HeaderMap,
    /// Rewrite for a backend `ETag`, if the backend sends one.
    pub etag_rewrite: Option<EtagRewrite>,
}

/// End the request without forwarding.
#[derive(Debug, Clone)]
pub struct TerminalResponse {
    pub terminal: Terminal,
    /// Response headers accumulated before the pipeline stopped.
    pub headers: HeaderMap,
}

#[derive(Debug, Clone)]
pub enum Decision {
    Forward(ForwardInstruction),
    Respond(TerminalResponse),
}

impl Decision {
    /// Metrics label for this outcome.
    pub fn outcome(&self) -> &'static str {
        match self {
            Decision::Forward(_) => "forward",
            Decision::Respond(r) => r.terminal.as_str(),
        }
    }
}
