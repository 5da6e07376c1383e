//! Request handling and transformation.
//!
//! # Responsibilities
//! - Extract routing-relevant information (host, path, headers)
//! - Prepare request for forwarding to the chosen passer
//!
//! # Design Decisions
//! - Host header wins over the URI authority; the port is dropped
//! - The query string is forwarded but never used for routing
//! - Inbound headers are forwarded as-is except for pipeline overrides

use axum::body::Body;
use axum::http::uri::{Authority, PathAndQuery};
use axum::http::{header, Request, Uri};

use crate::pipeline::{ForwardInstruction, RouteRequest};

/// Routing view of an inbound request.
pub fn route_request(request: &Request<Body>) -> RouteRequest {
    let hostname = request
        .headers()
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.parse::<Authority>().ok())
        .map(|a| a.host().to_string())
        .or_else(|| request.uri().host().map(str::to_string))
        .unwrap_or_default();

    RouteRequest {
        hostname,
        path: request.uri().path().to_string(),
        headers: request.headers().clone(),
    }
}

/// Rewrite an inbound request so it targets the passer in `forward`.
pub fn upstream_request(
    request: Request<Body>,
    forward: &ForwardInstruction,
) -> Result<Request<Body>, axum::http::Error> {
    let (mut parts, body) = request.into_parts();

    let path_and_query = parts
        .uri
        .path_and_query()
        .cloned()
        .unwrap_or_else(|| PathAndQuery::from_static("/"));
    let authority = format!("{}:{}", forward.machine, forward.port);
    parts.uri = Uri::builder()
        .scheme("http")
        .authority(authority.as_str())
        .path_and_query(path_and_query)
        .build()?;

    for (name, value) in forward.request_headers.iter() {
        parts.headers.insert(name.clone(), value.clone());
    }

    Ok(Request::from_parts(parts, body))
}
