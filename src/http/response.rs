//! Response handling and transformation.
//!
//! # Responsibilities
//! - Render terminal responses (404/500/503, maintenance, suspended)
//! - Decorate passer responses with routing headers
//! - Apply the cache-version ETag rewrite
//!
//! # Design Decisions
//! - Routing headers overwrite whatever the backend sent
//! - Maintenance and suspension are distinguishable by `X-Alice-Status`
//! - Streaming responses avoid buffering entire body

use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::error::Terminal;
use crate::pipeline::context::X_ALICE_STATUS;
use crate::pipeline::{ForwardInstruction, TerminalResponse};

const MAINTENANCE_RETRY_AFTER_SECS: &str = "120";

/// Render a response for a request the pipeline stopped.
pub fn terminal_response(terminal: TerminalResponse) -> Response {
    let body = match terminal.terminal {
        Terminal::NotFound => "No application is configured for this address",
        Terminal::InternalError => "Internal routing error",
        Terminal::Unavailable => "No backend is available to serve this request",
        Terminal::Maintenance => "This application is down for maintenance",
        Terminal::Suspended => "This application has been suspended",
    };

    let mut response = (terminal.terminal.status(), body).into_response();
    apply_headers(response.headers_mut(), &terminal.headers);

    match terminal.terminal {
        Terminal::Maintenance => {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from_static(MAINTENANCE_RETRY_AFTER_SECS));
            response
                .headers_mut()
                .insert(X_ALICE_STATUS, HeaderValue::from_static("maintenance"));
        }
        Terminal::Suspended => {
            response
                .headers_mut()
                .insert(X_ALICE_STATUS, HeaderValue::from_static("suspended"));
        }
        _ => {}
    }
    response
}

/// Response for a passer that could not be reached.
pub fn bad_gateway(forward: &ForwardInstruction) -> Response {
    let mut response = (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response();
    apply_headers(response.headers_mut(), &forward.response_headers);
    response
}

/// Decorate a passer response before it goes back to the client.
pub fn upstream_response(response: Response, forward: &ForwardInstruction) -> Response {
    let (mut parts, body) = response.into_parts();

    if let Some(rule) = &forward.etag_rewrite {
        let rewritten = parts
            .headers
            .get(header::ETAG)
            .and_then(|v| v.to_str().ok())
            .map(|etag| rule.apply(etag))
            .and_then(|etag| HeaderValue::from_str(&etag).ok());
        if let Some(etag) = rewritten {
            parts.headers.insert(header::ETAG, etag);
        }
    }
    apply_headers(&mut parts.headers, &forward.response_headers);

    Response::from_parts(parts, body)
}

fn apply_headers(target: &mut HeaderMap, headers: &HeaderMap) {
    for (name, value) in headers.iter() {
        target.insert(name.clone(), value.clone());
    }
}
