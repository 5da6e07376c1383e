//! Per-request routing state.

use axum::http::{HeaderMap, HeaderName, HeaderValue};

use crate::pipeline::etag::EtagRewrite;

pub const X_ALICE_APPLICATION: HeaderName = HeaderName::from_static("x-alice-application");
pub const X_ALICE_PROCESS: HeaderName = HeaderName::from_static("x-alice-process");
pub const X_ALICE_CACHE_VERSION: HeaderName = HeaderName::from_static("x-alice-cache-version");
pub const X_ALICE_STATUS: HeaderName = HeaderName::from_static("x-alice-status");
pub const X_PLUTO_BACKEND_PORT: HeaderName = HeaderName::from_static("x-pluto-backend-port");

/// What the transport hands the pipeline about an inbound request.
#[derive(Debug, Clone, Default)]
pub struct RouteRequest {
    /// Hostname without port.
    pub hostname: String,
    /// Path without query string.
    pub path: String,
    pub headers: HeaderMap,
}

impl RouteRequest {
    pub fn new(hostname: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            path: path.into(),
            headers: HeaderMap::new(),
        }
    }
}

/// State accumulated by the pipeline stages for one request.
///
/// Each stage only fills in the fields it resolves; whatever is populated
/// when the pipeline exits goes into the stats event.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub request: RouteRequest,
    /// `host:port` of this router.
    pub router: String,

    pub application: Option<String>,
    pub process: Option<String>,
    pub machine: Option<String>,
    pub backend_port: Option<String>,
    pub instance: Option<String>,
    pub passer: Option<String>,

    /// Headers set on the response returned to the client.
    pub response_headers: HeaderMap,
    /// Headers overridden on the request forwarded to the passer.
    pub request_headers: HeaderMap,
    pub etag_rewrite: Option<EtagRewrite>,
}

impl RequestContext {
    pub fn new(request: RouteRequest, router: impl Into<String>) -> Self {
        Self {
            request,
            router: router.into(),
            ..Self::default()
        }
    }

    pub fn set_response_header(&mut self, name: HeaderName, value: &str) {
        set_header(&mut self.response_headers, name, value);
    }

    pub fn set_request_header(&mut self, name: HeaderName, value: &str) {
        set_header(&mut self.request_headers, name, value);
    }
}

fn set_header(headers: &mut HeaderMap, name: HeaderName, value: &str) {
    match HeaderValue::from_str(value) {
        Ok(v) => {
            headers.insert(name, v);
        }
        Err(_) => {
            tracing::warn!(header = %name, value = %value, "Dropping header with invalid value");
        }
    }
}
