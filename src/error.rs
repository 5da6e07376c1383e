//! Routing failures and the terminal responses they map to.

use std::fmt;

use axum::http::StatusCode;
use thiserror::Error;

use crate::store::StoreError;

/// Pipeline stage that produced an error, for logs and metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Domain,
    Flags,
    Path,
    Backend,
    Passer,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Domain => "domain",
            Stage::Flags => "flags",
            Stage::Path => "path",
            Stage::Backend => "backend",
            Stage::Passer => "passer",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a request stopped short of being forwarded.
#[derive(Error, Debug)]
pub enum RouteError {
    #[error("store call failed during {stage} stage: {source}")]
    Store {
        stage: Stage,
        #[source]
        source: StoreError,
    },

    #[error("no {stage} rule matches {subject}")]
    RuleNotFound { stage: Stage, subject: String },

    #[error("{stage} rule for {subject} has no forward action")]
    NoForwardAction { stage: Stage, subject: String },

    #[error("malformed entry under {key}: {reason}")]
    MalformedEntry { key: String, reason: String },

    #[error("no member available in pool {pool}")]
    PoolExhausted { stage: Stage, pool: String },

    #[error("application {0} is suspended")]
    Suspended(String),

    #[error("application {0} is in maintenance")]
    Maintenance(String),
}

impl RouteError {
    pub fn store(stage: Stage) -> impl FnOnce(StoreError) -> RouteError {
        move |source| RouteError::Store { stage, source }
    }

    /// Terminal response this failure is answered with.
    pub fn terminal(&self) -> Terminal {
        match self {
            RouteError::Store { .. } | RouteError::MalformedEntry { .. } => Terminal::InternalError,
            RouteError::RuleNotFound { .. } | RouteError::NoForwardAction { .. } => Terminal::NotFound,
            RouteError::PoolExhausted { .. } => Terminal::Unavailable,
            RouteError::Suspended(_) => Terminal::Suspended,
            RouteError::Maintenance(_) => Terminal::Maintenance,
        }
    }
}

/// A response that ends the pipeline without forwarding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Terminal {
    NotFound,
    InternalError,
    Unavailable,
    Maintenance,
    Suspended,
}

impl Terminal {
    pub fn status(&self) -> StatusCode {
        match self {
            Terminal::NotFound => StatusCode::NOT_FOUND,
            Terminal::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
            Terminal::Unavailable | Terminal::Maintenance => StatusCode::SERVICE_UNAVAILABLE,
            Terminal::Suspended => StatusCode::FORBIDDEN,
        }
    }

    /// Label used for metrics and the `X-Alice-Status` header.
    pub fn as_str(&self) -> &'static str {
        match self {
            Terminal::NotFound => "not_found",
            Terminal::InternalError => "error",
            Terminal::Unavailable => "unavailable",
            Terminal::Maintenance => "maintenance",
            Terminal::Suspended => "suspended",
        }
    }
}
