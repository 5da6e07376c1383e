//! Maintenance gate.
//!
//! # Responsibilities
//! - Read the application's flag set in one round trip
//! - Publish the cache version and attach the ETag rewrite rule
//! - Stop suspended or in-maintenance applications before path resolution
//!
//! # Design Decisions
//! - Suspension is checked before maintenance
//! - A flag is set only by "1" or "true"; anything else, or absence, is unset

use std::sync::Arc;
use std::time::Duration;

use crate::error::{RouteError, Stage};
use crate::pipeline::context::{RequestContext, X_ALICE_CACHE_VERSION};
use crate::pipeline::etag::EtagRewrite;
use crate::resilience::timeouts::bounded;
use crate::store::{keys, RuleStore};

const DEFAULT_CACHE_VERSION: &str = "0";

/// Flags an operator sets on an application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagSet {
    pub cache_version: String,
    pub suspended: bool,
    pub maintenance: bool,
}

impl FlagSet {
    fn fields() -> Vec<String> {
        vec![
            keys::FLAG_CACHE_VERSION.to_string(),
            keys::FLAG_SUSPENDED.to_string(),
            keys::FLAG_MAINTENANCE.to_string(),
        ]
    }

    /// Build from HMGET values in `fields()` order.
    fn from_values(values: &[Option<String>]) -> Self {
        let get = |i: usize| values.get(i).and_then(|v| v.as_deref());
        Self {
            cache_version: get(0)
                .filter(|v| !v.is_empty())
                .unwrap_or(DEFAULT_CACHE_VERSION)
                .to_string(),
            suspended: is_set(get(1)),
            maintenance: is_set(get(2)),
        }
    }
}

fn is_set(value: Option<&str>) -> bool {
    matches!(value, Some("1") | Some("true"))
}

pub struct MaintenanceGate {
    store: Arc<dyn RuleStore>,
    lookup_timeout: Duration,
}

impl MaintenanceGate {
    pub fn new(store: Arc<dyn RuleStore>, lookup_timeout: Duration) -> Self {
        Self { store, lookup_timeout }
    }

    pub async fn check(&self, ctx: &mut RequestContext) -> Result<FlagSet, RouteError> {
        let application = ctx.application.clone().unwrap_or_default();

        let values = bounded(
            self.lookup_timeout,
            self.store
                .hash_get_many(&keys::application_flags(&application), &FlagSet::fields()),
        )
        .await
        .map_err(RouteError::store(Stage::Flags))?;
        let flags = FlagSet::from_values(&values);

        ctx.set_response_header(X_ALICE_CACHE_VERSION, &flags.cache_version);
        ctx.etag_rewrite = Some(EtagRewrite::for_cache_version(&flags.cache_version));

        if flags.suspended {
            return Err(RouteError::Suspended(application));
        }
        if flags.maintenance {
            return Err(RouteError::Maintenance(application));
        }
        Ok(flags)
    }
}
