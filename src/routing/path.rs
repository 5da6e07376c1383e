//! Path resolution: (application, path) → process.

use std::sync::Arc;
use std::time::Duration;

use axum::http::header::CACHE_CONTROL;

use crate::error::{RouteError, Stage};
use crate::pipeline::context::{RequestContext, X_ALICE_PROCESS};
use crate::routing::matcher::{lookup_rule, path_candidates};
use crate::routing::rule::Action;
use crate::store::{keys, RuleStore};

pub struct PathResolver {
    store: Arc<dyn RuleStore>,
    lookup_timeout: Duration,
}

impl PathResolver {
    pub fn new(store: Arc<dyn RuleStore>, lookup_timeout: Duration) -> Self {
        Self { store, lookup_timeout }
    }

    /// Resolve the process for `ctx.request.path` within the resolved application.
    pub async fn resolve(&self, ctx: &mut RequestContext) -> Result<(), RouteError> {
        let application = ctx.application.clone().unwrap_or_default();
        let path = ctx.request.path.clone();
        let candidates = path_candidates(&path);

        let (pattern, rule) = lookup_rule(
            self.store.as_ref(),
            &keys::paths(&application),
            &candidates,
            self.lookup_timeout,
            Stage::Path,
            &path,
        )
        .await?;

        for action in &rule.actions {
            match action {
                Action::Forward(process) => {
                    ctx.process = Some(process.clone());
                    ctx.set_response_header(X_ALICE_PROCESS, process);
                }
                Action::CacheControl(value) => ctx.set_response_header(CACHE_CONTROL, value),
                Action::Other(name) => {
                    tracing::trace!(action = %name, pattern = %pattern, "Ignoring unknown path action");
                }
            }
        }

        match &ctx.process {
            Some(process) => {
                tracing::debug!(application = %application, path = %path, pattern = %pattern, process = %process, "Path resolved");
                Ok(())
            }
            None => Err(RouteError::NoForwardAction {
                stage: Stage::Path,
                subject: pattern,
            }),
        }
    }
}
