//! Domain resolution: hostname → application.

use std::sync::Arc;
use std::time::Duration;

use axum::http::header::CACHE_CONTROL;

use crate::error::{RouteError, Stage};
use crate::pipeline::context::{RequestContext, X_ALICE_APPLICATION};
use crate::routing::matcher::{domain_candidates, lookup_rule};
use crate::routing::rule::Action;
use crate::store::{keys, RuleStore};

pub struct DomainResolver {
    store: Arc<dyn RuleStore>,
    lookup_timeout: Duration,
}

impl DomainResolver {
    pub fn new(store: Arc<dyn RuleStore>, lookup_timeout: Duration) -> Self {
        Self { store, lookup_timeout }
    }

    /// Resolve the application for `ctx.request.hostname`.
    pub async fn resolve(&self, ctx: &mut RequestContext) -> Result<(), RouteError> {
        let hostname = ctx.request.hostname.clone();
        let candidates = domain_candidates(&hostname);

        let (pattern, rule) = lookup_rule(
            self.store.as_ref(),
            keys::DOMAINS,
            &candidates,
            self.lookup_timeout,
            Stage::Domain,
            &hostname,
        )
        .await?;

        for action in &rule.actions {
            match action {
                Action::Forward(application) => {
                    ctx.application = Some(application.clone());
                    ctx.set_response_header(X_ALICE_APPLICATION, application);
                }
                Action::CacheControl(value) => ctx.set_response_header(CACHE_CONTROL, value),
                Action::Other(name) => {
                    tracing::trace!(action = %name, pattern = %pattern, "Ignoring unknown domain action");
                }
            }
        }

        match &ctx.application {
            Some(application) => {
                tracing::debug!(hostname = %hostname, pattern = %pattern, application = %application, "Domain resolved");
                Ok(())
            }
            None => Err(RouteError::NoForwardAction {
                stage: Stage::Domain,
                subject: pattern,
            }),
        }
    }
}
