//! Request pipeline.
//!
//! # Responsibilities
//! - Run the stages strictly in order, one store round trip each
//! - Turn the first failure into its terminal response
//! - Prepare the forwarded request (validator rewrite, backend port)
//! - Emit exactly one stats event per request, whatever the outcome
//!
//! # Design Decisions
//! - Stages share nothing but the store; state flows through the context
//! - No retries: a failed stage ends the request
//! - Stats submission runs in the background and never delays the response

use std::sync::Arc;
use std::time::Instant;

use axum::http::header::IF_NONE_MATCH;
use axum::http::HeaderMap;

use crate::config::RouterConfig;
use crate::error::RouteError;
use crate::load_balancer::{Backend, Passer, RotatingSelector};
use crate::observability::metrics;
use crate::pipeline::context::{RequestContext, RouteRequest, X_PLUTO_BACKEND_PORT};
use crate::pipeline::decision::{Decision, ForwardInstruction, TerminalResponse};
use crate::pipeline::etag::strip_cache_version;
use crate::routing::{DomainResolver, MaintenanceGate, PathResolver};
use crate::stats::{StatsEvent, StatsRecorder};
use crate::store::{keys, RuleStore};

/// Next hop chosen for a request.
struct Target {
    machine: String,
    port: u16,
}

pub struct Pipeline {
    domains: DomainResolver,
    gate: MaintenanceGate,
    paths: PathResolver,
    backends: RotatingSelector<Backend>,
    passers: RotatingSelector<Passer>,
    stats: Arc<StatsRecorder>,
    router: String,
}

impl Pipeline {
    pub fn new(store: Arc<dyn RuleStore>, config: &RouterConfig) -> Self {
        let lookup = config.store.lookup_timeout();
        let wait = config.store.selection_timeout();

        Self {
            domains: DomainResolver::new(store.clone(), lookup),
            gate: MaintenanceGate::new(store.clone(), lookup),
            paths: PathResolver::new(store.clone(), lookup),
            backends: RotatingSelector::new(store.clone(), wait, lookup),
            passers: RotatingSelector::new(store.clone(), wait, lookup),
            stats: Arc::new(StatsRecorder::new(
                store,
                config.listener.port,
                config.stats.clone(),
            )),
            router: config.listener.identity(),
        }
    }

    /// Route a request and submit its stats event in the background.
    pub async fn route(&self, request: RouteRequest) -> Decision {
        let (decision, event) = self.decide(request).await;
        self.stats.dispatch(event);
        decision
    }

    /// Route a request, returning the decision with the stats event it produced.
    pub async fn decide(&self, request: RouteRequest) -> (Decision, StatsEvent) {
        let start = Instant::now();
        let mut ctx = RequestContext::new(request, self.router.clone());

        let result = self.run(&mut ctx).await;
        let event = StatsEvent::from_context(&ctx);

        let decision = match result {
            Ok(target) => {
                tracing::debug!(
                    hostname = %ctx.request.hostname,
                    path = %ctx.request.path,
                    machine = %target.machine,
                    port = target.port,
                    "Forwarding request"
                );
                Decision::Forward(ForwardInstruction {
                    machine: target.machine,
                    port: target.port,
                    request_headers: std::mem::take(&mut ctx.request_headers),
                    response_headers: std::mem::take(&mut ctx.response_headers),
                    etag_rewrite: ctx.etag_rewrite.take(),
                })
            }
            Err(err) => {
                log_failure(&ctx, &err);
                Decision::Respond(TerminalResponse {
                    terminal: err.terminal(),
                    headers: std::mem::take(&mut ctx.response_headers),
                })
            }
        };

        metrics::record_decision(decision.outcome(), start);
        (decision, event)
    }

    async fn run(&self, ctx: &mut RequestContext) -> Result<Target, RouteError> {
        self.domains.resolve(ctx).await?;
        let flags = self.gate.check(ctx).await?;
        self.paths.resolve(ctx).await?;

        let application = ctx.application.clone().unwrap_or_default();
        let process = ctx.process.clone().unwrap_or_default();

        let backend = self
            .backends
            .select(&keys::backends(&application, &process))
            .await?
            .member;
        ctx.machine = Some(backend.machine.clone());
        ctx.backend_port = Some(backend.port.clone());
        ctx.instance = backend.instance.clone();

        let passer = self
            .passers
            .select(&keys::passers(&backend.machine))
            .await?
            .member;
        ctx.passer = Some(format!("{}:{}", backend.machine, passer.port));

        if let Some(validator) = untagged_validators(&ctx.request.headers, &flags.cache_version) {
            ctx.set_request_header(IF_NONE_MATCH, &validator);
        }
        ctx.set_request_header(X_PLUTO_BACKEND_PORT, &backend.port);

        Ok(Target {
            machine: backend.machine,
            port: passer.port,
        })
    }
}

/// Every `If-None-Match` line, merged into one list with the current cache
/// version's suffix removed.
///
/// `None` when the client sent no validator, or one that is not visible
/// ASCII, in which case the inbound lines are forwarded unchanged.
fn untagged_validators(headers: &HeaderMap, cache_version: &str) -> Option<String> {
    let lines = headers
        .get_all(IF_NONE_MATCH)
        .iter()
        .map(|v| v.to_str().ok())
        .collect::<Option<Vec<_>>>()?;
    if lines.is_empty() {
        return None;
    }
    Some(strip_cache_version(&lines.join(", "), cache_version))
}

fn log_failure(ctx: &RequestContext, err: &RouteError) {
    let hostname = &ctx.request.hostname;
    let path = &ctx.request.path;
    match err {
        RouteError::Store { .. } | RouteError::MalformedEntry { .. } => {
            tracing::error!(hostname = %hostname, path = %path, error = %err, "Routing failed");
        }
        RouteError::PoolExhausted { .. } => {
            tracing::warn!(hostname = %hostname, path = %path, error = %err, "No capacity for request");
        }
        _ => {
            tracing::debug!(hostname = %hostname, path = %path, reason = %err, "Request not routed");
        }
    }
}
