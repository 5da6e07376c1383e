//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the routing handler
//! - Wire up middleware (tracing, request timeout)
//! - Bind server to listener
//! - Dispatch requests to the routing pipeline
//! - Forward routed requests to the chosen passer

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::Response,
    routing::any,
    Router,
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::RouterConfig;
use crate::http::request::{route_request, upstream_request};
use crate::http::response::{bad_gateway, terminal_response, upstream_response};
use crate::pipeline::{Decision, Pipeline};
use crate::store::RuleStore;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    pub client: Client<HttpConnector, Body>,
}

/// HTTP front of the router.
pub struct HttpServer {
    router: Router,
    config: RouterConfig,
}

impl HttpServer {
    /// Create a new HTTP server routing through `store`.
    pub fn new(config: RouterConfig, store: Arc<dyn RuleStore>) -> Self {
        let pipeline = Arc::new(Pipeline::new(store, &config));

        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());

        let state = AppState { pipeline, client };

        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &RouterConfig, state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(route_handler))
            .route("/", any(route_handler))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(TraceLayer::new_for_http())
                    .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs))),
            )
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            router = %self.config.listener.identity(),
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("HTTP server draining");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Route the request and forward it, or answer it directly.
async fn route_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let decision = state.pipeline.route(route_request(&request)).await;

    let forward = match decision {
        Decision::Forward(forward) => forward,
        Decision::Respond(terminal) => return terminal_response(terminal),
    };

    let upstream = match upstream_request(request, &forward) {
        Ok(req) => req,
        Err(e) => {
            tracing::error!(machine = %forward.machine, port = forward.port, error = %e, "Cannot build upstream request");
            return bad_gateway(&forward);
        }
    };

    match state.client.request(upstream).await {
        Ok(response) => {
            let (parts, body) = response.into_parts();
            upstream_response(Response::from_parts(parts, Body::new(body)), &forward)
        }
        Err(e) => {
            tracing::error!(machine = %forward.machine, port = forward.port, error = %e, "Upstream error");
            bad_gateway(&forward)
        }
    }
}
