//! Routing pipeline behaviour against an in-memory rule store.

use std::sync::Arc;

use alice_router::error::Terminal;
use alice_router::pipeline::{Decision, ForwardInstruction, Pipeline, RouteRequest, TerminalResponse};
use alice_router::stats::StatsEvent;
use alice_router::store::{keys, MemoryStore};
use axum::http::HeaderValue;

mod common;

fn pipeline(store: &Arc<MemoryStore>) -> Pipeline {
    Pipeline::new(store.clone(), &common::test_config())
}

fn forwarded(decision: Decision) -> ForwardInstruction {
    match decision {
        Decision::Forward(f) => f,
        Decision::Respond(r) => panic!("expected forward, got {:?}", r.terminal),
    }
}

fn terminated(decision: Decision) -> TerminalResponse {
    match decision {
        Decision::Respond(r) => r,
        Decision::Forward(f) => panic!("expected terminal, forwarded to {}:{}", f.machine, f.port),
    }
}

#[tokio::test]
async fn test_routes_wildcard_domain_and_path_prefix() {
    let store = common::scenario_store();
    let (decision, event) = pipeline(&store)
        .decide(RouteRequest::new("app.example.com", "/v1/x"))
        .await;

    let forward = forwarded(decision);
    assert_eq!(forward.machine, "m1");
    assert_eq!(forward.port, 9000);
    assert_eq!(forward.response_headers["x-alice-application"], "app1");
    assert_eq!(forward.response_headers["x-alice-process"], "web");
    assert_eq!(forward.response_headers["x-alice-cache-version"], "0");
    assert_eq!(forward.request_headers["x-pluto-backend-port"], "8080");

    assert_eq!(
        event,
        StatsEvent {
            kind: "request".into(),
            machine: Some("m1".into()),
            router: Some("router-test:5200".into()),
            passer: Some("m1:9000".into()),
            application: Some("app1".into()),
            process: Some("web".into()),
            instance: Some("i1".into()),
        }
    );
}

#[tokio::test]
async fn test_suspended_application_stops_before_path() {
    let store = common::scenario_store();
    store.set_field(&keys::application_flags("app1"), "suspended", "1");
    store.set_field(&keys::application_flags("app1"), "maintenance", "1");

    let (decision, event) = pipeline(&store)
        .decide(RouteRequest::new("app.example.com", "/v1/x"))
        .await;

    let response = terminated(decision);
    assert_eq!(response.terminal, Terminal::Suspended);
    assert_eq!(response.headers["x-alice-application"], "app1");
    assert_eq!(event.application.as_deref(), Some("app1"));
    assert_eq!(event.process, None);
    assert_eq!(event.machine, None);
    // Rotation never happened.
    assert_eq!(store.list(&keys::backends("app1", "web")).len(), 1);
}

#[tokio::test]
async fn test_maintenance_application() {
    let store = common::scenario_store();
    store.set_field(&keys::application_flags("app1"), "maintenance", "true");
    store.set_field(&keys::application_flags("app1"), "cache_version", "9");

    let (decision, _) = pipeline(&store)
        .decide(RouteRequest::new("app.example.com", "/v1/x"))
        .await;

    let response = terminated(decision);
    assert_eq!(response.terminal, Terminal::Maintenance);
    assert_eq!(response.headers["x-alice-cache-version"], "9");
}

#[tokio::test(start_paused = true)]
async fn test_empty_backend_pool_is_unavailable() {
    let store = common::scenario_store();
    store.remove(&keys::backends("app1", "web"), r#"["b1", "m1", 8080, "i1"]"#);

    let (decision, event) = pipeline(&store)
        .decide(RouteRequest::new("app.example.com", "/v1/x"))
        .await;

    assert_eq!(terminated(decision).terminal, Terminal::Unavailable);
    assert_eq!(event.application.as_deref(), Some("app1"));
    assert_eq!(event.process.as_deref(), Some("web"));
    assert_eq!(event.machine, None);
}

#[tokio::test(start_paused = true)]
async fn test_empty_passer_pool_is_unavailable() {
    let store = common::scenario_store();
    store.remove(&keys::passers("m1"), r#"["e1", "9000"]"#);

    let (decision, event) = pipeline(&store)
        .decide(RouteRequest::new("app.example.com", "/v1/x"))
        .await;

    assert_eq!(terminated(decision).terminal, Terminal::Unavailable);
    assert_eq!(event.machine.as_deref(), Some("m1"));
    assert_eq!(event.instance.as_deref(), Some("i1"));
    assert_eq!(event.passer, None);
}

#[tokio::test]
async fn test_store_error_is_internal_error() {
    let store = common::scenario_store();
    store.set_unavailable(true);

    let (decision, event) = pipeline(&store)
        .decide(RouteRequest::new("app.example.com", "/v1/x"))
        .await;

    let response = terminated(decision);
    assert_eq!(response.terminal, Terminal::InternalError);
    assert!(response.headers.is_empty());
    assert_eq!(event.application, None);
}

#[tokio::test]
async fn test_unknown_host_is_not_found() {
    let store = common::scenario_store();
    let (decision, event) = pipeline(&store)
        .decide(RouteRequest::new("other.org", "/v1/x"))
        .await;

    assert_eq!(terminated(decision).terminal, Terminal::NotFound);
    assert_eq!(event.application, None);
    assert_eq!(event.router.as_deref(), Some("router-test:5200"));
}

#[tokio::test]
async fn test_unmatched_path_is_not_found() {
    let store = common::scenario_store();
    let (decision, event) = pipeline(&store)
        .decide(RouteRequest::new("app.example.com", "/v2/x"))
        .await;

    assert_eq!(terminated(decision).terminal, Terminal::NotFound);
    assert_eq!(event.application.as_deref(), Some("app1"));
}

#[tokio::test]
async fn test_rule_without_forward_is_not_found() {
    let store = common::scenario_store();
    store.set_field(
        keys::DOMAINS,
        "static.example.com.",
        r#"["d2", [["cache-control", "public"]]]"#,
    );

    let (decision, _) = pipeline(&store)
        .decide(RouteRequest::new("static.example.com", "/v1/x"))
        .await;

    let response = terminated(decision);
    assert_eq!(response.terminal, Terminal::NotFound);
    assert_eq!(response.headers["cache-control"], "public");
}

#[tokio::test]
async fn test_malformed_rule_is_internal_error() {
    let store = common::scenario_store();
    store.set_field(keys::DOMAINS, "bad.example.com.", "{not json");

    let (decision, _) = pipeline(&store)
        .decide(RouteRequest::new("bad.example.com", "/"))
        .await;

    assert_eq!(terminated(decision).terminal, Terminal::InternalError);
}

#[tokio::test]
async fn test_most_specific_rules_win() {
    let store = common::scenario_store();
    store.set_field(keys::DOMAINS, "*.", r#"["d0", [["forward", "catchall"]]]"#);
    store.set_field(keys::DOMAINS, "api.example.com.", r#"["d3", [["forward", "app1"], ["cache-control", "private"]]]"#);
    store.set_field(&keys::paths("app1"), "/*", r#"["p0", [["forward", "root"]]]"#);
    store.set_field(
        &keys::paths("app1"),
        "/v1/x",
        r#"["p2", [["forward", "web"], ["cache-control", "max-age=5"]]]"#,
    );

    let (decision, _) = pipeline(&store)
        .decide(RouteRequest::new("API.example.com.", "/v1/x"))
        .await;

    let forward = forwarded(decision);
    assert_eq!(forward.response_headers["x-alice-process"], "web");
    // Path rule overwrites the domain's Cache-Control.
    assert_eq!(forward.response_headers["cache-control"], "max-age=5");

    let (decision, _) = pipeline(&store)
        .decide(RouteRequest::new("elsewhere.net", "/"))
        .await;
    // Catch-all domain matched, but its application has no paths.
    let response = terminated(decision);
    assert_eq!(response.terminal, Terminal::NotFound);
    assert_eq!(response.headers["x-alice-application"], "catchall");
}

#[tokio::test]
async fn test_rotation_alternates_backends_deterministically() {
    let store = common::scenario_store();
    store.push(&keys::backends("app1", "web"), r#"["b2", "m2", 8081, "i2"]"#);
    store.push(&keys::passers("m2"), r#"["e2", 9001]"#);
    let pipeline = pipeline(&store);

    let mut machines = Vec::new();
    for _ in 0..4 {
        let (decision, _) = pipeline.decide(RouteRequest::new("app.example.com", "/v1/x")).await;
        machines.push(forwarded(decision).machine);
    }
    assert_eq!(machines, vec!["m1", "m2", "m1", "m2"]);
}

#[tokio::test]
async fn test_repeat_routing_is_stable() {
    let store = common::scenario_store();
    let pipeline = pipeline(&store);

    let (first, first_event) = pipeline.decide(RouteRequest::new("app.example.com", "/v1/x")).await;
    let (second, second_event) = pipeline.decide(RouteRequest::new("app.example.com", "/v1/x")).await;

    let (first, second) = (forwarded(first), forwarded(second));
    assert_eq!((first.machine, first.port), (second.machine, second.port));
    assert_eq!(first.response_headers, second.response_headers);
    assert_eq!(first_event, second_event);
}

#[tokio::test]
async fn test_conditional_request_validator_is_untagged() {
    let store = common::scenario_store();
    store.set_field(&keys::application_flags("app1"), "cache_version", "3");

    let mut request = RouteRequest::new("app.example.com", "/v1/x");
    request
        .headers
        .insert("if-none-match", HeaderValue::from_static("\"abc--c3\""));

    let (decision, _) = pipeline(&store).decide(request).await;
    let forward = forwarded(decision);
    assert_eq!(forward.request_headers["if-none-match"], "\"abc\"");
    assert_eq!(
        forward.etag_rewrite.map(|r| r.apply("\"abc\"")).as_deref(),
        Some("\"abc--c3\"")
    );
}

#[tokio::test]
async fn test_route_records_stats_for_every_outcome() {
    let store = common::scenario_store();
    let pipeline = pipeline(&store);

    pipeline.route(RouteRequest::new("app.example.com", "/v1/x")).await;
    pipeline.route(RouteRequest::new("unknown.org", "/")).await;

    let queued = common::wait_for_stats(&store, "fnordmetric-queue", 2).await;
    assert_eq!(queued.len(), 2);

    let events: Vec<StatsEvent> = queued
        .iter()
        .map(|id| {
            let payload = store.record(&format!("fnordmetric-event-{}", id)).unwrap();
            serde_json::from_str(&payload).unwrap()
        })
        .collect();
    assert!(events.iter().any(|e| e.machine.as_deref() == Some("m1")));
    assert!(events.iter().any(|e| e.application.is_none()));
    assert!(queued.iter().all(|id| id.starts_with("alice:req:5200-")));
}

#[tokio::test]
async fn test_validator_from_older_cache_version_is_kept() {
    let store = common::scenario_store();
    store.set_field(&keys::application_flags("app1"), "cache_version", "4");

    let mut request = RouteRequest::new("app.example.com", "/v1/x");
    request
        .headers
        .insert("if-none-match", HeaderValue::from_static("\"abc--c3\""));

    let (decision, _) = pipeline(&store).decide(request).await;
    // The backend must not match a tag issued before the version bump.
    assert_eq!(forwarded(decision).request_headers["if-none-match"], "\"abc--c3\"");
}

#[tokio::test]
async fn test_every_validator_line_is_forwarded() {
    let store = common::scenario_store();
    store.set_field(&keys::application_flags("app1"), "cache_version", "3");

    let mut request = RouteRequest::new("app.example.com", "/v1/x");
    request
        .headers
        .append("if-none-match", HeaderValue::from_static("\"a--c3\""));
    request
        .headers
        .append("if-none-match", HeaderValue::from_static("\"b--c3\", \"c--c2\""));

    let (decision, _) = pipeline(&store).decide(request).await;
    let forward = forwarded(decision);
    let validators: Vec<_> = forward.request_headers.get_all("if-none-match").iter().collect();
    assert_eq!(validators, vec!["\"a\", \"b\", \"c--c2\""]);
}

#[tokio::test]
async fn test_last_forward_action_wins() {
    let store = common::scenario_store();
    store.set_field(
        keys::DOMAINS,
        "twice.example.com.",
        r#"["d4", [["forward", "other"], ["forward", "app1"]]]"#,
    );

    let (decision, event) = pipeline(&store)
        .decide(RouteRequest::new("twice.example.com", "/v1/x"))
        .await;

    assert_eq!(forwarded(decision).response_headers["x-alice-application"], "app1");
    assert_eq!(event.application.as_deref(), Some("app1"));
}

#[tokio::test]
async fn test_flags_store_error_is_internal_error() {
    let store = common::scenario_store();
    store.fail_key(&keys::application_flags("app1"));

    let (decision, event) = pipeline(&store)
        .decide(RouteRequest::new("app.example.com", "/v1/x"))
        .await;

    let response = terminated(decision);
    assert_eq!(response.terminal, Terminal::InternalError);
    assert_eq!(response.headers["x-alice-application"], "app1");
    assert!(response.headers.get("x-alice-cache-version").is_none());
    assert_eq!(event.application.as_deref(), Some("app1"));
    assert_eq!(event.process, None);
}

#[tokio::test]
async fn test_path_store_error_is_internal_error() {
    let store = common::scenario_store();
    store.set_field(&keys::application_flags("app1"), "cache_version", "5");
    store.fail_key(&keys::paths("app1"));

    let (decision, event) = pipeline(&store)
        .decide(RouteRequest::new("app.example.com", "/v1/x"))
        .await;

    let response = terminated(decision);
    assert_eq!(response.terminal, Terminal::InternalError);
    assert_eq!(response.headers["x-alice-application"], "app1");
    assert_eq!(response.headers["x-alice-cache-version"], "5");
    assert!(response.headers.get("x-alice-process").is_none());
    assert_eq!(event.application.as_deref(), Some("app1"));
    assert_eq!(event.process, None);
    assert_eq!(event.machine, None);
}

#[tokio::test]
async fn test_backend_store_error_is_internal_error() {
    let store = common::scenario_store();
    store.fail_key(&keys::backends("app1", "web"));

    let (decision, event) = pipeline(&store)
        .decide(RouteRequest::new("app.example.com", "/v1/x"))
        .await;

    let response = terminated(decision);
    assert_eq!(response.terminal, Terminal::InternalError);
    assert_eq!(response.headers["x-alice-process"], "web");
    assert_eq!(event.application.as_deref(), Some("app1"));
    assert_eq!(event.process.as_deref(), Some("web"));
    assert_eq!(event.machine, None);
    assert_eq!(event.instance, None);
}

#[tokio::test]
async fn test_passer_store_error_is_internal_error() {
    let store = common::scenario_store();
    store.fail_key(&keys::passers("m1"));

    let (decision, event) = pipeline(&store)
        .decide(RouteRequest::new("app.example.com", "/v1/x"))
        .await;

    let response = terminated(decision);
    assert_eq!(response.terminal, Terminal::InternalError);
    assert_eq!(response.headers["x-alice-application"], "app1");
    assert_eq!(response.headers["x-alice-process"], "web");
    assert_eq!(event.process.as_deref(), Some("web"));
    assert_eq!(event.machine.as_deref(), Some("m1"));
    assert_eq!(event.instance.as_deref(), Some("i1"));
    assert_eq!(event.passer, None);
}
