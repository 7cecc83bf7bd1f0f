//! Black-box routing checks through the public crate API.
//!
//! These run fully offline: pattern routing is pure and the backend
//! clients open no connections until a zero-signal request escalates to
//! the fallback classifier, which these inputs never do.

use switchboard::{extract_entities, AgentKind, AppContext, RouteMethod, Settings};

fn context() -> AppContext {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
    AppContext::new(Settings::default()).expect("default settings must build")
}

#[tokio::test]
async fn file_requests_route_to_the_file_handler() {
    let ctx = context();
    let decision = ctx
        .router()
        .route("read the report.txt file", None, None)
        .await;
    assert_eq!(decision.agent, AgentKind::File);
    assert_eq!(decision.method, RouteMethod::Pattern);
}

#[tokio::test]
async fn mail_requests_route_to_the_mail_handler() {
    let ctx = context();
    let decision = ctx.router().route("send email to a@b.com", None, None).await;
    assert_eq!(decision.agent, AgentKind::Mail);
    assert_eq!(decision.method, RouteMethod::Pattern);
}

#[tokio::test]
async fn greetings_route_to_chat() {
    let ctx = context();
    let decision = ctx.router().route("hello there", None, None).await;
    assert_eq!(decision.agent, AgentKind::Chat);
    assert_eq!(decision.method, RouteMethod::Pattern);
    assert!((decision.confidence - 0.3).abs() < 1e-9);
}

#[tokio::test]
async fn forced_routing_wins_over_patterns() {
    let ctx = context();
    let decision = ctx
        .router()
        .route("send email to a@b.com", None, Some(AgentKind::Workflow))
        .await;
    assert_eq!(decision.agent, AgentKind::Workflow);
    assert_eq!(decision.method, RouteMethod::Forced);
    assert!((decision.confidence - 1.0).abs() < 1e-9);
}

#[test]
fn entity_extraction_is_available_to_callers() {
    let entities = extract_entities("forward /tmp/audit.log to ops@example.com");
    assert_eq!(entities.emails, vec!["ops@example.com"]);
    assert_eq!(entities.file_paths, vec!["/tmp/audit.log"]);
}
