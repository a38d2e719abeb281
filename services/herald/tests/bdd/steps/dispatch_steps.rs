//! BDD step definitions for cooldown and dispatch features

use cucumber::{given, then, when};

use herald::config::WebhookConfig;
use herald::delivery::DeliveryOutcome;
use herald::ledger::NotificationLedger;
use herald::{HealthReport, HealthStatus, NotificationOutcome};

use crate::world::{at, HeraldWorld};

fn outcome_label(outcome: &NotificationOutcome) -> &'static str {
    match outcome {
        NotificationOutcome::Suppressed => "suppressed",
        NotificationOutcome::LedgerFailed(_) => "ledger failed",
        NotificationOutcome::Sent(DeliveryOutcome::Delivered { .. }) => "delivered",
        NotificationOutcome::Sent(DeliveryOutcome::InvalidEndpoint { .. }) => "invalid endpoint",
        NotificationOutcome::Sent(DeliveryOutcome::Rejected { .. }) => "rejected",
        NotificationOutcome::Sent(DeliveryOutcome::TransportFailed { .. }) => "transport failed",
    }
}

fn report_with_failures(count: usize) -> HealthReport {
    (0..count)
        .map(|i| (format!("check-{}", i), HealthStatus::Unhealthy))
        .chain(std::iter::once(("liveness".to_string(), HealthStatus::Healthy)))
        .collect()
}

#[given(expr = "a cooldown window of {int} seconds")]
fn cooldown_window(world: &mut HeraldWorld, seconds: i64) {
    world.window_seconds = seconds;
}

#[given(expr = "a webhook {string} at {string}")]
fn webhook_at(world: &mut HeraldWorld, name: String, uri: String) {
    world.webhooks.push(WebhookConfig {
        name,
        endpoint_uri: Some(uri),
        failure_payload_template: r#"{"text":"[[LIVENESS]] is down. [[FAILURE]]"}"#.to_string(),
        recovery_payload_template: r#"{"text":"[[LIVENESS]] is back up"}"#.to_string(),
    });
}

#[given(expr = "a webhook {string} without an endpoint")]
fn webhook_without_endpoint(world: &mut HeraldWorld, name: String) {
    world.webhooks.push(WebhookConfig {
        name,
        endpoint_uri: None,
        failure_payload_template: "[[LIVENESS]]".to_string(),
        recovery_payload_template: "[[LIVENESS]]".to_string(),
    });
}

#[when(expr = "{string} goes down with {int} failing check(s) at second {int}")]
async fn target_goes_down(world: &mut HeraldWorld, target: String, failures: usize, second: i64) {
    let dispatcher = world.dispatcher();
    world.last_outcomes = dispatcher
        .notify_down_at(&target, &report_with_failures(failures), at(second))
        .await;
}

#[when(expr = "{string} comes up at second {int}")]
async fn target_comes_up(world: &mut HeraldWorld, target: String, second: i64) {
    let dispatcher = world.dispatcher();
    world.last_outcomes = dispatcher.notify_up_at(&target, at(second)).await;
}

#[then(expr = "the outcome for {string} should be {string}")]
fn outcome_for(world: &mut HeraldWorld, webhook: String, expected: String) {
    let outcome = world
        .last_outcomes
        .iter()
        .find(|o| o.webhook == webhook)
        .unwrap_or_else(|| panic!("no outcome for webhook '{}'", webhook));
    assert_eq!(
        outcome_label(&outcome.outcome),
        expected,
        "full outcome: {}",
        outcome.outcome
    );
}

#[then(expr = "the ledger should hold {int} record(s)")]
async fn ledger_holds(world: &mut HeraldWorld, count: usize) {
    assert_eq!(world.ledger.len().await, count);
}

#[then(expr = "the latest ledger record for {string} should be {word} at second {int}")]
async fn latest_record(world: &mut HeraldWorld, target: String, state: String, second: i64) {
    let record = world
        .ledger
        .latest(&target)
        .await
        .unwrap()
        .expect("no ledger record for target");
    let expected_healthy = match state.as_str() {
        "healthy" => true,
        "unhealthy" => false,
        other => panic!("Unknown state: {}", other),
    };
    assert_eq!(record.is_healthy, expected_healthy);
    assert_eq!(record.recorded_at, at(second));
}

#[then(expr = "{int} request(s) should have been sent to {string}")]
fn requests_sent_to(world: &mut HeraldWorld, count: usize, url: String) {
    let sent = world
        .http
        .requests()
        .iter()
        .filter(|(u, _)| *u == url)
        .count();
    assert_eq!(sent, count);
}

#[then("no requests should have been sent")]
fn no_requests(world: &mut HeraldWorld) {
    assert!(world.http.requests().is_empty());
}

#[then(expr = "the last request body should contain {string}")]
fn last_body_contains(world: &mut HeraldWorld, expected: String) {
    let requests = world.http.requests();
    let (_, body) = requests.last().expect("no request sent");
    assert!(
        body.contains(&expected),
        "Expected body to contain '{}', got '{}'",
        expected,
        body
    );
}
