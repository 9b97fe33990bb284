use std::time::Duration;

use cucumber::{gherkin::Step, given, then, when};
use log::*;
use pay_session::{MinorUnits, SessionError};
use serde_json::{json, Value};
use tokio::time::timeout;
use wiremock::{
    matchers::{method, path},
    Mock,
    ResponseTemplate,
};

use crate::cucumber::SessionWorld;

#[given("the payment service is running")]
async fn service_is_running(world: &mut SessionWorld) {
    world.start_service().await;
}

#[given(expr = "I am user {string}")]
async fn set_user(world: &mut SessionWorld, user: String) {
    let result = world.session_mut().set_user_id(&user);
    world.record(result);
}

// Given the service creates order "ord_1" with status "pending"
#[given(expr = "the service creates order {string} with status {string}")]
async fn service_creates_order(world: &mut SessionWorld, order_id: String, status: String) {
    Mock::given(method("POST"))
        .and(path("/api/orders"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": order_id, "status": status})))
        .up_to_n_times(1)
        .mount(world.api())
        .await;
}

#[given(expr = "the service answers {word} {word} with status {int} and body:")]
async fn service_answers(world: &mut SessionWorld, verb: String, route: String, status: u16, step: &Step) {
    let body = step.docstring().expect("No response body given").trim().to_string();
    let template = match serde_json::from_str::<Value>(&body) {
        Ok(json) => ResponseTemplate::new(status).set_body_json(json),
        Err(_) => ResponseTemplate::new(status).set_body_string(body),
    };
    Mock::given(method(verb.as_str())).and(path(route.as_str())).respond_with(template).mount(world.api()).await;
}

#[when("I create an account")]
async fn create_account(world: &mut SessionWorld) {
    let result = world.session_mut().create_account().await;
    world.record(result);
}

#[when(expr = "I top up {int}")]
async fn top_up(world: &mut SessionWorld, amount: i64) {
    let result = world.session_mut().top_up(MinorUnits::from(amount)).await;
    world.record(result);
}

#[when("I refresh the balance")]
async fn refresh_balance(world: &mut SessionWorld) {
    let result = world.session_mut().refresh_balance().await;
    world.record(result);
}

// When I create an order for 1000 with description "widget"
#[when(expr = "I create an order for {int} with description {string}")]
async fn create_order(world: &mut SessionWorld, amount: i64, description: String) {
    let result = world.session_mut().create_order(MinorUnits::from(amount), &description).await;
    world.record(result);
}

#[when(expr = "the service pushes to {string}:")]
async fn service_pushes(world: &mut SessionWorld, order_id: String, step: &Step) {
    let payload = step.docstring().expect("No payload given").trim().to_string();
    let bound = world.session().subscription().map(|s| s.order_id().as_str() == order_id).unwrap_or(false);
    if bound {
        assert!(world.push().wait_for_connections(&order_id, 1).await, "Nobody subscribed to {order_id}");
    }
    let reached = world.push().push(&order_id, &payload);
    debug!("🌍️ Pushed {payload} to {reached} subscriber(s) of {order_id}");
    // Frames for superseded orders never reach the session, so there is nothing to wait for.
    if bound && reached > 0 {
        world.apply_next_message().await;
    }
}

// Queues a message without waiting for the session to handle it, e.g. before watching the order.
#[when(expr = "the service pushes to {string} without waiting:")]
async fn service_queues(world: &mut SessionWorld, order_id: String, step: &Step) {
    let payload = step.docstring().expect("No payload given").trim().to_string();
    assert!(world.push().wait_for_connections(&order_id, 1).await, "Nobody subscribed to {order_id}");
    let reached = world.push().push(&order_id, &payload);
    assert_eq!(reached, 1, "Expected exactly one subscriber for {order_id}");
}

#[when("I watch the order until it completes")]
async fn watch_order(world: &mut SessionWorld) {
    let status = timeout(Duration::from_secs(5), world.session_mut().watch_until_terminal())
        .await
        .expect("Order did not complete in time");
    debug!("🌍️ Stopped watching with status {status:?}");
}

#[then(expr = "the current order is {string} with status {string}")]
async fn current_order_is(world: &mut SessionWorld, order_id: String, status: String) {
    let session = world.session();
    assert_eq!(session.current_order().map(|o| o.as_str()), Some(order_id.as_str()));
    assert_eq!(session.current_status().map(|s| s.as_str()), Some(status.as_str()));
}

#[then(expr = "the current status is {string}")]
async fn current_status_is(world: &mut SessionWorld, status: String) {
    assert_eq!(world.session().current_status().map(|s| s.as_str()), Some(status.as_str()));
}

#[then(expr = "the subscription is open for {string}")]
async fn subscription_is_open(world: &mut SessionWorld, order_id: String) {
    let subscription = world.session().subscription().expect("No subscription");
    assert_eq!(subscription.order_id().as_str(), order_id);
    assert!(!subscription.is_closed());
    assert!(world.push().wait_for_connections(&order_id, 1).await, "Nobody subscribed to {order_id}");
    let endpoint = subscription.endpoint().to_string();
    assert!(endpoint.ends_with(&format!("/ws/orders/{order_id}")), "Unexpected endpoint {endpoint}");
}

#[then(expr = "the subscription for {string} is closed")]
async fn subscription_is_closed(world: &mut SessionWorld, order_id: String) {
    assert!(world.push().wait_until_closed(&order_id).await, "{order_id} is still subscribed");
}

#[then("there is no active subscription")]
async fn no_subscription(world: &mut SessionWorld) {
    assert!(world.session().subscription().is_none());
}

#[then(expr = "the balance is {string}")]
async fn balance_is(world: &mut SessionWorld, balance: String) {
    assert_eq!(world.session().balance().to_string(), balance);
}

#[then("the operation succeeds")]
async fn operation_succeeds(world: &mut SessionWorld) {
    assert!(world.last_error.is_none(), "Expected success, got {:?}", world.last_error);
}

// Then the operation fails with "404: not found"
#[then(expr = "the operation fails with {string}")]
async fn operation_fails_with(world: &mut SessionWorld, message: String) {
    let err = world.last_error.as_ref().expect("The operation did not fail");
    assert_eq!(err.to_string(), message);
}

#[then(expr = "the operation fails with a remote error {int} {string}")]
async fn operation_fails_remotely(world: &mut SessionWorld, status: u16, detail: String) {
    let err = world.last_error.clone().expect("The operation did not fail");
    assert_eq!(err, SessionError::remote(status, detail));
}

#[then(expr = "I am notified {string}")]
async fn notified(world: &mut SessionWorld, message: String) {
    let successes = world.notifier.successes();
    assert!(successes.contains(&message), "Expected notification '{message}', got {successes:?}");
}

#[then(expr = "I am notified {string} {int} time(s)")]
async fn notified_times(world: &mut SessionWorld, message: String, times: usize) {
    let count = world.notifier.successes().iter().filter(|m| **m == message).count();
    assert_eq!(count, times, "Expected '{message}' {times} time(s)");
}

#[then(expr = "I am warned {string}")]
async fn warned(world: &mut SessionWorld, message: String) {
    let errors = world.notifier.errors();
    assert!(errors.contains(&message), "Expected error notification '{message}', got {errors:?}");
}

#[then(expr = "the activity log contains {string}")]
async fn activity_contains(world: &mut SessionWorld, fragment: String) {
    assert!(world.session().activity().contains(&fragment), "Activity log:\n{}", world.activity());
}

#[then(expr = "the last push message was {word}")]
async fn last_message_was(world: &mut SessionWorld, kind: String) {
    let last = world.session().activity().last().map(|e| e.line.clone()).unwrap_or_default();
    let expected = match kind.as_str() {
        "applied" => "WS message -> ",
        "unreadable" => "WS parse error -> ",
        other => panic!("Unknown push message outcome: {other}"),
    };
    assert!(last.starts_with(expected), "Last activity was '{last}'");
}
