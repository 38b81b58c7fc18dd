mod common;

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use common::{notification, session, FakeApi, Reply};
use skybook::api::Api;
use skybook::model::Role;
use skybook::poller::{fetch_latest, NotificationPoller, MIN_INTERVAL, POLL_INTERVAL};
use skybook::session::SessionStore;

fn five_notifications() -> Reply {
    Reply::Json(json!([
        notification(1, "one"),
        notification(2, "two"),
        notification(3, "three"),
        notification(4, "four"),
        notification(5, "five"),
    ]))
}

#[tokio::test]
async fn keeps_only_three_most_recent() {
    let fake = FakeApi::new();
    fake.on("GET", "/notifications/42/", five_notifications());

    let latest = fetch_latest(fake.as_ref(), "42").await;
    let messages: Vec<&str> = latest.iter().map(|n| n.message.as_str()).collect();
    assert_eq!(messages, vec!["three", "four", "five"]);
}

#[tokio::test]
async fn fetch_error_means_no_notifications() {
    let fake = FakeApi::new();
    fake.on("GET", "/notifications/42/", Reply::Status(500));
    assert!(fetch_latest(fake.as_ref(), "42").await.is_empty());

    let garbage = FakeApi::new();
    garbage.on("GET", "/notifications/42/", Reply::Json(json!({"oops": true})));
    assert!(fetch_latest(garbage.as_ref(), "42").await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn client_is_polled_immediately_then_every_interval() {
    let fake = FakeApi::new();
    fake.on("GET", "/notifications/42/", five_notifications());
    let api: Arc<dyn Api> = fake.clone();
    let store = SessionStore::ephemeral(Some(session("42", Role::Client)));

    let poller = NotificationPoller::spawn(api, store.subscribe(), POLL_INTERVAL);
    let mut feed = poller.subscribe();
    feed.changed().await.unwrap();
    assert_eq!(fake.calls_to("GET", "/notifications/42/"), 1);
    assert_eq!(poller.badge(), 3);

    tokio::time::sleep(Duration::from_secs(25)).await;
    assert_eq!(fake.calls_to("GET", "/notifications/42/"), 3);
}

#[tokio::test(start_paused = true)]
async fn admin_and_anonymous_are_never_polled() {
    let fake = FakeApi::new();
    let api: Arc<dyn Api> = fake.clone();

    let admin = SessionStore::ephemeral(Some(session("9", Role::Admin)));
    let _a = NotificationPoller::spawn(api.clone(), admin.subscribe(), POLL_INTERVAL);
    let nobody = SessionStore::ephemeral(None);
    let _b = NotificationPoller::spawn(api, nobody.subscribe(), POLL_INTERVAL);

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert!(fake.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn failures_render_zero_without_stopping() {
    let fake = FakeApi::new();
    fake.on("GET", "/notifications/42/", Reply::Offline);
    let api: Arc<dyn Api> = fake.clone();
    let store = SessionStore::ephemeral(Some(session("42", Role::Client)));

    let poller = NotificationPoller::spawn(api, store.subscribe(), POLL_INTERVAL);
    tokio::time::sleep(Duration::from_secs(15)).await;
    assert_eq!(fake.calls_to("GET", "/notifications/42/"), 2);
    assert_eq!(poller.badge(), 0);
    assert!(poller.is_running());
}

#[tokio::test(start_paused = true)]
async fn cancel_stops_the_timer() {
    let fake = FakeApi::new();
    fake.on("GET", "/notifications/42/", five_notifications());
    let api: Arc<dyn Api> = fake.clone();
    let store = SessionStore::ephemeral(Some(session("42", Role::Client)));

    let mut poller = NotificationPoller::spawn(api, store.subscribe(), POLL_INTERVAL);
    poller.subscribe().changed().await.unwrap();
    poller.cancel();
    poller.cancel();

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(fake.calls_to("GET", "/notifications/42/"), 1);
    assert!(!poller.is_running());
}

#[tokio::test(start_paused = true)]
async fn dropping_the_handle_cancels() {
    let fake = FakeApi::new();
    fake.on("GET", "/notifications/42/", five_notifications());
    let api: Arc<dyn Api> = fake.clone();
    let store = SessionStore::ephemeral(Some(session("42", Role::Client)));

    let poller = NotificationPoller::spawn(api, store.subscribe(), POLL_INTERVAL);
    poller.subscribe().changed().await.unwrap();
    drop(poller);

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(fake.calls_to("GET", "/notifications/42/"), 1);
}

#[tokio::test(start_paused = true)]
async fn logout_clears_feed_and_stops_polling() {
    let fake = FakeApi::new();
    fake.on("GET", "/notifications/42/", five_notifications());
    let api: Arc<dyn Api> = fake.clone();
    let store = SessionStore::ephemeral(Some(session("42", Role::Client)));

    let poller = NotificationPoller::spawn(api, store.subscribe(), POLL_INTERVAL);
    let mut feed = poller.subscribe();
    feed.changed().await.unwrap();
    assert_eq!(poller.badge(), 3);

    store.logout().unwrap();
    feed.changed().await.unwrap();
    assert_eq!(poller.badge(), 0);

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(fake.calls_to("GET", "/notifications/42/"), 1);
}

#[tokio::test(start_paused = true)]
async fn new_identity_restarts_polling_for_that_user() {
    let fake = FakeApi::new();
    fake.on("GET", "/notifications/42/", five_notifications())
        .on("GET", "/notifications/43/", Reply::Json(json!([notification(9, "hi")])));
    let api: Arc<dyn Api> = fake.clone();
    let store = SessionStore::ephemeral(Some(session("42", Role::Client)));

    let poller = NotificationPoller::spawn(api.clone(), store.subscribe(), POLL_INTERVAL);
    poller.subscribe().changed().await.unwrap();

    store.logout().unwrap();
    fake.on("POST", "/auth/login/", Reply::Json(json!({
        "token": "t43",
        "user": {"id": 43, "first_name": "Bo", "role": "CLIENT"}
    })));
    let credentials = skybook::model::Credentials {
        email: "bo@example.com".into(),
        password: "pw".into(),
    };
    store.login(api.as_ref(), &credentials).await.unwrap();

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(fake.calls_to("GET", "/notifications/43/"), 1);
    let list = poller.notifications();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0].message, "hi");
}

#[tokio::test(start_paused = true)]
async fn zero_interval_is_raised_to_the_minimum() {
    let fake = FakeApi::new();
    fake.on("GET", "/notifications/42/", five_notifications());
    let api: Arc<dyn Api> = fake.clone();
    let store = SessionStore::ephemeral(Some(session("42", Role::Client)));

    let poller = NotificationPoller::spawn(api, store.subscribe(), Duration::ZERO);
    tokio::time::sleep(MIN_INTERVAL * 2 + Duration::from_millis(500)).await;
    assert!(poller.is_running());
    assert_eq!(fake.calls_to("GET", "/notifications/42/"), 3);
}
