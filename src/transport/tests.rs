use std::time::Duration;

use super::{HubStats, LinkState, LoopbackConnection, LoopbackHub};
use crate::config::ServiceCredential;
use crate::dispatch::{CallbackDispatcher, MessageResult};
use crate::message::{Message, MessageFixture, Protocol};
use crate::receipt::{ReceiptSignal, ReceiveWaiter, WaitOutcome};
use crate::scenario::{
    ConnectionFactory, ConnectionOptions, DeviceConnection, DeviceIdentity, IdentityRegistry,
    RemoteSender,
};
use crate::utils::TransportError;

fn https_options() -> ConnectionOptions {
    ConnectionOptions {
        minimum_polling_interval: Some(Duration::from_millis(1_000)),
    }
}

#[tokio::test]
async fn test_registry_create_and_delete() {
    let hub = LoopbackHub::default();
    let identity = hub.create_device("device-a").await.unwrap();
    assert_eq!(identity.device_id, "device-a");
    assert!(!identity.primary_key.is_empty());
    assert!(hub.contains_device("device-a"));

    hub.delete_device("device-a").await.unwrap();
    assert!(!hub.contains_device("device-a"));
}

#[tokio::test]
async fn test_registry_rejects_duplicates_and_unknown_deletes() {
    let hub = LoopbackHub::default();
    hub.create_device("device-a").await.unwrap();

    let err = hub.create_device("device-a").await.unwrap_err();
    assert!(matches!(err, TransportError::DeviceExists(_)));

    let err = hub.delete_device("device-b").await.unwrap_err();
    assert!(matches!(err, TransportError::UnknownDevice(_)));
}

#[tokio::test]
async fn test_send_to_unknown_device_fails() {
    let hub = LoopbackHub::default();
    let err = hub
        .send("ghost", &Message::from_text("hello"))
        .await
        .unwrap_err();
    assert!(matches!(err, TransportError::Send { .. }));
    assert_eq!(hub.stats(), HubStats::default());
}

#[tokio::test]
async fn test_send_queues_message() {
    let hub = LoopbackHub::default();
    hub.create_device("device-a").await.unwrap();
    hub.send("device-a", &Message::from_text("one")).await.unwrap();
    hub.send("device-a", &Message::from_text("two")).await.unwrap();

    assert_eq!(hub.pending("device-a"), 2);
    assert_eq!(hub.stats().sent, 2);
    assert_eq!(hub.take_next("device-a").unwrap().payload_text(), Some("one"));
}

#[tokio::test]
async fn test_settle_applies_callback_result() {
    let hub = LoopbackHub::default();
    hub.create_device("device-a").await.unwrap();

    hub.settle("device-a", Message::from_text("a"), MessageResult::Complete);
    hub.settle("device-a", Message::from_text("b"), MessageResult::Abandon);
    hub.settle("device-a", Message::from_text("c"), MessageResult::Reject);

    let stats = hub.stats();
    assert_eq!(stats.completed, 1);
    assert_eq!(stats.abandoned, 1);
    assert_eq!(stats.rejected, 1);
    // only the abandoned message is back in the queue
    assert_eq!(hub.pending("device-a"), 1);
}

#[test]
fn test_hub_named_after_credential_host() {
    let credential = ServiceCredential::new("HostName=contoso.example;SharedAccessKey=abc");
    assert_eq!(LoopbackHub::from_credential(&credential).name(), "contoso.example");
    assert_eq!(LoopbackHub::default().name(), "loopback");
}

#[tokio::test]
async fn test_connect_unknown_device_fails() {
    let hub = LoopbackHub::default();
    let device = DeviceIdentity {
        device_id: "ghost".to_string(),
        primary_key: "k".to_string(),
    };
    assert!(hub.connect(&device, Protocol::Amqps).is_err());
}

#[tokio::test]
async fn test_open_with_wrong_key_fails() {
    let hub = LoopbackHub::default();
    let mut identity = hub.create_device("device-a").await.unwrap();
    identity.primary_key = "forged".to_string();

    let mut link = LoopbackConnection::new(hub.clone(), identity, Protocol::Amqps);
    let err = link.open(&ConnectionOptions::default()).await.unwrap_err();
    assert!(matches!(err, TransportError::Connect { .. }));
    assert_eq!(link.state(), LinkState::Created);
}

#[tokio::test]
async fn test_closed_link_rejects_reuse() {
    let hub = LoopbackHub::default();
    let identity = hub.create_device("device-a").await.unwrap();
    let mut link = LoopbackConnection::new(hub.clone(), identity, Protocol::Mqtt);

    link.open(&ConnectionOptions::default()).await.unwrap();
    link.close_now().await.unwrap();
    link.close_now().await.unwrap();
    assert_eq!(link.state(), LinkState::Closed);

    assert!(matches!(
        link.open(&ConnectionOptions::default()).await,
        Err(TransportError::Closed)
    ));
    let signal = ReceiptSignal::new();
    let handler = CallbackDispatcher::PresenceOnly { signal };
    assert!(matches!(
        link.set_message_callback(handler),
        Err(TransportError::Register(_))
    ));
}

#[tokio::test(start_paused = true)]
async fn test_amqps_delivers_with_properties() {
    let hub = LoopbackHub::default();
    let identity = hub.create_device("device-a").await.unwrap();
    let mut link = hub.connect(&identity, Protocol::Amqps).unwrap();
    link.open(&ConnectionOptions::default()).await.unwrap();

    let sent = MessageFixture::build(Protocol::Amqps);
    let signal = ReceiptSignal::new();
    link.set_message_callback(CallbackDispatcher::for_protocol(
        Protocol::Amqps,
        &sent,
        signal.clone(),
    ))
    .unwrap();
    hub.send("device-a", &sent).await.unwrap();

    let outcome = ReceiveWaiter::default().wait(&signal).await;
    assert_eq!(outcome, WaitOutcome::Delivered);
    assert!(signal.get());
    assert_eq!(hub.stats().completed, 1);
    assert_eq!(hub.pending("device-a"), 0);

    link.close_now().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_mqtt_strips_properties() {
    let hub = LoopbackHub::default();
    let identity = hub.create_device("device-m").await.unwrap();
    let mut link = hub.connect(&identity, Protocol::Mqtt).unwrap();
    link.open(&ConnectionOptions::default()).await.unwrap();

    // a verifying handler on MQTT sees no properties and fails the check
    let sent = MessageFixture::build(Protocol::Https);
    let signal = ReceiptSignal::new();
    link.set_message_callback(CallbackDispatcher::PropertyVerifying {
        expected: sent.properties.clone(),
        signal: signal.clone(),
    })
    .unwrap();
    hub.send("device-m", &sent).await.unwrap();

    let outcome = ReceiveWaiter::default().wait(&signal).await;
    assert_eq!(outcome, WaitOutcome::Delivered);
    assert!(!signal.get());
    assert_eq!(hub.stats().completed, 1);
}

#[tokio::test(start_paused = true)]
async fn test_https_delivers_on_polling_cadence() {
    let hub = LoopbackHub::default();
    let identity = hub.create_device("device-h").await.unwrap();
    let mut link = hub.connect(&identity, Protocol::Https).unwrap();
    link.open(&https_options()).await.unwrap();

    let sent = MessageFixture::build(Protocol::Https);
    let signal = ReceiptSignal::new();
    link.set_message_callback(CallbackDispatcher::for_protocol(
        Protocol::Https,
        &sent,
        signal.clone(),
    ))
    .unwrap();
    hub.send("device-h", &sent).await.unwrap();

    tokio::time::sleep(Duration::from_millis(500)).await;
    assert!(!signal.is_set());

    let outcome = ReceiveWaiter::default().wait(&signal).await;
    assert_eq!(outcome, WaitOutcome::Delivered);
    assert!(signal.get());
}

#[tokio::test(start_paused = true)]
async fn test_messages_wait_for_callback_registration() {
    let hub = LoopbackHub::default();
    let identity = hub.create_device("device-h").await.unwrap();
    let mut link = hub.connect(&identity, Protocol::Https).unwrap();
    link.open(&https_options()).await.unwrap();

    hub.send("device-h", &Message::from_text("early")).await.unwrap();
    tokio::time::sleep(Duration::from_millis(2_500)).await;
    assert_eq!(hub.pending("device-h"), 1);

    let signal = ReceiptSignal::new();
    link.set_message_callback(CallbackDispatcher::PresenceOnly {
        signal: signal.clone(),
    })
    .unwrap();

    let outcome = ReceiveWaiter::default().wait(&signal).await;
    assert_eq!(outcome, WaitOutcome::Delivered);
    assert_eq!(hub.pending("device-h"), 0);
}

#[tokio::test(start_paused = true)]
async fn test_close_stops_delivery() {
    let hub = LoopbackHub::default();
    let identity = hub.create_device("device-a").await.unwrap();
    let mut link = hub.connect(&identity, Protocol::Amqps).unwrap();
    link.open(&ConnectionOptions::default()).await.unwrap();

    let signal = ReceiptSignal::new();
    link.set_message_callback(CallbackDispatcher::PresenceOnly {
        signal: signal.clone(),
    })
    .unwrap();
    link.close_now().await.unwrap();
    tokio::task::yield_now().await;

    hub.send("device-a", &Message::from_text("late")).await.unwrap();
    let waiter = ReceiveWaiter::new(Duration::from_secs(1), Duration::from_millis(100));
    assert_eq!(waiter.wait(&signal).await, WaitOutcome::TimedOut);
    assert_eq!(hub.pending("device-a"), 1);
}

#[tokio::test(start_paused = true)]
async fn test_amqps_early_message_delivered_once_callback_armed() {
    let hub = LoopbackHub::default();
    let identity = hub.create_device("device-a").await.unwrap();
    let mut link = hub.connect(&identity, Protocol::Amqps).unwrap();
    link.open(&ConnectionOptions::default()).await.unwrap();

    hub.send("device-a", &Message::from_text("early")).await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(hub.pending("device-a"), 1);

    let signal = ReceiptSignal::new();
    link.set_message_callback(CallbackDispatcher::PresenceOnly {
        signal: signal.clone(),
    })
    .unwrap();

    let waiter = ReceiveWaiter::new(Duration::from_secs(30), Duration::from_millis(100));
    assert_eq!(waiter.wait(&signal).await, WaitOutcome::Delivered);
    assert_eq!(hub.pending("device-a"), 0);
}

#[tokio::test(start_paused = true)]
async fn test_mqtt_message_queued_before_open_is_delivered() {
    let hub = LoopbackHub::default();
    let identity = hub.create_device("device-m").await.unwrap();
    hub.send("device-m", &Message::from_text("queued")).await.unwrap();

    let mut link = hub.connect(&identity, Protocol::Mqtt).unwrap();
    let signal = ReceiptSignal::new();
    link.set_message_callback(CallbackDispatcher::PresenceOnly {
        signal: signal.clone(),
    })
    .unwrap();
    link.open(&ConnectionOptions::default()).await.unwrap();

    let waiter = ReceiveWaiter::new(Duration::from_secs(30), Duration::from_millis(100));
    assert_eq!(waiter.wait(&signal).await, WaitOutcome::Delivered);
}
