use std::time::Duration;

use super::{ReceiptSignal, ReceiveWaiter, WaitOutcome};
use tokio::time::Instant;

#[test]
fn test_signal_starts_unset() {
    let signal = ReceiptSignal::new();
    assert!(!signal.is_set());
    assert!(!signal.get());
}

#[test]
fn test_signal_get_does_not_decay() {
    let signal = ReceiptSignal::new();
    signal.set(true);
    for _ in 0..10 {
        assert!(signal.get());
    }
    assert!(signal.is_set());
}

#[test]
fn test_signal_false_write_is_visible() {
    let signal = ReceiptSignal::new();
    signal.set(false);
    assert!(signal.is_set());
    assert!(!signal.get());
}

#[test]
fn test_signal_clones_share_state() {
    let signal = ReceiptSignal::new();
    let writer = signal.clone();
    writer.set(true);
    assert!(signal.get());
}

#[test]
fn test_signal_set_from_other_thread() {
    let signal = ReceiptSignal::new();
    let writer = signal.clone();
    std::thread::spawn(move || writer.set(true))
        .join()
        .unwrap();
    assert!(signal.get());
}

#[tokio::test(start_paused = true)]
async fn test_wait_returns_immediately_when_already_set() {
    let signal = ReceiptSignal::new();
    signal.set(true);
    let waiter = ReceiveWaiter::default();

    let start = Instant::now();
    let outcome = waiter.wait(&signal).await;

    assert_eq!(outcome, WaitOutcome::Delivered);
    assert!(start.elapsed() <= waiter.poll_interval());
}

#[tokio::test(start_paused = true)]
async fn test_wait_times_out_within_one_tick_of_deadline() {
    let signal = ReceiptSignal::new();
    let waiter = ReceiveWaiter::default();

    let start = Instant::now();
    let outcome = waiter.wait(&signal).await;
    let elapsed = start.elapsed();

    assert_eq!(outcome, WaitOutcome::TimedOut);
    assert!(elapsed >= waiter.timeout());
    assert!(elapsed <= waiter.timeout() + waiter.poll_interval());
}

#[tokio::test(start_paused = true)]
async fn test_write_on_deadline_tick_is_delivered() {
    let signal = ReceiptSignal::new();
    let writer = signal.clone();
    tokio::spawn(async move {
        tokio::time::sleep(ReceiveWaiter::DEFAULT_TIMEOUT).await;
        writer.set(true);
    });

    let outcome = ReceiveWaiter::default().wait(&signal).await;

    assert_eq!(outcome, WaitOutcome::Delivered);
    assert!(signal.get());
}

#[tokio::test(start_paused = true)]
async fn test_wait_wakes_on_write_from_task() {
    let signal = ReceiptSignal::new();
    let writer = signal.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(1_250)).await;
        writer.set(true);
    });

    let start = Instant::now();
    let outcome = ReceiveWaiter::default().wait(&signal).await;

    assert_eq!(outcome, WaitOutcome::Delivered);
    assert!(start.elapsed() < Duration::from_secs(2));
    assert!(signal.get());
}

#[tokio::test(start_paused = true)]
async fn test_wait_reports_delivered_for_false_write() {
    let signal = ReceiptSignal::new();
    let writer = signal.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(300)).await;
        writer.set(false);
    });

    let outcome = ReceiveWaiter::default().wait(&signal).await;

    assert_eq!(outcome, WaitOutcome::Delivered);
    assert!(!signal.get());
}

#[tokio::test]
async fn test_wait_wakes_on_write_from_os_thread() {
    let signal = ReceiptSignal::new();
    let writer = signal.clone();
    let handle = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(50));
        writer.set(true);
    });

    let waiter = ReceiveWaiter::new(Duration::from_secs(5), Duration::from_millis(100));
    let outcome = waiter.wait(&signal).await;
    handle.join().unwrap();

    assert_eq!(outcome, WaitOutcome::Delivered);
}

#[test]
fn test_zero_poll_interval_is_clamped() {
    let waiter = ReceiveWaiter::new(Duration::from_secs(1), Duration::ZERO);
    assert!(waiter.poll_interval() > Duration::ZERO);
}
