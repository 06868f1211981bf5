use std::time::Duration;

use serde::Serialize;
use tokio::time::{Instant, sleep};

use super::signal::ReceiptSignal;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WaitOutcome {
    Delivered,
    TimedOut,
}

/// Bounded wait on a `ReceiptSignal`.
///
/// Each iteration checks the signal before the deadline, so a write that
/// lands on the last tick is still reported as delivered. Besides the poll
/// cadence the waiter also wakes as soon as the signal is written.
#[derive(Debug, Clone, Copy)]
pub struct ReceiveWaiter {
    timeout: Duration,
    poll_interval: Duration,
}

impl Default for ReceiveWaiter {
    fn default() -> Self {
        Self::new(Self::DEFAULT_TIMEOUT, Self::DEFAULT_POLL_INTERVAL)
    }
}

impl ReceiveWaiter {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(60_000);
    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

    pub fn new(timeout: Duration, poll_interval: Duration) -> Self {
        // a zero interval would spin
        let poll_interval = poll_interval.max(Duration::from_millis(1));
        Self {
            timeout,
            poll_interval,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Blocks the calling task until the signal is written or the timeout
    /// elapses. No cancellation beyond the deadline.
    pub async fn wait(&self, signal: &ReceiptSignal) -> WaitOutcome {
        let deadline = Instant::now() + self.timeout;

        loop {
            let notified = signal.notified();

            if signal.is_set() {
                return WaitOutcome::Delivered;
            }

            let now = Instant::now();
            if now >= deadline {
                // a write due on this same tick gets one chance to land
                tokio::task::yield_now().await;
                return if signal.is_set() {
                    WaitOutcome::Delivered
                } else {
                    WaitOutcome::TimedOut
                };
            }

            let tick = self.poll_interval.min(deadline - now);
            tokio::select! {
                _ = notified => {}
                _ = sleep(tick) => {}
            }
        }
    }
}
