//! Scenario runner
//!
//! A scenario opens a device connection, arms a callback bound to a fresh
//! `ReceiptSignal`, asks the service to send, and waits for the verdict.
//! Registration happens before the send, and the send before the wait, so a
//! fast delivery can never reach an unarmed connection.
//!
//! Collaborator failures become `TransportError` verdicts; the connection is
//! closed on every path.

use std::time::Duration;

use serde::Serialize;
use tokio::time::{Instant, sleep};
use tracing::{error, info, warn};

use super::collaborators::{ConnectionOptions, DeviceConnection, DeviceIdentity, RemoteSender};
use crate::config::Settings;
use crate::dispatch::CallbackDispatcher;
use crate::message::{Message, MessageFixture, Protocol};
use crate::receipt::{ReceiptSignal, ReceiveWaiter, WaitOutcome};
use crate::utils::TransportError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScenarioResult {
    Success,
    Timeout,
    ContentMismatch,
    TransportError,
}

impl ScenarioResult {
    pub fn is_success(self) -> bool {
        self == ScenarioResult::Success
    }

    pub fn description(self) -> &'static str {
        match self {
            ScenarioResult::Success => "message received",
            ScenarioResult::Timeout => "receive timed out",
            ScenarioResult::ContentMismatch => "content verification failed",
            ScenarioResult::TransportError => "transport error",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    pub protocol: Protocol,
    pub device_id: String,
    pub result: ScenarioResult,
    pub elapsed_ms: u64,
    /// Underlying cause for transport errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ScenarioRunner {
    waiter: ReceiveWaiter,
    grace_period: Duration,
    https_polling_interval: Duration,
}

impl Default for ScenarioRunner {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

impl ScenarioRunner {
    pub fn new(waiter: ReceiveWaiter, grace_period: Duration, https_polling_interval: Duration) -> Self {
        Self {
            waiter,
            grace_period,
            https_polling_interval,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            ReceiveWaiter::new(settings.receive.timeout(), settings.receive.poll_interval()),
            settings.receive.grace_period(),
            settings.https.minimum_polling_interval(),
        )
    }

    pub fn waiter(&self) -> &ReceiveWaiter {
        &self.waiter
    }

    /// Runs the scenario with the fixture message for `protocol`.
    pub async fn run(
        &self,
        protocol: Protocol,
        device: &DeviceIdentity,
        connection: &mut dyn DeviceConnection,
        sender: &dyn RemoteSender,
    ) -> ScenarioReport {
        let message = MessageFixture::build(protocol);
        self.run_with_message(protocol, device, connection, sender, &message)
            .await
    }

    pub async fn run_with_message(
        &self,
        protocol: Protocol,
        device: &DeviceIdentity,
        connection: &mut dyn DeviceConnection,
        sender: &dyn RemoteSender,
        message: &Message,
    ) -> ScenarioReport {
        let started = Instant::now();
        let signal = ReceiptSignal::new();

        let outcome = self
            .exercise(protocol, device, connection, sender, message, &signal)
            .await;

        if outcome.is_ok() {
            // let in-flight acknowledgements drain
            sleep(self.grace_period).await;
        }
        let closed = connection.close_now().await;

        let (result, detail) = match (outcome, closed) {
            (Err(e), closed) => {
                if let Err(close_err) = closed {
                    warn!(device_id = %device.device_id, error = %close_err, "close after failure also failed");
                }
                (ScenarioResult::TransportError, Some(e.to_string()))
            }
            (Ok(_), Err(e)) => (ScenarioResult::TransportError, Some(e.to_string())),
            (Ok(WaitOutcome::TimedOut), Ok(())) => (ScenarioResult::Timeout, None),
            (Ok(WaitOutcome::Delivered), Ok(())) if signal.get() => (ScenarioResult::Success, None),
            (Ok(WaitOutcome::Delivered), Ok(())) => (ScenarioResult::ContentMismatch, None),
        };

        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        match result {
            ScenarioResult::Success => {
                info!(%protocol, device_id = %device.device_id, elapsed_ms, "scenario passed")
            }
            ScenarioResult::TransportError => error!(
                %protocol,
                device_id = %device.device_id,
                cause = detail.as_deref().unwrap_or_default(),
                "scenario failed: {}",
                result.description()
            ),
            _ => warn!(
                %protocol,
                device_id = %device.device_id,
                elapsed_ms,
                "scenario failed: {}",
                result.description()
            ),
        }

        ScenarioReport {
            protocol,
            device_id: device.device_id.clone(),
            result,
            elapsed_ms,
            detail,
        }
    }

    async fn exercise(
        &self,
        protocol: Protocol,
        device: &DeviceIdentity,
        connection: &mut dyn DeviceConnection,
        sender: &dyn RemoteSender,
        message: &Message,
        signal: &ReceiptSignal,
    ) -> Result<WaitOutcome, TransportError> {
        let options = self.options_for(protocol);
        connection.open(&options).await?;
        info!(%protocol, device_id = %device.device_id, "connection opened");

        let dispatcher = CallbackDispatcher::for_protocol(protocol, message, signal.clone());
        connection.set_message_callback(dispatcher)?;

        sender.send(&device.device_id, message).await?;
        info!(%protocol, device_id = %device.device_id, "message sent, waiting for delivery");

        Ok(self.waiter.wait(signal).await)
    }

    fn options_for(&self, protocol: Protocol) -> ConnectionOptions {
        match protocol {
            Protocol::Https => ConnectionOptions {
                minimum_polling_interval: Some(self.https_polling_interval),
            },
            Protocol::Amqps | Protocol::Mqtt => ConnectionOptions::default(),
        }
    }
}
