//! Loopback device connection
//!
//! Opening a connection spawns a delivery task that plays the part of the
//! transport's own thread: it takes messages from the hub, invokes the
//! registered callback and settles each message with the callback's result.
//!
//! - HTTPS checks the hub every `minimum_polling_interval`.
//! - AMQPS and MQTT are woken on each arrival.
//! - MQTT drops application properties before delivery.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::hub::LoopbackHub;
use crate::dispatch::{CallbackDispatcher, MessageResult};
use crate::message::Protocol;
use crate::scenario::{ConnectionOptions, DeviceConnection, DeviceIdentity};
use crate::utils::TransportError;

type SharedCallback = Arc<Mutex<Option<CallbackDispatcher>>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Created,
    Open,
    Closed,
}

#[derive(Debug)]
pub struct LoopbackConnection {
    hub: LoopbackHub,
    device: DeviceIdentity,
    protocol: Protocol,
    callback: SharedCallback,
    arrivals: Option<Arc<Notify>>,
    delivery: Option<JoinHandle<()>>,
    state: LinkState,
}

impl LoopbackConnection {
    /// Polling interval used by HTTPS when no option overrides it.
    pub const DEFAULT_HTTPS_POLLING_INTERVAL: Duration = Duration::from_secs(25 * 60);

    pub fn new(hub: LoopbackHub, device: DeviceIdentity, protocol: Protocol) -> Self {
        Self {
            hub,
            device,
            protocol,
            callback: Arc::new(Mutex::new(None)),
            arrivals: None,
            delivery: None,
            state: LinkState::Created,
        }
    }

    pub fn state(&self) -> LinkState {
        self.state
    }
}

#[async_trait]
impl DeviceConnection for LoopbackConnection {
    async fn open(&mut self, options: &ConnectionOptions) -> Result<(), TransportError> {
        match self.state {
            LinkState::Open => return Ok(()),
            LinkState::Closed => return Err(TransportError::Closed),
            LinkState::Created => {}
        }

        let arrivals = self.hub.authenticate(&self.device)?;
        let cadence = match self.protocol {
            Protocol::Https => Some(
                options
                    .minimum_polling_interval
                    .unwrap_or(Self::DEFAULT_HTTPS_POLLING_INTERVAL),
            ),
            Protocol::Amqps | Protocol::Mqtt => None,
        };

        let task = DeliveryTask {
            hub: self.hub.clone(),
            device_id: self.device.device_id.clone(),
            protocol: self.protocol,
            callback: self.callback.clone(),
        };
        self.delivery = Some(tokio::spawn(task.run(arrivals.clone(), cadence)));
        // anything queued before the link opened is picked up right away
        arrivals.notify_one();
        self.arrivals = Some(arrivals);
        self.state = LinkState::Open;
        info!(device_id = %self.device.device_id, protocol = %self.protocol, "loopback link open");
        Ok(())
    }

    fn set_message_callback(&mut self, handler: CallbackDispatcher) -> Result<(), TransportError> {
        if self.state == LinkState::Closed {
            return Err(TransportError::Register("connection is closed".to_string()));
        }
        *self.callback.lock().unwrap_or_else(PoisonError::into_inner) = Some(handler);
        // messages that arrived while no handler was armed are still queued
        if let Some(arrivals) = &self.arrivals {
            arrivals.notify_one();
        }
        Ok(())
    }

    async fn close_now(&mut self) -> Result<(), TransportError> {
        if let Some(task) = self.delivery.take() {
            task.abort();
        }
        if self.state != LinkState::Closed {
            info!(device_id = %self.device.device_id, protocol = %self.protocol, "loopback link closed");
        }
        self.state = LinkState::Closed;
        Ok(())
    }
}

impl Drop for LoopbackConnection {
    fn drop(&mut self) {
        if let Some(task) = self.delivery.take() {
            task.abort();
        }
    }
}

struct DeliveryTask {
    hub: LoopbackHub,
    device_id: String,
    protocol: Protocol,
    callback: SharedCallback,
}

impl DeliveryTask {
    async fn run(self, arrivals: Arc<Notify>, cadence: Option<Duration>) {
        loop {
            match cadence {
                Some(interval) => tokio::time::sleep(interval).await,
                None => arrivals.notified().await,
            }
            self.drain();
        }
    }

    /// Delivers everything queued. An abandoned message goes back to the
    /// queue and waits for the next wake-up.
    fn drain(&self) {
        loop {
            let Some(handler) = self.handler() else {
                return;
            };
            let Some(message) = self.hub.take_next(&self.device_id) else {
                return;
            };

            let mut delivered = message.clone();
            if self.protocol == Protocol::Mqtt {
                delivered.properties.clear();
            }

            let result = handler.on_message(&delivered);
            debug!(device_id = %self.device_id, ?result, "callback returned");
            self.hub.settle(&self.device_id, message, result);
            if result == MessageResult::Abandon {
                return;
            }
        }
    }

    fn handler(&self) -> Option<CallbackDispatcher> {
        self.callback
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
