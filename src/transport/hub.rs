//! Loopback hub
//!
//! An in-process stand-in for the remote service. It keeps:
//! - a registry of device identities
//! - one queue of cloud-to-device messages per device
//! - settlement counters fed by the device callbacks
//!
//! The hub is a cheap handle over shared state (`Arc<Mutex<..>>`); clones
//! see the same devices. Locks are never held across an await or while a
//! device callback runs.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tokio::sync::Notify;
use tracing::{debug, info};
use uuid::Uuid;

use super::link::LoopbackConnection;
use crate::config::ServiceCredential;
use crate::dispatch::MessageResult;
use crate::message::{Message, Protocol};
use crate::scenario::{
    ConnectionFactory, DeviceConnection, DeviceIdentity, IdentityRegistry, RemoteSender,
};
use crate::utils::TransportError;

/// Settlement counters across all devices.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HubStats {
    pub sent: usize,
    pub completed: usize,
    pub abandoned: usize,
    pub rejected: usize,
}

#[derive(Debug)]
struct DeviceQueue {
    identity: DeviceIdentity,
    pending: VecDeque<Message>,
    arrivals: Arc<Notify>,
}

#[derive(Debug, Default)]
struct HubState {
    devices: HashMap<String, DeviceQueue>,
    stats: HubStats,
}

#[derive(Debug, Clone)]
pub struct LoopbackHub {
    name: String,
    state: Arc<Mutex<HubState>>,
}

impl Default for LoopbackHub {
    fn default() -> Self {
        Self::new("loopback")
    }
}

impl LoopbackHub {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Arc::new(Mutex::new(HubState::default())),
        }
    }

    /// Names the hub after the credential's host, as a real service client would.
    pub fn from_credential(credential: &ServiceCredential) -> Self {
        Self::new(credential.host_name().unwrap_or("loopback"))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn stats(&self) -> HubStats {
        self.lock().stats
    }

    pub fn pending(&self, device_id: &str) -> usize {
        self.lock()
            .devices
            .get(device_id)
            .map_or(0, |d| d.pending.len())
    }

    pub fn contains_device(&self, device_id: &str) -> bool {
        self.lock().devices.contains_key(device_id)
    }

    fn lock(&self) -> MutexGuard<'_, HubState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Checks that `device` is registered with a matching key and returns
    /// the notifier signalled on every arrival for it.
    pub(super) fn authenticate(&self, device: &DeviceIdentity) -> Result<Arc<Notify>, TransportError> {
        let state = self.lock();
        match state.devices.get(&device.device_id) {
            Some(queue) if queue.identity.primary_key == device.primary_key => {
                Ok(queue.arrivals.clone())
            }
            Some(_) => Err(TransportError::Connect {
                device_id: device.device_id.clone(),
                reason: "device key rejected".to_string(),
            }),
            None => Err(TransportError::Connect {
                device_id: device.device_id.clone(),
                reason: "device is not registered".to_string(),
            }),
        }
    }

    pub(super) fn take_next(&self, device_id: &str) -> Option<Message> {
        self.lock()
            .devices
            .get_mut(device_id)
            .and_then(|d| d.pending.pop_front())
    }

    /// Applies a callback's settlement to a taken message.
    pub(super) fn settle(&self, device_id: &str, message: Message, result: MessageResult) {
        let mut state = self.lock();
        match result {
            MessageResult::Complete => state.stats.completed += 1,
            MessageResult::Abandon => {
                state.stats.abandoned += 1;
                if let Some(queue) = state.devices.get_mut(device_id) {
                    queue.pending.push_back(message);
                }
            }
            MessageResult::Reject => state.stats.rejected += 1,
        }
        debug!(%device_id, ?result, "message settled");
    }
}

#[async_trait]
impl IdentityRegistry for LoopbackHub {
    async fn create_device(&self, device_id: &str) -> Result<DeviceIdentity, TransportError> {
        let mut state = self.lock();
        if state.devices.contains_key(device_id) {
            return Err(TransportError::DeviceExists(device_id.to_string()));
        }
        let identity = DeviceIdentity {
            device_id: device_id.to_string(),
            primary_key: Uuid::new_v4().simple().to_string(),
        };
        state.devices.insert(
            device_id.to_string(),
            DeviceQueue {
                identity: identity.clone(),
                pending: VecDeque::new(),
                arrivals: Arc::new(Notify::new()),
            },
        );
        info!(hub = %self.name, %device_id, "device registered");
        Ok(identity)
    }

    async fn delete_device(&self, device_id: &str) -> Result<(), TransportError> {
        match self.lock().devices.remove(device_id) {
            Some(_) => {
                info!(hub = %self.name, %device_id, "device removed");
                Ok(())
            }
            None => Err(TransportError::UnknownDevice(device_id.to_string())),
        }
    }
}

#[async_trait]
impl RemoteSender for LoopbackHub {
    async fn send(&self, device_id: &str, message: &Message) -> Result<(), TransportError> {
        let mut state = self.lock();
        let queue = state.devices.get_mut(device_id).ok_or_else(|| TransportError::Send {
            device_id: device_id.to_string(),
            reason: "device is not registered".to_string(),
        })?;
        queue.pending.push_back(message.clone());
        // notify_one keeps a permit if the delivery task is not parked yet
        queue.arrivals.notify_one();
        state.stats.sent += 1;
        debug!(hub = %self.name, %device_id, "message queued");
        Ok(())
    }
}

impl ConnectionFactory for LoopbackHub {
    fn connect(
        &self,
        device: &DeviceIdentity,
        protocol: Protocol,
    ) -> Result<Box<dyn DeviceConnection>, TransportError> {
        if !self.contains_device(&device.device_id) {
            return Err(TransportError::UnknownDevice(device.device_id.clone()));
        }
        Ok(Box::new(LoopbackConnection::new(
            self.clone(),
            device.clone(),
            protocol,
        )))
    }
}
