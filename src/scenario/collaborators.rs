use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use crate::dispatch::CallbackDispatcher;
use crate::message::{Message, Protocol};
use crate::utils::TransportError;

/// A provisioned device as returned by the identity registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceIdentity {
    pub device_id: String,
    #[serde(skip)]
    pub primary_key: String,
}

/// Options applied when a device connection opens.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionOptions {
    /// How often an HTTPS transport checks for new messages. Ignored by
    /// push-based protocols.
    pub minimum_polling_interval: Option<Duration>,
}

/// Device side of a hub connection.
#[async_trait]
pub trait DeviceConnection: Send {
    async fn open(&mut self, options: &ConnectionOptions) -> Result<(), TransportError>;

    /// Arms `handler`; the transport invokes it on its own execution context.
    fn set_message_callback(&mut self, handler: CallbackDispatcher) -> Result<(), TransportError>;

    /// Closes immediately without draining in-flight work. Idempotent.
    async fn close_now(&mut self) -> Result<(), TransportError>;
}

/// Builds device connections for provisioned identities.
pub trait ConnectionFactory: Send + Sync {
    fn connect(
        &self,
        device: &DeviceIdentity,
        protocol: Protocol,
    ) -> Result<Box<dyn DeviceConnection>, TransportError>;
}

/// Service side: sends a cloud-to-device message.
#[async_trait]
pub trait RemoteSender: Send + Sync {
    async fn send(&self, device_id: &str, message: &Message) -> Result<(), TransportError>;
}

#[async_trait]
pub trait IdentityRegistry: Send + Sync {
    async fn create_device(&self, device_id: &str) -> Result<DeviceIdentity, TransportError>;

    async fn delete_device(&self, device_id: &str) -> Result<(), TransportError>;
}
