//! Error types shared by the harness.
//!
//! `TransportError` covers every failure raised by an external collaborator
//! (connection, registry, remote sender). The scenario runner turns these into
//! a `TRANSPORT_ERROR` verdict instead of propagating them. `HarnessError` is
//! reserved for run-level setup failures that abort the whole suite.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to open connection for device {device_id}: {reason}")]
    Connect { device_id: String, reason: String },

    #[error("failed to register receive callback: {0}")]
    Register(String),

    #[error("failed to send message to device {device_id}: {reason}")]
    Send { device_id: String, reason: String },

    #[error("failed to close connection: {0}")]
    Close(String),

    #[error("connection is closed")]
    Closed,

    #[error("device {0} is not registered")]
    UnknownDevice(String),

    #[error("device {0} already exists")]
    DeviceExists(String),
}

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("environment variable {0} is not set; a service connection string is required")]
    MissingCredential(String),

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("device provisioning failed: {0}")]
    Provisioning(#[source] TransportError),

    #[error("failed to serialize report: {0}")]
    Report(#[from] serde_json::Error),
}
