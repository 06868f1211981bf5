//! # c2d-receipt
//!
//! `c2d-receipt` verifies that a device client receives cloud-to-device
//! messages sent by a remote service over HTTPS, AMQPS and MQTT, and that the
//! application properties attached to those messages arrive unchanged.
//!
//! ## Core Modules
//!
//! - `message`: message model, protocols and the per-scenario fixture.
//! - `receipt`: the cross-thread `ReceiptSignal` and the bounded `ReceiveWaiter`.
//! - `dispatch`: property comparison and the callback registered on a connection.
//! - `scenario`: collaborator traits, the scenario runner and the receive suite.
//! - `transport`: an in-process loopback hub implementing the collaborators.
//! - `config`: settings and the service credential.
//! - `utils`: error types and logging setup.

pub mod config;
pub mod dispatch;
pub mod message;
pub mod receipt;
pub mod scenario;
pub mod transport;
pub mod utils;
