//! The `scenario` module drives end-to-end receive checks.
//!
//! - `collaborators`: the narrow traits the harness needs from a device SDK and
//!   a service SDK.
//! - `runner`: one send-and-verify cycle for a single protocol.
//! - `suite`: provisions one device per protocol, runs the scenarios
//!   concurrently and removes the devices again.

pub mod collaborators;
pub mod runner;
pub mod suite;

pub use collaborators::{
    ConnectionFactory, ConnectionOptions, DeviceConnection, DeviceIdentity, IdentityRegistry,
    RemoteSender,
};
pub use runner::{ScenarioReport, ScenarioResult, ScenarioRunner};
pub use suite::{ReceiveSuite, SuiteReport};
