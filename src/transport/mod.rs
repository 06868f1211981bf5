//! The `transport` module provides an in-process loopback implementation of
//! the collaborators a scenario needs: an identity registry, a remote sender
//! and device connections for every protocol.
//!
//! It lets the suite and the CLI run hermetically, without a live hub.

pub mod hub;
pub mod link;

pub use hub::{HubStats, LoopbackHub};
pub use link::{LinkState, LoopbackConnection};

#[cfg(test)]
mod tests;
