//! The `message` module defines what travels from the remote service to the
//! device: an opaque payload plus application properties, and the fixture that
//! builds the payload sent in each scenario.

pub mod fixture;
pub mod model;

pub use fixture::MessageFixture;
pub use model::{Message, Property, Protocol};
