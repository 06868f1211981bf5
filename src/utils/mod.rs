//! The `utils` module provides shared building blocks used across the harness:
//! the error taxonomy and the tracing subscriber setup.

pub mod error;
pub mod logging;

pub use error::{HarnessError, TransportError};
