//! The `receipt` module coordinates the two execution contexts of a scenario:
//! the transport's delivery context writes a `ReceiptSignal`, and the scenario
//! task blocks in `ReceiveWaiter` until that write lands or a deadline passes.

pub mod signal;
pub mod waiter;

pub use signal::ReceiptSignal;
pub use waiter::{ReceiveWaiter, WaitOutcome};

#[cfg(test)]
mod tests;
