//! The `dispatch` module holds the handler a device connection invokes when a
//! message arrives, and the property comparison it applies.

pub mod callback;
pub mod matcher;

pub use callback::{CallbackDispatcher, MessageResult};
pub use matcher::{PropertyComparison, PropertyMatcher};
