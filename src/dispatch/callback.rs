//! Receive callbacks
//!
//! A `CallbackDispatcher` is registered on a device connection and invoked on
//! the transport's own execution context. It records a verdict in its
//! `ReceiptSignal` and always settles the message as complete: a content
//! mismatch fails the scenario, it is not a delivery failure.

use std::panic::{AssertUnwindSafe, catch_unwind};

use tracing::{debug, warn};

use super::matcher::PropertyMatcher;
use crate::message::{Message, Property, Protocol};
use crate::receipt::ReceiptSignal;

/// Settlement a callback hands back to the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageResult {
    /// Processing finished; the message must not be redelivered.
    Complete,
    /// Put the message back for redelivery.
    Abandon,
    /// Drop the message without redelivery.
    Reject,
}

#[derive(Debug, Clone)]
pub enum CallbackDispatcher {
    /// Compares received properties with the expected set.
    PropertyVerifying {
        expected: Vec<Property>,
        signal: ReceiptSignal,
    },
    /// Any arrival counts as success.
    PresenceOnly { signal: ReceiptSignal },
}

impl CallbackDispatcher {
    /// Picks the variant matching what `protocol` can carry.
    pub fn for_protocol(protocol: Protocol, sent: &Message, signal: ReceiptSignal) -> Self {
        if protocol.supports_properties() {
            CallbackDispatcher::PropertyVerifying {
                expected: sent.properties.clone(),
                signal,
            }
        } else {
            CallbackDispatcher::PresenceOnly { signal }
        }
    }

    pub fn signal(&self) -> &ReceiptSignal {
        match self {
            CallbackDispatcher::PropertyVerifying { signal, .. } => signal,
            CallbackDispatcher::PresenceOnly { signal } => signal,
        }
    }

    pub fn on_message(&self, message: &Message) -> MessageResult {
        let verdict = match self {
            CallbackDispatcher::PropertyVerifying { expected, .. } => {
                // a panic here has nowhere to go; record it as a failed check
                catch_unwind(AssertUnwindSafe(|| verify(expected, message))).unwrap_or(false)
            }
            CallbackDispatcher::PresenceOnly { .. } => true,
        };

        debug!(
            verdict,
            payload_len = message.payload.len(),
            "message callback invoked"
        );
        self.signal().set(verdict);
        MessageResult::Complete
    }
}

fn verify(expected: &[Property], message: &Message) -> bool {
    let comparison = PropertyMatcher::compare(expected, &message.properties);
    if !comparison.matched {
        warn!(
            mismatched = ?comparison.mismatched,
            expected = expected.len(),
            received = message.properties.len(),
            "received properties differ from sent properties"
        );
    }
    comparison.matched
}
