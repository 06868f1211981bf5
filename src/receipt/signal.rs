use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use tokio::sync::Notify;
use tokio::sync::futures::Notified;

const UNSET: u8 = 0;
const FALSE: u8 = 1;
const TRUE: u8 = 2;

/// Single-slot verdict shared between a delivery callback and a waiter.
///
/// Clones share the same cell. `set` may be called from any thread; a later
/// write overwrites an earlier one.
#[derive(Debug, Clone, Default)]
pub struct ReceiptSignal {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    state: AtomicU8,
    notify: Notify,
}

impl ReceiptSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, value: bool) {
        let state = if value { TRUE } else { FALSE };
        self.inner.state.store(state, Ordering::Release);
        self.inner.notify.notify_waiters();
    }

    /// Current verdict. `false` until a `set(true)` has landed.
    pub fn get(&self) -> bool {
        self.inner.state.load(Ordering::Acquire) == TRUE
    }

    /// Whether any write has happened, regardless of its value.
    pub fn is_set(&self) -> bool {
        self.inner.state.load(Ordering::Acquire) != UNSET
    }

    /// Future resolved by the next `set`. Create it before checking
    /// `is_set` so a write in between is not missed.
    pub fn notified(&self) -> Notified<'_> {
        self.inner.notify.notified()
    }
}
