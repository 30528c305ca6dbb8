//! One-shot reply slots.
//!
//! A request action carries a [`Reply`] so that the reducer can hand a typed
//! result back to whoever dispatched it. The result is computed inside the
//! store's critical section and delivered by an [`Effect::Run`], which keeps
//! the reducer itself free of I/O.
//!
//! [`Effect::Run`]: crate::effect::Effect::Run

use std::fmt;
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

/// Cloneable handle to a one-shot reply channel.
///
/// Actions must be `Clone` (the store broadcasts them), so the sender lives
/// behind an `Arc<Mutex<Option<_>>>`; only the first `send` delivers.
pub struct Reply<T> {
    slot: Arc<Mutex<Option<oneshot::Sender<T>>>>,
}

impl<T> Reply<T> {
    /// Create a reply handle and the receiver the caller awaits
    #[must_use]
    pub fn channel() -> (Self, oneshot::Receiver<T>) {
        let (tx, rx) = oneshot::channel();
        (
            Self {
                slot: Arc::new(Mutex::new(Some(tx))),
            },
            rx,
        )
    }

    /// Deliver the value.
    ///
    /// Returns `false` if a value was already sent or the caller stopped waiting.
    pub fn send(&self, value: T) -> bool {
        let sender = self.slot.lock().ok().and_then(|mut slot| slot.take());
        sender.is_some_and(|tx| tx.send(value).is_ok())
    }
}

impl<T> Clone for Reply<T> {
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
        }
    }
}

impl<T> fmt::Debug for Reply<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pending = self.slot.lock().map(|slot| slot.is_some()).unwrap_or(false);
        f.debug_struct("Reply").field("pending", &pending).finish()
    }
}
