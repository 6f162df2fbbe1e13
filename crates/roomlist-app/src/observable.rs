//! Replay-latest observable slots.
//!
//! An [`Observable`] always holds a value. Readers take the latest value
//! synchronously; subscribers get the value current at subscription time
//! first, then every later value they have not yet seen. Intermediate values
//! published while a subscriber is not polling are coalesced.

use std::sync::Arc;

use tokio::sync::watch;

/// Value-holding observable slot.
///
/// Clones share the slot. Only the crate publishes.
#[derive(Debug)]
pub struct Observable<T> {
    tx: Arc<watch::Sender<T>>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self { tx: Arc::clone(&self.tx) }
    }
}

impl<T: Clone> Observable<T> {
    /// Create a slot holding `initial`.
    pub fn new(initial: T) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx: Arc::new(tx) }
    }

    /// Latest value.
    pub fn get(&self) -> T {
        self.tx.borrow().clone()
    }

    /// Subscribe to this slot. The first [`Subscriber::next`] yields the
    /// current value.
    pub fn subscribe(&self) -> Subscriber<T> {
        let mut rx = self.tx.subscribe();
        rx.mark_changed();
        Subscriber { rx }
    }

    /// Replace the value and notify subscribers.
    pub(crate) fn publish(&self, value: T) {
        self.tx.send_replace(value);
    }
}

/// Subscription to an [`Observable`].
#[derive(Debug)]
pub struct Subscriber<T> {
    rx: watch::Receiver<T>,
}

impl<T: Clone> Subscriber<T> {
    /// Latest value, without waiting.
    pub fn current(&self) -> T {
        self.rx.borrow().clone()
    }

    /// Next unseen value. `None` once the slot is gone.
    pub async fn next(&mut self) -> Option<T> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }

    /// Wait until the value satisfies `predicate` and return it.
    ///
    /// Checks the current value first. `None` once the slot is gone.
    pub async fn wait_for(&mut self, mut predicate: impl FnMut(&T) -> bool) -> Option<T> {
        self.rx.wait_for(|value| predicate(value)).await.ok().map(|value| value.clone())
    }
}
