//! One-shot readiness latch between the playback element and the
//! stream manager.

use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::oneshot;

type Slot = Arc<Mutex<Option<oneshot::Sender<()>>>>;

/// Handle given to a [`super::PlaybackElement`] so it can report that
/// playback has started.
///
/// Notifications that arrive while nothing waits are dropped.
#[derive(Clone, Default)]
pub struct PlayListener {
    slot: Slot,
}

impl PlayListener {
    /// Signals that the element started playing.
    pub fn notify_playing(&self) {
        if let Some(tx) = lock(&self.slot).take() {
            // The waiter may already have timed out.
            let _ = tx.send(());
        }
    }
}

/// Single-use latch owned by the stream manager.
///
/// At most one readiness wait may be outstanding.
#[derive(Default)]
pub(crate) struct ReadyLatch {
    slot: Slot,
}

impl ReadyLatch {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Returns a listener that fires this latch.
    pub(crate) fn listener(&self) -> PlayListener {
        PlayListener {
            slot: Arc::clone(&self.slot),
        }
    }

    /// Arms the latch and returns the receiving half.
    ///
    /// # Panics
    ///
    /// Panics if a previous wait is still outstanding.
    pub(crate) fn arm(&self) -> oneshot::Receiver<()> {
        let mut slot = lock(&self.slot);
        assert!(
            slot.is_none(),
            "ready latch armed while a previous readiness wait is outstanding"
        );
        let (tx, rx) = oneshot::channel();
        *slot = Some(tx);
        rx
    }

    /// Drops any pending sender.
    pub(crate) fn disarm(&self) {
        lock(&self.slot).take();
    }

    pub(crate) fn is_armed(&self) -> bool {
        lock(&self.slot).is_some()
    }
}

fn lock(slot: &Slot) -> MutexGuard<'_, Option<oneshot::Sender<()>>> {
    slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
