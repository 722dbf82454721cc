//! Single-slot manual confirmation.
//!
//! At most one session awaits confirmation at a time, so confirmations flow
//! through one rearmable slot. The session arms it when it starts waiting
//! and disarms it on every exit path; a confirmation arriving with no armed
//! slot is dropped.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::debug;

/// Shared handle used to deliver a manual confirmation to whichever session
/// is currently waiting for one.
#[derive(Debug, Clone, Default)]
pub struct ConfirmSlot {
    inner: Arc<Mutex<Option<oneshot::Sender<()>>>>,
}

impl ConfirmSlot {
    /// Arm the slot for the current session, replacing any stale sender.
    pub(crate) fn arm(&self) -> oneshot::Receiver<()> {
        let (sender, receiver) = oneshot::channel();
        *self.inner.lock() = Some(sender);
        receiver
    }

    /// Drop the armed sender, if any. Idempotent.
    pub(crate) fn disarm(&self) {
        self.inner.lock().take();
    }

    /// Deliver a confirmation to the waiting session.
    ///
    /// Returns `true` when a session was armed and received it. A `false`
    /// return means the confirmation landed between sessions and was ignored.
    pub fn confirm(&self) -> bool {
        let Some(sender) = self.inner.lock().take() else {
            debug!("Confirmation received with no session waiting; ignored");
            return false;
        };

        sender.send(()).is_ok()
    }

    pub fn is_armed(&self) -> bool {
        self.inner.lock().is_some()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test]
    async fn confirm_reaches_the_armed_receiver() {
        let slot = ConfirmSlot::default();
        let receiver = slot.arm();

        assert!(slot.is_armed());
        assert!(slot.confirm());
        assert!(receiver.await.is_ok());
        assert!(!slot.is_armed());
    }

    #[test]
    fn confirm_without_an_armed_slot_is_dropped() {
        let slot = ConfirmSlot::default();

        assert!(!slot.confirm());
    }

    #[test]
    fn rearming_replaces_the_previous_sender() {
        let slot = ConfirmSlot::default();
        let stale = slot.arm();
        let _fresh = slot.arm();

        drop(stale);
        assert!(slot.is_armed());

        slot.disarm();
        assert!(!slot.is_armed());
    }
}
