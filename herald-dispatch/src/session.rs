//! One delivery session per recipient.
//!
//! A session drives the channel through a fixed protocol: open the
//! conversation, dispatch the message, let the channel settle, then either
//! declare success (automated mode) or hold for a manual confirmation
//! (gated mode). The open-dispatch-settle phase runs under a hard deadline;
//! the confirmation hold is unbounded and resolves only through the gate or
//! a stop request. Cancellation can interrupt any await point. Whatever the
//! outcome, the exit protocol disarms the confirmation slot and closes the
//! channel.

use std::sync::Arc;

use herald_dataset::Recipient;
use tokio::sync::watch;

use crate::{
    channel::{DeliveryChannel, Notifier},
    config::{DeliveryMode, SessionTimeouts},
    confirm::ConfirmSlot,
    error::SessionError,
    gate::ConfirmationGate,
};

/// Successful delivery outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delivery {
    /// Whether the delivery was acknowledged manually rather than inferred
    /// from the settle window.
    pub manual: bool,
}

#[derive(Debug)]
pub(crate) struct DeliverySession {
    channel: Arc<dyn DeliveryChannel>,
    notifier: Arc<dyn Notifier>,
    timeouts: SessionTimeouts,
    mode: DeliveryMode,
    confirm: ConfirmSlot,
}

impl DeliverySession {
    pub(crate) const fn new(
        channel: Arc<dyn DeliveryChannel>,
        notifier: Arc<dyn Notifier>,
        timeouts: SessionTimeouts,
        mode: DeliveryMode,
        confirm: ConfirmSlot,
    ) -> Self {
        Self {
            channel,
            notifier,
            timeouts,
            mode,
            confirm,
        }
    }

    /// Run the session to a terminal outcome.
    ///
    /// # Errors
    /// Any [`SessionError`]; the recipient is then recorded as failed and
    /// the run moves on.
    pub(crate) async fn run(
        &self,
        recipient: &Recipient,
        message: &str,
        mut cancel: watch::Receiver<bool>,
    ) -> Result<Delivery, SessionError> {
        let result = tokio::select! {
            outcome = self.attempt(recipient, message) => outcome,
            () = cancelled(&mut cancel) => Err(SessionError::Cancelled),
        };

        // Exit protocol, identical on every path.
        self.confirm.disarm();
        self.channel.close().await;

        result
    }

    async fn attempt(&self, recipient: &Recipient, message: &str) -> Result<Delivery, SessionError> {
        // Only the automated phase is deadline-bound. A human confirmation
        // may take arbitrarily long; the gate resolves on its own terms.
        let deadline = self.timeouts.overall();
        match tokio::time::timeout(deadline, self.dispatch_and_settle(recipient, message)).await {
            Ok(result) => result?,
            Err(_) => return Err(SessionError::Timeout(deadline)),
        }

        match self.mode {
            DeliveryMode::Automated => Ok(Delivery { manual: false }),
            DeliveryMode::ConfirmationGated => {
                ConfirmationGate::new(
                    self.channel.as_ref(),
                    self.notifier.as_ref(),
                    &self.timeouts,
                    &self.confirm,
                )
                .wait(recipient)
                .await
            }
        }
    }

    async fn dispatch_and_settle(
        &self,
        recipient: &Recipient,
        message: &str,
    ) -> Result<(), SessionError> {
        self.channel.open(&recipient.contact).await?;
        self.channel.dispatch(message).await?;

        tokio::time::sleep(self.timeouts.settle()).await;

        Ok(())
    }
}

/// Resolves once a stop has been requested; pends forever if the stop
/// channel goes away.
async fn cancelled(cancel: &mut watch::Receiver<bool>) {
    if cancel.wait_for(|stop| *stop).await.is_err() {
        std::future::pending::<()>().await;
    }
}
