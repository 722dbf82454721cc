//! Confirmation gate: hold a session open until a manual acknowledgement.
//!
//! While holding, the gate polls channel liveness and raises periodic
//! reminders. It resolves on the first of: confirmation (success), channel
//! closed (failure), channel unreachable (failure). The hold itself has no
//! deadline; only a cooperative stop tears it down from outside.

use chrono::Utc;
use herald_common::internal;
use herald_dataset::Recipient;
use tracing::warn;

use crate::{
    channel::{ChannelStatus, DeliveryChannel, Notifier},
    config::SessionTimeouts,
    confirm::ConfirmSlot,
    error::SessionError,
    session::Delivery,
};

pub(crate) struct ConfirmationGate<'session> {
    channel: &'session dyn DeliveryChannel,
    notifier: &'session dyn Notifier,
    timeouts: &'session SessionTimeouts,
    confirm: &'session ConfirmSlot,
}

impl<'session> ConfirmationGate<'session> {
    pub(crate) const fn new(
        channel: &'session dyn DeliveryChannel,
        notifier: &'session dyn Notifier,
        timeouts: &'session SessionTimeouts,
        confirm: &'session ConfirmSlot,
    ) -> Self {
        Self {
            channel,
            notifier,
            timeouts,
            confirm,
        }
    }

    pub(crate) async fn wait(&self, recipient: &Recipient) -> Result<Delivery, SessionError> {
        let confirmed = self.confirm.arm();
        tokio::pin!(confirmed);

        let mut poll = tokio::time::interval(self.timeouts.poll());
        let mut reminder = tokio::time::interval(self.timeouts.reminder());

        // Intervals fire immediately; swallow the first tick of each.
        poll.tick().await;
        reminder.tick().await;

        internal!(
            level = INFO,
            "Awaiting manual confirmation for +{}",
            recipient.contact
        );

        loop {
            tokio::select! {
                confirmation = &mut confirmed => {
                    return match confirmation {
                        Ok(()) => Ok(Delivery { manual: true }),
                        Err(_) => Err(SessionError::Cancelled),
                    };
                }
                _ = poll.tick() => match self.channel.status().await {
                    ChannelStatus::Open => {}
                    ChannelStatus::Closed => return Err(SessionError::ClosedWithoutConfirmation),
                    ChannelStatus::Unreachable => return Err(SessionError::ChannelLost),
                },
                _ = reminder.tick() => {
                    let text = format!("Confirm delivery to +{}", recipient.contact);
                    if let Err(err) = self.notifier.notify(&recipient.contact, &text, Utc::now()).await {
                        warn!(destination = %recipient.contact, "Reminder notification failed: {err}");
                    }
                }
            }
        }
    }
}
