//! Reminder notifications routed through the log feed.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use herald_common::outgoing;
use herald_dispatch::{Notifier, NotifyError};

/// Raises reminders as warnings on the observable log feed.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(
        &self,
        destination: &str,
        message: &str,
        timestamp: DateTime<Utc>,
    ) -> Result<(), NotifyError> {
        outgoing!(
            level = WARN,
            "[{}] Reminder for +{destination}: {message}",
            timestamp.to_rfc3339()
        );

        Ok(())
    }
}
