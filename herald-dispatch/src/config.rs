//! Run and session configuration.

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const fn default_min_delay_ms() -> u64 {
    2000
}

const fn default_max_delay_ms() -> u64 {
    5000
}

const fn default_settle_ms() -> u64 {
    12000
}

const fn default_overall_ms() -> u64 {
    35000
}

const fn default_reminder_ms() -> u64 {
    30000
}

const fn default_poll_ms() -> u64 {
    500
}

/// Per-run parameters supplied at start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Message body sent to every recipient in the run.
    pub message: String,
    /// Lower bound of the randomized inter-message delay.
    #[serde(default = "default_min_delay_ms")]
    pub min_delay_ms: u64,
    /// Upper bound of the randomized inter-message delay.
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    /// Cap on recipients processed this run. `None` means the whole queue.
    #[serde(default)]
    pub send_limit: Option<usize>,
}

impl RunConfig {
    /// Validate before any run state is touched.
    ///
    /// # Errors
    /// When the message is blank, the delay bounds are not strictly ordered,
    /// or the send limit is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.message.trim().is_empty() {
            return Err(ConfigError::EmptyMessage);
        }

        if self.min_delay_ms >= self.max_delay_ms {
            return Err(ConfigError::DelayRange {
                min_ms: self.min_delay_ms,
                max_ms: self.max_delay_ms,
            });
        }

        if self.send_limit == Some(0) {
            return Err(ConfigError::ZeroSendLimit);
        }

        Ok(())
    }

    /// Draw the pacing delay for the next gap, uniform over
    /// `[min_delay_ms, max_delay_ms]`.
    pub fn pacing_delay(&self) -> Duration {
        Duration::from_millis(rand::rng().random_range(self.min_delay_ms..=self.max_delay_ms))
    }
}

/// How a session decides a delivery has happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DeliveryMode {
    /// Dispatch plus settle window counts as delivered.
    #[default]
    Automated,
    /// Dispatch must be acknowledged by a manual confirmation.
    ConfirmationGated,
}

/// Deadlines and intervals governing a single delivery session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionTimeouts {
    /// Time allowed for the channel to settle after dispatch.
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,
    /// Hard deadline for the whole session.
    #[serde(default = "default_overall_ms")]
    pub overall_ms: u64,
    /// Interval between confirmation reminders.
    #[serde(default = "default_reminder_ms")]
    pub reminder_ms: u64,
    /// Interval between channel liveness probes.
    #[serde(default = "default_poll_ms")]
    pub poll_ms: u64,
}

impl Default for SessionTimeouts {
    fn default() -> Self {
        Self {
            settle_ms: default_settle_ms(),
            overall_ms: default_overall_ms(),
            reminder_ms: default_reminder_ms(),
            poll_ms: default_poll_ms(),
        }
    }
}

impl SessionTimeouts {
    pub const fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub const fn overall(&self) -> Duration {
        Duration::from_millis(self.overall_ms)
    }

    pub const fn reminder(&self) -> Duration {
        Duration::from_millis(self.reminder_ms)
    }

    pub const fn poll(&self) -> Duration {
        Duration::from_millis(self.poll_ms)
    }
}
