use std::time::Duration;

use crate::channel::ChannelError;

/// Run configuration rejected before any state change.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Message must not be empty")]
    EmptyMessage,

    #[error("Minimum delay ({min_ms}ms) must be strictly less than maximum delay ({max_ms}ms)")]
    DelayRange { min_ms: u64, max_ms: u64 },

    #[error("Send limit must be at least 1")]
    ZeroSendLimit,
}

/// Failure of a single delivery session. Every variant is terminal for the
/// recipient it concerns; the run itself continues.
#[derive(thiserror::Error, Debug)]
pub enum SessionError {
    #[error("Dispatch did not settle within the deadline of {0:?}")]
    Timeout(Duration),

    #[error("Channel closed before the delivery was confirmed")]
    ClosedWithoutConfirmation,

    #[error("Channel became unreachable while awaiting confirmation")]
    ChannelLost,

    #[error("Session cancelled by a stop request")]
    Cancelled,

    #[error(transparent)]
    Channel(#[from] ChannelError),
}

impl SessionError {
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

/// Errors surfaced by the dispatcher's control operations.
#[derive(thiserror::Error, Debug)]
pub enum DispatchError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Dataset(#[from] herald_dataset::DatasetError),

    #[error("No paused run to resume")]
    NotPaused,
}
