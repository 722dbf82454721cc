//! Collaborator traits at the delivery boundary.
//!
//! The dispatcher never talks to a transport directly. It drives a
//! [`DeliveryChannel`] through a fixed session protocol (open, dispatch,
//! settle, close) and raises operator attention through a [`Notifier`].
//! Both are object-safe so callers can supply process-backed, network-backed
//! or in-memory implementations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Observed liveness of an open channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelStatus {
    /// The channel is up and the conversation can continue.
    Open,
    /// The channel ended in an orderly way.
    Closed,
    /// The channel stopped responding without closing.
    Unreachable,
}

#[derive(thiserror::Error, Debug)]
pub enum ChannelError {
    #[error("Channel could not be opened for {destination}: {reason}")]
    OpenFailed { destination: String, reason: String },

    #[error("Dispatch failed: {0}")]
    DispatchFailed(String),

    #[error("Channel is closed")]
    Closed,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// A transport able to carry one message to one destination per session.
#[async_trait]
pub trait DeliveryChannel: Send + Sync + std::fmt::Debug {
    /// Open a conversation with the destination.
    async fn open(&self, destination: &str) -> Result<(), ChannelError>;

    /// Hand the message to the open conversation.
    async fn dispatch(&self, message: &str) -> Result<(), ChannelError>;

    /// Liveness probe, polled while a session awaits confirmation.
    async fn status(&self) -> ChannelStatus;

    /// Tear the conversation down. Must be safe to call at any point of the
    /// session, including after a failure.
    async fn close(&self);
}

#[derive(thiserror::Error, Debug)]
#[error("Notification failed: {0}")]
pub struct NotifyError(pub String);

/// Best-effort operator attention. Failures are logged, never fatal.
#[async_trait]
pub trait Notifier: Send + Sync + std::fmt::Debug {
    async fn notify(
        &self,
        destination: &str,
        message: &str,
        timestamp: DateTime<Utc>,
    ) -> Result<(), NotifyError>;
}
