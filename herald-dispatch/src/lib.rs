//! Paced, resumable dispatch of one message to a queue of recipients.
//!
//! The orchestrator in this crate walks a recipient queue one delivery
//! session at a time, separates sessions with a randomized pacing gap, and
//! records every terminal outcome in the dataset ledger. Runs can be paused
//! mid-queue and resumed exactly where they left off. The transport itself
//! is abstracted behind the [`DeliveryChannel`] trait.

pub mod channel;
pub mod config;
pub mod confirm;
pub mod dispatcher;
pub mod error;
pub mod session;

mod gate;

pub use channel::{ChannelError, ChannelStatus, DeliveryChannel, Notifier, NotifyError};
pub use config::{DeliveryMode, RunConfig, SessionTimeouts};
pub use confirm::ConfirmSlot;
pub use dispatcher::{
    Dispatcher, PausedSnapshot, ResumeOutcome, RunMode, RunStats, StartOutcome,
};
pub use error::{ConfigError, DispatchError, SessionError};
pub use session::Delivery;
