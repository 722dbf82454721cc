//! Recipient dataset handling: queue building, outcome ledger, and export.
//!
//! This crate owns everything between the tabular file on disk and the
//! dispatch layer:
//! - load and validate a CSV dataset with a contact column and a (possibly
//!   created) status column
//! - build the ordered queue of pending recipients
//! - record terminal per-recipient outcomes through the [`Ledger`]
//! - render the annotated dataset back out through [`Export`]

pub mod dataset;
pub mod error;
pub mod export;
pub mod ledger;
pub mod queue;

pub use dataset::{CONTACT_HEADER, Dataset, SENT_MARKER, STATUS_HEADER};
pub use error::{DatasetError, Result, ValidationError};
pub use export::{Export, MIN_COLUMN_WIDTH};
pub use ledger::Ledger;
pub use queue::{Recipient, RecipientQueue, RecipientStatus, normalize_contact};
