//! Recipient queue construction.
//!
//! A queue is built once from a dataset snapshot: eligible rows, in original
//! row order, become pending recipients. A row is eligible when its contact
//! cell still contains digits after normalization and its status cell does
//! not carry the terminal "sent" marker.

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::{
    dataset::{Dataset, SENT_MARKER},
    error::{Result, ValidationError},
};

/// Per-recipient delivery status as persisted in the status column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecipientStatus {
    Pending,
    Sent,
    Failed,
}

impl RecipientStatus {
    /// Parse a status cell. Anything that is not a terminal marker is Pending.
    pub fn from_cell(cell: &str) -> Self {
        if cell.eq_ignore_ascii_case(SENT_MARKER) {
            Self::Sent
        } else if cell.eq_ignore_ascii_case("failed") {
            Self::Failed
        } else {
            Self::Pending
        }
    }

    /// The cell value written for this status. Pending rows keep an empty cell.
    pub const fn as_cell(self) -> &'static str {
        match self {
            Self::Pending => "",
            Self::Sent => "Sent",
            Self::Failed => "Failed",
        }
    }

    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl Display for RecipientStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_cell())
    }
}

/// One addressable target with a pending delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipient {
    /// Ordinal within the queue (0-based).
    pub id: usize,
    /// Index of the backing row in the dataset.
    pub row_index: usize,
    /// Contact cell exactly as it appeared in the dataset.
    pub raw_contact: String,
    /// Digits-only normalization of the contact, used as the destination.
    pub contact: String,
}

/// Ordered, filtered set of pending recipients for a run.
#[derive(Debug, Clone)]
pub struct RecipientQueue {
    recipients: Vec<Recipient>,
    total_rows: usize,
}

impl RecipientQueue {
    /// Build the queue from a dataset, preserving original row order.
    ///
    /// # Errors
    /// [`ValidationError::NoEligibleRows`] when every row is either
    /// contact-less or already marked sent.
    pub fn build(dataset: &Dataset) -> Result<Self> {
        let mut recipients = Vec::new();

        for (row_index, _) in dataset.rows().iter().enumerate() {
            let raw = dataset.contact_of(row_index).unwrap_or_default();
            let status = dataset.status_of(row_index).unwrap_or_default();

            if RecipientStatus::from_cell(status) == RecipientStatus::Sent {
                continue;
            }

            let contact = normalize_contact(raw);
            if contact.is_empty() {
                continue;
            }

            recipients.push(Recipient {
                id: recipients.len(),
                row_index,
                raw_contact: raw.to_string(),
                contact,
            });
        }

        if recipients.is_empty() {
            return Err(ValidationError::NoEligibleRows.into());
        }

        Ok(Self {
            recipients,
            total_rows: dataset.len(),
        })
    }

    /// Pending recipients, in original row order.
    pub fn recipients(&self) -> &[Recipient] {
        &self.recipients
    }

    /// Consume the queue, yielding its recipients.
    pub fn into_recipients(self) -> Vec<Recipient> {
        self.recipients
    }

    /// Number of pending recipients.
    pub fn len(&self) -> usize {
        self.recipients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipients.is_empty()
    }

    /// Number of rows in the backing dataset, eligible or not.
    pub const fn total_rows(&self) -> usize {
        self.total_rows
    }

    /// Rows skipped at build time (no contact, or already sent).
    pub fn skipped(&self) -> usize {
        self.total_rows - self.recipients.len()
    }
}

/// Strip everything but ASCII digits from a contact cell.
pub fn normalize_contact(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}
