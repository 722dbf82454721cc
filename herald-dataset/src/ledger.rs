//! Progress ledger: the authoritative record of per-recipient outcomes.
//!
//! The ledger owns the dataset for the lifetime of the process. Outcome
//! writes are terminal and append-only within a run: a recipient's status
//! can be written at most once between `begin_run` calls, and only with a
//! terminal status. Reads hand out snapshots so exports stay pure.

use std::collections::HashSet;

use herald_common::internal;
use parking_lot::RwLock;
use tracing::warn;

use crate::{
    dataset::Dataset,
    error::Result,
    export::Export,
    queue::{RecipientQueue, RecipientStatus},
};

#[derive(Debug)]
struct LedgerInner {
    dataset: Dataset,
    /// Row indices already written during the current run.
    recorded: HashSet<usize>,
}

/// Append-only per-recipient outcome record over a dataset.
#[derive(Debug)]
pub struct Ledger {
    inner: RwLock<LedgerInner>,
}

impl Ledger {
    pub fn new(dataset: Dataset) -> Self {
        Self {
            inner: RwLock::new(LedgerInner {
                dataset,
                recorded: HashSet::new(),
            }),
        }
    }

    /// Reset the per-run write guard. Called by the orchestrator on a fresh
    /// start; resume deliberately does not call this, so a resumed run still
    /// cannot rewrite outcomes recorded before the pause.
    pub fn begin_run(&self) {
        self.inner.write().recorded.clear();
    }

    /// Record a terminal outcome for a row.
    ///
    /// Returns `false` (and logs) instead of writing when the status is not
    /// terminal, the row was already recorded this run, or the index is out
    /// of range. The caller treats `false` as a bug signal, not an error.
    pub fn record(&self, row_index: usize, status: RecipientStatus) -> bool {
        if !status.is_terminal() {
            warn!(row_index, "Refusing to record non-terminal status");
            return false;
        }

        let mut inner = self.inner.write();

        if !inner.recorded.insert(row_index) {
            warn!(
                row_index,
                %status,
                "Duplicate outcome write for row ignored"
            );
            return false;
        }

        if !inner.dataset.set_status(row_index, status.as_cell()) {
            warn!(row_index, "Outcome write for unknown row ignored");
            inner.recorded.remove(&row_index);
            return false;
        }

        internal!(
            level = DEBUG,
            "Row {row_index} recorded as {status}"
        );

        true
    }

    /// Build the queue of pending recipients from the current dataset state.
    pub fn build_queue(&self) -> Result<RecipientQueue> {
        RecipientQueue::build(&self.inner.read().dataset)
    }

    /// Snapshot of the full dataset, including rows outside any queue.
    pub fn snapshot(&self) -> Dataset {
        self.inner.read().dataset.clone()
    }

    /// Render the annotated dataset for external consumption.
    pub fn export(&self) -> Export {
        Export::from_dataset(&self.inner.read().dataset)
    }

    /// Current status cell of a row, if the row exists.
    pub fn status_of(&self, row_index: usize) -> Option<RecipientStatus> {
        self.inner
            .read()
            .dataset
            .status_of(row_index)
            .map(RecipientStatus::from_cell)
    }
}
