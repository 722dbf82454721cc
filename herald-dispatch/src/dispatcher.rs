//! Dispatch orchestrator.
//!
//! The dispatcher owns the run lifecycle: it builds the queue from the
//! ledger, walks it one delivery session at a time with randomized pacing
//! between items, and exposes the mode transitions through a watch channel.
//! At most one run is in flight; start requests during a run are rejected
//! without touching state.

use std::sync::Arc;

use herald_common::{internal, outgoing};
use herald_dataset::{Ledger, Recipient, RecipientStatus};
use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::warn;

use crate::{
    channel::{DeliveryChannel, Notifier},
    config::{DeliveryMode, RunConfig, SessionTimeouts},
    confirm::ConfirmSlot,
    error::DispatchError,
    session::DeliverySession,
};

/// Run lifecycle. Transitions are only ever made by the dispatcher itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunMode {
    #[default]
    Idle,
    Running,
    Paused,
    Completed,
}

impl std::fmt::Display for RunMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Paused => "paused",
            Self::Completed => "completed",
        })
    }
}

/// Live counters for the current (or last) run.
///
/// `sent + failed + remaining == total` holds after every processed item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunStats {
    pub total: usize,
    pub sent: usize,
    pub failed: usize,
    pub remaining: usize,
}

impl RunStats {
    const fn new(total: usize) -> Self {
        Self {
            total,
            sent: 0,
            failed: 0,
            remaining: total,
        }
    }

    fn apply(&mut self, status: RecipientStatus) {
        match status {
            RecipientStatus::Sent => self.sent += 1,
            RecipientStatus::Failed => self.failed += 1,
            RecipientStatus::Pending => return,
        }
        self.remaining = self.remaining.saturating_sub(1);
    }

    pub const fn processed(&self) -> usize {
        self.sent + self.failed
    }

    pub const fn is_consistent(&self) -> bool {
        self.sent + self.failed + self.remaining == self.total
    }
}

/// Everything needed to continue a paused run where it left off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PausedSnapshot {
    /// Queue position of the next unprocessed recipient.
    pub cursor: usize,
    pub stats: RunStats,
    pub config: RunConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started,
    /// A run was already in flight; nothing changed.
    AlreadyRunning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeOutcome {
    Resumed,
    /// The snapshot points past the end of the queue; nothing changed.
    NothingRemaining,
}

#[derive(Debug, Default)]
struct RunState {
    mode: RunMode,
    queue: Vec<Recipient>,
    cursor: usize,
    stats: RunStats,
    config: Option<RunConfig>,
    snapshot: Option<PausedSnapshot>,
}

#[derive(Debug)]
struct Inner {
    ledger: Arc<Ledger>,
    channel: Arc<dyn DeliveryChannel>,
    notifier: Arc<dyn Notifier>,
    delivery_mode: DeliveryMode,
    timeouts: SessionTimeouts,
    confirm: ConfirmSlot,
    state: Mutex<RunState>,
    mode_tx: watch::Sender<RunMode>,
    stop_tx: watch::Sender<bool>,
}

/// Handle to the single dispatch orchestrator. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    inner: Arc<Inner>,
}

impl Dispatcher {
    pub fn new(
        ledger: Arc<Ledger>,
        channel: Arc<dyn DeliveryChannel>,
        notifier: Arc<dyn Notifier>,
        delivery_mode: DeliveryMode,
        timeouts: SessionTimeouts,
    ) -> Self {
        let (mode_tx, _) = watch::channel(RunMode::Idle);
        let (stop_tx, _) = watch::channel(false);

        Self {
            inner: Arc::new(Inner {
                ledger,
                channel,
                notifier,
                delivery_mode,
                timeouts,
                confirm: ConfirmSlot::default(),
                state: Mutex::new(RunState::default()),
                mode_tx,
                stop_tx,
            }),
        }
    }

    /// Begin a fresh run over the currently pending queue.
    ///
    /// Allowed from any mode except Running; starting over a paused run
    /// discards its snapshot. Must be called within a Tokio runtime.
    ///
    /// # Errors
    /// Configuration validation failures and queue build failures, in both
    /// cases before any run state has changed.
    pub fn start(&self, config: RunConfig) -> Result<StartOutcome, DispatchError> {
        config.validate()?;

        let mut state = self.inner.state.lock();
        if state.mode == RunMode::Running {
            internal!(level = DEBUG, "Start ignored: a run is already in progress");
            return Ok(StartOutcome::AlreadyRunning);
        }

        let pending = self.inner.ledger.build_queue()?;
        internal!(
            level = INFO,
            "Queue built: {} eligible, {} skipped of {} rows",
            pending.len(),
            pending.skipped(),
            pending.total_rows()
        );

        let mut queue = pending.into_recipients();
        if let Some(limit) = config.send_limit {
            queue.truncate(limit);
        }

        self.inner.ledger.begin_run();

        internal!(level = INFO, "Starting run: {} recipients queued", queue.len());

        state.stats = RunStats::new(queue.len());
        state.queue = queue;
        state.cursor = 0;
        state.config = Some(config);
        state.snapshot = None;
        state.mode = RunMode::Running;
        let _ = self.inner.mode_tx.send_replace(RunMode::Running);
        drop(state);

        let _ = self.inner.stop_tx.send_replace(false);
        tokio::spawn(self.clone().run_loop());

        Ok(StartOutcome::Started)
    }

    /// Request a pause and wait until the run has settled.
    ///
    /// The in-flight session, if any, is cancelled and its recipient is
    /// recorded as failed before the pause takes effect. A no-op outside of
    /// Running.
    pub async fn stop(&self) {
        if self.mode() != RunMode::Running {
            internal!(level = DEBUG, "Stop ignored: no run in progress");
            return;
        }

        internal!(level = WARN, "Stop requested");
        let _ = self.inner.stop_tx.send_replace(true);

        let mut modes = self.inner.mode_tx.subscribe();
        let _ = modes
            .wait_for(|mode| !matches!(mode, RunMode::Running))
            .await;
    }

    /// Continue a paused run from its snapshot.
    ///
    /// Recipients processed before the pause are not revisited. Must be
    /// called within a Tokio runtime.
    ///
    /// # Errors
    /// [`DispatchError::NotPaused`] when there is no paused run.
    pub fn resume(&self) -> Result<ResumeOutcome, DispatchError> {
        let mut state = self.inner.state.lock();
        if state.mode != RunMode::Paused {
            return Err(DispatchError::NotPaused);
        }

        let Some(snapshot) = state.snapshot.take() else {
            return Err(DispatchError::NotPaused);
        };

        if snapshot.cursor >= state.queue.len() {
            internal!(level = INFO, "Nothing left to resume");
            state.snapshot = Some(snapshot);
            return Ok(ResumeOutcome::NothingRemaining);
        }

        internal!(
            level = INFO,
            "Resuming run at {} of {} processed",
            snapshot.stats.processed(),
            snapshot.stats.total
        );

        state.cursor = snapshot.cursor;
        state.stats = snapshot.stats;
        state.config = Some(snapshot.config);
        state.mode = RunMode::Running;
        let _ = self.inner.mode_tx.send_replace(RunMode::Running);
        drop(state);

        let _ = self.inner.stop_tx.send_replace(false);
        tokio::spawn(self.clone().run_loop());

        Ok(ResumeOutcome::Resumed)
    }

    pub fn mode(&self) -> RunMode {
        *self.inner.mode_tx.borrow()
    }

    pub fn stats(&self) -> RunStats {
        self.inner.state.lock().stats
    }

    /// Snapshot of the paused run, if one exists.
    pub fn paused_snapshot(&self) -> Option<PausedSnapshot> {
        self.inner.state.lock().snapshot.clone()
    }

    /// Handle used to deliver manual confirmations to a waiting session.
    pub fn confirm_handle(&self) -> ConfirmSlot {
        self.inner.confirm.clone()
    }

    /// Observe mode transitions as they happen.
    pub fn subscribe_mode(&self) -> watch::Receiver<RunMode> {
        self.inner.mode_tx.subscribe()
    }

    /// Wait until the dispatcher is not Running, returning the settled mode.
    pub async fn settled(&self) -> RunMode {
        let mut modes = self.inner.mode_tx.subscribe();
        match modes
            .wait_for(|mode| !matches!(mode, RunMode::Running))
            .await
        {
            Ok(mode) => *mode,
            Err(_) => self.mode(),
        }
    }

    async fn run_loop(self) {
        let mut stop = self.inner.stop_tx.subscribe();

        loop {
            if *stop.borrow() {
                self.pause();
                return;
            }

            let Some((recipient, config)) = self.next_item() else {
                return;
            };

            let stats = self.stats();
            outgoing!(
                level = INFO,
                "Sending to +{} ({} of {})",
                recipient.contact,
                stats.processed() + 1,
                stats.total
            );

            let session = DeliverySession::new(
                Arc::clone(&self.inner.channel),
                Arc::clone(&self.inner.notifier),
                self.inner.timeouts,
                self.inner.delivery_mode,
                self.inner.confirm.clone(),
            );
            let outcome = session
                .run(&recipient, &config.message, stop.clone())
                .await;

            let status = match outcome {
                Ok(delivery) => {
                    if delivery.manual {
                        internal!(
                            level = INFO,
                            "Delivered to +{} (confirmed manually)",
                            recipient.contact
                        );
                    } else {
                        internal!(level = INFO, "Delivered to +{}", recipient.contact);
                    }
                    RecipientStatus::Sent
                }
                Err(err) => {
                    warn!(
                        destination = %recipient.contact,
                        row = recipient.row_index,
                        "Delivery failed: {err}"
                    );
                    RecipientStatus::Failed
                }
            };

            self.inner.ledger.record(recipient.row_index, status);

            let (done, stats) = {
                let mut state = self.inner.state.lock();
                state.stats.apply(status);
                state.cursor += 1;
                debug_assert!(state.stats.is_consistent());
                (state.cursor >= state.queue.len(), state.stats)
            };

            internal!(
                level = DEBUG,
                "Progress: {} sent, {} failed, {} remaining",
                stats.sent,
                stats.failed,
                stats.remaining
            );

            if *stop.borrow() {
                self.pause();
                return;
            }

            if done {
                self.complete();
                return;
            }

            // Pacing gap. A stop during the gap pauses without marking the
            // upcoming recipient.
            let delay = config.pacing_delay();
            internal!(
                level = INFO,
                "Waiting {:.1}s before the next message",
                delay.as_secs_f64()
            );
            tokio::select! {
                () = tokio::time::sleep(delay) => {}
                _ = stop.changed() => {}
            }
        }
    }

    /// Claim the next queue item without advancing the cursor. The cursor
    /// only moves once the item's outcome has been recorded.
    fn next_item(&self) -> Option<(Recipient, RunConfig)> {
        let state = self.inner.state.lock();
        if state.mode != RunMode::Running {
            return None;
        }

        if state.cursor >= state.queue.len() {
            drop(state);
            self.complete();
            return None;
        }

        let recipient = state.queue[state.cursor].clone();
        state.config.clone().map(|config| (recipient, config))
    }

    fn pause(&self) {
        let mut state = self.inner.state.lock();
        if state.mode != RunMode::Running {
            return;
        }

        if let Some(config) = state.config.clone() {
            state.snapshot = Some(PausedSnapshot {
                cursor: state.cursor,
                stats: state.stats,
                config,
            });
        }
        state.mode = RunMode::Paused;
        let _ = self.inner.mode_tx.send_replace(RunMode::Paused);

        internal!(
            level = WARN,
            "Run paused at {} of {} processed",
            state.stats.processed(),
            state.stats.total
        );
    }

    fn complete(&self) {
        let mut state = self.inner.state.lock();
        if state.mode != RunMode::Running {
            return;
        }

        state.snapshot = None;
        state.mode = RunMode::Completed;
        let _ = self.inner.mode_tx.send_replace(RunMode::Completed);

        internal!(
            level = INFO,
            "Run completed: {} sent, {} failed",
            state.stats.sent,
            state.stats.failed
        );
    }
}
