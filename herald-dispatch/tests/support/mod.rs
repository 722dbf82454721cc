use std::{
    collections::HashSet,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use herald_dataset::{Dataset, Ledger};
use herald_dispatch::{
    ChannelError, ChannelStatus, DeliveryChannel, DeliveryMode, Dispatcher, Notifier, NotifyError,
    RunConfig, SessionTimeouts,
};
use parking_lot::Mutex;

/// Scriptable in-memory channel recording every interaction.
#[derive(Debug)]
pub struct MockChannel {
    opened: Mutex<Vec<String>>,
    current: Mutex<Option<String>>,
    closes: AtomicUsize,
    status: Mutex<ChannelStatus>,
    failing: Mutex<HashSet<String>>,
}

impl Default for MockChannel {
    fn default() -> Self {
        Self {
            opened: Mutex::default(),
            current: Mutex::default(),
            closes: AtomicUsize::new(0),
            status: Mutex::new(ChannelStatus::Open),
            failing: Mutex::default(),
        }
    }
}

impl MockChannel {
    /// Script a dispatch failure for one destination.
    pub fn fail_destination(&self, destination: &str) {
        self.failing.lock().insert(destination.to_string());
    }

    pub fn set_status(&self, status: ChannelStatus) {
        *self.status.lock() = status;
    }

    /// Destinations in the order they were opened.
    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().clone()
    }

    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DeliveryChannel for MockChannel {
    async fn open(&self, destination: &str) -> Result<(), ChannelError> {
        self.opened.lock().push(destination.to_string());
        *self.current.lock() = Some(destination.to_string());
        Ok(())
    }

    async fn dispatch(&self, _message: &str) -> Result<(), ChannelError> {
        let current = self.current.lock().clone().unwrap_or_default();
        if self.failing.lock().contains(&current) {
            return Err(ChannelError::DispatchFailed(format!(
                "scripted failure for {current}"
            )));
        }

        Ok(())
    }

    async fn status(&self) -> ChannelStatus {
        *self.status.lock()
    }

    async fn close(&self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
        *self.current.lock() = None;
    }
}

/// Counts notifications, never fails.
#[derive(Debug, Default)]
pub struct MockNotifier {
    count: AtomicUsize,
}

impl MockNotifier {
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Notifier for MockNotifier {
    async fn notify(
        &self,
        _destination: &str,
        _message: &str,
        _timestamp: DateTime<Utc>,
    ) -> Result<(), NotifyError> {
        self.count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub struct Fixture {
    pub dispatcher: Dispatcher,
    pub ledger: Arc<Ledger>,
    pub channel: Arc<MockChannel>,
    pub notifier: Arc<MockNotifier>,
}

/// Dispatcher over a fresh two-column dataset, one row per contact.
pub fn fixture(contacts: &[&str], mode: DeliveryMode, timeouts: SessionTimeouts) -> Fixture {
    let dataset = Dataset::from_records(
        vec!["phone".to_string(), "status".to_string()],
        contacts
            .iter()
            .map(|contact| vec![(*contact).to_string(), String::new()])
            .collect(),
    )
    .expect("fixture dataset");

    let ledger = Arc::new(Ledger::new(dataset));
    let channel = Arc::new(MockChannel::default());
    let notifier = Arc::new(MockNotifier::default());
    let dispatcher = Dispatcher::new(
        Arc::clone(&ledger),
        Arc::clone(&channel) as Arc<dyn DeliveryChannel>,
        Arc::clone(&notifier) as Arc<dyn Notifier>,
        mode,
        timeouts,
    );

    Fixture {
        dispatcher,
        ledger,
        channel,
        notifier,
    }
}

/// Timeouts scaled down so a full run finishes in milliseconds.
pub fn fast_timeouts() -> SessionTimeouts {
    SessionTimeouts {
        settle_ms: 5,
        overall_ms: 500,
        reminder_ms: 60_000,
        poll_ms: 10,
    }
}

pub fn config(min_delay_ms: u64, max_delay_ms: u64) -> RunConfig {
    RunConfig {
        message: "hello".to_string(),
        min_delay_ms,
        max_delay_ms,
        send_limit: None,
    }
}
