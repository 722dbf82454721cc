use std::{
    path::PathBuf,
    sync::{Arc, LazyLock},
};

use herald_common::{Signal, internal, logging};
use herald_dataset::{Dataset, Export, Ledger};
use herald_dispatch::{
    ConfirmSlot, DeliveryChannel, DeliveryMode, Dispatcher, Notifier, RunConfig, SessionTimeouts,
};
use serde::Deserialize;
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::broadcast,
};
use tracing::warn;

use crate::{
    channel::{ProcessChannel, ProcessChannelConfig},
    notifier::LogNotifier,
};

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

/// Top-level controller, deserialized from the RON configuration file.
#[derive(Debug, Deserialize)]
pub struct Herald {
    /// CSV dataset with the recipient contacts.
    dataset_path: PathBuf,
    /// Where the annotated export lands when the run settles.
    #[serde(default = "default_output_dir")]
    output_dir: PathBuf,
    #[serde(default)]
    delivery_mode: DeliveryMode,
    run: RunConfig,
    #[serde(default)]
    timeouts: SessionTimeouts,
    channel: ProcessChannelConfig,
}

pub static SHUTDOWN_BROADCAST: LazyLock<broadcast::Sender<Signal>> = LazyLock::new(|| {
    let (sender, _receiver) = broadcast::channel(64);
    sender
});

async fn shutdown() -> anyhow::Result<()> {
    let mut terminate = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            internal!(level = INFO, "CTRL+C entered, pausing the run");
        }
        _ = terminate.recv() => {
            internal!(level = INFO, "Terminate signal received, pausing the run");
        }
    }

    let _ = SHUTDOWN_BROADCAST.send(Signal::Shutdown);

    Ok(())
}

/// Forward stdin lines as manual confirmations until shutdown. Any line
/// confirms the session currently waiting; lines with no waiting session
/// are dropped.
async fn forward_confirmations(handle: ConfirmSlot) {
    let mut shutdown = SHUTDOWN_BROADCAST.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => match line {
                Ok(Some(_)) => {
                    if handle.confirm() {
                        internal!(level = INFO, "Manual confirmation forwarded");
                    }
                }
                Ok(None) => break,
                Err(err) => {
                    warn!("Failed to read from stdin: {err}");
                    break;
                }
            },
            _ = shutdown.recv() => break,
        }
    }
}

impl Herald {
    /// Run the dispatcher over the configured dataset until the run settles
    /// or a signal pauses it, then write the annotated export.
    ///
    /// # Errors
    ///
    /// Dataset loading, run configuration, and export writing failures.
    pub async fn run(self) -> anyhow::Result<()> {
        logging::init();

        let dataset = Dataset::from_path(&self.dataset_path)?;
        let ledger = Arc::new(Ledger::new(dataset));

        let channel: Arc<dyn DeliveryChannel> = Arc::new(ProcessChannel::new(self.channel));
        let notifier: Arc<dyn Notifier> = Arc::new(LogNotifier);

        let dispatcher = Dispatcher::new(
            Arc::clone(&ledger),
            channel,
            notifier,
            self.delivery_mode,
            self.timeouts,
        );

        internal!(level = INFO, "Controller running");

        tokio::spawn(forward_confirmations(dispatcher.confirm_handle()));

        dispatcher.start(self.run)?;

        tokio::select! {
            mode = dispatcher.settled() => {
                internal!(level = INFO, "Run settled as {mode}");
            }
            result = shutdown() => {
                result?;
                dispatcher.stop().await;
            }
        }

        let path = self.output_dir.join(Export::file_name("csv"));
        tokio::fs::write(&path, ledger.export().to_csv()?).await?;
        internal!(level = INFO, "Annotated dataset written to {}", path.display());

        let _ = SHUTDOWN_BROADCAST.send(Signal::Finalised);

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn config_parses_from_ron_with_defaults() {
        let config = r#"Herald(
            dataset_path: "recipients.csv",
            run: (
                message: "hello",
                send_limit: Some(10),
            ),
            channel: (
                command: "opener",
                args: ["{destination}"],
            ),
        )"#;

        let herald: Herald = ron::from_str(config).unwrap();

        assert_eq!(herald.dataset_path, PathBuf::from("recipients.csv"));
        assert_eq!(herald.output_dir, PathBuf::from("."));
        assert_eq!(herald.delivery_mode, DeliveryMode::Automated);
        assert_eq!(herald.run.message, "hello");
        assert_eq!(herald.run.min_delay_ms, 2000);
        assert_eq!(herald.run.max_delay_ms, 5000);
        assert_eq!(herald.run.send_limit, Some(10));
        assert_eq!(herald.timeouts, SessionTimeouts::default());
        assert_eq!(herald.channel.command, "opener");
    }

    #[test]
    fn config_rejects_missing_dataset_path() {
        let config = r#"Herald(
            run: (message: "hello"),
            channel: (command: "opener"),
        )"#;

        assert!(ron::from_str::<Herald>(config).is_err());
    }
}
