//! Process-backed delivery channel.
//!
//! Each session spawns the configured opener command for its destination.
//! The message is handed over on the child's stdin, liveness is inferred
//! from the child's exit state, and closing the channel kills the child if
//! it is still running.

use std::process::Stdio;

use async_trait::async_trait;
use herald_dispatch::{ChannelError, ChannelStatus, DeliveryChannel};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::{io::AsyncWriteExt, process::Child};

/// Placeholder in `args` replaced with the normalized destination.
pub const DESTINATION_PLACEHOLDER: &str = "{destination}";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessChannelConfig {
    /// Program executed once per recipient to open the conversation.
    pub command: String,
    /// Arguments passed to the program, after placeholder expansion.
    #[serde(default)]
    pub args: Vec<String>,
}

#[derive(Debug)]
pub struct ProcessChannel {
    config: ProcessChannelConfig,
    child: Mutex<Option<Child>>,
}

impl ProcessChannel {
    pub const fn new(config: ProcessChannelConfig) -> Self {
        Self {
            config,
            child: Mutex::new(None),
        }
    }
}

#[async_trait]
impl DeliveryChannel for ProcessChannel {
    async fn open(&self, destination: &str) -> Result<(), ChannelError> {
        let args: Vec<String> = self
            .config
            .args
            .iter()
            .map(|arg| arg.replace(DESTINATION_PLACEHOLDER, destination))
            .collect();

        let child = tokio::process::Command::new(&self.config.command)
            .args(args)
            .stdin(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|err| ChannelError::OpenFailed {
                destination: destination.to_string(),
                reason: err.to_string(),
            })?;

        *self.child.lock() = Some(child);

        Ok(())
    }

    async fn dispatch(&self, message: &str) -> Result<(), ChannelError> {
        // stdin is taken out of the child so the write happens without
        // holding the lock; dropping it afterwards signals end of input.
        let stdin = self
            .child
            .lock()
            .as_mut()
            .and_then(|child| child.stdin.take());

        let Some(mut stdin) = stdin else {
            return Err(ChannelError::Closed);
        };

        stdin.write_all(message.as_bytes()).await?;
        stdin.write_all(b"\n").await?;
        stdin.shutdown().await?;

        Ok(())
    }

    async fn status(&self) -> ChannelStatus {
        let mut child = self.child.lock();

        match child.as_mut().map(Child::try_wait) {
            None => ChannelStatus::Closed,
            Some(Ok(None)) => ChannelStatus::Open,
            Some(Ok(Some(exit))) if exit.success() => ChannelStatus::Closed,
            Some(_) => ChannelStatus::Unreachable,
        }
    }

    async fn close(&self) {
        let child = self.child.lock().take();

        if let Some(mut child) = child {
            let _ = child.start_kill();
            let _ = child.wait().await;
        }
    }
}
