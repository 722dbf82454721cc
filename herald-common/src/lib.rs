pub mod logging;

pub use tracing;

/// Process-wide lifecycle signal, broadcast to every long-running task.
#[derive(Debug, Clone, Copy)]
pub enum Signal {
    Shutdown,
    Finalised,
}
