//! Async command pattern for side effects.
//!
//! Commands represent async operations that run outside the page's update
//! loop: fixed delays, network loads and document watchers. The page spawns
//! them and they report back by sending a [`PageMsg`](super::PageMsg).

mod delay;
mod fetch;
mod watch;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tracing::warn;

pub use delay::DelayCmd;
pub use fetch::FetchCmd;
pub use watch::{AwaitReplacementCmd, AwaitSettleCmd};

/// Async command that performs side effects.
///
/// Commands send their results back to the page via a channel.
#[async_trait]
pub trait Command: Send + 'static {
    /// Human-readable name used in logs.
    fn name(&self) -> String;

    /// Execute the command.
    async fn execute(self: Box<Self>) -> color_eyre::Result<()>;
}

/// Run a command on the runtime, logging a failure instead of surfacing it.
pub fn spawn(command: Box<dyn Command>) -> JoinHandle<()> {
    let name = command.name();
    tokio::spawn(async move {
        if let Err(error) = command.execute().await {
            warn!(command = %name, %error, "command failed");
        }
    })
}
