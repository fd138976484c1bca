use async_trait::async_trait;
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

use crate::core::{Command, PageMsg};
use crate::document::{Document, attr};
use crate::sync::{CloseGuard, PollOptions, wait_until_signalled};

/// Wait for a region marked as awaiting replacement to be swapped out.
///
/// Replacement drops the marker along with the old node, so "still pending"
/// means the marker is still there.
pub struct AwaitReplacementCmd {
    document: Document,
    watcher: String,
    target: String,
    own: bool,
    options: PollOptions,
    tx: UnboundedSender<PageMsg>,
}

impl AwaitReplacementCmd {
    pub fn new(
        document: Document,
        watcher: impl Into<String>,
        target: impl Into<String>,
        own: bool,
        options: PollOptions,
        tx: UnboundedSender<PageMsg>,
    ) -> Self {
        Self {
            document,
            watcher: watcher.into(),
            target: target.into(),
            own,
            options,
            tx,
        }
    }
}

#[async_trait]
impl Command for AwaitReplacementCmd {
    fn name(&self) -> String {
        format!("Awaiting replacement of {}", self.target)
    }

    async fn execute(self: Box<Self>) -> color_eyre::Result<()> {
        let Self {
            document,
            watcher,
            target,
            own,
            options,
            tx,
        } = *self;

        let replaced = wait_until_signalled(
            || document.region_has_attribute(&target, attr::AWAITING_REPLACEMENT),
            document.changes(),
            options,
        )
        .await;

        let _ = tx.send(PageMsg::RegionReplaced {
            watcher,
            target,
            own,
            replaced,
        });
        Ok(())
    }
}

/// Hold the close lock until a closing dialog is hidden.
pub struct AwaitSettleCmd {
    document: Document,
    guard: CloseGuard,
    options: PollOptions,
    tx: UnboundedSender<PageMsg>,
}

impl AwaitSettleCmd {
    pub const fn new(
        document: Document,
        guard: CloseGuard,
        options: PollOptions,
        tx: UnboundedSender<PageMsg>,
    ) -> Self {
        Self {
            document,
            guard,
            options,
            tx,
        }
    }
}

#[async_trait]
impl Command for AwaitSettleCmd {
    fn name(&self) -> String {
        format!("Settling {}", self.guard.region())
    }

    async fn execute(self: Box<Self>) -> color_eyre::Result<()> {
        let Self {
            document,
            guard,
            options,
            tx,
        } = *self;
        let region = guard.region().to_string();

        let settled = wait_until_signalled(
            || !document.is_dialog_hidden(&region),
            document.changes(),
            options,
        )
        .await;

        drop(guard);
        debug!(%region, settled, "close lock released");
        let _ = tx.send(PageMsg::CloseSettled { region, settled });
        Ok(())
    }
}
