use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc::UnboundedSender;

use crate::core::{Command, PageMsg};

/// Deliver a message after a fixed delay.
pub struct DelayCmd {
    delay: Duration,
    msg: PageMsg,
    tx: UnboundedSender<PageMsg>,
}

impl DelayCmd {
    pub const fn new(delay: Duration, msg: PageMsg, tx: UnboundedSender<PageMsg>) -> Self {
        Self { delay, msg, tx }
    }
}

#[async_trait]
impl Command for DelayCmd {
    fn name(&self) -> String {
        format!("Delay {}ms before {}", self.delay.as_millis(), self.msg.label())
    }

    async fn execute(self: Box<Self>) -> color_eyre::Result<()> {
        tokio::time::sleep(self.delay).await;
        let _ = self.tx.send(self.msg);
        Ok(())
    }
}
