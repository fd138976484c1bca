use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc::UnboundedSender;

use crate::core::{Command, PageMsg};
use crate::modal::Origin;
use crate::sync::AbortSignal;
use crate::transport::{FetchRequest, Transport};

/// Load a request through the transport and report the outcome to the page.
pub struct FetchCmd {
    transport: Arc<dyn Transport>,
    request: FetchRequest,
    signal: AbortSignal,
    origin: Origin,
    tx: UnboundedSender<PageMsg>,
}

impl FetchCmd {
    pub fn new(
        transport: Arc<dyn Transport>,
        request: FetchRequest,
        signal: AbortSignal,
        origin: Origin,
        tx: UnboundedSender<PageMsg>,
    ) -> Self {
        Self {
            transport,
            request,
            signal,
            origin,
            tx,
        }
    }
}

#[async_trait]
impl Command for FetchCmd {
    fn name(&self) -> String {
        format!("{} {}", self.request.method, self.request.url)
    }

    async fn execute(self: Box<Self>) -> color_eyre::Result<()> {
        let Self {
            transport,
            request,
            signal,
            origin,
            tx,
        } = *self;

        let msg = match transport.fetch(request, signal.clone()).await {
            Ok(response) => PageMsg::Response {
                origin,
                signal,
                response,
            },
            Err(error) => PageMsg::TransportFailed {
                origin,
                signal,
                error,
            },
        };
        let _ = tx.send(msg);
        Ok(())
    }
}
