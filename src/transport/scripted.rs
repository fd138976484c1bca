//! In-memory transport for tests.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use http::StatusCode;

use super::{FetchRequest, FetchResponse, Transport, TransportError};
use crate::sync::AbortSignal;

#[derive(Debug, Clone)]
enum Scripted {
    Respond(FetchResponse),
    Fail(TransportError),
}

/// Answers requests from a per-URL script after a fixed latency. The last
/// scripted answer for a URL keeps being served.
pub struct ScriptedTransport {
    latency: Duration,
    routes: Mutex<HashMap<String, VecDeque<Scripted>>>,
    requests: Mutex<Vec<FetchRequest>>,
    outcomes: Mutex<Vec<Result<StatusCode, TransportError>>>,
}

impl ScriptedTransport {
    pub fn new(latency: Duration) -> Self {
        Self {
            latency,
            routes: Mutex::new(HashMap::new()),
            requests: Mutex::new(Vec::new()),
            outcomes: Mutex::new(Vec::new()),
        }
    }

    pub fn respond(&self, url: &str, response: FetchResponse) {
        self.push(url, Scripted::Respond(response));
    }

    pub fn fail(&self, url: &str, error: TransportError) {
        self.push(url, Scripted::Fail(error));
    }

    pub fn requests(&self) -> Vec<FetchRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// How each finished request ended, in completion order.
    pub fn outcomes(&self) -> Vec<Result<StatusCode, TransportError>> {
        self.outcomes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn push(&self, url: &str, scripted: Scripted) {
        self.routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(url.to_string())
            .or_default()
            .push_back(scripted);
    }

    fn next(&self, url: &str) -> Option<Scripted> {
        let mut routes = self.routes.lock().unwrap_or_else(PoisonError::into_inner);
        let queue = routes.get_mut(url)?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn fetch(
        &self,
        request: FetchRequest,
        signal: AbortSignal,
    ) -> Result<FetchResponse, TransportError> {
        let scripted = self.next(&request.url);
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request);

        let result = tokio::select! {
            reason = signal.aborted() => Err(TransportError::Aborted(reason)),
            () = tokio::time::sleep(self.latency) => match scripted {
                Some(Scripted::Respond(response)) => Ok(response),
                Some(Scripted::Fail(error)) => Err(error),
                None => Ok(FetchResponse::new(StatusCode::NOT_FOUND, "")),
            },
        };
        self.outcomes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(result.as_ref().map(|response| response.status).map_err(Clone::clone));
        result
    }
}
