//! Per-controller cancellation of in-flight loads.
//!
//! Every controller keeps at most one live request token. Minting a new one
//! aborts the previous token with the controller's own reason, which the
//! transport-error hook later recognises and ignores.

use std::sync::{Arc, OnceLock};

use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Reason used when a controller aborts its own request.
pub const OWN_ABORT_REASON: &str = "Aborted by user";

/// Cancellation handle attached to one outgoing request.
///
/// Clones observe the same token. The first abort wins: later aborts neither
/// fail nor overwrite the recorded reason.
#[derive(Debug, Clone)]
pub struct AbortSignal {
    id: u64,
    token: CancellationToken,
    reason: Arc<OnceLock<String>>,
}

impl AbortSignal {
    fn new(id: u64) -> Self {
        Self {
            id,
            token: CancellationToken::new(),
            reason: Arc::new(OnceLock::new()),
        }
    }

    /// A signal no controller tracks, used for requests from unbound triggers.
    pub fn detached() -> Self {
        Self::new(0)
    }

    pub const fn id(&self) -> u64 {
        self.id
    }

    pub fn is_aborted(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn reason(&self) -> Option<&str> {
        self.reason.get().map(String::as_str)
    }

    /// Abort with `reason`. Returns `false` if the signal was already aborted.
    pub fn abort(&self, reason: &str) -> bool {
        if self.token.is_cancelled() {
            return false;
        }
        let _ = self.reason.set(reason.to_string());
        self.token.cancel();
        true
    }

    /// Resolves with the abort reason once the signal is aborted.
    pub async fn aborted(&self) -> String {
        self.token.cancelled().await;
        self.reason().unwrap_or(OWN_ABORT_REASON).to_string()
    }
}

#[derive(Debug, Default)]
pub struct CancellationManager {
    active: Option<AbortSignal>,
    next_id: u64,
}

impl CancellationManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint a token for a new request, superseding the previous one.
    pub fn begin_request(&mut self) -> AbortSignal {
        if let Some(previous) = self.active.take()
            && previous.abort(OWN_ABORT_REASON)
        {
            debug!(request = previous.id(), "superseded in-flight request");
        }

        self.next_id += 1;
        let signal = AbortSignal::new(self.next_id);
        self.active = Some(signal.clone());
        signal
    }

    /// Abort the active request, if any. Returns whether anything was aborted.
    pub fn cancel_active(&mut self, reason: &str) -> bool {
        self.active
            .take()
            .is_some_and(|signal| signal.abort(reason))
    }

    /// Forget the active token without aborting it, once its response arrived.
    ///
    /// Only clears when `id` is still the active request; a late response of a
    /// superseded request leaves the newer token alone.
    pub fn finish(&mut self, id: u64) {
        if self.active.as_ref().is_some_and(|signal| signal.id() == id) {
            self.active = None;
        }
    }

    pub const fn active(&self) -> Option<&AbortSignal> {
        self.active.as_ref()
    }

    pub const fn has_active(&self) -> bool {
        self.active.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_new_request_supersedes_previous() {
        let mut manager = CancellationManager::new();

        let first = manager.begin_request();
        let second = manager.begin_request();

        assert!(first.is_aborted());
        assert_eq!(first.reason(), Some(OWN_ABORT_REASON));
        assert!(!second.is_aborted());
        assert_eq!(manager.active().map(AbortSignal::id), Some(second.id()));
    }

    #[test]
    fn test_double_abort_keeps_first_reason() {
        let signal = AbortSignal::detached();

        assert!(signal.abort("navigated away"));
        assert!(!signal.abort(OWN_ABORT_REASON));
        assert_eq!(signal.reason(), Some("navigated away"));
    }

    #[test]
    fn test_cancel_active_is_idempotent() {
        let mut manager = CancellationManager::new();
        let signal = manager.begin_request();

        assert!(manager.cancel_active(OWN_ABORT_REASON));
        assert!(!manager.cancel_active(OWN_ABORT_REASON));
        assert!(signal.is_aborted());
        assert!(!manager.has_active());
    }

    #[test]
    fn test_finish_ignores_stale_request() {
        let mut manager = CancellationManager::new();
        let stale = manager.begin_request();
        let current = manager.begin_request();

        manager.finish(stale.id());
        assert!(manager.has_active());

        manager.finish(current.id());
        assert!(!manager.has_active());
        assert!(!current.is_aborted());
    }

    #[tokio::test(start_paused = true)]
    async fn test_aborted_resolves_with_reason() {
        let signal = AbortSignal::detached();
        let waiter = signal.clone();

        let handle = tokio::spawn(async move { waiter.aborted().await });
        tokio::time::sleep(Duration::from_millis(10)).await;
        signal.abort("closed");

        assert_eq!(handle.await.unwrap(), "closed");
    }
}
