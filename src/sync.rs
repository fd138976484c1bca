//! Synchronization primitives shared by the modal controllers.
//!
//! - [`poll`] - bounded polling for document changes without a completion callback
//! - [`cancel`] - one outstanding request token per controller
//! - [`close_lock`] - page-wide single-closer lock

pub mod cancel;
pub mod close_lock;
pub mod poll;

pub use cancel::{AbortSignal, CancellationManager, OWN_ABORT_REASON};
pub use close_lock::{CloseAcquire, CloseGuard, CloseLock};
pub use poll::{PollOptions, wait_until, wait_until_signalled};
