//! Bounded polling.
//!
//! Some document changes, like a region being swapped by an out-of-band update
//! or a dialog settling to hidden after its animation, have no completion
//! callback. These helpers re-check a "still pending" predicate until it clears
//! or the attempt budget runs out. Running out is a normal outcome and is
//! reported as `false`, never as an error.

use std::time::Duration;

use tokio::sync::watch;
use tokio::time::sleep;

pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(100);
pub const DEFAULT_MAX_ATTEMPTS: u32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollOptions {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl PollOptions {
    pub const fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts,
        }
    }
}

impl Default for PollOptions {
    fn default() -> Self {
        Self::new(DEFAULT_INTERVAL, DEFAULT_MAX_ATTEMPTS)
    }
}

/// Wait until `still_pending` reports `false`.
///
/// The predicate is evaluated at most `max_attempts` times with a sleep of
/// `interval` after every pending evaluation. Returns `true` as soon as the
/// condition clears, `false` once the budget is spent.
pub async fn wait_until<F>(mut still_pending: F, options: PollOptions) -> bool
where
    F: FnMut() -> bool,
{
    for _ in 0..options.max_attempts {
        if !still_pending() {
            return true;
        }
        sleep(options.interval).await;
    }
    false
}

/// Like [`wait_until`], but also re-evaluates whenever `changes` publishes.
///
/// Only interval expiries count against the budget, so a burst of unrelated
/// mutations cannot exhaust it early. If the sender goes away the wait
/// degrades to plain interval polling.
pub async fn wait_until_signalled<F>(
    mut still_pending: F,
    mut changes: watch::Receiver<u64>,
    options: PollOptions,
) -> bool
where
    F: FnMut() -> bool,
{
    let mut expired = 0;
    let mut signalled = true;

    while expired < options.max_attempts {
        if !still_pending() {
            return true;
        }

        if signalled {
            tokio::select! {
                changed = changes.changed() => {
                    if changed.is_err() {
                        signalled = false;
                    }
                }
                () = sleep(options.interval) => expired += 1,
            }
        } else {
            sleep(options.interval).await;
            expired += 1;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn test_wait_until_exhausts_after_max_attempts() {
        let calls = Cell::new(0u32);
        let started = Instant::now();

        let cleared = wait_until(
            || {
                calls.set(calls.get() + 1);
                true
            },
            PollOptions::default(),
        )
        .await;

        assert!(!cleared);
        assert_eq!(calls.get(), 20);
        assert!(started.elapsed() >= Duration::from_millis(2000));

        // Nothing keeps polling once the budget is spent.
        sleep(Duration::from_secs(5)).await;
        assert_eq!(calls.get(), 20);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_until_returns_once_condition_clears() {
        let calls = Cell::new(0u32);

        let cleared = wait_until(
            || {
                calls.set(calls.get() + 1);
                calls.get() < 3
            },
            PollOptions::new(Duration::from_millis(50), 20),
        )
        .await;

        assert!(cleared);
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_until_with_zero_budget_never_evaluates() {
        let calls = Cell::new(0u32);

        let cleared = wait_until(
            || {
                calls.set(calls.get() + 1);
                false
            },
            PollOptions::new(Duration::from_millis(50), 0),
        )
        .await;

        assert!(!cleared);
        assert_eq!(calls.get(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_signalled_wait_wakes_on_change() {
        let (tx, rx) = watch::channel(0u64);
        let pending = Arc::new(AtomicBool::new(true));
        let started = Instant::now();

        let flag = Arc::clone(&pending);
        tokio::spawn(async move {
            sleep(Duration::from_millis(10)).await;
            flag.store(false, Ordering::SeqCst);
            tx.send_modify(|revision| *revision += 1);
        });

        let cleared = wait_until_signalled(
            || pending.load(Ordering::SeqCst),
            rx,
            PollOptions::new(Duration::from_millis(100), 20),
        )
        .await;

        assert!(cleared);
        assert!(started.elapsed() < Duration::from_millis(100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_signalled_wait_falls_back_when_sender_dropped() {
        let (tx, rx) = watch::channel(0u64);
        drop(tx);
        let calls = Cell::new(0u32);

        let cleared = wait_until_signalled(
            || {
                calls.set(calls.get() + 1);
                true
            },
            rx,
            PollOptions::new(Duration::from_millis(50), 4),
        )
        .await;

        // One extra evaluation when the closed channel is noticed.
        assert!(!cleared);
        assert_eq!(calls.get(), 5);
    }
}
