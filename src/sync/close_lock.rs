//! Page-wide single-closer lock.
//!
//! Dialogs share one backdrop. Only one of them may run its close sequence at
//! a time; the others are turned away until the holder's dialog has settled to
//! hidden. The lock is released when the [`CloseGuard`] drops, so a settle
//! watcher that finishes, gives up, or is cancelled always lets go.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Clone, Default)]
pub struct CloseLock {
    holder: Arc<Mutex<Option<String>>>,
}

#[derive(Debug)]
pub enum CloseAcquire {
    Acquired(CloseGuard),
    /// The region asking already holds the lock.
    Reentrant,
    /// Another region is closing.
    Busy(String),
}

impl CloseLock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn try_acquire(&self, region: &str) -> CloseAcquire {
        let mut holder = lock(&self.holder);
        if let Some(current) = holder.as_deref() {
            return if current == region {
                CloseAcquire::Reentrant
            } else {
                CloseAcquire::Busy(current.to_string())
            };
        }

        *holder = Some(region.to_string());
        CloseAcquire::Acquired(CloseGuard {
            holder: Arc::clone(&self.holder),
            region: region.to_string(),
        })
    }

    pub fn holder(&self) -> Option<String> {
        lock(&self.holder).clone()
    }
}

#[derive(Debug)]
#[must_use = "dropping the guard releases the close lock"]
pub struct CloseGuard {
    holder: Arc<Mutex<Option<String>>>,
    region: String,
}

impl CloseGuard {
    pub fn region(&self) -> &str {
        &self.region
    }
}

impl Drop for CloseGuard {
    fn drop(&mut self) {
        let mut holder = lock(&self.holder);
        if holder.as_deref() == Some(self.region.as_str()) {
            *holder = None;
        }
    }
}

fn lock(holder: &Mutex<Option<String>>) -> MutexGuard<'_, Option<String>> {
    holder.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_second_region_is_rejected_until_release() {
        let lock = CloseLock::new();

        let CloseAcquire::Acquired(guard) = lock.try_acquire("cart") else {
            panic!("first acquire should succeed");
        };
        assert!(matches!(lock.try_acquire("cart"), CloseAcquire::Reentrant));
        assert!(matches!(
            lock.try_acquire("profile"),
            CloseAcquire::Busy(holder) if holder == "cart"
        ));

        drop(guard);
        assert_eq!(lock.holder(), None);
        assert!(matches!(
            lock.try_acquire("profile"),
            CloseAcquire::Acquired(_)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_holder_releases_lock() {
        let lock = CloseLock::new();
        let CloseAcquire::Acquired(guard) = lock.try_acquire("cart") else {
            panic!("first acquire should succeed");
        };

        let task = tokio::spawn(async move {
            let _guard = guard;
            tokio::time::sleep(Duration::from_secs(60)).await;
        });
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(lock.holder().as_deref(), Some("cart"));

        task.abort();
        let _ = task.await;
        assert_eq!(lock.holder(), None);
    }
}
