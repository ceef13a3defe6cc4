//! Cooperative cancellation for monitor loops.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

/// A cancellation token for cooperative shutdown.
///
/// Stopping is a signal, not a forced kill: the owner of a loop checks the
/// token at each iteration boundary and releases its own resources before
/// exiting. Cloned tokens share the same flag.
#[derive(Debug, Clone)]
pub struct CancellationToken {
    inner: Arc<CancellationState>,
}

#[derive(Debug)]
struct CancellationState {
    cancelled: AtomicBool,
    condvar: Condvar,
    mutex: Mutex<()>,
}

impl CancellationToken {
    /// Create a new cancellation token.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(CancellationState {
                cancelled: AtomicBool::new(false),
                condvar: Condvar::new(),
                mutex: Mutex::new(()),
            }),
        }
    }

    /// Check if cancellation has been requested.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Acquire)
    }

    /// Request cancellation, waking any thread blocked in [`wait_timeout`](Self::wait_timeout).
    pub fn cancel(&self) {
        // Hold the lock while setting the flag to avoid a lost wakeup.
        let _guard = self.inner.mutex.lock();
        if !self.inner.cancelled.swap(true, Ordering::Release) {
            self.inner.condvar.notify_all();
        }
    }

    /// Sleep for up to `timeout`, returning early on cancellation.
    ///
    /// Returns `true` if the token is cancelled.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let mut guard = self.inner.mutex.lock();
        // A timeout past the end of `Instant` waits for cancellation alone.
        let Some(deadline) = Instant::now().checked_add(timeout) else {
            while !self.is_cancelled() {
                self.inner.condvar.wait(&mut guard);
            }
            return true;
        };
        while !self.is_cancelled() {
            if self
                .inner
                .condvar
                .wait_until(&mut guard, deadline)
                .timed_out()
            {
                break;
            }
        }
        self.is_cancelled()
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_is_shared_between_clones() {
        let token = CancellationToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }

    #[test]
    fn test_wait_timeout_elapses() {
        let token = CancellationToken::new();
        let start = Instant::now();
        assert!(!token.wait_timeout(Duration::from_millis(20)));
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn test_cancel_wakes_waiter() {
        let token = CancellationToken::new();
        let waiter = token.clone();
        let handle = std::thread::spawn(move || {
            let start = Instant::now();
            let cancelled = waiter.wait_timeout(Duration::from_secs(30));
            (cancelled, start.elapsed())
        });

        std::thread::sleep(Duration::from_millis(20));
        token.cancel();

        let (cancelled, elapsed) = handle.join().unwrap();
        assert!(cancelled);
        assert!(elapsed < Duration::from_secs(30));
    }

    #[test]
    fn test_unbounded_wait_on_cancelled_token() {
        let token = CancellationToken::new();
        token.cancel();
        assert!(token.wait_timeout(Duration::MAX));
    }

    #[test]
    fn test_cancel_wakes_unbounded_waiter() {
        let token = CancellationToken::new();
        let waiter = token.clone();
        let handle = std::thread::spawn(move || waiter.wait_timeout(Duration::MAX));

        std::thread::sleep(Duration::from_millis(20));
        token.cancel();

        assert!(handle.join().unwrap());
    }
}
