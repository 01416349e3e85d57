//! Idempotent teardown handles.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tokio::task::AbortHandle;
use tokio_util::sync::CancellationToken;

use super::WatchError;

struct CleanupInner {
    done: AtomicBool,
    action: Box<dyn Fn() + Send + Sync>,
    /// Lifecycle subscriptions to abort once the cleanup has run.
    bindings: Mutex<Vec<AbortHandle>>,
}

/// Stops a watch (or a whole group) exactly once.
///
/// Clones share state: whichever clone runs first performs the teardown and
/// every later call is a no-op. Dropping a `Cleanup` leaves the watch running.
#[derive(Clone)]
pub struct Cleanup {
    inner: Arc<CleanupInner>,
}

impl Cleanup {
    pub fn new(action: impl Fn() + Send + Sync + 'static) -> Self {
        Self {
            inner: Arc::new(CleanupInner {
                done: AtomicBool::new(false),
                action: Box::new(action),
                bindings: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Run the teardown. Returns `true` only for the call that performed it.
    pub fn cleanup(&self) -> bool {
        if self.inner.done.swap(true, Ordering::SeqCst) {
            return false;
        }
        (self.inner.action)();

        let bindings = std::mem::take(&mut *self.inner.bindings.lock());
        for binding in bindings {
            binding.abort();
        }
        true
    }

    pub fn is_done(&self) -> bool {
        self.inner.done.load(Ordering::SeqCst)
    }

    /// Run this cleanup when the host lifecycle `token` is cancelled.
    ///
    /// The subscription is a single spawned task; an explicit
    /// [`cleanup`](Self::cleanup) aborts it. Binding an already finished
    /// cleanup does nothing.
    pub fn bind_to(&self, token: &CancellationToken) -> Result<(), WatchError> {
        let handle = tokio::runtime::Handle::try_current().map_err(|_| WatchError::NoRuntime {
            operation: "lifecycle binding",
        })?;
        if self.is_done() {
            return Ok(());
        }

        let token = token.clone();
        let cleanup = self.clone();
        let task = handle.spawn(async move {
            token.cancelled().await;
            crate::debug_event!("cleanup", "lifecycle", "host token cancelled");
            cleanup.cleanup();
        });

        let mut bindings = self.inner.bindings.lock();
        if self.is_done() {
            task.abort();
        } else {
            bindings.push(task.abort_handle());
        }
        Ok(())
    }
}

impl std::fmt::Debug for Cleanup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cleanup")
            .field("done", &self.is_done())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counted() -> (Arc<AtomicUsize>, Cleanup) {
        let runs = Arc::new(AtomicUsize::new(0));
        let sink = Arc::clone(&runs);
        let cleanup = Cleanup::new(move || {
            sink.fetch_add(1, Ordering::SeqCst);
        });
        (runs, cleanup)
    }

    #[test]
    fn test_cleanup_runs_once_across_clones() {
        let (runs, cleanup) = counted();
        let other = cleanup.clone();

        assert!(cleanup.cleanup());
        assert!(!other.cleanup());
        assert!(!cleanup.cleanup());
        assert!(other.is_done());
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_bind_without_runtime() {
        let (_, cleanup) = counted();
        let token = CancellationToken::new();
        assert!(matches!(
            cleanup.bind_to(&token),
            Err(WatchError::NoRuntime { .. })
        ));
    }

    #[tokio::test]
    async fn test_token_cancellation_runs_cleanup() {
        let (runs, cleanup) = counted();
        let token = CancellationToken::new();
        cleanup.bind_to(&token).unwrap();

        token.cancel();
        for _ in 0..4 {
            tokio::task::yield_now().await;
        }
        assert!(cleanup.is_done());
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_explicit_cleanup_detaches_binding() {
        let (runs, cleanup) = counted();
        let token = CancellationToken::new();
        cleanup.bind_to(&token).unwrap();

        cleanup.cleanup();
        token.cancel();
        tokio::task::yield_now().await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert!(cleanup.inner.bindings.lock().is_empty());
    }
}
