//! Trailing-edge debouncing for mutation batches.
//!
//! Debouncing keeps a watcher from re-querying the tree once per mutation
//! batch when a page renders in bursts (virtualized lists, hydration).

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;

use super::WatchError;

/// The single pending timer of a debouncer.
///
/// `generation` increases on every schedule and cancel; a timer only fires
/// if its generation is still current when it wakes.
#[derive(Debug, Default)]
struct Slot {
    generation: u64,
    pending: Option<JoinHandle<()>>,
}

/// Collapses bursts of calls into one trailing call with the latest value.
///
/// Each [`schedule`](Self::schedule) replaces the pending timer. The callback
/// always runs on a freshly spawned task, never inside `schedule`, even with
/// a zero delay.
pub struct Debouncer<T> {
    /// How long the input must stay quiet before the callback fires.
    delay: Duration,
    callback: Arc<dyn Fn(T) + Send + Sync>,
    slot: Arc<Mutex<Slot>>,
}

impl<T: Send + 'static> Debouncer<T> {
    pub fn new(delay: Duration, callback: impl Fn(T) + Send + Sync + 'static) -> Self {
        Self {
            delay,
            callback: Arc::new(callback),
            slot: Arc::new(Mutex::new(Slot::default())),
        }
    }

    /// Schedule a call with `value`, replacing any pending one.
    pub fn schedule(&self, value: T) -> Result<(), WatchError> {
        let handle = tokio::runtime::Handle::try_current().map_err(|_| WatchError::NoRuntime {
            operation: "debounce scheduling",
        })?;

        let mut slot = self.slot.lock();
        if let Some(pending) = slot.pending.take() {
            pending.abort();
        }
        slot.generation += 1;

        let generation = slot.generation;
        let delay = self.delay;
        let callback = Arc::clone(&self.callback);
        let shared = Arc::clone(&self.slot);

        // The slot stays locked until the handle is stored, so the task
        // cannot observe its own slot before it exists.
        slot.pending = Some(handle.spawn(async move {
            if delay.is_zero() {
                tokio::task::yield_now().await;
            } else {
                tokio::time::sleep(delay).await;
            }

            {
                let mut slot = shared.lock();
                if slot.generation != generation {
                    return;
                }
                slot.pending = None;
            }
            callback(value);
        }));
        Ok(())
    }

    /// Drop the pending call, if any. Returns whether one was pending.
    pub fn cancel(&self) -> bool {
        let mut slot = self.slot.lock();
        slot.generation += 1;
        match slot.pending.take() {
            Some(pending) => {
                pending.abort();
                true
            }
            None => false,
        }
    }

    /// Check if a call is waiting to fire.
    pub fn has_pending(&self) -> bool {
        self.slot.lock().pending.is_some()
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        let mut slot = self.slot.lock();
        slot.generation += 1;
        if let Some(pending) = slot.pending.take() {
            pending.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::sleep;

    fn recorder() -> (Arc<Mutex<Vec<u32>>>, impl Fn(u32) + Send + Sync + 'static) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&calls);
        (calls, move |value| sink.lock().push(value))
    }

    #[tokio::test(start_paused = true)]
    async fn test_debouncer_basic() {
        let (calls, callback) = recorder();
        let debouncer = Debouncer::new(Duration::from_millis(50), callback);

        debouncer.schedule(1).unwrap();
        assert!(debouncer.has_pending());

        // Immediately after, nothing should have fired
        sleep(Duration::from_millis(30)).await;
        assert!(calls.lock().is_empty());

        // Wait for debounce period
        sleep(Duration::from_millis(30)).await;
        assert_eq!(*calls.lock(), vec![1]);
        assert!(!debouncer.has_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_debouncer_resets_on_new_call() {
        let (calls, callback) = recorder();
        let debouncer = Debouncer::new(Duration::from_millis(50), callback);

        debouncer.schedule(1).unwrap();
        sleep(Duration::from_millis(30)).await;

        // Schedule again - should reset the timer and replace the value
        debouncer.schedule(2).unwrap();
        sleep(Duration::from_millis(30)).await;

        // 60ms from first, only 30ms from second
        assert!(calls.lock().is_empty());

        sleep(Duration::from_millis(30)).await;
        assert_eq!(*calls.lock(), vec![2]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_debouncer_cancel() {
        let (calls, callback) = recorder();
        let debouncer = Debouncer::new(Duration::from_millis(50), callback);

        debouncer.schedule(1).unwrap();
        assert!(debouncer.cancel());
        assert!(!debouncer.cancel());
        assert!(!debouncer.has_pending());

        sleep(Duration::from_millis(100)).await;
        assert!(calls.lock().is_empty());
    }

    #[tokio::test]
    async fn test_zero_delay_still_defers() {
        let (calls, callback) = recorder();
        let debouncer = Debouncer::new(Duration::ZERO, callback);

        debouncer.schedule(7).unwrap();
        assert!(calls.lock().is_empty(), "must not fire inside schedule");

        for _ in 0..4 {
            tokio::task::yield_now().await;
        }
        assert_eq!(*calls.lock(), vec![7]);
    }

    #[test]
    fn test_schedule_without_runtime() {
        let (_, callback) = recorder();
        let debouncer = Debouncer::new(Duration::from_millis(10), callback);
        assert!(matches!(
            debouncer.schedule(1),
            Err(WatchError::NoRuntime { .. })
        ));
    }
}
