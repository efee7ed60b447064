//! Repeating background task with deferred, cooperative cancellation.

use anyhow::Result;
use futures::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

/// Runs a callback, sleeps for `delay`, and repeats until cleared.
///
/// The delay is measured from the end of each invocation, so the period drifts
/// with the callback's duration. Errors and panics from the callback are
/// logged and the loop carries on.
///
/// Must be created from within a tokio runtime.
pub struct AsyncInterval {
    active: Arc<AtomicBool>,
}

impl AsyncInterval {
    /// Starts the loop immediately; the first invocation does not wait.
    pub fn new<F, Fut>(mut callback: F, delay: Duration) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        let active = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&active);

        tokio::spawn(async move {
            while flag.load(Ordering::SeqCst) {
                match AssertUnwindSafe(callback()).catch_unwind().await {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => warn!(error = %e, "Interval callback failed"),
                    Err(_) => warn!("Interval callback panicked"),
                }
                tokio::time::sleep(delay).await;
            }
            debug!("Interval loop stopped");
        });

        Self { active }
    }

    /// Marks the loop inactive once `delay` has elapsed.
    ///
    /// The flag is only read at the top of each iteration, so an invocation or
    /// sleep already in progress when it flips still runs to completion.
    pub fn clear_interval(&self, delay: Duration) {
        let flag = Arc::clone(&self.active);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            flag.store(false, Ordering::SeqCst);
            debug!("Interval cleared");
        });
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::sync::atomic::AtomicUsize;
    use tokio::time::sleep;

    fn counting_interval(delay: Duration, fail: bool) -> (AsyncInterval, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let interval = AsyncInterval::new(
            move || {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    if fail {
                        Err(anyhow!("callback always fails"))
                    } else {
                        Ok(())
                    }
                }
            },
            delay,
        );
        (interval, calls)
    }

    #[tokio::test]
    async fn test_failing_callback_keeps_running() {
        let (interval, calls) = counting_interval(Duration::from_millis(10), true);

        sleep(Duration::from_millis(150)).await;

        assert!(calls.load(Ordering::SeqCst) >= 3);
        assert!(interval.is_active());
    }

    #[tokio::test]
    async fn test_panicking_callback_keeps_running() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let _interval = AsyncInterval::new(
            move || {
                let counter = Arc::clone(&counter);
                async move {
                    let call = counter.fetch_add(1, Ordering::SeqCst);
                    if call < usize::MAX {
                        panic!("callback panics on call {call}");
                    }
                    Ok(())
                }
            },
            Duration::from_millis(10),
        );

        sleep(Duration::from_millis(150)).await;

        assert!(calls.load(Ordering::SeqCst) >= 3);
    }

    #[tokio::test]
    async fn test_clear_interval_stops_after_at_most_one_more_iteration() {
        let (interval, calls) = counting_interval(Duration::from_millis(10), false);
        sleep(Duration::from_millis(50)).await;

        interval.clear_interval(Duration::ZERO);
        let at_clear = calls.load(Ordering::SeqCst);

        sleep(Duration::from_millis(60)).await;
        let settled = calls.load(Ordering::SeqCst);
        assert!(settled <= at_clear + 1);
        assert!(!interval.is_active());

        sleep(Duration::from_millis(60)).await;
        assert_eq!(calls.load(Ordering::SeqCst), settled);
    }

    #[tokio::test]
    async fn test_clear_interval_is_deferred() {
        let (interval, calls) = counting_interval(Duration::from_millis(10), false);

        interval.clear_interval(Duration::from_millis(80));
        sleep(Duration::from_millis(20)).await;
        assert!(interval.is_active());
        let during_grace = calls.load(Ordering::SeqCst);

        sleep(Duration::from_millis(40)).await;
        assert!(calls.load(Ordering::SeqCst) > during_grace);

        sleep(Duration::from_millis(100)).await;
        assert!(!interval.is_active());
    }
}
