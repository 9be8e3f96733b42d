use std::future::Future;
use std::time::Duration;
use tokio::task::AbortHandle;

/// A cancellable one-shot timer owned by a single engine instance
///
/// When the delay elapses the task is spawned on its own, so cancelling or
/// rescheduling the timer afterwards never aborts work that already started.
/// Dropping the timer cancels it.
#[derive(Debug, Default)]
pub(crate) struct Timer {
    handle: Option<AbortHandle>,
}

impl Timer {
    pub(crate) fn new() -> Self {
        Self { handle: None }
    }

    /// Replace any scheduled run with `task` after `delay`
    pub(crate) fn schedule<F>(&mut self, delay: Duration, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            tokio::spawn(task);
        });
        self.handle = Some(handle.abort_handle());
    }

    /// Returns true if a pending run was cancelled
    pub(crate) fn cancel(&mut self) -> bool {
        match self.handle.take() {
            Some(handle) if !handle.is_finished() => {
                handle.abort();
                true
            }
            _ => false,
        }
    }

    pub(crate) fn is_scheduled(&self) -> bool {
        self.handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// A repeating timer; same ownership rules as [`Timer`]
#[derive(Debug, Default)]
pub(crate) struct IntervalTimer {
    handle: Option<AbortHandle>,
}

impl IntervalTimer {
    /// Run `tick` every `period` until cancelled or until it returns false
    pub(crate) fn start<F, Fut>(&mut self, period: Duration, mut tick: F)
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = bool> + Send + 'static,
    {
        self.cancel();
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // First tick completes immediately
            interval.tick().await;
            loop {
                interval.tick().await;
                if !tick().await {
                    break;
                }
            }
        });
        self.handle = Some(handle.abort_handle());
    }

    pub(crate) fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

impl Drop for IntervalTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_timer_fires_once() {
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = fired.clone();

        let mut timer = Timer::new();
        timer.schedule(Duration::from_millis(50), async move {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert!(timer.is_scheduled());

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(!timer.is_scheduled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reschedule_replaces_pending_run() {
        let fired = Arc::new(AtomicUsize::new(0));

        let mut timer = Timer::new();
        for _ in 0..3 {
            let counter = fired.clone();
            timer.schedule(Duration::from_millis(50), async move {
                counter.fetch_add(1, Ordering::SeqCst);
            });
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels() {
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = fired.clone();

        let mut timer = Timer::new();
        timer.schedule(Duration::from_millis(50), async move {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        drop(timer);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_interval_stops_when_tick_returns_false() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = ticks.clone();

        let mut interval = IntervalTimer::default();
        interval.start(Duration::from_millis(20), move || {
            let counter = counter.clone();
            async move { counter.fetch_add(1, Ordering::SeqCst) + 1 < 3 }
        });

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 3);
    }
}
