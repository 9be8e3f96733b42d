use crate::timer::Timer;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Upper bound for a single backoff delay
pub const MAX_RETRY_DELAY: Duration = Duration::from_secs(300);

/// Exponential backoff for the save currently being retried
///
/// The nth retry (1-based) waits `base × multiplier^n`. The attempt counter
/// resets on success, on a fresh edit, and when connectivity returns.
#[derive(Debug)]
pub struct RetryScheduler {
    base: Duration,
    multiplier: f64,
    max_retries: u32,
    attempt: u32,
    timer: Timer,
}

impl RetryScheduler {
    /// Multipliers that are negative or not finite fall back to a flat 1.0
    pub fn new(base: Duration, multiplier: f64, max_retries: u32) -> Self {
        let multiplier = if multiplier.is_finite() && multiplier >= 0.0 {
            multiplier
        } else {
            warn!(multiplier, "Invalid retry multiplier, using constant backoff");
            1.0
        };
        Self {
            base,
            multiplier,
            max_retries,
            attempt: 0,
            timer: Timer::new(),
        }
    }

    /// Retries scheduled since the last reset
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn is_exhausted(&self) -> bool {
        self.attempt >= self.max_retries
    }

    /// Delay before the given 1-based retry, capped at [`MAX_RETRY_DELAY`]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let secs = self.base.as_secs_f64() * self.multiplier.powi(exponent);
        Duration::try_from_secs_f64(secs)
            .map_or(MAX_RETRY_DELAY, |delay| delay.min(MAX_RETRY_DELAY))
    }

    /// Claim the next retry slot, returning its delay, or `None` once the
    /// budget is spent
    pub fn next_delay(&mut self) -> Option<Duration> {
        if self.is_exhausted() {
            return None;
        }
        self.attempt += 1;
        Some(self.delay_for(self.attempt))
    }

    /// Schedule the next retry; returns the attempt number and delay, or
    /// `None` if the budget is spent
    pub(crate) fn schedule<F>(&mut self, task: F) -> Option<(u32, Duration)>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let delay = self.next_delay()?;
        self.timer.schedule(delay, task);
        Some((self.attempt, delay))
    }

    /// Cancel any scheduled retry without touching the counter
    pub fn cancel(&mut self) -> bool {
        self.timer.cancel()
    }

    /// Cancel and start counting from zero again
    pub fn reset(&mut self) {
        self.timer.cancel();
        self.attempt = 0;
    }

    pub fn is_scheduled(&self) -> bool {
        self.timer.is_scheduled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_delays() {
        let mut retry = RetryScheduler::new(Duration::from_millis(1000), 1.5, 3);

        assert_eq!(retry.next_delay(), Some(Duration::from_millis(1500)));
        assert_eq!(retry.next_delay(), Some(Duration::from_millis(2250)));
        assert_eq!(retry.next_delay(), Some(Duration::from_millis(3375)));
        assert_eq!(retry.next_delay(), None);
        assert!(retry.is_exhausted());
        assert_eq!(retry.attempt(), 3);
    }

    #[test]
    fn test_reset_restores_budget() {
        let mut retry = RetryScheduler::new(Duration::from_millis(100), 2.0, 1);
        assert!(retry.next_delay().is_some());
        assert!(retry.next_delay().is_none());

        retry.reset();
        assert_eq!(retry.attempt(), 0);
        assert_eq!(retry.next_delay(), Some(Duration::from_millis(200)));
    }

    #[test]
    fn test_bad_multiplier_falls_back_to_constant_delay() {
        for multiplier in [-1.5, f64::NAN, f64::INFINITY] {
            let mut retry = RetryScheduler::new(Duration::from_millis(100), multiplier, 2);
            assert_eq!(retry.next_delay(), Some(Duration::from_millis(100)));
            assert_eq!(retry.next_delay(), Some(Duration::from_millis(100)));
        }
    }

    #[test]
    fn test_delay_is_capped() {
        let retry = RetryScheduler::new(Duration::from_secs(1), 1e300, 5);
        assert_eq!(retry.delay_for(3), MAX_RETRY_DELAY);

        let retry = RetryScheduler::new(Duration::from_secs(10), 10.0, 5);
        assert_eq!(retry.delay_for(1), Duration::from_secs(100));
        assert_eq!(retry.delay_for(2), MAX_RETRY_DELAY);
    }

    #[test]
    fn test_zero_budget() {
        let mut retry = RetryScheduler::new(Duration::from_millis(100), 1.5, 0);
        assert!(retry.is_exhausted());
        assert_eq!(retry.next_delay(), None);
    }
}
