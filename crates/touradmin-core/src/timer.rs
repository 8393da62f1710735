//! Fixed-period background ticker driving the session countdown.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::debug;

/// Calls `on_tick` once per period on a tokio task until the callback
/// returns `false` or the timer is dropped.
pub struct CountdownTimer {
    handle: JoinHandle<()>,
}

impl CountdownTimer {
    pub const DEFAULT_PERIOD: Duration = Duration::from_secs(1);

    /// Must be called from within a tokio runtime.
    pub fn spawn<F>(period: Duration, mut on_tick: F) -> Self
    where
        F: FnMut() -> bool + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if !on_tick() {
                    debug!("Countdown timer stopped by its receiver");
                    break;
                }
            }
        });
        Self { handle }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for CountdownTimer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_ticks_every_period_until_dropped() {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = count.clone();
        let timer = CountdownTimer::spawn(Duration::from_secs(1), move || {
            seen.fetch_add(1, Ordering::SeqCst);
            true
        });

        tokio::time::sleep(Duration::from_millis(3_500)).await;
        let ticks = count.load(Ordering::SeqCst);
        assert_eq!(ticks, 3);

        drop(timer);
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(count.load(Ordering::SeqCst), ticks);
    }

    #[tokio::test(start_paused = true)]
    async fn test_callback_can_stop_the_timer() {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = count.clone();
        let timer = CountdownTimer::spawn(Duration::from_secs(1), move || {
            seen.fetch_add(1, Ordering::SeqCst) < 1
        });

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);
        assert!(timer.is_finished());
    }
}
