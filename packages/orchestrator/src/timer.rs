//! Recurring tickers that stop when their handle is dropped.

use std::sync::Weak;
use std::time::Duration;

use tokio::task::AbortHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// Owns a running ticker task. Dropping it aborts the task.
pub struct TimerHandle {
    abort: Option<AbortHandle>,
}

impl TimerHandle {
    /// Releases the handle without aborting, for a ticker that is already
    /// on its way out (it returned `false` from its callback).
    pub fn disarm(mut self) {
        self.abort = None;
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        if let Some(abort) = self.abort.take() {
            abort.abort();
        }
    }
}

/// Spawns a task that calls `on_tick` every `period`, first after one
/// full period.
///
/// The task holds only a weak reference to `target` and ends when the
/// target is gone, when `on_tick` returns `false`, or when the returned
/// handle is dropped.
///
/// # Panics
///
/// Panics if called outside a Tokio runtime.
pub fn spawn_ticker<T, F>(period: Duration, target: Weak<T>, mut on_tick: F) -> TimerHandle
where
    T: Send + Sync + 'static,
    F: FnMut(&T) -> bool + Send + 'static,
{
    let handle = tokio::spawn(async move {
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            let Some(target) = target.upgrade() else {
                break;
            };
            if !on_tick(&target) {
                break;
            }
        }
    });

    TimerHandle {
        abort: Some(handle.abort_handle()),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn ticks_until_callback_stops() {
        let count = Arc::new(AtomicU32::new(0));
        let handle = spawn_ticker(Duration::from_millis(100), Arc::downgrade(&count), |c| {
            c.fetch_add(1, Ordering::SeqCst) + 1 < 3
        });

        tokio::time::sleep(Duration::from_millis(1050)).await;
        assert_eq!(count.load(Ordering::SeqCst), 3);
        handle.disarm();
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_handle_stops_ticks() {
        let count = Arc::new(AtomicU32::new(0));
        let handle = spawn_ticker(Duration::from_millis(100), Arc::downgrade(&count), |c| {
            c.fetch_add(1, Ordering::SeqCst);
            true
        });

        tokio::time::sleep(Duration::from_millis(250)).await;
        drop(handle);
        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn ticker_ends_with_its_target() {
        let count = Arc::new(AtomicU32::new(0));
        let seen = Arc::new(AtomicU32::new(0));
        let seen_in_tick = Arc::clone(&seen);
        let _handle = spawn_ticker(Duration::from_millis(100), Arc::downgrade(&count), move |_| {
            seen_in_tick.fetch_add(1, Ordering::SeqCst);
            true
        });

        tokio::time::sleep(Duration::from_millis(150)).await;
        drop(count);
        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }
}
