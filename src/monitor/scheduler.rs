//! Fixed-interval task runner.
//!
//! The task is awaited inside the loop, so a slow tick delays the next one
//! instead of overlapping it.

use std::future::Future;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Handle to a task spawned with [`spawn_periodic`].
///
/// Dropping the handle also stops the loop, after any tick in progress.
#[derive(Debug)]
pub struct PeriodicTask {
    name: &'static str,
    shutdown_tx: mpsc::Sender<()>,
    handle: JoinHandle<()>,
}

impl PeriodicTask {
    /// Task name used in logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Whether the loop has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Signals the loop to stop and waits for it to exit.
    ///
    /// A tick already running is allowed to finish.
    pub async fn stop(self) {
        let _ = self.shutdown_tx.send(()).await;
        if let Err(e) = self.handle.await {
            tracing::warn!(task = self.name, error = %e, "periodic task ended abnormally");
        }
    }
}

/// Runs `task` every `period` until the returned handle is stopped.
///
/// The first tick fires immediately. Ticks missed while a slow task was
/// running are not replayed; the schedule restarts from the end of the slow
/// tick.
pub fn spawn_periodic<F, Fut>(name: &'static str, period: Duration, mut task: F) -> PeriodicTask
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);

    let handle = tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tracing::debug!(task = name, period_ms = period.as_millis(), "periodic task started");

        loop {
            tokio::select! {
                biased;
                _ = shutdown_rx.recv() => break,
                _ = interval.tick() => task().await,
            }
        }

        tracing::debug!(task = name, "periodic task stopped");
    });

    PeriodicTask {
        name,
        shutdown_tx,
        handle,
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_task(counter: &Arc<AtomicUsize>) -> impl FnMut() -> std::future::Ready<()> + Send + 'static {
        let counter = Arc::clone(counter);
        move || {
            counter.fetch_add(1, Ordering::SeqCst);
            std::future::ready(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_once_per_period() {
        let counter = Arc::new(AtomicUsize::new(0));
        let task = spawn_periodic("test", Duration::from_secs(5), counting_task(&counter));

        // ticks at t=0, 5, 10
        tokio::time::sleep(Duration::from_secs(11)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 3);

        task.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn stop_ends_the_loop() {
        let counter = Arc::new(AtomicUsize::new(0));
        let task = spawn_periodic("test", Duration::from_secs(1), counting_task(&counter));
        tokio::time::sleep(Duration::from_millis(1500)).await;
        task.stop().await;

        let after_stop = counter.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(counter.load(Ordering::SeqCst), after_stop);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_ticks_never_overlap() {
        let running = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));
        let ticks = Arc::new(AtomicUsize::new(0));

        let task = {
            let running = Arc::clone(&running);
            let max_seen = Arc::clone(&max_seen);
            let ticks = Arc::clone(&ticks);
            spawn_periodic("slow", Duration::from_secs(1), move || {
                let running = Arc::clone(&running);
                let max_seen = Arc::clone(&max_seen);
                let ticks = Arc::clone(&ticks);
                async move {
                    let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                    max_seen.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_secs(3)).await;
                    running.fetch_sub(1, Ordering::SeqCst);
                    ticks.fetch_add(1, Ordering::SeqCst);
                }
            })
        };

        tokio::time::sleep(Duration::from_secs(20)).await;
        task.stop().await;

        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
        // a 3s task on a 1s period completes far fewer than 20 ticks
        let completed = ticks.load(Ordering::SeqCst);
        assert!((4..=7).contains(&completed), "completed {completed}");
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_handle_stops_the_loop() {
        let counter = Arc::new(AtomicUsize::new(0));
        let task = spawn_periodic("dropped", Duration::from_secs(1), counting_task(&counter));
        tokio::task::yield_now().await;
        drop(task);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(counter.load(Ordering::SeqCst) <= 1);
    }
}
