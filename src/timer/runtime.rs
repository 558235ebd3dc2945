use tokio::runtime::Handle;
use tokio::time;
use tokio_util::sync::CancellationToken;

use super::ticks::{TickFn, TickHandle, TickPlan, TickScheduler};

/// Runs tick plans as tasks on a tokio runtime.
#[derive(Clone)]
pub struct TokioTickScheduler {
    handle: Handle,
}

impl TokioTickScheduler {
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Scheduler bound to the runtime the caller is running on.
    pub fn current() -> Self {
        Self::new(Handle::current())
    }
}

impl TickScheduler for TokioTickScheduler {
    fn schedule(&self, plan: TickPlan, mut on_tick: TickFn) -> TickHandle {
        let handle = TickHandle::new(CancellationToken::new());
        let token = handle.token();

        self.handle.spawn(async move {
            tokio::select! {
                biased;
                _ = token.cancelled() => return,
                _ = time::sleep(plan.first_delay) => {}
            }

            let mut tick: u32 = 0;
            loop {
                tick = tick.saturating_add(1);
                on_tick(tick);
                if plan.is_last(tick) {
                    break;
                }
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    _ = time::sleep(plan.interval) => {}
                }
            }
        });

        handle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    fn recorder() -> (Arc<Mutex<Vec<(u32, Duration)>>>, time::Instant) {
        (Arc::new(Mutex::new(Vec::new())), time::Instant::now())
    }

    #[tokio::test(start_paused = true)]
    async fn fires_every_tick_on_schedule_then_stops() {
        let scheduler = TokioTickScheduler::current();
        let (seen, origin) = recorder();
        let sink = Arc::clone(&seen);

        scheduler.schedule(
            TickPlan::repeating(Duration::from_millis(100), Duration::from_millis(200), 5),
            Box::new(move |tick| sink.lock().unwrap().push((tick, origin.elapsed()))),
        );

        time::sleep(Duration::from_secs(2)).await;
        let seen = seen.lock().unwrap().clone();
        let ticks: Vec<u32> = seen.iter().map(|(tick, _)| *tick).collect();
        assert_eq!(ticks, vec![1, 2, 3, 4, 5]);
        assert_eq!(seen[0].1, Duration::from_millis(100));
        assert_eq!(seen[4].1, Duration::from_millis(900));
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_stops_pending_ticks() {
        let scheduler = TokioTickScheduler::current();
        let (seen, origin) = recorder();
        let sink = Arc::clone(&seen);

        let handle = scheduler.schedule(
            TickPlan::repeating(Duration::from_millis(100), Duration::from_millis(200), 5),
            Box::new(move |tick| sink.lock().unwrap().push((tick, origin.elapsed()))),
        );

        time::sleep(Duration::from_millis(350)).await;
        handle.cancel();
        time::sleep(Duration::from_secs(2)).await;

        assert_eq!(seen.lock().unwrap().len(), 2);
        assert!(handle.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_before_first_tick_fires_nothing() {
        let scheduler = TokioTickScheduler::current();
        let (seen, origin) = recorder();
        let sink = Arc::clone(&seen);

        let handle = scheduler.schedule(
            TickPlan::once(Duration::from_secs(5)),
            Box::new(move |tick| sink.lock().unwrap().push((tick, origin.elapsed()))),
        );
        handle.cancel();
        time::sleep(Duration::from_secs(10)).await;

        assert!(seen.lock().unwrap().is_empty());
    }
}
