use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::ticks::{TickFn, TickHandle, TickPlan, TickScheduler};

struct Job {
    plan: TickPlan,
    scheduled_at: Duration,
    fired: u32,
    token: CancellationToken,
    on_tick: Option<TickFn>,
}

impl Job {
    fn next_due(&self) -> Option<Duration> {
        if self.token.is_cancelled() || self.plan.is_last(self.fired) && self.fired > 0 {
            return None;
        }
        Some(self.scheduled_at + self.plan.due_at(self.fired + 1))
    }
}

#[derive(Default)]
struct ManualClock {
    now: Duration,
    jobs: Vec<Job>,
}

/// A tick scheduler driven by hand: nothing fires until [`advance`] is called.
///
/// Ticks run on the caller's thread in due-time order, so a callback that
/// schedules further work sees it fire within the same `advance` when due.
///
/// [`advance`]: ManualTickScheduler::advance
#[derive(Clone, Default)]
pub struct ManualTickScheduler {
    clock: Arc<Mutex<ManualClock>>,
}

impl ManualTickScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, ManualClock> {
        match self.clock.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn now(&self) -> Duration {
        self.lock().now
    }

    /// Number of sequences that still have ticks to deliver.
    pub fn pending(&self) -> usize {
        self.lock()
            .jobs
            .iter()
            .filter(|job| job.next_due().is_some())
            .count()
    }

    /// Move the clock forward by `by`, firing every tick that falls due.
    pub fn advance(&self, by: Duration) {
        let target = self.lock().now + by;

        loop {
            let next = {
                let mut clock = self.lock();
                let due = clock
                    .jobs
                    .iter()
                    .enumerate()
                    .filter_map(|(index, job)| job.next_due().map(|due| (index, due)))
                    .filter(|(_, due)| *due <= target)
                    .min_by_key(|(index, due)| (*due, *index));

                match due {
                    Some((index, due)) => {
                        clock.now = due;
                        let job = &mut clock.jobs[index];
                        job.fired += 1;
                        job.on_tick.take().map(|callback| (index, job.fired, callback))
                    }
                    None => {
                        clock.now = target;
                        None
                    }
                }
            };

            let Some((index, tick, mut callback)) = next else {
                break;
            };

            callback(tick);
            self.lock().jobs[index].on_tick = Some(callback);
        }

        self.lock().jobs.retain(|job| job.next_due().is_some());
    }
}

impl TickScheduler for ManualTickScheduler {
    fn schedule(&self, plan: TickPlan, on_tick: TickFn) -> TickHandle {
        let token = CancellationToken::new();
        let mut clock = self.lock();
        let scheduled_at = clock.now;
        clock.jobs.push(Job {
            plan,
            scheduled_at,
            fired: 0,
            token: token.clone(),
            on_tick: Some(on_tick),
        });
        TickHandle::new(token)
    }
}
