use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, Utc};

use crate::clock::Clock;
use crate::timer::{TickHandle, TickPlan, TickScheduler};

const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info, log_warn};

pub const WAKE_POLL_INTERVAL: Duration = Duration::from_secs(30);
/// A gap between polls longer than this means the machine was asleep.
pub const WAKE_GAP_THRESHOLD: Duration = Duration::from_secs(65);

pub type WakeListener = Arc<dyn Fn(DateTime<Utc>) -> Result<()> + Send + Sync>;

struct WakeState {
    last_poll: Option<DateTime<Utc>>,
    last_wake: Option<DateTime<Utc>>,
    handle: Option<TickHandle>,
}

/// Detects system wake by watching for gaps in a periodic wall-clock poll.
///
/// Timers do not fire while the machine sleeps, so the first poll after
/// waking sees far more wall-clock time elapsed than the poll interval.
pub struct SleepWakeMonitor {
    clock: Arc<dyn Clock>,
    ticks: Arc<dyn TickScheduler>,
    listeners: Mutex<Vec<(String, WakeListener)>>,
    state: Mutex<WakeState>,
}

impl SleepWakeMonitor {
    pub fn new(clock: Arc<dyn Clock>, ticks: Arc<dyn TickScheduler>) -> Arc<Self> {
        Arc::new(Self {
            clock,
            ticks,
            listeners: Mutex::new(Vec::new()),
            state: Mutex::new(WakeState {
                last_poll: None,
                last_wake: None,
                handle: None,
            }),
        })
    }

    fn state(&self) -> MutexGuard<'_, WakeState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn listeners(&self) -> MutexGuard<'_, Vec<(String, WakeListener)>> {
        match self.listeners.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn add_listener<F>(&self, name: impl Into<String>, listener: F)
    where
        F: Fn(DateTime<Utc>) -> Result<()> + Send + Sync + 'static,
    {
        self.listeners().push((name.into(), Arc::new(listener)));
    }

    pub fn listener_count(&self) -> usize {
        self.listeners().len()
    }

    pub fn last_wake(&self) -> Option<DateTime<Utc>> {
        self.state().last_wake
    }

    pub fn is_running(&self) -> bool {
        self.state().handle.is_some()
    }

    /// Begin polling. Calling this while already running does nothing.
    pub fn start(self: &Arc<Self>) {
        let mut state = self.state();
        if state.handle.is_some() {
            return;
        }
        state.last_poll = Some(self.clock.now());

        let monitor = Arc::downgrade(self);
        let handle = self.ticks.schedule(
            TickPlan::forever(WAKE_POLL_INTERVAL),
            Box::new(move |_| {
                if let Some(monitor) = monitor.upgrade() {
                    monitor.poll();
                }
            }),
        );
        state.handle = Some(handle);
        log_info!("sleep/wake monitor started");
    }

    pub fn stop(&self) {
        let handle = {
            let mut state = self.state();
            state.last_poll = None;
            state.handle.take()
        };
        if let Some(handle) = handle {
            handle.cancel();
            log_info!("sleep/wake monitor stopped");
        }
    }

    /// Compare now against the previous poll. Returns true when a wake was
    /// detected, after every listener has been told.
    pub fn poll(&self) -> bool {
        let now = self.clock.now();
        let previous = {
            let mut state = self.state();
            state.last_poll.replace(now)
        };
        let Some(previous) = previous else {
            return false;
        };

        let gap = now.signed_duration_since(previous);
        let threshold = chrono::Duration::from_std(WAKE_GAP_THRESHOLD)
            .unwrap_or_else(|_| chrono::Duration::seconds(65));
        if gap <= threshold {
            return false;
        }

        log_info!("system wake detected after a {}s gap", gap.num_seconds());
        self.state().last_wake = Some(now);
        self.notify(now);
        true
    }

    fn notify(&self, woke_at: DateTime<Utc>) {
        let listeners: Vec<(String, WakeListener)> = self.listeners().clone();
        for (name, listener) in listeners {
            match panic::catch_unwind(AssertUnwindSafe(|| listener(woke_at))) {
                Ok(Ok(())) => {}
                Ok(Err(err)) => log_warn!("wake listener {name} failed: {err:#}"),
                Err(_) => log_error!("wake listener {name} panicked"),
            }
        }
    }
}

impl Drop for SleepWakeMonitor {
    fn drop(&mut self) {
        if let Some(handle) = self.state().handle.take() {
            handle.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::timer::ManualTickScheduler;
    use anyhow::anyhow;
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn setup() -> (FixedClock, Arc<ManualTickScheduler>, Arc<SleepWakeMonitor>) {
        let clock = FixedClock::new(Utc.with_ymd_and_hms(2026, 3, 2, 8, 0, 0).unwrap());
        let ticks = Arc::new(ManualTickScheduler::new());
        let monitor = SleepWakeMonitor::new(Arc::new(clock.clone()), ticks.clone());
        (clock, ticks, monitor)
    }

    fn counter(monitor: &SleepWakeMonitor, name: &str) -> Arc<AtomicU32> {
        let count = Arc::new(AtomicU32::new(0));
        let sink = Arc::clone(&count);
        monitor.add_listener(name, move |_| {
            sink.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        count
    }

    #[test]
    fn sixty_second_gap_is_not_a_wake() {
        let (clock, _ticks, monitor) = setup();
        let hits = counter(&monitor, "count");
        monitor.start();

        clock.advance(chrono::Duration::seconds(60));
        assert!(!monitor.poll());
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert!(monitor.last_wake().is_none());
    }

    #[test]
    fn seventy_second_gap_is_a_wake() {
        let (clock, _ticks, monitor) = setup();
        let hits = counter(&monitor, "count");
        monitor.start();

        clock.advance(chrono::Duration::seconds(70));
        assert!(monitor.poll());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(monitor.last_wake(), Some(clock.now()));
    }

    #[test]
    fn failing_listener_does_not_block_the_rest() {
        let (clock, _ticks, monitor) = setup();
        monitor.add_listener("broken", |_| Err(anyhow!("flash engine gone")));
        monitor.add_listener("panicky", |_| panic!("listener bug"));
        let hits = counter(&monitor, "count");
        monitor.start();

        clock.advance(chrono::Duration::minutes(10));
        assert!(monitor.poll());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn scheduled_polls_track_the_clock() {
        let (clock, ticks, monitor) = setup();
        let hits = counter(&monitor, "count");
        monitor.start();
        assert!(monitor.is_running());

        for _ in 0..3 {
            clock.advance(chrono::Duration::seconds(30));
            ticks.advance(WAKE_POLL_INTERVAL);
        }
        assert_eq!(hits.load(Ordering::SeqCst), 0);

        // Asleep for an hour: timers stall while wall-clock time jumps.
        clock.advance(chrono::Duration::hours(1));
        ticks.advance(WAKE_POLL_INTERVAL);
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        monitor.stop();
        assert!(!monitor.is_running());
        clock.advance(chrono::Duration::hours(1));
        ticks.advance(WAKE_POLL_INTERVAL);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn poll_before_start_is_ignored() {
        let (_clock, _ticks, monitor) = setup();
        assert!(!monitor.poll());
    }
}
