use std::sync::{Arc, Mutex, MutexGuard};

use crate::clock::Clock;
use crate::settings::ConfigStore;
use crate::timer::{TickHandle, TickPlan, TickScheduler};

use super::decision::{AlertDecisionEngine, AlertSink, AlertWindow};
use super::source::MeetingSource;

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info};

/// Runs a decision pass now and then every refresh interval.
pub struct AlertScheduler {
    source: Arc<dyn MeetingSource>,
    engine: Arc<AlertDecisionEngine>,
    sink: Arc<dyn AlertSink>,
    config: Arc<ConfigStore>,
    clock: Arc<dyn Clock>,
    ticks: Arc<dyn TickScheduler>,
    handle: Mutex<Option<TickHandle>>,
}

impl AlertScheduler {
    pub fn new(
        source: Arc<dyn MeetingSource>,
        engine: Arc<AlertDecisionEngine>,
        sink: Arc<dyn AlertSink>,
        config: Arc<ConfigStore>,
        clock: Arc<dyn Clock>,
        ticks: Arc<dyn TickScheduler>,
    ) -> Arc<Self> {
        Arc::new(Self {
            source,
            engine,
            sink,
            config,
            clock,
            ticks,
            handle: Mutex::new(None),
        })
    }

    fn handle(&self) -> MutexGuard<'_, Option<TickHandle>> {
        match self.handle.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn engine(&self) -> &Arc<AlertDecisionEngine> {
        &self.engine
    }

    pub fn is_running(&self) -> bool {
        self.handle().is_some()
    }

    /// Evaluate the current meeting list once.
    pub fn run_pass(&self) -> usize {
        let meetings = self.source.meetings();
        let window = AlertWindow::from_config(&self.config.current());
        let alerted = self
            .engine
            .run_pass(&meetings, window, self.clock.now(), self.sink.as_ref());
        log_debug!("decision pass over {} meetings alerted {alerted}", meetings.len());
        alerted
    }

    /// Run a pass immediately, then keep polling. No-op if already running.
    pub fn start(self: &Arc<Self>) {
        let interval = self.config.current().refresh_interval();
        {
            let mut slot = self.handle();
            if slot.is_some() {
                return;
            }
            let scheduler = Arc::downgrade(self);
            *slot = Some(self.ticks.schedule(
                TickPlan::forever(interval),
                Box::new(move |_| {
                    if let Some(scheduler) = scheduler.upgrade() {
                        scheduler.run_pass();
                    }
                }),
            ));
        }
        log_info!("alert scheduler polling every {}s", interval.as_secs());
        self.run_pass();
    }

    pub fn stop(&self) {
        if let Some(handle) = self.handle().take() {
            handle.cancel();
            log_info!("alert scheduler stopped");
        }
    }

    /// Restart polling from now, e.g. after a wake or a config change.
    pub fn restart(self: &Arc<Self>) {
        self.stop();
        self.start();
    }
}

impl Drop for AlertScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}
