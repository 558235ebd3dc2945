//! The assembled alert pipeline: meeting source, decision scheduler,
//! dispatcher, overlays and the wake monitor that keeps them honest.

use std::sync::Arc;

use anyhow::Result;
use chrono::Duration;

use crate::alerts::{
    AlertBatch, AlertDecisionEngine, AlertDispatcher, AlertScheduler, DispatchHandles,
    InMemoryMeetingSource,
};
use crate::audio::BeepPlayer;
use crate::clock::Clock;
use crate::models::MeetingRecord;
use crate::notify::Notifier;
use crate::overlay::{
    create_flasher, BannerCoordinator, DisplayEnvironment, FlashPlatform, FlashReadyLatch,
    OverlayContext, OverlayRegistry, ScreenFlasher,
};
use crate::settings::{AlertConfig, ConfigStore};
use crate::timer::TickScheduler;
use crate::ui::UiDispatcher;
use crate::wake::SleepWakeMonitor;

const ENABLE_LOGS: bool = true;

use crate::log_info;

/// Everything the pipeline needs from its host.
pub struct ServiceParts {
    pub config: Arc<ConfigStore>,
    pub ui: Arc<dyn UiDispatcher>,
    pub ticks: Arc<dyn TickScheduler>,
    pub clock: Arc<dyn Clock>,
    /// `None` when the process has no windowing.
    pub display: Option<Arc<dyn DisplayEnvironment>>,
    pub beeper: Arc<dyn BeepPlayer>,
    pub notifier: Arc<dyn Notifier>,
    pub platform: FlashPlatform,
}

pub struct AlertService {
    config: Arc<ConfigStore>,
    clock: Arc<dyn Clock>,
    context: OverlayContext,
    meetings: Arc<InMemoryMeetingSource>,
    dispatcher: Arc<AlertDispatcher>,
    scheduler: Arc<AlertScheduler>,
    wake: Arc<SleepWakeMonitor>,
}

impl AlertService {
    pub fn build(parts: ServiceParts) -> Self {
        let context = OverlayContext {
            ui: Arc::clone(&parts.ui),
            ticks: Arc::clone(&parts.ticks),
            registry: Arc::new(OverlayRegistry::new()),
            latch: Arc::new(FlashReadyLatch::new()),
            config: Arc::clone(&parts.config),
            platform: parts.platform,
        };

        let banner = parts
            .display
            .as_ref()
            .map(|display| BannerCoordinator::new(Arc::clone(display), context.clone()));
        let flasher = create_flasher(parts.display, context.clone());

        let dispatcher = Arc::new(AlertDispatcher::new(
            Arc::clone(&parts.config),
            parts.beeper,
            Arc::clone(&flasher),
            banner,
            parts.notifier,
            parts.ui,
            Arc::clone(&context.latch),
        ));

        let meetings = Arc::new(InMemoryMeetingSource::default());
        let scheduler = AlertScheduler::new(
            meetings.clone(),
            Arc::new(AlertDecisionEngine::new()),
            dispatcher.clone(),
            Arc::clone(&parts.config),
            Arc::clone(&parts.clock),
            Arc::clone(&parts.ticks),
        );

        let wake = SleepWakeMonitor::new(Arc::clone(&parts.clock), parts.ticks);
        wake.add_listener("flash-cleanup", move |_| {
            flasher.force_cleanup();
            Ok(())
        });
        let weak_scheduler = Arc::downgrade(&scheduler);
        wake.add_listener("alert-refresh", move |_| {
            if let Some(scheduler) = weak_scheduler.upgrade() {
                scheduler.restart();
            }
            Ok(())
        });

        Self {
            config: parts.config,
            clock: parts.clock,
            context,
            meetings,
            dispatcher,
            scheduler,
            wake,
        }
    }

    pub fn start(&self) {
        self.scheduler.start();
        self.wake.start();
        log_info!("alert service started");
    }

    /// Stop polling and take every overlay down.
    pub fn shutdown(&self) {
        self.scheduler.stop();
        self.wake.stop();
        self.force_overlay_cleanup();
        log_info!("alert service stopped");
    }

    pub fn context(&self) -> &OverlayContext {
        &self.context
    }

    pub fn scheduler(&self) -> &Arc<AlertScheduler> {
        &self.scheduler
    }

    pub fn wake_monitor(&self) -> &Arc<SleepWakeMonitor> {
        &self.wake
    }

    pub fn dispatcher(&self) -> &Arc<AlertDispatcher> {
        &self.dispatcher
    }

    /// Replace the meeting list and evaluate it straight away.
    pub fn set_meetings(&self, meetings: Vec<MeetingRecord>) -> usize {
        let count = self.meetings.replace(meetings);
        log_info!("received {count} meetings");
        self.scheduler.run_pass()
    }

    pub fn config(&self) -> AlertConfig {
        self.config.current()
    }

    /// Store a new configuration. Polling restarts when the interval changed.
    pub fn update_config(&self, config: AlertConfig) -> Result<AlertConfig> {
        let previous = self.config.current();
        let stored = self.config.update(config)?;
        if stored.refresh_interval_seconds != previous.refresh_interval_seconds
            && self.scheduler.is_running()
        {
            self.scheduler.restart();
        }
        Ok(stored)
    }

    pub fn alerted_ids(&self) -> Vec<String> {
        self.scheduler.engine().alerted().ids()
    }

    /// Run every channel for a synthetic meeting one minute out. The alerted
    /// set is not touched.
    pub fn trigger_test_alert(&self) -> DispatchHandles {
        let start = (self.clock.now() + Duration::minutes(1)).fixed_offset();
        let sample = MeetingRecord::new(
            format!("test-{}", uuid::Uuid::new_v4()),
            "Test meeting",
            Some(start),
            Some(start + Duration::minutes(30)),
        );
        let batch = AlertBatch::for_meetings(vec![sample]);
        self.dispatcher
            .dispatch_alert(&batch.banner_text, &batch.title, &batch.body, batch.meetings)
    }

    pub fn force_overlay_cleanup(&self) {
        self.dispatcher.flasher().force_cleanup();
        if let Some(banner) = self.dispatcher.banner() {
            banner.hide();
        }
    }
}
