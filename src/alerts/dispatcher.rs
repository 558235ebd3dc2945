use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::audio::{spawn_beeps, BeepPattern, BeepPlayer};
use crate::models::MeetingRecord;
use crate::notify::Notifier;
use crate::overlay::{BannerCoordinator, FlashReadyLatch, ScreenFlasher};
use crate::settings::ConfigStore;
use crate::ui::UiDispatcher;

use super::decision::{AlertBatch, AlertSink};

const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info, log_warn};

/// Threads started by one dispatch. Only tests wait on them.
#[derive(Default)]
pub struct DispatchHandles {
    pub audio: Option<JoinHandle<()>>,
    pub flash: Option<JoinHandle<()>>,
}

impl DispatchHandles {
    pub fn join(self) {
        for handle in [self.audio, self.flash].into_iter().flatten() {
            if handle.join().is_err() {
                log_error!("alert channel thread panicked");
            }
        }
    }
}

/// Fans one alert out to audio, screen flash, banner and notification.
///
/// The channels are independent: a failure in one is logged and never stops
/// the others. The banner waits for the flash windows to exist so it is
/// created above them.
pub struct AlertDispatcher {
    config: Arc<ConfigStore>,
    beeper: Arc<dyn BeepPlayer>,
    flasher: Arc<dyn ScreenFlasher>,
    banner: Option<BannerCoordinator>,
    notifier: Arc<dyn Notifier>,
    ui: Arc<dyn UiDispatcher>,
    latch: Arc<FlashReadyLatch>,
}

impl AlertDispatcher {
    pub fn new(
        config: Arc<ConfigStore>,
        beeper: Arc<dyn BeepPlayer>,
        flasher: Arc<dyn ScreenFlasher>,
        banner: Option<BannerCoordinator>,
        notifier: Arc<dyn Notifier>,
        ui: Arc<dyn UiDispatcher>,
        latch: Arc<FlashReadyLatch>,
    ) -> Self {
        Self {
            config,
            beeper,
            flasher,
            banner,
            notifier,
            ui,
            latch,
        }
    }

    pub fn flasher(&self) -> &Arc<dyn ScreenFlasher> {
        &self.flasher
    }

    pub fn banner(&self) -> Option<&BannerCoordinator> {
        self.banner.as_ref()
    }

    /// Start every channel and return without waiting for any of them.
    pub fn dispatch_alert(
        &self,
        banner_text: &str,
        title: &str,
        body: &str,
        meetings: Vec<MeetingRecord>,
    ) -> DispatchHandles {
        log_info!("dispatching alert: {banner_text}");
        let config = self.config.current();

        let audio = spawn_beeps(Arc::clone(&self.beeper), BeepPattern::new(config.beep_count()));
        let flash = self.start_visuals(banner_text, meetings);
        self.post_notification(title, body);

        DispatchHandles { audio, flash }
    }

    fn start_visuals(&self, banner_text: &str, meetings: Vec<MeetingRecord>) -> Option<JoinHandle<()>> {
        if meetings.is_empty() {
            if let Some(banner) = &self.banner {
                banner.show(banner_text);
            }
            return None;
        }

        match &self.banner {
            Some(banner) => {
                let banner = banner.clone();
                let text = banner_text.to_string();
                self.latch.set(Box::new(move || banner.show_now(&text)));
            }
            None => self.latch.clear(),
        }

        let flasher = Arc::clone(&self.flasher);
        let spawned = thread::Builder::new()
            .name("flash-overlay".to_string())
            .spawn(move || {
                if let Err(err) = flasher.flash_multiple(&meetings) {
                    log_warn!("screen flash failed: {err}");
                }
            });

        match spawned {
            Ok(handle) => Some(handle),
            Err(err) => {
                self.latch.clear();
                log_error!("failed to spawn flash thread: {err}");
                None
            }
        }
    }

    fn post_notification(&self, title: &str, body: &str) {
        let notifier = Arc::clone(&self.notifier);
        let title = title.to_string();
        let body = body.to_string();
        let queued = self.ui.dispatch(Box::new(move || {
            if let Err(err) = notifier.notify(&title, &body) {
                log_warn!("notification failed: {err:#}");
            }
        }));
        if let Err(err) = queued {
            log_warn!("notification not delivered: {err}");
        }
    }
}

impl AlertSink for AlertDispatcher {
    fn deliver(&self, batch: AlertBatch) {
        self.dispatch_alert(&batch.banner_text, &batch.title, &batch.body, batch.meetings);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::test_support::Harness;
    use crate::overlay::HeadlessFlasher;
    use anyhow::{anyhow, Result};
    use chrono::{Duration, Utc};
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        beeps: Mutex<Vec<u32>>,
        notes: Mutex<Vec<(String, String)>>,
    }

    impl BeepPlayer for Recorder {
        fn play(&self, pattern: BeepPattern) -> Result<()> {
            self.beeps.lock().unwrap().push(pattern.count);
            Ok(())
        }
    }

    impl Notifier for Recorder {
        fn notify(&self, title: &str, body: &str) -> Result<()> {
            self.notes
                .lock()
                .unwrap()
                .push((title.to_string(), body.to_string()));
            Ok(())
        }
    }

    struct FailingNotifier;

    impl Notifier for FailingNotifier {
        fn notify(&self, _title: &str, _body: &str) -> Result<()> {
            Err(anyhow!("notification center unavailable"))
        }
    }

    fn standup() -> MeetingRecord {
        let start = (Utc::now() + Duration::seconds(20)).fixed_offset();
        MeetingRecord::new("m-1", "Standup", Some(start), Some(start + Duration::minutes(15)))
    }

    fn dispatcher(harness: &Harness, recorder: &Arc<Recorder>) -> AlertDispatcher {
        AlertDispatcher::new(
            Arc::clone(&harness.context.config),
            recorder.clone(),
            Arc::new(harness.flash.clone()),
            Some(harness.banner.clone()),
            recorder.clone(),
            harness.context.ui.clone(),
            Arc::clone(&harness.context.latch),
        )
    }

    #[test]
    fn banner_is_created_after_the_flash_windows() {
        let harness = Harness::new(2);
        let recorder = Arc::new(Recorder::default());
        let dispatcher = dispatcher(&harness, &recorder);

        dispatcher
            .dispatch_alert(
                "Upcoming meeting: Standup",
                "Meeting starting soon",
                "Standup",
                vec![standup()],
            )
            .join();
        harness.ui.flush().expect("flush");

        assert_eq!(harness.display.flash_requests().len(), 2);
        assert_eq!(harness.banner.window_count(), 2);
        assert_eq!(harness.context.registry.len(), 2);
        assert_eq!(*recorder.beeps.lock().unwrap(), vec![3]);
        assert_eq!(
            recorder.notes.lock().unwrap()[0].0,
            "Meeting starting soon".to_string()
        );
        assert!(!harness.context.latch.is_armed());
    }

    #[test]
    fn empty_batch_shows_banner_without_flash() {
        let harness = Harness::new(1);
        let recorder = Arc::new(Recorder::default());
        let dispatcher = dispatcher(&harness, &recorder);

        let handles = dispatcher.dispatch_alert("Test", "Title", "Body", Vec::new());
        assert!(handles.flash.is_none());
        handles.join();
        harness.ui.flush().expect("flush");

        assert!(harness.display.flash_requests().is_empty());
        assert!(harness.banner.is_showing());
        assert!(!harness.context.latch.is_armed());
    }

    #[test]
    fn failing_notifier_leaves_other_channels_running() {
        let harness = Harness::new(1);
        let recorder = Arc::new(Recorder::default());
        let dispatcher = AlertDispatcher::new(
            Arc::clone(&harness.context.config),
            recorder.clone(),
            Arc::new(harness.flash.clone()),
            Some(harness.banner.clone()),
            Arc::new(FailingNotifier),
            harness.context.ui.clone(),
            Arc::clone(&harness.context.latch),
        );

        dispatcher
            .dispatch_alert("Upcoming meeting: Standup", "t", "b", vec![standup()])
            .join();
        harness.ui.flush().expect("flush");

        assert_eq!(recorder.beeps.lock().unwrap().len(), 1);
        assert_eq!(harness.flash.window_count(), 1);
        assert!(harness.banner.is_showing());
    }

    #[test]
    fn headless_flash_never_shows_the_banner() {
        let harness = Harness::new(1);
        let recorder = Arc::new(Recorder::default());
        let dispatcher = AlertDispatcher::new(
            Arc::clone(&harness.context.config),
            recorder.clone(),
            Arc::new(HeadlessFlasher::new(harness.context.clone())),
            Some(harness.banner.clone()),
            recorder.clone(),
            harness.context.ui.clone(),
            Arc::clone(&harness.context.latch),
        );

        let batch = AlertBatch::for_meetings(vec![standup()]);
        dispatcher
            .dispatch_alert(&batch.banner_text, &batch.title, &batch.body, batch.meetings)
            .join();
        harness.ui.flush().expect("flush");

        assert!(!harness.banner.is_showing());
        assert!(!harness.context.latch.is_armed());
        assert_eq!(recorder.notes.lock().unwrap().len(), 1);
    }
}
