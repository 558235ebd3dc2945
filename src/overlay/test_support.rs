use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::{OverlayError, OverlayResult};
use crate::settings::{AlertConfig, ConfigStore};
use crate::timer::ManualTickScheduler;
use crate::ui::UiThread;

use super::{
    BannerCoordinator, BannerWindowRequest, DisplayEnvironment, FlashEngine, FlashPlatform,
    FlashReadyLatch, FlashWindowRequest, MonitorBounds, OverlayContext, OverlayRegistry,
    OverlayWindow, WindowRef,
};

#[derive(Debug, Clone, PartialEq)]
pub enum WindowEvent {
    ToFront(String),
    OnTop(String, bool),
    Attention(String),
    Closed(String),
    Marker(&'static str),
}

impl WindowEvent {
    pub fn label(&self) -> Option<&str> {
        match self {
            WindowEvent::ToFront(label)
            | WindowEvent::OnTop(label, _)
            | WindowEvent::Attention(label)
            | WindowEvent::Closed(label) => Some(label),
            WindowEvent::Marker(_) => None,
        }
    }
}

type EventLog = Arc<Mutex<Vec<WindowEvent>>>;

pub struct FakeWindow {
    label: String,
    log: EventLog,
}

impl FakeWindow {
    fn record(&self, event: WindowEvent) {
        self.log.lock().unwrap().push(event);
    }
}

impl OverlayWindow for FakeWindow {
    fn label(&self) -> &str {
        &self.label
    }

    fn bring_to_front(&self) -> OverlayResult<()> {
        self.record(WindowEvent::ToFront(self.label.clone()));
        Ok(())
    }

    fn set_always_on_top(&self, on_top: bool) -> OverlayResult<()> {
        self.record(WindowEvent::OnTop(self.label.clone(), on_top));
        Ok(())
    }

    fn request_attention(&self) -> OverlayResult<()> {
        self.record(WindowEvent::Attention(self.label.clone()));
        Ok(())
    }

    fn close(&self) -> OverlayResult<()> {
        self.record(WindowEvent::Closed(self.label.clone()));
        Ok(())
    }
}

/// Records every window it creates and every call made on those windows.
pub struct FakeDisplay {
    pub monitors: Vec<MonitorBounds>,
    log: EventLog,
    flash_requests: Mutex<Vec<FlashWindowRequest>>,
    banner_requests: Mutex<Vec<BannerWindowRequest>>,
    failing: Mutex<Vec<String>>,
}

impl FakeDisplay {
    pub fn new(monitor_count: usize) -> Self {
        let monitors = (0..monitor_count)
            .map(|i| MonitorBounds {
                name: format!("monitor-{i}"),
                x: 1920.0 * i as f64,
                y: 0.0,
                width: 1920.0,
                height: 1080.0,
                scale_factor: 1.0,
                reserved_top: None,
            })
            .collect();
        Self::with_monitors(monitors)
    }

    pub fn with_monitors(monitors: Vec<MonitorBounds>) -> Self {
        Self {
            monitors,
            log: Arc::new(Mutex::new(Vec::new())),
            flash_requests: Mutex::new(Vec::new()),
            banner_requests: Mutex::new(Vec::new()),
            failing: Mutex::new(Vec::new()),
        }
    }

    pub fn log(&self) -> EventLog {
        Arc::clone(&self.log)
    }

    pub fn fail_flash_on(&self, monitor: &str) {
        self.failing.lock().unwrap().push(monitor.to_string());
    }

    pub fn flash_requests(&self) -> Vec<FlashWindowRequest> {
        self.flash_requests.lock().unwrap().clone()
    }

    pub fn banner_requests(&self) -> Vec<BannerWindowRequest> {
        self.banner_requests.lock().unwrap().clone()
    }

    pub fn flash_labels(&self) -> Vec<String> {
        self.flash_requests()
            .into_iter()
            .filter(|r| !self.failing.lock().unwrap().contains(&r.monitor.name))
            .map(|r| r.label)
            .collect()
    }

    pub fn detached_window(&self, label: &str) -> WindowRef {
        Arc::new(FakeWindow {
            label: label.to_string(),
            log: self.log(),
        })
    }

    fn count(&self, predicate: impl Fn(&WindowEvent) -> bool) -> usize {
        self.log.lock().unwrap().iter().filter(|e| predicate(e)).count()
    }

    pub fn to_front_count(&self, label: &str) -> usize {
        self.count(|e| matches!(e, WindowEvent::ToFront(l) if l == label))
    }

    pub fn to_front_count_for_prefix(&self, prefix: &str) -> usize {
        self.count(|e| matches!(e, WindowEvent::ToFront(l) if l.starts_with(prefix)))
    }

    pub fn closed_count_for_prefix(&self, prefix: &str) -> usize {
        self.count(|e| matches!(e, WindowEvent::Closed(l) if l.starts_with(prefix)))
    }
}

impl DisplayEnvironment for FakeDisplay {
    fn monitors(&self) -> OverlayResult<Vec<MonitorBounds>> {
        Ok(self.monitors.clone())
    }

    fn create_flash_window(&self, request: &FlashWindowRequest) -> OverlayResult<WindowRef> {
        self.flash_requests.lock().unwrap().push(request.clone());
        if self.failing.lock().unwrap().contains(&request.monitor.name) {
            return Err(OverlayError::WindowCreation {
                monitor: request.monitor.name.clone(),
                reason: "injected failure".into(),
            });
        }
        Ok(self.detached_window(&request.label))
    }

    fn create_banner_window(&self, request: &BannerWindowRequest) -> OverlayResult<WindowRef> {
        self.banner_requests.lock().unwrap().push(request.clone());
        Ok(self.detached_window(&request.label))
    }
}

/// Flash engine and banner wired to a fake display, a real UI thread and a
/// hand-cranked tick scheduler.
pub struct Harness {
    pub ui: UiThread,
    pub ticks: Arc<ManualTickScheduler>,
    pub display: Arc<FakeDisplay>,
    pub context: OverlayContext,
    pub flash: FlashEngine,
    pub banner: BannerCoordinator,
}

impl Harness {
    pub fn new(monitor_count: usize) -> Self {
        Self::with_platform(monitor_count, FlashPlatform::CrossPlatform)
    }

    pub fn with_platform(monitor_count: usize, platform: FlashPlatform) -> Self {
        Self::with_display(FakeDisplay::new(monitor_count), platform)
    }

    pub fn with_display(display: FakeDisplay, platform: FlashPlatform) -> Self {
        let ui = UiThread::spawn("test-ui").expect("ui thread");
        let ticks = Arc::new(ManualTickScheduler::new());
        let display = Arc::new(display);
        let context = OverlayContext {
            ui: Arc::new(ui.clone()),
            ticks: ticks.clone(),
            registry: Arc::new(OverlayRegistry::new()),
            latch: Arc::new(FlashReadyLatch::new()),
            config: Arc::new(ConfigStore::in_memory(AlertConfig::default())),
            platform,
        };
        let flash = FlashEngine::new(display.clone(), context.clone());
        let banner = BannerCoordinator::new(display.clone(), context.clone());
        Self {
            ui,
            ticks,
            display,
            context,
            flash,
            banner,
        }
    }

    pub fn arm_counter(&self) -> Arc<AtomicU32> {
        let counter = Arc::new(AtomicU32::new(0));
        let sink = Arc::clone(&counter);
        self.context.latch.set(Box::new(move || {
            sink.fetch_add(1, Ordering::SeqCst);
        }));
        counter
    }
}
