use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use uuid::Uuid;

use crate::alerts::text::flash_lines;
use crate::error::{OverlayError, OverlayResult};
use crate::models::MeetingRecord;
use crate::settings::AlertConfig;
use crate::timer::{TickHandle, TickPlan};
use crate::ui::run_blocking;

use super::{DisplayEnvironment, FlashWindowRequest, MonitorBounds, OverlayContext, WindowRef};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_error, log_info, log_warn};

/// Elevation stops after this many ticks and the windows stay `Visible`; the
/// configured flash duration, not the last tick, decides when they are disposed.
pub const ELEVATION_TICKS: u32 = 5;
pub const ELEVATION_FIRST_DELAY: Duration = Duration::from_millis(100);
pub const ELEVATION_INTERVAL: Duration = Duration::from_millis(200);

/// Lifecycle of one flash cycle.
///
/// `Idle → Creating → Visible → Elevating(1..=5) → Visible → Disposed`. The
/// duration timer or a forced cleanup moves any state to `Disposed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashPhase {
    Idle,
    Creating,
    Visible,
    Elevating(u32),
    Disposed,
}

/// The capability every flash implementation offers the dispatcher.
pub trait ScreenFlasher: Send + Sync {
    fn flash(&self, meeting: &MeetingRecord) -> OverlayResult<()> {
        self.flash_multiple(std::slice::from_ref(meeting))
    }

    /// Show overlays for `meetings`. Called from the flash thread, never the UI thread.
    fn flash_multiple(&self, meetings: &[MeetingRecord]) -> OverlayResult<()>;

    /// Dispose every flash window immediately, whatever tick it is on.
    fn force_cleanup(&self);
}

/// Pick the flasher for this process: windowed when a display exists, headless otherwise.
pub fn create_flasher(
    env: Option<Arc<dyn DisplayEnvironment>>,
    context: OverlayContext,
) -> Arc<dyn ScreenFlasher> {
    match env {
        Some(env) => Arc::new(FlashEngine::new(env, context)),
        None => Arc::new(HeadlessFlasher::new(context)),
    }
}

struct FlashState {
    phase: FlashPhase,
    windows: Vec<WindowRef>,
    generation: u64,
    elevation: Option<TickHandle>,
    cleanup: Option<TickHandle>,
}

struct FlashInner {
    env: Arc<dyn DisplayEnvironment>,
    context: OverlayContext,
    state: Mutex<FlashState>,
}

/// Full-screen colored overlays, one per monitor.
#[derive(Clone)]
pub struct FlashEngine {
    inner: Arc<FlashInner>,
}

impl FlashEngine {
    pub fn new(env: Arc<dyn DisplayEnvironment>, context: OverlayContext) -> Self {
        Self {
            inner: Arc::new(FlashInner {
                env,
                context,
                state: Mutex::new(FlashState {
                    phase: FlashPhase::Idle,
                    windows: Vec::new(),
                    generation: 0,
                    elevation: None,
                    cleanup: None,
                }),
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, FlashState> {
        match self.inner.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn phase(&self) -> FlashPhase {
        self.state().phase
    }

    pub fn window_count(&self) -> usize {
        self.state().windows.len()
    }

    fn validate_display(&self) -> OverlayResult<Vec<MonitorBounds>> {
        let env = Arc::clone(&self.inner.env);
        let monitors = run_blocking(self.inner.context.ui.as_ref(), move || env.monitors())??;
        if monitors.is_empty() {
            return Err(OverlayError::DisplayUnavailable);
        }
        Ok(monitors)
    }

    /// UI thread. Returns the generation of the new cycle.
    fn create_windows(
        &self,
        monitors: Vec<MonitorBounds>,
        lines: Vec<String>,
        config: &AlertConfig,
    ) -> u64 {
        self.dispose_now("stale flash windows");
        self.state().phase = FlashPhase::Creating;

        let cycle = Uuid::new_v4().simple().to_string();
        let all_workspaces = self.inner.context.platform.all_workspaces();
        let mut created = Vec::with_capacity(monitors.len());

        for (index, monitor) in monitors.into_iter().enumerate() {
            let request = FlashWindowRequest {
                label: format!("flash-{cycle}-{index}"),
                monitor,
                background: config.flash_color.clone(),
                text_color: config.flash_text_color.clone(),
                opacity: config.flash_opacity,
                lines: lines.clone(),
                all_workspaces,
            };
            match self.inner.env.create_flash_window(&request) {
                Ok(window) => created.push(window),
                Err(err) => log_error!("flash window on {} failed: {err}", request.monitor.name),
            }
        }

        let mut state = self.state();
        log_info!("flash windows created on {} monitors", created.len());
        state.windows = created;
        state.generation += 1;
        state.phase = FlashPhase::Visible;
        state.generation
    }

    /// UI thread. One step of the fight for top-of-stack.
    pub(crate) fn elevate(&self, generation: u64, tick: u32) {
        let windows = {
            let mut state = self.state();
            if state.generation != generation
                || !matches!(state.phase, FlashPhase::Visible | FlashPhase::Elevating(_))
            {
                return;
            }
            state.phase = FlashPhase::Elevating(tick);
            state.windows.clone()
        };

        let registry = &self.inner.context.registry;
        if tick == 1 {
            for window in &windows {
                let result = window
                    .set_always_on_top(false)
                    .and_then(|_| window.set_always_on_top(true))
                    .and_then(|_| window.bring_to_front());
                if let Err(err) = result {
                    log_warn!("elevation of {} failed: {err}", window.label());
                }
            }
        } else if registry.is_empty() {
            for window in &windows {
                if let Err(err) = window.bring_to_front() {
                    log_warn!("elevation of {} failed: {err}", window.label());
                }
            }
        } else {
            log_debug!("banner showing; leaving flash windows below it on tick {tick}");
        }

        for banner in registry.snapshot() {
            if let Err(err) = banner.bring_to_front() {
                log_warn!("raising banner {} failed: {err}", banner.label());
            }
        }

        if tick >= ELEVATION_TICKS {
            let mut state = self.state();
            if state.generation == generation && state.phase == FlashPhase::Elevating(tick) {
                state.phase = FlashPhase::Visible;
                state.elevation = None;
            }
        }
    }

    /// UI thread.
    fn request_attention(&self, generation: u64) {
        let first = {
            let state = self.state();
            if state.generation != generation {
                return;
            }
            state.windows.first().cloned()
        };
        if let Some(window) = first {
            if let Err(err) = window.request_attention() {
                log_debug!("attention request unavailable: {err}");
            }
        }
    }

    /// UI thread. Dispose only if `generation` is still the live cycle.
    fn dispose_generation(&self, generation: u64) {
        if self.state().generation == generation {
            self.dispose_now("flash duration elapsed");
        }
    }

    /// UI thread.
    pub(crate) fn dispose_now(&self, reason: &str) {
        let (windows, elevation, cleanup) = {
            let mut state = self.state();
            if matches!(
                state.phase,
                FlashPhase::Creating | FlashPhase::Visible | FlashPhase::Elevating(_)
            ) {
                state.phase = FlashPhase::Disposed;
            }
            (
                std::mem::take(&mut state.windows),
                state.elevation.take(),
                state.cleanup.take(),
            )
        };

        for handle in elevation.iter().chain(cleanup.iter()) {
            handle.cancel();
        }

        if windows.is_empty() {
            return;
        }
        log_info!("disposing {} flash windows ({reason})", windows.len());
        for window in windows {
            if let Err(err) = window.close() {
                log_warn!("closing {} failed: {err}", window.label());
            }
        }
    }

    fn start_timers(&self, generation: u64, duration: Duration) {
        let ui = Arc::clone(&self.inner.context.ui);
        let ticks = &self.inner.context.ticks;

        let engine = self.clone();
        let elevation_ui = Arc::clone(&ui);
        let elevation = ticks.schedule(
            TickPlan::repeating(ELEVATION_FIRST_DELAY, ELEVATION_INTERVAL, ELEVATION_TICKS),
            Box::new(move |tick| {
                let engine = engine.clone();
                if let Err(err) = elevation_ui.dispatch(Box::new(move || engine.elevate(generation, tick))) {
                    log_warn!("elevation tick {tick} not delivered: {err}");
                }
            }),
        );

        let engine = self.clone();
        let cleanup = ticks.schedule(
            TickPlan::once(duration),
            Box::new(move |_| {
                let engine = engine.clone();
                if let Err(err) = ui.dispatch(Box::new(move || engine.dispose_generation(generation))) {
                    log_warn!("flash cleanup not delivered: {err}");
                }
            }),
        );

        let mut state = self.state();
        let live = state.generation == generation
            && matches!(state.phase, FlashPhase::Visible | FlashPhase::Elevating(_));
        if live {
            state.elevation = Some(elevation);
            state.cleanup = Some(cleanup);
        } else {
            elevation.cancel();
            cleanup.cancel();
        }
    }
}

impl ScreenFlasher for FlashEngine {
    fn flash_multiple(&self, meetings: &[MeetingRecord]) -> OverlayResult<()> {
        let context = &self.inner.context;
        let config = context.config.current();

        let monitors = match self.validate_display() {
            Ok(monitors) => monitors,
            Err(err) => {
                log_warn!("flash skipped this cycle: {err}");
                context.latch.clear();
                return Err(err);
            }
        };

        let engine = self.clone();
        let lines = flash_lines(meetings);
        let duration = config.flash_duration();
        let generation = run_blocking(context.ui.as_ref(), move || {
            engine.create_windows(monitors, lines, &config)
        })?;

        let latch = Arc::clone(&context.latch);
        context.ui.dispatch(Box::new(move || {
            if !latch.fire_once() {
                log_debug!("flash ready with no callback armed");
            }
        }))?;

        let engine = self.clone();
        context
            .ui
            .dispatch(Box::new(move || engine.request_attention(generation)))?;

        self.start_timers(generation, duration);
        Ok(())
    }

    fn force_cleanup(&self) {
        let engine = self.clone();
        if let Err(err) = self
            .inner
            .context
            .ui
            .dispatch(Box::new(move || engine.dispose_now("forced cleanup")))
        {
            log_warn!("forced flash cleanup not delivered: {err}");
        }
    }
}

/// Used when the process has no windowing at all. Nothing is drawn.
pub struct HeadlessFlasher {
    context: OverlayContext,
}

impl HeadlessFlasher {
    pub fn new(context: OverlayContext) -> Self {
        Self { context }
    }
}

impl ScreenFlasher for HeadlessFlasher {
    fn flash_multiple(&self, meetings: &[MeetingRecord]) -> OverlayResult<()> {
        log_info!("headless: skipping flash for {} meetings", meetings.len());
        self.context.latch.clear();
        Err(OverlayError::DisplayUnavailable)
    }

    fn force_cleanup(&self) {}
}
