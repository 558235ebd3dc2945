use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use serde::Serialize;
use uuid::Uuid;

use crate::timer::{TickHandle, TickPlan};

use super::{BannerWindowRequest, DisplayEnvironment, OverlayContext, WindowRef};

const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

/// How long a banner stays up before it hides itself.
pub const BANNER_VISIBLE_FOR: Duration = Duration::from_secs(5);

/// Vertical font metrics, as fractions of the font size resolved to pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontMetrics {
    pub ascent: f64,
    pub descent: f64,
    pub line_gap: f64,
}

impl FontMetrics {
    /// Metrics of the system UI sans-serif faces used by the overlay pages.
    pub fn approximate(font_size: f64) -> Self {
        Self {
            ascent: font_size * 0.80,
            descent: font_size * 0.20,
            line_gap: font_size * 0.15,
        }
    }

    pub fn line_height(&self) -> f64 {
        self.ascent + self.descent + self.line_gap
    }
}

/// Geometry of the banner frame, derived from the text it carries.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BannerLayout {
    pub font_size: f64,
    /// Height of the top strip holding the text.
    pub top_strip: f64,
    /// Thickness of the left, right and bottom edges.
    pub frame: f64,
    pub padding: f64,
}

impl BannerLayout {
    pub fn from_metrics(font_size: f64, metrics: FontMetrics) -> Self {
        let line_height = metrics.line_height();
        let padding = (font_size * 0.5).round();
        Self {
            font_size,
            top_strip: (line_height + padding * 2.0).ceil(),
            frame: (line_height * 0.25).ceil().max(4.0),
            padding,
        }
    }

    pub fn for_font_size(font_size: f64) -> Self {
        Self::from_metrics(font_size, FontMetrics::approximate(font_size))
    }
}

struct BannerState {
    windows: Vec<WindowRef>,
    generation: u64,
    auto_hide: Option<TickHandle>,
}

struct BannerInner {
    env: Arc<dyn DisplayEnvironment>,
    context: OverlayContext,
    state: Mutex<BannerState>,
}

/// Thin bordered overlay drawn above the flash windows.
///
/// At most one banner generation is on screen. Its windows are listed in the
/// shared registry for exactly as long as they exist, which is how the flash
/// engine knows to stop competing with them.
#[derive(Clone)]
pub struct BannerCoordinator {
    inner: Arc<BannerInner>,
}

impl BannerCoordinator {
    pub fn new(env: Arc<dyn DisplayEnvironment>, context: OverlayContext) -> Self {
        Self {
            inner: Arc::new(BannerInner {
                env,
                context,
                state: Mutex::new(BannerState {
                    windows: Vec::new(),
                    generation: 0,
                    auto_hide: None,
                }),
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, BannerState> {
        match self.inner.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn window_count(&self) -> usize {
        self.state().windows.len()
    }

    pub fn is_showing(&self) -> bool {
        !self.state().windows.is_empty()
    }

    /// Show `text` from any thread.
    pub fn show(&self, text: impl Into<String>) {
        let banner = self.clone();
        let text = text.into();
        if let Err(err) = self
            .inner
            .context
            .ui
            .dispatch(Box::new(move || banner.show_now(&text)))
        {
            log_warn!("banner not delivered: {err}");
        }
    }

    /// Hide from any thread.
    pub fn hide(&self) {
        let banner = self.clone();
        if let Err(err) = self
            .inner
            .context
            .ui
            .dispatch(Box::new(move || banner.hide_now("hide requested")))
        {
            log_warn!("banner hide not delivered: {err}");
        }
    }

    /// UI thread.
    pub(crate) fn show_now(&self, text: &str) {
        self.hide_now("replaced by a new banner");

        let context = &self.inner.context;
        let config = context.config.current();
        let monitors = match self.inner.env.monitors() {
            Ok(monitors) if !monitors.is_empty() => monitors,
            Ok(_) => {
                log_warn!("banner skipped: no monitors");
                return;
            }
            Err(err) => {
                log_warn!("banner skipped: {err}");
                return;
            }
        };

        let layout = BannerLayout::for_font_size(config.banner_font_size);
        let fallback_inset = context.platform.top_inset();
        let all_workspaces = context.platform.all_workspaces();
        let cycle = Uuid::new_v4().simple().to_string();
        let mut created: Vec<WindowRef> = Vec::with_capacity(monitors.len());

        for (index, monitor) in monitors.iter().enumerate() {
            let request = BannerWindowRequest {
                label: format!("banner-{cycle}-{index}"),
                monitor: monitor.below_top_inset(monitor.top_inset_or(fallback_inset)),
                border_color: config.banner_color.clone(),
                text: text.to_string(),
                layout,
                all_workspaces,
            };
            match self.inner.env.create_banner_window(&request) {
                Ok(window) => created.push(window),
                Err(err) => log_warn!("banner on {} failed: {err}", monitor.name),
            }
        }

        if created.is_empty() {
            return;
        }

        context.registry.register(created.iter().cloned());
        let generation = {
            let mut state = self.state();
            state.windows = created;
            state.generation += 1;
            state.generation
        };
        log_info!("banner shown on {} monitors", self.window_count());

        let banner = self.clone();
        let ui = Arc::clone(&context.ui);
        let handle = context.ticks.schedule(
            TickPlan::once(BANNER_VISIBLE_FOR),
            Box::new(move |_| {
                let banner = banner.clone();
                if let Err(err) = ui.dispatch(Box::new(move || banner.hide_generation(generation))) {
                    log_warn!("banner auto-hide not delivered: {err}");
                }
            }),
        );

        let mut state = self.state();
        if state.generation == generation && !state.windows.is_empty() {
            state.auto_hide = Some(handle);
        } else {
            handle.cancel();
        }
    }

    fn hide_generation(&self, generation: u64) {
        if self.state().generation == generation {
            self.hide_now("auto-hide");
        }
    }

    /// UI thread. Empties the registry before closing so nothing raises a dead window.
    pub(crate) fn hide_now(&self, reason: &str) {
        let (windows, auto_hide) = {
            let mut state = self.state();
            (std::mem::take(&mut state.windows), state.auto_hide.take())
        };
        if let Some(handle) = auto_hide {
            handle.cancel();
        }
        if windows.is_empty() {
            return;
        }

        self.inner.context.registry.clear();
        log_info!("hiding banner ({reason})");
        for window in windows {
            if let Err(err) = window.close() {
                log_warn!("closing {} failed: {err}", window.label());
            }
        }
    }
}
