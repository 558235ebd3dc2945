use serde::Serialize;
use tauri::{
    AppHandle, PhysicalPosition, PhysicalSize, UserAttentionType, WebviewUrl, WebviewWindow,
    WebviewWindowBuilder,
};

use crate::error::{OverlayError, OverlayResult};
use crate::overlay::{
    BannerWindowRequest, DisplayEnvironment, FlashWindowRequest, MonitorBounds, OverlayWindow,
    WindowRef,
};

const ENABLE_LOGS: bool = true;

use crate::log_warn;

/// Global the overlay pages read their content from.
pub const OVERLAY_PAYLOAD_GLOBAL: &str = "__MEETING_ALERT__";

/// Creates overlay webview windows through Tauri.
pub struct TauriDisplay {
    app: AppHandle,
}

impl TauriDisplay {
    pub fn new(app: AppHandle) -> Self {
        Self { app }
    }

    fn builder<'a, T: Serialize>(
        &'a self,
        label: &str,
        page: &str,
        monitor: &MonitorBounds,
        payload: &T,
    ) -> OverlayResult<WebviewWindowBuilder<'a, tauri::Wry, AppHandle>> {
        let payload = serde_json::to_string(payload)
            .map_err(|e| OverlayError::Window(format!("payload for {label}: {e}")))?;
        let script = format!("window.{OVERLAY_PAYLOAD_GLOBAL} = {payload};");

        Ok(
            WebviewWindowBuilder::new(&self.app, label, WebviewUrl::App(page.into()))
                .title("Meeting alert")
                .visible(false)
                .decorations(false)
                .transparent(true)
                .shadow(false)
                .resizable(false)
                .skip_taskbar(true)
                .always_on_top(true)
                .initialization_script(&script),
        )
    }
}

/// Monitor bounds from what the OS reports in physical pixels.
fn monitor_bounds(
    name: String,
    position: PhysicalPosition<i32>,
    size: PhysicalSize<u32>,
    work_area_top: i32,
    scale: f64,
) -> MonitorBounds {
    MonitorBounds {
        name,
        x: position.x as f64 / scale,
        y: position.y as f64 / scale,
        width: size.width as f64 / scale,
        height: size.height as f64 / scale,
        scale_factor: scale,
        reserved_top: Some((work_area_top - position.y).max(0) as f64 / scale),
    }
}

/// Place a freshly built, hidden window on its monitor in physical pixels.
fn place(window: &WebviewWindow, monitor: &MonitorBounds) -> tauri::Result<()> {
    let frame = monitor.physical_frame();
    window.set_position(PhysicalPosition::new(frame.x, frame.y))?;
    window.set_size(PhysicalSize::new(frame.width, frame.height))?;
    window.show()
}

fn creation_error(monitor: &MonitorBounds, err: tauri::Error) -> OverlayError {
    OverlayError::WindowCreation {
        monitor: monitor.name.clone(),
        reason: err.to_string(),
    }
}

impl DisplayEnvironment for TauriDisplay {
    fn monitors(&self) -> OverlayResult<Vec<MonitorBounds>> {
        let monitors = self
            .app
            .available_monitors()
            .map_err(|e| OverlayError::Window(e.to_string()))?;

        Ok(monitors
            .iter()
            .enumerate()
            .map(|(index, monitor)| {
                monitor_bounds(
                    monitor
                        .name()
                        .cloned()
                        .unwrap_or_else(|| format!("monitor-{index}")),
                    *monitor.position(),
                    *monitor.size(),
                    monitor.work_area().position.y,
                    monitor.scale_factor(),
                )
            })
            .collect())
    }

    fn create_flash_window(&self, request: &FlashWindowRequest) -> OverlayResult<WindowRef> {
        let window = self
            .builder(&request.label, "flash.html", &request.monitor, request)?
            .focused(true)
            .visible_on_all_workspaces(request.all_workspaces)
            .build()
            .map_err(|e| creation_error(&request.monitor, e))?;
        let window = TauriOverlayWindow::wrap(window, FLASH_RAISE);
        place(&window.window, &request.monitor).map_err(|e| creation_error(&request.monitor, e))?;

        Ok(window)
    }

    fn create_banner_window(&self, request: &BannerWindowRequest) -> OverlayResult<WindowRef> {
        let window = self
            .builder(&request.label, "banner.html", &request.monitor, request)?
            .focused(false)
            .visible_on_all_workspaces(request.all_workspaces)
            .build()
            .map_err(|e| creation_error(&request.monitor, e))?;

        // Only the frame is drawn; clicks pass through the empty middle.
        if let Err(err) = window.set_ignore_cursor_events(true) {
            log_warn!("banner {} still captures the cursor: {err}", request.label);
        }
        let window = TauriOverlayWindow::wrap(window, BANNER_RAISE);
        place(&window.window, &request.monitor).map_err(|e| creation_error(&request.monitor, e))?;

        Ok(window)
    }
}

/// How a window is brought to the front on each elevation tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Raise {
    /// Show and take keyboard focus.
    Focus,
    /// Show and re-assert topmost; the user's focus stays where it is.
    InPlace,
}

impl Raise {
    pub fn takes_focus(self) -> bool {
        matches!(self, Raise::Focus)
    }
}

const FLASH_RAISE: Raise = Raise::Focus;
const BANNER_RAISE: Raise = Raise::InPlace;

pub struct TauriOverlayWindow {
    label: String,
    window: WebviewWindow,
    raise: Raise,
}

impl TauriOverlayWindow {
    pub fn wrap(window: WebviewWindow, raise: Raise) -> std::sync::Arc<Self> {
        std::sync::Arc::new(Self {
            label: window.label().to_string(),
            window,
            raise,
        })
    }
}

fn window_error(label: &str, action: &str, err: tauri::Error) -> OverlayError {
    OverlayError::Window(format!("{action} {label}: {err}"))
}

impl OverlayWindow for TauriOverlayWindow {
    fn label(&self) -> &str {
        &self.label
    }

    fn bring_to_front(&self) -> OverlayResult<()> {
        self.window
            .show()
            .and_then(|_| {
                if self.raise.takes_focus() {
                    self.window.set_focus()
                } else {
                    self.window
                        .set_always_on_top(false)
                        .and_then(|_| self.window.set_always_on_top(true))
                }
            })
            .map_err(|e| window_error(&self.label, "raising", e))
    }

    fn set_always_on_top(&self, on_top: bool) -> OverlayResult<()> {
        self.window
            .set_always_on_top(on_top)
            .map_err(|e| window_error(&self.label, "pinning", e))
    }

    fn request_attention(&self) -> OverlayResult<()> {
        self.window
            .request_user_attention(Some(UserAttentionType::Critical))
            .map_err(|e| window_error(&self.label, "requesting attention for", e))
    }

    fn close(&self) -> OverlayResult<()> {
        self.window
            .destroy()
            .map_err(|e| window_error(&self.label, "closing", e))
    }
}
