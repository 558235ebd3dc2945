//! Full-screen flash overlays and the thin banner drawn on top of them.
//!
//! Both systems create their windows through a [`DisplayEnvironment`] and only
//! ever touch those windows from the UI thread. They share one signal: the
//! [`OverlayRegistry`] of banner windows currently on screen.

mod banner;
mod flash;
mod latch;
mod platform;
mod registry;

#[cfg(test)]
pub(crate) mod test_support;

pub use banner::{BannerCoordinator, BannerLayout, FontMetrics, BANNER_VISIBLE_FOR};
pub use flash::{
    create_flasher, FlashEngine, FlashPhase, HeadlessFlasher, ScreenFlasher, ELEVATION_FIRST_DELAY,
    ELEVATION_INTERVAL, ELEVATION_TICKS,
};
pub use latch::{FlashReadyLatch, ReadyCallback};
pub use platform::FlashPlatform;
pub use registry::OverlayRegistry;

use std::sync::Arc;

use serde::Serialize;

use crate::error::OverlayResult;
use crate::settings::ConfigStore;
use crate::timer::TickScheduler;
use crate::ui::UiDispatcher;

/// A monitor's placement in its own logical pixels (physical / `scale_factor`).
///
/// Monitors with different scale factors do not share a logical coordinate
/// space, so windows are placed through [`MonitorBounds::physical_frame`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorBounds {
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub scale_factor: f64,
    /// Top strip the OS keeps for menu bars or docked panels, when it reports one.
    pub reserved_top: Option<f64>,
}

/// Window frame in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhysicalFrame {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl MonitorBounds {
    pub fn top_inset_or(&self, fallback: f64) -> f64 {
        self.reserved_top.unwrap_or(fallback)
    }

    pub fn physical_frame(&self) -> PhysicalFrame {
        let scale = self.scale_factor;
        PhysicalFrame {
            x: (self.x * scale).round() as i32,
            y: (self.y * scale).round() as i32,
            width: (self.width * scale).round().max(0.0) as u32,
            height: (self.height * scale).round().max(0.0) as u32,
        }
    }

    /// The same monitor with `inset` logical pixels removed from the top.
    pub fn below_top_inset(&self, inset: f64) -> Self {
        let inset = inset.clamp(0.0, self.height);
        Self {
            y: self.y + inset,
            height: self.height - inset,
            ..self.clone()
        }
    }
}

/// Handle to one on-screen overlay window. Only call these on the UI thread.
pub trait OverlayWindow: Send + Sync {
    fn label(&self) -> &str;
    fn bring_to_front(&self) -> OverlayResult<()>;
    fn set_always_on_top(&self, on_top: bool) -> OverlayResult<()>;
    fn request_attention(&self) -> OverlayResult<()>;
    fn close(&self) -> OverlayResult<()>;
}

pub type WindowRef = Arc<dyn OverlayWindow>;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlashWindowRequest {
    pub label: String,
    pub monitor: MonitorBounds,
    pub background: String,
    pub text_color: String,
    pub opacity: f64,
    pub lines: Vec<String>,
    pub all_workspaces: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BannerWindowRequest {
    pub label: String,
    pub monitor: MonitorBounds,
    pub border_color: String,
    pub text: String,
    pub layout: BannerLayout,
    pub all_workspaces: bool,
}

/// The windowing toolkit as seen by the overlay systems.
///
/// Every method is called on the UI thread.
pub trait DisplayEnvironment: Send + Sync {
    fn monitors(&self) -> OverlayResult<Vec<MonitorBounds>>;
    fn create_flash_window(&self, request: &FlashWindowRequest) -> OverlayResult<WindowRef>;
    fn create_banner_window(&self, request: &BannerWindowRequest) -> OverlayResult<WindowRef>;
}

/// What the flash engine and the banner coordinator share.
#[derive(Clone)]
pub struct OverlayContext {
    pub ui: Arc<dyn UiDispatcher>,
    pub ticks: Arc<dyn TickScheduler>,
    pub registry: Arc<OverlayRegistry>,
    pub latch: Arc<FlashReadyLatch>,
    pub config: Arc<ConfigStore>,
    pub platform: FlashPlatform,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn retina() -> MonitorBounds {
        MonitorBounds {
            name: "built-in".into(),
            x: 0.0,
            y: 0.0,
            width: 1512.0,
            height: 982.0,
            scale_factor: 2.0,
            reserved_top: Some(37.0),
        }
    }

    #[test]
    fn reported_inset_wins_over_the_fallback() {
        assert_eq!(retina().top_inset_or(25.0), 37.0);
        let unknown = MonitorBounds {
            reserved_top: None,
            ..retina()
        };
        assert_eq!(unknown.top_inset_or(25.0), 25.0);
    }

    #[test]
    fn physical_frame_scales_by_the_monitors_own_factor() {
        let frame = retina().below_top_inset(37.0).physical_frame();
        assert_eq!(
            frame,
            PhysicalFrame {
                x: 0,
                y: 74,
                width: 3024,
                height: 1890,
            }
        );
    }
}
