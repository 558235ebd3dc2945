//! Tauri-backed implementations of the UI-thread, display and notification seams.

mod dispatch;
mod display;
mod notifier;

pub use dispatch::TauriDispatcher;
pub use display::{Raise, TauriDisplay, TauriOverlayWindow, OVERLAY_PAYLOAD_GLOBAL};
pub use notifier::TauriNotifier;
