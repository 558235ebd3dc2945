/// Per-OS differences in how overlays are placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashPlatform {
    MacOs,
    Windows,
    CrossPlatform,
}

impl FlashPlatform {
    pub fn current() -> Self {
        if cfg!(target_os = "macos") {
            FlashPlatform::MacOs
        } else if cfg!(target_os = "windows") {
            FlashPlatform::Windows
        } else {
            FlashPlatform::CrossPlatform
        }
    }

    /// Top inset in logical pixels for monitors that do not report a work area.
    pub fn top_inset(self) -> f64 {
        match self {
            // menu bar
            FlashPlatform::MacOs => 25.0,
            FlashPlatform::Windows | FlashPlatform::CrossPlatform => 0.0,
        }
    }

    /// Whether overlays should follow the user across virtual desktops.
    pub fn all_workspaces(self) -> bool {
        matches!(self, FlashPlatform::MacOs | FlashPlatform::CrossPlatform)
    }
}
