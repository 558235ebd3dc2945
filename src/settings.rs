use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    sync::RwLock,
    time::Duration,
};

const ENABLE_LOGS: bool = true;

use crate::log_warn;

pub const DEFAULT_FLASH_COLOR: &str = "#b00020";
pub const DEFAULT_FLASH_TEXT_COLOR: &str = "#ffffff";
pub const DEFAULT_BANNER_COLOR: &str = "#ff9800";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct AlertConfig {
    pub flash_color: String,
    pub flash_text_color: String,
    pub flash_opacity: f64,
    pub flash_duration_seconds: u64,
    pub alert_lead_minutes: i64,
    pub alert_beep_count: i64,
    pub banner_color: String,
    pub banner_font_size: f64,
    pub refresh_interval_seconds: u64,
    /// Added to the minutes-to-start before comparing with the lead time.
    pub lead_correction_minutes: i64,
    /// Lowest effective minute value that still qualifies (a meeting that just started).
    pub late_tolerance_minutes: i64,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            flash_color: DEFAULT_FLASH_COLOR.into(),
            flash_text_color: DEFAULT_FLASH_TEXT_COLOR.into(),
            flash_opacity: 0.85,
            flash_duration_seconds: 5,
            alert_lead_minutes: 1,
            alert_beep_count: 3,
            banner_color: DEFAULT_BANNER_COLOR.into(),
            banner_font_size: 28.0,
            refresh_interval_seconds: 60,
            lead_correction_minutes: 1,
            late_tolerance_minutes: -1,
        }
    }
}

impl AlertConfig {
    /// Clamp every field into its valid range. Invalid colors fall back to defaults.
    pub fn normalized(mut self) -> Self {
        let defaults = Self::default();
        if !is_hex_color(&self.flash_color) {
            self.flash_color = defaults.flash_color;
        }
        if !is_hex_color(&self.flash_text_color) {
            self.flash_text_color = defaults.flash_text_color;
        }
        if !is_hex_color(&self.banner_color) {
            self.banner_color = defaults.banner_color;
        }
        self.flash_opacity = if self.flash_opacity.is_finite() {
            self.flash_opacity.clamp(0.0, 1.0)
        } else {
            defaults.flash_opacity
        };
        self.flash_duration_seconds = self.flash_duration_seconds.max(1);
        self.alert_beep_count = self.alert_beep_count.max(0);
        self.banner_font_size = if self.banner_font_size.is_finite() {
            self.banner_font_size.clamp(10.0, 96.0)
        } else {
            defaults.banner_font_size
        };
        self.refresh_interval_seconds = self.refresh_interval_seconds.max(5);
        self
    }

    pub fn beep_count(&self) -> u32 {
        u32::try_from(self.alert_beep_count.max(0)).unwrap_or(u32::MAX)
    }

    pub fn flash_duration(&self) -> Duration {
        Duration::from_secs(self.flash_duration_seconds.max(1))
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_seconds.max(5))
    }
}

fn is_hex_color(value: &str) -> bool {
    let raw = value.trim();
    let Some(hex) = raw.strip_prefix('#') else {
        return false;
    };
    matches!(hex.len(), 3 | 6 | 8) && hex.chars().all(|c| c.is_ascii_hexdigit())
}

/// Alert configuration read once from disk and updated in memory afterwards.
pub struct ConfigStore {
    path: Option<PathBuf>,
    data: RwLock<AlertConfig>,
}

impl ConfigStore {
    pub fn load(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            read_config(&path)?
        } else {
            AlertConfig::default()
        };

        Ok(Self {
            path: Some(path),
            data: RwLock::new(data.normalized()),
        })
    }

    pub fn in_memory(config: AlertConfig) -> Self {
        Self {
            path: None,
            data: RwLock::new(config.normalized()),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn current(&self) -> AlertConfig {
        match self.data.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Replace the configuration, writing it back to disk when file-backed.
    pub fn update(&self, config: AlertConfig) -> Result<AlertConfig> {
        let normalized = config.normalized();
        let mut guard = match self.data.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        self.persist(&normalized)?;
        *guard = normalized.clone();
        Ok(normalized)
    }

    fn persist(&self, config: &AlertConfig) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let serialized = serde_json::to_string_pretty(config)?;
        fs::write(path, serialized)
            .with_context(|| format!("Failed to write alert config to {}", path.display()))
    }
}

fn read_config(path: &Path) -> Result<AlertConfig> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read alert config from {}", path.display()))?;
    match serde_json::from_str(&contents) {
        Ok(config) => Ok(config),
        Err(err) => {
            log_warn!(
                "Ignoring malformed alert config at {}: {err}",
                path.display()
            );
            Ok(AlertConfig::default())
        }
    }
}
