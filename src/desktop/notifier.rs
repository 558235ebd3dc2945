use anyhow::{Context, Result};
use tauri::AppHandle;
use tauri_plugin_notification::NotificationExt;

use crate::notify::Notifier;

pub struct TauriNotifier {
    app: AppHandle,
}

impl TauriNotifier {
    pub fn new(app: AppHandle) -> Self {
        Self { app }
    }
}

impl Notifier for TauriNotifier {
    fn notify(&self, title: &str, body: &str) -> Result<()> {
        self.app
            .notification()
            .builder()
            .title(title)
            .body(body)
            .show()
            .context("failed to post system notification")
    }
}
