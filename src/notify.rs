use anyhow::Result;

/// Posts a system notification. Called on the UI thread.
pub trait Notifier: Send + Sync {
    fn notify(&self, title: &str, body: &str) -> Result<()>;
}
