//! Marshaling of work onto the thread that owns every window.
//!
//! Background threads never touch a window directly. They hand closures to a
//! [`UiDispatcher`], either fire-and-forget ([`UiDispatcher::dispatch`]) or
//! waiting for completion ([`UiDispatcher::dispatch_blocking`]). Both primitives
//! feed the same FIFO queue, so work posted earlier always runs first.

mod worker;

pub use worker::UiThread;

use std::sync::mpsc;

use crate::error::{OverlayError, OverlayResult};

pub type UiTask = Box<dyn FnOnce() + Send + 'static>;

pub trait UiDispatcher: Send + Sync {
    /// Queue `task` on the UI thread and return immediately.
    fn dispatch(&self, task: UiTask) -> OverlayResult<()>;

    /// Run `task` on the UI thread and return once it has finished.
    fn dispatch_blocking(&self, task: UiTask) -> OverlayResult<()>;
}

/// Run `task` on the UI thread and hand its result back to the caller.
pub fn run_blocking<T, F>(ui: &dyn UiDispatcher, task: F) -> OverlayResult<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    let (reply_tx, reply_rx) = mpsc::channel();
    ui.dispatch_blocking(Box::new(move || {
        let _ = reply_tx.send(task());
    }))?;
    reply_rx
        .recv()
        .map_err(|_| OverlayError::Dispatch("ui task finished without a result".into()))
}
