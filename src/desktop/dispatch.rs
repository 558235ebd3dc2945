use std::sync::mpsc;
use std::thread::{self, ThreadId};

use tauri::AppHandle;

use crate::error::{OverlayError, OverlayResult};
use crate::ui::{UiDispatcher, UiTask};

/// Runs UI work on the Tauri main thread.
///
/// Must be constructed on the main thread (e.g. in `setup`) so blocking
/// dispatches issued from the main thread itself can run inline.
pub struct TauriDispatcher {
    app: AppHandle,
    main_thread: ThreadId,
}

impl TauriDispatcher {
    pub fn new(app: AppHandle) -> Self {
        Self {
            app,
            main_thread: thread::current().id(),
        }
    }

    fn on_main_thread(&self) -> bool {
        thread::current().id() == self.main_thread
    }
}

impl UiDispatcher for TauriDispatcher {
    fn dispatch(&self, task: UiTask) -> OverlayResult<()> {
        self.app
            .run_on_main_thread(task)
            .map_err(|e| OverlayError::Dispatch(e.to_string()))
    }

    fn dispatch_blocking(&self, task: UiTask) -> OverlayResult<()> {
        if self.on_main_thread() {
            task();
            return Ok(());
        }

        let (done_tx, done_rx) = mpsc::channel::<()>();
        self.app
            .run_on_main_thread(move || {
                task();
                let _ = done_tx.send(());
            })
            .map_err(|e| OverlayError::Dispatch(e.to_string()))?;
        done_rx
            .recv()
            .map_err(|_| OverlayError::Dispatch("main thread dropped the task".into()))
    }
}
