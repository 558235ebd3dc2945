use std::{
    panic::{self, AssertUnwindSafe},
    sync::{mpsc, Arc, Mutex},
    thread::{self, JoinHandle, ThreadId},
};

use crate::error::{OverlayError, OverlayResult};

use super::{UiDispatcher, UiTask};

const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info};

enum UiCommand {
    Run(UiTask),
    Shutdown,
}

struct UiThreadInner {
    sender: mpsc::Sender<UiCommand>,
    thread_id: ThreadId,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for UiThreadInner {
    fn drop(&mut self) {
        let mut guard = match self.worker.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if let Some(handle) = guard.take() {
            let _ = self.sender.send(UiCommand::Shutdown);
            if thread::current().id() == self.thread_id {
                return;
            }
            if let Err(join_err) = handle.join() {
                log_error!("Failed to join ui thread: {join_err:?}");
            }
        }
    }
}

/// A single cooperative UI thread with its own task queue.
///
/// Used wherever no native event loop is available: headless runs and tests.
/// A blocking dispatch issued from the UI thread itself runs inline instead of
/// deadlocking on its own queue.
#[derive(Clone)]
pub struct UiThread {
    inner: Arc<UiThreadInner>,
}

impl UiThread {
    pub fn spawn(name: &str) -> OverlayResult<Self> {
        let (command_tx, command_rx) = mpsc::channel::<UiCommand>();
        let thread_name = name.to_string();

        let worker = thread::Builder::new()
            .name(thread_name.clone())
            .spawn(move || {
                while let Ok(command) = command_rx.recv() {
                    match command {
                        UiCommand::Run(task) => {
                            if panic::catch_unwind(AssertUnwindSafe(task)).is_err() {
                                log_error!("ui task panicked on {thread_name}; continuing");
                            }
                        }
                        UiCommand::Shutdown => break,
                    }
                }
                log_info!("ui thread {thread_name} shutting down");
            })
            .map_err(|err| OverlayError::Dispatch(format!("failed to spawn ui thread: {err}")))?;

        let thread_id = worker.thread().id();
        Ok(Self {
            inner: Arc::new(UiThreadInner {
                sender: command_tx,
                thread_id,
                worker: Mutex::new(Some(worker)),
            }),
        })
    }

    pub fn is_ui_thread(&self) -> bool {
        thread::current().id() == self.inner.thread_id
    }

    /// Wait until everything queued before this call has run.
    pub fn flush(&self) -> OverlayResult<()> {
        self.dispatch_blocking(Box::new(|| {}))
    }

    fn send(&self, task: UiTask) -> OverlayResult<()> {
        self.inner
            .sender
            .send(UiCommand::Run(task))
            .map_err(|_| OverlayError::Dispatch("ui thread has shut down".into()))
    }
}

impl UiDispatcher for UiThread {
    fn dispatch(&self, task: UiTask) -> OverlayResult<()> {
        self.send(task)
    }

    fn dispatch_blocking(&self, task: UiTask) -> OverlayResult<()> {
        if self.is_ui_thread() {
            task();
            return Ok(());
        }

        let (done_tx, done_rx) = mpsc::channel::<()>();
        self.send(Box::new(move || {
            task();
            let _ = done_tx.send(());
        }))?;

        done_rx
            .recv()
            .map_err(|_| OverlayError::Dispatch("ui task did not complete".into()))
    }
}
