use std::sync::{Mutex, MutexGuard};

use super::WindowRef;

/// Banner windows currently on screen.
///
/// Written by the banner coordinator, read by the flash engine on every
/// elevation tick. Holds nothing once the banner has been disposed.
#[derive(Default)]
pub struct OverlayRegistry {
    windows: Mutex<Vec<WindowRef>>,
}

impl OverlayRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<WindowRef>> {
        match self.windows.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn register<I>(&self, windows: I)
    where
        I: IntoIterator<Item = WindowRef>,
    {
        self.lock().extend(windows);
    }

    /// Empty the registry, returning what it held.
    pub fn clear(&self) -> Vec<WindowRef> {
        std::mem::take(&mut *self.lock())
    }

    /// Copy of the current entries; callers iterate without holding the lock.
    pub fn snapshot(&self) -> Vec<WindowRef> {
        self.lock().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }
}
