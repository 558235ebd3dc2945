use std::sync::{Mutex, MutexGuard};

pub type ReadyCallback = Box<dyn FnOnce() + Send + 'static>;

/// One-shot "flash windows are on screen" signal.
///
/// The dispatcher arms it once per alert cycle, the flash engine fires it right
/// after its windows exist. Firing swaps the callback out, so a second fire in
/// the same cycle finds nothing and does nothing.
#[derive(Default)]
pub struct FlashReadyLatch {
    slot: Mutex<Option<ReadyCallback>>,
}

impl FlashReadyLatch {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Option<ReadyCallback>> {
        match self.slot.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Arm the latch, replacing any callback left over from an earlier cycle.
    pub fn set(&self, callback: ReadyCallback) {
        *self.lock() = Some(callback);
    }

    /// Run the armed callback, if any. Returns whether something ran.
    pub fn fire_once(&self) -> bool {
        let callback = self.lock().take();
        match callback {
            Some(callback) => {
                callback();
                true
            }
            None => false,
        }
    }

    pub fn clear(&self) {
        self.lock().take();
    }

    pub fn is_armed(&self) -> bool {
        self.lock().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn counting(counter: &Arc<AtomicU32>) -> ReadyCallback {
        let counter = Arc::clone(counter);
        Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn fires_exactly_once_per_arming() {
        let latch = FlashReadyLatch::new();
        let counter = Arc::new(AtomicU32::new(0));

        latch.set(counting(&counter));
        assert!(latch.is_armed());
        assert!(latch.fire_once());
        assert!(!latch.fire_once());
        assert!(!latch.is_armed());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn firing_unarmed_latch_is_a_noop() {
        let latch = FlashReadyLatch::new();
        assert!(!latch.fire_once());
    }

    #[test]
    fn clear_discards_callback() {
        let latch = FlashReadyLatch::new();
        let counter = Arc::new(AtomicU32::new(0));
        latch.set(counting(&counter));
        latch.clear();
        assert!(!latch.fire_once());
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn callback_may_rearm_without_deadlock() {
        let latch = Arc::new(FlashReadyLatch::new());
        let counter = Arc::new(AtomicU32::new(0));
        let rearm_latch = Arc::clone(&latch);
        let rearm_counter = Arc::clone(&counter);
        latch.set(Box::new(move || {
            rearm_latch.set(counting(&rearm_counter));
        }));

        assert!(latch.fire_once());
        assert!(latch.is_armed());
        assert!(latch.fire_once());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
