use std::time::Duration;

use tokio_util::sync::CancellationToken;

pub type TickFn = Box<dyn FnMut(u32) + Send + 'static>;

/// When a tick sequence fires: once after `first_delay`, then every
/// `interval`, until `max_ticks` ticks have run (or forever when `None`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickPlan {
    pub first_delay: Duration,
    pub interval: Duration,
    pub max_ticks: Option<u32>,
}

impl TickPlan {
    pub fn once(delay: Duration) -> Self {
        Self {
            first_delay: delay,
            interval: Duration::ZERO,
            max_ticks: Some(1),
        }
    }

    pub fn repeating(first_delay: Duration, interval: Duration, max_ticks: u32) -> Self {
        Self {
            first_delay,
            interval,
            max_ticks: Some(max_ticks),
        }
    }

    pub fn forever(interval: Duration) -> Self {
        Self {
            first_delay: interval,
            interval,
            max_ticks: None,
        }
    }

    /// `tick` is 1-based.
    pub fn is_last(&self, tick: u32) -> bool {
        self.max_ticks.is_some_and(|max| tick >= max)
    }

    /// Offset from scheduling time at which `tick` fires.
    pub fn due_at(&self, tick: u32) -> Duration {
        self.first_delay + self.interval * tick.saturating_sub(1)
    }
}

/// Cancels a scheduled tick sequence. Dropping the handle leaves it running.
#[derive(Debug, Clone, Default)]
pub struct TickHandle {
    token: CancellationToken,
}

impl TickHandle {
    pub fn new(token: CancellationToken) -> Self {
        Self { token }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub(crate) fn token(&self) -> CancellationToken {
        self.token.clone()
    }
}

/// Anything that can run a [`TickPlan`]: a tokio runtime, or a hand-cranked clock.
///
/// Ticks are delivered on whatever thread the scheduler uses. Callbacks that
/// need window access must marshal onto the UI thread themselves.
pub trait TickScheduler: Send + Sync {
    fn schedule(&self, plan: TickPlan, on_tick: TickFn) -> TickHandle;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeating_plan_offsets() {
        let plan = TickPlan::repeating(Duration::from_millis(100), Duration::from_millis(200), 5);
        assert_eq!(plan.due_at(1), Duration::from_millis(100));
        assert_eq!(plan.due_at(2), Duration::from_millis(300));
        assert_eq!(plan.due_at(5), Duration::from_millis(900));
        assert!(!plan.is_last(4));
        assert!(plan.is_last(5));
    }

    #[test]
    fn forever_plan_never_terminates() {
        let plan = TickPlan::forever(Duration::from_secs(30));
        assert!(!plan.is_last(u32::MAX));
        assert_eq!(plan.due_at(1), Duration::from_secs(30));
    }
}
