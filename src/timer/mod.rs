//! Scheduled tick sequences, independent of the scheduler that drives them.
//!
//! Elevation ticks, auto-hide and cleanup timers, and the wake poller are all
//! expressed as a [`TickPlan`] plus a callback. Production runs them on tokio;
//! tests crank a [`ManualTickScheduler`] by hand.

mod manual;
mod runtime;
mod ticks;

pub use manual::ManualTickScheduler;
pub use runtime::TokioTickScheduler;
pub use ticks::{TickFn, TickHandle, TickPlan, TickScheduler};
