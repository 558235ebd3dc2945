//! Deciding which meetings to alert and fanning each alert out to its channels.

mod decision;
mod dispatcher;
mod scheduler;
mod source;
pub mod text;

pub use decision::{AlertBatch, AlertDecisionEngine, AlertSink, AlertWindow, AlertedSet};
pub use dispatcher::{AlertDispatcher, DispatchHandles};
pub use scheduler::AlertScheduler;
pub use source::{InMemoryMeetingSource, MeetingSource};
