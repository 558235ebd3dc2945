use std::sync::RwLock;

use crate::models::MeetingRecord;

/// Where the current meeting list comes from.
pub trait MeetingSource: Send + Sync {
    fn meetings(&self) -> Vec<MeetingRecord>;
}

/// Meetings pushed in by the frontend.
#[derive(Default)]
pub struct InMemoryMeetingSource {
    meetings: RwLock<Vec<MeetingRecord>>,
}

impl InMemoryMeetingSource {
    pub fn new(meetings: Vec<MeetingRecord>) -> Self {
        Self {
            meetings: RwLock::new(meetings),
        }
    }

    /// Swap in a new list; returns how many meetings it holds.
    pub fn replace(&self, meetings: Vec<MeetingRecord>) -> usize {
        let count = meetings.len();
        match self.meetings.write() {
            Ok(mut guard) => *guard = meetings,
            Err(poisoned) => *poisoned.into_inner() = meetings,
        }
        count
    }
}

impl MeetingSource for InMemoryMeetingSource {
    fn meetings(&self) -> Vec<MeetingRecord> {
        match self.meetings.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}
