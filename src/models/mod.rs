mod meeting;

pub use meeting::{MeetingRecord, MeetingTiming, ResponseStatus, NO_START_MINUTES};
