use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

/// Returned by [`MeetingRecord::minutes_to_start_at`] when the meeting has no start.
pub const NO_START_MINUTES: i64 = i64::MAX;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum ResponseStatus {
    #[default]
    None,
    Organizer,
    Accepted,
    TentativelyAccepted,
    Declined,
    NotResponded,
}

/// A calendar meeting as handed over by the calendar layer.
///
/// Records are rebuilt on every fetch and never mutated afterwards. Start and end
/// keep the offset of the event's own zone, and every derived value is computed
/// in that frame.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MeetingRecord {
    pub id: String,
    #[serde(default)]
    pub subject: String,
    pub start: Option<DateTime<FixedOffset>>,
    pub end: Option<DateTime<FixedOffset>>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub organizer: Option<String>,
    #[serde(default)]
    pub is_online_meeting: bool,
    #[serde(default)]
    pub online_meeting_url: Option<String>,
    #[serde(default)]
    pub calendar_name: Option<String>,
    #[serde(default)]
    pub response_status: ResponseStatus,
}

impl MeetingRecord {
    pub fn new(
        id: impl Into<String>,
        subject: impl Into<String>,
        start: Option<DateTime<FixedOffset>>,
        end: Option<DateTime<FixedOffset>>,
    ) -> Self {
        Self {
            id: id.into(),
            subject: subject.into(),
            start,
            end,
            location: None,
            organizer: None,
            is_online_meeting: false,
            online_meeting_url: None,
            calendar_name: None,
            response_status: ResponseStatus::None,
        }
    }

    /// Whole minutes until the start, truncated toward zero.
    ///
    /// `now` is converted into the event's own offset before subtracting, so an
    /// event scheduled in another zone than the host still reports correctly.
    pub fn minutes_to_start_at(&self, now: DateTime<Utc>) -> i64 {
        let Some(start) = self.start else {
            return NO_START_MINUTES;
        };
        let now_in_zone = now.with_timezone(start.offset());
        (start - now_in_zone).num_minutes()
    }

    /// Strictly between start and end.
    pub fn is_in_progress_at(&self, now: DateTime<Utc>) -> bool {
        match (self.start, self.end) {
            (Some(start), Some(end)) => {
                let now_in_zone = now.with_timezone(start.offset());
                now_in_zone > start && now_in_zone < end
            }
            _ => false,
        }
    }

    /// At or after the end. A meeting without an end never ends.
    pub fn has_ended_at(&self, now: DateTime<Utc>) -> bool {
        match self.end {
            Some(end) => now.with_timezone(end.offset()) >= end,
            None => false,
        }
    }

    pub fn minutes_to_start(&self) -> i64 {
        self.minutes_to_start_at(Utc::now())
    }

    pub fn is_in_progress(&self) -> bool {
        self.is_in_progress_at(Utc::now())
    }

    pub fn has_ended(&self) -> bool {
        self.has_ended_at(Utc::now())
    }

    /// All three derived values from a single clock read.
    pub fn timing_at(&self, now: DateTime<Utc>) -> MeetingTiming {
        MeetingTiming {
            minutes_to_start: self.minutes_to_start_at(now),
            in_progress: self.is_in_progress_at(now),
            ended: self.has_ended_at(now),
        }
    }

    pub fn display_subject(&self) -> &str {
        let trimmed = self.subject.trim();
        if trimmed.is_empty() {
            "(No subject)"
        } else {
            trimmed
        }
    }

    /// Start time as `HH:MM` in the event's zone.
    pub fn start_label(&self) -> Option<String> {
        self.start.map(|start| start.format("%H:%M").to_string())
    }

    pub fn join_url(&self) -> Option<&str> {
        if !self.is_online_meeting {
            return None;
        }
        self.online_meeting_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeetingTiming {
    pub minutes_to_start: i64,
    pub in_progress: bool,
    pub ended: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn offset(hours: i32) -> FixedOffset {
        FixedOffset::east_opt(hours * 3600).expect("valid offset")
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 14, 0, 0).unwrap()
    }

    fn meeting_starting_in(delta: Duration, zone: FixedOffset) -> MeetingRecord {
        let start = (now() + delta).with_timezone(&zone);
        MeetingRecord::new("m-1", "Standup", Some(start), Some(start + Duration::minutes(30)))
    }

    #[test]
    fn minutes_are_truncated_not_rounded() {
        let m = meeting_starting_in(Duration::seconds(90), offset(0));
        assert_eq!(m.minutes_to_start_at(now()), 1);

        let m = meeting_starting_in(Duration::seconds(30), offset(0));
        assert_eq!(m.minutes_to_start_at(now()), 0);

        let m = meeting_starting_in(Duration::seconds(-90), offset(0));
        assert_eq!(m.minutes_to_start_at(now()), -1);
    }

    #[test]
    fn event_zone_differs_from_host_zone() {
        let m = meeting_starting_in(Duration::minutes(10), offset(9));
        assert_eq!(m.minutes_to_start_at(now()), 10);

        let m = meeting_starting_in(Duration::minutes(10), offset(-5));
        assert_eq!(m.minutes_to_start_at(now()), 10);
    }

    #[test]
    fn missing_start_reports_sentinel() {
        let m = MeetingRecord::new("m-2", "No start", None, None);
        assert_eq!(m.minutes_to_start_at(now()), NO_START_MINUTES);
    }

    #[test]
    fn missing_end_never_ends_or_runs() {
        let start = (now() - Duration::hours(3)).fixed_offset();
        let m = MeetingRecord::new("m-3", "Open ended", Some(start), None);
        assert!(!m.has_ended_at(now()));
        assert!(!m.is_in_progress_at(now()));
    }

    #[test]
    fn in_progress_is_strict_and_end_is_inclusive() {
        let start = now().fixed_offset();
        let end = start + Duration::minutes(30);
        let m = MeetingRecord::new("m-4", "Review", Some(start), Some(end));

        assert!(!m.is_in_progress_at(now()));
        assert!(m.is_in_progress_at(now() + Duration::minutes(1)));
        assert!(!m.is_in_progress_at(now() + Duration::minutes(30)));
        assert!(m.has_ended_at(now() + Duration::minutes(30)));
        assert!(!m.has_ended_at(now() + Duration::minutes(29)));
    }

    #[test]
    fn timing_snapshot_uses_one_clock_read() {
        let m = meeting_starting_in(Duration::minutes(-5), offset(2));
        let timing = m.timing_at(now());
        assert_eq!(timing.minutes_to_start, -5);
        assert!(timing.in_progress);
        assert!(!timing.ended);
    }

    #[test]
    fn display_helpers() {
        let mut m = meeting_starting_in(Duration::minutes(5), offset(1));
        m.subject = "   ".into();
        assert_eq!(m.display_subject(), "(No subject)");
        assert_eq!(m.start_label().as_deref(), Some("15:05"));

        m.online_meeting_url = Some("https://meet.example/abc".into());
        assert_eq!(m.join_url(), None);
        m.is_online_meeting = true;
        assert_eq!(m.join_url(), Some("https://meet.example/abc"));
    }

    #[test]
    fn deserializes_calendar_payload() {
        let json = r#"{
            "id": "evt-9",
            "subject": "Planning",
            "start": "2026-03-02T15:00:00+01:00",
            "end": "2026-03-02T16:00:00+01:00",
            "isOnlineMeeting": true,
            "onlineMeetingUrl": "https://meet.example/x",
            "responseStatus": "accepted"
        }"#;
        let m: MeetingRecord = serde_json::from_str(json).expect("parse");
        assert_eq!(m.minutes_to_start_at(now()), 0);
        assert_eq!(m.response_status, ResponseStatus::Accepted);
        assert!(m.location.is_none());
    }
}
