use crate::models::MeetingRecord;

/// Text shown in the banner strip.
pub fn banner_text(meetings: &[MeetingRecord]) -> String {
    match meetings {
        [single] => format!("Upcoming meeting: {}", single.display_subject()),
        many => format!("{} upcoming meetings", many.len()),
    }
}

pub fn notification_title(meetings: &[MeetingRecord]) -> String {
    match meetings.len() {
        1 => "Meeting starting soon".to_string(),
        count => format!("{count} meetings starting soon"),
    }
}

/// One line per meeting: subject, local start time, location.
pub fn notification_body(meetings: &[MeetingRecord]) -> String {
    meetings
        .iter()
        .map(|meeting| {
            let mut line = meeting.display_subject().to_string();
            if let Some(start) = meeting.start_label() {
                line.push_str(" at ");
                line.push_str(&start);
            }
            if let Some(location) = meeting
                .location
                .as_deref()
                .map(str::trim)
                .filter(|l| !l.is_empty())
            {
                line.push_str(&format!(" ({location})"));
            }
            line
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Lines painted on the full-screen flash overlay.
pub fn flash_lines(meetings: &[MeetingRecord]) -> Vec<String> {
    meetings
        .iter()
        .map(|meeting| {
            let mut line = meeting.display_subject().to_string();
            if let Some(start) = meeting.start_label() {
                line.push_str(&format!(" at {start}"));
            }
            if meeting.join_url().is_some() {
                line.push_str(" · Join online");
            }
            line
        })
        .collect()
}
