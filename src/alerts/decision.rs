use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};

use crate::models::MeetingRecord;
use crate::settings::AlertConfig;

use super::text::{banner_text, notification_body, notification_title};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info};

/// Ids of meetings that have already been alerted in this process.
#[derive(Default)]
pub struct AlertedSet {
    ids: Mutex<HashSet<String>>,
}

impl AlertedSet {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<String>> {
        match self.ids.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.lock().contains(id)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.lock().iter().cloned().collect();
        ids.sort();
        ids
    }

}

/// Which minutes-to-start values qualify for an alert.
///
/// `minutes_to_start + lead_correction` must land in
/// `late_tolerance..=lead_minutes`. The correction biases toward alerting a
/// little early since the check runs at the top of a polling interval; the
/// lower bound still catches a meeting that started a moment ago.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlertWindow {
    pub lead_minutes: i64,
    pub lead_correction: i64,
    pub late_tolerance: i64,
}

impl AlertWindow {
    pub fn from_config(config: &AlertConfig) -> Self {
        Self {
            lead_minutes: config.alert_lead_minutes,
            lead_correction: config.lead_correction_minutes,
            late_tolerance: config.late_tolerance_minutes,
        }
    }

    pub fn effective_minutes(&self, minutes_to_start: i64) -> i64 {
        minutes_to_start.saturating_add(self.lead_correction)
    }

    pub fn qualifies(&self, minutes_to_start: i64) -> bool {
        let effective = self.effective_minutes(minutes_to_start);
        effective <= self.lead_minutes && effective >= self.late_tolerance
    }
}

/// Everything the dispatcher needs for one alert.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertBatch {
    pub banner_text: String,
    pub title: String,
    pub body: String,
    pub meetings: Vec<MeetingRecord>,
}

impl AlertBatch {
    pub fn for_meetings(meetings: Vec<MeetingRecord>) -> Self {
        Self {
            banner_text: banner_text(&meetings),
            title: notification_title(&meetings),
            body: notification_body(&meetings),
            meetings,
        }
    }
}

/// Receives at most one batch per decision pass.
pub trait AlertSink: Send + Sync {
    fn deliver(&self, batch: AlertBatch);
}

/// Decides, once per scheduler tick, which meetings get alerted.
#[derive(Default)]
pub struct AlertDecisionEngine {
    alerted: AlertedSet,
}

impl AlertDecisionEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alerted(&self) -> &AlertedSet {
        &self.alerted
    }

    /// Select the meetings to alert and mark them alerted.
    ///
    /// Ended meetings are evicted from the alerted set on the way. Selection
    /// and marking happen under one lock, so concurrent passes over the same
    /// list never both claim a meeting, and a channel failing downstream can
    /// never cause a repeat alert.
    pub fn evaluate(
        &self,
        meetings: &[MeetingRecord],
        window: AlertWindow,
        now: DateTime<Utc>,
    ) -> Option<AlertBatch> {
        let mut qualifying = Vec::new();
        {
            let mut alerted = self.alerted.lock();
            for meeting in meetings {
                let timing = meeting.timing_at(now);
                if timing.ended {
                    if alerted.remove(&meeting.id) {
                        log_debug!("evicted ended meeting {} from alerted set", meeting.id);
                    }
                    continue;
                }
                if !window.qualifies(timing.minutes_to_start) {
                    continue;
                }
                // false for ids already alerted or repeated in this list
                if alerted.insert(meeting.id.clone()) {
                    qualifying.push(meeting.clone());
                }
            }
        }

        if qualifying.is_empty() {
            return None;
        }

        log_info!(
            "{} meetings qualify for an alert (lead {} min)",
            qualifying.len(),
            window.lead_minutes
        );
        Some(AlertBatch::for_meetings(qualifying))
    }

    /// One full decision pass: evaluate, then hand the batch to `sink`.
    /// Returns how many meetings were alerted.
    pub fn run_pass(
        &self,
        meetings: &[MeetingRecord],
        window: AlertWindow,
        now: DateTime<Utc>,
        sink: &dyn AlertSink,
    ) -> usize {
        match self.evaluate(meetings, window, now) {
            Some(batch) => {
                let count = batch.meetings.len();
                sink.deliver(batch);
                count
            }
            None => 0,
        }
    }
}
