use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Weekday};
use chrono_tz::Tz;

use crate::config::{SLOT_LENGTH_MINUTES, VENUE_TZ};
use crate::types::{SlotAvailability, SlotBookingStatus, SlotReport, TargetReport};

/// Derives a booking status for a slot from the wall clock and the observed court count.
#[derive(Debug, Clone, Copy)]
pub struct SlotClassifier {
    lead_window: Duration,
    slot_length: Duration,
}

impl SlotClassifier {
    pub fn new(lead_window_hours: i64) -> Self {
        Self {
            lead_window: Duration::try_hours(lead_window_hours).unwrap_or(Duration::MAX),
            slot_length: Duration::minutes(SLOT_LENGTH_MINUTES),
        }
    }

    /// Status implied by time alone: past the slot's end is outdated, further out than
    /// the lead window is not opened, anything in between is opened.
    pub fn time_window_status(&self, slot_start: DateTime<Tz>, now: DateTime<Tz>) -> SlotBookingStatus {
        if now > slot_start + self.slot_length {
            SlotBookingStatus::Outdated
        } else if slot_start.signed_duration_since(now) > self.lead_window {
            SlotBookingStatus::NotOpened
        } else {
            SlotBookingStatus::Opened
        }
    }

    /// Free courts always win over the time heuristic.
    pub fn classify(&self, slot_start: DateTime<Tz>, count: usize, now: DateTime<Tz>) -> SlotBookingStatus {
        if count > 0 {
            SlotBookingStatus::Opened
        } else {
            self.time_window_status(slot_start, now)
        }
    }
}

/// Classifies every tracked slot of one target date from a successful fetch.
pub fn classify_target(
    classifier: &SlotClassifier,
    weekday: Weekday,
    date: NaiveDate,
    slot_times: &[NaiveTime],
    availability: &SlotAvailability,
    now: DateTime<Tz>,
) -> TargetReport {
    let slots = slot_times
        .iter()
        .map(|&time| {
            let key = date.and_time(time);
            let count = availability.get(&key).copied().unwrap_or(0);
            SlotReport {
                time,
                status: classifier.classify(venue_local(key), count, now),
                count: count as i64,
            }
        })
        .collect();

    TargetReport {
        weekday,
        date,
        slots,
        error_message: None,
    }
}

/// Venue wall-clock time → zoned instant. A time skipped by the spring-forward jump
/// moves forward by the gap, so 02:30 reads as 03:30.
pub fn venue_local(naive: NaiveDateTime) -> DateTime<Tz> {
    VENUE_TZ
        .from_local_datetime(&naive)
        .earliest()
        .or_else(|| VENUE_TZ.from_local_datetime(&(naive + Duration::hours(1))).earliest())
        .unwrap_or_else(|| VENUE_TZ.from_utc_datetime(&naive))
}
