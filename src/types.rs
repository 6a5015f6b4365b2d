use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Raw availability
// ---------------------------------------------------------------------------

/// Slot start (venue local) → number of bookable court offerings.
pub type SlotAvailability = BTreeMap<NaiveDateTime, usize>;

// ---------------------------------------------------------------------------
// Slot classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotBookingStatus {
    /// More than the lead window ahead; bookings not released yet.
    NotOpened,
    /// Inside the booking window, or courts were observed free.
    Opened,
    /// The slot's hour is already over.
    Outdated,
    /// The availability fetch failed; nothing is known.
    NotApplicable,
}

impl std::fmt::Display for SlotBookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SlotBookingStatus::NotOpened => "not_opened",
            SlotBookingStatus::Opened => "opened",
            SlotBookingStatus::Outdated => "outdated",
            SlotBookingStatus::NotApplicable => "not_applicable",
        };
        write!(f, "{s}")
    }
}

/// Count stored for slots whose availability could not be fetched.
pub const UNKNOWN_COUNT: i64 = -1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotReport {
    pub time: NaiveTime,
    pub status: SlotBookingStatus,
    /// Open courts, or `UNKNOWN_COUNT` when not applicable.
    pub count: i64,
}

// ---------------------------------------------------------------------------
// Per-date result
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetReport {
    pub weekday: Weekday,
    pub date: NaiveDate,
    pub slots: Vec<SlotReport>,
    #[serde(default)]
    pub error_message: Option<String>,
}

impl TargetReport {
    /// Report for a date whose fetch failed: every slot is not applicable.
    pub fn failed(weekday: Weekday, date: NaiveDate, slot_times: &[NaiveTime], error: String) -> Self {
        Self {
            weekday,
            date,
            slots: slot_times
                .iter()
                .map(|&time| SlotReport {
                    time,
                    status: SlotBookingStatus::NotApplicable,
                    count: UNKNOWN_COUNT,
                })
                .collect(),
            error_message: Some(error),
        }
    }

    pub fn is_failed(&self) -> bool {
        self.error_message.is_some()
    }

    pub fn slot(&self, time: NaiveTime) -> Option<&SlotReport> {
        self.slots.iter().find(|s| s.time == time)
    }
}

// ---------------------------------------------------------------------------
// Run result — the persisted unit of state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Succeeded,
    Failed,
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunStatus::Succeeded => write!(f, "succeeded"),
            RunStatus::Failed => write!(f, "failed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunResult {
    pub today: NaiveDate,
    pub timestamp: DateTime<FixedOffset>,
    pub status: RunStatus,
    pub targets: Vec<TargetReport>,
    /// Rendered notification body.
    pub body: String,
}

impl RunResult {
    pub fn target(&self, weekday: Weekday) -> Option<&TargetReport> {
        self.targets.iter().find(|t| t.weekday == weekday)
    }
}
