use crate::calendar::weekday_name;
use crate::types::{SlotBookingStatus, SlotReport, TargetReport};

pub fn status_description(status: SlotBookingStatus, count: i64) -> String {
    match status {
        SlotBookingStatus::NotOpened => "not yet open".to_string(),
        SlotBookingStatus::Opened if count == 1 => "1 court left".to_string(),
        SlotBookingStatus::Opened => format!("{count} courts left"),
        SlotBookingStatus::Outdated => "expired".to_string(),
        SlotBookingStatus::NotApplicable => "not applicable".to_string(),
    }
}

fn slot_line(slot: &SlotReport) -> String {
    format!(
        "{} - {}",
        slot.time.format("%H:%M"),
        status_description(slot.status, slot.count)
    )
}

pub fn render_target(target: &TargetReport) -> String {
    let mut lines = vec![format!(
        "-- {} ({}) --",
        weekday_name(target.weekday),
        target.date.format("%Y-%m-%d")
    )];
    lines.extend(target.slots.iter().map(slot_line));
    lines.join("\n")
}

/// Notification body: one block per target date.
pub fn render_body(targets: &[TargetReport]) -> String {
    targets
        .iter()
        .map(render_target)
        .collect::<Vec<_>>()
        .join("\n\n")
}
