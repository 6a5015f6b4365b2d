use crate::types::{RunResult, SlotBookingStatus};

/// Decide whether `current` is worth a notification given the last persisted result.
///
/// Always notifies on the first run. Afterwards a slot only triggers when it is opened
/// now and its date, status or court count moved since the previous run. Slots are
/// paired across runs by (weekday, slot time); a slot missing from the previous run
/// counts as moved.
pub fn should_notify(current: &RunResult, previous: Option<&RunResult>) -> bool {
    let Some(previous) = previous else {
        return true;
    };

    current.targets.iter().any(|target| {
        let prev_target = previous.target(target.weekday);
        target
            .slots
            .iter()
            .filter(|slot| slot.status == SlotBookingStatus::Opened)
            .any(|slot| {
                let Some(prev_target) = prev_target else {
                    return true;
                };
                match prev_target.slot(slot.time) {
                    Some(prev) => {
                        prev_target.date != target.date
                            || prev.status != slot.status
                            || prev.count != slot.count
                    }
                    None => true,
                }
            })
    })
}
