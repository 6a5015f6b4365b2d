use std::sync::Arc;

use chrono::{DateTime, Datelike, NaiveTime, Utc, Weekday};
use chrono_tz::Tz;
use tracing::{error, info, warn};

use crate::calendar::{next_weekday, weekday_name};
use crate::config::{Config, VENUE_TZ};
use crate::detector::{classify_target, should_notify, SlotClassifier};
use crate::error::Result;
use crate::fetcher::AvailabilityFetcher;
use crate::message::render_body;
use crate::notifier::Notifier;
use crate::state::RunResultStore;
use crate::types::{RunResult, RunStatus, TargetReport};

/// What a single cycle did.
#[derive(Debug)]
pub struct CycleOutcome {
    pub result: RunResult,
    pub notified: bool,
    pub persisted: bool,
}

/// One fetch → classify → compare → notify → persist pass.
pub struct CycleRunner {
    fetcher: Arc<dyn AvailabilityFetcher>,
    notifier: Arc<dyn Notifier>,
    store: Box<dyn RunResultStore>,
    classifier: SlotClassifier,
    target_weekdays: Vec<Weekday>,
    slot_times: Vec<NaiveTime>,
    subject: String,
}

impl CycleRunner {
    pub fn new(
        cfg: &Config,
        fetcher: Arc<dyn AvailabilityFetcher>,
        notifier: Arc<dyn Notifier>,
        store: Box<dyn RunResultStore>,
    ) -> Self {
        Self {
            fetcher,
            notifier,
            store,
            classifier: SlotClassifier::new(cfg.lead_window_hours),
            target_weekdays: cfg.target_weekdays.clone(),
            slot_times: cfg.slot_times.clone(),
            subject: cfg.subject.clone(),
        }
    }

    pub async fn run(&mut self) -> Result<CycleOutcome> {
        self.run_at(Utc::now().with_timezone(&VENUE_TZ)).await
    }

    /// Runs the cycle as if the venue clock read `now`.
    ///
    /// A failed fetch for any target date fails the whole cycle: nothing is sent and the
    /// previous record is kept. A store write error is returned; notifier errors are not.
    pub async fn run_at(&mut self, now: DateTime<Tz>) -> Result<CycleOutcome> {
        let today = now.date_naive();
        info!("-- Cycle at {} (venue time) --", now.to_rfc3339());
        info!("Today is {today}, {}", weekday_name(today.weekday()));

        let mut targets = Vec::with_capacity(self.target_weekdays.len());
        for &weekday in &self.target_weekdays {
            let date = next_weekday(today, weekday);
            info!("Next {} is {date}, checking...", weekday_name(weekday));

            let report = match self.fetcher.fetch(date).await {
                Ok(availability) => {
                    classify_target(&self.classifier, weekday, date, &self.slot_times, &availability, now)
                }
                Err(e) => {
                    warn!(date = %date, "Availability request failed: {e}");
                    TargetReport::failed(weekday, date, &self.slot_times, e.to_string())
                }
            };
            for slot in &report.slots {
                info!(
                    date = %date,
                    slot = %slot.time.format("%H:%M"),
                    status = %slot.status,
                    count = slot.count,
                    "slot classified"
                );
            }
            targets.push(report);
        }

        let status = if targets.iter().any(TargetReport::is_failed) {
            RunStatus::Failed
        } else {
            RunStatus::Succeeded
        };

        let result = RunResult {
            today,
            timestamp: now.fixed_offset(),
            status,
            body: render_body(&targets),
            targets,
        };

        if result.status == RunStatus::Failed {
            warn!("API requests failed, skipped.");
            return Ok(CycleOutcome {
                result,
                notified: false,
                persisted: false,
            });
        }

        let previous = match self.store.load() {
            Ok(previous) => previous,
            Err(e) => {
                warn!("Could not load last run result, treating as first run: {e}");
                None
            }
        };

        let mut notified = false;
        if should_notify(&result, previous.as_ref()) {
            match self.notifier.notify(&self.subject, &result.body).await {
                Ok(()) => {
                    notified = true;
                    info!("Notification sent.");
                }
                Err(e) => error!("Notification failed: {e}"),
            }
        } else {
            info!("No update.");
        }

        self.store.save(&result)?;
        info!("Run result saved.");

        Ok(CycleOutcome {
            result,
            notified,
            persisted: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::classifier::venue_local;
    use crate::state::JsonFileStore;
    use crate::testing::{config, FakeFetcher, MemoryStore, RecordingNotifier};
    use crate::types::SlotBookingStatus;
    use chrono::NaiveDate;

    fn monday_noon() -> DateTime<Tz> {
        venue_local(
            NaiveDate::from_ymd_opt(2024, 6, 10)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap(),
        )
    }

    fn runner(fetcher: &Arc<FakeFetcher>, notifier: &Arc<RecordingNotifier>, store: MemoryStore) -> CycleRunner {
        CycleRunner::new(&config(), fetcher.clone(), notifier.clone(), Box::new(store))
    }

    #[tokio::test]
    async fn first_cycle_notifies_and_persists() {
        let fetcher = Arc::new(FakeFetcher::with_slot("2024-06-15T21:00", 2));
        let notifier = Arc::new(RecordingNotifier::default());
        let store = MemoryStore::default();
        let mut runner = runner(&fetcher, &notifier, store.clone());

        let outcome = runner.run_at(monday_noon()).await.unwrap();

        assert!(outcome.notified);
        assert!(outcome.persisted);
        assert_eq!(outcome.result.status, RunStatus::Succeeded);
        assert_eq!(fetcher.requested(), vec![NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()]);

        let sent = notifier.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "📅 Badminton court update");
        assert!(sent[0].1.contains("21:00 - 2 courts left"), "{}", sent[0].1);

        assert_eq!(store.current(), Some(outcome.result));
    }

    #[tokio::test]
    async fn unchanged_availability_is_not_resent() {
        let fetcher = Arc::new(FakeFetcher::with_slot("2024-06-15T21:00", 2));
        let notifier = Arc::new(RecordingNotifier::default());
        let store = MemoryStore::default();
        let mut runner = runner(&fetcher, &notifier, store.clone());

        runner.run_at(monday_noon()).await.unwrap();
        let later = monday_noon() + chrono::Duration::minutes(1);
        let outcome = runner.run_at(later).await.unwrap();

        assert!(!outcome.notified);
        assert!(outcome.persisted);
        assert_eq!(notifier.sent().len(), 1);
        // Record is still overwritten with the newer timestamp.
        assert_eq!(store.current().unwrap().timestamp, later.fixed_offset());
    }

    #[tokio::test]
    async fn count_change_is_resent() {
        let fetcher = Arc::new(FakeFetcher::with_slot("2024-06-15T21:00", 2));
        let notifier = Arc::new(RecordingNotifier::default());
        let mut runner = runner(&fetcher, &notifier, MemoryStore::default());

        runner.run_at(monday_noon()).await.unwrap();
        fetcher.set_slot("2024-06-15T21:00", 1);
        let outcome = runner.run_at(monday_noon()).await.unwrap();

        assert!(outcome.notified);
        assert_eq!(notifier.sent().len(), 2);
        assert!(notifier.sent()[1].1.contains("21:00 - 1 court left"));
    }

    #[tokio::test]
    async fn failed_fetch_skips_notification_and_keeps_previous_record() {
        let fetcher = Arc::new(FakeFetcher::with_slot("2024-06-15T21:00", 2));
        let notifier = Arc::new(RecordingNotifier::default());
        let store = MemoryStore::default();
        let mut runner = runner(&fetcher, &notifier, store.clone());

        let first = runner.run_at(monday_noon()).await.unwrap().result;
        fetcher.fail_with(500);
        let outcome = runner.run_at(monday_noon()).await.unwrap();

        assert_eq!(outcome.result.status, RunStatus::Failed);
        assert!(!outcome.notified);
        assert!(!outcome.persisted);
        let target = &outcome.result.targets[0];
        assert!(target.error_message.as_deref().unwrap().starts_with("Error: 500"));
        for slot in &target.slots {
            assert_eq!(slot.status, SlotBookingStatus::NotApplicable);
            assert_eq!(slot.count, -1);
        }
        assert_eq!(notifier.sent().len(), 1);
        assert_eq!(store.current(), Some(first));
    }

    #[tokio::test]
    async fn failed_fetch_on_first_run_sends_nothing() {
        let fetcher = Arc::new(FakeFetcher::default());
        fetcher.fail_with(500);
        let notifier = Arc::new(RecordingNotifier::default());
        let store = MemoryStore::default();
        let mut runner = runner(&fetcher, &notifier, store.clone());

        let outcome = runner.run_at(monday_noon()).await.unwrap();
        assert!(!outcome.notified);
        assert!(notifier.sent().is_empty());
        assert_eq!(store.current(), None);
    }

    #[tokio::test]
    async fn notifier_failure_still_persists() {
        let fetcher = Arc::new(FakeFetcher::with_slot("2024-06-15T22:00", 3));
        let notifier = Arc::new(RecordingNotifier::failing());
        let store = MemoryStore::default();
        let mut runner = runner(&fetcher, &notifier, store.clone());

        let outcome = runner.run_at(monday_noon()).await.unwrap();
        assert!(!outcome.notified);
        assert!(outcome.persisted);
        assert!(store.current().is_some());
    }

    #[tokio::test]
    async fn unreadable_state_counts_as_first_run() {
        let fetcher = Arc::new(FakeFetcher::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let store = MemoryStore::default();
        store.fail_loads();
        let mut runner = runner(&fetcher, &notifier, store.clone());

        let outcome = runner.run_at(monday_noon()).await.unwrap();
        assert!(outcome.notified);
    }

    #[tokio::test]
    async fn store_write_failure_fails_the_cycle() {
        let fetcher = Arc::new(FakeFetcher::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let store = MemoryStore::default();
        store.fail_saves();
        let mut runner = runner(&fetcher, &notifier, store.clone());

        assert!(runner.run_at(monday_noon()).await.is_err());
    }

    #[tokio::test]
    async fn first_cycle_creates_state_file() {
        let path = std::env::temp_dir().join(format!("court-watch-cycle-{}-first-run.json", std::process::id()));
        let _ = std::fs::remove_file(&path);

        let fetcher = Arc::new(FakeFetcher::with_slot("2024-06-15T21:00", 2));
        let notifier = Arc::new(RecordingNotifier::default());
        let mut runner = CycleRunner::new(
            &config(),
            fetcher.clone(),
            notifier.clone(),
            Box::new(JsonFileStore::new(&path)),
        );

        let outcome = runner.run_at(monday_noon()).await.unwrap();

        assert!(outcome.notified);
        assert_eq!(notifier.sent().len(), 1);
        assert!(path.exists());
        let saved = JsonFileStore::new(&path).load().unwrap();
        assert_eq!(saved, Some(outcome.result));

        std::fs::remove_file(&path).ok();
    }

    #[tokio::test]
    async fn empty_day_uses_time_window_status() {
        let fetcher = Arc::new(FakeFetcher::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let mut runner = runner(&fetcher, &notifier, MemoryStore::default());

        // Sunday noon: next Saturday is six days and nine hours away.
        let now = venue_local(
            NaiveDate::from_ymd_opt(2024, 6, 16)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap(),
        );
        let outcome = runner.run_at(now).await.unwrap();

        let target = &outcome.result.targets[0];
        assert_eq!(target.date, NaiveDate::from_ymd_opt(2024, 6, 22).unwrap());
        for slot in &target.slots {
            assert_eq!(slot.count, 0);
            assert_eq!(slot.status, SlotBookingStatus::NotOpened);
        }
        assert!(outcome.result.body.contains("21:00 - not yet open"));
    }
}
