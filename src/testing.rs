//! In-memory collaborators for driving cycles in unit tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::fetcher::AvailabilityFetcher;
use crate::notifier::Notifier;
use crate::state::RunResultStore;
use crate::types::{RunResult, SlotAvailability};

pub fn config() -> Config {
    Config::from_lookup(|_| None).unwrap()
}

fn slot_key(start: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(start, "%Y-%m-%dT%H:%M").unwrap()
}

#[derive(Default)]
pub struct FakeFetcher {
    availability: Mutex<SlotAvailability>,
    fail_status: Mutex<Option<u16>>,
    requested: Mutex<Vec<NaiveDate>>,
}

impl FakeFetcher {
    pub fn with_slot(start: &str, count: usize) -> Self {
        let fetcher = Self::default();
        fetcher.set_slot(start, count);
        fetcher
    }

    pub fn set_slot(&self, start: &str, count: usize) {
        self.availability.lock().unwrap().insert(slot_key(start), count);
    }

    pub fn fail_with(&self, status: u16) {
        *self.fail_status.lock().unwrap() = Some(status);
    }

    pub fn requested(&self) -> Vec<NaiveDate> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl AvailabilityFetcher for FakeFetcher {
    async fn fetch(&self, date: NaiveDate) -> Result<SlotAvailability> {
        self.requested.lock().unwrap().push(date);
        if let Some(status) = *self.fail_status.lock().unwrap() {
            return Err(AppError::ApiStatus {
                status,
                body: "Internal Server Error".to_string(),
            });
        }
        Ok(self.availability.lock().unwrap().clone())
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(String, String)>>,
    fail: bool,
}

impl RecordingNotifier {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, subject: &str, body: &str) -> Result<()> {
        if self.fail {
            return Err(AppError::Notify("smtp unreachable".to_string()));
        }
        self.sent
            .lock()
            .unwrap()
            .push((subject.to_string(), body.to_string()));
        Ok(())
    }
}

/// Clones share the same slot so a test can inspect what the runner saved.
#[derive(Clone, Default)]
pub struct MemoryStore {
    record: Arc<Mutex<Option<RunResult>>>,
    fail_loads: Arc<Mutex<bool>>,
    fail_saves: Arc<Mutex<bool>>,
    save_attempts: Arc<Mutex<usize>>,
}

impl MemoryStore {
    pub fn current(&self) -> Option<RunResult> {
        self.record.lock().unwrap().clone()
    }

    pub fn fail_loads(&self) {
        *self.fail_loads.lock().unwrap() = true;
    }

    pub fn fail_saves(&self) {
        *self.fail_saves.lock().unwrap() = true;
    }

    pub fn save_attempts(&self) -> usize {
        *self.save_attempts.lock().unwrap()
    }
}

impl RunResultStore for MemoryStore {
    fn load(&self) -> Result<Option<RunResult>> {
        if *self.fail_loads.lock().unwrap() {
            return Err(AppError::Store("unreadable".to_string()));
        }
        Ok(self.current())
    }

    fn save(&mut self, result: &RunResult) -> Result<()> {
        *self.save_attempts.lock().unwrap() += 1;
        if *self.fail_saves.lock().unwrap() {
            return Err(AppError::Store("disk full".to_string()));
        }
        *self.record.lock().unwrap() = Some(result.clone());
        Ok(())
    }
}
