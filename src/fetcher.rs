use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;
use tracing::debug;

use crate::config::{Config, PARTY_SIZE};
use crate::error::{AppError, Result};
use crate::types::SlotAvailability;

/// Single-day availability lookup. One call per target date, no retries.
#[async_trait]
pub trait AvailabilityFetcher: Send + Sync {
    async fn fetch(&self, date: NaiveDate) -> Result<SlotAvailability>;
}

// ---------------------------------------------------------------------------
// Response schema
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct AvailabilityResponse {
    data: Vec<SlotRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SlotRecord {
    start_date_time: String,
    services: Vec<serde_json::Value>,
}

/// Parse an availability response body into per-slot offering counts.
/// Missing fields or an unreadable start time are a `MalformedResponse`.
pub fn parse_availability(body: &str) -> Result<SlotAvailability> {
    let response: AvailabilityResponse = serde_json::from_str(body)
        .map_err(|e| AppError::MalformedResponse(e.to_string()))?;

    let mut availability = SlotAvailability::new();
    for record in response.data {
        let start = parse_slot_start(&record.start_date_time).ok_or_else(|| {
            AppError::MalformedResponse(format!(
                "unrecognised startDateTime '{}'",
                record.start_date_time
            ))
        })?;
        // Later records for the same start replace earlier ones.
        availability.insert(start, record.services.len());
    }
    Ok(availability)
}

/// `2024-06-15T21:00`, with optional seconds.
fn parse_slot_start(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
        .ok()
}

// ---------------------------------------------------------------------------
// HTTP implementation
// ---------------------------------------------------------------------------

pub struct AnybuddyFetcher {
    client: reqwest::Client,
    url: String,
    activity: String,
}

impl AnybuddyFetcher {
    pub fn new(cfg: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("Mozilla/5.0")
            .build()?;

        Ok(Self {
            client,
            url: format!("{}/v2/centers/{}/availabilities", cfg.api_base_url, cfg.venue_id),
            activity: cfg.activity.clone(),
        })
    }
}

#[async_trait]
impl AvailabilityFetcher for AnybuddyFetcher {
    async fn fetch(&self, date: NaiveDate) -> Result<SlotAvailability> {
        let day = date.format("%Y-%m-%d").to_string();
        let party_size = PARTY_SIZE.to_string();

        let response = self
            .client
            .get(&self.url)
            .header(reqwest::header::ACCEPT, "application/json")
            .query(&[
                ("date.from", day.as_str()),
                ("date.to", day.as_str()),
                ("activities", self.activity.as_str()),
                ("partySize", party_size.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(AppError::ApiStatus {
                status: status.as_u16(),
                body,
            });
        }

        let availability = parse_availability(&body)?;
        debug!(date = %day, slots = availability.len(), "availability fetched");
        Ok(availability)
    }
}
