use chrono::{NaiveTime, TimeDelta, Weekday};
use chrono_tz::Tz;

use crate::error::{AppError, Result};

pub const AVAILABILITY_API_URL: &str = "https://api-booking.anybuddyapp.com";

/// Forest Hill Aquaboulevard.
pub const VENUE_ID: &str = "aquaboulevard-de-paris";
pub const ACTIVITY: &str = "badminton";

/// Slot times are interpreted in the venue's wall clock.
pub const VENUE_TZ: Tz = chrono_tz::Europe::Paris;

/// The API only answers with bookable offerings when the party size is left open.
pub const PARTY_SIZE: u32 = 0;

/// Bookings open this many hours before a slot starts.
pub const BOOKING_LEAD_HOURS: i64 = 144;

/// A slot counts as expired once its hour is over.
pub const SLOT_LENGTH_MINUTES: i64 = 60;

pub const POLL_INTERVAL_SECS: u64 = 60;

pub const STATE_PATH: &str = "last_run_result.json";

pub const NOTIFY_SUBJECT: &str = "📅 Badminton court update";

pub const DEFAULT_SLOT_TIMES: &str = "21:00,22:00";
pub const DEFAULT_TARGET_WEEKDAYS: &str = "sat";

#[derive(Debug, Clone)]
pub struct Config {
    pub api_base_url: String,
    pub venue_id: String,
    pub activity: String,
    /// Lead window in hours (BOOKING_LEAD_HOURS)
    pub lead_window_hours: i64,
    /// Weekdays whose next occurrence is checked each cycle (TARGET_WEEKDAYS)
    pub target_weekdays: Vec<Weekday>,
    /// Tracked slot start times, venue local (SLOT_TIMES)
    pub slot_times: Vec<NaiveTime>,
    pub state_path: String,
    pub poll_interval_secs: u64,
    pub run_once: bool,
    pub log_level: String,
    pub log_file: Option<String>,
    pub subject: String,
    pub notifier: NotifierConfig,
}

#[derive(Debug, Clone)]
pub enum NotifierConfig {
    /// Only writes the message to the log.
    Log,
    Email(EmailConfig),
    Webhook(WebhookConfig),
}

#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub username: String,
    pub password: String,
    pub from: String,
    pub recipients: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct WebhookConfig {
    pub url: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key/value source. `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let lead_window_hours = var("BOOKING_LEAD_HOURS", &BOOKING_LEAD_HOURS.to_string())
            .parse::<i64>()
            .ok()
            .filter(|hours| *hours >= 0 && TimeDelta::try_hours(*hours).is_some())
            .ok_or_else(|| {
                AppError::Config("BOOKING_LEAD_HOURS must be a non-negative whole number of hours".to_string())
            })?;

        let poll_interval_secs = var("POLL_INTERVAL_SECS", &POLL_INTERVAL_SECS.to_string())
            .parse::<u64>()
            .ok()
            .filter(|secs| *secs > 0)
            .ok_or_else(|| AppError::Config("POLL_INTERVAL_SECS must be a positive integer".to_string()))?;

        let notifier = match var("NOTIFIER", "log").trim().to_lowercase().as_str() {
            "log" => NotifierConfig::Log,
            "email" => NotifierConfig::Email(EmailConfig::from_lookup(&lookup)?),
            "webhook" => NotifierConfig::Webhook(WebhookConfig {
                url: required(&lookup, "WEBHOOK_URL")?,
            }),
            other => {
                return Err(AppError::Config(format!(
                    "NOTIFIER must be one of log, email, webhook (got '{other}')"
                )))
            }
        };

        Ok(Self {
            api_base_url: var("AVAILABILITY_API_URL", AVAILABILITY_API_URL)
                .trim_end_matches('/')
                .to_string(),
            venue_id: var("VENUE_ID", VENUE_ID),
            activity: var("ACTIVITY", ACTIVITY),
            lead_window_hours,
            target_weekdays: parse_weekdays(&var("TARGET_WEEKDAYS", DEFAULT_TARGET_WEEKDAYS))?,
            slot_times: parse_slot_times(&var("SLOT_TIMES", DEFAULT_SLOT_TIMES))?,
            state_path: var("STATE_PATH", STATE_PATH),
            poll_interval_secs,
            run_once: parse_bool(&var("RUN_ONCE", "false")),
            log_level: var("LOG_LEVEL", "info"),
            log_file: lookup("LOG_FILE").filter(|s| !s.trim().is_empty()),
            subject: var("NOTIFY_SUBJECT", NOTIFY_SUBJECT),
            notifier,
        })
    }
}

impl EmailConfig {
    fn from_lookup<F>(lookup: &F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let username = required(lookup, "SMTP_USERNAME")?;
        let recipients = split_list(&required(lookup, "MAIL_TO")?);
        if recipients.is_empty() {
            return Err(AppError::Config("MAIL_TO must list at least one recipient".to_string()));
        }

        Ok(Self {
            smtp_host: lookup("SMTP_HOST").unwrap_or_else(|| "smtp.gmail.com".to_string()),
            smtp_port: lookup("SMTP_PORT")
                .unwrap_or_else(|| "587".to_string())
                .parse::<u16>()
                .map_err(|_| AppError::Config("SMTP_PORT must be a valid port number".to_string()))?,
            password: required(lookup, "SMTP_PASSWORD")?,
            from: lookup("MAIL_FROM").unwrap_or_else(|| username.clone()),
            username,
            recipients,
        })
    }
}

fn required<F>(lookup: &F, key: &str) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AppError::Config(format!("{key} is not set")))
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_bool(raw: &str) -> bool {
    matches!(raw.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

pub fn parse_weekdays(raw: &str) -> Result<Vec<Weekday>> {
    let mut weekdays = Vec::new();
    for item in split_list(raw) {
        let day = item
            .parse::<Weekday>()
            .map_err(|_| AppError::Config(format!("TARGET_WEEKDAYS: unknown weekday '{item}'")))?;
        if !weekdays.contains(&day) {
            weekdays.push(day);
        }
    }
    if weekdays.is_empty() {
        return Err(AppError::Config("TARGET_WEEKDAYS must name at least one weekday".to_string()));
    }
    Ok(weekdays)
}

pub fn parse_slot_times(raw: &str) -> Result<Vec<NaiveTime>> {
    let mut times = Vec::new();
    for item in split_list(raw) {
        let time = NaiveTime::parse_from_str(&item, "%H:%M")
            .map_err(|_| AppError::Config(format!("SLOT_TIMES: '{item}' is not HH:MM")))?;
        if !times.contains(&time) {
            times.push(time);
        }
    }
    if times.is_empty() {
        return Err(AppError::Config("SLOT_TIMES must list at least one time".to_string()));
    }
    times.sort();
    Ok(times)
}
