use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    /// Non-2xx answer from the availability API.
    #[error("Error: {status} {body}")]
    ApiStatus { status: u16, body: String },

    #[error("Malformed availability response: {0}")]
    MalformedResponse(String),

    #[error("Notification error: {0}")]
    Notify(String),

    #[error("State store error: {0}")]
    Store(String),
}

pub type Result<T> = std::result::Result<T, AppError>;
