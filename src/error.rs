use thiserror::Error;

pub type Result<T> = std::result::Result<T, TrackerError>;

/// Failures surfaced by the tracker. A duplicate date is not one of them; see `SaveOutcome`.
#[derive(Error, Debug)]
pub enum TrackerError {
    /// Missing or invalid credential/identifier. Fatal at startup.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// GeoGuessr API call failed or returned an unusable payload.
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// Local file or remote sheet operation failed.
    #[error("Sink error: {0}")]
    Sink(String),
}

impl TrackerError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn fetch(msg: impl Into<String>) -> Self {
        Self::Fetch(msg.into())
    }

    pub fn sink(msg: impl Into<String>) -> Self {
        Self::Sink(msg.into())
    }
}

impl From<std::io::Error> for TrackerError {
    fn from(e: std::io::Error) -> Self {
        Self::Sink(format!("I/O error: {}", e))
    }
}
