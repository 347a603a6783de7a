use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    // Configuration errors
    #[error("Invalid config: {message}")]
    ConfigInvalid { message: String },

    #[error("Failed to parse config file: {0}")]
    ConfigParseError(#[from] toml::de::Error),

    #[error("Config file {path} could not be written: {source}")]
    ConfigWriteFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    // Player errors
    #[error("Media player unavailable: {reason}")]
    PlayerUnavailable { reason: String },

    #[error("Player metadata is missing or malformed: {field}")]
    Metadata { field: String },

    // Lyrics errors
    #[error("Lyrics provider {provider} failed: {reason}")]
    LyricsProviderFailed { provider: String, reason: String },

    #[error("Invalid timestamp: {timestamp:?}")]
    InvalidTimestamp { timestamp: String },

    #[error("No synchronized lines found in transcript")]
    NoLinesFound,

    // Network errors
    #[error("Network request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest_middleware::Error),

    // Output errors
    #[error("Failed to serialize output: {0}")]
    Json(#[from] serde_json::Error),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;
