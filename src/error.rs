//! Error types shared across the crate.
//!
//! Fetch failures never escape the polling loop: the store converts them to
//! [`FetchState::Error`](crate::poll::FetchState::Error) at the tick boundary.
//! The binary wraps everything else in [`anyhow`].

use thiserror::Error;

/// Why a single fetch against the backend failed.
#[derive(Error, Debug)]
pub enum FetchError {
    /// The request could not be sent or the response body not read.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The body did not have the expected shape.
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Misuse of the [`PollingStore`](crate::poll::PollingStore) lifecycle.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum StoreError {
    #[error("poll interval must be greater than zero")]
    InvalidInterval,

    #[error("store is already running")]
    AlreadyRunning,

    #[error("store has been stopped")]
    Stopped,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}
