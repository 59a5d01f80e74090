//! Error types for the relay.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that end a relay run.
#[derive(Debug, Error)]
pub enum RelayError {
    /// A required setting is missing or blank
    #[error("{0} is not set")]
    MissingConfig(&'static str),

    /// The headless browser could not be launched or driven
    #[error("Browser error: {0}")]
    Browser(String),

    /// The profile page did not load
    #[error("Failed to load {url}: {reason}")]
    Navigation { url: String, reason: String },

    /// The marker file could not be read or written
    #[error("Marker file {}: {source}", .path.display())]
    Marker {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl RelayError {
    /// Wrap any displayable browser-side failure.
    pub fn browser(err: impl std::fmt::Display) -> Self {
        Self::Browser(err.to_string())
    }
}

/// Errors that can occur when delivering a single notification.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The endpoint answered with a non-success status
    #[error("Webhook returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
}
