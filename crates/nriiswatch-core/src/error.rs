//! Error types for nriiswatch.

use thiserror::Error;

/// Errors surfaced by the watcher crates.
#[derive(Error, Debug)]
pub enum WatchError {
    /// Settings problems: unreadable file, bad TOML, missing sink URL.
    #[error("Config error: {0}")]
    Config(String),

    /// Portal transport failures (login page fetch, form post, list fetch).
    #[error("Portal error: {0}")]
    Portal(String),

    /// The list page was reachable but could not be interpreted.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Notification sink call failed.
    #[error("Sink error: {0}")]
    Sink(String),

    /// Message bridge failures (bind, malformed request).
    #[error("Bridge error: {0}")]
    Bridge(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, WatchError>;
