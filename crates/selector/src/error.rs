//! Error types for the selector crate.

use finders::FinderError;
use thiserror::Error;

/// Errors that abort a selection cycle.
#[derive(Error, Debug)]
pub enum SelectorError {
    /// A finder failed while the pool was being accumulated
    #[error(transparent)]
    Finder(#[from] FinderError),

    /// Accumulation finished without a single candidate
    #[error("no wallpaper candidates available to select from")]
    EmptyPool,

    /// The chosen image could not be fetched or written
    #[error("failed to download {url}: {reason}")]
    Download { url: String, reason: String },

    /// The save directory could not be prepared
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from the optional wallpaper cache.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cache file is corrupt: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, SelectorError>;
