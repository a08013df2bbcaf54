//! Error types for the finders crate.

use thiserror::Error;

/// Errors a finder can surface while listing wallpapers.
///
/// `Transport` and `Status` are both transport failures from the caller's
/// point of view; they are kept apart so logs show whether the request never
/// completed or the server refused it.
#[derive(Error, Debug)]
pub enum FinderError {
    /// Connection failure, timeout or an unreadable response body
    #[error("{finder}: request failed: {source}")]
    Transport {
        finder: String,
        #[source]
        source: reqwest::Error,
    },

    /// The remote endpoint answered with anything but 200
    #[error("{finder}: unexpected status code {status}")]
    Status { finder: String, status: u16 },

    /// Response body was not valid JSON
    #[error("{finder}: malformed response body: {source}")]
    Parse {
        finder: String,
        #[source]
        source: serde_json::Error,
    },

    /// Failure reported by a finder that does not speak HTTP
    #[error("{0}")]
    Other(String),
}

impl FinderError {
    /// True for connection and status failures.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::Status { .. })
    }
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, FinderError>;
