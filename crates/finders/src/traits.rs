//! The Finder capability.
//!
//! A finder enumerates candidate images from one source. Both plain finders
//! and the paginated search finder implement the same trait; the selector
//! decides which slot a finder occupies.

use crate::error::Result;
use crate::types::Candidate;
use async_trait::async_trait;

/// Core trait for candidate sources.
///
/// ## Contract
/// - `cursor`, when present, is the id of a candidate previously returned by
///   the same finder. Finders that do not paginate ignore it.
/// - One call is one page (or the whole result set). An empty vector is a
///   valid answer meaning "nothing more".
/// - No internal retries: failures go straight back to the caller.
#[async_trait]
pub trait Finder: Send + Sync {
    /// Returns the name of this finder (for logging/debugging)
    fn name(&self) -> &str;

    /// List the wallpapers available from this source.
    async fn list_available_wallpapers(&self, cursor: Option<&str>) -> Result<Vec<Candidate>>;
}

#[async_trait]
impl<F: Finder + ?Sized> Finder for Box<F> {
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn list_available_wallpapers(&self, cursor: Option<&str>) -> Result<Vec<Candidate>> {
        (**self).list_available_wallpapers(cursor).await
    }
}

/// A finder over a fixed, in-memory list of candidates.
///
/// Useful for hand-curated image lists and for exercising the selector
/// without the network. It ignores the cursor.
#[derive(Debug, Clone, Default)]
pub struct StaticFinder {
    name: String,
    candidates: Vec<Candidate>,
}

impl StaticFinder {
    pub fn new(name: impl Into<String>, candidates: Vec<Candidate>) -> Self {
        Self {
            name: name.into(),
            candidates,
        }
    }
}

#[async_trait]
impl Finder for StaticFinder {
    fn name(&self) -> &str {
        &self.name
    }

    async fn list_available_wallpapers(&self, _cursor: Option<&str>) -> Result<Vec<Candidate>> {
        tracing::debug!(
            "{} returning {} fixed candidates",
            self.name,
            self.candidates.len()
        );
        Ok(self.candidates.clone())
    }
}
