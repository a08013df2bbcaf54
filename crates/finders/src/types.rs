//! Core types shared by every finder.

use serde::{Deserialize, Serialize};

/// Content hint a search result must carry to be admitted as a candidate.
pub const IMAGE_HINT: &str = "image";

/// One discovered image eligible for selection.
///
/// Candidates are produced by a [`Finder`](crate::Finder) and never modified
/// afterwards. The `url` of an admitted candidate is never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Candidate {
    /// Source-unique identifier (Reddit's `name`, e.g. `t3_abc123`)
    pub id: String,
    pub title: String,
    /// Where the image came from (subreddit, category, ...)
    pub source_tag: String,
    /// Remote image location
    pub url: String,
    /// Content hint reported by the source, e.g. `image`
    pub kind: String,
}

impl Candidate {
    /// Create a new image candidate.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        source_tag: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            source_tag: source_tag.into(),
            url: url.into(),
            kind: IMAGE_HINT.to_string(),
        }
    }

    /// Override the content hint (builder pattern).
    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = kind.into();
        self
    }

    /// Whether this candidate can be downloaded at all.
    pub fn has_url(&self) -> bool {
        !self.url.trim().is_empty()
    }
}
