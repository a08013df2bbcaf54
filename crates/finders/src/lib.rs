//! # Finders Crate
//!
//! Candidate sources for wallpaper selection.
//!
//! ## Components
//!
//! ### Finder trait
//! The capability every source implements: list one page of candidates,
//! optionally continuing after a cursor.
//!
//! ### Reddit Search Finder
//! Paginated search over one or more subreddits:
//! - Builds the search query (sort, time window, limit, free text)
//! - Keeps only posts hinted as images
//! - Continues with Reddit's `after` cursor
//!
//! ### Static Finder
//! A fixed in-memory list, handy for curated sets and tests.
//!
//! ## Example Usage
//!
//! ```ignore
//! use finders::{Finder, RedditSearchConfig, RedditSearchFinder};
//!
//! let reddit = RedditSearchFinder::new(
//!     RedditSearchConfig::default().with_query("(3840x2160) AND (forest OR mountain)"),
//! )?;
//!
//! let first_page = reddit.list_available_wallpapers(None).await?;
//! let cursor = first_page.last().map(|c| c.id.clone());
//! let next_page = reddit.list_available_wallpapers(cursor.as_deref()).await?;
//! ```

// Public modules
pub mod error;
pub mod reddit;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use error::{FinderError, Result};
pub use reddit::{RedditSearchConfig, RedditSearchFinder};
pub use traits::{Finder, StaticFinder};
pub use types::Candidate;
