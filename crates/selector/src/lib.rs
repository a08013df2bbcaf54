//! Wallpaper selection: accumulate, pick, download.
//!
//! This crate provides:
//! - `WallpaperSelector`, built once with its finders and then run per cycle
//! - `RandomSource` implementations (thread RNG, seeded, fixed sequence)
//! - `Downloader` for streaming the chosen image to disk
//! - `WallpaperCache` with a JSON-file implementation
//!
//! ## Example Usage
//! ```ignore
//! use finders::{RedditSearchConfig, RedditSearchFinder};
//! use selector::{SelectorConfig, WallpaperSelector};
//!
//! let reddit = RedditSearchFinder::new(RedditSearchConfig::default().with_query("space"))?;
//! let selector = WallpaperSelector::builder(SelectorConfig::new("/home/me/Pictures/walls"))
//!     .paginated_finder(reddit)
//!     .build()?;
//!
//! let path = selector.select_new_wallpaper().await?;
//! ```

pub mod cache;
pub mod download;
pub mod error;
pub mod random;
pub mod selector;

// Re-export main types
pub use cache::{JsonFileCache, WallpaperCache};
pub use download::{Downloader, wallpaper_file_name};
pub use error::{CacheError, Result, SelectorError};
pub use random::{RandomSource, SeededRandom, SequenceRandom, ThreadRandom};
pub use selector::{
    DEFAULT_MINIMUM_POOL_SIZE, MAX_PAGINATION_ITERATIONS, SelectorBuilder, SelectorConfig,
    WallpaperSelector,
};
