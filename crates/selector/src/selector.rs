//! # Wallpaper Selector
//!
//! Coordinates one selection cycle:
//! 1. Ask every registered finder for its candidates (in registration order)
//! 2. Page through the paginated finder until the pool is large enough
//! 3. Pick one candidate uniformly at random
//! 4. Download it into the save directory
//!
//! Any failure aborts the cycle; there is no partial result.
//!
//! ## Pagination
//! The loop runs while `pool < minimum_pool_size` and fewer than
//! [`MAX_PAGINATION_ITERATIONS`] pages have been fetched. The cursor for the
//! next page is the id of the last candidate of the page just fetched (after
//! image filtering), never the last candidate of the whole pool. An empty
//! page ends the loop.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use finders::{Candidate, Finder};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::cache::WallpaperCache;
use crate::download::{DEFAULT_DOWNLOAD_TIMEOUT_SECS, Downloader};
use crate::error::{Result, SelectorError};
use crate::random::{RandomSource, ThreadRandom, pick_index};

/// Hard ceiling on paginated requests per cycle.
pub const MAX_PAGINATION_ITERATIONS: usize = 10;

/// Default number of candidates to gather before selecting.
pub const DEFAULT_MINIMUM_POOL_SIZE: usize = 100;

/// Settings fixed for the lifetime of a selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorConfig {
    /// Pagination stops once the pool holds at least this many candidates
    pub minimum_pool_size: usize,
    /// Directory downloaded wallpapers are written to
    pub save_directory: PathBuf,
    /// Per-request timeout for image downloads
    pub download_timeout: Duration,
}

impl SelectorConfig {
    pub fn new(save_directory: impl Into<PathBuf>) -> Self {
        Self {
            minimum_pool_size: DEFAULT_MINIMUM_POOL_SIZE,
            save_directory: save_directory.into(),
            download_timeout: Duration::from_secs(DEFAULT_DOWNLOAD_TIMEOUT_SECS),
        }
    }

    /// Configure the minimum pool size; zero is raised to one.
    pub fn with_minimum_pool_size(mut self, size: usize) -> Self {
        self.minimum_pool_size = size.max(1);
        self
    }

    pub fn with_download_timeout(mut self, timeout: Duration) -> Self {
        self.download_timeout = timeout;
        self
    }
}

/// Builder for [`WallpaperSelector`].
///
/// Finders can only be registered here; the built selector is immutable.
pub struct SelectorBuilder {
    config: SelectorConfig,
    finders: Vec<Box<dyn Finder>>,
    paginated: Option<Box<dyn Finder>>,
    random: Box<dyn RandomSource>,
    cache: Option<Box<dyn WallpaperCache>>,
}

impl SelectorBuilder {
    /// Register a finder queried once per cycle, without a cursor.
    pub fn add_finder(mut self, finder: impl Finder + 'static) -> Self {
        self.finders.push(Box::new(finder));
        self
    }

    /// Set the finder that is paged through until the pool is large enough.
    ///
    /// Registering a second paginated finder replaces the first.
    pub fn paginated_finder(mut self, finder: impl Finder + 'static) -> Self {
        self.paginated = Some(Box::new(finder));
        self
    }

    /// Replace the default thread RNG.
    pub fn random_source(mut self, random: impl RandomSource + 'static) -> Self {
        self.random = Box::new(random);
        self
    }

    /// Record pooled and downloaded candidates in `cache`.
    pub fn cache(mut self, cache: impl WallpaperCache + 'static) -> Self {
        self.cache = Some(Box::new(cache));
        self
    }

    pub fn build(self) -> Result<WallpaperSelector> {
        let downloader = Downloader::new(self.config.download_timeout)?;
        Ok(WallpaperSelector {
            config: self.config,
            finders: self.finders,
            paginated: self.paginated,
            random: self.random,
            cache: self.cache,
            downloader,
            in_flight: Mutex::new(()),
        })
    }
}

/// Selects and materializes one wallpaper per call.
pub struct WallpaperSelector {
    config: SelectorConfig,
    finders: Vec<Box<dyn Finder>>,
    paginated: Option<Box<dyn Finder>>,
    random: Box<dyn RandomSource>,
    cache: Option<Box<dyn WallpaperCache>>,
    downloader: Downloader,
    /// Held for a whole cycle so concurrent calls run one after another
    in_flight: Mutex<()>,
}

impl WallpaperSelector {
    pub fn builder(config: SelectorConfig) -> SelectorBuilder {
        SelectorBuilder {
            config,
            finders: Vec::new(),
            paginated: None,
            random: Box::new(ThreadRandom),
            cache: None,
        }
    }

    pub fn config(&self) -> &SelectorConfig {
        &self.config
    }

    /// Main entry point: pick a wallpaper and return its absolute local path.
    ///
    /// Calls on the same selector are serialized; a second caller waits for
    /// the running cycle to finish.
    #[instrument(skip(self))]
    pub async fn select_new_wallpaper(&self) -> Result<PathBuf> {
        let _cycle = self.in_flight.lock().await;
        let start_time = Instant::now();

        let pool = self.accumulate().await?;
        info!("Accumulated {} candidates", pool.len());

        let chosen = self.choose(&pool)?;
        info!(
            "Selected wallpaper {} \"{}\" from {}",
            chosen.id, chosen.title, chosen.source_tag
        );

        let save_dir = self.prepare_save_directory().await?;
        let path = self.downloader.download(chosen, &save_dir).await?;

        self.remember(&pool, chosen);

        info!(
            "Selection cycle finished in {:.2?}: {}",
            start_time.elapsed(),
            path.display()
        );
        Ok(path)
    }

    /// Build the candidate pool for one cycle.
    pub async fn accumulate(&self) -> Result<Vec<Candidate>> {
        let mut pool = Vec::new();

        for finder in &self.finders {
            let candidates = finder.list_available_wallpapers(None).await?;
            debug!("{} returned {} candidates", finder.name(), candidates.len());
            admit(&mut pool, candidates, finder.name());
        }

        if let Some(paginated) = &self.paginated {
            self.paginate(paginated.as_ref(), &mut pool).await?;
        }

        Ok(pool)
    }

    async fn paginate(&self, finder: &dyn Finder, pool: &mut Vec<Candidate>) -> Result<()> {
        let mut cursor: Option<String> = None;
        let mut iterations = 0;

        while pool.len() < self.config.minimum_pool_size && iterations < MAX_PAGINATION_ITERATIONS {
            let page = finder.list_available_wallpapers(cursor.as_deref()).await?;
            iterations += 1;

            let Some(last) = page.last() else {
                info!(
                    "{} returned an empty page on iteration {}, stopping",
                    finder.name(),
                    iterations
                );
                break;
            };
            cursor = Some(last.id.clone());

            debug!(
                "{} page {} returned {} candidates (next cursor {:?})",
                finder.name(),
                iterations,
                page.len(),
                cursor
            );
            admit(pool, page, finder.name());
        }

        info!(
            "Pagination finished after {} iteration(s) with {} candidates (minimum {})",
            iterations,
            pool.len(),
            self.config.minimum_pool_size
        );
        Ok(())
    }

    /// Draw one candidate uniformly at random.
    pub fn choose<'a>(&self, pool: &'a [Candidate]) -> Result<&'a Candidate> {
        if pool.is_empty() {
            return Err(SelectorError::EmptyPool);
        }
        let index = pick_index(self.random.next_f64(), pool.len());
        debug!("Picked index {} of {}", index, pool.len());
        Ok(&pool[index])
    }

    async fn prepare_save_directory(&self) -> Result<PathBuf> {
        let dir = absolute(&self.config.save_directory)?;
        tokio::fs::create_dir_all(&dir).await?;
        Ok(dir)
    }

    fn remember(&self, pool: &[Candidate], chosen: &Candidate) {
        let Some(cache) = &self.cache else {
            return;
        };
        if let Err(e) = cache.record_seen(pool) {
            warn!("Failed to record seen candidates: {}", e);
        }
        if let Err(e) = cache.mark_used(chosen) {
            warn!("Failed to mark {} as used: {}", chosen.id, e);
        }
    }
}

/// Append candidates to the pool, dropping any without a url.
fn admit(pool: &mut Vec<Candidate>, candidates: Vec<Candidate>, finder: &str) {
    for candidate in candidates {
        if candidate.has_url() {
            pool.push(candidate);
        } else {
            warn!("{} returned candidate {} without a url", finder, candidate.id);
        }
    }
}

fn absolute(path: &Path) -> std::io::Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        std::path::absolute(path)
    }
}
