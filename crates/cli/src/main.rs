mod config;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use finders::RedditSearchFinder;
use selector::{JsonFileCache, SelectorConfig, WallpaperCache, WallpaperSelector};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{error, info};

/// wallshuffle - random wallpapers from Reddit search
#[derive(Parser)]
#[command(name = "wallshuffle")]
#[command(about = "Pick a random wallpaper from Reddit and save it locally", long_about = None)]
struct Cli {
    /// Path to the JSON config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory to save wallpapers into (overrides the config)
    #[arg(long)]
    save_dir: Option<PathBuf>,

    /// Minimum number of candidates to gather before picking (overrides the config)
    #[arg(long)]
    min_pool: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Select and download one wallpaper, printing its path
    Select,

    /// Select a new wallpaper now and then on every interval
    Watch {
        /// Minutes between selections (overrides the config)
        #[arg(long)]
        interval_minutes: Option<u64>,
    },

    /// List cached wallpapers that were seen but never used
    Unused,

    /// Forget every cached wallpaper record
    PurgeCache,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(config::default_config_path);
    let mut cfg = config::load_or_create(&config_path)?;
    let cache_path = cfg.cache_path(&config_path);
    if let Some(dir) = cli.save_dir {
        cfg.save_directory = dir;
    }
    if let Some(min_pool) = cli.min_pool {
        cfg.minimum_pool_size = min_pool;
    }

    // Dispatch to appropriate command handler
    match cli.command {
        Commands::Select => handle_select(&cfg, &cache_path).await?,
        Commands::Watch { interval_minutes } => {
            let minutes = interval_minutes.unwrap_or(cfg.interval_minutes).max(1);
            handle_watch(&cfg, &cache_path, Duration::from_secs(minutes * 60)).await?
        }
        Commands::Unused => handle_unused(&cache_path)?,
        Commands::PurgeCache => handle_purge(&cache_path)?,
    }

    Ok(())
}

fn build_selector(cfg: &config::Config, cache_path: &Path) -> Result<WallpaperSelector> {
    let reddit = RedditSearchFinder::new(cfg.reddit.clone())
        .context("Failed to set up Reddit search")?;

    let mut builder = WallpaperSelector::builder(
        SelectorConfig::new(&cfg.save_directory).with_minimum_pool_size(cfg.minimum_pool_size),
    )
    .paginated_finder(reddit);

    if cfg.cache_enabled {
        builder = builder.cache(JsonFileCache::new(cache_path));
    }

    builder.build().context("Failed to build wallpaper selector")
}

/// Handle the 'select' command
async fn handle_select(cfg: &config::Config, cache_path: &Path) -> Result<()> {
    let selector = build_selector(cfg, cache_path)?;

    let start = Instant::now();
    let path = selector
        .select_new_wallpaper()
        .await
        .context("Failed to select a new wallpaper")?;

    println!("{} {}", "✓".green(), path.display());
    info!("Selected in {:?}", start.elapsed());
    Ok(())
}

/// Handle the 'watch' command
async fn handle_watch(cfg: &config::Config, cache_path: &Path, every: Duration) -> Result<()> {
    let selector = build_selector(cfg, cache_path)?;
    info!("Selecting a new wallpaper every {:?}", every);
    run_watch(&selector, every, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    })
    .await;
    info!("Interrupted, stopping");
    Ok(())
}

/// Run a selection cycle on every tick until `shutdown` resolves.
///
/// A failed cycle is logged and retried on the next tick. `shutdown` also
/// cancels a cycle that is still in progress.
async fn run_watch<S>(selector: &WallpaperSelector, every: Duration, shutdown: S)
where
    S: Future<Output = ()>,
{
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            biased;
            _ = &mut shutdown => return,
            _ = ticker.tick() => {}
        }

        tokio::select! {
            biased;
            _ = &mut shutdown => {
                info!("Cancelled the running selection cycle");
                return;
            }
            result = selector.select_new_wallpaper() => match result {
                Ok(path) => println!("{} {}", "✓".green(), path.display()),
                Err(e) => error!("Selection cycle failed, retrying next tick: {e}"),
            },
        }
    }
}

/// Handle the 'unused' command
fn handle_unused(cache_path: &Path) -> Result<()> {
    let cache = JsonFileCache::new(cache_path);
    let unused = cache.list_unused().context("Failed to read wallpaper cache")?;

    println!("{}", format!("{} unused wallpaper(s):", unused.len()).bold().blue());
    for candidate in unused {
        println!(
            "  {} {} [{}] {}",
            "•".cyan(),
            candidate.title,
            candidate.source_tag,
            candidate.url
        );
    }
    Ok(())
}

/// Handle the 'purge-cache' command
fn handle_purge(cache_path: &Path) -> Result<()> {
    let cache = JsonFileCache::new(cache_path);
    cache.purge().context("Failed to purge wallpaper cache")?;
    println!("{} Purged {}", "✓".green(), cache.path().display());
    Ok(())
}
