//! JSON configuration for the `wallshuffle` binary.
//!
//! Lives at `$HOME/.config/wallshuffle/config.json` unless `--config` points
//! elsewhere. A missing file is created with defaults; missing fields fall
//! back to their defaults.

use anyhow::{Context, Result};
use finders::RedditSearchConfig;
use selector::DEFAULT_MINIMUM_POOL_SIZE;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const CACHE_FILE_NAME: &str = "cache.json";

pub const DEFAULT_INTERVAL_MINUTES: u64 = 180;
pub const DEFAULT_QUERY: &str = "(3840x2160) AND (landscape OR space OR sci-fi OR winter OR forest OR \
     Canada OR Alaska OR Lights OR Moon OR Park OR National OR Tree OR Mountain OR Pine OR Scene)";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub save_directory: PathBuf,
    pub minimum_pool_size: usize,
    pub interval_minutes: u64,
    pub cache_enabled: bool,
    pub reddit: RedditSearchConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            save_directory: home_dir().join("Pictures").join("wallshuffle"),
            minimum_pool_size: DEFAULT_MINIMUM_POOL_SIZE,
            interval_minutes: DEFAULT_INTERVAL_MINUTES,
            cache_enabled: true,
            reddit: RedditSearchConfig::default().with_query(DEFAULT_QUERY),
        }
    }
}

impl Config {
    /// Where the seen/used cache is stored: next to the config file at
    /// `config_path`.
    pub fn cache_path(&self, config_path: &Path) -> PathBuf {
        match config_path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.join(CACHE_FILE_NAME),
            _ => PathBuf::from(CACHE_FILE_NAME),
        }
    }
}

fn home_dir() -> PathBuf {
    PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| String::from(".")))
}

pub fn config_dir() -> PathBuf {
    home_dir().join(".config").join("wallshuffle")
}

pub fn default_config_path() -> PathBuf {
    config_dir().join("config.json")
}

/// Load the config at `path`, writing defaults there first if it is missing.
pub fn load_or_create(path: &Path) -> Result<Config> {
    if path.exists() {
        return load(path);
    }

    let config = Config::default();
    save(path, &config)?;
    tracing::info!("Wrote default configuration to {}", path.display());
    Ok(config)
}

pub fn load(path: &Path) -> Result<Config> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    serde_json::from_str(&data).with_context(|| format!("Invalid config {}", path.display()))
}

pub fn save(path: &Path, config: &Config) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let data = serde_json::to_string_pretty(config)?;
    fs::write(path, data).with_context(|| format!("Failed to write config {}", path.display()))
}
