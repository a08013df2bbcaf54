//! Optional record of previously seen wallpapers.
//!
//! The selector tells the cache which candidates a cycle pooled and which one
//! it downloaded. Nothing in the selection algorithm reads it back; callers
//! use it to list images they have seen but never applied, or to purge it.

use crate::error::CacheError;
use finders::Candidate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

/// Storage for seen/used wallpaper records.
pub trait WallpaperCache: Send + Sync {
    /// Remember candidates that were pooled; already-known ids are left alone.
    fn record_seen(&self, candidates: &[Candidate]) -> Result<(), CacheError>;

    /// Flag a candidate as applied.
    fn mark_used(&self, candidate: &Candidate) -> Result<(), CacheError>;

    /// Candidates seen at least once and never used, oldest first.
    fn list_unused(&self) -> Result<Vec<Candidate>, CacheError>;

    /// Forget every record.
    fn purge(&self) -> Result<(), CacheError>;
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct CacheFile {
    records: Vec<CacheRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
struct CacheRecord {
    candidate: Candidate,
    used: bool,
}

/// Cache persisted as a single JSON document.
#[derive(Debug)]
pub struct JsonFileCache {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<CacheFile, CacheError> {
        match fs::read_to_string(&self.path) {
            Ok(data) => Ok(serde_json::from_str(&data)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(CacheFile::default()),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, file: &CacheFile) -> Result<(), CacheError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string_pretty(file)?;
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, data)?;
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }

    /// Load, modify and store the file while holding the lock.
    fn update<F>(&self, change: F) -> Result<(), CacheError>
    where
        F: FnOnce(&mut CacheFile),
    {
        let _guard = self.lock.lock().unwrap_or_else(|p| p.into_inner());
        let mut file = self.load()?;
        change(&mut file);
        self.save(&file)
    }
}

impl WallpaperCache for JsonFileCache {
    fn record_seen(&self, candidates: &[Candidate]) -> Result<(), CacheError> {
        self.update(|file| {
            let before = file.records.len();
            for candidate in candidates {
                if !file.records.iter().any(|r| r.candidate.id == candidate.id) {
                    file.records.push(CacheRecord {
                        candidate: candidate.clone(),
                        used: false,
                    });
                }
            }
            debug!("Cache recorded {} new candidates", file.records.len() - before);
        })
    }

    fn mark_used(&self, candidate: &Candidate) -> Result<(), CacheError> {
        self.update(|file| {
            match file.records.iter_mut().find(|r| r.candidate.id == candidate.id) {
                Some(record) => record.used = true,
                None => file.records.push(CacheRecord {
                    candidate: candidate.clone(),
                    used: true,
                }),
            }
        })
    }

    fn list_unused(&self) -> Result<Vec<Candidate>, CacheError> {
        let _guard = self.lock.lock().unwrap_or_else(|p| p.into_inner());
        Ok(self
            .load()?
            .records
            .into_iter()
            .filter(|r| !r.used)
            .map(|r| r.candidate)
            .collect())
    }

    fn purge(&self) -> Result<(), CacheError> {
        let _guard = self.lock.lock().unwrap_or_else(|p| p.into_inner());
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
