//! Materializes a chosen candidate on disk.
//!
//! Bytes are streamed into a hidden `.part` file next to the destination and
//! renamed into place only once the whole body has arrived. Any failure
//! removes the partial file, so a returned path always points at a complete
//! image.

use crate::error::{Result, SelectorError};
use finders::Candidate;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument, warn};

pub const DEFAULT_DOWNLOAD_TIMEOUT_SECS: u64 = 120;

/// Streams remote images into a directory.
#[derive(Debug, Clone)]
pub struct Downloader {
    client: reqwest::Client,
}

impl Downloader {
    /// Create a downloader whose requests give up after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SelectorError::Download {
                url: String::new(),
                reason: format!("could not build HTTP client: {e}"),
            })?;
        Ok(Self { client })
    }

    /// Download `candidate` into `save_dir` and return the final path.
    #[instrument(skip(self, candidate), fields(id = %candidate.id))]
    pub async fn download(&self, candidate: &Candidate, save_dir: &Path) -> Result<PathBuf> {
        let file_name = wallpaper_file_name(candidate);
        let final_path = save_dir.join(&file_name);
        let part_path = save_dir.join(format!(".{file_name}.part"));

        let outcome = match self.stream_to(&candidate.url, &part_path).await {
            Ok(bytes) => tokio::fs::rename(&part_path, &final_path)
                .await
                .map(|_| bytes)
                .map_err(|e| download_error(&candidate.url, format!("rename failed: {e}"))),
            Err(e) => Err(e),
        };

        match outcome {
            Ok(bytes) => {
                info!("Saved {} bytes to {}", bytes, final_path.display());
                Ok(final_path)
            }
            Err(e) => {
                if let Err(cleanup) = tokio::fs::remove_file(&part_path).await {
                    if cleanup.kind() != std::io::ErrorKind::NotFound {
                        warn!(
                            "Could not remove partial download {}: {}",
                            part_path.display(),
                            cleanup
                        );
                    }
                }
                Err(e)
            }
        }
    }

    async fn stream_to(&self, url: &str, path: &Path) -> Result<u64> {
        debug!("Fetching {}", url);
        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| download_error(url, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(download_error(url, format!("status code {status}")));
        }

        let mut file = tokio::fs::File::create(path)
            .await
            .map_err(|e| download_error(url, format!("cannot create {}: {e}", path.display())))?;

        let mut written: u64 = 0;
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| download_error(url, e.to_string()))?
        {
            file.write_all(&chunk)
                .await
                .map_err(|e| download_error(url, e.to_string()))?;
            written += chunk.len() as u64;
        }

        file.flush()
            .await
            .map_err(|e| download_error(url, e.to_string()))?;

        if written == 0 {
            return Err(download_error(url, "empty response body".to_string()));
        }

        Ok(written)
    }
}

fn download_error(url: &str, reason: String) -> SelectorError {
    SelectorError::Download {
        url: url.to_string(),
        reason,
    }
}

/// Local file name for a candidate: `wallpaper.<id><ext>`.
///
/// Characters that could escape the save directory are replaced with `_`.
pub fn wallpaper_file_name(candidate: &Candidate) -> String {
    let id: String = candidate
        .id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("wallpaper.{}{}", id, url_extension(&candidate.url))
}

/// Extension of the URL's path including the dot, or an empty string.
///
/// Query strings and fragments are ignored.
pub fn url_extension(raw: &str) -> String {
    let path = match url::Url::parse(raw) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => raw
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .to_string(),
    };

    let last_segment = path.rsplit('/').next().unwrap_or_default();
    Path::new(last_segment)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty())
        .map(|ext| format!(".{ext}"))
        .unwrap_or_default()
}
