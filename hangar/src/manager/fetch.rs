//! Streaming HTTP fetcher for engine release archives.
//!
//! Downloads a release asset to a temporary file in small chunks so the
//! caller can drive a progress meter, and checks a cancellation token
//! between chunks so an abort takes effect promptly. Redirects are
//! followed transparently; release download links almost always bounce
//! through an asset host.
//!
//! There is no resume support: a retry restarts from zero. That is a
//! known, accepted limitation for archives in the ~100 MB range.

use std::fs::{self, File};
use std::io::{BufWriter, Read, Write};
use std::path::Path;
use std::time::Duration;

use reqwest::blocking::Client;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::manager::error::{ManagerError, ManagerResult};

/// Default timeout covering the whole request.
const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Chunk size for streaming reads (8 KiB).
const CHUNK_SIZE: usize = 8 * 1024;

/// Progress callback: `(bytes_downloaded, total_bytes)`.
///
/// `total_bytes` is `None` when the server sent no Content-Length;
/// progress is then indeterminate. Reported byte counts are
/// monotonically non-decreasing.
pub type FetchProgressCallback = Box<dyn Fn(u64, Option<u64>) + Send + Sync>;

/// Streaming HTTP downloader.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpFetcher {
    /// Create a fetcher with the default timeout.
    pub fn new() -> Self {
        Self::with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Create a fetcher with a custom request timeout.
    pub fn with_timeout(timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .expect("failed to create HTTP client");
        Self { client }
    }

    /// Stream `url` to `dest`.
    ///
    /// Returns the number of bytes written. On any failure - and on
    /// cancellation - the partial file at `dest` is removed best-effort
    /// before the error is returned, so no half-written archive is left
    /// where a later pipeline could trip over it.
    pub fn fetch(
        &self,
        url: &str,
        dest: &Path,
        cancel: &CancellationToken,
        progress: Option<FetchProgressCallback>,
    ) -> ManagerResult<u64> {
        let result = self.fetch_inner(url, dest, cancel, progress);
        if result.is_err() && fs::remove_file(dest).is_ok() {
            debug!(dest = %dest.display(), "removed partial download");
        }
        result
    }

    fn fetch_inner(
        &self,
        url: &str,
        dest: &Path,
        cancel: &CancellationToken,
        progress: Option<FetchProgressCallback>,
    ) -> ManagerResult<u64> {
        if cancel.is_cancelled() {
            return Err(ManagerError::Cancelled);
        }

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).map_err(|e| ManagerError::Disk {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let mut response = self
            .client
            .get(url)
            .send()
            .map_err(|e| ManagerError::Network {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ManagerError::Network {
                url: url.to_string(),
                reason: format!("HTTP status {status}"),
            });
        }

        let total = response.content_length();
        if total.is_none() {
            warn!(url, "no content-length; progress will be indeterminate");
        }

        let file = File::create(dest).map_err(|e| ManagerError::Disk {
            path: dest.to_path_buf(),
            source: e,
        })?;
        let mut writer = BufWriter::new(file);
        let mut buffer = [0u8; CHUNK_SIZE];
        let mut downloaded: u64 = 0;

        loop {
            if cancel.is_cancelled() {
                return Err(ManagerError::Cancelled);
            }

            let bytes_read = response
                .read(&mut buffer)
                .map_err(|e| ManagerError::Network {
                    url: url.to_string(),
                    reason: format!("read error: {e}"),
                })?;

            if bytes_read == 0 {
                break;
            }

            writer
                .write_all(&buffer[..bytes_read])
                .map_err(|e| ManagerError::Disk {
                    path: dest.to_path_buf(),
                    source: e,
                })?;

            downloaded += bytes_read as u64;
            if let Some(ref cb) = progress {
                cb(downloaded, total);
            }
        }

        writer.flush().map_err(|e| ManagerError::Disk {
            path: dest.to_path_buf(),
            source: e,
        })?;

        debug!(url, bytes = downloaded, "download complete");
        Ok(downloaded)
    }
}
