//! Source archive download and verification.
//!
//! [`SourceFetcher`] keeps one archive in a cache directory and makes sure
//! it matches a known checksum before anything extracts it. A file that
//! fails verification is deleted, so the cache never holds a bad archive.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::anyhow;
use reqwest::blocking::Client;

use crate::checksum::{self, ChecksumAlgorithm};
use crate::error::{Result, SrcInstallError};

/// Download attempts before giving up.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Capability to fetch a URL into a local file.
pub trait Downloader {
    /// Write the body of `url` to `dest`, returning the byte count.
    ///
    /// `dest` may be left partially written on error.
    fn download(&self, url: &str, dest: &Path) -> Result<u64>;
}

/// Downloads over HTTP/HTTPS.
pub struct HttpDownloader {
    client: Client,
}

impl HttpDownloader {
    /// Create a downloader with a 30-second connect timeout and a
    /// 10-minute limit on the whole transfer.
    pub fn new() -> Result<Self> {
        Self::with_timeouts(Duration::from_secs(30), Duration::from_secs(600))
    }

    /// Create a downloader with custom timeouts.
    pub fn with_timeouts(connect_timeout: Duration, transfer_timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("srcinstall/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(connect_timeout)
            .timeout(transfer_timeout)
            .build()
            .map_err(|e| anyhow!("failed to build HTTP client: {}", e))?;

        Ok(Self { client })
    }
}

impl Downloader for HttpDownloader {
    fn download(&self, url: &str, dest: &Path) -> Result<u64> {
        let mut response = self
            .client
            .get(url)
            .send()
            .map_err(|e| anyhow!("request to {} failed: {}", url, e))?;

        if !response.status().is_success() {
            return Err(anyhow!("HTTP {} fetching {}", response.status(), url).into());
        }

        let mut out = BufWriter::new(File::create(dest)?);
        let bytes = response
            .copy_to(&mut out)
            .map_err(|e| anyhow!("reading {} failed: {}", url, e))?;
        out.flush()?;
        tracing::debug!("downloaded {} bytes from {}", bytes, url);
        Ok(bytes)
    }
}

/// The file name an archive URL is stored under: its last path segment.
pub fn archive_file_name(url: &str) -> Result<String> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    match path.rsplit('/').next() {
        Some(name) if !name.is_empty() => Ok(name.to_string()),
        _ => Err(SrcInstallError::ConfigValidation {
            message: format!("source URL {} does not name a file", url),
        }),
    }
}

/// Keeps a verified copy of a source archive in a cache directory.
pub struct SourceFetcher<'a> {
    downloader: &'a dyn Downloader,
    max_attempts: u32,
}

impl<'a> SourceFetcher<'a> {
    pub fn new(downloader: &'a dyn Downloader) -> Self {
        Self {
            downloader,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// Allow `attempts` downloads in total (at least one).
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// Make sure `cache_dir` holds the archive from `url` with checksum
    /// `expected`, and return its path.
    ///
    /// A cached file that already matches is used without any network
    /// access. Otherwise the file is downloaded and checked, up to the
    /// attempt budget; a file that fails the check is removed.
    pub fn ensure_downloaded(&self, url: &str, expected: &str, cache_dir: &Path) -> Result<PathBuf> {
        if ChecksumAlgorithm::from_hex(expected).is_none() {
            return Err(SrcInstallError::ConfigValidation {
                message: format!("'{}' is not an MD5 or SHA256 hex digest", expected),
            });
        }

        if !cache_dir.exists() {
            std::fs::create_dir_all(cache_dir)?;
            tracing::info!("Created directory {}", cache_dir.display());
        }

        let target = cache_dir.join(archive_file_name(url)?);

        for attempt in 1..=self.max_attempts {
            if !target.exists() {
                tracing::info!(
                    "Downloading {} to {} (attempt {}/{})",
                    url,
                    target.display(),
                    attempt,
                    self.max_attempts
                );
                if let Err(e) = self.downloader.download(url, &target) {
                    tracing::warn!("Download failed: {}", e);
                    discard(&target);
                    continue;
                }
            }

            match checksum::verify_file(&target, expected) {
                Ok(true) => {
                    tracing::debug!("{} verified", target.display());
                    return Ok(target);
                }
                Ok(false) => tracing::warn!("Checksum failed. Trying again..."),
                Err(e) => tracing::warn!("{}", e),
            }
            discard(&target);
        }

        Err(SrcInstallError::DownloadVerification {
            url: url.to_string(),
            attempts: self.max_attempts,
        })
    }
}

fn discard(path: &Path) {
    if path.exists() {
        if let Err(e) = std::fs::remove_file(path) {
            tracing::warn!("Could not remove {}: {}", path.display(), e);
        }
    }
}
