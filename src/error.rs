//! Error types for srcinstall operations.
//!
//! This module defines [`SrcInstallError`], the error type used throughout
//! the crate, and a [`Result`] type alias for convenience.
//!
//! # Error Handling Strategy
//!
//! - Every stage of an install reports a distinct variant
//! - Errors propagate to `main`, which prints one line and exits 1
//! - Use `anyhow::Error` (via `SrcInstallError::Other`) for unexpected errors

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for srcinstall operations.
#[derive(Debug, Error)]
pub enum SrcInstallError {
    /// The process is not running with root privileges.
    #[error("Must be root. What about sudo?")]
    Privilege,

    /// The invoking user's home directory could not be resolved.
    #[error("User home directory ({path}) not found")]
    HomeDirectoryMissing { path: PathBuf },

    /// The file could not be read while computing its digest.
    #[error("Error calculating checksum for file {path}: {source}")]
    Checksum {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The downloaded archive never matched its expected checksum.
    #[error("Checksum of {url} failed after {attempts} attempts. Check your internet connection!")]
    DownloadVerification { url: String, attempts: u32 },

    /// No dependency table exists for this vendor.
    #[error("This Linux distribution ({vendor}) is not supported")]
    UnsupportedDistribution { vendor: String },

    /// The vendor is known but this release of it is not.
    #[error("Release {release} of {vendor} is not supported")]
    UnsupportedRelease { vendor: String, release: String },

    /// A native package could not be installed.
    #[error("Could not install {package} package")]
    PackageInstall { package: String },

    /// The source archive could not be unpacked.
    #[error("Could not extract files to {build_dir}")]
    Extraction { build_dir: PathBuf },

    /// The configure step failed or timed out.
    #[error("Could not configure sources in {source_dir}")]
    Configuration { source_dir: PathBuf },

    /// The make step failed or timed out.
    #[error("Could not compile sources in {source_dir}")]
    Build { source_dir: PathBuf },

    /// The make install step failed or timed out.
    #[error("Could not install into {install_dir}")]
    Install { install_dir: PathBuf },

    /// Failed to parse the configuration file.
    #[error("Failed to parse config at {path}: {message}")]
    ConfigParse { path: PathBuf, message: String },

    /// Invalid configuration values.
    #[error("Invalid configuration: {message}")]
    ConfigValidation { message: String },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for srcinstall operations.
pub type Result<T> = std::result::Result<T, SrcInstallError>;
