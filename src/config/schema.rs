//! Configuration file schema.
//!
//! Every field is optional; anything left out falls back to the built-in
//! defaults derived from the release being installed.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root of a srcinstall YAML config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    /// Runtime release to build, e.g. `3.4.3`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub python_release: Option<String>,

    /// Installation prefix.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub python_directory: Option<PathBuf>,

    /// Archive URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,

    /// Expected MD5 or SHA-256 of the archive.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,

    /// Where the archive is kept between runs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_directory: Option<PathBuf>,

    /// Scratch directory the archive is extracted into.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build_directory: Option<PathBuf>,

    /// Flags passed to `./configure` after `--prefix`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub configure_flags: Option<Vec<String>>,

    /// Total download attempts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_attempts: Option<u32>,

    /// Per-stage timeouts in seconds.
    #[serde(skip_serializing_if = "TimeoutsFile::is_empty")]
    pub timeouts: TimeoutsFile,

    /// Alternate release marker files.
    #[serde(skip_serializing_if = "ReleaseFilesFile::is_empty")]
    pub release_files: ReleaseFilesFile,
}

/// Timeouts section, all in seconds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TimeoutsFile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probe: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub install: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extract: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub configure: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub make: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub make_install: Option<u64>,
}

impl TimeoutsFile {
    fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Release files section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReleaseFilesFile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lsb_release: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dpkg_origins: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debian_version: Option<PathBuf>,
}

impl ReleaseFilesFile {
    fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}
