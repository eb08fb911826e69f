//! The resolved settings for one install run.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;

use crate::config::schema::ConfigFile;
use crate::config::validator;
use crate::distro::ReleasePaths;
use crate::error::{Result, SrcInstallError};

/// Release installed when nothing else is asked for.
pub const DEFAULT_RELEASE: &str = "3.4.3";

/// Upstream MD5 of `Python-3.4.3.tar.xz`.
pub const DEFAULT_CHECKSUM: &str = "7d092d1bba6e17f0d9bd21b49e441dd5";

/// Flags passed to `./configure` after `--prefix`.
pub const DEFAULT_CONFIGURE_FLAGS: &[&str] = &["--disable-ipv6", "--with-dbmliborder=bdb:gdbm"];

/// Archive location, source and build directories for a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildTarget {
    pub source_url: String,
    pub checksum: String,
    pub cache_dir: PathBuf,
    pub build_dir: PathBuf,
    pub install_dir: PathBuf,
}

/// Per-stage time limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Timeouts {
    pub probe: Duration,
    pub install: Duration,
    pub download: Duration,
    pub extract: Duration,
    pub configure: Duration,
    pub make: Duration,
    pub make_install: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            probe: Duration::from_secs(5),
            install: Duration::from_secs(30),
            download: Duration::from_secs(600),
            extract: Duration::from_secs(60),
            configure: Duration::from_secs(300),
            make: Duration::from_secs(300),
            make_install: Duration::from_secs(300),
        }
    }
}

/// Values given on the command line or through the environment.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub python_release: Option<String>,
    pub python_directory: Option<PathBuf>,
    pub source_url: Option<String>,
    pub checksum: Option<String>,
}

/// Everything an install run needs, fixed for its lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstallConfig {
    pub release: String,
    pub target: BuildTarget,
    pub configure_flags: Vec<String>,
    pub timeouts: Timeouts,
    pub download_attempts: u32,
    #[serde(skip)]
    pub release_files: ReleasePaths,
}

/// `3.4.3` -> `python34`.
pub fn short_name(release: &str) -> Option<String> {
    let mut parts = release.split('.');
    let major = parts.next().filter(|p| is_number(p))?;
    let minor = parts.next().filter(|p| is_number(p))?;
    Some(format!("python{}{}", major, minor))
}

fn is_number(part: &str) -> bool {
    !part.is_empty() && part.chars().all(|c| c.is_ascii_digit())
}

/// Download URL for a release on python.org.
pub fn default_source_url(release: &str) -> String {
    format!(
        "https://www.python.org/ftp/python/{release}/Python-{release}.tar.xz",
        release = release
    )
}

impl InstallConfig {
    /// Merge built-in defaults, `file` and `overrides` (highest wins),
    /// placing the cache and build directories under `home`.
    ///
    /// `release_files` are the release marker paths after environment
    /// overrides; the config file only replaces paths still at their
    /// defaults.
    pub fn resolve(
        file: &ConfigFile,
        overrides: &ConfigOverrides,
        home: &Path,
        release_files: ReleasePaths,
    ) -> Result<Self> {
        let release = overrides
            .python_release
            .clone()
            .or_else(|| file.python_release.clone())
            .unwrap_or_else(|| DEFAULT_RELEASE.to_string());

        let short = short_name(&release).ok_or_else(|| SrcInstallError::ConfigValidation {
            message: format!("'{}' is not a release number like {}", release, DEFAULT_RELEASE),
        })?;

        let checksum = match overrides.checksum.clone().or_else(|| file.checksum.clone()) {
            Some(checksum) => checksum,
            None if release == DEFAULT_RELEASE => DEFAULT_CHECKSUM.to_string(),
            None => {
                return Err(SrcInstallError::ConfigValidation {
                    message: format!(
                        "no known checksum for release {}; pass --checksum",
                        release
                    ),
                })
            }
        };

        let target = BuildTarget {
            source_url: overrides
                .source_url
                .clone()
                .or_else(|| file.source_url.clone())
                .unwrap_or_else(|| default_source_url(&release)),
            checksum,
            cache_dir: file
                .cache_directory
                .clone()
                .unwrap_or_else(|| home.join(format!(".{}", short))),
            build_dir: file
                .build_directory
                .clone()
                .unwrap_or_else(|| home.join(format!(".{}-build", short))),
            install_dir: overrides
                .python_directory
                .clone()
                .or_else(|| file.python_directory.clone())
                .unwrap_or_else(|| PathBuf::from("/opt").join(&short)),
        };

        let defaults = Timeouts::default();
        let secs = |value: Option<u64>, default: Duration| {
            value.map(Duration::from_secs).unwrap_or(default)
        };
        let timeouts = Timeouts {
            probe: secs(file.timeouts.probe, defaults.probe),
            install: secs(file.timeouts.install, defaults.install),
            download: secs(file.timeouts.download, defaults.download),
            extract: secs(file.timeouts.extract, defaults.extract),
            configure: secs(file.timeouts.configure, defaults.configure),
            make: secs(file.timeouts.make, defaults.make),
            make_install: secs(file.timeouts.make_install, defaults.make_install),
        };

        let stock = ReleasePaths::default();
        let pick = |current: PathBuf, stock: PathBuf, configured: &Option<PathBuf>| {
            match configured {
                Some(path) if current == stock => path.clone(),
                _ => current,
            }
        };
        let release_files = ReleasePaths {
            lsb_release: pick(
                release_files.lsb_release,
                stock.lsb_release,
                &file.release_files.lsb_release,
            ),
            dpkg_origins: pick(
                release_files.dpkg_origins,
                stock.dpkg_origins,
                &file.release_files.dpkg_origins,
            ),
            debian_version: pick(
                release_files.debian_version,
                stock.debian_version,
                &file.release_files.debian_version,
            ),
        };

        let config = Self {
            release,
            target,
            configure_flags: file.configure_flags.clone().unwrap_or_else(|| {
                DEFAULT_CONFIGURE_FLAGS
                    .iter()
                    .map(|flag| flag.to_string())
                    .collect()
            }),
            timeouts,
            download_attempts: file
                .download_attempts
                .unwrap_or(crate::fetch::DEFAULT_MAX_ATTEMPTS),
            release_files,
        };

        let errors = validator::validate(&config);
        if !errors.is_empty() {
            return Err(SrcInstallError::ConfigValidation {
                message: errors.join("; "),
            });
        }

        tracing::debug!("resolved config: {:?}", config);
        Ok(config)
    }
}
