//! Distribution identification.
//!
//! Works out the vendor, release and codename of the running system:
//!
//! 1. `/etc/lsb-release` overrides, used alone when complete
//! 2. `/etc/dpkg/origins/default` and `/etc/debian_version`
//! 3. `apt-cache policy`, when no codename is known yet
//!
//! Each path can be redirected with the `LSB_ETC_*` environment variables
//! so the lookup can be pointed at a chroot or test fixtures.
//!
//! # Example
//!
//! ```no_run
//! use srcinstall::distro::DistributionIdentifier;
//! use srcinstall::shell::SystemRunner;
//!
//! let runner = SystemRunner::new();
//! let info = DistributionIdentifier::new(&runner).identify();
//! println!("{} {:?}", info.vendor_id, info.release);
//! ```

pub mod codename;
pub mod debian;
pub mod info;
pub mod lsb;
pub mod policy;

pub use codename::CodenameTable;
pub use info::DistributionInfo;
pub use lsb::LsbRelease;
pub use policy::{PolicyEntry, PolicyFilter};

use std::path::PathBuf;

use crate::shell::{gnu_os_name, CommandRunner};

/// Locations of the release files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleasePaths {
    /// User override file.
    pub lsb_release: PathBuf,
    /// dpkg vendor marker.
    pub dpkg_origins: PathBuf,
    /// Debian version marker.
    pub debian_version: PathBuf,
}

impl Default for ReleasePaths {
    fn default() -> Self {
        Self {
            lsb_release: PathBuf::from("/etc/lsb-release"),
            dpkg_origins: PathBuf::from("/etc/dpkg/origins/default"),
            debian_version: PathBuf::from("/etc/debian_version"),
        }
    }
}

impl ReleasePaths {
    /// Default paths, each overridable through its environment variable.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve paths with a custom env lookup (for testing).
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let pick = |key: &str, default: PathBuf| lookup(key).map(PathBuf::from).unwrap_or(default);

        Self {
            lsb_release: pick("LSB_ETC_LSB_RELEASE", defaults.lsb_release),
            dpkg_origins: pick("LSB_ETC_DPKG_ORIGINS_DEFAULT", defaults.dpkg_origins),
            debian_version: pick("LSB_ETC_DEBIAN_VERSION", defaults.debian_version),
        }
    }
}

/// Identifies the running distribution.
pub struct DistributionIdentifier<'a> {
    runner: &'a dyn CommandRunner,
    paths: ReleasePaths,
    codenames: CodenameTable,
    filter: PolicyFilter,
    os_name: String,
}

impl<'a> DistributionIdentifier<'a> {
    /// Create an identifier using the standard paths (with env overrides).
    pub fn new(runner: &'a dyn CommandRunner) -> Self {
        Self {
            runner,
            paths: ReleasePaths::from_env(),
            codenames: CodenameTable::debian(),
            filter: PolicyFilter::default(),
            os_name: gnu_os_name().to_string(),
        }
    }

    /// Read release files from `paths` instead.
    pub fn with_paths(mut self, paths: ReleasePaths) -> Self {
        self.paths = paths;
        self
    }

    /// Report `os_name` in descriptions instead of the detected one.
    pub fn with_os_name(mut self, os_name: &str) -> Self {
        self.os_name = os_name.to_string();
        self
    }

    /// Identify the system.
    ///
    /// Never fails: a system nothing can be learned about yields a record
    /// with only the fallback vendor id.
    pub fn identify(&self) -> DistributionInfo {
        let lsb = LsbRelease::load_optional(&self.paths.lsb_release);
        if let Some(info) = lsb.complete() {
            tracing::debug!("using {} as is", self.paths.lsb_release.display());
            return info;
        }

        let guessed = debian::guess_release(
            &self.paths,
            &self.codenames,
            &self.filter,
            self.runner,
            &self.os_name,
        );
        let info = lsb.overlay(guessed);
        tracing::info!("identified distribution: {:?}", info);
        info
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::{CommandOutput, FakeRunner};
    use tempfile::TempDir;

    fn paths_in(temp: &TempDir) -> ReleasePaths {
        ReleasePaths {
            lsb_release: temp.path().join("lsb-release"),
            dpkg_origins: temp.path().join("origins-default"),
            debian_version: temp.path().join("debian_version"),
        }
    }

    #[test]
    fn paths_honor_env_overrides() {
        let paths = ReleasePaths::from_lookup(|key| {
            (key == "LSB_ETC_DEBIAN_VERSION").then(|| "/chroot/etc/debian_version".to_string())
        });
        assert_eq!(
            paths.debian_version,
            PathBuf::from("/chroot/etc/debian_version")
        );
        assert_eq!(paths.lsb_release, PathBuf::from("/etc/lsb-release"));
    }

    #[test]
    fn complete_lsb_release_wins_outright() {
        let temp = TempDir::new().unwrap();
        let paths = paths_in(&temp);
        std::fs::write(
            &paths.lsb_release,
            "DISTRIB_ID=Ubuntu\nDISTRIB_RELEASE=14.04\nDISTRIB_CODENAME=trusty\nDISTRIB_DESCRIPTION=\"Ubuntu 14.04 LTS\"\n",
        )
        .unwrap();
        std::fs::write(&paths.debian_version, "jessie/sid\n").unwrap();
        let runner = FakeRunner::new();

        let info = DistributionIdentifier::new(&runner)
            .with_paths(paths)
            .identify();

        assert_eq!(info.vendor_id, "Ubuntu");
        assert_eq!(info.release.as_deref(), Some("14.04"));
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn partial_lsb_release_overlays_guess() {
        let temp = TempDir::new().unwrap();
        let paths = paths_in(&temp);
        std::fs::write(&paths.lsb_release, "DISTRIB_ID=Ubuntu\nDISTRIB_RELEASE=13.10\n").unwrap();
        std::fs::write(&paths.debian_version, "wheezy/sid\n").unwrap();
        let policy = " 500 http://archive.ubuntu.com/ubuntu saucy/main amd64 Packages\n     release v=13.10,o=Ubuntu,a=saucy,n=saucy,l=Ubuntu,c=main\n";
        let runner = FakeRunner::new().on("apt-cache policy", CommandOutput::exited(0, policy, ""));

        let info = DistributionIdentifier::new(&runner)
            .with_paths(paths)
            .with_os_name("GNU/Linux")
            .identify();

        assert_eq!(info.vendor_id, "Ubuntu");
        assert_eq!(info.release.as_deref(), Some("13.10"));
        assert_eq!(info.codename.as_deref(), Some("n/a"));
        assert_eq!(
            info.description.as_deref(),
            Some("Debian GNU/Linux testing/unstable (n/a)")
        );
        assert_eq!(runner.count("apt-cache policy"), 1);
    }

    #[test]
    fn unidentifiable_system_keeps_fallback_vendor() {
        let temp = TempDir::new().unwrap();
        let runner = FakeRunner::new().on("apt-cache", CommandOutput::exited(100, "", "E: no"));

        let info = DistributionIdentifier::new(&runner)
            .with_paths(paths_in(&temp))
            .identify();

        assert_eq!(info, DistributionInfo::unidentified("Debian"));
    }
}
