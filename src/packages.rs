//! Native package installation through dpkg and apt-get.
//!
//! Every package is probed individually, missing ones are installed one by
//! one, and the whole list is checked again once afterwards.

use std::time::Duration;

use crate::error::{Result, SrcInstallError};
use crate::shell::{CommandRunner, CommandSpec};

/// Timeout for a single `dpkg -s` probe.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Timeout for a single `apt-get install`.
pub const DEFAULT_INSTALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Installs missing native packages.
pub struct PackageInstaller<'a> {
    runner: &'a dyn CommandRunner,
    probe_timeout: Duration,
    install_timeout: Duration,
}

impl<'a> PackageInstaller<'a> {
    pub fn new(runner: &'a dyn CommandRunner) -> Self {
        Self {
            runner,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            install_timeout: DEFAULT_INSTALL_TIMEOUT,
        }
    }

    /// Override the per-package install timeout.
    pub fn with_install_timeout(mut self, timeout: Duration) -> Self {
        self.install_timeout = timeout;
        self
    }

    /// Override the per-package probe timeout.
    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    /// Packages from `packages` that dpkg does not report as installed.
    pub fn missing<'p>(&self, packages: &[&'p str]) -> Vec<&'p str> {
        packages
            .iter()
            .copied()
            .filter(|package| !self.is_installed(package))
            .collect()
    }

    fn is_installed(&self, package: &str) -> bool {
        let spec = CommandSpec::new("dpkg")
            .args(["-s", package])
            .timeout(self.probe_timeout);
        match self.runner.run(&spec) {
            Ok(out) => out.success(),
            Err(e) => {
                tracing::warn!("could not probe {}: {}", package, e);
                false
            }
        }
    }

    fn install(&self, package: &str) -> Result<()> {
        tracing::info!("installing {}", package);
        let spec = CommandSpec::new("apt-get")
            .args(["install", "-y", package])
            .timeout(self.install_timeout);

        let out = self.runner.run(&spec).map_err(|e| {
            tracing::warn!("apt-get failed to start: {}", e);
            SrcInstallError::PackageInstall {
                package: package.to_string(),
            }
        })?;

        if out.success() {
            Ok(())
        } else {
            tracing::debug!(
                "apt-get install {} exited with {:?} (timed out: {}): {}",
                package,
                out.exit_code,
                out.timed_out,
                out.stderr.trim()
            );
            Err(SrcInstallError::PackageInstall {
                package: package.to_string(),
            })
        }
    }

    /// Make sure every package in `packages` is installed.
    ///
    /// Returns the packages that had to be installed. Nothing runs for an
    /// empty list, and nothing is installed when all are present.
    pub fn ensure_installed<'p>(&self, packages: &[&'p str]) -> Result<Vec<&'p str>> {
        if packages.is_empty() {
            return Ok(Vec::new());
        }

        let missing = self.missing(packages);
        if missing.is_empty() {
            tracing::debug!("all {} packages present", packages.len());
            return Ok(missing);
        }

        tracing::info!("missing packages: {}", missing.join(","));
        for package in &missing {
            self.install(package)?;
        }

        let still_missing = self.missing(packages);
        if !still_missing.is_empty() {
            return Err(SrcInstallError::PackageInstall {
                package: still_missing.join(","),
            });
        }

        Ok(missing)
    }
}
