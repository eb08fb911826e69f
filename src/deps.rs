//! Native build dependencies per distribution release.

use crate::error::{Result, SrcInstallError};

const WHEEZY_PACKAGES: &[&str] = &[
    "build-essential",
    "openssl",
    "libssl-dev",
    "libsqlite3-0",
    "libsqlite3-dev",
    "libbz2-1.0",
    "libbz2-dev",
    "libdb5.1",
    "libdb-dev",
    "libgdbm3",
    "libgdbm-dev",
    "liblzma5",
    "liblzma-dev",
    "libncurses5",
    "libncurses5-dev",
    "libreadline6",
    "libreadline6-dev",
];

const TRUSTY_PACKAGES: &[&str] = &[
    "build-essential",
    "openssl",
    "libssl-dev",
    "libreadline6-dev",
    "zlib1g-dev",
    "libbz2-dev",
    "liblzma-dev",
    "libgdbm-dev",
    "libdb-dev",
    "libssl-dev",
    "libexpat1-dev",
    "libmpdec-dev",
    "libbluetooth-dev",
    "locales",
    "libsqlite3-dev",
    "libffi-dev",
    "libgpm2",
    "mime-support",
    "netbase",
    "bzip2",
    "net-tools",
    "xvfb",
    "xauth",
];

/// Supported (vendor id, release) pairs and the packages each needs.
pub const SUPPORTED_RELEASES: &[(&str, &str, &[&str])] = &[
    ("Debian", "7.8", WHEEZY_PACKAGES),
    ("Ubuntu", "13.10", WHEEZY_PACKAGES),
    ("Ubuntu", "14.04", TRUSTY_PACKAGES),
];

/// Static (vendor id, release) to package list mapping.
#[derive(Debug, Clone, Copy)]
pub struct DependencyTable {
    releases: &'static [(&'static str, &'static str, &'static [&'static str])],
}

impl Default for DependencyTable {
    fn default() -> Self {
        Self::new(SUPPORTED_RELEASES)
    }
}

impl DependencyTable {
    pub fn new(
        releases: &'static [(&'static str, &'static str, &'static [&'static str])],
    ) -> Self {
        Self { releases }
    }

    /// Packages required on `vendor_id` `release`, in install order.
    ///
    /// Duplicates in the table are dropped, keeping the first occurrence.
    pub fn resolve(&self, vendor_id: &str, release: &str) -> Result<Vec<&'static str>> {
        let mut vendor_known = false;

        for (vendor, rel, packages) in self.releases {
            if *vendor != vendor_id {
                continue;
            }
            vendor_known = true;
            if *rel == release {
                let mut ordered: Vec<&'static str> = Vec::with_capacity(packages.len());
                for &package in packages.iter() {
                    if !ordered.contains(&package) {
                        ordered.push(package);
                    }
                }
                return Ok(ordered);
            }
        }

        if vendor_known {
            Err(SrcInstallError::UnsupportedRelease {
                vendor: vendor_id.to_string(),
                release: release.to_string(),
            })
        } else {
            Err(SrcInstallError::UnsupportedDistribution {
                vendor: vendor_id.to_string(),
            })
        }
    }

    /// Every supported (vendor id, release) pair.
    pub fn supported(&self) -> impl Iterator<Item = (&'static str, &'static str)> + '_ {
        self.releases.iter().map(|(vendor, release, _)| (*vendor, *release))
    }
}
