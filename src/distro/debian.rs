//! Release guessing from Debian marker files and apt policy.

use std::path::Path;
use std::time::Duration;

use crate::shell::{CommandRunner, CommandSpec};

use super::codename::CodenameTable;
use super::info::{DistributionInfo, FALLBACK_VENDOR, UNKNOWN_CODENAME};
use super::policy::{self, PolicyFilter, DEFAULT_TESTING_CODENAME};
use super::ReleasePaths;

/// How long `apt-cache policy` may run.
const POLICY_TIMEOUT: Duration = Duration::from_secs(30);

/// What `/etc/debian_version` says.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionMarker {
    /// A numeric release such as `7.8`, with its codename (or `n/a`).
    Numeric { release: String, codename: String },
    /// A `<codename>/sid` marker: testing or unstable, with the captured
    /// name of the testing codename.
    TestingUnstable { testing_codename: String },
    /// Any other text, taken literally.
    Text { release: String },
}

impl VersionMarker {
    /// Classify the content of a version marker file.
    ///
    /// Returns `None` for empty content.
    pub fn parse(content: &str, table: &CodenameTable) -> Option<Self> {
        let release = content.trim();
        let first = release.chars().next()?;

        if !first.is_alphabetic() {
            return Some(Self::Numeric {
                release: release.to_string(),
                codename: table
                    .lookup(release)
                    .unwrap_or(UNKNOWN_CODENAME)
                    .to_string(),
            });
        }

        if let Some(alias) = release.strip_suffix("/sid") {
            return Some(Self::TestingUnstable {
                testing_codename: alias.to_string(),
            });
        }

        Some(Self::Text {
            release: release.to_string(),
        })
    }
}

/// Read the vendor from a dpkg origins file (`Vendor: Debian`).
pub fn read_vendor(path: &Path) -> Option<String> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            if path.exists() {
                tracing::warn!("Unable to open {}: {}", path.display(), e);
            }
            return None;
        }
    };

    content.lines().find_map(|line| {
        let (header, value) = line.split_once(": ")?;
        if header.eq_ignore_ascii_case("vendor") {
            Some(value.trim().to_string())
        } else {
            None
        }
    })
}

/// Guess the distribution without consulting lsb-release.
///
/// `runner` is only used when the marker files leave the codename unknown.
pub fn guess_release(
    paths: &ReleasePaths,
    table: &CodenameTable,
    filter: &PolicyFilter,
    runner: &dyn CommandRunner,
    os_name: &str,
) -> DistributionInfo {
    let vendor_id = read_vendor(&paths.dpkg_origins);
    let mut identified = vendor_id.is_some();
    let vendor_id = vendor_id.unwrap_or_else(|| FALLBACK_VENDOR.to_string());

    let mut release = None;
    let mut codename = None;
    let mut testing_codename = DEFAULT_TESTING_CODENAME.to_string();

    if paths.debian_version.exists() {
        identified = true;
        let marker = match std::fs::read_to_string(&paths.debian_version) {
            Ok(content) => VersionMarker::parse(&content, table),
            Err(e) => {
                tracing::warn!("Unable to open {}: {}", paths.debian_version.display(), e);
                Some(VersionMarker::Text {
                    release: "unknown".to_string(),
                })
            }
        };
        tracing::debug!("version marker: {:?}", marker);

        match marker {
            Some(VersionMarker::Numeric {
                release: r,
                codename: c,
            }) => {
                release = Some(r);
                codename = Some(c);
            }
            Some(VersionMarker::TestingUnstable {
                testing_codename: alias,
            }) => {
                testing_codename = alias;
                release = Some("testing/unstable".to_string());
            }
            Some(VersionMarker::Text { release: r }) => release = Some(r),
            None => {}
        }
    }

    if codename.is_none() {
        let entries = query_policy(runner);
        if let Some(entry) = policy::select_release(&entries, filter, table) {
            tracing::debug!("selected policy entry: {:?}", entry);
            let resolved = policy::resolve_release(entry, table, &testing_codename);
            identified = true;
            release = Some(resolved.release);
            codename = Some(resolved.codename);
        } else if release.is_some() {
            codename = Some(UNKNOWN_CODENAME.to_string());
        }
    }

    if !identified {
        return DistributionInfo::unidentified(&vendor_id);
    }

    let description = DistributionInfo::compose_description(
        &vendor_id,
        os_name,
        release.as_deref(),
        codename.as_deref(),
    );

    DistributionInfo {
        vendor_id,
        release,
        codename,
        description: Some(description),
    }
}

/// Run `apt-cache policy` and parse its output.
///
/// Any failure yields no entries.
fn query_policy(runner: &dyn CommandRunner) -> Vec<policy::PolicyEntry> {
    let spec = CommandSpec::new("apt-cache")
        .arg("policy")
        .env("LC_ALL", "C")
        .timeout(POLICY_TIMEOUT);

    match runner.run(&spec) {
        Ok(out) if out.success() => policy::parse_policy(&out.stdout),
        Ok(out) => {
            tracing::debug!("apt-cache policy exited with {:?}", out.exit_code);
            Vec::new()
        }
        Err(e) => {
            tracing::debug!("apt-cache policy unavailable: {}", e);
            Vec::new()
        }
    }
}
