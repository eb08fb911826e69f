//! The identified distribution record.

use serde::Serialize;
use std::fmt;

/// Vendor id reported when nothing identifies the system.
pub const FALLBACK_VENDOR: &str = "Debian";

/// Codename reported for numeric releases missing from the codename table.
pub const UNKNOWN_CODENAME: &str = "n/a";

/// What the current system says it is.
///
/// Built once per run and never mutated afterwards. A record with only
/// `vendor_id` set means the system could not be identified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DistributionInfo {
    /// Distributor id, e.g. `Debian` or `Ubuntu`.
    pub vendor_id: String,
    /// Release number or suite, e.g. `7.8` or `testing/unstable`.
    pub release: Option<String>,
    /// Release codename, e.g. `wheezy`.
    pub codename: Option<String>,
    /// Human-readable description.
    pub description: Option<String>,
}

impl DistributionInfo {
    /// A record for a system nothing could be learned about.
    pub fn unidentified(vendor_id: &str) -> Self {
        Self {
            vendor_id: vendor_id.to_string(),
            release: None,
            codename: None,
            description: None,
        }
    }

    /// Whether a release was determined.
    pub fn is_identified(&self) -> bool {
        self.release.is_some()
    }

    /// Compose the description from id, os name, release and codename,
    /// e.g. `Debian GNU/Linux 7.8 (wheezy)`.
    pub fn compose_description(
        vendor_id: &str,
        os_name: &str,
        release: Option<&str>,
        codename: Option<&str>,
    ) -> String {
        let mut description = format!("{} {}", vendor_id, os_name);
        if let Some(release) = release {
            description.push(' ');
            description.push_str(release);
        }
        if let Some(codename) = codename {
            description.push_str(&format!(" ({})", codename));
        }
        description
    }
}

impl fmt::Display for DistributionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Distributor ID: {}", self.vendor_id)?;
        writeln!(
            f,
            "Description:    {}",
            self.description.as_deref().unwrap_or("n/a")
        )?;
        writeln!(f, "Release:        {}", self.release.as_deref().unwrap_or("n/a"))?;
        write!(f, "Codename:       {}", self.codename.as_deref().unwrap_or("n/a"))
    }
}
