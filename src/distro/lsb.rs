//! `/etc/lsb-release` parsing.
//!
//! The file holds `DISTRIB_<KEY>=value` lines. Whatever it sets overrides
//! the values guessed from the Debian marker files.

use std::path::Path;

use super::info::DistributionInfo;

/// Fields read from an lsb-release file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LsbRelease {
    pub id: Option<String>,
    pub release: Option<String>,
    pub codename: Option<String>,
    pub description: Option<String>,
}

impl LsbRelease {
    /// Parse lsb-release content.
    ///
    /// # Supported Formats
    ///
    /// - Simple: `DISTRIB_ID=Ubuntu`
    /// - Quoted: `DISTRIB_DESCRIPTION="Ubuntu 14.04 LTS"`
    /// - Values with equals signs: `DISTRIB_DESCRIPTION=a=b`
    ///
    /// Lines without `=`, keys without the `DISTRIB_` prefix and empty values
    /// are skipped.
    pub fn parse(content: &str) -> Self {
        let mut lsb = Self::default();

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                tracing::debug!("skipping lsb-release line without '=': {}", line);
                continue;
            };
            let Some(field) = key.strip_prefix("DISTRIB_") else {
                continue;
            };

            let value = unquote(value).trim();
            if value.is_empty() {
                continue;
            }
            let value = Some(value.to_string());

            match field {
                "ID" => lsb.id = value,
                "RELEASE" => lsb.release = value,
                "CODENAME" => lsb.codename = value,
                "DESCRIPTION" => lsb.description = value,
                _ => {}
            }
        }

        lsb
    }

    /// Load and parse an lsb-release file, returning empty fields if the
    /// file doesn't exist or can't be read.
    pub fn load_optional(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match std::fs::read_to_string(path) {
            Ok(content) => Self::parse(&content),
            Err(e) => {
                tracing::warn!("Unable to open {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// The complete record, if the file set every field.
    pub fn complete(&self) -> Option<DistributionInfo> {
        Some(DistributionInfo {
            vendor_id: self.id.clone()?,
            release: Some(self.release.clone()?),
            codename: Some(self.codename.clone()?),
            description: Some(self.description.clone()?),
        })
    }

    /// Lay the fields this file sets over `guessed`.
    pub fn overlay(&self, guessed: DistributionInfo) -> DistributionInfo {
        DistributionInfo {
            vendor_id: self.id.clone().unwrap_or(guessed.vendor_id),
            release: self.release.clone().or(guessed.release),
            codename: self.codename.clone().or(guessed.codename),
            description: self.description.clone().or(guessed.description),
        }
    }
}

/// Remove surrounding double quotes from a value.
fn unquote(value: &str) -> &str {
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        &value[1..value.len() - 1]
    } else {
        value
    }
}
