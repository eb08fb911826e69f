//! Distribution report.
//!
//! `srcinstall --show-distribution` prints what the system was identified
//! as and which packages a build would need, without changing anything.

use serde::Serialize;

use crate::deps::DependencyTable;
use crate::distro::{DistributionIdentifier, DistributionInfo, ReleasePaths};
use crate::error::{Result, SrcInstallError};
use crate::shell::CommandRunner;
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult};

/// JSON shape of the report.
#[derive(Debug, Serialize)]
struct DistributionReport<'a> {
    distribution: &'a DistributionInfo,
    supported: bool,
    packages: Vec<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    supported_releases: Vec<String>,
}

/// The show-distribution command implementation.
pub struct ShowDistributionCommand<'a> {
    runner: &'a dyn CommandRunner,
    release_files: ReleasePaths,
    table: DependencyTable,
    json: bool,
}

impl<'a> ShowDistributionCommand<'a> {
    pub fn new(runner: &'a dyn CommandRunner, release_files: ReleasePaths) -> Self {
        Self {
            runner,
            release_files,
            table: DependencyTable::default(),
            json: false,
        }
    }

    /// Print JSON instead of text.
    pub fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }
}

impl Command for ShowDistributionCommand<'_> {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let info = DistributionIdentifier::new(self.runner)
            .with_paths(self.release_files.clone())
            .identify();
        let resolved = self
            .table
            .resolve(&info.vendor_id, info.release.as_deref().unwrap_or_default());

        let report = match resolved {
            Ok(packages) => DistributionReport {
                distribution: &info,
                supported: true,
                packages,
                reason: None,
                supported_releases: Vec::new(),
            },
            Err(e) => DistributionReport {
                distribution: &info,
                supported: false,
                packages: Vec::new(),
                reason: Some(e.to_string()),
                supported_releases: self
                    .table
                    .supported()
                    .map(|(vendor, release)| format!("{} {}", vendor, release))
                    .collect(),
            },
        };

        if self.json {
            let json = serde_json::to_string_pretty(&report)
                .map_err(|e| SrcInstallError::Other(e.into()))?;
            ui.message(&json);
        } else {
            ui.message(&info.to_string());
            match &report.reason {
                None => {
                    ui.message("");
                    ui.message(&format!("Build packages ({}):", report.packages.len()));
                    for package in &report.packages {
                        ui.message(&format!("  {}", package));
                    }
                }
                Some(reason) => {
                    ui.warning(reason);
                    ui.message(&format!(
                        "Supported: {}",
                        report.supported_releases.join(", ")
                    ));
                }
            }
        }

        if report.supported {
            Ok(CommandResult::success())
        } else {
            Ok(CommandResult::failure(1))
        }
    }
}
