//! Command dispatching.
//!
//! This module provides the core command infrastructure:
//! - [`Command`] trait for implementing commands
//! - [`CommandResult`] for uniform result reporting
//! - [`CommandDispatcher`] for routing the parsed CLI to a command

use crate::cli::args::Cli;
use crate::distro::ReleasePaths;
use crate::error::Result;
use crate::shell::{CommandRunner, SystemRunner};
use crate::ui::UserInterface;

use super::install::InstallCommand;
use super::show::ShowDistributionCommand;

/// Trait for command implementations.
pub trait Command {
    /// Execute the command.
    ///
    /// # Arguments
    ///
    /// * `ui` - User interface for displaying output
    ///
    /// # Returns
    ///
    /// A [`CommandResult`] indicating success/failure and exit code.
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult>;
}

/// Result of command execution.
#[derive(Debug)]
pub struct CommandResult {
    /// Whether the command succeeded.
    pub success: bool,

    /// Exit code to use (0 for success, non-zero for failure).
    pub exit_code: i32,
}

impl CommandResult {
    /// Create a successful result.
    pub fn success() -> Self {
        Self {
            success: true,
            exit_code: 0,
        }
    }

    /// Create a failure result.
    pub fn failure(exit_code: i32) -> Self {
        Self {
            success: false,
            exit_code,
        }
    }
}

/// Routes the parsed CLI to its command.
pub struct CommandDispatcher {
    runner: Box<dyn CommandRunner>,
    release_files: ReleasePaths,
}

impl CommandDispatcher {
    /// Dispatcher that spawns real processes and honours the `LSB_ETC_*`
    /// path overrides.
    pub fn new() -> Self {
        Self {
            runner: Box::new(SystemRunner::new()),
            release_files: ReleasePaths::from_env(),
        }
    }

    /// Dispatcher with a custom runner and release file paths.
    pub fn with_runner(runner: Box<dyn CommandRunner>, release_files: ReleasePaths) -> Self {
        Self {
            runner,
            release_files,
        }
    }

    /// Dispatch and execute a command.
    pub fn dispatch(&self, cli: &Cli, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        if cli.show_distribution {
            let cmd = ShowDistributionCommand::new(self.runner.as_ref(), self.release_files.clone())
                .with_json(cli.json);
            return cmd.execute(ui);
        }

        let cmd = InstallCommand::new(
            self.runner.as_ref(),
            cli.config.clone(),
            cli.overrides(),
            self.release_files.clone(),
        );
        cmd.execute(ui)
    }
}

impl Default for CommandDispatcher {
    fn default() -> Self {
        Self::new()
    }
}
