//! CLI command implementations.
//!
//! Each command implements the [`Command`] trait, which provides a uniform
//! interface for executing commands and reporting results.
//!
//! # Architecture
//!
//! There are no subcommands. [`CommandDispatcher`] picks the distribution
//! report when `--show-distribution` is given and the install otherwise.

pub mod dispatcher;
pub mod install;
pub mod show;

pub use dispatcher::{Command, CommandDispatcher, CommandResult};
pub use install::{InstallCommand, InstallPipeline};
pub use show::ShowDistributionCommand;
