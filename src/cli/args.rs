//! CLI argument definitions.
//!
//! This module defines all CLI arguments using clap's derive macros.
//! The main entry point is the [`Cli`] struct.

use clap::Parser;
use std::path::PathBuf;

use crate::config::ConfigOverrides;

/// srcinstall - Build a Python runtime from source on Debian-family systems.
#[derive(Debug, Parser)]
#[command(name = "srcinstall")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Release to build [default: 3.4.3]
    #[arg(long, value_name = "VER", env = "SRCINSTALL_PYTHON_RELEASE")]
    pub python_release: Option<String>,

    /// Installation prefix [default: /opt/python34]
    #[arg(
        long,
        value_name = "DIR",
        visible_alias = "install-directory",
        env = "SRCINSTALL_PYTHON_DIRECTORY"
    )]
    pub python_directory: Option<PathBuf>,

    /// Source archive URL [default: python.org URL for the release]
    #[arg(long, value_name = "URL", env = "SRCINSTALL_SOURCE_URL")]
    pub source_url: Option<String>,

    /// Expected MD5 or SHA-256 of the archive
    #[arg(long, value_name = "HEX", env = "SRCINSTALL_CHECKSUM")]
    pub checksum: Option<String>,

    /// Path to a YAML config file
    #[arg(short, long, value_name = "FILE", env = "SRCINSTALL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Print the detected distribution and its build packages, then exit
    #[arg(long, conflicts_with = "quiet")]
    pub show_distribution: bool,

    /// Print --show-distribution output as JSON
    #[arg(long, requires = "show_distribution")]
    pub json: bool,

    /// Show verbose output
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Minimal output
    #[arg(short, long)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

impl Cli {
    /// Values from flags and environment, for merging over the config file.
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            python_release: self.python_release.clone(),
            python_directory: self.python_directory.clone(),
            source_url: self.source_url.clone(),
            checksum: self.checksum.clone(),
        }
    }
}
