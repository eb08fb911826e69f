//! srcinstall - Build a Python runtime from source on Debian-family systems.
//!
//! srcinstall detects the running distribution, installs the native build
//! dependencies it needs through apt, downloads and verifies a source
//! archive, then runs configure, make and make install into a fixed
//! prefix.
//!
//! # Modules
//!
//! - [`build`] - Directory reset, extraction and the configure/make sequence
//! - [`checksum`] - Streaming MD5 and SHA-256 file digests
//! - [`cli`] - Command-line interface and argument parsing
//! - [`config`] - Configuration loading, merging and validation
//! - [`deps`] - Native build dependencies per distribution release
//! - [`distro`] - Distribution, release and codename detection
//! - [`error`] - Error types and result aliases
//! - [`fetch`] - Source archive download with checksum retries
//! - [`packages`] - dpkg probing and apt-get installs
//! - [`shell`] - External command execution
//! - [`ui`] - Spinners and terminal output
//!
//! # Example
//!
//! ```
//! use srcinstall::deps::DependencyTable;
//!
//! let packages = DependencyTable::default().resolve("Ubuntu", "14.04").unwrap();
//! assert_eq!(packages[0], "build-essential");
//! assert!(packages.contains(&"libsqlite3-dev"));
//! ```

pub mod build;
pub mod checksum;
pub mod cli;
pub mod config;
pub mod deps;
pub mod distro;
pub mod error;
pub mod fetch;
pub mod packages;
pub mod shell;
pub mod ui;

pub use error::{Result, SrcInstallError};
