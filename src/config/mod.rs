//! Configuration loading, merging and validation.
//!
//! Settings are layered, later layers winning:
//!
//! 1. Built-in defaults derived from the release (`python34` naming)
//! 2. An optional YAML file passed with `--config`
//! 3. Environment variables and command-line flags
//!
//! # Example
//!
//! ```
//! use srcinstall::config::{parse_config, ConfigOverrides, InstallConfig};
//! use srcinstall::distro::ReleasePaths;
//! use std::path::Path;
//!
//! let file = parse_config("python_directory: /usr/local/python34\n", Path::new("srcinstall.yml")).unwrap();
//! let config = InstallConfig::resolve(
//!     &file,
//!     &ConfigOverrides::default(),
//!     Path::new("/home/builder"),
//!     ReleasePaths::default(),
//! )
//! .unwrap();
//! assert_eq!(config.target.install_dir, Path::new("/usr/local/python34"));
//! assert_eq!(config.target.cache_dir, Path::new("/home/builder/.python34"));
//! ```

pub mod install;
pub mod loader;
pub mod schema;
pub mod validator;

pub use install::{
    default_source_url, short_name, BuildTarget, ConfigOverrides, InstallConfig, Timeouts,
    DEFAULT_CHECKSUM, DEFAULT_CONFIGURE_FLAGS, DEFAULT_RELEASE,
};
pub use loader::{load_config_file, load_optional_config, parse_config};
pub use schema::{ConfigFile, ReleaseFilesFile, TimeoutsFile};
pub use validator::validate;
