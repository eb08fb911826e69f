//! Integration tests for config module public API.

use srcinstall::config::{
    load_config_file, load_optional_config, validate, ConfigOverrides, InstallConfig,
    DEFAULT_CHECKSUM,
};
use srcinstall::distro::ReleasePaths;
use srcinstall::SrcInstallError;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;

const SHA256: &str = "b5b3963533768d5fc325a4d7a6bd6f666726002d696f1d399ec06b043ea996b8";

#[test]
fn full_config_workflow() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("srcinstall.yml");
    fs::write(
        &path,
        format!(
            r#"
python_release: "3.5.0"
checksum: {SHA256}
python_directory: /usr/local/python35
configure_flags: ["--enable-shared"]
download_attempts: 5
timeouts:
  make: 1200
release_files:
  debian_version: /srv/chroot/etc/debian_version
"#
        ),
    )
    .unwrap();

    let file = load_config_file(&path).unwrap();
    let config = InstallConfig::resolve(
        &file,
        &ConfigOverrides::default(),
        Path::new("/home/builder"),
        ReleasePaths::default(),
    )
    .unwrap();

    assert!(validate(&config).is_empty());
    assert_eq!(
        config.target.source_url,
        "https://www.python.org/ftp/python/3.5.0/Python-3.5.0.tar.xz"
    );
    assert_eq!(config.target.cache_dir, Path::new("/home/builder/.python35"));
    assert_eq!(
        config.target.build_dir,
        Path::new("/home/builder/.python35-build")
    );
    assert_eq!(config.configure_flags, ["--enable-shared"]);
    assert_eq!(config.download_attempts, 5);
    assert_eq!(config.timeouts.make, Duration::from_secs(1200));
    assert_eq!(config.timeouts.configure, Duration::from_secs(300));
    assert_eq!(
        config.release_files.debian_version,
        Path::new("/srv/chroot/etc/debian_version")
    );
}

#[test]
fn flags_beat_config_file() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("srcinstall.yml");
    fs::write(&path, "python_directory: /usr/local/python34\n").unwrap();

    let file = load_optional_config(Some(&path)).unwrap();
    let overrides = ConfigOverrides {
        python_directory: Some("/opt/custom".into()),
        ..Default::default()
    };
    let config = InstallConfig::resolve(
        &file,
        &overrides,
        Path::new("/root"),
        ReleasePaths::default(),
    )
    .unwrap();

    assert_eq!(config.target.install_dir, Path::new("/opt/custom"));
    assert_eq!(config.target.checksum, DEFAULT_CHECKSUM);
}

#[test]
fn unknown_keys_are_rejected() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("srcinstall.yml");
    fs::write(&path, "pyhton_release: 3.4.3\n").unwrap();

    let err = load_config_file(&path).unwrap_err();
    assert!(matches!(err, SrcInstallError::ConfigParse { .. }));
}

#[test]
fn other_release_needs_checksum() {
    let overrides = ConfigOverrides {
        python_release: Some("3.4.2".into()),
        ..Default::default()
    };
    let err = InstallConfig::resolve(
        &Default::default(),
        &overrides,
        Path::new("/root"),
        ReleasePaths::default(),
    )
    .unwrap_err();

    assert!(matches!(err, SrcInstallError::ConfigValidation { .. }));
    assert!(err.to_string().contains("--checksum"));
}
