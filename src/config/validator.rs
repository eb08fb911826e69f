//! Validation of a resolved [`InstallConfig`].
//!
//! All problems are collected so they can be reported together.

use crate::checksum::ChecksumAlgorithm;
use crate::config::install::InstallConfig;
use crate::fetch::archive_file_name;

/// Check `config` and return one message per problem found.
pub fn validate(config: &InstallConfig) -> Vec<String> {
    let mut errors = Vec::new();
    let target = &config.target;

    if ChecksumAlgorithm::from_hex(&target.checksum).is_none() {
        errors.push(format!(
            "checksum '{}' must be 32 (MD5) or 64 (SHA-256) hex digits",
            target.checksum
        ));
    }

    if !(target.source_url.starts_with("http://") || target.source_url.starts_with("https://")) {
        errors.push(format!(
            "source URL '{}' must use http or https",
            target.source_url
        ));
    }

    match archive_file_name(&target.source_url) {
        Ok(name) if name.split('.').count() < 3 => errors.push(format!(
            "archive '{}' should look like <name>.tar.<ext>",
            name
        )),
        Ok(_) => {}
        Err(e) => errors.push(e.to_string()),
    }

    if !target.install_dir.is_absolute() {
        errors.push(format!(
            "install directory {} must be absolute",
            target.install_dir.display()
        ));
    }

    // The build wipes both directories before extracting.
    for (name, dir) in [
        ("install", &target.install_dir),
        ("build", &target.build_dir),
    ] {
        if dir.parent().is_none() {
            errors.push(format!(
                "{} directory {} cannot be a filesystem root",
                name,
                dir.display()
            ));
        } else if target.cache_dir.starts_with(dir) {
            errors.push(format!(
                "{} directory {} would remove the cached archive in {}",
                name,
                dir.display(),
                target.cache_dir.display()
            ));
        }
    }

    if config.download_attempts == 0 {
        errors.push("download_attempts must be at least 1".to_string());
    }

    let timeouts = &config.timeouts;
    for (name, value) in [
        ("probe", timeouts.probe),
        ("install", timeouts.install),
        ("download", timeouts.download),
        ("extract", timeouts.extract),
        ("configure", timeouts.configure),
        ("make", timeouts.make),
        ("make_install", timeouts.make_install),
    ] {
        if value.is_zero() {
            errors.push(format!("timeout '{}' must be greater than zero", name));
        }
    }

    errors
}
