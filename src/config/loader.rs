//! Configuration file loading.

use crate::config::schema::ConfigFile;
use crate::error::{Result, SrcInstallError};
use std::fs;
use std::path::Path;

/// Load a single config file.
///
/// # Errors
///
/// Returns `ConfigParse` if the file is missing or the YAML is invalid.
pub fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            SrcInstallError::ConfigParse {
                path: path.to_path_buf(),
                message: "file not found".to_string(),
            }
        } else {
            SrcInstallError::Io(e)
        }
    })?;

    parse_config(&content, path)
}

/// Parse YAML content into a [`ConfigFile`].
///
/// `source_path` is only used for error reporting. An empty document is
/// an empty config.
pub fn parse_config(content: &str, source_path: &Path) -> Result<ConfigFile> {
    if content.trim().is_empty() {
        return Ok(ConfigFile::default());
    }

    serde_yaml::from_str(content).map_err(|e| SrcInstallError::ConfigParse {
        path: source_path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Load `path` if given, otherwise return the empty config.
pub fn load_optional_config(path: Option<&Path>) -> Result<ConfigFile> {
    match path {
        Some(path) => {
            tracing::debug!("loading config from {}", path.display());
            load_config_file(path)
        }
        None => Ok(ConfigFile::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn loads_yaml_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("srcinstall.yml");
        fs::write(&path, "python_release: 3.4.2\n").unwrap();

        let config = load_config_file(&path).unwrap();
        assert_eq!(config.python_release.as_deref(), Some("3.4.2"));
    }

    #[test]
    fn missing_file_is_parse_error() {
        let temp = TempDir::new().unwrap();
        let err = load_config_file(&temp.path().join("absent.yml")).unwrap_err();
        assert!(matches!(err, SrcInstallError::ConfigParse { .. }));
        assert!(err.to_string().contains("absent.yml"));
    }

    #[test]
    fn invalid_yaml_reports_path() {
        let err = parse_config("python_release: [", Path::new("bad.yml")).unwrap_err();
        assert!(matches!(err, SrcInstallError::ConfigParse { ref path, .. } if path == Path::new("bad.yml")));
    }

    #[test]
    fn empty_file_is_empty_config() {
        let config = parse_config("\n", Path::new("empty.yml")).unwrap();
        assert_eq!(config, ConfigFile::default());
    }

    #[test]
    fn no_path_is_empty_config() {
        assert_eq!(load_optional_config(None).unwrap(), ConfigFile::default());
    }
}
