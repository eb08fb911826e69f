//! Install command implementation.
//!
//! Running `srcinstall` without `--show-distribution` performs a full
//! install. Every stage is a hard gate:
//!
//! 1. privilege check
//! 2. home directory check
//! 3. configuration
//! 4. source download and checksum
//! 5. distribution detection and dependency lookup
//! 6. native package install
//! 7. extract, configure, make, make install

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::build::BuildOrchestrator;
use crate::config::{load_optional_config, ConfigOverrides, InstallConfig};
use crate::deps::DependencyTable;
use crate::distro::{DistributionIdentifier, ReleasePaths};
use crate::error::{Result, SrcInstallError};
use crate::fetch::{Downloader, HttpDownloader, SourceFetcher};
use crate::packages::PackageInstaller;
use crate::shell::{is_elevated, CommandRunner};
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult};

/// Connect timeout for the archive download.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// The install command implementation.
pub struct InstallCommand<'a> {
    runner: &'a dyn CommandRunner,
    config_path: Option<PathBuf>,
    overrides: ConfigOverrides,
    release_files: ReleasePaths,
    elevated: bool,
    home: Option<PathBuf>,
}

impl<'a> InstallCommand<'a> {
    /// Create an install command for the current user and privileges.
    pub fn new(
        runner: &'a dyn CommandRunner,
        config_path: Option<PathBuf>,
        overrides: ConfigOverrides,
        release_files: ReleasePaths,
    ) -> Self {
        Self {
            runner,
            config_path,
            overrides,
            release_files,
            elevated: is_elevated(),
            home: dirs::home_dir(),
        }
    }

    /// Override the privilege check result.
    pub fn with_elevated(mut self, elevated: bool) -> Self {
        self.elevated = elevated;
        self
    }

    /// Override the home directory.
    pub fn with_home(mut self, home: Option<PathBuf>) -> Self {
        self.home = home;
        self
    }

    fn check_home(&self) -> Result<&Path> {
        match &self.home {
            Some(home) if home.is_dir() => Ok(home),
            Some(home) => Err(SrcInstallError::HomeDirectoryMissing { path: home.clone() }),
            None => Err(SrcInstallError::HomeDirectoryMissing {
                path: PathBuf::from("~"),
            }),
        }
    }

    /// Check privileges and the home directory, then resolve configuration.
    pub fn prepare(&self) -> Result<InstallConfig> {
        if !self.elevated {
            return Err(SrcInstallError::Privilege);
        }
        let home = self.check_home()?;
        let file = load_optional_config(self.config_path.as_deref())?;
        InstallConfig::resolve(&file, &self.overrides, home, self.release_files.clone())
    }
}

impl Command for InstallCommand<'_> {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let config = self.prepare()?;

        let downloader = HttpDownloader::with_timeouts(CONNECT_TIMEOUT, config.timeouts.download)?;
        let installed = InstallPipeline::new(&config, self.runner, &downloader).run(ui)?;

        ui.success(&format!(
            "Python {} installed in {}",
            config.release,
            installed.display()
        ));
        Ok(CommandResult::success())
    }
}

/// Download, dependency and build stages for one resolved configuration.
pub struct InstallPipeline<'a> {
    config: &'a InstallConfig,
    runner: &'a dyn CommandRunner,
    downloader: &'a dyn Downloader,
    table: DependencyTable,
}

impl<'a> InstallPipeline<'a> {
    pub fn new(
        config: &'a InstallConfig,
        runner: &'a dyn CommandRunner,
        downloader: &'a dyn Downloader,
    ) -> Self {
        Self {
            config,
            runner,
            downloader,
            table: DependencyTable::default(),
        }
    }

    /// Use a different dependency table.
    pub fn with_table(mut self, table: DependencyTable) -> Self {
        self.table = table;
        self
    }

    /// Run every stage, returning the install directory.
    pub fn run(&self, ui: &mut dyn UserInterface) -> Result<PathBuf> {
        let target = &self.config.target;
        ui.show_header(&format!("Python {}", self.config.release));

        let mut spinner = ui.start_spinner("Downloading sources...");
        let archive = SourceFetcher::new(self.downloader)
            .with_max_attempts(self.config.download_attempts)
            .ensure_downloaded(&target.source_url, &target.checksum, &target.cache_dir);
        let archive = match archive {
            Ok(path) => {
                spinner.finish_success("done");
                path
            }
            Err(e) => {
                spinner.finish_error("error");
                return Err(e);
            }
        };
        ui.detail(&archive.display().to_string());

        let mut spinner = ui.start_spinner("Checking distribution...");
        let info = DistributionIdentifier::new(self.runner)
            .with_paths(self.config.release_files.clone())
            .identify();
        let release = info.release.as_deref().unwrap_or_default();
        let packages = match self.table.resolve(&info.vendor_id, release) {
            Ok(packages) => {
                spinner.finish_success("done");
                packages
            }
            Err(e) => {
                spinner.finish_error("error");
                return Err(e);
            }
        };
        ui.detail(&format!("{} {}", info.vendor_id, release));

        let mut spinner = ui.start_spinner("Installing dependencies...");
        let installed = PackageInstaller::new(self.runner)
            .with_probe_timeout(self.config.timeouts.probe)
            .with_install_timeout(self.config.timeouts.install)
            .ensure_installed(&packages);
        match installed {
            Ok(installed) => {
                spinner.finish_success("done");
                for package in installed {
                    ui.detail(&format!("installed {}", package));
                }
            }
            Err(e) => {
                spinner.finish_error("error");
                return Err(e);
            }
        }

        BuildOrchestrator::new(self.runner, self.config).run(&archive, ui)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigFile;
    use crate::shell::{CommandOutput, FakeRunner};
    use crate::ui::MockUI;
    use md5::{Digest, Md5};
    use std::cell::Cell;
    use tempfile::TempDir;

    const ARCHIVE_BODY: &str = "not really an xz archive";

    struct StaticDownloader {
        body: &'static str,
        calls: Cell<u32>,
    }

    impl StaticDownloader {
        fn new(body: &'static str) -> Self {
            Self {
                body,
                calls: Cell::new(0),
            }
        }
    }

    impl Downloader for StaticDownloader {
        fn download(&self, _url: &str, dest: &Path) -> Result<u64> {
            self.calls.set(self.calls.get() + 1);
            std::fs::write(dest, self.body)?;
            Ok(self.body.len() as u64)
        }
    }

    struct Fixture {
        temp: TempDir,
        config: InstallConfig,
    }

    fn fixture(lsb: &str) -> Fixture {
        let temp = TempDir::new().unwrap();
        let lsb_path = temp.path().join("lsb-release");
        std::fs::write(&lsb_path, lsb).unwrap();
        let release_files = ReleasePaths {
            lsb_release: lsb_path,
            dpkg_origins: temp.path().join("origins-default"),
            debian_version: temp.path().join("debian_version"),
        };
        let overrides = ConfigOverrides {
            python_directory: Some(temp.path().join("opt/python34")),
            checksum: Some(hex::encode(Md5::digest(ARCHIVE_BODY.as_bytes()))),
            ..Default::default()
        };
        let config =
            InstallConfig::resolve(&ConfigFile::default(), &overrides, temp.path(), release_files)
                .unwrap();
        Fixture { temp, config }
    }

    const WHEEZY: &str = "DISTRIB_ID=Debian\nDISTRIB_RELEASE=7.8\nDISTRIB_CODENAME=wheezy\nDISTRIB_DESCRIPTION=\"Debian GNU/Linux 7.8 (wheezy)\"\n";

    #[test]
    fn installs_missing_packages_then_builds() {
        let fx = fixture(WHEEZY);
        let runner = FakeRunner::new().on_sequence(
            "dpkg -s libgdbm3",
            vec![
                CommandOutput::exited(1, "", "package 'libgdbm3' is not installed"),
                CommandOutput::exited(0, "Status: install ok installed", ""),
            ],
        );
        let downloader = StaticDownloader::new(ARCHIVE_BODY);
        let mut ui = MockUI::new();

        let installed = InstallPipeline::new(&fx.config, &runner, &downloader)
            .run(&mut ui)
            .unwrap();

        assert_eq!(installed, fx.temp.path().join("opt/python34"));
        assert_eq!(downloader.calls.get(), 1);
        assert_eq!(runner.count("apt-get install -y libgdbm3"), 1);
        assert_eq!(runner.count("apt-get"), 1);
        assert_eq!(runner.count("make install"), 1);
        assert!(ui.details().iter().any(|d| d == "installed libgdbm3"));
        assert_eq!(ui.headers(), ["Python 3.4.3"]);
    }

    #[test]
    fn cached_archive_skips_download() {
        let fx = fixture(WHEEZY);
        std::fs::create_dir_all(&fx.config.target.cache_dir).unwrap();
        std::fs::write(
            fx.config.target.cache_dir.join("Python-3.4.3.tar.xz"),
            ARCHIVE_BODY,
        )
        .unwrap();
        let runner = FakeRunner::new();
        let downloader = StaticDownloader::new(ARCHIVE_BODY);

        InstallPipeline::new(&fx.config, &runner, &downloader)
            .run(&mut MockUI::new())
            .unwrap();

        assert_eq!(downloader.calls.get(), 0);
    }

    #[test]
    fn checksum_failure_stops_before_any_command() {
        let fx = fixture(WHEEZY);
        let runner = FakeRunner::new();
        let downloader = StaticDownloader::new("tampered");
        let mut ui = MockUI::new();

        let err = InstallPipeline::new(&fx.config, &runner, &downloader)
            .run(&mut ui)
            .unwrap_err();

        assert!(matches!(
            err,
            SrcInstallError::DownloadVerification { attempts: 3, .. }
        ));
        assert!(runner.calls().is_empty());
        assert_eq!(
            ui.spinner_results(),
            vec!["Downloading sources...: error"]
        );
    }

    #[test]
    fn unsupported_distribution_stops_before_packages() {
        let fx = fixture(
            "DISTRIB_ID=Fedora\nDISTRIB_RELEASE=21\nDISTRIB_CODENAME=twenty-one\nDISTRIB_DESCRIPTION=\"Fedora 21\"\n",
        );
        let runner = FakeRunner::new();
        let downloader = StaticDownloader::new(ARCHIVE_BODY);

        let err = InstallPipeline::new(&fx.config, &runner, &downloader)
            .run(&mut MockUI::new())
            .unwrap_err();

        assert!(matches!(
            err,
            SrcInstallError::UnsupportedDistribution { ref vendor } if vendor == "Fedora"
        ));
        assert_eq!(runner.count("dpkg"), 0);
        assert_eq!(runner.count("tar"), 0);
    }

    #[test]
    fn package_failure_stops_before_build() {
        let fx = fixture(WHEEZY);
        let runner = FakeRunner::new()
            .on("dpkg -s openssl", CommandOutput::exited(1, "", ""))
            .on("apt-get install -y openssl", CommandOutput::exited(100, "", "E: broken"));
        let downloader = StaticDownloader::new(ARCHIVE_BODY);

        let err = InstallPipeline::new(&fx.config, &runner, &downloader)
            .run(&mut MockUI::new())
            .unwrap_err();

        assert!(matches!(
            err,
            SrcInstallError::PackageInstall { ref package } if package == "openssl"
        ));
        assert_eq!(runner.count("tar"), 0);
    }

    #[test]
    fn empty_dependency_list_skips_package_manager() {
        const NOTHING_NEEDED: &[(&str, &str, &[&str])] = &[("Debian", "7.8", &[])];
        let fx = fixture(WHEEZY);
        let runner = FakeRunner::new();
        let downloader = StaticDownloader::new(ARCHIVE_BODY);

        InstallPipeline::new(&fx.config, &runner, &downloader)
            .with_table(DependencyTable::new(NOTHING_NEEDED))
            .run(&mut MockUI::new())
            .unwrap();

        assert_eq!(runner.count("dpkg"), 0);
        assert_eq!(runner.count("apt-get"), 0);
        assert_eq!(runner.count("make install"), 1);
    }

    #[test]
    fn non_root_is_rejected_first() {
        let runner = FakeRunner::new();
        let cmd = InstallCommand::new(
            &runner,
            Some(PathBuf::from("/nonexistent/srcinstall.yml")),
            ConfigOverrides::default(),
            ReleasePaths::default(),
        )
        .with_elevated(false)
        .with_home(None);

        let err = cmd.execute(&mut MockUI::new()).unwrap_err();

        assert!(matches!(err, SrcInstallError::Privilege));
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn missing_home_is_rejected() {
        let runner = FakeRunner::new();
        let cmd = InstallCommand::new(
            &runner,
            None,
            ConfigOverrides::default(),
            ReleasePaths::default(),
        )
        .with_elevated(true)
        .with_home(Some(PathBuf::from("/nonexistent/home/builder")));

        let err = cmd.prepare().unwrap_err();

        assert!(matches!(
            err,
            SrcInstallError::HomeDirectoryMissing { ref path } if path == Path::new("/nonexistent/home/builder")
        ));
    }

    #[test]
    fn prepare_places_dirs_under_home() {
        let temp = TempDir::new().unwrap();
        let runner = FakeRunner::new();
        let cmd = InstallCommand::new(
            &runner,
            None,
            ConfigOverrides::default(),
            ReleasePaths::default(),
        )
        .with_elevated(true)
        .with_home(Some(temp.path().to_path_buf()));

        let config = cmd.prepare().unwrap();

        assert_eq!(config.target.cache_dir, temp.path().join(".python34"));
        assert_eq!(config.target.build_dir, temp.path().join(".python34-build"));
        assert_eq!(config.target.install_dir, Path::new("/opt/python34"));
    }
}
