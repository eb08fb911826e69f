//! Build orchestration: clean, extract, configure, make, make install.
//!
//! Stages run strictly in order and the first failure stops the build.
//! Command output goes to `<build dir>/build.log`; the UI only gets one
//! progress line per stage.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::config::{InstallConfig, Timeouts};
use crate::error::{Result, SrcInstallError};
use crate::shell::{CommandOutput, CommandRunner, CommandSpec};
use crate::ui::UserInterface;

/// Name of the log file inside the build directory.
pub const BUILD_LOG: &str = "build.log";

/// One step of the build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    CleanDirs,
    Extract,
    Configure,
    Make,
    MakeInstall,
}

impl Stage {
    /// Every stage in execution order.
    pub const ALL: [Stage; 5] = [
        Stage::CleanDirs,
        Stage::Extract,
        Stage::Configure,
        Stage::Make,
        Stage::MakeInstall,
    ];

    /// Progress text shown while the stage runs.
    pub fn progress_text(&self) -> &'static str {
        match self {
            Stage::CleanDirs => "Preparing directories...",
            Stage::Extract => "Extracting source...",
            Stage::Configure => "Configuring sources...",
            Stage::Make => "Compiling sources...",
            Stage::MakeInstall => "Installing...",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::CleanDirs => "clean",
            Stage::Extract => "extract",
            Stage::Configure => "configure",
            Stage::Make => "make",
            Stage::MakeInstall => "make install",
        };
        f.write_str(name)
    }
}

/// Directory an archive unpacks into: its file name without the last two
/// extensions (`Python-3.4.3.tar.xz` -> `Python-3.4.3`).
pub fn extracted_dir_name(archive: &Path) -> String {
    let name = archive
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let parts: Vec<&str> = name.split('.').collect();
    if parts.len() <= 2 {
        return parts.first().copied().unwrap_or_default().to_string();
    }
    parts[..parts.len() - 2].join(".")
}

/// Append-only log of every stage.
struct BuildLog {
    file: File,
}

impl BuildLog {
    fn open(path: &Path) -> Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self { file })
    }

    fn header(&mut self, stage: Stage, command: &str) {
        let now = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        writeln!(self.file, "==> [{}] {}: {}", now, stage, command).ok();
    }

    fn record(&mut self, output: &CommandOutput) {
        if !output.stdout.is_empty() {
            self.file.write_all(output.stdout.as_bytes()).ok();
        }
        if !output.stderr.is_empty() {
            self.file.write_all(output.stderr.as_bytes()).ok();
        }
        let status = if output.timed_out {
            format!("killed after {:?}", output.duration)
        } else {
            match output.exit_code {
                Some(code) => format!("exit {}", code),
                None => "terminated by signal".to_string(),
            }
        };
        writeln!(self.file, "<== {}", status).ok();
    }

    fn note(&mut self, text: &str) {
        writeln!(self.file, "<== {}", text).ok();
    }
}

/// Builds and installs an extracted source tree.
pub struct BuildOrchestrator<'a> {
    runner: &'a dyn CommandRunner,
    build_dir: PathBuf,
    install_dir: PathBuf,
    configure_flags: Vec<String>,
    timeouts: Timeouts,
}

impl<'a> BuildOrchestrator<'a> {
    pub fn new(runner: &'a dyn CommandRunner, config: &InstallConfig) -> Self {
        Self {
            runner,
            build_dir: config.target.build_dir.clone(),
            install_dir: config.target.install_dir.clone(),
            configure_flags: config.configure_flags.clone(),
            timeouts: config.timeouts,
        }
    }

    /// Where the build log is written.
    pub fn log_path(&self) -> PathBuf {
        self.build_dir.join(BUILD_LOG)
    }

    /// Source tree `archive` unpacks into.
    pub fn source_dir(&self, archive: &Path) -> PathBuf {
        self.build_dir.join(extracted_dir_name(archive))
    }

    /// The command a stage runs, or `None` for stages that run none.
    pub fn stage_command(&self, stage: Stage, archive: &Path) -> Option<CommandSpec> {
        let source_dir = self.source_dir(archive);
        let spec = match stage {
            Stage::CleanDirs => return None,
            Stage::Extract => CommandSpec::new("tar")
                .arg("xf")
                .arg(archive.to_string_lossy())
                .arg("-C")
                .arg(self.build_dir.to_string_lossy())
                .timeout(self.timeouts.extract),
            Stage::Configure => CommandSpec::new("./configure")
                .arg(format!("--prefix={}", self.install_dir.display()))
                .args(self.configure_flags.iter().cloned())
                .current_dir(&source_dir)
                .timeout(self.timeouts.configure),
            Stage::Make => CommandSpec::new("make")
                .current_dir(&source_dir)
                .timeout(self.timeouts.make),
            Stage::MakeInstall => CommandSpec::new("make")
                .arg("install")
                .current_dir(&source_dir)
                .timeout(self.timeouts.make_install),
        };
        Some(spec)
    }

    fn stage_error(&self, stage: Stage, archive: &Path) -> SrcInstallError {
        match stage {
            Stage::CleanDirs | Stage::Extract => SrcInstallError::Extraction {
                build_dir: self.build_dir.clone(),
            },
            Stage::Configure => SrcInstallError::Configuration {
                source_dir: self.source_dir(archive),
            },
            Stage::Make => SrcInstallError::Build {
                source_dir: self.source_dir(archive),
            },
            Stage::MakeInstall => SrcInstallError::Install {
                install_dir: self.install_dir.clone(),
            },
        }
    }

    /// Remove the build and install directories, then recreate the build
    /// directory.
    fn clean_dirs(&self) -> Result<()> {
        for dir in [&self.build_dir, &self.install_dir] {
            if dir.exists() {
                tracing::info!("removing {}", dir.display());
                std::fs::remove_dir_all(dir).map_err(|e| {
                    SrcInstallError::Other(anyhow::anyhow!(
                        "Could not empty {} directory: {}",
                        dir.display(),
                        e
                    ))
                })?;
            }
        }
        std::fs::create_dir_all(&self.build_dir)?;
        Ok(())
    }

    /// Run every stage for `archive`, returning the install directory.
    pub fn run(&self, archive: &Path, ui: &mut dyn UserInterface) -> Result<PathBuf> {
        let mut spinner = ui.start_spinner(Stage::CleanDirs.progress_text());
        if let Err(e) = self.clean_dirs() {
            spinner.finish_error("error");
            return Err(e);
        }
        spinner.finish_success("done");

        let mut log = BuildLog::open(&self.log_path())?;
        log.header(Stage::CleanDirs, "rm -rf build and install directories");
        log.note("done");

        for stage in Stage::ALL.into_iter().skip(1) {
            let Some(spec) = self.stage_command(stage, archive) else {
                continue;
            };
            ui.detail(&spec.display());
            let mut spinner = ui.start_spinner(stage.progress_text());
            log.header(stage, &spec.display());
            tracing::info!("stage {}: {}", stage, spec.display());

            let succeeded = match self.runner.run(&spec) {
                Ok(output) => {
                    log.record(&output);
                    output.success()
                }
                Err(e) => {
                    log.note(&e.to_string());
                    tracing::warn!("{} could not start: {}", stage, e);
                    false
                }
            };

            if !succeeded {
                spinner.finish_error("error");
                return Err(self.stage_error(stage, archive));
            }
            spinner.finish_success("done");
        }

        Ok(self.install_dir.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigFile, ConfigOverrides};
    use crate::distro::ReleasePaths;
    use crate::shell::FakeRunner;
    use crate::ui::MockUI;
    use std::time::Duration;
    use tempfile::TempDir;

    struct Fixture {
        _temp: TempDir,
        config: InstallConfig,
        archive: PathBuf,
    }

    fn fixture() -> Fixture {
        let temp = TempDir::new().unwrap();
        let file = ConfigFile {
            python_directory: Some(temp.path().join("opt/python34")),
            ..Default::default()
        };
        let config = InstallConfig::resolve(
            &file,
            &ConfigOverrides::default(),
            temp.path(),
            ReleasePaths::default(),
        )
        .unwrap();
        let archive = config.target.cache_dir.join("Python-3.4.3.tar.xz");
        Fixture {
            _temp: temp,
            config,
            archive,
        }
    }

    #[test]
    fn extracted_dir_drops_two_extensions() {
        assert_eq!(
            extracted_dir_name(Path::new("/cache/Python-3.4.3.tar.xz")),
            "Python-3.4.3"
        );
        assert_eq!(extracted_dir_name(Path::new("pkg-1.0.tgz")), "pkg-1");
    }

    #[test]
    fn runs_stages_in_order() {
        let fx = fixture();
        let runner = FakeRunner::new();
        let mut ui = MockUI::new();

        let installed = BuildOrchestrator::new(&runner, &fx.config)
            .run(&fx.archive, &mut ui)
            .unwrap();

        let build = fx.config.target.build_dir.display().to_string();
        let install = fx.config.target.install_dir.display().to_string();
        assert_eq!(installed, fx.config.target.install_dir);
        assert_eq!(
            runner.call_lines(),
            vec![
                format!("tar xf {} -C {}", fx.archive.display(), build),
                format!(
                    "./configure --prefix={} --disable-ipv6 --with-dbmliborder=bdb:gdbm",
                    install
                ),
                "make".to_string(),
                "make install".to_string(),
            ]
        );

        let source = fx.config.target.build_dir.join("Python-3.4.3");
        let calls = runner.calls();
        assert_eq!(calls[0].cwd, None);
        assert_eq!(calls[1].cwd.as_deref(), Some(source.as_path()));
        assert_eq!(calls[1].timeout, Some(Duration::from_secs(300)));
        assert_eq!(calls[3].cwd.as_deref(), Some(source.as_path()));
    }

    #[test]
    fn reports_each_stage_to_ui() {
        let fx = fixture();
        let runner = FakeRunner::new();
        let mut ui = MockUI::new();

        BuildOrchestrator::new(&runner, &fx.config)
            .run(&fx.archive, &mut ui)
            .unwrap();

        assert_eq!(
            ui.spinner_results(),
            vec![
                "Preparing directories...: done",
                "Extracting source...: done",
                "Configuring sources...: done",
                "Compiling sources...: done",
                "Installing...: done",
            ]
        );
        assert_eq!(ui.details().len(), 4);
    }

    #[test]
    fn wipes_previous_build_and_install() {
        let fx = fixture();
        let build = &fx.config.target.build_dir;
        let install = &fx.config.target.install_dir;
        std::fs::create_dir_all(build.join("Python-3.4.3")).unwrap();
        std::fs::write(build.join("Python-3.4.3/stale.o"), "x").unwrap();
        std::fs::create_dir_all(install.join("bin")).unwrap();

        let runner = FakeRunner::new();
        BuildOrchestrator::new(&runner, &fx.config)
            .run(&fx.archive, &mut MockUI::new())
            .unwrap();

        assert!(!build.join("Python-3.4.3/stale.o").exists());
        assert!(!install.join("bin").exists());
        assert!(build.join(BUILD_LOG).exists());
    }

    #[test]
    fn failed_configure_stops_the_build() {
        let fx = fixture();
        let runner = FakeRunner::new().on(
            "./configure",
            CommandOutput::exited(1, "checking for gcc... no\n", "configure: error: no C compiler\n"),
        );
        let mut ui = MockUI::new();

        let err = BuildOrchestrator::new(&runner, &fx.config)
            .run(&fx.archive, &mut ui)
            .unwrap_err();

        assert!(matches!(err, SrcInstallError::Configuration { .. }));
        assert_eq!(runner.count("make"), 0);
        assert_eq!(
            ui.spinner_results().last().map(String::as_str),
            Some("Configuring sources...: error")
        );

        let log = std::fs::read_to_string(fx.config.target.build_dir.join(BUILD_LOG)).unwrap();
        assert!(log.contains("configure: ./configure --prefix="));
        assert!(log.contains("no C compiler"));
        assert!(log.contains("<== exit 1"));
    }

    #[test]
    fn failed_extract_is_extraction_error() {
        let fx = fixture();
        let runner = FakeRunner::new().on("tar", CommandOutput::exited(2, "", "tar: bad"));

        let err = BuildOrchestrator::new(&runner, &fx.config)
            .run(&fx.archive, &mut MockUI::new())
            .unwrap_err();

        assert!(matches!(err, SrcInstallError::Extraction { .. }));
        assert_eq!(runner.calls().len(), 1);
    }

    #[test]
    fn make_timeout_is_build_error() {
        let fx = fixture();
        let runner = FakeRunner::new().on(
            "make",
            CommandOutput::killed_by_timeout(Duration::from_secs(300)),
        );

        let err = BuildOrchestrator::new(&runner, &fx.config)
            .run(&fx.archive, &mut MockUI::new())
            .unwrap_err();

        assert!(matches!(err, SrcInstallError::Build { .. }));
        assert_eq!(runner.count("make install"), 0);
        let log = std::fs::read_to_string(fx.config.target.build_dir.join(BUILD_LOG)).unwrap();
        assert!(log.contains("killed after"));
    }

    #[test]
    fn failed_make_install_is_install_error() {
        let fx = fixture();
        let runner = FakeRunner::new().on("make install", CommandOutput::exited(2, "", ""));

        let err = BuildOrchestrator::new(&runner, &fx.config)
            .run(&fx.archive, &mut MockUI::new())
            .unwrap_err();

        assert!(matches!(err, SrcInstallError::Install { .. }));
    }
}
