//! External command execution.
//!
//! Every package-manager probe, archive extraction and build step goes
//! through the [`CommandRunner`] trait so orchestration code can be
//! exercised with a fake runner instead of real tools.

use crate::error::{Result, SrcInstallError};
use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::{Duration, Instant};

/// Polling interval while waiting on a child with a timeout.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// How long output is still collected after the deadline.
const DRAIN_GRACE: Duration = Duration::from_millis(500);

/// A command to run: program, arguments, working directory, environment
/// overrides and a timeout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    /// Program to execute (looked up on PATH unless it contains a slash).
    pub program: String,

    /// Arguments passed to the program.
    pub args: Vec<String>,

    /// Working directory.
    pub cwd: Option<PathBuf>,

    /// Environment variables (merged with system env).
    pub env: HashMap<String, String>,

    /// Upper bound on run time. The child is killed when exceeded.
    pub timeout: Option<Duration>,
}

impl CommandSpec {
    /// Create a spec for `program` with no arguments.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            env: HashMap::new(),
            timeout: None,
        }
    }

    /// Append one argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Run in `dir`.
    pub fn current_dir(mut self, dir: &Path) -> Self {
        self.cwd = Some(dir.to_path_buf());
        self
    }

    /// Set an environment variable for the child.
    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.env.insert(key.to_string(), value.to_string());
        self
    }

    /// Bound the run time.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// The command line as a single display string.
    pub fn display(&self) -> String {
        if self.args.is_empty() {
            self.program.clone()
        } else {
            format!("{} {}", self.program, self.args.join(" "))
        }
    }
}

/// Result of running a command.
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    /// Exit code (None if killed by signal or timeout).
    pub exit_code: Option<i32>,

    /// Standard output.
    pub stdout: String,

    /// Standard error.
    pub stderr: String,

    /// Whether the child was killed because the timeout expired.
    pub timed_out: bool,

    /// Execution duration.
    pub duration: Duration,
}

impl CommandOutput {
    /// Create a result for a child that exited with `code`.
    pub fn exited(code: i32, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            exit_code: Some(code),
            stdout: stdout.into(),
            stderr: stderr.into(),
            ..Default::default()
        }
    }

    /// Create a result for a child killed after its timeout.
    pub fn killed_by_timeout(duration: Duration) -> Self {
        Self {
            timed_out: true,
            duration,
            ..Default::default()
        }
    }

    /// Whether command succeeded (exit code 0 and not timed out).
    pub fn success(&self) -> bool {
        !self.timed_out && self.exit_code == Some(0)
    }
}

/// Capability to run external commands.
pub trait CommandRunner {
    /// Run a command to completion (or timeout), capturing its output.
    ///
    /// A non-zero exit is not an error here; callers inspect
    /// [`CommandOutput::success`]. `Err` means the program could not be
    /// started at all.
    fn run(&self, spec: &CommandSpec) -> Result<CommandOutput>;
}

/// Runs commands as real child processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl SystemRunner {
    /// Create a new system runner.
    pub fn new() -> Self {
        Self
    }
}

impl CommandRunner for SystemRunner {
    fn run(&self, spec: &CommandSpec) -> Result<CommandOutput> {
        let start = Instant::now();
        tracing::debug!("running `{}`", spec.display());

        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args);

        if let Some(cwd) = &spec.cwd {
            cmd.current_dir(cwd);
        }

        for (key, value) in &spec.env {
            cmd.env(key, value);
        }

        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        // The child leads its own process group so a timeout can take down
        // everything it forked.
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            cmd.process_group(0);
        }

        let mut child = cmd.spawn().map_err(|e| {
            SrcInstallError::Other(anyhow::anyhow!(
                "failed to start `{}`: {}",
                spec.display(),
                e
            ))
        })?;

        // Pipes are drained on helper threads while the child runs.
        let stdout_rx = child.stdout.take().map(drain);
        let stderr_rx = child.stderr.take().map(drain);

        let exit_code = match spec.timeout {
            Some(timeout) => wait_with_timeout(&mut child, start, timeout)?,
            None => Some(child.wait()?.code()),
        };

        // A descendant that escaped the group may still hold the pipes open.
        let deadline = spec.timeout.map(|timeout| start + timeout + DRAIN_GRACE);
        let stdout = collect(stdout_rx, deadline);
        let stderr = collect(stderr_rx, deadline);
        let duration = start.elapsed();

        match exit_code {
            Some(code) => {
                tracing::debug!(
                    "`{}` finished with {:?} in {:?}",
                    spec.program,
                    code,
                    duration
                );
                Ok(CommandOutput {
                    exit_code: code,
                    stdout,
                    stderr,
                    timed_out: false,
                    duration,
                })
            }
            None => {
                tracing::warn!("`{}` killed after {:?}", spec.display(), duration);
                Ok(CommandOutput {
                    stdout,
                    stderr,
                    ..CommandOutput::killed_by_timeout(duration)
                })
            }
        }
    }
}

/// Wait for `child`, killing it once `timeout` has elapsed since `start`.
///
/// Returns `Some(exit code)` when the child exited on its own and `None`
/// when it was killed.
fn wait_with_timeout(
    child: &mut Child,
    start: Instant,
    timeout: Duration,
) -> Result<Option<Option<i32>>> {
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status.code()));
        }
        if start.elapsed() >= timeout {
            kill_process_group(child);
            let _ = child.wait();
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

/// Kill `child` and every process in its group.
fn kill_process_group(child: &mut Child) {
    #[cfg(unix)]
    {
        if let Ok(pgid) = libc::pid_t::try_from(child.id()) {
            // SAFETY: killpg only sends a signal; the group was created for
            // this child by `process_group(0)`.
            unsafe {
                libc::killpg(pgid, libc::SIGKILL);
            }
        }
    }
    let _ = child.kill();
}

fn drain<R: Read + Send + 'static>(mut reader: R) -> Receiver<String> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = reader.read_to_end(&mut buf);
        let _ = tx.send(String::from_utf8_lossy(&buf).to_string());
    });
    rx
}

/// Output read by a drain thread, waiting no later than `deadline`.
fn collect(rx: Option<Receiver<String>>, deadline: Option<Instant>) -> String {
    let Some(rx) = rx else {
        return String::new();
    };
    match deadline {
        Some(deadline) => rx
            .recv_timeout(deadline.saturating_duration_since(Instant::now()))
            .unwrap_or_default(),
        None => rx.recv().unwrap_or_default(),
    }
}
