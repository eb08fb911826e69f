//! Scripted command runner for testing.
//!
//! `FakeRunner` implements [`CommandRunner`] without spawning anything. It
//! records every [`CommandSpec`] it receives and answers from rules keyed
//! by a command-line prefix.
//!
//! # Example
//!
//! ```
//! use srcinstall::shell::{CommandOutput, CommandRunner, CommandSpec, FakeRunner};
//!
//! let runner = FakeRunner::new().on("dpkg -s make", CommandOutput::exited(1, "", ""));
//!
//! let out = runner.run(&CommandSpec::new("dpkg").args(["-s", "make"])).unwrap();
//! assert!(!out.success());
//! assert_eq!(runner.count("dpkg"), 1);
//! ```

use std::cell::RefCell;
use std::collections::VecDeque;

use crate::error::{Result, SrcInstallError};

use super::command::{CommandOutput, CommandRunner, CommandSpec};

#[derive(Debug)]
enum Reply {
    Output(VecDeque<CommandOutput>),
    SpawnError,
}

#[derive(Debug)]
struct Rule {
    prefix: String,
    reply: Reply,
}

/// Command runner that replays scripted results.
///
/// Commands with no matching rule succeed with empty output. When several
/// rules match, the one registered last wins. A sequence rule yields its
/// outputs in order and then keeps repeating the final one.
#[derive(Debug, Default)]
pub struct FakeRunner {
    rules: RefCell<Vec<Rule>>,
    calls: RefCell<Vec<CommandSpec>>,
}

impl FakeRunner {
    /// Create a runner where every command succeeds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer commands starting with `prefix` with `output`.
    pub fn on(self, prefix: &str, output: CommandOutput) -> Self {
        self.on_sequence(prefix, vec![output])
    }

    /// Answer commands starting with `prefix` with `outputs`, in order.
    pub fn on_sequence(self, prefix: &str, outputs: Vec<CommandOutput>) -> Self {
        self.rules.borrow_mut().push(Rule {
            prefix: prefix.to_string(),
            reply: Reply::Output(outputs.into()),
        });
        self
    }

    /// Make commands starting with `prefix` fail to start.
    pub fn fail_to_start(self, prefix: &str) -> Self {
        self.rules.borrow_mut().push(Rule {
            prefix: prefix.to_string(),
            reply: Reply::SpawnError,
        });
        self
    }

    /// Every command received, in order.
    pub fn calls(&self) -> Vec<CommandSpec> {
        self.calls.borrow().clone()
    }

    /// Every command received, rendered as command lines.
    pub fn call_lines(&self) -> Vec<String> {
        self.calls.borrow().iter().map(CommandSpec::display).collect()
    }

    /// Number of received commands whose command line starts with `prefix`.
    pub fn count(&self, prefix: &str) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|spec| spec.display().starts_with(prefix))
            .count()
    }
}

impl CommandRunner for FakeRunner {
    fn run(&self, spec: &CommandSpec) -> Result<CommandOutput> {
        self.calls.borrow_mut().push(spec.clone());
        let line = spec.display();

        let mut rules = self.rules.borrow_mut();
        let Some(rule) = rules
            .iter_mut()
            .rev()
            .find(|rule| line.starts_with(&rule.prefix))
        else {
            return Ok(CommandOutput::exited(0, "", ""));
        };

        match &mut rule.reply {
            Reply::SpawnError => Err(SrcInstallError::Other(anyhow::anyhow!(
                "failed to start `{}`",
                line
            ))),
            Reply::Output(queue) => {
                let output = if queue.len() > 1 {
                    queue.pop_front()
                } else {
                    queue.front().cloned()
                };
                Ok(output.unwrap_or_default())
            }
        }
    }
}
