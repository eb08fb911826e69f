//! External command execution and platform queries.

pub mod command;
pub mod fake;
pub mod platform;

pub use command::{CommandOutput, CommandRunner, CommandSpec, SystemRunner};
pub use fake::FakeRunner;
pub use platform::{gnu_os_name, is_elevated};
