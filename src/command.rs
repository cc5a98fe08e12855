use crate::env::Environment;
use crate::error::Result;
use std::io::Write;

/// Conventional process exit code: 0 for success, anything else for failure.
pub type ExitCode = i32;

/// What the shell loop does after a command has run.
///
/// A failed command still yields [`Flow::Continue`]; failures are reported on
/// standard error, never turned into loop control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

/// Object-safe trait for a command ready to run inside the shell process.
pub trait ExecutableCommand {
    /// Runs the command. Errors are reported on `stderr` by the command
    /// itself, so only the loop decision comes back.
    fn execute(
        self: Box<Self>,
        stdout: &mut dyn Write,
        stderr: &mut dyn Write,
        env: &mut Environment,
    ) -> Flow;
}

/// Creates a runnable command from the arguments that follow its name.
pub trait CommandFactory {
    /// Name the command is invoked by. Matching is exact and case-sensitive.
    fn name(&self) -> &'static str;

    fn create(&self, args: &[&str]) -> Box<dyn ExecutableCommand>;
}

/// Runs a program outside the shell process and waits for it.
pub trait Launcher {
    /// Runs `argv[0]` with `argv` as its argument vector. `argv` is never
    /// empty. Returns the exit code observed for the child.
    fn launch(&mut self, argv: &[String]) -> Result<ExitCode>;
}
