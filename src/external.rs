//! Running programs that are not builtins.
//!
//! The shell forks, the child replaces its image with the program found on
//! `PATH`, and the parent blocks until the child exits or is killed. While the
//! child runs the terminal is in canonical mode, so Ctrl-C raises SIGINT for
//! the whole foreground group; the shell ignores it for that period and the
//! child gets the shell's own dispositions back before exec. SIGPIPE, which
//! the Rust runtime ignores, is reset to its default in the child.

use crate::command::{ExitCode, Launcher};
use crate::error::{Result, ShellError};
use nix::errno::Errno;
use nix::sys::signal::{self, SigHandler, Signal};
use nix::sys::wait::{WaitPidFlag, WaitStatus, waitpid};
use nix::unistd::{self, ForkResult, Pid, execvp, fork};
use std::ffi::CString;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// Child exit status when the program does not exist.
const NOT_FOUND: i32 = 127;
/// Child exit status when the program exists but cannot be run.
const NOT_EXECUTABLE: i32 = 126;

/// [`Launcher`] backed by `fork`, `execvp` and `waitpid`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessLauncher;

impl Launcher for ProcessLauncher {
    fn launch(&mut self, argv: &[String]) -> Result<ExitCode> {
        let ignored = IgnoredSignals::install()?;
        // SAFETY: the child only builds its argument vector, resets signal
        // dispositions and then either execs or calls `_exit`.
        match unsafe { fork() }.map_err(ShellError::Fork)? {
            ForkResult::Child => {
                ignored.restore();
                exec_child(argv)
            }
            ForkResult::Parent { child } => {
                debug!(pid = child.as_raw(), program = %argv[0], "spawned child");
                wait_for_exit(child)
            }
        }
    }
}

/// Replaces the child's image with `argv[0]`. Never returns into shell code.
fn exec_child(argv: &[String]) -> ! {
    // SAFETY: the default disposition installs no handler code.
    let _ = unsafe { signal::signal(Signal::SIGPIPE, SigHandler::SigDfl) };

    let errno = match argv
        .iter()
        .map(|arg| CString::new(arg.as_bytes()))
        .collect::<std::result::Result<Vec<_>, _>>()
    {
        Ok(args) => match execvp(&args[0], &args) {
            Ok(never) => match never {},
            Err(errno) => errno,
        },
        Err(_) => Errno::EINVAL,
    };

    // Raw write: the stderr lock may be held by a thread that did not survive the fork.
    let message = format!("tinysh: {}: {}\n", argv[0], describe(errno));
    let _ = unistd::write(std::io::stderr(), message.as_bytes());
    let code = if errno == Errno::ENOENT {
        NOT_FOUND
    } else {
        NOT_EXECUTABLE
    };
    // SAFETY: skips atexit handlers and buffered stdio inherited from the shell.
    unsafe { nix::libc::_exit(code) }
}

fn describe(errno: Errno) -> &'static str {
    match errno {
        Errno::ENOENT => "command not found",
        other => other.desc(),
    }
}

/// Blocks until `child` exits or dies from a signal. Stops and continues are
/// observed but keep the shell waiting.
fn wait_for_exit(child: Pid) -> Result<ExitCode> {
    loop {
        match waitpid(child, Some(WaitPidFlag::WUNTRACED)) {
            Ok(WaitStatus::Exited(_, code)) => return Ok(code),
            Ok(WaitStatus::Signaled(_, signal, _)) => return Ok(128 + signal as i32),
            Ok(status) => debug!(?status, "child changed state"),
            Err(Errno::EINTR) => {}
            Err(e) => return Err(ShellError::Wait(e)),
        }
    }
}

/// Held while SIGINT and SIGQUIT are ignored, so that overlapping launches
/// cannot save each other's dispositions.
static LAUNCH: Mutex<()> = Mutex::new(());

/// Ignores SIGINT and SIGQUIT in the shell until dropped.
struct IgnoredSignals {
    interrupt: SigHandler,
    quit: SigHandler,
    _launch: MutexGuard<'static, ()>,
}

impl IgnoredSignals {
    fn install() -> Result<Self> {
        let launch = LAUNCH.lock().unwrap_or_else(PoisonError::into_inner);
        // SAFETY: SigIgn installs no handler code.
        let interrupt = unsafe { signal::signal(Signal::SIGINT, SigHandler::SigIgn) }
            .map_err(ShellError::Signal)?;
        // SAFETY: as above; on failure the previous SIGINT disposition is put back.
        let quit = match unsafe { signal::signal(Signal::SIGQUIT, SigHandler::SigIgn) } {
            Ok(quit) => quit,
            Err(e) => {
                let _ = unsafe { signal::signal(Signal::SIGINT, interrupt) };
                return Err(ShellError::Signal(e));
            }
        };
        Ok(Self {
            interrupt,
            quit,
            _launch: launch,
        })
    }

    /// Reinstalls the dispositions that were in effect before `install`.
    fn restore(&self) {
        // SAFETY: the saved handlers were installed by this process before.
        unsafe {
            let _ = signal::signal(Signal::SIGINT, self.interrupt);
            let _ = signal::signal(Signal::SIGQUIT, self.quit);
        }
    }
}

impl Drop for IgnoredSignals {
    fn drop(&mut self) {
        self.restore();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    #[cfg(unix)]
    fn test_exit_codes_are_observed() {
        let mut launcher = ProcessLauncher;
        assert_eq!(launcher.launch(&argv(&["true"])).unwrap(), 0);
        assert_eq!(launcher.launch(&argv(&["false"])).unwrap(), 1);
        assert_eq!(launcher.launch(&argv(&["sh", "-c", "exit 7"])).unwrap(), 7);
    }

    #[test]
    #[cfg(unix)]
    fn test_unknown_program_exits_127() {
        let mut launcher = ProcessLauncher;
        let name = format!("no-such-program-{}", std::process::id());
        assert_eq!(launcher.launch(&argv(&[name.as_str()])).unwrap(), NOT_FOUND);
    }

    #[test]
    #[cfg(unix)]
    fn test_non_executable_file_exits_126() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("plain.txt");
        std::fs::write(&script, b"not a program\n").unwrap();

        let mut launcher = ProcessLauncher;
        let path = script.to_string_lossy().to_string();
        assert_eq!(launcher.launch(&argv(&[path.as_str()])).unwrap(), NOT_EXECUTABLE);
    }

    #[test]
    #[cfg(unix)]
    fn test_killed_child_reports_signal() {
        let mut launcher = ProcessLauncher;
        let code = launcher
            .launch(&argv(&["sh", "-c", "kill -TERM $$"]))
            .unwrap();
        assert_eq!(code, 128 + Signal::SIGTERM as i32);
    }

    /// Exit status 0 when none of the signals in `mask` is ignored by the
    /// program, 1 otherwise.
    #[cfg(target_os = "linux")]
    fn ignored_in_child(mask: u64) -> ExitCode {
        let script = format!(
            "m=$(sed -n 's/^SigIgn:[[:space:]]*//p' /proc/self/status); [ $((0x$m & {})) -eq 0 ]",
            mask
        );
        ProcessLauncher
            .launch(&argv(&["sh", "-c", script.as_str()]))
            .unwrap()
    }

    #[test]
    #[cfg(target_os = "linux")]
    fn test_child_gets_default_sigpipe() {
        let pipe_bit = 1u64 << (Signal::SIGPIPE as u64 - 1);
        assert_eq!(ignored_in_child(pipe_bit), 0);
    }

    #[test]
    #[cfg(target_os = "linux")]
    fn test_child_gets_interrupt_disposition_from_before_launch() {
        let bit = |signal: Signal| 1u64 << (signal as u64 - 1);
        assert_eq!(ignored_in_child(bit(Signal::SIGINT) | bit(Signal::SIGQUIT)), 0);
    }

    #[test]
    fn test_interior_nul_is_rejected_in_child() {
        let mut launcher = ProcessLauncher;
        assert_eq!(
            launcher.launch(&argv(&["echo", "a\0b"])).unwrap(),
            NOT_EXECUTABLE
        );
    }
}
