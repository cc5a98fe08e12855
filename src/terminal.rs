//! Switching the controlling terminal between canonical and raw mode.
//!
//! The attributes in effect when the controller is created are captured once
//! and kept for the lifetime of the controller. Raw mode is only ever entered
//! through [`TerminalController::enable_raw_mode`], whose guard reapplies the
//! captured attributes when it goes out of scope.

use crate::error::{Result, ShellError};
use nix::sys::termios::{
    self, ControlFlags, InputFlags, LocalFlags, OutputFlags, SetArg, SpecialCharacterIndices,
    Termios,
};
use std::os::fd::{AsFd, OwnedFd};
use std::sync::Mutex;
use tracing::{debug, warn};

/// Owner of the terminal's mode attributes.
pub struct TerminalController {
    fd: OwnedFd,
    snapshot: Termios,
    raw: Termios,
}

impl TerminalController {
    /// Creates a controller for the terminal behind standard input.
    ///
    /// Fails with [`ShellError::Terminal`] when standard input is not a terminal.
    pub fn from_stdin() -> Result<Self> {
        let fd = std::io::stdin().as_fd().try_clone_to_owned()?;
        Self::new(fd)
    }

    /// Creates a controller for the terminal behind `fd`, capturing its current
    /// attributes as the mode to restore.
    pub fn new(fd: OwnedFd) -> Result<Self> {
        let snapshot = termios::tcgetattr(&fd).map_err(ShellError::Terminal)?;
        let raw = raw_attributes(&snapshot);
        Ok(Self { fd, snapshot, raw })
    }

    /// Puts the terminal into raw mode until the returned guard is dropped.
    ///
    /// Pending input is kept, so keys typed while a command was running are
    /// read once the editor starts.
    pub fn enable_raw_mode(&self) -> Result<RawModeGuard<'_>> {
        termios::tcsetattr(&self.fd, SetArg::TCSADRAIN, &self.raw).map_err(ShellError::Terminal)?;
        Ok(RawModeGuard { terminal: self })
    }

    /// Reapplies the captured attributes. Calling it repeatedly is harmless.
    pub fn disable_raw_mode(&self) -> Result<()> {
        termios::tcsetattr(&self.fd, SetArg::TCSADRAIN, &self.snapshot)
            .map_err(ShellError::Terminal)
    }

    /// Installs a panic hook that restores the captured attributes before the
    /// previous hook prints the panic message.
    pub fn restore_on_panic(&self) -> Result<()> {
        let fd = self.fd.try_clone()?;
        let snapshot = Mutex::new(self.snapshot.clone());
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            if let Ok(saved) = snapshot.lock() {
                let _ = termios::tcsetattr(&fd, SetArg::TCSANOW, &*saved);
            }
            previous(info);
        }));
        Ok(())
    }
}

/// Scoped raw mode; restores the captured attributes on drop.
#[must_use = "raw mode ends as soon as the guard is dropped"]
pub struct RawModeGuard<'a> {
    terminal: &'a TerminalController,
}

impl Drop for RawModeGuard<'_> {
    fn drop(&mut self) {
        match self.terminal.disable_raw_mode() {
            Ok(()) => debug!("terminal restored to canonical mode"),
            Err(e) => warn!("failed to restore terminal: {}", e),
        }
    }
}

/// Derives raw attributes from `original`: no echo, no line buffering, no
/// signal keys and no output post-processing. CR to NL translation on input
/// stays enabled so the return key arrives as `\n`.
fn raw_attributes(original: &Termios) -> Termios {
    let mut raw = original.clone();
    raw.local_flags
        .remove(LocalFlags::ECHO | LocalFlags::ICANON | LocalFlags::ISIG | LocalFlags::IEXTEN);
    raw.input_flags
        .remove(InputFlags::IXON | InputFlags::BRKINT | InputFlags::INPCK | InputFlags::ISTRIP);
    raw.output_flags.remove(OutputFlags::OPOST);
    raw.control_flags.insert(ControlFlags::CS8);
    raw.control_chars[SpecialCharacterIndices::VMIN as usize] = 1;
    raw.control_chars[SpecialCharacterIndices::VTIME as usize] = 0;
    raw
}

#[cfg(test)]
mod tests {
    use super::*;
    use nix::pty::{Winsize, openpty};
    use std::fs::File;

    fn pty_controller() -> (OwnedFd, TerminalController) {
        let pty = openpty(None::<&Winsize>, None::<&Termios>).expect("openpty");
        let controller = TerminalController::new(pty.slave).expect("pty slave is a terminal");
        (pty.master, controller)
    }

    fn same_mode(a: &Termios, b: &Termios) -> bool {
        a.local_flags == b.local_flags
            && a.input_flags == b.input_flags
            && a.output_flags == b.output_flags
            && a.control_flags == b.control_flags
    }

    #[test]
    fn test_not_a_terminal_is_reported() {
        let file = File::open("/dev/null").expect("open /dev/null");
        match TerminalController::new(file.into()) {
            Err(ShellError::Terminal(_)) => {}
            Err(e) => panic!("unexpected error: {}", e),
            Ok(_) => panic!("/dev/null accepted as a terminal"),
        }
    }

    #[test]
    fn test_raw_mode_clears_canonical_flags() {
        let (_master, controller) = pty_controller();

        let guard = controller.enable_raw_mode().expect("enable raw mode");
        let current = termios::tcgetattr(&controller.fd).expect("tcgetattr");
        assert!(!current.local_flags.contains(LocalFlags::ECHO));
        assert!(!current.local_flags.contains(LocalFlags::ICANON));
        assert!(!current.local_flags.contains(LocalFlags::ISIG));
        assert!(!current.output_flags.contains(OutputFlags::OPOST));
        assert_eq!(
            current.input_flags.contains(InputFlags::ICRNL),
            controller.snapshot.input_flags.contains(InputFlags::ICRNL)
        );
        drop(guard);
    }

    #[test]
    fn test_guard_drop_restores_snapshot() {
        let (_master, controller) = pty_controller();

        {
            let _guard = controller.enable_raw_mode().expect("enable raw mode");
        }

        let current = termios::tcgetattr(&controller.fd).expect("tcgetattr");
        assert!(same_mode(&current, &controller.snapshot));
    }

    #[test]
    fn test_restore_is_idempotent() {
        let (_master, controller) = pty_controller();
        let _guard = controller.enable_raw_mode().expect("enable raw mode");

        controller.disable_raw_mode().expect("first restore");
        let once = termios::tcgetattr(&controller.fd).expect("tcgetattr");
        controller.disable_raw_mode().expect("second restore");
        let twice = termios::tcgetattr(&controller.fd).expect("tcgetattr");

        assert!(same_mode(&once, &twice));
        assert!(same_mode(&twice, &controller.snapshot));
    }

    #[test]
    fn test_snapshot_survives_repeated_enable() {
        let (_master, controller) = pty_controller();
        let original = controller.snapshot.clone();

        let first = controller.enable_raw_mode().expect("enable raw mode");
        let second = controller.enable_raw_mode().expect("enable raw mode again");
        drop(second);
        drop(first);

        assert!(same_mode(&controller.snapshot, &original));
        let current = termios::tcgetattr(&controller.fd).expect("tcgetattr");
        assert_eq!(
            current.local_flags.contains(LocalFlags::ICANON),
            original.local_flags.contains(LocalFlags::ICANON)
        );
    }
}
