//! Error types for the terminal and process layers.

use nix::errno::Errno;
use thiserror::Error;

/// Result alias for operations that fail with a [`ShellError`].
pub type Result<T> = std::result::Result<T, ShellError>;

/// Failures of the system calls the shell itself depends on.
///
/// Builtin bodies use [`anyhow`] instead; these are the errors with a fixed
/// shape that callers match on (e.g. to fall back to line mode).
#[derive(Debug, Error)]
pub enum ShellError {
    /// Reading or applying terminal attributes failed.
    #[error("terminal attributes unavailable: {0}")]
    Terminal(#[source] Errno),

    /// The child process could not be created.
    #[error("fork failed: {0}")]
    Fork(#[source] Errno),

    /// Waiting on a child process failed.
    #[error("waitpid failed: {0}")]
    Wait(#[source] Errno),

    /// Changing signal dispositions around a child failed.
    #[error("signal setup failed: {0}")]
    Signal(#[source] Errno),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_os_description() {
        let err = ShellError::Fork(Errno::EAGAIN);
        let text = err.to_string();
        assert!(text.starts_with("fork failed: "));
        assert!(text.contains("EAGAIN"));
    }

    #[test]
    fn test_io_errors_convert() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed");
        let err: ShellError = io.into();
        assert_eq!(err.to_string(), "pipe closed");
    }
}
