use std::env as stdenv;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

/// The shell's view of process state shared with builtins.
///
/// The working directory is tracked twice:
/// - `logical_dir`: the path as reached through `cd`, symlinks preserved.
/// - `current_dir`: the resolved directory the process actually sits in.
///
/// Only [`Environment::change_dir`] moves the process, which keeps both in step.
#[derive(Debug, Clone)]
pub struct Environment {
    pub logical_dir: PathBuf,
    pub current_dir: PathBuf,
    /// Names of the registered builtins, in registration order.
    pub builtin_names: Vec<&'static str>,
}

impl Environment {
    /// Capture the current working directory.
    ///
    /// `$PWD` seeds the logical directory when it names the same directory as
    /// the process's real one.
    pub fn new() -> Self {
        let current_dir = stdenv::current_dir().unwrap_or_else(|_| PathBuf::from("/"));
        let logical_dir = stdenv::var_os("PWD")
            .map(PathBuf::from)
            .filter(|pwd| pwd.is_absolute() && same_dir(pwd, &current_dir))
            .unwrap_or_else(|| current_dir.clone());
        Self {
            logical_dir,
            current_dir,
            builtin_names: Vec::new(),
        }
    }

    /// Changes the process working directory to `target`, resolved by the
    /// kernel against the real directory, so `..` always leads to the parent
    /// of what `pwd` prints.
    ///
    /// The logical directory follows lexically while it still names the same
    /// place; after leaving a symlinked directory through `..` it falls back
    /// to the resolved path. On failure nothing changes.
    pub fn change_dir(&mut self, target: &Path) -> io::Result<()> {
        stdenv::set_current_dir(target)?;
        self.current_dir = stdenv::current_dir()?;
        let logical = normalize(&self.logical_dir.join(target));
        self.logical_dir = if same_dir(&logical, &self.current_dir) {
            logical
        } else {
            self.current_dir.clone()
        };
        Ok(())
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

fn same_dir(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Lexically removes `.` and `..` components without touching the filesystem.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Serialises tests that move the process working directory.
#[cfg(test)]
pub(crate) fn lock_current_dir() -> std::sync::MutexGuard<'static, ()> {
    use std::sync::{Mutex, OnceLock};
    static MUTEX: OnceLock<Mutex<()>> = OnceLock::new();
    MUTEX
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}
