use crate::command::{CommandFactory, ExecutableCommand, Flow};
use crate::env::Environment;
use crate::interpreter::Factory;
use anyhow::{Context, Result, anyhow};
use argh::{EarlyExit, FromArgs};
use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Built-in commands known to the shell at compile time.
///
/// Builtins are parsed using the [`argh`] crate (`FromArgs`) and executed directly
/// in-process without spawning a child process.
pub(crate) trait BuiltinCommand: Sized + FromArgs {
    /// Canonical name of the command, e.g. "pwd" or "cd".
    fn name() -> &'static str;

    /// Executes the command against the shell environment.
    ///
    /// Errors are printed by the caller; only `exit` returns [`Flow::Stop`].
    fn execute(self, stdout: &mut dyn Write, env: &mut Environment) -> Result<Flow>;
}

impl<T: BuiltinCommand> ExecutableCommand for T {
    fn execute(
        self: Box<Self>,
        stdout: &mut dyn Write,
        stderr: &mut dyn Write,
        env: &mut Environment,
    ) -> Flow {
        match T::execute(*self, stdout, env) {
            Ok(flow) => flow,
            Err(e) => {
                let _ = writeln!(stderr, "tinysh: {:#}", e);
                Flow::Continue
            }
        }
    }
}

/// Outcome of an argument parse that ended early: `--help` output or a usage error.
struct InvalidArgs {
    output: String,
    is_error: bool,
}

impl ExecutableCommand for InvalidArgs {
    fn execute(
        self: Box<Self>,
        stdout: &mut dyn Write,
        stderr: &mut dyn Write,
        _env: &mut Environment,
    ) -> Flow {
        let output = self.output.trim_end();
        if self.is_error {
            let _ = writeln!(stderr, "{}", output);
        } else {
            let _ = writeln!(stdout, "{}", output);
        }
        Flow::Continue
    }
}

impl<T: BuiltinCommand + 'static> CommandFactory for Factory<T> {
    fn name(&self) -> &'static str {
        T::name()
    }

    fn create(&self, args: &[&str]) -> Box<dyn ExecutableCommand> {
        match T::from_args(&[T::name()], args) {
            Ok(cmd) => Box::new(cmd),
            Err(EarlyExit { output, status }) => Box::new(InvalidArgs {
                output,
                is_error: status.is_err(),
            }),
        }
    }
}

/// Immutable name-to-builtin table, filled once when the shell starts.
pub struct BuiltinRegistry {
    factories: HashMap<&'static str, Box<dyn CommandFactory>>,
    names: Vec<&'static str>,
}

impl BuiltinRegistry {
    /// Builds the table. A later factory with an already registered name
    /// replaces the earlier one.
    pub fn new(factories: Vec<Box<dyn CommandFactory>>) -> Self {
        let mut names = Vec::with_capacity(factories.len());
        let mut table = HashMap::with_capacity(factories.len());
        for factory in factories {
            let name = factory.name();
            if table.insert(name, factory).is_none() {
                names.push(name);
            }
        }
        Self {
            factories: table,
            names,
        }
    }

    pub fn get(&self, name: &str) -> Option<&dyn CommandFactory> {
        self.factories.get(name).map(|f| f.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered names in registration order.
    pub fn names(&self) -> &[&'static str] {
        &self.names
    }
}

impl Default for BuiltinRegistry {
    /// `pwd`, `cd`, `help`, `exit` and `ls`.
    fn default() -> Self {
        Self::new(vec![
            Box::new(Factory::<Pwd>::default()),
            Box::new(Factory::<Cd>::default()),
            Box::new(Factory::<Help>::default()),
            Box::new(Factory::<Exit>::default()),
            Box::new(Factory::<Ls>::default()),
        ])
    }
}

/// Which working directory `pwd` prints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PwdMode {
    /// The path as reached through `cd`, symlinks preserved.
    Logical,
    /// The resolved directory the process sits in.
    #[default]
    Physical,
}

/// Print the current working directory to standard output.
///
/// `-L` and `-P` may both be given; the last one wins, so `FromArgs` is
/// written by hand instead of derived.
#[derive(Debug, Default)]
pub struct Pwd {
    pub mode: PwdMode,
}

impl FromArgs for Pwd {
    fn from_args(command_name: &[&str], args: &[&str]) -> Result<Self, EarlyExit> {
        let mut mode = PwdMode::default();
        for arg in args {
            match *arg {
                "-L" | "--logical" => mode = PwdMode::Logical,
                "-P" | "--physical" => mode = PwdMode::Physical,
                "-h" | "--help" => {
                    return Err(EarlyExit {
                        output: pwd_usage(command_name),
                        status: Ok(()),
                    });
                }
                other => return Err(format!("Unrecognized argument: {}\n", other).into()),
            }
        }
        Ok(Self { mode })
    }
}

fn pwd_usage(command_name: &[&str]) -> String {
    format!(
        "Usage: {} [-L] [-P]\n\n\
         Print the current working directory to standard output.\n\n\
         Options:\n  \
         -L, --logical     print the directory as reached through cd, keeping symlinks.\n  \
         -P, --physical    print the directory with all symlinks resolved (default).\n  \
         -h, --help        display usage information\n",
        command_name.join(" ")
    )
}

impl BuiltinCommand for Pwd {
    fn name() -> &'static str {
        "pwd"
    }

    fn execute(self, stdout: &mut dyn Write, env: &mut Environment) -> Result<Flow> {
        let dir = match self.mode {
            PwdMode::Logical => &env.logical_dir,
            PwdMode::Physical => &env.current_dir,
        };
        writeln!(stdout, "{}", dir.to_string_lossy())?;
        Ok(Flow::Continue)
    }
}

#[derive(FromArgs)]
/// Change the current working directory.
pub struct Cd {
    #[argh(positional)]
    /// directory to switch to; absolute or relative to the current directory.
    pub target: Option<String>,
}

impl BuiltinCommand for Cd {
    fn name() -> &'static str {
        "cd"
    }

    fn execute(self, _stdout: &mut dyn Write, env: &mut Environment) -> Result<Flow> {
        let target = self
            .target
            .ok_or_else(|| anyhow!("cd: expected argument"))?;
        env.change_dir(Path::new(&target))
            .with_context(|| format!("cd: {}", target))?;
        Ok(Flow::Continue)
    }
}

#[derive(FromArgs)]
/// Show how to use the shell and list the builtin commands.
pub struct Help {}

impl BuiltinCommand for Help {
    fn name() -> &'static str {
        "help"
    }

    fn execute(self, stdout: &mut dyn Write, env: &mut Environment) -> Result<Flow> {
        writeln!(stdout, "tinysh - a minimal interactive shell")?;
        writeln!(
            stdout,
            "Type a command and its arguments separated by spaces, then press enter."
        )?;
        writeln!(
            stdout,
            "Any other name is run as a program looked up in PATH."
        )?;
        writeln!(stdout)?;
        writeln!(stdout, "Builtin commands:")?;
        for name in &env.builtin_names {
            writeln!(stdout, "  {}", name)?;
        }
        Ok(Flow::Continue)
    }
}

#[derive(FromArgs)]
/// Exit the shell.
pub struct Exit {
    #[argh(positional, greedy)]
    /// ignored; the shell always exits with status 0.
    pub _args: Vec<String>,
}

impl BuiltinCommand for Exit {
    fn name() -> &'static str {
        "exit"
    }

    fn execute(self, _stdout: &mut dyn Write, _env: &mut Environment) -> Result<Flow> {
        Ok(Flow::Stop)
    }
}

#[derive(FromArgs)]
/// List directory entries separated by spaces.
pub struct Ls {
    #[argh(switch, short = 'a')]
    /// include entries whose names start with a dot.
    pub all: bool,

    #[argh(positional)]
    /// directory to list; defaults to the current directory.
    pub dir: Option<String>,
}

impl BuiltinCommand for Ls {
    fn name() -> &'static str {
        "ls"
    }

    fn execute(self, stdout: &mut dyn Write, _env: &mut Environment) -> Result<Flow> {
        let dir = self.dir.map(PathBuf::from).unwrap_or_else(|| PathBuf::from("."));
        let names =
            list_entries(&dir, self.all).with_context(|| format!("ls: {}", dir.display()))?;
        if !names.is_empty() {
            writeln!(stdout, "{}", names.join(" "))?;
        }
        Ok(Flow::Continue)
    }
}

/// Sorted entry names of `dir`; dotfiles only when `all` is set.
pub fn list_entries(dir: &Path, all: bool) -> io::Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(dir)? {
        let name = entry?.file_name().to_string_lossy().into_owned();
        if all || !name.starts_with('.') {
            names.push(name);
        }
    }
    names.sort();
    Ok(names)
}
