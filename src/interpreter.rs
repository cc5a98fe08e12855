use crate::builtin::BuiltinRegistry;
use crate::command::{Flow, Launcher};
use crate::env::Environment;
use crate::external::ProcessLauncher;
use std::io::{self, Write};
use tracing::debug;

/// Factory allows creating instances of ExecutableCommand.
///
/// Only supports builtins defined in this crate.
pub(crate) struct Factory<T> {
    _phantom: std::marker::PhantomData<T>,
}

impl<T> Default for Factory<T> {
    fn default() -> Self {
        Self {
            _phantom: std::marker::PhantomData,
        }
    }
}

/// Routes a tokenized line to a builtin or to an external program.
///
/// The interpreter owns the shell [`Environment`], the builtin table and the
/// launcher for everything else. Builtin output goes to the interpreter's own
/// streams; external programs inherit the process's standard descriptors.
///
/// Example
/// ```
/// use tinysh::Interpreter;
/// use tinysh::command::Flow;
/// let mut sh = Interpreter::default();
/// assert_eq!(sh.execute(&["exit".to_string()]), Flow::Stop);
/// ```
pub struct Interpreter {
    env: Environment,
    builtins: BuiltinRegistry,
    launcher: Box<dyn Launcher>,
    stdout: Box<dyn Write>,
    stderr: Box<dyn Write>,
}

impl Interpreter {
    pub fn new(
        builtins: BuiltinRegistry,
        launcher: Box<dyn Launcher>,
        stdout: Box<dyn Write>,
        stderr: Box<dyn Write>,
    ) -> Self {
        let mut env = Environment::new();
        env.builtin_names = builtins.names().to_vec();
        Self {
            env,
            builtins,
            launcher,
            stdout,
            stderr,
        }
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    /// Runs one tokenized line.
    ///
    /// A blank line does nothing. A builtin receives the remaining tokens as
    /// its arguments; any other name is launched as a program with the full
    /// token list as its argument vector.
    pub fn execute(&mut self, tokens: &[String]) -> Flow {
        let Some(name) = tokens.first() else {
            return Flow::Continue;
        };

        if let Some(factory) = self.builtins.get(name) {
            debug!(builtin = %name, "dispatching builtin");
            let args: Vec<&str> = tokens[1..].iter().map(String::as_str).collect();
            let flow = factory.create(&args).execute(
                &mut *self.stdout,
                &mut *self.stderr,
                &mut self.env,
            );
            let _ = self.stdout.flush();
            let _ = self.stderr.flush();
            return flow;
        }

        self.launch_external(tokens);
        Flow::Continue
    }

    fn launch_external(&mut self, argv: &[String]) {
        // Pending output must reach the terminal before the child writes.
        let _ = self.stdout.flush();
        let _ = self.stderr.flush();
        match self.launcher.launch(argv) {
            Ok(code) => debug!(program = %argv[0], code, "child finished"),
            Err(e) => {
                let _ = writeln!(self.stderr, "tinysh: {}: {}", argv[0], e);
                let _ = self.stderr.flush();
            }
        }
    }
}

impl Default for Interpreter {
    /// The default builtins, a fork/exec launcher and the process's standard streams.
    fn default() -> Self {
        Self::new(
            BuiltinRegistry::default(),
            Box::new(ProcessLauncher),
            Box::new(io::stdout()),
            Box::new(io::stderr()),
        )
    }
}
