use crate::command::Flow;
use crate::config::Config;
use crate::interpreter::Interpreter;
use crate::lexer::split_into_tokens;
use crate::line_editor::{LineEditor, ReadOutcome};
use crate::prompt::PromptRenderer;
use crate::terminal::TerminalController;
use std::io::{self, Read, Write};
use tracing::{debug, info, warn};

/// The interactive loop: prompt, read a line, tokenize, dispatch.
///
/// The terminal is raw only while the editor waits for keystrokes. Prompt
/// rendering, builtins and external programs all run in canonical mode. Without
/// a terminal the same loop runs in line mode.
pub struct Shell<R, W> {
    interpreter: Interpreter,
    editor: LineEditor<R, W>,
    prompt: PromptRenderer,
    terminal: Option<TerminalController>,
}

impl Shell<io::Stdin, io::Stdout> {
    /// A shell on the process's standard streams.
    ///
    /// Falls back to line mode when standard input is not a terminal or when
    /// `config.line_mode` is set.
    pub fn from_config(config: &Config) -> Self {
        let terminal = if config.line_mode {
            info!("line mode requested");
            None
        } else {
            match TerminalController::from_stdin() {
                Ok(terminal) => {
                    if let Err(e) = terminal.restore_on_panic() {
                        warn!("terminal will not be restored on panic: {}", e);
                    }
                    Some(terminal)
                }
                Err(e) => {
                    info!("using line mode: {}", e);
                    None
                }
            }
        };
        let editor = LineEditor::new(io::stdin(), io::stdout(), terminal.is_some());
        Self::new(Interpreter::default(), editor, terminal)
    }
}

impl<R: Read, W: Write> Shell<R, W> {
    pub fn new(
        interpreter: Interpreter,
        editor: LineEditor<R, W>,
        terminal: Option<TerminalController>,
    ) -> Self {
        Self {
            interpreter,
            editor,
            prompt: PromptRenderer,
            terminal,
        }
    }

    /// Runs until `exit`, the interrupt key or end of input. The terminal is
    /// back in its original mode when this returns, including on error.
    pub fn run(&mut self) -> io::Result<()> {
        let result = self.run_loop();
        if let Some(terminal) = &self.terminal {
            if let Err(e) = terminal.disable_raw_mode() {
                warn!("failed to restore terminal on exit: {}", e);
            }
        }
        result
    }

    fn run_loop(&mut self) -> io::Result<()> {
        loop {
            let prompt = self.prompt.render(&self.interpreter.env().current_dir);
            self.editor.write_prompt(&prompt)?;

            match self.read_line()? {
                ReadOutcome::Line(line) => {
                    let tokens = split_into_tokens(&line);
                    if self.interpreter.execute(&tokens) == Flow::Stop {
                        debug!("exit requested");
                        return Ok(());
                    }
                }
                ReadOutcome::Interrupted => {
                    debug!("interrupted");
                    return Ok(());
                }
                ReadOutcome::Eof => {
                    debug!("end of input");
                    return Ok(());
                }
            }
        }
    }

    /// Reads one line, in raw mode when a terminal is available. If raw mode
    /// cannot be entered the rest of the session continues in line mode.
    fn read_line(&mut self) -> io::Result<ReadOutcome> {
        if let Some(terminal) = &self.terminal {
            match terminal.enable_raw_mode() {
                Ok(_raw) => return self.editor.read_line(),
                Err(e) => warn!("switching to line mode: {}", e),
            }
        }
        self.terminal = None;
        self.editor.set_echo(false);
        self.editor.read_line()
    }
}
