//! A small interactive command shell.
//!
//! Each cycle renders a prompt, reads one line with a raw-mode line editor,
//! splits it into tokens and either runs a builtin in-process or forks and
//! execs an external program, waiting for it before prompting again.
//!
//! The main entry point is [`Shell`], which composes the [`Interpreter`]
//! (builtin-vs-external dispatch) with the line editor and the terminal
//! controller. The public modules expose the pieces separately so they can be
//! driven with in-memory streams.

pub mod builtin;
pub mod command;
pub mod config;
pub mod env;
pub mod error;
pub mod external;
pub mod interpreter;
pub mod io_adapters;
pub mod lexer;
pub mod line_editor;
pub mod prompt;
pub mod shell;
pub mod terminal;

pub use config::Config;
pub use interpreter::Interpreter;
pub use shell::Shell;
