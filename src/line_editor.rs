//! Keystroke-level line editing.
//!
//! The editor pulls one byte at a time from its input and keeps the line typed
//! so far. In raw mode the terminal does not echo, so the editor echoes what it
//! accepts and draws its own erasures.

use std::io::{self, ErrorKind, Read, Write};

const NEWLINE: u8 = b'\n';
const INTERRUPT: u8 = 0x03;
const BACKSPACE: u8 = 0x08;
const DELETE: u8 = 0x7f;

/// Moves back one column, blanks it and moves back again.
const ERASE: &[u8] = b"\x08 \x08";
const CRLF: &[u8] = b"\r\n";

/// Result of soliciting one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    /// Return was pressed; holds the text typed before it.
    Line(String),
    /// The interrupt key (Ctrl-C) was pressed.
    Interrupted,
    /// The input stream ended. Any partial line is discarded.
    Eof,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Reading,
    LineComplete,
    Interrupted,
}

pub struct LineEditor<R, W> {
    input: R,
    output: W,
    buffer: Vec<u8>,
    echo: bool,
}

impl<R: Read, W: Write> LineEditor<R, W> {
    /// Creates an editor. `echo` should be set exactly when the terminal is in
    /// raw mode; in line mode nobody expects the shell to repeat the input.
    pub fn new(input: R, output: W, echo: bool) -> Self {
        Self {
            input,
            output,
            buffer: Vec::new(),
            echo,
        }
    }

    pub fn set_echo(&mut self, echo: bool) {
        self.echo = echo;
    }

    /// Writes `prompt` to the editor's output and flushes it.
    pub fn write_prompt(&mut self, prompt: &str) -> io::Result<()> {
        self.output.write_all(prompt.as_bytes())?;
        self.output.flush()
    }

    /// Reads keystrokes until a line is complete, the interrupt key is pressed
    /// or the input ends.
    pub fn read_line(&mut self) -> io::Result<ReadOutcome> {
        self.buffer.clear();
        loop {
            let Some(byte) = self.next_byte()? else {
                self.buffer.clear();
                return Ok(ReadOutcome::Eof);
            };
            match self.feed(byte)? {
                State::Reading => {}
                State::LineComplete => {
                    let line = std::mem::take(&mut self.buffer);
                    return Ok(ReadOutcome::Line(String::from_utf8_lossy(&line).into_owned()));
                }
                State::Interrupted => {
                    self.buffer.clear();
                    return Ok(ReadOutcome::Interrupted);
                }
            }
        }
    }

    fn next_byte(&mut self) -> io::Result<Option<u8>> {
        let mut byte = [0u8; 1];
        loop {
            match self.input.read(&mut byte) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(byte[0])),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }

    fn feed(&mut self, byte: u8) -> io::Result<State> {
        match byte {
            NEWLINE => {
                if self.echo {
                    self.output.write_all(CRLF)?;
                }
                self.output.flush()?;
                Ok(State::LineComplete)
            }
            INTERRUPT => {
                self.output.write_all(CRLF)?;
                self.output.flush()?;
                Ok(State::Interrupted)
            }
            DELETE | BACKSPACE => {
                if self.erase_last_char() && self.echo {
                    self.output.write_all(ERASE)?;
                    self.output.flush()?;
                }
                Ok(State::Reading)
            }
            b if is_printable(b) => {
                self.buffer.push(b);
                if self.echo {
                    self.output.write_all(&[b])?;
                    self.output.flush()?;
                }
                Ok(State::Reading)
            }
            _ => Ok(State::Reading),
        }
    }

    /// Removes the last character, including all bytes of a multi-byte UTF-8
    /// sequence. Returns `false` when the buffer was already empty.
    fn erase_last_char(&mut self) -> bool {
        let Some(mut last) = self.buffer.pop() else {
            return false;
        };
        while is_continuation(last) {
            match self.buffer.pop() {
                Some(b) => last = b,
                None => break,
            }
        }
        true
    }
}

/// Bytes above the ASCII range are accepted so UTF-8 text passes through.
fn is_printable(byte: u8) -> bool {
    byte >= 0x20 && byte != DELETE
}

fn is_continuation(byte: u8) -> bool {
    byte & 0xC0 == 0x80
}
