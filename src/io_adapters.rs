use std::cell::RefCell;
use std::io::{Result as IoResult, Write};
use std::rc::Rc;

/// Memory-backed writer for capturing what the shell prints.
///
/// Clones share one buffer, so a handle kept by the caller still sees bytes
/// written after the writer itself has been boxed and handed away.
#[derive(Clone, Default)]
pub struct MemWriter {
    buf: Rc<RefCell<Vec<u8>>>,
}

impl MemWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, decoded lossily.
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buf.borrow()).into_owned()
    }
}

impl Write for MemWriter {
    fn write(&mut self, data: &[u8]) -> IoResult<usize> {
        self.buf.borrow_mut().extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> IoResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_buffer() {
        let observer = MemWriter::new();
        let mut boxed: Box<dyn Write> = Box::new(observer.clone());
        write!(boxed, "hello {}", 42).unwrap();
        drop(boxed);

        assert_eq!(observer.contents(), "hello 42");
    }
}
