use std::io::BufRead;

use crate::error::Result;

/// Line reader feeding the record loop and `getline`.
pub struct LineSource<'a> {
    reader: Option<Box<dyn BufRead + 'a>>,
    buffer: String,
}

impl<'a> LineSource<'a> {
    pub fn new(reader: impl BufRead + 'a) -> Self {
        Self {
            reader: Some(Box::new(reader)),
            buffer: String::new(),
        }
    }

    /// A source with no lines.
    pub fn empty() -> Self {
        Self {
            reader: None,
            buffer: String::new(),
        }
    }

    /// The next line without its terminator, or `None` at end of input.
    pub fn next_line(&mut self) -> Result<Option<String>> {
        let Some(reader) = self.reader.as_mut() else {
            return Ok(None);
        };

        self.buffer.clear();
        if reader.read_line(&mut self.buffer)? == 0 {
            // Release the reader once exhausted.
            self.reader = None;
            return Ok(None);
        }

        if self.buffer.ends_with('\n') {
            self.buffer.pop();
            if self.buffer.ends_with('\r') {
                self.buffer.pop();
            }
        }
        Ok(Some(self.buffer.clone()))
    }
}
