//! @ai:module:intent Peekable line reader used for annotation continuation blocks
//! @ai:module:layer infrastructure
//! @ai:module:public_api LineCursor
//! @ai:module:stateless false

use std::io::{self, BufRead, Lines};

/// @ai:intent Line iterator with one line of look-ahead and 1-based line numbers
/// @ai:invariant line_number is the number of the last line returned by next_line
pub struct LineCursor<R> {
    lines: Lines<R>,
    peeked: Option<String>,
    line_number: usize,
}

impl<R: BufRead> LineCursor<R> {
    /// @ai:intent Wrap a buffered reader
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            peeked: None,
            line_number: 0,
        }
    }

    /// @ai:intent Consume the next line, returning it with its line number
    /// @ai:effects io
    pub fn next_line(&mut self) -> io::Result<Option<(usize, String)>> {
        let line = match self.peeked.take() {
            Some(line) => Some(line),
            None => self.lines.next().transpose()?,
        };

        Ok(line.map(|line| {
            self.line_number += 1;
            (self.line_number, line)
        }))
    }

    /// @ai:intent Look at the next line without consuming it
    /// @ai:effects io
    pub fn peek_line(&mut self) -> io::Result<Option<&str>> {
        if self.peeked.is_none() {
            self.peeked = self.lines.next().transpose()?;
        }
        Ok(self.peeked.as_deref())
    }

    /// @ai:intent Number of the last consumed line (0 before the first read)
    pub fn line_number(&self) -> usize {
        self.line_number
    }
}
