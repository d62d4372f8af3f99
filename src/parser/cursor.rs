//! Forward-only token reader over a fort.14 text stream.
//!
//! The reader works one physical line at a time. Tokens are separated by
//! ASCII whitespace and may flow across line breaks, while [`Cursor::skip_line`]
//! discards whatever is left of the line the last token came from.

use std::io;

/// Returned when a token or a line is requested past the end of the stream.
#[derive(Debug)]
pub enum CursorError {
    UnexpectedEof,
    InvalidUtf8,
    Io(io::Error),
}

impl From<io::Error> for CursorError {
    fn from(err: io::Error) -> CursorError {
        if err.kind() == io::ErrorKind::InvalidData {
            return CursorError::InvalidUtf8;
        }
        CursorError::Io(err)
    }
}

/// a token separator
fn is_separator(b: u8) -> bool {
    b == b' ' || b == b'\t' || b == b'\r' || b == b'\n'
}

/// Parses a float, accepting Fortran's `D` exponent marker (`1.5D+01`).
pub fn parse_float(token: &str) -> Option<f64> {
    match token.parse::<f64>() {
        Ok(v) => Some(v),
        Err(_) if token.contains(&['d', 'D'][..]) => {
            token.replace(&['d', 'D'][..], "e").parse().ok()
        }
        Err(_) => None,
    }
}

fn trim_line_terminator(line: &mut String) {
    while line.ends_with('\n') || line.ends_with('\r') {
        line.pop();
    }
}

pub struct Cursor<R> {
    input: R,
    line: String,
    pos: usize,
    lineno: usize,
    eof: bool,
}

impl<R> Cursor<R> {
    /// 1-based number of the line the cursor is on, 0 before anything was read.
    pub fn lineno(&self) -> usize {
        self.lineno
    }
}

impl<R: io::BufRead> Cursor<R> {
    pub fn new(input: R) -> Self {
        Self {
            input,
            line: String::new(),
            pos: 0,
            lineno: 0,
            eof: false,
        }
    }

    /// Replaces the current line with the next physical one.
    ///
    /// Returns `false` at the end of the stream.
    fn fill_line(&mut self) -> Result<bool, CursorError> {
        if self.eof {
            return Ok(false);
        }
        self.line.clear();
        self.pos = 0;
        let n = self.input.read_line(&mut self.line)?;
        if n == 0 {
            self.eof = true;
            return Ok(false);
        }
        trim_line_terminator(&mut self.line);
        self.lineno += 1;
        Ok(true)
    }

    /// Moves `pos` past the separators of the current line.
    fn skip_separators(&mut self) {
        let rest = &self.line.as_bytes()[self.pos..];
        let n = rest
            .iter()
            .position(|&b| !is_separator(b))
            .unwrap_or(rest.len());
        self.pos += n;
    }

    fn line_exhausted(&mut self) -> bool {
        self.skip_separators();
        self.pos == self.line.len()
    }

    /// Returns the next whitespace-separated token, or `None` at the end of
    /// the stream.
    pub fn try_token(&mut self) -> Result<Option<&str>, CursorError> {
        while self.line_exhausted() {
            if !self.fill_line()? {
                return Ok(None);
            }
        }
        let start = self.pos;
        let rest = &self.line.as_bytes()[start..];
        let len = rest
            .iter()
            .position(|&b| is_separator(b))
            .unwrap_or(rest.len());
        self.pos += len;
        Ok(Some(&self.line[start..start + len]))
    }

    /// Like [`Cursor::try_token`], except the end of the stream is an error.
    pub fn next_token(&mut self) -> Result<&str, CursorError> {
        self.try_token()?.ok_or(CursorError::UnexpectedEof)
    }

    /// Discards the rest of the current line and returns the next physical
    /// line without its terminator.
    pub fn next_line(&mut self) -> Result<&str, CursorError> {
        if !self.fill_line()? {
            return Err(CursorError::UnexpectedEof);
        }
        self.pos = self.line.len();
        Ok(&self.line)
    }

    /// Discards the rest of the current line.
    pub fn skip_line(&mut self) {
        self.pos = self.line.len();
    }

    /// Discards the rest of the current line if it does not start with a
    /// number, e.g. a `= Number of open boundaries` annotation.
    pub fn skip_annotation(&mut self) {
        self.skip_separators();
        let is_annotation = match self.line[self.pos..].split_ascii_whitespace().next() {
            Some(word) => parse_float(word).is_none(),
            None => false,
        };
        if is_annotation {
            self.skip_line();
        }
    }

    /// Whether there is no token left in the stream.
    pub fn at_eof(&mut self) -> Result<bool, CursorError> {
        while self.line_exhausted() {
            if !self.fill_line()? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}
