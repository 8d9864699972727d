//! Bounded read cursor with a latched error state.

use crate::CursorError;

/// Read-only cursor over a borrowed input slice.
///
/// The cursor tracks the unconsumed region and a latched error. Once an
/// error is latched every subsequent [`Cursor::require`] reports the same
/// error without advancing, so enclosing decode frames unwind instead of
/// consuming further bytes.
pub struct Cursor<'a> {
    data: &'a [u8],
    x: usize,
    err: Option<CursorError>,
}

impl<'a> Cursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            x: 0,
            err: None,
        }
    }

    /// Number of unconsumed bytes.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.x
    }

    /// The latched error, if any.
    pub fn error(&self) -> Option<CursorError> {
        self.err
    }

    /// Checks that `n` unconsumed bytes are available, latching
    /// [`CursorError::Eof`] otherwise. Must precede every multi-byte read.
    pub fn require(&mut self, n: usize) -> Result<(), CursorError> {
        if let Some(err) = self.err {
            return Err(err);
        }
        if self.remaining() < n {
            self.err = Some(CursorError::Eof);
            return Err(CursorError::Eof);
        }
        Ok(())
    }

    /// Advances past `n` bytes. Call only after a successful `require(n)`.
    pub fn consume(&mut self, n: usize) {
        self.x += n;
    }

    /// First unconsumed byte. Call only after a successful `require(1)`.
    pub fn peek(&self) -> u8 {
        self.data[self.x]
    }

    /// The unconsumed region.
    pub fn rest(&self) -> &'a [u8] {
        &self.data[self.x..]
    }

    /// Latches [`CursorError::BadFormat`] (unless an error is already
    /// latched) and returns the latched error.
    pub fn bad_format(&mut self) -> CursorError {
        let err = self.err.unwrap_or(CursorError::BadFormat);
        self.err = Some(err);
        err
    }
}
