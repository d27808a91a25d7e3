//! `OutputBuffer`: the buffered ANSI writer between the screen and the terminal.
//!
//! Screen updates are generated into this buffer and written out in as few
//! `write` calls as the terminal accepts. Bytes the terminal did not take yet
//! stay queued for the next flush.

use crate::ansi::{self, Attr};
use crate::layout::Point;
use std::io::{self, Write};

/// Pre-allocated buffer of pending terminal output.
pub struct OutputBuffer {
    data: Vec<u8>,
}

impl OutputBuffer {
    /// Create a new output buffer with the given capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
        }
    }

    /// Create a buffer sized for a typical terminal (4KB).
    pub fn new() -> Self {
        Self::with_capacity(4096)
    }

    /// Discard all pending output.
    #[inline]
    pub fn clear(&mut self) {
        self.data.clear();
    }

    /// Pending bytes.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Number of pending bytes.
    #[inline]
    pub const fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if nothing is pending.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Drop the first `n` bytes after a partial write.
    #[inline]
    pub fn consume(&mut self, n: usize) {
        self.data.drain(..n.min(self.data.len()));
    }

    /// Write raw bytes.
    #[inline]
    pub fn write_raw(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }

    /// Write one character.
    #[inline]
    pub fn push_char(&mut self, ch: char) {
        let mut buf = [0u8; 4];
        self.data.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
    }

    /// Move the cursor to a 1-based screen point.
    #[inline]
    pub fn cursor_to(&mut self, p: Point) {
        ansi::write_cursor_to(&mut self.data, p);
    }

    /// Move the cursor `n` cells in direction `dir` (`A`, `B`, `C` or `D`).
    #[inline]
    pub fn cursor_move(&mut self, dir: u8, n: i32) {
        ansi::write_cursor_move(&mut self.data, dir, n);
    }

    /// Show or hide the cursor.
    #[inline]
    pub fn cursor_visible(&mut self, visible: bool) {
        ansi::write_cursor_visible(&mut self.data, visible);
    }

    /// Emit the minimal SGR change from `from` to `to`.
    #[inline]
    pub fn sgr_delta(&mut self, from: Attr, to: Attr) {
        ansi::write_sgr_delta(&mut self.data, from, to);
    }

    /// Reset all attributes.
    #[inline]
    pub fn reset_attrs(&mut self) {
        self.data.extend_from_slice(b"\x1b[0m");
    }

    /// Clear the entire screen.
    #[inline]
    pub fn clear_screen(&mut self) {
        ansi::write_erase_display(&mut self.data, 2);
    }

    /// Set or reset a DEC private mode.
    #[inline]
    pub fn dec_mode(&mut self, mode: u16, enable: bool) {
        ansi::write_dec_mode(&mut self.data, mode, enable);
    }

    /// Write pending bytes to `writer` until it is drained or refuses more.
    ///
    /// Written bytes are consumed even when an error is returned, so the
    /// caller may retry the remainder later.
    pub fn flush_to<W: Write + ?Sized>(&mut self, writer: &mut W) -> io::Result<()> {
        while !self.data.is_empty() {
            match writer.write(&self.data) {
                Ok(0) => return Err(io::ErrorKind::WriteZero.into()),
                Ok(n) => self.consume(n),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        writer.flush()
    }
}

impl Default for OutputBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl Write for OutputBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.data.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Accepts at most `limit` bytes per call, then reports would-block.
    struct Trickle {
        taken: Vec<u8>,
        limit: usize,
        budget: usize,
    }

    impl Write for Trickle {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.budget == 0 {
                return Err(io::ErrorKind::WouldBlock.into());
            }
            self.budget -= 1;
            let n = buf.len().min(self.limit);
            self.taken.extend_from_slice(&buf[..n]);
            Ok(n)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_sequences() {
        let mut out = OutputBuffer::new();
        out.cursor_to(Point::new(3, 2));
        out.reset_attrs();
        out.clear_screen();
        out.push_char('é');
        assert_eq!(out.as_bytes(), "\x1b[2;3H\x1b[0m\x1b[2Jé".as_bytes());
    }

    #[test]
    fn test_partial_flush_keeps_remainder() {
        let mut out = OutputBuffer::new();
        out.write_raw(b"abcdefgh");
        let mut w = Trickle {
            taken: Vec::new(),
            limit: 3,
            budget: 2,
        };
        let err = out.flush_to(&mut w).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::WouldBlock);
        assert_eq!(w.taken, b"abcdef");
        assert_eq!(out.as_bytes(), b"gh");

        w.budget = 1;
        out.flush_to(&mut w).unwrap();
        assert_eq!(w.taken, b"abcdefgh");
        assert!(out.is_empty());
    }
}
