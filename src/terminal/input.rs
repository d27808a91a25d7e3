//! `InputBuffer`: raw terminal bytes in, decoded [`Input`] events out.
//!
//! Reading and decoding are separate. [`InputBuffer::read_from`] performs a
//! single read into the free tail; [`InputBuffer::decode`] never touches the
//! file and only consumes bytes once a complete event is available.

use crate::ansi::{decode_escape, is_escape_prefix, Escape, Input, ESC};
use std::io::{self, Read};
use tracing::debug;

/// Default capacity.
pub const DEFAULT_CAPACITY: usize = 4096;

/// Bytes fetched per read when the buffer grows.
const READ_CHUNK: usize = 1024;

/// Outcome of decoding the leading UTF-8 scalar.
enum Utf8 {
    Rune(char, usize),
    Incomplete,
    Invalid,
}

/// Buffered, incremental input decoder.
pub struct InputBuffer {
    data: Vec<u8>,
    start: usize,
    cap: usize,
    need_more: bool,
}

impl InputBuffer {
    /// A buffer holding at most [`DEFAULT_CAPACITY`] undecoded bytes.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// A buffer holding at most `cap` undecoded bytes (minimum 1).
    pub fn with_capacity(cap: usize) -> Self {
        Self {
            data: Vec::new(),
            start: 0,
            cap: cap.max(1),
            need_more: false,
        }
    }

    /// Undecoded bytes.
    #[inline]
    pub fn pending(&self) -> &[u8] {
        &self.data[self.start..]
    }

    /// Number of undecoded bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len() - self.start
    }

    /// Check whether nothing is left to decode.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the last decode stopped on an incomplete sequence.
    ///
    /// Cleared by the next successful read or decode.
    #[inline]
    pub const fn need_more(&self) -> bool {
        self.need_more
    }

    /// Whether the buffer holds as many undecoded bytes as it may.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.len() >= self.cap
    }

    fn compact(&mut self) {
        if self.start > 0 {
            self.data.drain(..self.start);
            self.start = 0;
        }
    }

    /// Append bytes directly, bypassing any reader.
    pub fn push(&mut self, bytes: &[u8]) {
        self.compact();
        self.data.extend_from_slice(bytes);
        self.need_more = false;
    }

    /// Perform one read from `reader` into the free tail.
    ///
    /// Consumed bytes are compacted away first. A full buffer reports
    /// would-block without reading. `Ok(0)` means end of file.
    pub fn read_from<R: Read + ?Sized>(&mut self, reader: &mut R) -> io::Result<usize> {
        self.compact();
        let old = self.data.len();
        if old >= self.cap {
            return Err(io::ErrorKind::WouldBlock.into());
        }
        self.data.resize(self.cap.min(old + READ_CHUNK), 0);
        match reader.read(&mut self.data[old..]) {
            Ok(n) => {
                self.data.truncate(old + n);
                if n > 0 {
                    self.need_more = false;
                }
                Ok(n)
            }
            Err(e) => {
                self.data.truncate(old);
                Err(e)
            }
        }
    }

    fn advance(&mut self, n: usize) {
        self.start = (self.start + n).min(self.data.len());
        if self.start == self.data.len() {
            self.data.clear();
            self.start = 0;
        }
    }

    /// Decode the next event.
    ///
    /// Returns `None` when the buffer is empty or holds only an incomplete
    /// sequence; in the latter case [`need_more`](Self::need_more) is set and
    /// nothing is consumed, unless the buffer is full, in which case the
    /// leading byte is taken literally.
    pub fn decode(&mut self) -> Option<Input> {
        let buf = self.pending();
        if buf.is_empty() {
            self.need_more = false;
            return None;
        }
        if let Some((escape, params, n)) = decode_escape(buf) {
            let input = Input::Escape(escape, params.to_vec());
            self.advance(n);
            self.need_more = false;
            return Some(input);
        }
        if is_escape_prefix(buf) {
            return self.starved();
        }
        match decode_utf8(buf) {
            Utf8::Rune(c, n) => {
                self.advance(n);
                self.need_more = false;
                Some(Input::Rune(c))
            }
            Utf8::Incomplete => self.starved(),
            Utf8::Invalid => {
                debug!(byte = buf[0], "invalid UTF-8 in input");
                self.advance(1);
                self.need_more = false;
                Some(Input::Rune(char::REPLACEMENT_CHARACTER))
            }
        }
    }

    fn starved(&mut self) -> Option<Input> {
        if !self.is_full() {
            self.need_more = true;
            return None;
        }
        let lead = self.pending()[0];
        debug!(byte = lead, "input buffer full; taking leading byte literally");
        self.advance(1);
        self.need_more = false;
        Some(literal(lead))
    }

    /// Take a trailing lone `ESC` as the Escape key.
    ///
    /// Called after a read leaves exactly one `ESC` undecoded: no more bytes
    /// of a sequence are coming in the same burst.
    pub fn flush_lone_escape(&mut self) -> Option<Input> {
        if self.pending() != [ESC] {
            return None;
        }
        self.advance(1);
        self.need_more = false;
        Some(Input::key(Escape::ESCAPE_KEY))
    }
}

impl Default for InputBuffer {
    fn default() -> Self {
        Self::new()
    }
}

fn literal(b: u8) -> Input {
    match b {
        ESC => Input::key(Escape::ESCAPE_KEY),
        0x00..=0x7F => Input::Rune(char::from(b)),
        _ => Input::Rune(char::REPLACEMENT_CHARACTER),
    }
}

fn decode_utf8(buf: &[u8]) -> Utf8 {
    let head = &buf[..buf.len().min(4)];
    let valid = match std::str::from_utf8(head) {
        Ok(s) => s,
        Err(e) if e.valid_up_to() > 0 => match std::str::from_utf8(&head[..e.valid_up_to()]) {
            Ok(s) => s,
            Err(_) => return Utf8::Invalid,
        },
        Err(e) if e.error_len().is_none() => return Utf8::Incomplete,
        Err(_) => return Utf8::Invalid,
    };
    match valid.chars().next() {
        Some(c) => Utf8::Rune(c, c.len_utf8()),
        None => Utf8::Incomplete,
    }
}
