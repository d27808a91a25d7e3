//! Escape sequences: decoding from terminal input and encoding for output.
//!
//! Recognized forms, with `ESC = 0x1B`:
//!
//! | Form                    | Value              | Parameters            |
//! |-------------------------|--------------------|-----------------------|
//! | C0 control, DEL         | `Control(b)`       | none                  |
//! | `ESC [ p.. i.. F`       | `Csi(F)`           | parameter bytes       |
//! | `ESC O F`               | `Ss3(F)`           | none                  |
//! | `ESC ] .. ST`           | `Osc`              | string payload        |
//! | `ESC P .. ST`           | `Dcs`              | string payload        |
//! | `ESC ^ .. ST`           | `Pm`               | string payload        |
//! | `ESC _ .. ST`           | `Apc`              | string payload        |
//! | `ESC i.. F`             | `Esc(F)`           | intermediate bytes    |
//!
//! The UTF-8 encoded C1 introducers (`U+0090`, `U+009B`, `U+009D`, `U+009E`,
//! `U+009F`) decode to the same values as their 7-bit forms; the remaining C1
//! controls decode as `Control`. Encoding always produces the 7-bit form and
//! terminates strings with `ESC \`.

use crate::layout::Point;
use std::io::Write;

/// Escape character.
pub const ESC: u8 = 0x1B;
/// Bell; also terminates string sequences.
pub const BEL: u8 = 0x07;

/// Ctrl-C (end of text).
pub const CTRL_C: u8 = 0x03;
/// Ctrl-L (form feed).
pub const CTRL_L: u8 = 0x0C;
/// Ctrl-Z (substitute).
pub const CTRL_Z: u8 = 0x1A;

/// A decoded escape sequence or control character.
///
/// The parameter/intermediate bytes or string payload travel alongside the
/// value (see [`Input::Escape`]).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Escape {
    /// A single control character: C0, DEL, or a C1 code point.
    Control(u32),
    /// `ESC` followed by optional intermediates and a final byte.
    Esc(u8),
    /// Control Sequence Introducer with its final byte.
    Csi(u8),
    /// Single Shift 3 with the following byte (application keypad keys).
    Ss3(u8),
    /// Operating System Command string.
    Osc,
    /// Device Control String.
    Dcs,
    /// Privacy Message string.
    Pm,
    /// Application Program Command string.
    Apc,
}

impl Escape {
    /// The escape key, reported as a lone `ESC`.
    pub const ESCAPE_KEY: Self = Self::Control(ESC as u32);

    /// Check for a specific control character.
    #[inline]
    pub const fn is_control(self, b: u8) -> bool {
        matches!(self, Self::Control(c) if c == b as u32)
    }

    /// Append the 7-bit encoding of this escape with its parameters.
    pub fn encode(self, params: &[u8], out: &mut Vec<u8>) {
        match self {
            Self::Control(c) => {
                if let Some(ch) = char::from_u32(c) {
                    let mut buf = [0u8; 4];
                    out.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
                }
            }
            Self::Esc(f) => {
                out.push(ESC);
                out.extend_from_slice(params);
                out.push(f);
            }
            Self::Csi(f) => {
                out.extend_from_slice(b"\x1b[");
                out.extend_from_slice(params);
                out.push(f);
            }
            Self::Ss3(f) => {
                out.extend_from_slice(&[ESC, b'O', f]);
            }
            Self::Osc | Self::Dcs | Self::Pm | Self::Apc => {
                out.push(ESC);
                out.push(string_introducer(self));
                out.extend_from_slice(params);
                out.extend_from_slice(b"\x1b\\");
            }
        }
    }
}

/// A single decoded input event.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Input {
    /// A printable (or otherwise non-escape) Unicode scalar.
    Rune(char),
    /// An escape sequence or control with its parameter bytes.
    Escape(Escape, Vec<u8>),
}

impl Input {
    /// Shorthand for a parameterless escape.
    #[inline]
    pub const fn key(escape: Escape) -> Self {
        Self::Escape(escape, Vec::new())
    }

    /// The rune, if this is a rune event.
    #[inline]
    pub const fn rune(&self) -> Option<char> {
        match self {
            Self::Rune(c) => Some(*c),
            Self::Escape(..) => None,
        }
    }

    /// Check for a specific control character.
    #[inline]
    pub fn is_control(&self, b: u8) -> bool {
        matches!(self, Self::Escape(e, _) if e.is_control(b))
    }

    /// Cursor key direction (`A` up, `B` down, `C` right, `D` left), in
    /// either normal (`CSI`) or application (`SS3`) mode.
    pub fn arrow(&self) -> Option<u8> {
        match self {
            Self::Escape(Escape::Csi(f @ b'A'..=b'D'), params)
                if params.iter().all(|b| b.is_ascii_digit() || *b == b';') =>
            {
                Some(*f)
            }
            Self::Escape(Escape::Ss3(f @ b'A'..=b'D'), _) => Some(*f),
            _ => None,
        }
    }

    /// Append the canonical encoding of this event.
    pub fn encode(&self, out: &mut Vec<u8>) {
        match self {
            Self::Rune(c) => {
                let mut buf = [0u8; 4];
                out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
            }
            Self::Escape(e, params) => e.encode(params, out),
        }
    }
}

impl std::fmt::Display for Input {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rune(c) => write!(f, "{c:?}"),
            Self::Escape(Escape::Control(c), _) => write!(f, "C({c:#04x})"),
            Self::Escape(e, params) => {
                write!(f, "{e:?} {:?}", String::from_utf8_lossy(params))
            }
        }
    }
}

const fn string_introducer(e: Escape) -> u8 {
    match e {
        Escape::Dcs => b'P',
        Escape::Pm => b'^',
        Escape::Apc => b'_',
        _ => b']',
    }
}

/// Check whether `buf` begins with something that may start an escape
/// sequence: `ESC` or a UTF-8 encoded C1 introducer (or its first byte).
pub fn is_escape_prefix(buf: &[u8]) -> bool {
    match buf {
        [ESC, ..] | [0xC2] => true,
        [0xC2, c1, ..] => c1_introducer(*c1).is_some(),
        _ => false,
    }
}

/// Map the second byte of a UTF-8 encoded C1 introducer to its 7-bit form.
const fn c1_introducer(b: u8) -> Option<u8> {
    match b {
        0x90 => Some(b'P'),
        0x9B => Some(b'['),
        0x9D => Some(b']'),
        0x9E => Some(b'^'),
        0x9F => Some(b'_'),
        _ => None,
    }
}

/// Decode one escape sequence from the front of `buf`.
///
/// Returns the escape, its parameter bytes (a sub-slice of `buf`), and the
/// number of bytes consumed. Returns `None` if `buf` does not begin with an
/// escape or control, or if the sequence is incomplete; use
/// [`is_escape_prefix`] to tell the two apart.
pub fn decode_escape(buf: &[u8]) -> Option<(Escape, &[u8], usize)> {
    match *buf.first()? {
        ESC => decode_after_introducer(buf, 1, buf.get(1).copied()?),
        b @ (0x00..=0x1F | 0x7F) => Some((Escape::Control(u32::from(b)), &[], 1)),
        0xC2 => {
            let c1 = *buf.get(1)?;
            if !(0x80..=0x9F).contains(&c1) {
                return None;
            }
            match c1_introducer(c1) {
                Some(intro) => decode_after_introducer(buf, 2, intro),
                None => Some((Escape::Control(u32::from(c1)), &[], 2)),
            }
        }
        _ => None,
    }
}

/// Decode the rest of a sequence whose introducer occupies `buf[..start]`.
///
/// For 7-bit sequences `intro` is the byte following `ESC` (and is itself
/// part of the sequence); for C1 sequences it is the equivalent 7-bit byte.
fn decode_after_introducer(buf: &[u8], start: usize, intro: u8) -> Option<(Escape, &[u8], usize)> {
    let c1 = start == 2;
    // Offset of the first byte after the introducer proper.
    let body = if c1 { start } else { start + 1 };
    match intro {
        b'[' => decode_csi(buf, start, body),
        b']' | b'P' | b'^' | b'_' => {
            let kind = match intro {
                b']' => Escape::Osc,
                b'P' => Escape::Dcs,
                b'^' => Escape::Pm,
                _ => Escape::Apc,
            };
            decode_string(buf, body, kind)
        }
        _ if c1 => None,
        b'O' => {
            let f = *buf.get(body)?;
            if (0x20..=0x7E).contains(&f) {
                Some((Escape::Ss3(f), &[], body + 1))
            } else {
                Some((Escape::ESCAPE_KEY, &[], 1))
            }
        }
        0x20..=0x2F => {
            // Intermediates, then a final byte.
            let mut i = start;
            while let Some(&b) = buf.get(i) {
                match b {
                    0x20..=0x2F => i += 1,
                    0x30..=0x7E => return Some((Escape::Esc(b), &buf[start..i], i + 1)),
                    _ => return Some((Escape::ESCAPE_KEY, &[], 1)),
                }
            }
            None
        }
        0x30..=0x7E => Some((Escape::Esc(intro), &[], start + 1)),
        // ESC followed by ESC, a control, or a non-ASCII byte: a lone escape key.
        _ => Some((Escape::ESCAPE_KEY, &[], 1)),
    }
}

/// `start` is the length of the introducer prefix before `[`.
fn decode_csi(buf: &[u8], start: usize, body: usize) -> Option<(Escape, &[u8], usize)> {
    let mut i = body;
    while let Some(&b) = buf.get(i) {
        match b {
            0x20..=0x3F => i += 1,
            0x40..=0x7E => return Some((Escape::Csi(b), &buf[body..i], i + 1)),
            // Not a valid final byte: the introducer stands alone.
            _ => {
                return Some(if start == 2 {
                    (Escape::Control(0x9B), &[], 2)
                } else {
                    (Escape::ESCAPE_KEY, &[], 1)
                });
            }
        }
    }
    None
}

fn decode_string(buf: &[u8], body: usize, kind: Escape) -> Option<(Escape, &[u8], usize)> {
    let mut i = body;
    while let Some(&b) = buf.get(i) {
        match b {
            BEL => return Some((kind, &buf[body..i], i + 1)),
            ESC => match buf.get(i + 1) {
                Some(b'\\') => return Some((kind, &buf[body..i], i + 2)),
                // Any other escape aborts the string; it is left for the next decode.
                Some(_) => return Some((kind, &buf[body..i], i)),
                None => return None,
            },
            0xC2 if buf.get(i + 1) == Some(&0x9C) => {
                return Some((kind, &buf[body..i], i + 2));
            }
            _ => i += 1,
        }
    }
    None
}

/// Write a cursor position sequence (`CUP`) for a 1-based screen point.
pub fn write_cursor_to(out: &mut Vec<u8>, p: Point) {
    if p == Point::HOME {
        out.extend_from_slice(b"\x1b[H");
    } else if p.x == 1 {
        let _ = write!(out, "\x1b[{}H", p.y);
    } else {
        let _ = write!(out, "\x1b[{};{}H", p.y, p.x);
    }
}

/// Write a relative cursor move: `A` up, `B` down, `C` forward, `D` back.
pub fn write_cursor_move(out: &mut Vec<u8>, dir: u8, n: i32) {
    if n <= 0 {
        return;
    }
    if n == 1 {
        out.extend_from_slice(&[ESC, b'[', dir]);
    } else {
        let _ = write!(out, "\x1b[{n}");
        out.push(dir);
    }
}

/// Write an erase-display sequence (`ED`); mode 2 clears the whole screen.
pub fn write_erase_display(out: &mut Vec<u8>, mode: u8) {
    let _ = write!(out, "\x1b[{mode}J");
}

/// Write a DEC private mode set (`h`) or reset (`l`) sequence.
pub fn write_dec_mode(out: &mut Vec<u8>, mode: u16, enable: bool) {
    let _ = write!(out, "\x1b[?{mode}{}", if enable { 'h' } else { 'l' });
}

/// Write a cursor visibility sequence (`DECTCEM`).
pub fn write_cursor_visible(out: &mut Vec<u8>, visible: bool) {
    write_dec_mode(out, 25, visible);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(buf: &[u8]) -> Option<(Escape, Vec<u8>, usize)> {
        decode_escape(buf).map(|(e, p, n)| (e, p.to_vec(), n))
    }

    #[test]
    fn test_decode_controls() {
        assert_eq!(decode(b"\x03x"), Some((Escape::Control(3), vec![], 1)));
        assert_eq!(decode(b"\x7f"), Some((Escape::Control(0x7F), vec![], 1)));
        assert_eq!(decode(b"a"), None);
        assert_eq!(decode("é".as_bytes()), None);
    }

    #[test]
    fn test_decode_csi() {
        assert_eq!(decode(b"\x1b[A"), Some((Escape::Csi(b'A'), vec![], 3)));
        assert_eq!(
            decode(b"\x1b[1;31mX"),
            Some((Escape::Csi(b'm'), b"1;31".to_vec(), 7))
        );
        assert_eq!(
            decode(b"\x1b[<0;3;4M"),
            Some((Escape::Csi(b'M'), b"<0;3;4".to_vec(), 10))
        );
    }

    #[test]
    fn test_decode_c1_matches_7bit() {
        let seven = decode(b"\x1b[2J").map(|(e, p, _)| (e, p));
        let eight = decode(b"\xc2\x9b2J").map(|(e, p, _)| (e, p));
        assert_eq!(seven, eight);
        assert_eq!(decode(b"\xc2\x85"), Some((Escape::Control(0x85), vec![], 2)));
    }

    #[test]
    fn test_decode_strings() {
        assert_eq!(
            decode(b"\x1b]0;title\x1b\\"),
            Some((Escape::Osc, b"0;title".to_vec(), 11))
        );
        assert_eq!(
            decode(b"\x1b]0;t\x07"),
            Some((Escape::Osc, b"0;t".to_vec(), 6))
        );
        assert_eq!(decode(b"\x1bPq\x1b\\"), Some((Escape::Dcs, b"q".to_vec(), 5)));
        assert_eq!(decode(b"\x1b_x\xc2\x9c"), Some((Escape::Apc, b"x".to_vec(), 5)));
    }

    #[test]
    fn test_decode_esc_forms() {
        assert_eq!(decode(b"\x1bOP"), Some((Escape::Ss3(b'P'), vec![], 3)));
        assert_eq!(decode(b"\x1bx"), Some((Escape::Esc(b'x'), vec![], 2)));
        assert_eq!(decode(b"\x1b(B"), Some((Escape::Esc(b'B'), b"(".to_vec(), 3)));
        assert_eq!(decode(b"\x1b\x1b[A"), Some((Escape::ESCAPE_KEY, vec![], 1)));
        assert_eq!(decode("\x1bé".as_bytes()), Some((Escape::ESCAPE_KEY, vec![], 1)));
    }

    #[test]
    fn test_partial_sequences() {
        for partial in [
            &b"\x1b"[..],
            b"\x1b[",
            b"\x1b[1;3",
            b"\x1b]0;ti",
            b"\x1b]0;ti\x1b",
            b"\x1bO",
            b"\x1b(",
            b"\xc2",
            b"\xc2\x9b1",
        ] {
            assert_eq!(decode(partial), None, "{partial:?}");
            assert!(is_escape_prefix(partial), "{partial:?}");
        }
        assert!(!is_escape_prefix(b"a"));
        assert!(!is_escape_prefix("é".as_bytes()));
    }

    #[test]
    fn test_invalid_csi_final() {
        assert_eq!(decode(b"\x1b[1\x03"), Some((Escape::ESCAPE_KEY, vec![], 1)));
    }

    #[test]
    fn test_encode_canonical() {
        let mut out = Vec::new();
        Escape::Csi(b'm').encode(b"0", &mut out);
        Escape::Osc.encode(b"2;x", &mut out);
        Escape::Control(0x85).encode(&[], &mut out);
        assert_eq!(out, b"\x1b[0m\x1b]2;x\x1b\\\xc2\x85");
    }

    #[test]
    fn test_arrow() {
        assert_eq!(Input::key(Escape::Csi(b'A')).arrow(), Some(b'A'));
        assert_eq!(Input::key(Escape::Ss3(b'D')).arrow(), Some(b'D'));
        assert_eq!(Input::Escape(Escape::Csi(b'C'), b"1;5".to_vec()).arrow(), Some(b'C'));
        assert_eq!(Input::Escape(Escape::Csi(b'A'), b"<1".to_vec()).arrow(), None);
        assert_eq!(Input::Rune('A').arrow(), None);
    }

    #[test]
    fn test_cursor_sequences() {
        let mut out = Vec::new();
        write_cursor_to(&mut out, Point::HOME);
        assert_eq!(out, b"\x1b[H");
        out.clear();
        write_cursor_to(&mut out, Point::new(1, 6));
        assert_eq!(out, b"\x1b[6H");
        out.clear();
        write_cursor_to(&mut out, Point::new(11, 6));
        assert_eq!(out, b"\x1b[6;11H");
        out.clear();
        write_cursor_move(&mut out, b'C', 1);
        write_cursor_move(&mut out, b'A', 3);
        write_cursor_move(&mut out, b'B', 0);
        assert_eq!(out, b"\x1b[C\x1b[3A");
        out.clear();
        write_dec_mode(&mut out, 1049, true);
        write_cursor_visible(&mut out, false);
        assert_eq!(out, b"\x1b[?1049h\x1b[?25l");
    }
}
