//! Extended (SGR, mode 1006) mouse reports: `CSI < b ; x ; y M|m`.

use super::escape::Escape;
use super::DecodeError;
use crate::layout::Point;
use bitflags::bitflags;

/// Which button a report refers to.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum MouseButton {
    /// Primary button.
    Left,
    /// Middle button.
    Middle,
    /// Secondary button.
    Right,
    /// No button (motion without buttons held).
    None,
    /// Wheel scrolled up.
    WheelUp,
    /// Wheel scrolled down.
    WheelDown,
    /// Additional buttons (8-11), numbered from 8.
    Extra(u8),
}

bitflags! {
    /// Modifier keys held during a mouse event.
    #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
    pub struct MouseModifiers: u8 {
        /// Shift key.
        const SHIFT = 4;
        /// Meta (alt) key.
        const META = 8;
        /// Control key.
        const CTRL = 16;
    }
}

/// Decoded button and modifier state of one mouse report.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct MouseState {
    /// Button the report is about.
    pub button: MouseButton,
    /// Modifier keys.
    pub modifiers: MouseModifiers,
    /// Set when the report is for motion rather than a click.
    pub motion: bool,
    /// `M` (pressed) rather than `m` (released).
    pub pressed: bool,
}

const MOTION: u32 = 32;
const WHEEL: u32 = 64;
const EXTRA: u32 = 128;

/// Decode an extended mouse report from an escape and its parameters.
///
/// Returns the button state and the 1-based screen point of the event.
#[allow(clippy::cast_possible_truncation)]
pub fn decode_mouse(escape: Escape, params: &[u8]) -> Result<(MouseState, Point), DecodeError> {
    let pressed = match escape {
        Escape::Csi(b'M') => true,
        Escape::Csi(b'm') => false,
        _ => return Err(DecodeError::Mouse("not a mouse report")),
    };
    let Some(rest) = params.strip_prefix(b"<") else {
        return Err(DecodeError::Mouse("missing '<' marker"));
    };

    let mut fields = [0u32; 3];
    let mut count = 0;
    for part in rest.split(|&b| b == b';') {
        if count == fields.len() {
            return Err(DecodeError::Mouse("too many parameters"));
        }
        fields[count] = std::str::from_utf8(part)
            .ok()
            .and_then(|s| s.parse().ok())
            .ok_or(DecodeError::Mouse("invalid number"))?;
        count += 1;
    }
    if count != fields.len() {
        return Err(DecodeError::Mouse("expected three parameters"));
    }

    let [b, x, y] = fields;
    if x == 0 || y == 0 {
        return Err(DecodeError::Mouse("coordinates are 1-based"));
    }
    let x = i32::try_from(x).map_err(|_| DecodeError::Mouse("column out of range"))?;
    let y = i32::try_from(y).map_err(|_| DecodeError::Mouse("row out of range"))?;

    let low = b & 3;
    let button = if b & EXTRA != 0 {
        MouseButton::Extra(8 + low as u8)
    } else if b & WHEEL != 0 {
        match low {
            0 => MouseButton::WheelUp,
            1 => MouseButton::WheelDown,
            _ => return Err(DecodeError::Mouse("unknown wheel button")),
        }
    } else {
        match low {
            0 => MouseButton::Left,
            1 => MouseButton::Middle,
            2 => MouseButton::Right,
            _ => MouseButton::None,
        }
    };

    let state = MouseState {
        button,
        modifiers: MouseModifiers::from_bits_truncate((b & 0x1C) as u8),
        motion: b & MOTION != 0,
        pressed,
    };
    Ok((state, Point::new(x, y)))
}
