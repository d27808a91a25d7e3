//! ANSI codec: escape sequences, display attributes and mouse reports.
//!
//! Decoders return [`DecodeError`] on malformed input and never panic.
//! Encoders append to a `Vec<u8>` and are total.

mod attr;
mod escape;
mod mouse;
mod sgr;

pub use attr::{Attr, Color, Rgb, Style};
pub use escape::{
    decode_escape, is_escape_prefix, write_cursor_move, write_cursor_to, write_cursor_visible,
    write_dec_mode, write_erase_display, Escape, Input, BEL, CTRL_C, CTRL_L, CTRL_Z, ESC,
};
pub use mouse::{decode_mouse, MouseButton, MouseModifiers, MouseState};
pub use sgr::{decode_sgr, write_sgr_delta};

/// A malformed escape sequence parameter.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// An SGR parameter that is not a valid number or color component.
    #[error("invalid SGR parameter {index}: {param:?}")]
    Sgr {
        /// Zero-based index of the offending parameter.
        index: usize,
        /// The parameter text.
        param: String,
    },

    /// A malformed extended mouse report.
    #[error("invalid mouse report: {0}")]
    Mouse(&'static str),
}

impl DecodeError {
    pub(crate) fn sgr(index: usize, param: &[u8]) -> Self {
        Self::Sgr {
            index,
            param: String::from_utf8_lossy(param).into_owned(),
        }
    }
}
