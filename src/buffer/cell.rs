//! Cell: one terminal character position.
//!
//! A cell is a single rune plus its display attributes. The rune `'\0'` marks
//! a blank cell, which is drawn as a space.

use crate::ansi::Attr;
use unicode_width::UnicodeWidthChar;

/// A (rune, attribute) pair.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Cell {
    /// The character; `'\0'` for blank.
    pub rune: char,
    /// Display attributes.
    pub attr: Attr,
}

impl Cell {
    /// A blank cell with default attributes.
    pub const BLANK: Self = Self::new('\0', Attr::DEFAULT);

    /// Create a new cell.
    #[inline]
    pub const fn new(rune: char, attr: Attr) -> Self {
        Self { rune, attr }
    }

    /// Check whether the cell holds no rune.
    #[inline]
    pub const fn is_blank(&self) -> bool {
        self.rune == '\0'
    }

    /// The character to emit for this cell.
    #[inline]
    pub const fn display_char(&self) -> char {
        if self.is_blank() {
            ' '
        } else {
            self.rune
        }
    }

    /// Columns the terminal advances when this cell is written.
    #[inline]
    pub fn display_width(&self) -> usize {
        self.display_char().width().unwrap_or(0)
    }
}

impl std::fmt::Debug for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.attr.is_default() {
            write!(f, "Cell({:?})", self.rune)
        } else {
            write!(f, "Cell({:?}, {:?})", self.rune, self.attr)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ansi::Color;

    #[test]
    fn test_blank() {
        assert!(Cell::BLANK.is_blank());
        assert_eq!(Cell::BLANK.display_char(), ' ');
        assert_eq!(Cell::default(), Cell::BLANK);
    }

    #[test]
    fn test_cell_equality() {
        let a = Cell::new('A', Attr::fg(Color::RED));
        assert_eq!(a, Cell::new('A', Attr::fg(Color::RED)));
        assert_ne!(a, Cell::new('A', Attr::DEFAULT));
        assert_ne!(a, Cell::new('B', Attr::fg(Color::RED)));
    }

    #[test]
    fn test_display_width() {
        assert_eq!(Cell::new('x', Attr::DEFAULT).display_width(), 1);
        assert_eq!(Cell::new('中', Attr::DEFAULT).display_width(), 2);
        assert_eq!(Cell::BLANK.display_width(), 1);
    }
}
