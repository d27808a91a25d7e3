//! Attr: packed display attributes (colors and text style).
//!
//! # Layout
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  Attr (u64)                                                  │
//! ├─────────┬────────────────────────┬───────────────────────────┤
//! │ style   │  foreground            │  background               │
//! │ bits 0-7│  bits 8-34             │  bits 35-61               │
//! │         │  tag(3) | value(24)    │  tag(3) | value(24)       │
//! └─────────┴────────────────────────┴───────────────────────────┘
//! ```
//!
//! A zero `Attr` is the terminal default: no style, default colors.

use bitflags::bitflags;

/// True-color RGB representation.
#[derive(Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Rgb {
    /// Red channel (0-255)
    pub r: u8,
    /// Green channel (0-255)
    pub g: u8,
    /// Blue channel (0-255)
    pub b: u8,
}

impl Rgb {
    /// Create a new RGB color.
    #[inline]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Create from a 24-bit hex color (e.g., 0xFF5500).
    #[inline]
    pub const fn from_u32(hex: u32) -> Self {
        Self::new(
            ((hex >> 16) & 0xFF) as u8,
            ((hex >> 8) & 0xFF) as u8,
            (hex & 0xFF) as u8,
        )
    }

    /// Pack into a 24-bit value.
    #[inline]
    pub const fn to_u32(self) -> u32 {
        ((self.r as u32) << 16) | ((self.g as u32) << 8) | (self.b as u32)
    }
}

impl std::fmt::Debug for Rgb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl From<(u8, u8, u8)> for Rgb {
    #[inline]
    fn from((r, g, b): (u8, u8, u8)) -> Self {
        Self::new(r, g, b)
    }
}

bitflags! {
    /// Text style bits.
    ///
    /// ```
    /// use treadmill::Style;
    /// let style = Style::BOLD | Style::UNDERLINE;
    /// assert!(style.contains(Style::BOLD));
    /// ```
    #[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Style: u8 {
        /// Bold text
        const BOLD = 0b0000_0001;
        /// Dim/faint text
        const DIM = 0b0000_0010;
        /// Italic text
        const ITALIC = 0b0000_0100;
        /// Underlined text
        const UNDERLINE = 0b0000_1000;
        /// Blinking text
        const BLINK = 0b0001_0000;
        /// Reversed colors (fg/bg swapped)
        const REVERSE = 0b0010_0000;
        /// Hidden/invisible text
        const HIDDEN = 0b0100_0000;
        /// Strikethrough text
        const STRIKE = 0b1000_0000;
    }
}

impl std::fmt::Debug for Style {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        bitflags::parser::to_writer(self, f)
    }
}

/// A terminal color.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub enum Color {
    /// The terminal's default color.
    #[default]
    Default,
    /// One of the 8 basic colors (`30-37` / `40-47`).
    Ansi3(u8),
    /// One of the 16 basic and bright colors (`90-97` / `100-107` for 8-15).
    Ansi4(u8),
    /// An entry in the 256 color palette (`38;5;n`).
    Ansi8(u8),
    /// A 24-bit color (`38;2;r;g;b`).
    Rgb(Rgb),
}

impl Color {
    /// Black.
    pub const BLACK: Self = Self::Ansi3(0);
    /// Red.
    pub const RED: Self = Self::Ansi3(1);
    /// Green.
    pub const GREEN: Self = Self::Ansi3(2);
    /// Yellow.
    pub const YELLOW: Self = Self::Ansi3(3);
    /// Blue.
    pub const BLUE: Self = Self::Ansi3(4);
    /// Magenta.
    pub const MAGENTA: Self = Self::Ansi3(5);
    /// Cyan.
    pub const CYAN: Self = Self::Ansi3(6);
    /// White.
    pub const WHITE: Self = Self::Ansi3(7);

    const TAG_3: u64 = 1;
    const TAG_4: u64 = 2;
    const TAG_8: u64 = 3;
    const TAG_24: u64 = 4;

    /// Pack into the 27-bit field used by [`Attr`].
    const fn pack(self) -> u64 {
        match self {
            Self::Default => 0,
            Self::Ansi3(n) => (Self::TAG_3 << 24) | (n & 0x07) as u64,
            // The low half of the 16 color palette has no distinct encoding.
            Self::Ansi4(n) if n & 0x0F < 8 => (Self::TAG_3 << 24) | (n & 0x07) as u64,
            Self::Ansi4(n) => (Self::TAG_4 << 24) | (n & 0x0F) as u64,
            Self::Ansi8(n) => (Self::TAG_8 << 24) | n as u64,
            Self::Rgb(rgb) => (Self::TAG_24 << 24) | rgb.to_u32() as u64,
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    const fn unpack(field: u64) -> Self {
        let value = field & 0x00FF_FFFF;
        match field >> 24 {
            Self::TAG_3 => Self::Ansi3(value as u8),
            Self::TAG_4 => Self::Ansi4(value as u8),
            Self::TAG_8 => Self::Ansi8(value as u8),
            Self::TAG_24 => Self::Rgb(Rgb::from_u32(value as u32)),
            _ => Self::Default,
        }
    }
}

/// Packed display attributes: foreground, background and [`Style`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Attr(u64);

impl Attr {
    /// Default attributes (zero).
    pub const DEFAULT: Self = Self(0);

    const STYLE_MASK: u64 = 0xFF;
    const FG_SHIFT: u32 = 8;
    const BG_SHIFT: u32 = 35;
    const COLOR_MASK: u64 = (1 << 27) - 1;

    /// Attributes with only a foreground color.
    #[inline]
    pub const fn fg(color: Color) -> Self {
        Self::DEFAULT.with_fg(color)
    }

    /// Attributes with only a background color.
    #[inline]
    pub const fn bg(color: Color) -> Self {
        Self::DEFAULT.with_bg(color)
    }

    /// Attributes with only a style.
    #[inline]
    pub const fn style(style: Style) -> Self {
        Self(style.bits() as u64)
    }

    /// Raw packed bits.
    #[inline]
    pub const fn bits(self) -> u64 {
        self.0
    }

    /// Check for the default (all-zero) attributes.
    #[inline]
    pub const fn is_default(self) -> bool {
        self.0 == 0
    }

    /// Foreground color.
    #[inline]
    pub const fn fg_color(self) -> Color {
        Color::unpack((self.0 >> Self::FG_SHIFT) & Self::COLOR_MASK)
    }

    /// Background color.
    #[inline]
    pub const fn bg_color(self) -> Color {
        Color::unpack((self.0 >> Self::BG_SHIFT) & Self::COLOR_MASK)
    }

    /// Text style bits.
    #[inline]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn text_style(self) -> Style {
        Style::from_bits_truncate((self.0 & Self::STYLE_MASK) as u8)
    }

    /// Replace the foreground color.
    #[inline]
    #[must_use]
    pub const fn with_fg(self, color: Color) -> Self {
        let cleared = self.0 & !(Self::COLOR_MASK << Self::FG_SHIFT);
        Self(cleared | (color.pack() << Self::FG_SHIFT))
    }

    /// Replace the background color.
    #[inline]
    #[must_use]
    pub const fn with_bg(self, color: Color) -> Self {
        let cleared = self.0 & !(Self::COLOR_MASK << Self::BG_SHIFT);
        Self(cleared | (color.pack() << Self::BG_SHIFT))
    }

    /// Replace the style bits.
    #[inline]
    #[must_use]
    pub const fn with_style(self, style: Style) -> Self {
        Self((self.0 & !Self::STYLE_MASK) | style.bits() as u64)
    }

    /// Add style bits.
    #[inline]
    #[must_use]
    pub const fn add_style(self, style: Style) -> Self {
        Self(self.0 | style.bits() as u64)
    }

    /// Remove style bits.
    #[inline]
    #[must_use]
    pub const fn remove_style(self, style: Style) -> Self {
        Self(self.0 & !(style.bits() as u64))
    }
}

impl std::fmt::Debug for Attr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_default() {
            return f.write_str("Attr(default)");
        }
        f.debug_struct("Attr")
            .field("fg", &self.fg_color())
            .field("bg", &self.bg_color())
            .field("style", &self.text_style())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_zero() {
        assert_eq!(Attr::DEFAULT.bits(), 0);
        assert_eq!(Attr::DEFAULT.fg_color(), Color::Default);
        assert_eq!(Attr::DEFAULT.bg_color(), Color::Default);
        assert!(Attr::DEFAULT.text_style().is_empty());
    }

    #[test]
    fn test_color_fields_are_independent() {
        let a = Attr::fg(Color::Rgb(Rgb::new(255, 128, 0)))
            .with_bg(Color::Ansi8(200))
            .with_style(Style::BOLD | Style::STRIKE);
        assert_eq!(a.fg_color(), Color::Rgb(Rgb::new(255, 128, 0)));
        assert_eq!(a.bg_color(), Color::Ansi8(200));
        assert_eq!(a.text_style(), Style::BOLD | Style::STRIKE);

        let b = a.with_fg(Color::Default);
        assert_eq!(b.fg_color(), Color::Default);
        assert_eq!(b.bg_color(), Color::Ansi8(200));
    }

    #[test]
    fn test_palette_tags_are_distinct() {
        let three = Attr::fg(Color::Ansi3(1));
        let four = Attr::fg(Color::Ansi4(9));
        let eight = Attr::fg(Color::Ansi8(1));
        assert_ne!(three, four);
        assert_ne!(three, eight);
        assert_eq!(four.fg_color(), Color::Ansi4(9));
        assert_eq!(Attr::fg(Color::Ansi4(1)), three);
    }

    #[test]
    fn test_style_add_remove() {
        let a = Attr::style(Style::BOLD).add_style(Style::ITALIC);
        assert_eq!(a.text_style(), Style::BOLD | Style::ITALIC);
        assert_eq!(a.remove_style(Style::BOLD).text_style(), Style::ITALIC);
    }

    #[test]
    fn test_rgb_round_trip() {
        let rgb = Rgb::from_u32(0xFF8000);
        assert_eq!(rgb, Rgb::new(255, 128, 0));
        assert_eq!(rgb.to_u32(), 0xFF8000);
    }
}
