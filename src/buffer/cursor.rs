//! Cursor state: position, current attributes and visibility.
//!
//! The real screen's cursor remembers what was last emitted so that moves and
//! attribute changes cost as few bytes as possible.

use super::cell::Cell;
use crate::ansi::Attr;
use crate::layout::Point;
use crate::terminal::OutputBuffer;

/// The tuple (position, attribute, visibility).
///
/// A position of [`Point::ZERO`] means "unknown": the next move is absolute.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct CursorState {
    /// 1-based screen position.
    pub point: Point,
    /// Attributes applied to the next write.
    pub attr: Attr,
    /// Whether the cursor is shown.
    pub visible: bool,
}

impl Default for CursorState {
    fn default() -> Self {
        Self::new()
    }
}

impl CursorState {
    /// A cursor at home with default attributes, hidden.
    pub const fn new() -> Self {
        Self {
            point: Point::HOME,
            attr: Attr::DEFAULT,
            visible: false,
        }
    }

    /// Forget the position so the next move is absolute.
    #[inline]
    pub const fn forget_position(&mut self) {
        self.point = Point::ZERO;
    }

    /// Check whether the position is known.
    #[inline]
    pub fn knows_position(&self) -> bool {
        self.point != Point::ZERO
    }

    /// Move to `p` with the fewest bytes: nothing, `CR LF`, a relative move,
    /// or an absolute move.
    pub fn move_to(&mut self, out: &mut OutputBuffer, p: Point) {
        if self.point == p {
            return;
        }
        let mut abs = OutputBuffer::with_capacity(16);
        abs.cursor_to(p);

        if self.knows_position() {
            let rel = self.relative_move(p);
            if rel.len() < abs.len() {
                out.write_raw(rel.as_bytes());
                self.point = p;
                return;
            }
        }
        out.write_raw(abs.as_bytes());
        self.point = p;
    }

    fn relative_move(&self, p: Point) -> OutputBuffer {
        let mut rel = OutputBuffer::with_capacity(16);
        let from = self.point;
        if p.x == 1 && p.y == from.y + 1 {
            rel.write_raw(b"\r\n");
            return rel;
        }
        if p.x == 1 {
            rel.write_raw(b"\r");
        } else if p.x > from.x {
            rel.cursor_move(b'C', p.x - from.x);
        } else {
            rel.cursor_move(b'D', from.x - p.x);
        }
        if p.y > from.y {
            rel.cursor_move(b'B', p.y - from.y);
        } else {
            rel.cursor_move(b'A', from.y - p.y);
        }
        rel
    }

    /// Emit the SGR delta to `attr` and remember it.
    #[inline]
    pub fn merge_attr(&mut self, out: &mut OutputBuffer, attr: Attr) {
        out.sgr_delta(self.attr, attr);
        self.attr = attr;
    }

    /// Write a cell at the current position, then advance.
    ///
    /// Past the right edge (`max_x`) or after a rune that is not exactly one
    /// column wide the position becomes unknown.
    pub fn put(&mut self, out: &mut OutputBuffer, cell: Cell, max_x: i32) {
        self.merge_attr(out, cell.attr);
        out.push_char(cell.display_char());
        if cell.display_width() == 1 && self.point.x + 1 < max_x {
            self.point.x += 1;
        } else {
            self.forget_position();
        }
    }

    /// Emit a visibility change if needed.
    #[inline]
    pub fn show(&mut self, out: &mut OutputBuffer, visible: bool) {
        if self.visible != visible {
            out.cursor_visible(visible);
            self.visible = visible;
        }
    }
}
