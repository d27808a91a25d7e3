//! Grid: a rectangular array of cells.
//!
//! Runes and attributes live in parallel row-major arrays with a row
//! `stride`. The grid's bounding box may start anywhere; screen grids start at
//! `(1, 1)`.
//!
//! Drawing goes through [`GridMut`], a borrowed view that clips every write to
//! a sub-rectangle and may translate coordinates. Views share the grid's
//! storage, so a sub-grid is a window into its parent rather than a copy.

use super::cell::Cell;
use crate::ansi::Attr;
use crate::layout::{Point, Rect};
use unicode_width::UnicodeWidthChar;

const TAB_STOP: i32 = 8;

/// A rectangular array of (rune, attribute) cells.
#[derive(Clone, PartialEq, Eq)]
pub struct Grid {
    rect: Rect,
    stride: usize,
    runes: Vec<char>,
    attrs: Vec<Attr>,
}

impl Grid {
    /// Create a blank grid covering `rect`.
    #[allow(clippy::cast_sign_loss)]
    pub fn new(rect: Rect) -> Self {
        let rect = if rect.is_empty() { Rect::ZERO } else { rect };
        let area = rect.area();
        Self {
            rect,
            stride: rect.width() as usize,
            runes: vec!['\0'; area],
            attrs: vec![Attr::DEFAULT; area],
        }
    }

    /// Create a blank screen grid of `width × height` cells at `(1, 1)`.
    pub fn with_size(width: u16, height: u16) -> Self {
        Self::new(Rect::from_size(width, height))
    }

    /// Bounding box.
    #[inline]
    pub const fn rect(&self) -> Rect {
        self.rect
    }

    /// Cells per row.
    #[inline]
    pub const fn stride(&self) -> usize {
        self.stride
    }

    /// Number of cells.
    #[inline]
    pub fn len(&self) -> usize {
        self.runes.len()
    }

    /// Check whether the grid has no cells.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.runes.is_empty()
    }

    /// Map a point to its array index; `None` when out of bounds.
    #[inline]
    #[allow(clippy::cast_sign_loss)]
    pub const fn index(&self, p: Point) -> Option<usize> {
        if !self.rect.contains(p) {
            return None;
        }
        let row = (p.y - self.rect.min.y) as usize;
        let col = (p.x - self.rect.min.x) as usize;
        Some(row * self.stride + col)
    }

    /// Cell at `p`.
    #[inline]
    pub fn get(&self, p: Point) -> Option<Cell> {
        self.index(p).map(|i| Cell::new(self.runes[i], self.attrs[i]))
    }

    /// Set the cell at `p`; returns `false` (and does nothing) when out of bounds.
    #[inline]
    pub fn set(&mut self, p: Point, cell: Cell) -> bool {
        match self.index(p) {
            Some(i) => {
                self.runes[i] = cell.rune;
                self.attrs[i] = cell.attr;
                true
            }
            None => false,
        }
    }

    /// Rune array (row-major).
    #[inline]
    pub fn runes(&self) -> &[char] {
        &self.runes
    }

    /// Attribute array (row-major).
    #[inline]
    pub fn attrs(&self) -> &[Attr] {
        &self.attrs
    }

    /// Reallocate for a new bounding box, discarding contents.
    ///
    /// Resizing to the current bounds does nothing and returns `false`.
    pub fn resize(&mut self, rect: Rect) -> bool {
        if rect == self.rect {
            return false;
        }
        *self = Self::new(rect);
        true
    }

    /// Blank every cell.
    pub fn clear(&mut self) {
        self.runes.fill('\0');
        self.attrs.fill(Attr::DEFAULT);
    }

    /// A view of the whole grid.
    #[inline]
    pub fn view(&mut self) -> GridMut<'_> {
        let clip = self.rect;
        GridMut {
            grid: self,
            clip,
            offset: Point::ZERO,
        }
    }

    /// A view restricted to `rect`.
    #[inline]
    pub fn sub(&mut self, rect: Rect) -> GridMut<'_> {
        let clip = self.rect.intersect(&rect);
        GridMut {
            grid: self,
            clip,
            offset: Point::ZERO,
        }
    }

    /// Iterate over every point in row-major order.
    pub fn points(&self) -> impl Iterator<Item = Point> {
        let r = self.rect;
        (r.min.y..r.max.y).flat_map(move |y| (r.min.x..r.max.x).map(move |x| Point::new(x, y)))
    }
}

impl std::fmt::Debug for Grid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Grid {:?}", self.rect)?;
        for row in self.runes.chunks(self.stride.max(1)) {
            let line: String = row.iter().map(|&c| if c == '\0' { '.' } else { c }).collect();
            writeln!(f, "  {line}")?;
        }
        Ok(())
    }
}

/// A clipped, optionally translated, mutable view of a [`Grid`].
///
/// Coordinates passed to a view are "caller" coordinates: they are shifted by
/// the view's offset to reach grid coordinates, then clipped.
pub struct GridMut<'a> {
    grid: &'a mut Grid,
    clip: Rect,
    offset: Point,
}

impl GridMut<'_> {
    /// Visible bounds in caller coordinates.
    #[inline]
    pub fn rect(&self) -> Rect {
        self.clip.shifted(Point::new(-self.offset.x, -self.offset.y))
    }

    /// Cell at `p`, if visible.
    #[inline]
    pub fn get(&self, p: Point) -> Option<Cell> {
        let q = p + self.offset;
        if self.clip.contains(q) {
            self.grid.get(q)
        } else {
            None
        }
    }

    /// Set the cell at `p`; out-of-view writes are skipped.
    #[inline]
    pub fn set(&mut self, p: Point, cell: Cell) -> bool {
        let q = p + self.offset;
        self.clip.contains(q) && self.grid.set(q, cell)
    }

    /// Set a rune and attribute at `p`.
    #[inline]
    pub fn put(&mut self, p: Point, rune: char, attr: Attr) -> bool {
        self.set(p, Cell::new(rune, attr))
    }

    /// Fill every visible cell of `rect` with `cell`.
    pub fn fill_rect(&mut self, rect: Rect, cell: Cell) {
        let r = rect.intersect(&self.rect());
        for y in r.min.y..r.max.y {
            for x in r.min.x..r.max.x {
                self.set(Point::new(x, y), cell);
            }
        }
    }

    /// Fill the whole view with `cell`.
    pub fn fill(&mut self, cell: Cell) {
        self.fill_rect(self.rect(), cell);
    }

    /// Blank the whole view.
    pub fn clear(&mut self) {
        self.fill(Cell::BLANK);
    }

    /// Write `s` left to right from `p` without wrapping.
    ///
    /// Control and zero-width characters are skipped. Returns the point just
    /// past the last rune.
    pub fn write_str(&mut self, p: Point, s: &str, attr: Attr) -> Point {
        let mut q = p;
        for ch in s.chars() {
            if !matches!(ch.width(), Some(w) if w > 0) {
                continue;
            }
            self.put(q, ch, attr);
            q.x += 1;
        }
        q
    }

    /// Lay out `s` from `p`, wrapping at the right edge of the view.
    ///
    /// `\n` starts a new line at the view's left edge, `\r` returns to it and
    /// `\t` advances to the next tab stop. Returns the final point.
    pub fn write_text(&mut self, p: Point, s: &str, attr: Attr) -> Point {
        let r = self.rect();
        let mut q = p;
        for ch in s.chars() {
            match ch {
                '\n' => q = Point::new(r.min.x, q.y + 1),
                '\r' => q.x = r.min.x,
                '\t' => q.x = r.min.x + ((q.x - r.min.x) / TAB_STOP + 1) * TAB_STOP,
                _ => {
                    if !matches!(ch.width(), Some(w) if w > 0) {
                        continue;
                    }
                    if q.x >= r.max.x {
                        q = Point::new(r.min.x, q.y + 1);
                    }
                    self.put(q, ch, attr);
                    q.x += 1;
                }
            }
        }
        q
    }

    /// A view further restricted to `rect` (caller coordinates).
    pub fn sub(&mut self, rect: Rect) -> GridMut<'_> {
        let clip = self.clip.intersect(&rect.shifted(self.offset));
        GridMut {
            grid: &mut *self.grid,
            clip,
            offset: self.offset,
        }
    }

    /// A view whose coordinate `p` addresses this view's `p + by`.
    pub fn shifted(&mut self, by: Point) -> GridMut<'_> {
        GridMut {
            grid: &mut *self.grid,
            clip: self.clip,
            offset: self.offset + by,
        }
    }

    /// A view whose `(1, 1)` is this view's `origin`.
    pub fn sub_at(&mut self, origin: Point) -> GridMut<'_> {
        self.shifted(origin - Point::HOME)
    }
}

/// Number of rows `s` occupies when laid out by [`GridMut::write_text`] in a
/// view `width` cells wide.
pub fn text_rows(s: &str, width: i32) -> i32 {
    let width = width.max(1);
    s.split('\n')
        .map(|line| {
            let cols = line
                .chars()
                .filter(|c| matches!(c.width(), Some(w) if w > 0))
                .count();
            let cols = i32::try_from(cols).unwrap_or(i32::MAX);
            ((cols + width - 1) / width).max(1)
        })
        .sum()
}
