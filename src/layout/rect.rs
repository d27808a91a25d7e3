//! Point and Rect: geometry primitives shared by grids, views and worlds.
//!
//! Screen coordinates are 1-based, matching ANSI cursor addressing: the
//! top-left cell of a `w×h` screen is `(1, 1)` and its bounds are
//! `Rect::new(1, 1, w + 1, h + 1)`. World coordinates use the same types but
//! may be negative.

use std::ops::{Add, Sub};

/// A point (or offset) in cell coordinates.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Point {
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
}

impl Point {
    /// Create a new point.
    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The origin `(0, 0)`; never a valid screen point.
    pub const ZERO: Self = Self::new(0, 0);

    /// Top-left cell of the screen.
    pub const HOME: Self = Self::new(1, 1);

    /// Check whether the point lies inside `rect`.
    #[inline]
    pub const fn is_in(self, rect: Rect) -> bool {
        rect.contains(self)
    }
}

impl Add for Point {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl std::fmt::Debug for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// An inclusive-exclusive rectangle: `min` is inside, `max` is just outside.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    /// Top-left corner (inclusive).
    pub min: Point,
    /// Bottom-right corner (exclusive).
    pub max: Point,
}

impl Rect {
    /// Create a new rectangle from corner coordinates.
    #[inline]
    pub const fn new(x0: i32, y0: i32, x1: i32, y1: i32) -> Self {
        Self {
            min: Point::new(x0, y0),
            max: Point::new(x1, y1),
        }
    }

    /// Screen bounds for a terminal of the given size.
    #[inline]
    pub const fn from_size(width: u16, height: u16) -> Self {
        Self::new(1, 1, width as i32 + 1, height as i32 + 1)
    }

    /// A rectangle of the given size anchored at `min`.
    #[inline]
    pub const fn at(min: Point, width: i32, height: i32) -> Self {
        Self::new(min.x, min.y, min.x + width, min.y + height)
    }

    /// Zero-sized rectangle.
    pub const ZERO: Self = Self::new(0, 0, 0, 0);

    /// Width in cells (zero when inverted).
    #[inline]
    pub const fn width(&self) -> i32 {
        let w = self.max.x - self.min.x;
        if w < 0 {
            0
        } else {
            w
        }
    }

    /// Height in cells (zero when inverted).
    #[inline]
    pub const fn height(&self) -> i32 {
        let h = self.max.y - self.min.y;
        if h < 0 {
            0
        } else {
            h
        }
    }

    /// Size as a point offset.
    #[inline]
    pub const fn size(&self) -> Point {
        Point::new(self.width(), self.height())
    }

    /// Get the area (number of cells).
    #[inline]
    #[allow(clippy::cast_sign_loss)]
    pub const fn area(&self) -> usize {
        (self.width() as usize) * (self.height() as usize)
    }

    /// Check if the rectangle is empty.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.min.x >= self.max.x || self.min.y >= self.max.y
    }

    /// Check if a point is inside the rectangle.
    #[inline]
    pub const fn contains(&self, p: Point) -> bool {
        p.x >= self.min.x && p.x < self.max.x && p.y >= self.min.y && p.y < self.max.y
    }

    /// Intersection of two rectangles; empty rectangles intersect to `ZERO`.
    #[must_use]
    pub fn intersect(&self, other: &Self) -> Self {
        let r = Self::new(
            self.min.x.max(other.min.x),
            self.min.y.max(other.min.y),
            self.max.x.min(other.max.x),
            self.max.y.min(other.max.y),
        );
        if r.is_empty() {
            Self::ZERO
        } else {
            r
        }
    }

    /// Translate by an offset.
    #[inline]
    #[must_use]
    pub fn shifted(&self, offset: Point) -> Self {
        Self {
            min: self.min + offset,
            max: self.max + offset,
        }
    }

    /// Shrink the rectangle by a margin on all sides.
    #[inline]
    #[must_use]
    pub const fn shrink(&self, margin: i32) -> Self {
        let m2 = margin * 2;
        if self.width() <= m2 || self.height() <= m2 {
            return Self::ZERO;
        }
        Self::new(
            self.min.x + margin,
            self.min.y + margin,
            self.max.x - margin,
            self.max.y - margin,
        )
    }

    /// Clamp a point so that it lies inside the rectangle.
    ///
    /// Empty rectangles return `min`.
    #[must_use]
    pub fn clamp(&self, p: Point) -> Point {
        if self.is_empty() {
            return self.min;
        }
        Point::new(
            p.x.clamp(self.min.x, self.max.x - 1),
            p.y.clamp(self.min.y, self.max.y - 1),
        )
    }

    /// Split vertically at a given row offset into (top, bottom).
    pub fn split_vertical(&self, at: i32) -> (Self, Self) {
        let at = at.clamp(0, self.height());
        (
            Self::new(self.min.x, self.min.y, self.max.x, self.min.y + at),
            Self::new(self.min.x, self.min.y + at, self.max.x, self.max.y),
        )
    }

    /// A rectangle of the given size centered within this one.
    #[must_use]
    pub fn center(&self, width: i32, height: i32) -> Self {
        let width = width.min(self.width());
        let height = height.min(self.height());
        let min = Point::new(
            self.min.x + (self.width() - width) / 2,
            self.min.y + (self.height() - height) / 2,
        );
        Self::at(min, width, height)
    }
}

impl std::fmt::Debug for Rect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Rect({:?}-{:?} {}x{})", self.min, self.max, self.width(), self.height())
    }
}
