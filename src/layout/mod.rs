//! Layout module: geometry primitives.
//!
//! Grids, screens, views and worlds all address cells with [`Point`] and
//! bound them with the inclusive-exclusive [`Rect`].

mod rect;

pub use rect::{Point, Rect};
