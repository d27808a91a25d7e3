//! Buffer module: the drawable surface and its realization on the terminal.
//!
//! This module contains:
//! - [`Cell`]: one (rune, attribute) position
//! - [`Grid`] / [`GridMut`]: a rectangular cell array and clipped views of it
//! - [`CursorState`]: cursor position, attributes and visibility
//! - [`ScreenState`] / [`Screen`]: virtual and real screen pairs
//! - [`diff`]: minimal update generation

mod cell;
mod cursor;
pub mod diff;
mod grid;
mod screen;

pub use cell::Cell;
pub use cursor::CursorState;
pub use diff::DiffResult;
pub use grid::{text_rows, Grid, GridMut};
pub use screen::{Screen, ScreenState};
