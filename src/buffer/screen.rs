//! Screen: the virtual and real screen states plus pending output.

use super::cursor::CursorState;
use super::diff::{self, DiffResult};
use super::grid::{Grid, GridMut};
use crate::ansi::Attr;
use crate::layout::{Point, Rect};
use crate::terminal::OutputBuffer;
use std::io::{self, Write};
use tracing::debug;

/// The pair (grid, cursor).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScreenState {
    /// Cell contents.
    pub grid: Grid,
    /// Cursor position, attributes and visibility.
    pub cursor: CursorState,
}

impl ScreenState {
    /// A state over `grid` with the cursor at home.
    pub fn new(grid: Grid) -> Self {
        Self {
            grid,
            cursor: CursorState::new(),
        }
    }

    /// Screen bounds.
    #[inline]
    pub const fn rect(&self) -> Rect {
        self.grid.rect()
    }

    /// A drawing view of the whole grid.
    #[inline]
    pub fn view(&mut self) -> GridMut<'_> {
        self.grid.view()
    }

    /// Blank the grid and home the cursor.
    pub fn clear(&mut self) {
        self.grid.clear();
        self.cursor.point = Point::HOME;
        self.cursor.attr = Attr::DEFAULT;
    }

    /// Mark the contents as unknown; the next update is a full redraw.
    pub fn invalidate(&mut self) {
        self.grid = Grid::new(Rect::ZERO);
        self.cursor.forget_position();
    }

    /// Check whether the state is the "nothing known" sentinel.
    #[inline]
    pub const fn is_invalid(&self) -> bool {
        self.grid.rect().is_empty()
    }
}

/// What the application wants shown (`virt`), what the terminal shows
/// (`real`), and the output not yet accepted by the terminal.
pub struct Screen {
    /// The next intended terminal state; layers draw here.
    pub virt: ScreenState,
    real: ScreenState,
    out: OutputBuffer,
}

impl Screen {
    /// A screen of `width × height` cells whose real state is unknown.
    pub fn new(width: u16, height: u16) -> Self {
        let mut real = ScreenState::new(Grid::new(Rect::ZERO));
        real.invalidate();
        Self {
            virt: ScreenState::new(Grid::with_size(width, height)),
            real,
            out: OutputBuffer::new(),
        }
    }

    /// Resize the virtual screen; the same size is a no-op.
    ///
    /// Returns whether the size changed.
    pub fn resize(&mut self, width: u16, height: u16) -> bool {
        self.virt.grid.resize(Rect::from_size(width, height))
    }

    /// Screen bounds.
    #[inline]
    pub const fn rect(&self) -> Rect {
        self.virt.rect()
    }

    /// Blank the virtual screen and home its cursor.
    pub fn clear(&mut self) {
        self.virt.clear();
    }

    /// Forget the real state so the next flush redraws everything.
    pub fn invalidate(&mut self) {
        self.real.invalidate();
    }

    /// The last known terminal state.
    #[inline]
    pub const fn real(&self) -> &ScreenState {
        &self.real
    }

    /// Bytes generated but not yet written.
    #[inline]
    pub const fn pending(&self) -> &OutputBuffer {
        &self.out
    }

    /// Generate the update from real to virtual and write it to `writer`.
    ///
    /// A would-block error keeps the unwritten bytes for the next flush. Any
    /// other error discards them and invalidates the real state.
    pub fn flush<W: Write + ?Sized>(&mut self, writer: &mut W) -> io::Result<DiffResult> {
        let result = diff::update(&mut self.real, &self.virt, &mut self.out);
        match self.out.flush_to(writer) {
            Ok(()) => Ok(result),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                debug!(pending = self.out.len(), "terminal output would block");
                Err(e)
            }
            Err(e) => {
                self.out.clear();
                self.real.invalidate();
                Err(e)
            }
        }
    }
}
