//! Differential update: the bytes that turn the real screen into the virtual one.
//!
//! 1. If the real bounds are empty (invalidated) or differ from the virtual
//!    bounds, redraw fully: reset attributes, clear, home, then every cell.
//! 2. Otherwise walk the cells in row-major order and write only those whose
//!    (rune, attribute) changed, moving the cursor as cheaply as possible.
//! 3. Finally place and show (or hide) the cursor as the virtual state asks.
//!
//! The real state is updated as bytes are generated, so after a successful
//! write it matches the virtual state exactly.

use super::cursor::CursorState;
use super::screen::ScreenState;
use crate::ansi::Attr;
use crate::layout::Point;
use crate::terminal::OutputBuffer;

/// Statistics about one update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiffResult {
    /// Whether a full redraw was emitted.
    pub full: bool,
    /// Number of cells written.
    pub cells_changed: usize,
}

/// Append the update from `real` to `virt` to `out`, updating `real`.
pub fn update(real: &mut ScreenState, virt: &ScreenState, out: &mut OutputBuffer) -> DiffResult {
    let rect = virt.grid.rect();
    let full = real.grid.rect().is_empty() || real.grid.rect() != rect;
    let mut result = DiffResult {
        full,
        cells_changed: 0,
    };

    if full {
        real.grid.resize(rect);
        real.grid.clear();
        out.reset_attrs();
        out.clear_screen();
        out.cursor_to(Point::HOME);
        real.cursor.point = Point::HOME;
        real.cursor.attr = Attr::DEFAULT;
    }

    for p in virt.grid.points() {
        let Some(want) = virt.grid.get(p) else {
            continue;
        };
        if !full && real.grid.get(p) == Some(want) {
            continue;
        }
        real.cursor.move_to(out, p);
        real.cursor.put(out, want, rect.max.x);
        real.grid.set(p, want);
        result.cells_changed += 1;
    }

    realize_cursor(&mut real.cursor, &virt.cursor, out, full);
    result
}

fn realize_cursor(real: &mut CursorState, virt: &CursorState, out: &mut OutputBuffer, full: bool) {
    if virt.visible {
        real.move_to(out, virt.point);
    }
    if full {
        // The terminal's visibility is unknown after an invalidate.
        real.visible = !virt.visible;
    }
    real.show(out, virt.visible);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ansi::Color;
    use crate::buffer::{Cell, Grid};

    fn screen(width: u16, height: u16) -> ScreenState {
        ScreenState::new(Grid::with_size(width, height))
    }

    fn run(real: &mut ScreenState, virt: &ScreenState) -> (DiffResult, Vec<u8>) {
        let mut out = OutputBuffer::new();
        let result = update(real, virt, &mut out);
        (result, out.as_bytes().to_vec())
    }

    fn synced(width: u16, height: u16) -> ScreenState {
        let mut real = screen(width, height);
        let virt = screen(width, height);
        real.grid = virt.grid.clone();
        real
    }

    #[test]
    fn test_identical_screens_emit_nothing() {
        let mut real = synced(10, 5);
        let (result, bytes) = run(&mut real, &screen(10, 5));
        assert_eq!(result.cells_changed, 0);
        assert!(bytes.is_empty());
    }

    #[test]
    fn test_invalidated_real_redraws_fully() {
        let mut real = screen(3, 2);
        real.invalidate();
        let mut virt = screen(3, 2);
        virt.grid.set(Point::new(2, 1), Cell::new('x', Attr::DEFAULT));
        let (result, bytes) = run(&mut real, &virt);
        assert!(result.full);
        assert_eq!(result.cells_changed, 6);
        assert!(bytes.starts_with(b"\x1b[0m\x1b[2J\x1b[H"));
        assert_eq!(real.grid, virt.grid);
    }

    #[test]
    fn test_size_change_redraws_fully() {
        let mut real = synced(3, 2);
        let (result, _) = run(&mut real, &screen(4, 2));
        assert!(result.full);
        assert_eq!(real.grid.rect(), screen(4, 2).grid.rect());
    }

    #[test]
    fn test_single_cell_change() {
        let mut real = synced(10, 5);
        let mut virt = screen(10, 5);
        virt.grid.set(Point::new(6, 3), Cell::new('X', Attr::DEFAULT));
        let (result, bytes) = run(&mut real, &virt);
        assert_eq!(result.cells_changed, 1);
        assert_eq!(bytes, b"\x1b[3;6HX");
    }

    #[test]
    fn test_adjacent_cells_need_no_moves() {
        let mut real = synced(10, 5);
        let mut virt = screen(10, 5);
        virt.grid.view().write_str(Point::new(2, 2), "ABC", Attr::DEFAULT);
        let (_, bytes) = run(&mut real, &virt);
        assert_eq!(bytes, b"\x1b[2;2HABC");
    }

    #[test]
    fn test_attribute_delta_order() {
        let red = Attr::fg(Color::RED);
        let mut real = synced(3, 1);
        let mut virt = screen(3, 1);
        virt.grid.set(Point::new(1, 1), Cell::new('A', red));
        virt.grid.set(Point::new(2, 1), Cell::new('B', Attr::DEFAULT));
        virt.grid.set(Point::new(3, 1), Cell::new('C', red));
        let (_, bytes) = run(&mut real, &virt);
        assert_eq!(bytes, b"\x1b[31mA\x1b[0mB\x1b[31mC");
    }

    #[test]
    fn test_visible_cursor_is_placed() {
        let mut real = synced(5, 5);
        let mut virt = screen(5, 5);
        virt.cursor.visible = true;
        virt.cursor.point = Point::new(3, 4);
        let (_, bytes) = run(&mut real, &virt);
        assert_eq!(bytes, b"\x1b[4;3H\x1b[?25h");
        assert_eq!(real.cursor.point, Point::new(3, 4));
    }
}
