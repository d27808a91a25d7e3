//! Log layer: the tail of the captured log in a strip at the bottom.

use super::{Layer, CHANGED};
use crate::ansi::{Attr, Style};
use crate::buffer::{text_rows, ScreenState};
use crate::logging::LogBuffer;
use std::time::{Duration, Instant};

/// Shows the last lines of a [`LogBuffer`] in the bottom rows.
pub struct LogLayer {
    buffer: LogBuffer,
    lines: u16,
    attr: Attr,
    drawn_len: Option<usize>,
}

impl LogLayer {
    /// A strip `lines` rows tall showing `buffer`.
    pub const fn new(buffer: LogBuffer, lines: u16) -> Self {
        Self {
            buffer,
            lines,
            attr: Attr::style(Style::DIM),
            drawn_len: None,
        }
    }

    /// Height of the strip in rows.
    pub const fn lines(&self) -> u16 {
        self.lines
    }

    /// Set the text attributes.
    #[must_use]
    pub const fn with_attr(mut self, attr: Attr) -> Self {
        self.attr = attr;
        self
    }
}

impl Layer for LogLayer {
    fn draw(&mut self, screen: &mut ScreenState, _now: Instant) {
        let len = self.buffer.len();
        self.drawn_len = Some(len);
        if self.lines == 0 || len == 0 {
            return;
        }
        let r = screen.rect();
        let rows = i32::from(self.lines).min(r.height());
        let (_, strip) = r.split_vertical(r.height() - rows);

        // Newest lines last; keep as many as fit once wrapped. The newest
        // line is always kept and clipped to the strip.
        let mut shown = Vec::new();
        let mut used = 0;
        for line in self.buffer.tail(usize::from(self.lines)).into_iter().rev() {
            used += text_rows(&line, strip.width());
            if used > rows && !shown.is_empty() {
                break;
            }
            shown.push(line);
        }
        shown.reverse();

        let mut view = screen.view();
        let mut strip_view = view.sub(strip);
        strip_view.clear();
        strip_view.write_text(strip.min, &shown.join("\n"), self.attr);
    }

    fn needs_draw(&self) -> Duration {
        if self.drawn_len == Some(self.buffer.len()) {
            Duration::ZERO
        } else {
            CHANGED
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::Grid;
    use crate::layout::Point;
    use std::io::Write;

    fn row(screen: &ScreenState, y: i32) -> String {
        (1..=screen.rect().width())
            .map(|x| screen.grid.get(Point::new(x, y)).map_or('?', |c| c.display_char()))
            .collect()
    }

    #[test]
    fn test_tail_in_bottom_strip() {
        let mut buf = LogBuffer::new();
        write!(buf, "first\nsecond\nthird\n").unwrap();
        let mut layer = LogLayer::new(buf, 2);
        let mut screen = ScreenState::new(Grid::with_size(8, 4));
        layer.draw(&mut screen, Instant::now());
        assert_eq!(row(&screen, 2), "        ");
        assert_eq!(row(&screen, 3), "second  ");
        assert_eq!(row(&screen, 4), "third   ");
    }

    #[test]
    fn test_wrapped_lines_take_rows() {
        let mut buf = LogBuffer::new();
        write!(buf, "old\nabcdefghij\n").unwrap();
        let mut layer = LogLayer::new(buf, 2);
        let mut screen = ScreenState::new(Grid::with_size(5, 3));
        layer.draw(&mut screen, Instant::now());
        assert_eq!(row(&screen, 2), "abcde");
        assert_eq!(row(&screen, 3), "fghij");
    }

    #[test]
    fn test_newest_line_taller_than_strip_is_clipped() {
        let mut buf = LogBuffer::new();
        write!(buf, "short\nthis line is far too long\n").unwrap();
        let mut layer = LogLayer::new(buf, 1);
        let mut screen = ScreenState::new(Grid::with_size(5, 3));
        layer.draw(&mut screen, Instant::now());
        assert_eq!(row(&screen, 2), "     ");
        assert_eq!(row(&screen, 3), "this ");
    }

    #[test]
    fn test_needs_draw_tracks_growth() {
        let mut buf = LogBuffer::new();
        let mut layer = LogLayer::new(buf.clone(), 2);
        let mut screen = ScreenState::new(Grid::with_size(8, 4));
        layer.draw(&mut screen, Instant::now());
        assert_eq!(layer.needs_draw(), Duration::ZERO);
        writeln!(buf, "news").unwrap();
        assert_eq!(layer.needs_draw(), CHANGED);
        layer.draw(&mut screen, Instant::now());
        assert_eq!(layer.needs_draw(), Duration::ZERO);
    }
}
