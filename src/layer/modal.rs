//! Modal layer: a centered message box that captures input while shown.

use super::{Layer, Message, CHANGED};
use crate::ansi::{Attr, Input, Style, ESC};
use crate::buffer::{Cell, ScreenState};
use crate::error::Result;
use crate::layout::Point;
use std::time::{Duration, Instant};
use unicode_width::UnicodeWidthStr;

/// While its message is non-empty, consumes every input event; Escape
/// dismisses it.
pub struct ModalLayer {
    message: Message,
    attr: Attr,
    drawn: Option<u64>,
}

impl ModalLayer {
    /// A modal with no message.
    pub fn new() -> Self {
        Self::with_message(Message::default())
    }

    /// A modal showing a shared message.
    pub const fn with_message(message: Message) -> Self {
        Self {
            message,
            attr: Attr::style(Style::REVERSE),
            drawn: None,
        }
    }

    /// Handle for showing or clearing the message.
    pub fn message(&self) -> Message {
        self.message.clone()
    }

    /// Whether a message is shown.
    pub fn is_active(&self) -> bool {
        !self.message.is_empty()
    }
}

impl Default for ModalLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl Layer for ModalLayer {
    fn handle_input(&mut self, input: &Input) -> Result<bool> {
        if !self.is_active() {
            return Ok(false);
        }
        if input.is_control(ESC) {
            self.message.clear();
        }
        Ok(true)
    }

    fn draw(&mut self, screen: &mut ScreenState, _now: Instant) {
        let text = self.message.text();
        self.drawn = Some(self.message.version());
        if text.is_empty() {
            return;
        }
        let lines: Vec<&str> = text.lines().collect();
        let width = lines.iter().map(|l| l.width()).max().unwrap_or(0);
        let width = i32::try_from(width).unwrap_or(i32::MAX).saturating_add(4);
        let height = i32::try_from(lines.len()).unwrap_or(i32::MAX).saturating_add(2);
        let area = screen.rect().center(width, height);

        let mut view = screen.view();
        view.fill_rect(area, Cell::new(' ', self.attr));
        let mut body = view.sub(area.shrink(1));
        for (dy, line) in (0..).zip(&lines) {
            let p = Point::new(area.min.x + 2, area.min.y + 1 + dy);
            body.write_str(p, line, self.attr);
        }
    }

    fn needs_draw(&self) -> Duration {
        if self.drawn == Some(self.message.version()) {
            Duration::ZERO
        } else {
            CHANGED
        }
    }
}
