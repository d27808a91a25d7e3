//! Banner layer: one centered line on the top row.

use super::{Layer, Message, CHANGED};
use crate::ansi::Attr;
use crate::buffer::ScreenState;
use crate::layout::Point;
use std::time::{Duration, Instant};
use unicode_width::UnicodeWidthStr;

/// Draws its message centered on the screen's first row.
pub struct BannerLayer {
    message: Message,
    attr: Attr,
    drawn: Option<u64>,
}

impl BannerLayer {
    /// A banner showing `text`.
    pub fn new(text: impl Into<String>) -> Self {
        Self::with_message(Message::new(text))
    }

    /// A banner showing a shared message.
    pub const fn with_message(message: Message) -> Self {
        Self {
            message,
            attr: Attr::DEFAULT,
            drawn: None,
        }
    }

    /// Set the text attributes.
    #[must_use]
    pub const fn with_attr(mut self, attr: Attr) -> Self {
        self.attr = attr;
        self
    }

    /// Handle for changing the text later.
    pub fn message(&self) -> Message {
        self.message.clone()
    }
}

impl Layer for BannerLayer {
    fn draw(&mut self, screen: &mut ScreenState, _now: Instant) {
        let text = self.message.text();
        self.drawn = Some(self.message.version());
        if text.is_empty() {
            return;
        }
        let r = screen.rect();
        let width = i32::try_from(text.width()).unwrap_or(i32::MAX);
        let x = r.min.x + (r.width() - width).max(0) / 2;
        screen.view().write_str(Point::new(x, r.min.y), &text, self.attr);
    }

    fn needs_draw(&self) -> Duration {
        if self.drawn == Some(self.message.version()) {
            Duration::ZERO
        } else {
            CHANGED
        }
    }
}
