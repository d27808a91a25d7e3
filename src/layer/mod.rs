//! Layers: independent pieces of UI composed into one screen.
//!
//! A [`Layer`] handles input, draws onto the virtual screen, and reports how
//! soon it wants to be drawn again. [`Layers`] composes them:
//! - input goes to each layer in order until one handles it
//! - drawing runs in reverse order, so earlier layers overlay later ones
//! - the composite wants a draw at the soonest positive request

mod banner;
mod log;
mod modal;
mod world;

pub use banner::BannerLayer;
pub use log::LogLayer;
pub use modal::ModalLayer;
pub use world::{Controller, ViewLayer, World, WorldLayer};

use crate::ansi::Input;
use crate::buffer::ScreenState;
use crate::error::Result;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Delay requested by layers whose content changed.
pub const CHANGED: Duration = Duration::from_millis(1);

/// A piece of UI.
pub trait Layer {
    /// Offer an input event; return `true` if it was consumed.
    fn handle_input(&mut self, input: &Input) -> Result<bool> {
        let _ = input;
        Ok(false)
    }

    /// Draw onto the virtual screen at time `now`.
    fn draw(&mut self, screen: &mut ScreenState, now: Instant);

    /// How soon this layer wants a draw; zero means no request.
    fn needs_draw(&self) -> Duration {
        Duration::ZERO
    }
}

/// An ordered stack of layers; the first is topmost.
#[derive(Default)]
pub struct Layers {
    layers: Vec<Box<dyn Layer>>,
}

impl Layers {
    /// An empty stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a layer beneath all existing ones.
    pub fn push(&mut self, layer: impl Layer + 'static) {
        self.layers.push(Box::new(layer));
    }

    /// Builder form of [`push`](Self::push).
    #[must_use]
    pub fn with(mut self, layer: impl Layer + 'static) -> Self {
        self.push(layer);
        self
    }

    /// Number of layers.
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Check whether there are no layers.
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

impl Layer for Layers {
    fn handle_input(&mut self, input: &Input) -> Result<bool> {
        for layer in &mut self.layers {
            if layer.handle_input(input)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn draw(&mut self, screen: &mut ScreenState, now: Instant) {
        for layer in self.layers.iter_mut().rev() {
            layer.draw(screen, now);
        }
    }

    fn needs_draw(&self) -> Duration {
        self.layers
            .iter()
            .map(|l| l.needs_draw())
            .filter(|d| !d.is_zero())
            .min()
            .unwrap_or(Duration::ZERO)
    }
}

/// A shared, versioned message string.
///
/// Clones refer to the same message. Every `set` bumps the version so layers
/// can tell when to redraw.
#[derive(Clone, Default)]
pub struct Message {
    inner: Arc<Mutex<(String, u64)>>,
}

impl Message {
    /// A message with initial text.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(Mutex::new((text.into(), 0))),
        }
    }

    fn lock(&self) -> MutexGuard<'_, (String, u64)> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the text.
    pub fn set(&self, text: impl Into<String>) {
        let mut inner = self.lock();
        inner.0 = text.into();
        inner.1 += 1;
    }

    /// Clear the text.
    pub fn clear(&self) {
        self.set(String::new());
    }

    /// Current text.
    pub fn text(&self) -> String {
        self.lock().0.clone()
    }

    /// Check whether the text is empty.
    pub fn is_empty(&self) -> bool {
        self.lock().0.is_empty()
    }

    /// Change counter.
    pub fn version(&self) -> u64 {
        self.lock().1
    }
}

impl std::fmt::Debug for Message {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.lock();
        write!(f, "Message({:?} v{})", inner.0, inner.1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::{Cell, Grid};
    use crate::error::Error;
    use crate::layout::Point;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Tracer {
        name: char,
        handles: bool,
        fails: bool,
        wants: Duration,
        seen: Rc<RefCell<Vec<char>>>,
    }

    impl Tracer {
        fn new(name: char, seen: &Rc<RefCell<Vec<char>>>) -> Self {
            Self {
                name,
                handles: false,
                fails: false,
                wants: Duration::ZERO,
                seen: Rc::clone(seen),
            }
        }
    }

    impl Layer for Tracer {
        fn handle_input(&mut self, _: &Input) -> Result<bool> {
            self.seen.borrow_mut().push(self.name);
            if self.fails {
                return Err(Error::Signal(15));
            }
            Ok(self.handles)
        }

        fn draw(&mut self, screen: &mut ScreenState, _: Instant) {
            self.seen.borrow_mut().push(self.name);
            screen.grid.set(Point::HOME, Cell::new(self.name, crate::ansi::Attr::DEFAULT));
        }

        fn needs_draw(&self) -> Duration {
            self.wants
        }
    }

    #[test]
    fn test_input_stops_at_first_handler() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut b = Tracer::new('b', &seen);
        b.handles = true;
        let mut layers = Layers::new()
            .with(Tracer::new('a', &seen))
            .with(b)
            .with(Tracer::new('c', &seen));
        assert!(layers.handle_input(&Input::Rune('x')).unwrap());
        assert_eq!(*seen.borrow(), ['a', 'b']);
    }

    #[test]
    fn test_input_error_propagates() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut a = Tracer::new('a', &seen);
        a.fails = true;
        let mut layers = Layers::new().with(a).with(Tracer::new('b', &seen));
        assert!(layers.handle_input(&Input::Rune('x')).is_err());
        assert_eq!(*seen.borrow(), ['a']);
    }

    #[test]
    fn test_draw_in_reverse_so_first_is_on_top() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut layers = Layers::new()
            .with(Tracer::new('a', &seen))
            .with(Tracer::new('b', &seen));
        let mut screen = ScreenState::new(Grid::with_size(2, 1));
        layers.draw(&mut screen, Instant::now());
        assert_eq!(*seen.borrow(), ['b', 'a']);
        assert_eq!(screen.grid.get(Point::HOME).unwrap().rune, 'a');
    }

    #[test]
    fn test_needs_draw_is_min_positive() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let durations = [0, 30, 0, 10, 20];
        let mut layers = Layers::new();
        for (i, ms) in durations.iter().enumerate() {
            let mut p = Tracer::new(char::from(b'a' + u8::try_from(i).unwrap()), &seen);
            p.wants = Duration::from_millis(*ms);
            layers.push(p);
        }
        assert_eq!(layers.needs_draw(), Duration::from_millis(10));

        let idle = Layers::new().with(Tracer::new('z', &seen));
        assert_eq!(idle.needs_draw(), Duration::ZERO);
        assert_eq!(Layers::new().needs_draw(), Duration::ZERO);
    }

    #[test]
    fn test_message_versions() {
        let msg = Message::new("hi");
        let other = msg.clone();
        assert_eq!(msg.version(), 0);
        other.set("bye");
        assert_eq!(msg.text(), "bye");
        assert_eq!(msg.version(), 1);
        msg.clear();
        assert!(other.is_empty());
    }
}
