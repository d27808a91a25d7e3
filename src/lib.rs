//! # Treadmill
//!
//! A layered, event-driven fullscreen terminal harness for stepping and
//! watching simulations.
//!
//! Treadmill keeps a virtual screen that layers draw on, and writes only the
//! difference from what the terminal last showed. Input, window changes and
//! halt signals arrive on channels drained by a single-threaded loop.
//!
//! ## Core Concepts
//!
//! - **Virtual and real screens**: layers draw the whole frame; the diff
//!   emits only changed cells, with minimal cursor moves and SGR deltas
//! - **Contexts**: terminal settings entered in order and always undone in
//!   reverse, even on panic
//! - **Layers**: input goes top-down until handled, drawing goes bottom-up
//! - **Worlds**: simulations ticked at an adjustable rate by [`WorldLayer`]
//!
//! ## Example
//!
//! ```rust
//! use treadmill::{Attr, Color, Point, Screen, Style};
//!
//! let mut screen = Screen::new(20, 2);
//! let bold_red = Attr::fg(Color::RED).with_style(Style::BOLD);
//! screen.virt.view().write_str(Point::new(3, 1), "hello", bold_red);
//!
//! let mut out = Vec::new();
//! let result = screen.flush(&mut out).unwrap();
//! assert!(result.full);
//! assert!(out.starts_with(b"\x1b[0m\x1b[2J\x1b[H"));
//! ```

#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

#[cfg(not(unix))]
compile_error!("treadmill drives POSIX terminals and only builds on unix targets");

pub mod ansi;
pub mod buffer;
pub mod error;
pub mod layer;
pub mod layout;
pub mod logging;
pub mod runtime;
pub mod terminal;

// Re-exports for convenience
pub use ansi::{Attr, Color, Escape, Input, Rgb, Style};
pub use buffer::{Cell, Grid, GridMut, Screen, ScreenState};
pub use error::{Error, Result};
pub use layer::{BannerLayer, Controller, Layer, Layers, LogLayer, Message, ModalLayer, World, WorldLayer};
pub use layout::{Point, Rect};
pub use logging::{LogBuffer, LogConfig, LogGuard};
pub use runtime::{Engine, EngineConfig, WorldConfig};
pub use terminal::{Context, Term};
