//! World driver: runs a simulation at a controllable rate and shows it.
//!
//! [`WorldLayer`] owns a [`World`] and decides how many times to tick it on
//! each draw. Keys handled before the world sees them:
//!
//! | key        | action                               |
//! |------------|--------------------------------------|
//! | `.`        | tick once                            |
//! | space      | play / pause                         |
//! | `+` / `-`  | double / halve the rate (minimum 1)  |
//! | arrows     | move the view focus                  |
//!
//! Worlds talk back through a [`Controller`] handed to them at construction.

use super::{Layer, CHANGED};
use crate::ansi::{Attr, Input, Style};
use crate::buffer::{GridMut, ScreenState};
use crate::error::Result;
use crate::layout::{Point, Rect};
use crate::runtime::{clamp_rate, WorldConfig};
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::time::{Duration, Instant};
use tracing::debug;
use unicode_width::UnicodeWidthStr;

/// A steppable simulation.
pub trait World {
    /// Advance one step; return `false` when nothing more will happen.
    fn tick(&mut self) -> bool;

    /// The area the world occupies, in world coordinates.
    fn bounds(&self) -> Rect;

    /// Draw the part of the world inside `view` (world coordinates).
    ///
    /// `grid` is addressed in world coordinates as well.
    fn render(&mut self, grid: &mut GridMut<'_>, view: Rect, now: Instant);

    /// Offer an input event the driver did not consume.
    fn handle_input(&mut self, input: &Input) -> Result<bool> {
        let _ = input;
        Ok(false)
    }

    /// How soon the world wants a draw; zero means no request.
    fn needs_draw(&self) -> Duration {
        Duration::ZERO
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Redraw,
    Focus(Point),
    Pause,
    Play,
}

/// One-way handle a world uses to steer its driver.
///
/// Commands are applied at the next draw.
#[derive(Clone, Debug)]
pub struct Controller {
    tx: Sender<Command>,
}

impl Controller {
    fn send(&self, command: Command) {
        let _ = self.tx.send(command);
    }

    /// Ask for a draw even though nothing ticked.
    pub fn request_redraw(&self) {
        self.send(Command::Redraw);
    }

    /// Move the view focus to `p` (world coordinates).
    pub fn set_focus(&self, p: Point) {
        self.send(Command::Focus(p));
    }

    /// Stop playback.
    pub fn pause(&self) {
        self.send(Command::Pause);
    }

    /// Start playback.
    pub fn play(&self) {
        self.send(Command::Play);
    }
}

/// Maps a world onto the screen around a focus point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewLayer {
    focus: Point,
    viewport: Rect,
}

impl ViewLayer {
    /// A view of `viewport` focused on its center.
    pub fn new(viewport: Rect) -> Self {
        Self {
            focus: viewport.center(1, 1).min,
            viewport,
        }
    }

    /// The focus point.
    #[inline]
    pub const fn focus(&self) -> Point {
        self.focus
    }

    /// The cached world bounds.
    #[inline]
    pub const fn viewport(&self) -> Rect {
        self.viewport
    }

    /// Move the focus to `p`, kept within the world bounds.
    pub fn set_focus(&mut self, p: Point) {
        self.focus = self.viewport.clamp(p);
    }

    /// Move the focus for a cursor key; returns whether `input` was one.
    pub fn handle_input(&mut self, input: &Input) -> bool {
        let delta = match input.arrow() {
            Some(b'A') => Point::new(0, -1),
            Some(b'B') => Point::new(0, 1),
            Some(b'C') => Point::new(1, 0),
            Some(b'D') => Point::new(-1, 0),
            _ => return false,
        };
        self.set_focus(self.focus + delta);
        true
    }

    /// The world rectangle visible on a screen of bounds `screen`.
    ///
    /// At most the screen's size, centered on the focus where the world
    /// bounds allow.
    pub fn view_rect(&self, screen: Rect) -> Rect {
        let b = self.viewport;
        if b.is_empty() {
            return Rect::ZERO;
        }
        let w = screen.width().min(b.width());
        let h = screen.height().min(b.height());
        let x = (self.focus.x - w / 2).clamp(b.min.x, b.max.x - w);
        let y = (self.focus.y - h / 2).clamp(b.min.y, b.max.y - h);
        Rect::at(Point::new(x, y), w, h)
    }

    /// Render `world` onto `screen`, centered if it is smaller.
    pub fn draw<W: World + ?Sized>(&mut self, world: &mut W, screen: &mut ScreenState, now: Instant) {
        self.viewport = world.bounds();
        self.focus = self.viewport.clamp(self.focus);
        let s = screen.rect();
        let view = self.view_rect(s);
        if view.is_empty() {
            return;
        }
        let origin = s.center(view.width(), view.height()).min;
        let mut grid = screen.view();
        let mut world_grid = grid.shifted(origin - view.min);
        world.render(&mut world_grid, view, now);
    }
}

/// Drives a [`World`]: tick timing, playback controls and the status badge.
pub struct WorldLayer<W> {
    world: W,
    view: ViewLayer,
    config: WorldConfig,
    last: Instant,
    ticking: bool,
    playing: bool,
    rate: f64,
    dirty: bool,
    commands: Receiver<Command>,
    controller: Controller,
}

impl<W: World> WorldLayer<W> {
    /// Build the world with a [`Controller`] for this layer.
    pub fn build(config: WorldConfig, make: impl FnOnce(Controller) -> W) -> Self {
        let (tx, commands) = unbounded();
        let controller = Controller { tx };
        let world = make(controller.clone());
        let mut layer = Self {
            view: ViewLayer::new(world.bounds()),
            world,
            config,
            last: Instant::now(),
            ticking: false,
            playing: false,
            rate: clamp_rate(config.rate),
            dirty: true,
            commands,
            controller,
        };
        if config.autoplay {
            layer.play(Instant::now());
        }
        layer
    }

    /// Drive a world that does not need a controller.
    pub fn new(world: W, config: WorldConfig) -> Self {
        Self::build(config, |_| world)
    }

    /// The simulation.
    pub const fn world(&self) -> &W {
        &self.world
    }

    /// The simulation, mutably.
    pub fn world_mut(&mut self) -> &mut W {
        &mut self.world
    }

    /// The view.
    pub const fn view(&self) -> &ViewLayer {
        &self.view
    }

    /// Another handle like the one the world received.
    pub fn controller(&self) -> Controller {
        self.controller.clone()
    }

    /// Whether playback is on.
    pub const fn is_playing(&self) -> bool {
        self.playing
    }

    /// Ticks per second.
    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Start playback from `now`.
    pub fn play(&mut self, now: Instant) {
        self.playing = true;
        self.ticking = true;
        self.last = now;
        self.rate = clamp_rate(self.rate);
        self.dirty = true;
    }

    /// Stop playback.
    pub fn pause(&mut self) {
        self.playing = false;
        self.ticking = false;
        self.dirty = true;
    }

    /// Request a single tick at the next draw.
    pub fn step(&mut self) {
        self.ticking = true;
        self.dirty = true;
    }

    fn set_rate(&mut self, rate: f64) {
        self.rate = clamp_rate(rate);
        self.dirty = true;
    }

    fn apply_commands(&mut self, now: Instant) {
        while let Ok(command) = self.commands.try_recv() {
            match command {
                Command::Redraw => self.dirty = true,
                Command::Focus(p) => {
                    self.view.set_focus(p);
                    self.dirty = true;
                }
                Command::Pause => self.pause(),
                Command::Play => self.play(now),
            }
        }
    }

    /// Tick the world for the time elapsed up to `now`; returns the count.
    ///
    /// While playing, `round(elapsed × rate)` ticks run, at most
    /// `max_ticks_per_draw`; a tick returning `false` stops playback. The
    /// unspent fraction of elapsed time carries over to the next call.
    pub fn advance(&mut self, now: Instant) -> u64 {
        if !self.ticking {
            self.last = now;
            return 0;
        }
        if !self.playing {
            self.world.tick();
            self.ticking = false;
            self.last = now;
            return 1;
        }

        let elapsed = now.saturating_duration_since(self.last).as_secs_f64();
        let wanted = (elapsed * self.rate).round();
        #[allow(clippy::cast_precision_loss)]
        let max = self.config.max_ticks_per_draw as f64;
        let clamped = wanted > max;
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let ticks = wanted.clamp(0.0, max) as u64;

        let mut done = 0;
        while done < ticks {
            done += 1;
            if !self.world.tick() {
                debug!(ticks = done, "world stopped");
                self.pause();
                self.last = now;
                return done;
            }
        }

        #[allow(clippy::cast_precision_loss)]
        let spent = Duration::try_from_secs_f64(done as f64 / self.rate).ok();
        self.last = match spent.and_then(|d| self.last.checked_add(d)) {
            Some(last) if !clamped => last,
            _ => now,
        };
        done
    }

    fn draw_status(&self, screen: &mut ScreenState) {
        let glyph = if self.playing { '▶' } else { '‖' };
        let status = format!("{glyph} {}", self.rate);
        let r = screen.rect();
        let width = i32::try_from(status.width()).unwrap_or(i32::MAX);
        let p = Point::new((r.max.x - width).max(r.min.x), r.min.y);
        screen
            .view()
            .write_str(p, &status, Attr::style(Style::BOLD));
    }
}

impl<W: World> Layer for WorldLayer<W> {
    fn handle_input(&mut self, input: &Input) -> Result<bool> {
        match input.rune() {
            Some('.') => {
                self.step();
                return Ok(true);
            }
            Some(' ') => {
                if self.playing {
                    self.pause();
                } else {
                    self.play(Instant::now());
                }
                return Ok(true);
            }
            Some('+') => {
                self.set_rate(self.rate * 2.0);
                return Ok(true);
            }
            Some('-') => {
                self.set_rate(self.rate / 2.0);
                return Ok(true);
            }
            _ => {}
        }
        if self.view.handle_input(input) {
            self.dirty = true;
            return Ok(true);
        }
        self.world.handle_input(input)
    }

    fn draw(&mut self, screen: &mut ScreenState, now: Instant) {
        self.apply_commands(now);
        self.advance(now);
        self.view.draw(&mut self.world, screen, now);
        self.draw_status(screen);
        self.dirty = false;
    }

    fn needs_draw(&self) -> Duration {
        let mut wants = self.world.needs_draw();
        let mut request = |d: Duration| {
            if !d.is_zero() && (wants.is_zero() || d < wants) {
                wants = d;
            }
        };
        if self.dirty || !self.commands.is_empty() || (self.ticking && !self.playing) {
            request(CHANGED);
        }
        if self.playing {
            let period = Duration::try_from_secs_f64(self.rate.recip()).unwrap_or(Duration::MAX);
            request(period.max(self.config.min_interval));
        }
        wants
    }
}
