//! End-to-end scenarios over a headless engine, checked against a reference
//! terminal model.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};
use treadmill::ansi::{CTRL_L, ESC};
use treadmill::buffer::GridMut;
use treadmill::{
    Attr, BannerLayer, Cell, Color, Engine, EngineConfig, Input, Layer, Layers, LogBuffer,
    ModalLayer, Point, Rect, Result, Screen, ScreenState, World, WorldConfig, WorldLayer,
};

const WIDTH: u16 = 10;
const HEIGHT: u16 = 3;

fn headless(layers: Layers) -> (Engine, LogBuffer) {
    let out = LogBuffer::new();
    let config = EngineConfig::default().with_resize_delay(Duration::from_millis(1));
    let engine = Engine::headless(out.clone(), WIDTH, HEIGHT, config, layers).unwrap();
    (engine, out)
}

/// Start the engine and run the initial resize and draw.
fn started(layers: Layers) -> (Engine, LogBuffer) {
    let (mut engine, out) = headless(layers);
    engine.start().unwrap();
    engine.step().unwrap();
    engine.step().unwrap();
    (engine, out)
}

fn row_text(parser: &vt100::Parser, row: u16) -> String {
    let screen = parser.screen();
    (0..WIDTH)
        .map(|col| {
            let contents = screen.cell(row, col).map(vt100::Cell::contents).unwrap_or_default();
            contents.chars().next().unwrap_or(' ')
        })
        .collect()
}

fn model(bytes: &[u8]) -> vt100::Parser {
    let mut parser = vt100::Parser::new(HEIGHT, WIDTH, 0);
    parser.process(bytes);
    parser
}

/// Records the runes it is offered.
struct Recorder {
    seen: Rc<RefCell<Vec<char>>>,
}

impl Layer for Recorder {
    fn handle_input(&mut self, input: &Input) -> Result<bool> {
        if let Some(c) = input.rune() {
            self.seen.borrow_mut().push(c);
        }
        Ok(true)
    }

    fn draw(&mut self, _: &mut ScreenState, _: Instant) {}
}

#[test]
fn initial_draw_shows_banner() {
    let (mut engine, out) = started(Layers::new().with(BannerLayer::new("hello")));

    let bytes = out.contents();
    let alt = bytes.find("\x1b[?1049h").unwrap();
    let clear = bytes.find("\x1b[0m\x1b[2J\x1b[H").unwrap();
    assert!(alt < clear);

    let parser = model(bytes.as_bytes());
    assert_eq!(row_text(&parser, 0), "  hello   ");
    assert_eq!(row_text(&parser, 1), " ".repeat(usize::from(WIDTH)));
    assert!(parser.screen().hide_cursor());

    engine.stop().unwrap();
}

#[test]
fn attribute_changes_are_minimal() {
    let red = Attr::fg(Color::RED);
    let mut screen = Screen::new(3, 1);
    screen.flush(&mut Vec::new()).unwrap();

    let mut view = screen.virt.view();
    view.set(Point::new(1, 1), Cell::new('A', red));
    view.set(Point::new(2, 1), Cell::new('B', Attr::DEFAULT));
    view.set(Point::new(3, 1), Cell::new('C', red));

    let mut out = Vec::new();
    let result = screen.flush(&mut out).unwrap();
    assert_eq!(result.cells_changed, 3);
    assert_eq!(out, b"\x1b[H\x1b[31mA\x1b[0mB\x1b[31mC");
}

/// Asks for a redraw after each input, waiting the next of `waits`.
struct Pacer {
    waits: Vec<Duration>,
    pending: Option<Duration>,
    draws: Rc<RefCell<Vec<Instant>>>,
}

impl Layer for Pacer {
    fn handle_input(&mut self, _: &Input) -> Result<bool> {
        if !self.waits.is_empty() {
            self.pending = Some(self.waits.remove(0));
        }
        Ok(true)
    }

    fn draw(&mut self, _: &mut ScreenState, now: Instant) {
        self.pending = None;
        self.draws.borrow_mut().push(now);
    }

    fn needs_draw(&self) -> Duration {
        self.pending.unwrap_or(Duration::ZERO)
    }
}

#[test]
fn redraw_requests_coalesce() {
    let draws = Rc::new(RefCell::new(Vec::new()));
    let pacer = Pacer {
        waits: [20, 5, 50].map(Duration::from_millis).to_vec(),
        pending: None,
        draws: Rc::clone(&draws),
    };
    let (mut engine, _) = headless(Layers::new().with(pacer));

    let start = Instant::now();
    engine.feed_input(b"a").unwrap();
    engine.feed_input(b"b").unwrap();
    engine.feed_input(b"c").unwrap();
    let deadline = engine.timer().deadline().unwrap();
    assert!(deadline < start + Duration::from_millis(20));

    engine.step().unwrap();
    assert_eq!(draws.borrow().len(), 1);
    assert!(draws.borrow()[0] >= start + Duration::from_millis(5));
    assert!(!engine.timer().is_pending());
}

#[test]
fn modal_captures_input_until_dismissed() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let modal = ModalLayer::new();
    let message = modal.message();
    message.set("paused");
    let layers = Layers::new().with(modal).with(Recorder {
        seen: Rc::clone(&seen),
    });
    let (mut engine, _) = headless(layers);

    engine.feed_input(b"x").unwrap();
    assert!(seen.borrow().is_empty());

    engine.feed_input(&[ESC]).unwrap();
    assert!(message.is_empty());
    assert!(seen.borrow().is_empty());

    engine.feed_input(b"y").unwrap();
    assert_eq!(*seen.borrow(), ['y']);
}

struct Counter {
    ticks: u64,
}

impl World for Counter {
    fn tick(&mut self) -> bool {
        self.ticks += 1;
        true
    }

    fn bounds(&self) -> Rect {
        Rect::from_size(4, 1)
    }

    fn render(&mut self, grid: &mut GridMut<'_>, _: Rect, _: Instant) {
        let text = format!("{}", self.ticks % 10_000);
        grid.write_str(Point::HOME, &text, Attr::DEFAULT);
    }
}

#[test]
fn playback_follows_rate() {
    let config = WorldConfig::default().with_rate(10.0);
    let mut layer = WorldLayer::new(Counter { ticks: 0 }, config);
    let mut screen = ScreenState::new(treadmill::Grid::with_size(20, 3));

    let t0 = Instant::now();
    layer.play(t0);
    layer.draw(&mut screen, t0 + Duration::from_secs(1));
    assert_eq!(layer.world().ticks, 10);

    layer.draw(&mut screen, t0 + Duration::from_millis(1100));
    assert_eq!(layer.world().ticks, 11);
    assert!(!layer.needs_draw().is_zero());
}

#[test]
fn playback_is_clamped_per_draw() {
    let config = WorldConfig::default()
        .with_rate(1000.0)
        .with_max_ticks_per_draw(5);
    let mut layer = WorldLayer::new(Counter { ticks: 0 }, config);
    let mut screen = ScreenState::new(treadmill::Grid::with_size(20, 3));

    let t0 = Instant::now();
    layer.play(t0);
    layer.draw(&mut screen, t0 + Duration::from_secs(1));
    assert_eq!(layer.world().ticks, 5);
}

#[test]
fn ctrl_l_forces_full_redraw() {
    let (mut engine, out) = started(Layers::new().with(BannerLayer::new("hello")));
    let mark = out.len();

    engine.feed_input(&[CTRL_L]).unwrap();
    engine.step().unwrap();

    let bytes = out.contents();
    let redraw = &bytes.as_bytes()[mark..];
    assert!(redraw.starts_with(b"\x1b[0m\x1b[2J\x1b[H"));

    // A fresh terminal fed only the redraw shows the whole frame.
    let parser = model(redraw);
    assert_eq!(row_text(&parser, 0), "  hello   ");
    assert!(!engine.screen().real().is_invalid());
}
