//! Life Demo: Conway's Game of Life on a wrapping board.
//!
//! Keys: space play/pause, `.` single step, `+`/`-` rate, arrows pan,
//! `r` reseed, `?` help, Escape closes help, Ctrl-C quits.
//!
//! Set `TREADMILL_LOG=path` to copy the log to a file and
//! `TREADMILL_MOUSE=1` to enable mouse reporting.

use std::process::ExitCode;
use std::time::{Instant, SystemTime, UNIX_EPOCH};
use tracing::info;
use treadmill::buffer::GridMut;
use treadmill::{
    logging, Attr, BannerLayer, Color, Controller, Engine, EngineConfig, Input, Layers, Message,
    ModalLayer, Point, Rect, Result, World, WorldConfig, WorldLayer,
};

const HELP: &str = "space  play / pause
.      single step
+ -    double / halve rate
arrows pan
r      reseed
Esc    close this help
^C     quit";

/// Small xorshift generator for seeding boards.
struct Seed(u64);

impl Seed {
    fn from_clock() -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0x9E37_79B9, |d| d.as_nanos() as u64);
        Self(nanos | 1)
    }

    fn next(&mut self) -> u64 {
        self.0 ^= self.0 << 13;
        self.0 ^= self.0 >> 7;
        self.0 ^= self.0 << 17;
        self.0
    }
}

struct Life {
    width: i32,
    height: i32,
    cells: Vec<bool>,
    scratch: Vec<bool>,
    generation: u64,
    seed: Seed,
    help: Message,
    controller: Controller,
}

impl Life {
    fn new(width: i32, height: i32, help: Message, controller: Controller) -> Self {
        let len = (width * height) as usize;
        let mut life = Self {
            width,
            height,
            cells: vec![false; len],
            scratch: vec![false; len],
            generation: 0,
            seed: Seed::from_clock(),
            help,
            controller,
        };
        life.reseed();
        life
    }

    fn reseed(&mut self) {
        for i in 0..self.cells.len() {
            self.cells[i] = self.seed.next() % 4 == 0;
        }
        self.generation = 0;
        self.controller.set_focus(Point::new(self.width / 2 + 1, self.height / 2 + 1));
        self.controller.request_redraw();
    }

    fn alive(&self, x: i32, y: i32) -> bool {
        let x = x.rem_euclid(self.width);
        let y = y.rem_euclid(self.height);
        self.cells[(y * self.width + x) as usize]
    }

    fn neighbours(&self, x: i32, y: i32) -> usize {
        let mut n = 0;
        for dy in -1..=1 {
            for dx in -1..=1 {
                if (dx, dy) != (0, 0) && self.alive(x + dx, y + dy) {
                    n += 1;
                }
            }
        }
        n
    }
}

impl World for Life {
    fn tick(&mut self) -> bool {
        let mut changed = false;
        for y in 0..self.height {
            for x in 0..self.width {
                let was = self.alive(x, y);
                let now = matches!((was, self.neighbours(x, y)), (true, 2 | 3) | (false, 3));
                changed |= was != now;
                self.scratch[(y * self.width + x) as usize] = now;
            }
        }
        std::mem::swap(&mut self.cells, &mut self.scratch);
        self.generation += 1;
        if !changed {
            info!(generation = self.generation, "board is stable");
        }
        changed
    }

    fn bounds(&self) -> Rect {
        Rect::at(Point::HOME, self.width, self.height)
    }

    fn render(&mut self, grid: &mut GridMut<'_>, view: Rect, _now: Instant) {
        let attr = Attr::fg(Color::GREEN);
        for y in view.min.y..view.max.y {
            for x in view.min.x..view.max.x {
                if self.alive(x - 1, y - 1) {
                    grid.put(Point::new(x, y), '█', attr);
                }
            }
        }
    }

    fn handle_input(&mut self, input: &Input) -> Result<bool> {
        match input.rune() {
            Some('r') => {
                info!("reseeding");
                self.reseed();
                Ok(true)
            }
            Some('?') => {
                self.help.set(HELP);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

fn main() -> ExitCode {
    let config = EngineConfig::from_env();
    let guard = match logging::init(&config.log_config()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("life: cannot open log file: {e}");
            return ExitCode::FAILURE;
        }
    };

    let modal = ModalLayer::new();
    let help = modal.message();
    let world = WorldLayer::build(
        WorldConfig::default().with_rate(10.0).with_autoplay(true),
        |controller| Life::new(160, 80, help.clone(), controller),
    );
    let layers = Layers::new()
        .with(modal)
        .with(BannerLayer::new("treadmill life | ? for help").with_attr(Attr::fg(Color::CYAN)))
        .with(config.log_layer(guard.buffer()))
        .with(world);

    let result = Engine::new(config, layers).and_then(|mut engine| engine.run());
    drop(guard);

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let code = e.exit_code();
            if code != 0 {
                eprintln!("life: {e}");
            }
            ExitCode::from(u8::try_from(code).unwrap_or(1))
        }
    }
}
