//! Keys Demo: shows every decoded input event.
//!
//! Key presses, escape sequences and mouse reports are logged to the strip at
//! the bottom; the latest event is shown in the middle of the screen.
//! Ctrl-C quits.

use std::process::ExitCode;
use std::time::{Duration, Instant};
use tracing::info;
use treadmill::ansi::{decode_mouse, Escape};
use treadmill::layer::CHANGED;
use treadmill::terminal::MouseModes;
use treadmill::{
    logging, Attr, BannerLayer, Engine, EngineConfig, Input, Layer, Layers, Result, ScreenState,
    Style,
};
use unicode_width::UnicodeWidthStr;

#[derive(Default)]
struct Keys {
    last: String,
    count: u64,
    drawn: u64,
}

impl Layer for Keys {
    fn handle_input(&mut self, input: &Input) -> Result<bool> {
        self.count += 1;
        self.last = match input {
            Input::Escape(e @ Escape::Csi(b'M' | b'm'), params) if params.starts_with(b"<") => {
                let (state, at) = decode_mouse(*e, params)?;
                info!(?state, x = at.x, y = at.y, "mouse");
                format!("{:?} at {},{}", state.button, at.x, at.y)
            }
            _ => {
                info!(%input, "key");
                input.to_string()
            }
        };
        Ok(true)
    }

    fn draw(&mut self, screen: &mut ScreenState, _now: Instant) {
        self.drawn = self.count;
        let text = format!("#{} {}", self.count, self.last);
        let width = i32::try_from(text.width()).unwrap_or(i32::MAX);
        let area = screen.rect().center(width, 1);
        screen
            .view()
            .write_str(area.min, &text, Attr::style(Style::BOLD));
    }

    fn needs_draw(&self) -> Duration {
        if self.drawn == self.count {
            Duration::ZERO
        } else {
            CHANGED
        }
    }
}

fn main() -> ExitCode {
    let config = EngineConfig::from_env()
        .with_mouse(MouseModes::DEFAULT_REPORTING)
        .with_log_lines(10);
    let guard = match logging::init(&config.log_config()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("keys: cannot open log file: {e}");
            return ExitCode::FAILURE;
        }
    };

    let layers = Layers::new()
        .with(BannerLayer::new("treadmill keys | ^C quits"))
        .with(config.log_layer(guard.buffer()))
        .with(Keys::default());

    let result = Engine::new(config, layers).and_then(|mut engine| engine.run());
    drop(guard);

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let code = e.exit_code();
            if code != 0 {
                eprintln!("keys: {e}");
            }
            ExitCode::from(u8::try_from(code).unwrap_or(1))
        }
    }
}
