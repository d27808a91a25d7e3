//! The application loop.
//!
//! One thread owns everything: the terminal, the screens, the input buffer
//! and the layers. Each [`Engine::step`] blocks on a single `select!` over
//! four channels:
//!
//! 1. halt signals (`SIGINT`, `SIGTERM`, `SIGHUP`) end the loop with
//!    [`Error::Signal`]
//! 2. window changes resize the virtual screen and schedule a redraw
//! 3. input readiness reads once, then decodes and dispatches every event
//! 4. the draw timer redraws all layers and flushes the difference
//!
//! Ctrl-C, Ctrl-L and Ctrl-Z are handled by the loop before layers see them.

use super::config::EngineConfig;
use super::timer::DrawTimer;
use crate::ansi::{Input, CTRL_C, CTRL_L, CTRL_Z};
use crate::buffer::Screen;
use crate::error::{Error, Result};
use crate::layer::{Layer, Layers, CHANGED};
use crate::terminal::{
    InputBuffer, InputReady, ModeContext, NonblockContext, SignalChannel, Term, TermiosContext,
};
use crossbeam_channel::{select, Receiver, Sender};
use std::io::{self, Write};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Delay before retrying a flush the terminal refused.
const FLUSH_RETRY: Duration = Duration::from_millis(10);

/// Loop state other than the terminal itself.
struct State {
    config: EngineConfig,
    screen: Screen,
    layers: Layers,
    input: InputBuffer,
    timer: DrawTimer,
    halt: Receiver<i32>,
    halt_tx: Sender<i32>,
    resize: Receiver<i32>,
    resize_tx: Sender<i32>,
    ready: Receiver<()>,
    ready_ack: Sender<()>,
}

/// A fullscreen terminal application: terminal, screens and layers.
pub struct Engine {
    term: Term,
    state: State,
}

impl Engine {
    /// Attach to the controlling terminal.
    pub fn new(config: EngineConfig, layers: Layers) -> Result<Self> {
        let term = Term::open()?;
        Self::with_term(term, config, layers, false)
    }

    /// An engine over a headless terminal of fixed size writing to `writer`.
    ///
    /// Signals are synthetic and there is no input file; use
    /// [`feed_input`](Self::feed_input) to inject bytes.
    pub fn headless<W: Write + Send + 'static>(
        writer: W,
        width: u16,
        height: u16,
        config: EngineConfig,
        layers: Layers,
    ) -> Result<Self> {
        let term = Term::headless(writer, width, height);
        Self::with_term(term, config, layers, true)
    }

    fn with_term(mut term: Term, config: EngineConfig, layers: Layers, synthetic: bool) -> Result<Self> {
        let (width, height) = term.size()?;

        let (halt, resize) = if synthetic {
            (SignalChannel::synthetic("halt"), SignalChannel::synthetic("resize"))
        } else {
            (
                SignalChannel::new("halt", &[libc::SIGINT, libc::SIGTERM, libc::SIGHUP]),
                SignalChannel::new("resize", &[libc::SIGWINCH]),
            )
        };
        let ready = InputReady::new();

        let state = State {
            screen: Screen::new(width, height),
            layers,
            input: InputBuffer::with_capacity(config.input_capacity),
            timer: DrawTimer::new(),
            halt: halt.receiver().clone(),
            halt_tx: halt.sender(),
            resize: resize.receiver().clone(),
            resize_tx: resize.sender(),
            ready: ready.receiver().clone(),
            ready_ack: ready.ack_sender(),
            config,
        };

        let termios = if state.config.raw_mode {
            TermiosContext::raw()
        } else {
            TermiosContext::echo_off()
        };
        term.push(Box::new(termios));
        term.push(Box::new(ModeContext::new(
            state.config.alternate_screen,
            state.config.hide_cursor,
            state.config.mouse,
        )));
        term.push(Box::new(NonblockContext::new()));
        term.push(Box::new(halt));
        term.push(Box::new(resize));
        term.push(Box::new(ready));

        Ok(Self { term, state })
    }

    /// Activate the terminal and run until a halt signal or an error.
    ///
    /// The terminal is restored before returning, also on panic. A clean
    /// halt comes back as [`Error::Signal`]; see [`Error::exit_code`].
    pub fn run(&mut self) -> Result<()> {
        let state = &mut self.state;
        self.term.run_with(|term| -> Result<()> {
            state.started();
            loop {
                state.step(term)?;
            }
        })
    }

    /// Activate the terminal without entering the loop.
    ///
    /// The screen is invalidated and a resize is queued so the first
    /// [`step`](Self::step)s size and draw the screen.
    pub fn start(&mut self) -> Result<()> {
        self.term.enter()?;
        self.state.started();
        Ok(())
    }

    /// Deactivate the terminal.
    pub fn stop(&mut self) -> Result<()> {
        info!("stopping");
        self.term.exit()
    }

    /// Wait for and handle one event.
    pub fn step(&mut self) -> Result<()> {
        self.state.step(&mut self.term)
    }

    /// Decode and dispatch `bytes` as if they had been read.
    pub fn feed_input(&mut self, bytes: &[u8]) -> Result<()> {
        self.state.input.push(bytes);
        self.state.process_input(&mut self.term)
    }

    /// Sender for synthetic halt signals.
    pub fn halt_sender(&self) -> Sender<i32> {
        self.state.halt_tx.clone()
    }

    /// Sender for synthetic window-change signals.
    pub fn resize_sender(&self) -> Sender<i32> {
        self.state.resize_tx.clone()
    }

    /// The screens.
    pub const fn screen(&self) -> &Screen {
        &self.state.screen
    }

    /// The layer stack.
    pub fn layers_mut(&mut self) -> &mut Layers {
        &mut self.state.layers
    }

    /// The terminal.
    pub fn term_mut(&mut self) -> &mut Term {
        &mut self.term
    }

    /// The draw timer.
    pub const fn timer(&self) -> &DrawTimer {
        &self.state.timer
    }
}

impl State {
    fn started(&mut self) {
        info!(size = ?self.screen.rect(), "terminal active");
        self.screen.invalidate();
        let _ = self.resize_tx.try_send(libc::SIGWINCH);
    }

    fn step(&mut self, term: &mut Term) -> Result<()> {
        let halt = self.halt.clone();
        let resize = self.resize.clone();
        let ready = self.ready.clone();
        let timer = self.timer.receiver().clone();

        select! {
            recv(halt) -> sig => match sig {
                Ok(sig) => {
                    info!(sig, "halt signal");
                    Err(Error::Signal(sig))
                }
                Err(_) => Ok(()),
            },
            recv(resize) -> _ => self.on_resize(term),
            recv(ready) -> _ => self.on_input_ready(term),
            recv(timer) -> _ => self.on_draw(term, Instant::now()),
        }
    }

    fn on_resize(&mut self, term: &mut Term) -> Result<()> {
        self.apply_resize(term)?;
        self.timer.request(self.config.resize_delay);
        Ok(())
    }

    /// Drain pending window changes and match the screens to the terminal.
    fn apply_resize(&mut self, term: &mut Term) -> Result<()> {
        while self.resize.try_recv().is_ok() {}
        let (width, height) = term.size()?;
        if self.screen.resize(width, height) {
            debug!(width, height, "screen resized");
        }
        Ok(())
    }

    fn on_input_ready(&mut self, term: &mut Term) -> Result<()> {
        let read = self.input.read_from(term.io());
        let _ = self.ready_ack.try_send(());
        match read {
            Ok(0) => {
                info!("terminal input closed");
                return Err(Error::Signal(libc::SIGHUP));
            }
            Ok(_) => {}
            Err(e)
                if matches!(
                    e.kind(),
                    io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
                ) => {}
            Err(e) => return Err(e.into()),
        }
        self.process_input(term)
    }

    fn process_input(&mut self, term: &mut Term) -> Result<()> {
        while let Some(input) = self.input.decode() {
            self.dispatch(term, &input)?;
        }
        if let Some(input) = self.input.flush_lone_escape() {
            self.dispatch(term, &input)?;
        }
        self.schedule();
        Ok(())
    }

    fn dispatch(&mut self, term: &mut Term, input: &Input) -> Result<()> {
        if input.is_control(CTRL_C) {
            return Err(Error::Signal(libc::SIGINT));
        }
        if input.is_control(CTRL_L) {
            self.screen.clear();
            self.screen.invalidate();
            self.timer.request(CHANGED);
            return Ok(());
        }
        if input.is_control(CTRL_Z) {
            term.suspend()?;
            self.screen.invalidate();
            self.timer.request(CHANGED);
            return Ok(());
        }
        match self.layers.handle_input(input) {
            Ok(_) => Ok(()),
            Err(Error::Decode(e)) => {
                warn!(error = %e, input = %input, "undecodable input");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    fn on_draw(&mut self, term: &mut Term, now: Instant) -> Result<()> {
        self.timer.fired();
        // select! picks among ready arms at random; never draw at a stale size.
        if !self.resize.is_empty() {
            self.apply_resize(term)?;
        }
        self.screen.clear();
        self.layers.draw(&mut self.screen.virt, now);
        match self.screen.flush(term.io()).map_err(Error::from) {
            Ok(result) => {
                if result.full {
                    debug!(cells = result.cells_changed, "full redraw");
                }
            }
            Err(e) if e.is_would_block() => {
                self.timer.request(FLUSH_RETRY);
            }
            Err(e) => return Err(e),
        }
        self.schedule();
        Ok(())
    }

    fn schedule(&mut self) {
        let wait = self.layers.needs_draw();
        if !wait.is_zero() {
            self.timer.request(wait);
        }
    }
}
