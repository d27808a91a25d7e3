//! Terminal module: file handles, mode contexts, signals and input.
//!
//! A [`Term`] owns the terminal files ([`TermIo`]) and an ordered stack of
//! [`Context`]s. Activating the terminal enters every context in order;
//! deactivating exits them in reverse, and every exit runs even if an earlier
//! one failed. [`Term::run_with`] keeps that guarantee across panics.

mod context;
mod input;
mod modes;
mod output;
mod ready;
mod signal;

pub use context::{Context, FnContext};
pub use input::{InputBuffer, DEFAULT_CAPACITY as DEFAULT_INPUT_CAPACITY};
pub use modes::{ModeContext, MouseModes, NonblockContext, TermiosContext};
pub use output::OutputBuffer;
pub use ready::InputReady;
pub use signal::SignalChannel;

use crate::error::{Error, Result};
use std::fs::{File, OpenOptions};
use std::io::{self, IsTerminal, Read, Write};
use std::os::fd::{AsFd, AsRawFd, RawFd};
use std::panic::{self, AssertUnwindSafe};
use tracing::{info, warn};

/// Where terminal output goes.
enum Output {
    /// A terminal file.
    Tty(File),
    /// Any writer; used by headless terminals.
    Writer(Box<dyn Write + Send>),
}

/// The terminal's input and output handles.
pub struct TermIo {
    input: Option<File>,
    output: Output,
}

impl TermIo {
    /// The input terminal file, if any.
    pub const fn input_file(&self) -> Option<&File> {
        self.input.as_ref()
    }

    /// Raw descriptor of the input terminal, if any.
    pub fn input_fd(&self) -> Option<RawFd> {
        self.input.as_ref().map(AsRawFd::as_raw_fd)
    }

    /// Raw descriptor of the output terminal, if any.
    pub fn output_fd(&self) -> Option<RawFd> {
        match &self.output {
            Output::Tty(f) => Some(f.as_raw_fd()),
            Output::Writer(_) => None,
        }
    }

    /// Descriptors of both terminal files, deduplicated.
    pub fn fds(&self) -> Vec<RawFd> {
        let mut fds: Vec<RawFd> = self.input_fd().into_iter().chain(self.output_fd()).collect();
        fds.dedup();
        fds
    }

    /// Read available input into `buf`.
    ///
    /// With no input file this reports would-block.
    pub fn read_input(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match &mut self.input {
            Some(f) => f.read(buf),
            None => Err(io::ErrorKind::WouldBlock.into()),
        }
    }
}

impl Read for TermIo {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.read_input(buf)
    }
}

impl Write for TermIo {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match &mut self.output {
            Output::Tty(f) => f.write(buf),
            Output::Writer(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match &mut self.output {
            Output::Tty(f) => f.flush(),
            Output::Writer(w) => w.flush(),
        }
    }
}

/// Blocks while the process is stopped; see [`Term::suspend`].
pub type StopHook = fn() -> io::Result<()>;

fn stay_running() -> io::Result<()> {
    Ok(())
}

/// A terminal with its context stack.
pub struct Term {
    io: TermIo,
    contexts: Vec<Box<dyn Context>>,
    entered: usize,
    active: bool,
    closed: bool,
    fixed_size: Option<(u16, u16)>,
    stop: StopHook,
}

impl Term {
    /// Attach to the controlling terminal.
    ///
    /// Standard input and output are used when they are terminals; otherwise
    /// `/dev/tty` is opened read-only (input) or write-only (output).
    pub fn open() -> Result<Self> {
        let input = if io::stdin().is_terminal() {
            File::from(io::stdin().as_fd().try_clone_to_owned()?)
        } else {
            File::open("/dev/tty").map_err(|_| Error::NotATerminal)?
        };
        let output = if io::stdout().is_terminal() {
            File::from(io::stdout().as_fd().try_clone_to_owned()?)
        } else {
            OpenOptions::new()
                .write(true)
                .open("/dev/tty")
                .map_err(|_| Error::NotATerminal)?
        };
        if !input.is_terminal() || !output.is_terminal() {
            return Err(Error::NotATerminal);
        }
        let mut term = Self::with_io(TermIo {
            input: Some(input),
            output: Output::Tty(output),
        });
        term.stop = signal::stop_and_wait;
        Ok(term)
    }

    /// A terminal that writes to `writer` and reports a fixed size.
    ///
    /// It has no input file; input is injected by the caller.
    pub fn headless<W: Write + Send + 'static>(writer: W, width: u16, height: u16) -> Self {
        let mut term = Self::with_io(TermIo {
            input: None,
            output: Output::Writer(Box::new(writer)),
        });
        term.fixed_size = Some((width, height));
        term
    }

    const fn with_io(io: TermIo) -> Self {
        Self {
            io,
            contexts: Vec::new(),
            entered: 0,
            active: false,
            closed: false,
            fixed_size: None,
            stop: stay_running,
        }
    }

    /// Append a context; it is entered after all earlier ones.
    pub fn push(&mut self, context: Box<dyn Context>) {
        self.contexts.push(context);
    }

    /// Whether this terminal has no real terminal files.
    pub const fn is_headless(&self) -> bool {
        self.fixed_size.is_some()
    }

    /// Whether contexts are currently entered.
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// The terminal handles.
    pub fn io(&mut self) -> &mut TermIo {
        &mut self.io
    }

    /// Current size as `(columns, rows)`.
    pub fn size(&self) -> Result<(u16, u16)> {
        match self.fixed_size {
            Some(size) => Ok(size),
            None => Ok(crossterm::terminal::size()?),
        }
    }

    /// Replace what [`suspend`](Self::suspend) runs while deactivated.
    ///
    /// Attached terminals stop the process group; headless ones return at
    /// once.
    pub fn set_stop_hook(&mut self, stop: StopHook) {
        self.stop = stop;
    }

    /// Change the size reported by a headless terminal.
    pub fn set_size(&mut self, width: u16, height: u16) {
        if self.fixed_size.is_some() {
            self.fixed_size = Some((width, height));
        }
    }

    /// Enter every context in order.
    ///
    /// On failure, the contexts already entered are exited in reverse.
    pub fn enter(&mut self) -> Result<()> {
        if self.active {
            return Ok(());
        }
        while self.entered < self.contexts.len() {
            let ctx = &mut self.contexts[self.entered];
            if let Err(e) = ctx.enter(&mut self.io) {
                let err = Error::context(ctx.name(), e);
                if let Err(exit_err) = self.exit_entered() {
                    warn!(error = %exit_err, "rollback after failed enter");
                }
                return Err(err);
            }
            self.entered += 1;
        }
        self.active = true;
        let _ = self.io.flush();
        Ok(())
    }

    /// Exit every entered context in reverse order.
    ///
    /// All exits run; the first error is returned and later ones are logged.
    pub fn exit(&mut self) -> Result<()> {
        if !self.active {
            return Ok(());
        }
        self.active = false;
        self.exit_entered()
    }

    fn exit_entered(&mut self) -> Result<()> {
        let mut first = None;
        while self.entered > 0 {
            self.entered -= 1;
            let ctx = &mut self.contexts[self.entered];
            if let Err(e) = ctx.exit(&mut self.io) {
                let err = Error::context(ctx.name(), e);
                if first.is_none() {
                    first = Some(err);
                } else {
                    warn!(error = %err, "context exit failed");
                }
            }
        }
        if let Err(e) = self.io.flush() {
            first.get_or_insert(Error::Io(e));
        }
        first.map_or(Ok(()), Err)
    }

    /// Activate, run `f`, then deactivate, even if `f` panics.
    ///
    /// An error from `f` takes precedence over an exit error.
    pub fn run_with<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        self.enter()?;
        let result = panic::catch_unwind(AssertUnwindSafe(|| f(self)));
        let exited = self.exit();
        match result {
            Ok(Ok(value)) => exited.map(|()| value),
            Ok(Err(e)) => {
                if let Err(exit_err) = exited {
                    warn!(error = %exit_err, "exit after error");
                }
                Err(e)
            }
            Err(payload) => panic::resume_unwind(payload),
        }
    }

    /// Deactivate for the duration of `f`, then reactivate.
    ///
    /// When the terminal is not active, `f` simply runs.
    pub fn run_without<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        if !self.active {
            return f(self);
        }
        self.exit()?;
        let result = panic::catch_unwind(AssertUnwindSafe(|| f(self)));
        let entered = self.enter();
        match result {
            Ok(value) => {
                entered?;
                value
            }
            Err(payload) => panic::resume_unwind(payload),
        }
    }

    /// Stop the process as if the user pressed the suspend key.
    ///
    /// Contexts are exited and the stop hook runs; for an attached terminal
    /// it sends `SIGTSTP` to the process group and blocks until `SIGCONT`.
    /// Contexts are then re-entered, also when the hook fails.
    pub fn suspend(&mut self) -> Result<()> {
        let stop = self.stop;
        self.run_without(|_| {
            info!("suspending");
            stop()?;
            info!("resumed");
            Ok(())
        })
    }

    /// Exit (if active) and close every context.
    ///
    /// Close steps run even when exit fails. Closing twice does nothing.
    pub fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        let exited = self.exit();
        for ctx in self.contexts.iter_mut().rev() {
            ctx.close();
        }
        self.closed = true;
        exited
    }
}

impl Drop for Term {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!(error = %e, "terminal close failed");
        }
    }
}
