//! Crate error type.

use crate::ansi::DecodeError;
use std::io;

/// Errors returned by the terminal, the event loop and layers.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Terminal or file I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Neither the standard streams nor `/dev/tty` are a terminal.
    #[error("not attached to a terminal")]
    NotATerminal,

    /// A halt signal was received (or Ctrl-C pressed).
    #[error("received signal {0}")]
    Signal(i32),

    /// A terminal context failed to enter or exit.
    #[error("{name} context: {source}")]
    Context {
        /// Context name.
        name: &'static str,
        /// Underlying failure.
        #[source]
        source: io::Error,
    },

    /// Malformed input that a layer chose to report.
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

impl Error {
    /// Wrap an I/O error with the name of the context that produced it.
    pub const fn context(name: &'static str, source: io::Error) -> Self {
        Self::Context { name, source }
    }

    /// Process exit code for this error.
    ///
    /// An interrupt is a clean halt (0); other signals follow the shell
    /// convention of `128 + signo`; everything else is 1.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Signal(libc::SIGINT) => 0,
            Self::Signal(sig) => 128 + *sig,
            _ => 1,
        }
    }

    /// Check whether this error wraps a would-block I/O error.
    pub fn is_would_block(&self) -> bool {
        match self {
            Self::Io(e) | Self::Context { source: e, .. } => {
                e.kind() == io::ErrorKind::WouldBlock
            }
            _ => false,
        }
    }
}

/// Result alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
