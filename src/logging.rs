//! Log capture for fullscreen sessions.
//!
//! While the terminal is in the alternate screen, log lines written to
//! stderr would corrupt the display. [`init`] installs a `tracing` subscriber
//! (once per process) whose writer is routed: to stderr by default, or to an
//! in-memory [`LogBuffer`] plus an optional file while the returned
//! [`LogGuard`] lives. Dropping the guard routes back to stderr.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

/// A shared, growable byte buffer of log output.
#[derive(Clone, Default)]
pub struct LogBuffer {
    inner: Arc<Mutex<Vec<u8>>>,
}

impl LogBuffer {
    /// An empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<u8>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Bytes written so far.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Check whether nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Everything written, lossily decoded.
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.lock()).into_owned()
    }

    /// The last `n` lines, oldest first, without trailing newlines.
    pub fn tail(&self, n: usize) -> Vec<String> {
        let text = self.contents();
        let lines: Vec<&str> = text.lines().collect();
        let from = lines.len().saturating_sub(n);
        lines[from..].iter().map(|s| (*s).to_string()).collect()
    }

    /// Discard everything written.
    pub fn clear(&self) {
        self.lock().clear();
    }
}

impl Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl std::fmt::Debug for LogBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogBuffer").field("len", &self.len()).finish()
    }
}

/// Logging setup.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Also append log lines to this file.
    pub file: Option<PathBuf>,
    /// Filter used when `RUST_LOG` is unset.
    pub default_level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            file: None,
            default_level: "info".to_string(),
        }
    }
}

impl LogConfig {
    /// Set the log file.
    #[must_use]
    pub fn with_file(mut self, file: impl Into<PathBuf>) -> Self {
        self.file = Some(file.into());
        self
    }

    /// Set the default filter.
    #[must_use]
    pub fn with_default_level(mut self, level: impl Into<String>) -> Self {
        self.default_level = level.into();
        self
    }
}

#[derive(Default)]
struct Route {
    buffer: Option<LogBuffer>,
    file: Option<File>,
}

static ROUTE: Mutex<Route> = Mutex::new(Route {
    buffer: None,
    file: None,
});

static INSTALLED: OnceLock<()> = OnceLock::new();

fn route() -> MutexGuard<'static, Route> {
    ROUTE.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Writer handed to the subscriber for each event.
struct RoutedWriter;

impl Write for RoutedWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut route = route();
        if route.buffer.is_none() && route.file.is_none() {
            drop(route);
            return io::stderr().write(buf);
        }
        if let Some(buffer) = route.buffer.as_mut() {
            buffer.write_all(buf)?;
        }
        if let Some(file) = route.file.as_mut() {
            file.write_all(buf)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if let Some(file) = route().file.as_mut() {
            file.flush()?;
        }
        Ok(())
    }
}

struct MakeRouted;

impl<'a> MakeWriter<'a> for MakeRouted {
    type Writer = RoutedWriter;

    fn make_writer(&'a self) -> Self::Writer {
        RoutedWriter
    }
}

/// Routes log output to a [`LogBuffer`] (and file) while alive.
#[must_use = "dropping the guard routes logs back to stderr"]
pub struct LogGuard {
    buffer: LogBuffer,
}

impl LogGuard {
    /// The buffer receiving log output.
    pub const fn buffer(&self) -> &LogBuffer {
        &self.buffer
    }
}

impl Drop for LogGuard {
    fn drop(&mut self) {
        let mut route = route();
        if let Some(file) = route.file.as_mut() {
            let _ = file.flush();
        }
        *route = Route::default();
    }
}

/// Install the subscriber (first call only) and capture log output.
///
/// Fails only if the log file cannot be opened. If another global
/// subscriber was installed first, capture still succeeds but receives
/// nothing.
pub fn init(config: &LogConfig) -> io::Result<LogGuard> {
    let file = match &config.file {
        Some(path) => Some(OpenOptions::new().create(true).append(true).open(path)?),
        None => None,
    };

    INSTALLED.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&config.default_level));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_ansi(false)
            .with_writer(MakeRouted)
            .try_init();
    });

    let buffer = LogBuffer::new();
    *route() = Route {
        buffer: Some(buffer.clone()),
        file,
    };
    Ok(LogGuard { buffer })
}
