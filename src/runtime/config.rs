//! Engine and world configuration.

use crate::layer::LogLayer;
use crate::logging::{LogBuffer, LogConfig};
use crate::terminal::MouseModes;
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable naming a log file.
pub const ENV_LOG_FILE: &str = "TREADMILL_LOG";

/// Environment variable enabling mouse reporting when set to `1`.
pub const ENV_MOUSE: &str = "TREADMILL_MOUSE";

/// Configuration for the application loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Whether to use the alternate screen buffer.
    pub alternate_screen: bool,
    /// Whether to hide the cursor while active.
    pub hide_cursor: bool,
    /// Raw mode (otherwise only echo is disabled).
    pub raw_mode: bool,
    /// Mouse reporting modes.
    pub mouse: MouseModes,
    /// Delay before redrawing after a window change.
    pub resize_delay: Duration,
    /// Height of the log strip; zero disables it.
    pub log_lines: u16,
    /// Optional file receiving a copy of the log.
    pub log_file: Option<PathBuf>,
    /// Maximum undecoded input bytes.
    pub input_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            alternate_screen: true,
            hide_cursor: true,
            raw_mode: true,
            mouse: MouseModes::empty(),
            resize_delay: Duration::from_millis(10),
            log_lines: 5,
            log_file: None,
            input_capacity: crate::terminal::DEFAULT_INPUT_CAPACITY,
        }
    }
}

impl EngineConfig {
    /// Defaults overridden from `TREADMILL_LOG` and `TREADMILL_MOUSE`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(path) = std::env::var_os(ENV_LOG_FILE).filter(|p| !p.is_empty()) {
            config.log_file = Some(PathBuf::from(path));
        }
        if std::env::var(ENV_MOUSE).is_ok_and(|v| v == "1") {
            config.mouse = MouseModes::DEFAULT_REPORTING;
        }
        config
    }

    /// Set alternate screen use.
    #[must_use]
    pub const fn with_alternate_screen(mut self, on: bool) -> Self {
        self.alternate_screen = on;
        self
    }

    /// Set cursor hiding.
    #[must_use]
    pub const fn with_hide_cursor(mut self, on: bool) -> Self {
        self.hide_cursor = on;
        self
    }

    /// Set mouse reporting.
    #[must_use]
    pub const fn with_mouse(mut self, mouse: MouseModes) -> Self {
        self.mouse = mouse;
        self
    }

    /// Set the resize redraw delay.
    #[must_use]
    pub const fn with_resize_delay(mut self, delay: Duration) -> Self {
        self.resize_delay = delay;
        self
    }

    /// Set the log strip height.
    #[must_use]
    pub const fn with_log_lines(mut self, lines: u16) -> Self {
        self.log_lines = lines;
        self
    }

    /// Set the log file.
    #[must_use]
    pub fn with_log_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_file = Some(path.into());
        self
    }

    /// Logging setup copying the log to [`log_file`](Self::log_file).
    pub fn log_config(&self) -> LogConfig {
        let config = LogConfig::default();
        match &self.log_file {
            Some(path) => config.with_file(path.clone()),
            None => config,
        }
    }

    /// A log strip over `buffer`, [`log_lines`](Self::log_lines) tall.
    pub fn log_layer(&self, buffer: &LogBuffer) -> LogLayer {
        LogLayer::new(buffer.clone(), self.log_lines)
    }
}

/// Slowest tick rate in ticks per second.
pub const MIN_RATE: f64 = 1.0;

/// Fastest tick rate in ticks per second.
pub const MAX_RATE: f64 = 1e9;

/// Clamp `rate` into `MIN_RATE..=MAX_RATE`; NaN becomes [`MIN_RATE`].
pub fn clamp_rate(rate: f64) -> f64 {
    if rate.is_nan() {
        MIN_RATE
    } else {
        rate.clamp(MIN_RATE, MAX_RATE)
    }
}

/// Configuration for the world driver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldConfig {
    /// Initial tick rate in ticks per second.
    pub rate: f64,
    /// Upper bound on ticks performed in one draw.
    pub max_ticks_per_draw: u64,
    /// Shortest redraw interval while playing.
    pub min_interval: Duration,
    /// Start playing immediately.
    pub autoplay: bool,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            rate: 1.0,
            max_ticks_per_draw: 100_000,
            min_interval: Duration::from_secs(1) / 60,
            autoplay: false,
        }
    }
}

impl WorldConfig {
    /// Set the initial rate, clamped to at least [`MIN_RATE`].
    #[must_use]
    pub fn with_rate(mut self, rate: f64) -> Self {
        self.rate = clamp_rate(rate);
        self
    }

    /// Set the per-draw tick clamp.
    #[must_use]
    pub const fn with_max_ticks_per_draw(mut self, max: u64) -> Self {
        self.max_ticks_per_draw = max;
        self
    }

    /// Start playing immediately.
    #[must_use]
    pub const fn with_autoplay(mut self, on: bool) -> Self {
        self.autoplay = on;
        self
    }
}
