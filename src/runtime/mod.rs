//! Runtime module: the event loop and its configuration.
//!
//! - [`Engine`]: owns the terminal, screens and layers; runs the loop
//! - [`DrawTimer`]: coalesced redraw scheduling
//! - [`EngineConfig`] / [`WorldConfig`]: settings

mod config;
mod engine;
mod timer;

pub use config::{
    clamp_rate, EngineConfig, WorldConfig, ENV_LOG_FILE, ENV_MOUSE, MAX_RATE, MIN_RATE,
};
pub use engine::Engine;
pub use timer::DrawTimer;
