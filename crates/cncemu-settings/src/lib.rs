//! CNC emulator settings crate
//!
//! Handles configuration files for the emulator: scene tracing, jogging,
//! machine timing and stock simulation.

pub mod config;
pub mod error;

pub use config::{Config, JogSettings, MachineSettings, SceneSettings, StockSettings};
pub use error::{ConfigError, SettingsError, SettingsResult};
