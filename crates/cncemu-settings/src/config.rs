//! Configuration and settings management for the CNC emulator
//!
//! Provides configuration file handling and validation. Supports JSON and
//! TOML file formats, selected by file extension, stored in the platform
//! configuration directory by default.
//!
//! Configuration is organized into logical sections:
//! - Scene settings (scale, interpolation resolution, marker)
//! - Jog settings (step sizes, marker speed, timer interval)
//! - Machine settings (rapid speed, tool change time, spindle)
//! - Stock settings (voxel block carved by the cutter)

use std::path::{Path, PathBuf};

use cncemu_core::RAPID_SPEED_MM;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ConfigError, SettingsError, SettingsResult};

const CONFIG_DIR_NAME: &str = "cncemu";
const CONFIG_FILE_NAME: &str = "config.toml";

/// How programs are traced into the scene
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneSettings {
    /// Program units per scene unit
    pub scale: f64,
    /// Interpolated points per program unit of travel at unit feed
    pub resolution: f64,
    /// Move the marker along the toolpath instead of drawing a polyline
    #[serde(default)]
    pub move_object: bool,
    /// Name of the scene object that represents the tool
    pub marker_name: String,
    /// Log every traced point
    #[serde(default)]
    pub debug: bool,
}

impl Default for SceneSettings {
    fn default() -> Self {
        Self {
            scale: 1000.0,
            resolution: 5.0,
            move_object: false,
            marker_name: "Tool".to_string(),
            debug: false,
        }
    }
}

/// Manual jogging of the marker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JogSettings {
    /// X/Y jog distance, scene units
    pub xy_step: f64,
    /// Z jog distance, scene units
    pub z_step: f64,
    /// Marker travel per timer tick, scene units
    pub speed: f64,
    pub tick_interval_ms: u64,
}

impl Default for JogSettings {
    fn default() -> Self {
        Self {
            xy_step: 0.1,
            z_step: 0.1,
            speed: 0.1,
            tick_interval_ms: 100,
        }
    }
}

/// Machine timing used to build the job timeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MachineSettings {
    /// Rapid traverse speed in mm/s
    pub rapid_speed_mm: f64,
    /// Seconds per M06 tool change
    pub tool_change_seconds: f64,
    #[serde(default = "default_spindle_on")]
    pub spindle_on_at_start: bool,
}

fn default_spindle_on() -> bool {
    true
}

impl Default for MachineSettings {
    fn default() -> Self {
        Self {
            rapid_speed_mm: RAPID_SPEED_MM,
            tool_change_seconds: 3.0,
            spindle_on_at_start: true,
        }
    }
}

/// Block of material carved along cutting moves, in scene units
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockSettings {
    #[serde(default)]
    pub enabled: bool,
    /// Minimum corner of the block
    pub origin: [f64; 3],
    pub size: [f64; 3],
    /// Voxel edge length
    pub resolution: f64,
    pub tool_radius: f64,
}

impl Default for StockSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            origin: [-0.1, -0.1, -0.02],
            size: [0.2, 0.2, 0.02],
            resolution: 0.001,
            tool_radius: 0.003,
        }
    }
}

/// Complete emulator configuration
///
/// Aggregates all settings sections and provides file I/O operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Recently loaded programs, newest first
    #[serde(default)]
    pub recent_files: Vec<PathBuf>,
    #[serde(default = "default_recent_files_count")]
    pub recent_files_count: usize,
    #[serde(default)]
    pub scene: SceneSettings,
    #[serde(default)]
    pub jog: JogSettings,
    #[serde(default)]
    pub machine: MachineSettings,
    #[serde(default)]
    pub stock: StockSettings,
}

fn default_recent_files_count() -> usize {
    10
}

impl Default for Config {
    fn default() -> Self {
        Self {
            recent_files: Vec::new(),
            recent_files_count: default_recent_files_count(),
            scene: SceneSettings::default(),
            jog: JogSettings::default(),
            machine: MachineSettings::default(),
            stock: StockSettings::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Json,
    Toml,
}

fn format_of(path: &Path) -> SettingsResult<Format> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => Ok(Format::Json),
        Some("toml") => Ok(Format::Toml),
        other => Err(ConfigError::UnsupportedFormat(other.unwrap_or("").to_string()).into()),
    }
}

fn check_range(key: &str, value: f64, min: f64, max: f64) -> SettingsResult<()> {
    if !(min..=max).contains(&value) {
        return Err(ConfigError::ValueOutOfRange {
            key: key.to_string(),
            value,
            min,
            max,
        }
        .into());
    }
    Ok(())
}

fn check_positive(key: &str, value: f64) -> SettingsResult<()> {
    if value <= 0.0 || !value.is_finite() {
        return Err(SettingsError::InvalidSetting {
            key: key.to_string(),
            reason: format!("must be > 0, got {}", value),
        });
    }
    Ok(())
}

impl Config {
    /// Create new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Default config file location in the platform configuration directory
    pub fn default_path() -> SettingsResult<PathBuf> {
        let dir = dirs::config_dir().ok_or_else(|| {
            SettingsError::ConfigDirectory("no configuration directory on this platform".to_string())
        })?;
        Ok(dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Load config from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let format = format_of(path)?;
        let content = std::fs::read_to_string(path)?;

        let config: Self = match format {
            Format::Json => serde_json::from_str(&content)?,
            Format::Toml => toml::from_str(&content)?,
        };

        config.validate()?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Load the file when it exists, defaults otherwise
    pub fn load_or_default(path: &Path) -> SettingsResult<Self> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            debug!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Save config to file (JSON or TOML), creating parent directories
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        self.validate()?;

        let content = match format_of(path)? {
            Format::Json => serde_json::to_string_pretty(self)?,
            Format::Toml => toml::to_string_pretty(self)?,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        debug!("Saved config to {}", path.display());

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> SettingsResult<()> {
        check_range("scene.scale", self.scene.scale, 1.0, 1000.0)?;
        check_positive("scene.resolution", self.scene.resolution)?;
        if self.scene.marker_name.trim().is_empty() {
            return Err(SettingsError::InvalidSetting {
                key: "scene.marker_name".to_string(),
                reason: "must not be empty".to_string(),
            });
        }

        check_range("jog.xy_step", self.jog.xy_step, 0.0001, 10.0)?;
        check_range("jog.z_step", self.jog.z_step, 0.0001, 10.0)?;
        check_range("jog.speed", self.jog.speed, 0.0001, 10.0)?;
        if self.jog.tick_interval_ms == 0 {
            return Err(SettingsError::InvalidSetting {
                key: "jog.tick_interval_ms".to_string(),
                reason: "must be > 0".to_string(),
            });
        }

        check_positive("machine.rapid_speed_mm", self.machine.rapid_speed_mm)?;
        if self.machine.tool_change_seconds < 0.0 {
            return Err(SettingsError::InvalidSetting {
                key: "machine.tool_change_seconds".to_string(),
                reason: "must not be negative".to_string(),
            });
        }

        check_positive("stock.resolution", self.stock.resolution)?;
        check_positive("stock.tool_radius", self.stock.tool_radius)?;
        for (axis, size) in ["x", "y", "z"].iter().zip(self.stock.size) {
            check_positive(&format!("stock.size.{}", axis), size)?;
        }

        Ok(())
    }

    /// Add file to recent files list
    pub fn add_recent_file(&mut self, path: PathBuf) {
        self.recent_files.retain(|f| f != &path);
        self.recent_files.insert(0, path);
        self.recent_files.truncate(self.recent_files_count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.scene.scale, 1000.0);
        assert_eq!(config.jog.tick_interval_ms, 100);
        assert!(config.machine.spindle_on_at_start);
    }

    #[test]
    fn test_scale_range() {
        let mut config = Config::default();
        config.scene.scale = 0.5;
        assert!(matches!(
            config.validate(),
            Err(SettingsError::Config(ConfigError::ValueOutOfRange { .. }))
        ));
        config.scene.scale = 1.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_jog_ranges() {
        let mut config = Config::default();
        config.jog.xy_step = 11.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.jog.speed = 0.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.jog.tick_interval_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unsupported_format() {
        assert!(matches!(
            format_of(Path::new("settings.yaml")),
            Err(SettingsError::Config(ConfigError::UnsupportedFormat(_)))
        ));
        assert_eq!(format_of(Path::new("a.toml")).unwrap(), Format::Toml);
    }

    #[test]
    fn test_recent_files() {
        let mut config = Config {
            recent_files_count: 2,
            ..Default::default()
        };
        config.add_recent_file(PathBuf::from("a.ngc"));
        config.add_recent_file(PathBuf::from("b.ngc"));
        config.add_recent_file(PathBuf::from("a.ngc"));
        config.add_recent_file(PathBuf::from("c.ngc"));
        assert_eq!(
            config.recent_files,
            vec![PathBuf::from("c.ngc"), PathBuf::from("a.ngc")]
        );
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str("[jog]\nxy_step = 0.5\nz_step = 0.2\nspeed = 0.05\ntick_interval_ms = 50\n").unwrap();
        assert_eq!(config.jog.xy_step, 0.5);
        assert_eq!(config.scene, SceneSettings::default());
        assert_eq!(config.recent_files_count, 10);
    }
}
