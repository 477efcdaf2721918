//! Errors from reading, writing and checking emulator settings

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SettingsError {
    /// A value failed validation
    #[error("Invalid setting '{key}': {reason}")]
    InvalidSetting { key: String, reason: String },

    /// No platform config directory to fall back on
    #[error("Config directory error: {0}")]
    ConfigDirectory(String),

    #[error("Settings file I/O failed: {0}")]
    Io(#[from] io::Error),

    #[error("Malformed JSON settings: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Malformed TOML settings: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Could not encode settings as TOML: {0}")]
    TomlWrite(#[from] toml::ser::Error),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Problems with the file itself or with a bounded value
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Only `.json` and `.toml` are understood
    #[error("Unsupported config format: {0}")]
    UnsupportedFormat(String),

    #[error("Value out of range for '{key}': {value} (expected {min}..={max})")]
    ValueOutOfRange {
        key: String,
        value: f64,
        min: f64,
        max: f64,
    },
}

pub type SettingsResult<T> = Result<T, SettingsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_error_display() {
        let err = SettingsError::InvalidSetting {
            key: "scene.marker_name".to_string(),
            reason: "must not be empty".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid setting 'scene.marker_name': must not be empty"
        );

        let err = SettingsError::ConfigDirectory("no home".to_string());
        assert_eq!(err.to_string(), "Config directory error: no home");
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::UnsupportedFormat("yaml".to_string());
        assert_eq!(err.to_string(), "Unsupported config format: yaml");

        let err = ConfigError::ValueOutOfRange {
            key: "scene.scale".to_string(),
            value: 0.5,
            min: 1.0,
            max: 1000.0,
        };
        assert_eq!(
            err.to_string(),
            "Value out of range for 'scene.scale': 0.5 (expected 1..=1000)"
        );
    }

    #[test]
    fn test_error_conversion() {
        let config_err = ConfigError::UnsupportedFormat("ini".to_string());
        let settings_err: SettingsError = config_err.into();
        assert!(matches!(settings_err, SettingsError::Config(_)));

        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let settings_err: SettingsError = io_err.into();
        assert!(matches!(settings_err, SettingsError::Io(_)));
    }
}
