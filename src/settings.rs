//! Mission settings
//!
//! Loaded from a JSON file next to the level data. A missing file is not an
//! error; a malformed one is.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::SettingsError;
use crate::sim::geometry::Rectangle;
use crate::tuning::Tuning;

/// Per-mission settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Play field ===
    pub play_field_width: f64,
    pub play_field_height: f64,

    // === Run ===
    /// Seed for cosmetic randomness
    pub seed: u64,
    /// Deaths never cost a life
    pub unlimited_lives: bool,

    // === Balance ===
    pub tuning: Tuning,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            play_field_width: 1500.0,
            play_field_height: 1500.0,
            seed: 0,
            unlimited_lives: false,
            tuning: Tuning::default(),
        }
    }
}

impl Settings {
    /// Visible screen area in world coordinates
    pub fn play_field(&self) -> Rectangle {
        Rectangle::new(0.0, 0.0, self.play_field_width, self.play_field_height)
    }

    pub fn from_json_str(json: &str) -> Result<Self, SettingsError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load settings from `path`, falling back to defaults if it is missing
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(json) => {
                let settings = Self::from_json_str(&json)?;
                log::info!("Loaded settings from {}", path.display());
                Ok(settings)
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {
                log::info!("No settings at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(source) => Err(SettingsError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_uses_defaults() {
        let settings = Settings::load("/definitely/not/here/settings.json").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.play_field(), Rectangle::new(0.0, 0.0, 1500.0, 1500.0));
    }

    #[test]
    fn test_partial_json() {
        let settings =
            Settings::from_json_str(r#"{ "seed": 42, "tuning": { "player_speed": 0.4 } }"#).unwrap();
        assert_eq!(settings.seed, 42);
        assert_eq!(settings.play_field_width, 1500.0);
        assert_eq!(settings.tuning.player_speed, 0.4);
        assert_eq!(settings.tuning.border_margin, Tuning::default().border_margin);
    }

    #[test]
    fn test_malformed_json_is_error() {
        assert!(matches!(
            Settings::from_json_str("{ seed: "),
            Err(SettingsError::Parse(_))
        ));
    }
}
