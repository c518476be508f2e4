//! On-disk configuration document.

use crate::error::Error;

use log::warn;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// The persisted application settings.
///
/// Field names are PascalCase on disk (`ScreenWidth`, `ScreenHeight`,
/// `BrightnessPercent`) to stay compatible with the configuration document
/// written by the original companion app. Missing fields fall back to their
/// defaults, so a partial or empty document still loads.
///
/// The service only ever reads snapshots of these values; writing the
/// document back is the settings UI's job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct AppConfig {
    /// Logical desktop width, used only to center the capture window.
    pub screen_width: u32,
    /// Logical desktop height, used only to center the capture window.
    pub screen_height: u32,
    /// User brightness setting, 0-100.
    pub brightness_percent: u8,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            screen_width: 3840,
            screen_height: 2160,
            brightness_percent: 80,
        }
    }
}

impl AppConfig {
    /// Load the configuration from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let data = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Load the configuration, falling back to defaults if the file is
    /// missing or malformed. The fallback is logged, never fatal.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(config) => config,
            Err(err) => {
                warn!("could not load {}: {err}; using defaults", path.display());
                Self::default()
            }
        }
    }

    /// Write the configuration to a JSON file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), Error> {
        let data = serde_json::to_string_pretty(self)?;
        fs::write(path, data)?;
        Ok(())
    }

    /// Brightness clamped to the valid 0-100 range.
    ///
    /// The owning store already clamps on write; this guards against
    /// out-of-range values sneaking in through a hand-edited document.
    pub fn brightness(&self) -> u8 {
        self.brightness_percent.min(100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_original_app() {
        let config = AppConfig::default();
        assert_eq!(config.screen_width, 3840);
        assert_eq!(config.screen_height, 2160);
        assert_eq!(config.brightness_percent, 80);
    }

    #[test]
    fn loads_pascal_case_document() {
        let json = r#"{"ScreenWidth":2560,"ScreenHeight":1440,"BrightnessPercent":55}"#;
        let config: AppConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.screen_width, 2560);
        assert_eq!(config.screen_height, 1440);
        assert_eq!(config.brightness_percent, 55);
    }

    #[test]
    fn partial_document_uses_defaults() {
        let config: AppConfig = serde_json::from_str(r#"{"BrightnessPercent":10}"#).unwrap();
        assert_eq!(config.brightness_percent, 10);
        assert_eq!(config.screen_width, 3840);
    }

    #[test]
    fn round_trips_through_json() {
        let config = AppConfig {
            screen_width: 1920,
            screen_height: 1080,
            brightness_percent: 30,
        };
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"ScreenWidth\":1920"));
        assert_eq!(serde_json::from_str::<AppConfig>(&json).unwrap(), config);
    }

    #[test]
    fn out_of_range_brightness_is_clamped_on_read() {
        let config: AppConfig = serde_json::from_str(r#"{"BrightnessPercent":255}"#).unwrap();
        assert_eq!(config.brightness(), 100);
    }
}
