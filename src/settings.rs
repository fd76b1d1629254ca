use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::config;

/// User settings, read from `settings.json` in the user config dir.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Languages to check instead of the locale defaults.
    pub languages: Option<Vec<String>>,
    /// Extra directories searched for dictionaries.
    pub dictionary_dirs: Vec<PathBuf>,
    /// Underline colour for misspelled words, e.g. `#e01b24`.
    pub underline_color: Option<String>,
}

impl Settings {
    pub fn path() -> PathBuf {
        glib::user_config_dir()
            .join(config::USER_DIR_NAME)
            .join(config::SETTINGS_FILE)
    }

    /// Loads the user's settings. A malformed file is reported and ignored.
    pub fn load() -> Self {
        let path = Self::path();
        match Self::load_from(&path) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("Ignoring settings: {:#}", e);
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let settings = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        Ok(settings)
    }

    pub fn underline_rgba(&self) -> Option<gdk::RGBA> {
        let color = self.underline_color.as_deref()?;
        match gdk::RGBA::parse(color) {
            Ok(rgba) => Some(rgba),
            Err(_) => {
                log::warn!("Invalid underline color: {}", color);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load_from(&dir.path().join("settings.json")).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn reads_partial_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"languages": ["de_CH", "en_US"], "underline_color": "blue"}"#).unwrap();

        let settings = Settings::load_from(&path).unwrap();
        assert_eq!(
            settings.languages,
            Some(vec!["de_CH".to_string(), "en_US".to_string()])
        );
        assert!(settings.dictionary_dirs.is_empty());
        let rgba = settings.underline_rgba().unwrap();
        assert_eq!(rgba.blue(), 1.0);
        assert_eq!(rgba.red(), 0.0);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ languages: ").unwrap();
        assert!(Settings::load_from(&path).is_err());
    }

    #[test]
    fn invalid_color_is_ignored() {
        let settings = Settings {
            underline_color: Some("not-a-colour".into()),
            ..Default::default()
        };
        assert!(settings.underline_rgba().is_none());
    }
}
