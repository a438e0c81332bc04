//! TOML-based host settings.
//!
//! Looked up at `./pacelab.toml`; a missing file means defaults. Command-line
//! flags override anything set here.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use pacelab_core::ConfigError;

use crate::table::Mode;

pub const SETTINGS_FILE: &str = "pacelab.toml";

/// Host settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Trial table read when `--config` is not passed.
    #[serde(default = "default_trial_table")]
    pub trial_table: PathBuf,
    /// Directory the exported result table is written to.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Mode assumed when `--mode` is not passed.
    #[serde(default)]
    pub default_mode: Option<Mode>,
}

fn default_trial_table() -> PathBuf {
    PathBuf::from("config.csv")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            trial_table: default_trial_table(),
            output_dir: default_output_dir(),
            default_mode: None,
        }
    }
}

impl Settings {
    /// Load settings from the working directory, falling back to defaults
    /// when no file exists.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Path::new(SETTINGS_FILE))
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path).map_err(|e| ConfigError::SettingsLoadFailed {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        toml::from_str(&text).map_err(|e| ConfigError::SettingsLoadFailed {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_yields_defaults() {
        let settings = Settings::load_from(Path::new("/nonexistent/pacelab.toml")).unwrap();
        assert_eq!(settings.trial_table, PathBuf::from("config.csv"));
        assert_eq!(settings.output_dir, PathBuf::from("."));
        assert!(settings.default_mode.is_none());
    }

    #[test]
    fn parses_full_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "trial_table = \"trials/session1.csv\"\noutput_dir = \"results\"\ndefault_mode = \"timer\""
        )
        .unwrap();
        let settings = Settings::load_from(file.path()).unwrap();
        assert_eq!(settings.trial_table, PathBuf::from("trials/session1.csv"));
        assert_eq!(settings.output_dir, PathBuf::from("results"));
        assert_eq!(settings.default_mode, Some(Mode::Timer));
    }

    #[test]
    fn malformed_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "trial_table = [not toml").unwrap();
        assert!(matches!(
            Settings::load_from(file.path()),
            Err(ConfigError::SettingsLoadFailed { .. })
        ));
    }
}
