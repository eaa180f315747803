//! Persistent settings stored as JSON in the user config directory.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::FlagFixError;
use crate::flags::DEFAULT_ICON_BASE;
use crate::model::LogLevel;

const APP_DIR: &str = "zh-flag-fix";
const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Quiet period before a navigation-triggered rescan runs.
    pub debounce_ms: u64,
    pub icon_base_url: String,
    /// Append `?v=<timestamp>` to corrected icon URLs.
    pub cache_bust: bool,
    pub log_level: LogLevel,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            debounce_ms: 50,
            icon_base_url: DEFAULT_ICON_BASE.to_string(),
            cache_bust: true,
            log_level: LogLevel::default(),
        }
    }
}

/// `<config dir>/zh-flag-fix/config.json`, if the platform has a config dir.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
}

/// Load settings, falling back to defaults when missing or unreadable.
pub fn load() -> Config {
    match config_path() {
        Some(path) => load_from(&path),
        None => {
            debug!("No config directory, using defaults");
            Config::default()
        }
    }
}

pub fn load_from(path: &Path) -> Config {
    match try_load_from(path) {
        Ok(Some(config)) => config,
        Ok(None) => {
            debug!(path = %path.display(), "Config file not found, using defaults");
            Config::default()
        }
        Err(e) => {
            warn!(error = %e, "Ignoring config file");
            Config::default()
        }
    }
}

/// `Ok(None)` when the file does not exist.
pub fn try_load_from(path: &Path) -> Result<Option<Config>, FlagFixError> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(FlagFixError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|source| FlagFixError::Config {
            path: path.to_path_buf(),
            source,
        })
}

pub fn save(config: &Config) -> Result<PathBuf, FlagFixError> {
    let path = config_path().ok_or(FlagFixError::NoConfigDir)?;
    save_to(&path, config)?;
    Ok(path)
}

pub fn save_to(path: &Path, config: &Config) -> Result<(), FlagFixError> {
    let write_err = |source| FlagFixError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(write_err)?;
    }
    let json = serde_json::to_string_pretty(config).map_err(|source| FlagFixError::Config {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, json).map_err(write_err)?;
    info!(path = %path.display(), "Config saved");
    Ok(())
}

/// Persist the log level so future runs remember the choice.
pub fn save_log_level(level: LogLevel) -> Result<PathBuf, FlagFixError> {
    let path = config_path().ok_or(FlagFixError::NoConfigDir)?;
    save_log_level_to(&path, level)?;
    Ok(path)
}

pub fn save_log_level_to(path: &Path, level: LogLevel) -> Result<(), FlagFixError> {
    let mut config = load_from(path);
    config.log_level = level;
    save_to(path, &config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("none.json");
        assert!(try_load_from(&path).unwrap().is_none());
        assert_eq!(load_from(&path), Config::default());
    }

    #[test]
    fn save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE);
        let config = Config {
            debounce_ms: 80,
            cache_bust: false,
            log_level: LogLevel::Debug,
            ..Config::default()
        };
        save_to(&path, &config).unwrap();
        assert_eq!(load_from(&path), config);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, r#"{"log_level":"trace"}"#).unwrap();
        let config = load_from(&path);
        assert_eq!(config.log_level, LogLevel::Trace);
        assert_eq!(config.debounce_ms, 50);
    }

    #[test]
    fn malformed_file_is_an_error_but_load_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            try_load_from(&path),
            Err(FlagFixError::Config { .. })
        ));
        assert_eq!(load_from(&path), Config::default());
    }

    #[test]
    fn malformed_file_warns() {
        use std::io::Write;
        use std::sync::{Arc, Mutex};

        #[derive(Clone, Default)]
        struct Captured(Arc<Mutex<Vec<u8>>>);

        impl Write for Captured {
            fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
                self.0.lock().unwrap().extend_from_slice(buf);
                Ok(buf.len())
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "{not json").unwrap();

        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        tracing::subscriber::with_default(subscriber, || load_from(&path));

        let output = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("WARN"), "{output}");
        assert!(output.contains("Ignoring config file"), "{output}");
    }

    #[test]
    fn save_log_level_keeps_other_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        let config = Config {
            debounce_ms: 75,
            ..Config::default()
        };
        save_to(&path, &config).unwrap();

        save_log_level_to(&path, LogLevel::Trace).unwrap();
        let saved = load_from(&path);
        assert_eq!(saved.log_level, LogLevel::Trace);
        assert_eq!(saved.debounce_ms, 75);
    }

    #[test]
    fn save_log_level_reports_write_failure() {
        let dir = tempfile::tempdir().unwrap();
        // A regular file where the config directory should be.
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "").unwrap();
        let path = blocker.join(CONFIG_FILE);

        assert!(matches!(
            save_log_level_to(&path, LogLevel::Debug),
            Err(FlagFixError::Write { .. })
        ));
    }
}
