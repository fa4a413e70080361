//! Per-unit configuration files.
//!
//! A unit at `tests.json` may ship a `tests.json.config` TOML file:
//!
//! ```toml
//! [app_settings]
//! endpoint = "http://localhost:8080"
//!
//! [connection_strings]
//! main = "Server=.;Database=Tests"
//! ```
//!
//! Activation switches the configuration visible to test code for the rest of the process. It can only happen once
//! per process, which is why every unit runs in its own child process.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use miette::Diagnostic;
use serde::Deserialize;
use thiserror::Error;

/// Suffix appended to a unit path to find its configuration file.
pub const CONFIG_SUFFIX: &str = ".config";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct UnitConfig {
    #[serde(default)]
    pub app_settings: BTreeMap<String, String>,
    #[serde(default)]
    pub connection_strings: BTreeMap<String, String>,
}

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("cannot read configuration file '{}'", path.display())]
    #[diagnostic(code(attrun::config::read))]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration file '{}'", path.display())]
    #[diagnostic(code(attrun::config::parse))]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("configuration '{}' is already active; cannot activate '{}' in the same process", active.display(), requested.display())]
    #[diagnostic(
        code(attrun::config::already_active),
        help("run each unit in its own process")
    )]
    AlreadyActive { active: PathBuf, requested: PathBuf },
}

static ACTIVE: OnceLock<(PathBuf, UnitConfig)> = OnceLock::new();

/// `<unit>.config` next to the unit.
pub fn config_path_for(unit: &Path) -> PathBuf {
    let mut path = unit.as_os_str().to_owned();
    path.push(CONFIG_SUFFIX);
    PathBuf::from(path)
}

/// Parse a configuration file without activating it.
pub fn load(path: &Path) -> Result<UnitConfig, ConfigError> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Activate the configuration at `path` for the rest of the process.
///
/// Returns `Ok(false)` without doing anything if the file does not exist. Re-activating the file that is already
/// active is a no-op.
pub fn activate(path: &Path) -> Result<bool, ConfigError> {
    if !path.is_file() {
        return Ok(false);
    }
    if let Some((active, _)) = ACTIVE.get() {
        return if active == path {
            Ok(true)
        } else {
            Err(ConfigError::AlreadyActive {
                active: active.clone(),
                requested: path.to_path_buf(),
            })
        };
    }

    let config = load(path)?;
    tracing::debug!(path = %path.display(), settings = config.app_settings.len(), "activating unit configuration");
    let (active, _) = ACTIVE.get_or_init(|| (path.to_path_buf(), config));
    if active != path {
        return Err(ConfigError::AlreadyActive {
            active: active.clone(),
            requested: path.to_path_buf(),
        });
    }
    Ok(true)
}

/// The active configuration, if any.
pub fn active() -> Option<&'static UnitConfig> {
    ACTIVE.get().map(|(_, config)| config)
}

pub fn app_setting(key: &str) -> Option<&'static str> {
    active()?.app_settings.get(key).map(String::as_str)
}

pub fn connection_string(name: &str) -> Option<&'static str> {
    active()?.connection_strings.get(name).map(String::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_path_appends_the_suffix() {
        assert_eq!(
            config_path_for(Path::new("/units/math.json")),
            PathBuf::from("/units/math.json.config")
        );
    }

    #[test]
    fn missing_file_is_not_activated() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!activate(&dir.path().join("absent.config")).unwrap());
    }

    #[test]
    fn parses_both_sections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("unit.json.config");
        fs::write(
            &path,
            "[app_settings]\nendpoint = \"http://localhost\"\n\n[connection_strings]\nmain = \"db\"\n",
        )
        .unwrap();
        let config = load(&path).unwrap();
        assert_eq!(config.app_settings.get("endpoint").map(String::as_str), Some("http://localhost"));
        assert_eq!(config.connection_strings.get("main").map(String::as_str), Some("db"));
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("unit.json.config");
        fs::write(&path, "[app_settings\n").unwrap();
        assert!(matches!(load(&path), Err(ConfigError::Parse { .. })));
    }
}
