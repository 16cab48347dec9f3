use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{AgroError, Result};

/// Default location of the accounting store, relative to the working
/// directory. The association keeps one SQLite file per bookkeeping export.
pub const DEFAULT_STORE_PATH: &str = "contabilidad.db";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_store_path")]
    pub store_path: String,
}

fn default_store_path() -> String {
    DEFAULT_STORE_PATH.to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
        }
    }
}

fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("agrodash")
}

fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

pub fn load_settings() -> Settings {
    let path = settings_path();
    if path.exists() {
        let content = std::fs::read_to_string(&path).unwrap_or_default();
        serde_json::from_str(&content).unwrap_or_default()
    } else {
        Settings::default()
    }
}

#[allow(dead_code)]
pub fn save_settings(settings: &Settings) -> Result<()> {
    let dir = config_dir();
    std::fs::create_dir_all(&dir)?;
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| AgroError::Settings(e.to_string()))?;
    std::fs::write(settings_path(), format!("{json}\n"))?;
    Ok(())
}

pub fn get_store_path() -> PathBuf {
    PathBuf::from(&load_settings().store_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let settings = Settings {
            store_path: "/tmp/books/contabilidad.db".to_string(),
        };
        let json = serde_json::to_string_pretty(&settings).unwrap();
        std::fs::write(&path, &json).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        let loaded: Settings = serde_json::from_str(&content).unwrap();
        assert_eq!(loaded.store_path, "/tmp/books/contabilidad.db");
    }

    #[test]
    fn test_defaults_when_missing() {
        let s = Settings::default();
        assert_eq!(s.store_path, DEFAULT_STORE_PATH);
    }

    #[test]
    fn test_load_merges_with_defaults() {
        let s: Settings = serde_json::from_str("{}").unwrap();
        assert_eq!(s.store_path, DEFAULT_STORE_PATH);
    }
}
