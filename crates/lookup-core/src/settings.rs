//! Persisted user settings and the read-only snapshot handed to the engine

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::config::get_config_bool;
use crate::error::{Error, Result};

/// Member filters, as stored in the settings document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    pub include_unsupported: bool,
    pub include_private: bool,
    pub include_static: bool,
    pub include_fields: bool,
    pub include_events: bool,
    pub include_extensions: bool,
    pub include_root_hierarchy: bool,
    pub show_time_column: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            include_unsupported: false,
            include_private: false,
            include_static: false,
            include_fields: false,
            include_events: false,
            include_extensions: true,
            include_root_hierarchy: false,
            show_time_column: true,
        }
    }
}

impl Settings {
    /// Freeze the current values into a snapshot
    pub fn snapshot(&self) -> SettingsSnapshot {
        SettingsSnapshot {
            include_unsupported: self.include_unsupported,
            include_private: self.include_private,
            include_static: self.include_static,
            include_fields: self.include_fields,
            include_events: self.include_events,
            include_extensions: self.include_extensions,
            include_root_hierarchy: self.include_root_hierarchy,
        }
    }

    /// Apply `LOOKUP_INCLUDE_*` / `LOOKUP_SHOW_TIME_COLUMN` environment overrides
    pub fn apply_env_overrides(&mut self) {
        let flags: [(&str, &mut bool); 8] = [
            ("LOOKUP_INCLUDE_UNSUPPORTED", &mut self.include_unsupported),
            ("LOOKUP_INCLUDE_PRIVATE", &mut self.include_private),
            ("LOOKUP_INCLUDE_STATIC", &mut self.include_static),
            ("LOOKUP_INCLUDE_FIELDS", &mut self.include_fields),
            ("LOOKUP_INCLUDE_EVENTS", &mut self.include_events),
            ("LOOKUP_INCLUDE_EXTENSIONS", &mut self.include_extensions),
            ("LOOKUP_INCLUDE_ROOT_HIERARCHY", &mut self.include_root_hierarchy),
            ("LOOKUP_SHOW_TIME_COLUMN", &mut self.show_time_column),
        ];
        for (key, flag) in flags {
            if let Some(value) = get_config_bool(key) {
                debug!(key, value, "Settings override from environment");
                *flag = value;
            }
        }
    }
}

/// Immutable view of the member filters consulted during a pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SettingsSnapshot {
    pub include_unsupported: bool,
    pub include_private: bool,
    pub include_static: bool,
    pub include_fields: bool,
    pub include_events: bool,
    pub include_extensions: bool,
    pub include_root_hierarchy: bool,
}

impl Default for SettingsSnapshot {
    fn default() -> Self {
        Settings::default().snapshot()
    }
}

impl SettingsSnapshot {
    /// Snapshot with every filter switched on
    pub fn everything() -> Self {
        Self {
            include_unsupported: true,
            include_private: true,
            include_static: true,
            include_fields: true,
            include_events: true,
            include_extensions: true,
            include_root_hierarchy: true,
        }
    }

    pub fn with_private(mut self, enabled: bool) -> Self {
        self.include_private = enabled;
        self
    }

    pub fn with_static(mut self, enabled: bool) -> Self {
        self.include_static = enabled;
        self
    }

    pub fn with_fields(mut self, enabled: bool) -> Self {
        self.include_fields = enabled;
        self
    }

    pub fn with_events(mut self, enabled: bool) -> Self {
        self.include_events = enabled;
        self
    }

    pub fn with_unsupported(mut self, enabled: bool) -> Self {
        self.include_unsupported = enabled;
        self
    }

    pub fn with_extensions(mut self, enabled: bool) -> Self {
        self.include_extensions = enabled;
        self
    }

    pub fn with_root_hierarchy(mut self, enabled: bool) -> Self {
        self.include_root_hierarchy = enabled;
        self
    }
}

/// JSON settings document on disk
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the document; a missing file yields defaults.
    pub fn load(&self) -> Result<Settings> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "Settings file missing, using defaults");
            return Ok(Settings::default());
        }

        let content = fs::read_to_string(&self.path)?;
        let settings: Settings = serde_json::from_str(&content).map_err(|e| {
            Error::settings(format!("{}: {}", self.path.display(), e))
        })?;
        info!(path = %self.path.display(), "Loaded settings");
        Ok(settings)
    }

    /// Load the document and apply environment overrides on top
    pub fn load_with_env(&self) -> Result<Settings> {
        let mut settings = self.load()?;
        settings.apply_env_overrides();
        Ok(settings)
    }

    pub fn save(&self, settings: &Settings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, serde_json::to_string_pretty(settings)?)?;
        debug!(path = %self.path.display(), "Saved settings");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json"));
        assert_eq!(store.load().unwrap(), Settings::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("nested").join("settings.json"));
        let settings = Settings {
            include_private: true,
            show_time_column: false,
            ..Settings::default()
        };
        store.save(&settings).unwrap();
        assert_eq!(store.load().unwrap(), settings);
    }

    #[test]
    fn test_partial_document_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{ "includeStatic": true }"#).unwrap();

        let settings = SettingsStore::new(&path).load().unwrap();
        assert!(settings.include_static);
        assert!(settings.include_extensions);
        assert!(!settings.include_private);
    }

    #[test]
    fn test_malformed_document_is_settings_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();

        let err = SettingsStore::new(&path).load().unwrap_err();
        assert!(matches!(err, Error::Settings(_)));
    }

    #[test]
    fn test_snapshot_copies_filters() {
        let settings = Settings {
            include_fields: true,
            include_events: true,
            ..Settings::default()
        };
        let snapshot = settings.snapshot();
        assert!(snapshot.include_fields);
        assert!(snapshot.include_events);
        assert!(!snapshot.include_private);
        assert_eq!(SettingsSnapshot::default().with_fields(true).with_events(true), snapshot);
    }
}
