// Settings management and persistence
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::{SettingsStore, SettingsUpdate};
use crate::audio::gain::{clamp_volume, GainSettings, DEFAULT_VOLUME};

pub const SCREEN_BRIGHTNESS_RANGE: (i32, i32) = (50, 100);
pub const TEXT_SIZE_RANGE: (i32, i32) = (80, 200);

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to access settings file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse settings: {0}")]
    Json(#[from] serde_json::Error),
}

/// Everything the reader can adjust from the settings board
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorySettings {
    pub version: i32, // Settings schema version for future migrations
    pub volume: i32, // 0-100
    pub muted: bool,
    pub screen_brightness: i32, // 50-100
    pub text_size: i32, // 80-200
}

impl Default for StorySettings {
    fn default() -> Self {
        Self {
            version: 1,
            volume: DEFAULT_VOLUME as i32,
            muted: false,
            screen_brightness: 100,
            text_size: 100,
        }
    }
}

impl StorySettings {
    /// Get the settings file path
    pub fn get_settings_path(app_dir: &Path) -> PathBuf {
        app_dir.join("settings.json")
    }

    /// Load settings from file, or return defaults if file doesn't exist
    pub fn load(app_dir: &Path) -> Result<Self, SettingsError> {
        let path = Self::get_settings_path(app_dir);

        if !path.exists() {
            tracing::info!("[Settings] No settings file found, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path).map_err(|source| SettingsError::Io {
            path: path.clone(),
            source,
        })?;
        let settings: StorySettings = serde_json::from_str(&content)?;

        tracing::info!("[Settings] Loaded settings from {:?}", path);
        Ok(settings.sanitized())
    }

    /// Save settings to file
    pub fn save(&self, app_dir: &Path) -> Result<(), SettingsError> {
        // Ensure directory exists
        fs::create_dir_all(app_dir).map_err(|source| SettingsError::Io {
            path: app_dir.to_path_buf(),
            source,
        })?;

        let path = Self::get_settings_path(app_dir);
        let content = serde_json::to_string_pretty(self)?;
        fs::write(&path, content).map_err(|source| SettingsError::Io {
            path: path.clone(),
            source,
        })?;

        tracing::debug!("[Settings] Saved settings to {:?}", path);
        Ok(())
    }

    /// Pull hand-edited or stale values back into their slider ranges
    pub fn sanitized(mut self) -> Self {
        self.volume = clamp_volume(self.volume) as i32;
        self.screen_brightness = self
            .screen_brightness
            .clamp(SCREEN_BRIGHTNESS_RANGE.0, SCREEN_BRIGHTNESS_RANGE.1);
        self.text_size = self.text_size.clamp(TEXT_SIZE_RANGE.0, TEXT_SIZE_RANGE.1);
        self
    }

    pub fn gain(&self) -> GainSettings {
        GainSettings {
            volume: clamp_volume(self.volume),
            muted: self.muted,
        }
    }
}

/// Settings store backed by `settings.json` in the app data directory.
/// Every update is written through; a failed write is logged and the
/// in-memory value still wins.
#[derive(Debug)]
pub struct JsonSettingsStore {
    app_dir: PathBuf,
    settings: StorySettings,
}

impl JsonSettingsStore {
    pub fn open(app_dir: impl Into<PathBuf>) -> Result<Self, SettingsError> {
        let app_dir = app_dir.into();
        let settings = StorySettings::load(&app_dir)?;
        Ok(Self { app_dir, settings })
    }

    /// Start from defaults; the file is (re)written on the first update
    pub fn with_defaults(app_dir: impl Into<PathBuf>) -> Self {
        Self {
            app_dir: app_dir.into(),
            settings: StorySettings::default(),
        }
    }

    pub fn settings(&self) -> &StorySettings {
        &self.settings
    }

    pub fn set_screen_brightness(&mut self, brightness: i32) {
        self.settings.screen_brightness = brightness;
        self.persist();
    }

    pub fn set_text_size(&mut self, text_size: i32) {
        self.settings.text_size = text_size;
        self.persist();
    }

    fn persist(&mut self) {
        self.settings = self.settings.clone().sanitized();
        if let Err(e) = self.settings.save(&self.app_dir) {
            tracing::warn!("[Settings] {}", e);
        }
    }
}

impl SettingsStore for JsonSettingsStore {
    fn read(&self) -> GainSettings {
        self.settings.gain()
    }

    fn update(&mut self, update: SettingsUpdate) {
        if let Some(volume) = update.volume {
            self.settings.volume = volume as i32;
        }
        if let Some(muted) = update.muted {
            self.settings.muted = muted;
        }
        self.persist();
    }
}
