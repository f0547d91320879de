// Settings store contract consumed by the audio coordinator
pub mod settings;

pub use settings::{JsonSettingsStore, SettingsError, StorySettings};

use crate::audio::gain::GainSettings;

/// Partial update; `None` fields are left alone
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SettingsUpdate {
    pub volume: Option<u8>,
    pub muted: Option<bool>,
}

/// Source of truth for volume and mute.
///
/// `update` must be visible to the next `read` on the same store. How (or
/// whether) it is persisted is up to the implementation.
pub trait SettingsStore: Send + 'static {
    fn read(&self) -> GainSettings;

    fn update(&mut self, update: SettingsUpdate);
}

/// In-process store with no persistence
#[derive(Debug, Clone, Default)]
pub struct MemorySettings {
    settings: GainSettings,
}

impl MemorySettings {
    pub fn new(settings: GainSettings) -> Self {
        Self { settings }
    }
}

impl SettingsStore for MemorySettings {
    fn read(&self) -> GainSettings {
        self.settings
    }

    fn update(&mut self, update: SettingsUpdate) {
        if let Some(volume) = update.volume {
            self.settings.volume = volume.min(100);
        }
        if let Some(muted) = update.muted {
            self.settings.muted = muted;
        }
    }
}
