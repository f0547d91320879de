// Application state management
use anyhow::{Context, Result};
use rodio::OutputStream;
use std::path::{Path, PathBuf};

use crate::audio::backend::{FinishedSignal, SoundLoader, StartRequest};
use crate::audio::decoder::DecodedSource;
use crate::audio::player::{AssetLoader, RodioHandle};
use crate::audio::slot::SoundSource;
use crate::audio::{AudioCoordinator, PlaybackError, RodioBackend, SilentBackend, SoundBackend};
use crate::catalog::AudioCatalog;
use crate::settings::JsonSettingsStore;

/// The output actually in use: a real device, or silence when none opened
pub enum OutputBackend {
    Device(RodioBackend),
    Silent(SilentBackend),
}

#[derive(Debug, Clone)]
pub enum OutputLoader {
    Device(AssetLoader),
    Silent(SilentBackend),
}

impl SoundLoader for OutputLoader {
    type Prepared = DecodedSource;

    fn load(&self, source: &SoundSource) -> Result<DecodedSource, PlaybackError> {
        match self {
            OutputLoader::Device(loader) => loader.load(source),
            OutputLoader::Silent(loader) => match loader.load(source)? {},
        }
    }
}

impl SoundBackend for OutputBackend {
    type Handle = RodioHandle;
    type Loader = OutputLoader;

    fn loader(&self) -> OutputLoader {
        match self {
            OutputBackend::Device(backend) => OutputLoader::Device(backend.loader()),
            OutputBackend::Silent(backend) => OutputLoader::Silent(backend.loader()),
        }
    }

    fn start(
        &mut self,
        prepared: DecodedSource,
        request: StartRequest<'_>,
        finished: FinishedSignal,
    ) -> Result<RodioHandle, PlaybackError> {
        match self {
            OutputBackend::Device(backend) => backend.start(prepared, request, finished),
            OutputBackend::Silent(_) => Err(PlaybackError::DeviceUnavailable),
        }
    }
}

pub type StoryAudio = AudioCoordinator<OutputBackend, JsonSettingsStore>;

pub struct AppState {
    pub audio: StoryAudio,
    pub catalog: AudioCatalog,
    pub app_dir: PathBuf,
    // Keeps the device open; dropping it silences every sink
    stream: Option<OutputStream>,
}

impl AppState {
    /// Open settings, catalog and audio output under `app_dir`:
    /// `settings.json`, `catalog.json` and `assets/`.
    pub fn open(app_dir: impl Into<PathBuf>) -> Result<Self> {
        let app_dir = app_dir.into();

        let settings = open_settings(&app_dir);
        let catalog = AudioCatalog::load(&app_dir.join("catalog.json"))
            .context("Failed to load audio catalog")?;

        let (backend, stream) = match RodioBackend::open_default(app_dir.join("assets")) {
            Ok((backend, stream)) => (OutputBackend::Device(backend), Some(stream)),
            Err(e) => {
                tracing::warn!("[Audio] {}; continuing without sound", e);
                (OutputBackend::Silent(SilentBackend), None)
            }
        };

        Ok(Self {
            audio: AudioCoordinator::new(backend, settings),
            catalog,
            app_dir,
            stream,
        })
    }

    pub fn has_output(&self) -> bool {
        self.stream.is_some()
    }
}

/// A corrupt settings file must not keep the story from starting
fn open_settings(app_dir: &Path) -> JsonSettingsStore {
    match JsonSettingsStore::open(app_dir) {
        Ok(store) => store,
        Err(e) => {
            tracing::warn!("[Settings] {}; falling back to defaults", e);
            JsonSettingsStore::with_defaults(app_dir)
        }
    }
}
