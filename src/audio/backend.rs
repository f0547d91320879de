// Seam between the coordinator and whatever actually makes sound
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

use super::slot::SoundSource;

#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("Sound source not found: {0:?}")]
    SourceNotFound(PathBuf),

    #[error("Failed to decode {path}: {message}")]
    Decode { path: String, message: String },

    #[error("No audio output device available")]
    DeviceUnavailable,

    #[error("Audio stream error: {0}")]
    Stream(String),
}

/// What the coordinator asks a backend to play
#[derive(Debug, Clone)]
pub struct StartRequest<'a> {
    pub source: &'a SoundSource,
    pub gain: f32,
    pub looping: bool,
}

/// Fired by a backend when a sound reaches its natural end.
///
/// Backends may fire it from any thread and more than once; the
/// coordinator ignores everything after the first notice for a sound.
#[derive(Clone)]
pub struct FinishedSignal(Arc<dyn Fn() + Send + Sync>);

impl FinishedSignal {
    pub fn new<F>(notify: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self(Arc::new(notify))
    }

    pub fn notify(&self) {
        (self.0)()
    }
}

impl fmt::Debug for FinishedSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FinishedSignal")
    }
}

/// A sound that has been started
pub trait SoundHandle: Send {
    /// Change loudness in place, without restarting
    fn set_gain(&self, gain: f32);

    fn stop(&self);
}

/// Opens a source and decodes far enough to start playing it.
///
/// Runs on the caller's thread before the coordinator takes its lock, so
/// slow file access never holds up other slots or completion callbacks.
pub trait SoundLoader: Send + Sync + 'static {
    type Prepared: Send;

    fn load(&self, source: &SoundSource) -> Result<Self::Prepared, PlaybackError>;
}

/// What a backend's loader hands back for `start`
pub type Prepared<B> = <<B as SoundBackend>::Loader as SoundLoader>::Prepared;

pub trait SoundBackend: Send + 'static {
    type Handle: SoundHandle + 'static;
    type Loader: SoundLoader;

    fn loader(&self) -> Self::Loader;

    fn start(
        &mut self,
        prepared: <Self::Loader as SoundLoader>::Prepared,
        request: StartRequest<'_>,
        finished: FinishedSignal,
    ) -> Result<Self::Handle, PlaybackError>;
}

/// Backend used when no output device could be opened
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentBackend;

/// Never constructed; `SilentBackend` refuses every load
#[derive(Debug)]
pub enum NoSound {}

impl SoundHandle for NoSound {
    fn set_gain(&self, _gain: f32) {
        match *self {}
    }

    fn stop(&self) {
        match *self {}
    }
}

impl SoundLoader for SilentBackend {
    type Prepared = NoSound;

    fn load(&self, _source: &SoundSource) -> Result<NoSound, PlaybackError> {
        Err(PlaybackError::DeviceUnavailable)
    }
}

impl SoundBackend for SilentBackend {
    type Handle = NoSound;
    type Loader = SilentBackend;

    fn loader(&self) -> SilentBackend {
        *self
    }

    fn start(
        &mut self,
        prepared: NoSound,
        _request: StartRequest<'_>,
        _finished: FinishedSignal,
    ) -> Result<NoSound, PlaybackError> {
        match prepared {}
    }
}
