// Audio player implementation
// One rodio Sink per playing sound, fed by the symphonia decoder
use cpal::traits::{DeviceTrait, HostTrait};
use rodio::source::EmptyCallback;
use rodio::{OutputStream, OutputStreamHandle, Sink, Source};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Sender};
use std::thread;

use super::backend::{FinishedSignal, PlaybackError, SoundBackend, SoundHandle, SoundLoader, StartRequest};
use super::decoder::{AudioDecoder, DecodedSource};
use super::slot::SoundSource;

pub struct RodioBackend {
    stream_handle: OutputStreamHandle,
    loader: AssetLoader,
    completions: Sender<FinishedSignal>,
}

/// Opens sound files under the asset root and primes their decoders
#[derive(Debug, Clone)]
pub struct AssetLoader {
    asset_root: PathBuf,
}

impl RodioBackend {
    /// Open the default output device.
    ///
    /// The returned `OutputStream` must outlive the backend; dropping it
    /// silences every sink.
    pub fn open_default(asset_root: impl Into<PathBuf>) -> Result<(Self, OutputStream), PlaybackError> {
        let device_name = cpal::default_host()
            .default_output_device()
            .and_then(|d| d.name().ok());

        let (stream, stream_handle) = OutputStream::try_default().map_err(|e| {
            tracing::warn!("Failed to open audio output: {}", e);
            PlaybackError::DeviceUnavailable
        })?;
        tracing::info!(
            "[Audio] Output device: {}",
            device_name.as_deref().unwrap_or("default")
        );

        let completions = spawn_completion_dispatcher()?;
        Ok((
            Self {
                stream_handle,
                loader: AssetLoader::new(asset_root),
                completions,
            },
            stream,
        ))
    }
}

impl AssetLoader {
    pub fn new(asset_root: impl Into<PathBuf>) -> Self {
        Self {
            asset_root: asset_root.into(),
        }
    }

    /// Map a source onto a file under the asset root.
    /// `/audio/x.mp3` and `audio/x.mp3` both resolve inside the root.
    pub fn resolve(&self, source: &SoundSource) -> PathBuf {
        resolve_source(&self.asset_root, source)
    }
}

impl SoundLoader for AssetLoader {
    type Prepared = DecodedSource;

    fn load(&self, source: &SoundSource) -> Result<DecodedSource, PlaybackError> {
        let decoder = AudioDecoder::open(&self.resolve(source))?;
        Ok(DecodedSource::new(decoder))
    }
}

fn resolve_source(asset_root: &Path, source: &SoundSource) -> PathBuf {
    asset_root.join(source.as_str().trim_start_matches('/'))
}

/// End-of-sound notices arrive on rodio's audio thread. They are handed to
/// this thread so coordinator callbacks never run inside the mixer.
fn spawn_completion_dispatcher() -> Result<Sender<FinishedSignal>, PlaybackError> {
    let (tx, rx) = mpsc::channel::<FinishedSignal>();
    thread::Builder::new()
        .name("audio-completions".to_string())
        .spawn(move || {
            for signal in rx {
                signal.notify();
            }
        })
        .map_err(|e| PlaybackError::Stream(format!("Failed to spawn completion thread: {}", e)))?;
    Ok(tx)
}

impl SoundBackend for RodioBackend {
    type Handle = RodioHandle;
    type Loader = AssetLoader;

    fn loader(&self) -> AssetLoader {
        self.loader.clone()
    }

    fn start(
        &mut self,
        source: DecodedSource,
        request: StartRequest<'_>,
        finished: FinishedSignal,
    ) -> Result<RodioHandle, PlaybackError> {
        let sink = Sink::try_new(&self.stream_handle)
            .map_err(|e| PlaybackError::Stream(format!("Failed to create audio sink: {}", e)))?;
        sink.set_volume(request.gain);

        if request.looping {
            sink.append(source.repeat_infinite());
        } else {
            sink.append(source);
            let completions = self.completions.clone();
            sink.append(EmptyCallback::<f32>::new(Box::new(move || {
                let _ = completions.send(finished.clone());
            })));
        }
        sink.play();

        Ok(RodioHandle { sink })
    }
}

pub struct RodioHandle {
    sink: Sink,
}

impl SoundHandle for RodioHandle {
    fn set_gain(&self, gain: f32) {
        self.sink.set_volume(gain.clamp(0.0, 1.0));
    }

    fn stop(&self) {
        self.sink.stop();
    }
}
