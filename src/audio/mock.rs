// Recording backend for coordinator tests
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;

use super::backend::{FinishedSignal, PlaybackError, SoundBackend, SoundHandle, SoundLoader, StartRequest};
use super::slot::SoundSource;

type LoadHook = Arc<dyn Fn() + Send + Sync>;

/// Everything the mock knows about one started sound
#[derive(Debug, Clone)]
pub struct MockSound {
    pub source: String,
    pub gain: f32,
    pub looping: bool,
    pub stopped: bool,
    finished: FinishedSignal,
}

#[derive(Default)]
struct MockLog {
    sounds: Vec<MockSound>,
    failing: HashSet<String>,
    on_load: Option<LoadHook>,
}

/// Test double that records every sound instance. Cloning shares the log,
/// so a test keeps one clone and hands the other to the coordinator.
#[derive(Clone, Default)]
pub struct MockBackend {
    log: Arc<Mutex<MockLog>>,
}

pub struct MockHandle {
    index: usize,
    log: Arc<Mutex<MockLog>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every later load of `source` fail
    pub fn fail_on(&self, source: &str) {
        self.log.lock().failing.insert(source.to_string());
    }

    /// Run `hook` at the start of every load, with the mock's lock released
    pub fn on_load<F>(&self, hook: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.log.lock().on_load = Some(Arc::new(hook));
    }

    /// All sounds started so far, in start order
    pub fn sounds(&self) -> Vec<MockSound> {
        self.log.lock().sounds.clone()
    }

    /// The most recent instance of `source`
    pub fn last(&self, source: &str) -> MockSound {
        self.log
            .lock()
            .sounds
            .iter()
            .rev()
            .find(|s| s.source == source)
            .cloned()
            .unwrap_or_else(|| panic!("{source} was never started"))
    }

    pub fn gain_of(&self, source: &str) -> f32 {
        self.last(source).gain
    }

    /// Sounds started and not stopped
    pub fn playing(&self) -> Vec<String> {
        self.log
            .lock()
            .sounds
            .iter()
            .filter(|s| !s.stopped)
            .map(|s| s.source.clone())
            .collect()
    }

    /// Simulate the most recent instance of `source` reaching its end.
    /// The signal fires with the mock's lock released.
    pub fn finish(&self, source: &str) {
        let signal = {
            let mut log = self.log.lock();
            let sound = log
                .sounds
                .iter_mut()
                .rev()
                .find(|s| s.source == source)
                .unwrap_or_else(|| panic!("{source} was never started"));
            sound.stopped = true;
            sound.finished.clone()
        };
        signal.notify();
    }

    /// Fire the end notice of an instance that may already be stopped
    pub fn fire_stale(&self, index: usize) {
        let signal = self.log.lock().sounds[index].finished.clone();
        signal.notify();
    }
}

impl SoundLoader for MockBackend {
    type Prepared = ();

    fn load(&self, source: &SoundSource) -> Result<(), PlaybackError> {
        let hook = self.log.lock().on_load.clone();
        if let Some(hook) = hook {
            hook();
        }
        if self.log.lock().failing.contains(source.as_str()) {
            return Err(PlaybackError::SourceNotFound(source.as_str().into()));
        }
        Ok(())
    }
}

impl SoundBackend for MockBackend {
    type Handle = MockHandle;
    type Loader = MockBackend;

    fn loader(&self) -> MockBackend {
        self.clone()
    }

    fn start(
        &mut self,
        _prepared: (),
        request: StartRequest<'_>,
        finished: FinishedSignal,
    ) -> Result<MockHandle, PlaybackError> {
        let mut log = self.log.lock();
        log.sounds.push(MockSound {
            source: request.source.as_str().to_string(),
            gain: request.gain,
            looping: request.looping,
            stopped: false,
            finished,
        });
        Ok(MockHandle {
            index: log.sounds.len() - 1,
            log: self.log.clone(),
        })
    }
}

impl SoundHandle for MockHandle {
    fn set_gain(&self, gain: f32) {
        self.log.lock().sounds[self.index].gain = gain;
    }

    fn stop(&self) {
        self.log.lock().sounds[self.index].stopped = true;
    }
}
