// Audio coordinator
// Four playback slots (bgm, ambient, voice, sfx), each holding at most one sound.
// Gain always follows the settings store; voice lines duck background music.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::{Arc, Weak};

use super::backend::{FinishedSignal, PlaybackError, Prepared, SoundBackend, SoundHandle, SoundLoader, StartRequest};
use super::gain::{clamp_volume, compute_gain, effective_gain, GainSettings, AMBIENT_FACTOR};
use super::slot::{Ducking, PlaybackSlot, SoundId, SoundSource, VoiceLine};
use crate::settings::{SettingsStore, SettingsUpdate};

/// Callback run once when a voice line or effect plays to its end
pub type OnEnded = Box<dyn FnOnce() + Send + 'static>;

struct Occupant<H> {
    id: SoundId,
    source: SoundSource,
    handle: H,
    /// Slot-specific loudness factor (voice multiplier, ambient 0.6, otherwise 1)
    factor: f32,
    on_ended: Option<OnEnded>,
}

struct Shared<B: SoundBackend, S> {
    backend: B,
    settings: S,
    slots: HashMap<PlaybackSlot, Occupant<B::Handle>>,
    ducking: Ducking,
    next_id: u64,
}

/// Mediates all sound playback for the story pages.
///
/// Clones share the same slots and settings, so every page can hold one.
/// Operations never fail: sounds that cannot start leave their slot empty.
/// Sounds are loaded before the shared state is locked.
pub struct AudioCoordinator<B: SoundBackend, S: SettingsStore> {
    shared: Arc<Mutex<Shared<B, S>>>,
    loader: Arc<B::Loader>,
}

/// Handle that does not keep the coordinator alive. Callbacks stored in a
/// slot hold one of these instead of a clone.
pub struct WeakCoordinator<B: SoundBackend, S: SettingsStore> {
    shared: Weak<Mutex<Shared<B, S>>>,
    loader: Arc<B::Loader>,
}

impl<B: SoundBackend, S: SettingsStore> Clone for AudioCoordinator<B, S> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            loader: Arc::clone(&self.loader),
        }
    }
}

impl<B: SoundBackend, S: SettingsStore> Clone for WeakCoordinator<B, S> {
    fn clone(&self) -> Self {
        Self {
            shared: Weak::clone(&self.shared),
            loader: Arc::clone(&self.loader),
        }
    }
}

impl<B: SoundBackend, S: SettingsStore> WeakCoordinator<B, S> {
    /// `None` once every `AudioCoordinator` clone has been dropped
    pub fn upgrade(&self) -> Option<AudioCoordinator<B, S>> {
        Some(AudioCoordinator {
            shared: self.shared.upgrade()?,
            loader: Arc::clone(&self.loader),
        })
    }
}

impl<B: SoundBackend, S: SettingsStore> AudioCoordinator<B, S> {
    pub fn new(backend: B, settings: S) -> Self {
        let loader = Arc::new(backend.loader());
        Self {
            shared: Arc::new(Mutex::new(Shared {
                backend,
                settings,
                slots: HashMap::new(),
                ducking: Ducking::Normal,
                next_id: 0,
            })),
            loader,
        }
    }

    pub fn downgrade(&self) -> WeakCoordinator<B, S> {
        WeakCoordinator {
            shared: Arc::downgrade(&self.shared),
            loader: Arc::clone(&self.loader),
        }
    }

    /// Run `f` on the settings store under the coordinator's lock, then
    /// bring every playing sound to whatever gain the store now reports
    pub fn with_settings<R>(&self, f: impl FnOnce(&mut S) -> R) -> R {
        let mut shared = self.shared.lock();
        let result = f(&mut shared.settings);
        let base = shared.base_gain();
        shared.rescale(base);
        result
    }

    /// Current base gain: 0 when muted, otherwise volume / 100
    pub fn compute_gain(&self) -> f32 {
        compute_gain(self.shared.lock().settings.read())
    }

    pub fn volume(&self) -> u8 {
        self.shared.lock().settings.read().volume
    }

    pub fn muted(&self) -> bool {
        self.shared.lock().settings.read().muted
    }

    pub fn is_active(&self, slot: PlaybackSlot) -> bool {
        self.shared.lock().slots.contains_key(&slot)
    }

    pub fn active_source(&self, slot: PlaybackSlot) -> Option<SoundSource> {
        self.shared.lock().slots.get(&slot).map(|o| o.source.clone())
    }

    pub fn ducking(&self) -> Ducking {
        self.shared.lock().ducking
    }

    pub fn play_background_music(&self, source: impl Into<Option<SoundSource>>, looping: bool) {
        let Some(source) = source.into() else { return };
        let prepared = self.loader.load(&source);
        let weak = Arc::downgrade(&self.shared);
        let mut shared = self.shared.lock();
        shared.discard(PlaybackSlot::BackgroundMusic);
        shared.start(weak, PlaybackSlot::BackgroundMusic, source, prepared, 1.0, looping, None);
    }

    pub fn stop_background_music(&self) {
        self.shared.lock().discard(PlaybackSlot::BackgroundMusic);
    }

    pub fn play_ambient(&self, source: impl Into<Option<SoundSource>>, looping: bool) {
        let Some(source) = source.into() else { return };
        let prepared = self.loader.load(&source);
        let weak = Arc::downgrade(&self.shared);
        let mut shared = self.shared.lock();
        shared.discard(PlaybackSlot::Ambient);
        shared.start(weak, PlaybackSlot::Ambient, source, prepared, AMBIENT_FACTOR, looping, None);
    }

    pub fn stop_ambient(&self) {
        self.shared.lock().discard(PlaybackSlot::Ambient);
    }

    /// Narrate a voice line, ducking background music until it ends.
    ///
    /// A voice line replaced by another one is discarded silently: its
    /// `on_ended` never runs and the music stays ducked for the new line.
    pub fn play_voice(&self, line: impl Into<Option<VoiceLine>>, on_ended: Option<OnEnded>) {
        let Some(line) = line.into() else { return };
        let multiplier = line.effective_multiplier();
        let prepared = self.loader.load(&line.source);
        let weak = Arc::downgrade(&self.shared);
        let mut shared = self.shared.lock();
        shared.discard(PlaybackSlot::Voice);
        shared.set_ducking(Ducking::Ducked);

        let started = shared.start(
            weak,
            PlaybackSlot::Voice,
            line.source,
            prepared,
            multiplier,
            false,
            on_ended,
        );
        if !started {
            shared.set_ducking(Ducking::Normal);
        }
    }

    /// Stop narration without running its `on_ended`, and restore the music
    pub fn stop_voice(&self) {
        let mut shared = self.shared.lock();
        if shared.discard(PlaybackSlot::Voice) {
            shared.set_ducking(Ducking::Normal);
        }
    }

    pub fn play_sfx(&self, source: impl Into<Option<SoundSource>>, on_ended: Option<OnEnded>) {
        let Some(source) = source.into() else { return };
        let prepared = self.loader.load(&source);
        let weak = Arc::downgrade(&self.shared);
        let mut shared = self.shared.lock();
        shared.discard(PlaybackSlot::Effect);
        shared.start(weak, PlaybackSlot::Effect, source, prepared, 1.0, false, on_ended);
    }

    pub fn stop_sfx(&self) {
        self.shared.lock().discard(PlaybackSlot::Effect);
    }

    /// Store a new volume (clamped to 0-100) and rescale every playing sound
    pub fn update_volume(&self, volume: i32) {
        let volume = clamp_volume(volume);
        let mut shared = self.shared.lock();
        shared.settings.update(SettingsUpdate {
            volume: Some(volume),
            muted: None,
        });
        let muted = shared.settings.read().muted;
        shared.rescale(compute_gain(GainSettings { volume, muted }));
    }

    /// Store the mute flag and rescale every playing sound
    pub fn update_muted(&self, muted: bool) {
        let mut shared = self.shared.lock();
        shared.settings.update(SettingsUpdate {
            volume: None,
            muted: Some(muted),
        });
        let volume = shared.settings.read().volume;
        shared.rescale(compute_gain(GainSettings { volume, muted }));
    }
}

impl<B: SoundBackend, S: SettingsStore> Shared<B, S> {
    fn base_gain(&self) -> f32 {
        compute_gain(self.settings.read())
    }

    /// Total factor applied to the base gain for a slot's occupant
    fn level(&self, slot: PlaybackSlot, factor: f32) -> f32 {
        match slot {
            PlaybackSlot::BackgroundMusic => factor * self.ducking.background_factor(),
            _ => factor,
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn start(
        &mut self,
        weak: Weak<Mutex<Shared<B, S>>>,
        slot: PlaybackSlot,
        source: SoundSource,
        prepared: Result<Prepared<B>, PlaybackError>,
        factor: f32,
        looping: bool,
        on_ended: Option<OnEnded>,
    ) -> bool {
        self.next_id += 1;
        let id = SoundId(self.next_id);
        let gain = effective_gain(self.base_gain(), self.level(slot, factor));

        let finished = FinishedSignal::new(move || {
            if let Some(shared) = weak.upgrade() {
                finish_natural(&shared, slot, id);
            }
        });
        let request = StartRequest {
            source: &source,
            gain,
            looping,
        };

        let backend = &mut self.backend;
        match prepared.and_then(|prepared| backend.start(prepared, request, finished)) {
            Ok(handle) => {
                tracing::debug!("[{}] started {} {} at gain {:.3}", slot, id, source, gain);
                self.slots.insert(
                    slot,
                    Occupant {
                        id,
                        source,
                        handle,
                        factor,
                        on_ended,
                    },
                );
                true
            }
            Err(e) => {
                tracing::warn!("[{}] could not play {}: {}", slot, source, e);
                false
            }
        }
    }

    /// Stop and drop the slot's occupant without running its callback.
    /// Returns whether anything was playing.
    fn discard(&mut self, slot: PlaybackSlot) -> bool {
        match self.slots.remove(&slot) {
            Some(occupant) => {
                occupant.handle.stop();
                tracing::debug!("[{}] stopped {} {}", slot, occupant.id, occupant.source);
                true
            }
            None => false,
        }
    }

    /// Move between Normal and Ducked, applying the current gain to background music
    fn set_ducking(&mut self, ducking: Ducking) {
        if self.ducking != ducking {
            tracing::debug!("[bgm] {:?} -> {:?}", self.ducking, ducking);
        }
        self.ducking = ducking;
        let base = self.base_gain();
        if let Some(bgm) = self.slots.get(&PlaybackSlot::BackgroundMusic) {
            let gain = effective_gain(base, self.level(PlaybackSlot::BackgroundMusic, bgm.factor));
            bgm.handle.set_gain(gain);
        }
    }

    fn rescale(&mut self, base: f32) {
        for (slot, occupant) in &self.slots {
            let gain = effective_gain(base, self.level(*slot, occupant.factor));
            occupant.handle.set_gain(gain);
        }
        tracing::debug!("Rescaled {} active sound(s) to base gain {:.3}", self.slots.len(), base);
    }
}

/// Natural end of a sound. Stale notices (sound already replaced or
/// stopped, or a repeated notice) find a different occupant and do nothing.
fn finish_natural<B: SoundBackend, S: SettingsStore>(
    shared: &Mutex<Shared<B, S>>,
    slot: PlaybackSlot,
    id: SoundId,
) {
    let on_ended = {
        let mut shared = shared.lock();
        if shared.slots.get(&slot).map(|o| o.id) != Some(id) {
            return;
        }
        let Some(mut occupant) = shared.slots.remove(&slot) else {
            return;
        };
        occupant.handle.stop();
        tracing::debug!("[{}] finished {} {}", slot, id, occupant.source);
        if slot == PlaybackSlot::Voice {
            shared.set_ducking(Ducking::Normal);
        }
        occupant.on_ended.take()
    };

    // Run outside the lock so the callback can chain the next line
    if let Some(on_ended) = on_ended {
        on_ended();
    }
}
