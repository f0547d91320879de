// Chained narration: play voice lines one after another
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

use crate::audio::{AudioCoordinator, OnEnded, PlaybackSlot, SoundBackend, VoiceLine};
use crate::settings::SettingsStore;

/// Narrate `lines` in order, each starting when the previous one ends, then
/// run `on_done`. Lines that fail to start are skipped. Stopping the voice
/// slot (or playing another voice line) abandons the rest of the sequence.
pub fn narrate<B, S>(audio: &AudioCoordinator<B, S>, lines: impl IntoIterator<Item = VoiceLine>, on_done: OnEnded)
where
    B: SoundBackend,
    S: SettingsStore,
{
    narrate_next(audio.clone(), lines.into_iter().collect(), on_done);
}

fn narrate_next<B, S>(audio: AudioCoordinator<B, S>, mut lines: VecDeque<VoiceLine>, on_done: OnEnded)
where
    B: SoundBackend,
    S: SettingsStore,
{
    let Some(line) = lines.pop_front() else {
        on_done();
        return;
    };
    let source = line.source.clone();

    // Taken exactly once: by the line's natural end, or below if it never started.
    // Held weakly, since it lives in the voice slot of the coordinator itself.
    let weak = audio.downgrade();
    let next: OnEnded = Box::new(move || {
        if let Some(audio) = weak.upgrade() {
            narrate_next(audio, lines, on_done);
        }
    });
    let proceed = Arc::new(Mutex::new(Some(next)));

    let on_ended: OnEnded = {
        let proceed = Arc::clone(&proceed);
        Box::new(move || {
            let next = proceed.lock().take();
            if let Some(next) = next {
                next();
            }
        })
    };
    audio.play_voice(line, Some(on_ended));

    if !audio.is_active(PlaybackSlot::Voice) {
        let next = proceed.lock().take();
        if let Some(next) = next {
            tracing::debug!("[voice] skipping {} in narration", source);
            next();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::gain::GainSettings;
    use crate::audio::mock::MockBackend;
    use crate::audio::SoundSource;
    use crate::settings::MemorySettings;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn line(s: &str) -> VoiceLine {
        VoiceLine::new(SoundSource::parse(s).unwrap())
    }

    fn setup() -> (AudioCoordinator<MockBackend, MemorySettings>, MockBackend, Arc<AtomicUsize>, OnEnded) {
        let backend = MockBackend::new();
        let audio = AudioCoordinator::new(backend.clone(), MemorySettings::new(GainSettings::default()));
        let done = Arc::new(AtomicUsize::new(0));
        let counter = done.clone();
        let on_done: OnEnded = Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        (audio, backend, done, on_done)
    }

    #[test]
    fn test_lines_play_in_order() {
        let (audio, backend, done, on_done) = setup();
        narrate(&audio, vec![line("p1.mp3"), line("p2.mp3")], on_done);

        assert_eq!(backend.playing(), vec!["p1.mp3"]);
        backend.finish("p1.mp3");
        assert_eq!(backend.playing(), vec!["p2.mp3"]);
        assert_eq!(done.load(Ordering::SeqCst), 0);

        backend.finish("p2.mp3");
        assert_eq!(done.load(Ordering::SeqCst), 1);
        assert!(!audio.is_active(PlaybackSlot::Voice));
    }

    #[test]
    fn test_failed_line_is_skipped() {
        let (audio, backend, done, on_done) = setup();
        backend.fail_on("missing.mp3");
        narrate(&audio, vec![line("missing.mp3"), line("p2.mp3")], on_done);

        assert_eq!(backend.playing(), vec!["p2.mp3"]);
        backend.finish("p2.mp3");
        assert_eq!(done.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_empty_sequence_finishes_at_once() {
        let (audio, _, done, on_done) = setup();
        narrate(&audio, Vec::new(), on_done);
        assert_eq!(done.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_dropping_coordinator_ends_sequence() {
        let (audio, backend, done, on_done) = setup();
        narrate(&audio, vec![line("p1.mp3"), line("p2.mp3")], on_done);
        drop(audio);

        backend.finish("p1.mp3");
        assert!(backend.playing().is_empty());
        assert_eq!(backend.sounds().len(), 1);
        assert_eq!(done.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_stop_voice_abandons_sequence() {
        let (audio, backend, done, on_done) = setup();
        narrate(&audio, vec![line("p1.mp3"), line("p2.mp3")], on_done);
        audio.stop_voice();
        backend.fire_stale(0);
        assert!(backend.playing().is_empty());
        assert_eq!(done.load(Ordering::SeqCst), 0);
    }
}
