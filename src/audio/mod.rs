// Audio playback module
// Symphonia decodes, rodio plays, the coordinator decides what plays and how loud

pub mod backend;
pub mod coordinator;
pub mod decoder;
pub mod gain;
pub mod player;
pub mod slot;

#[cfg(test)]
pub(crate) mod mock;

pub use backend::{PlaybackError, SilentBackend, SoundBackend, SoundHandle, SoundLoader};
pub use coordinator::{AudioCoordinator, OnEnded, WeakCoordinator};
pub use gain::GainSettings;
pub use player::{AssetLoader, RodioBackend};
pub use slot::{Ducking, PlaybackSlot, SoundSource, VoiceLine};
