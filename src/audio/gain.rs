// Gain computation shared by every playback slot

/// Default volume when nothing has been saved yet
pub const DEFAULT_VOLUME: u8 = 80;

/// Ambient loops sit under everything else
pub const AMBIENT_FACTOR: f32 = 0.6;

/// Background music level while a voice line is playing
pub const DUCKED_FACTOR: f32 = 0.25;

/// Extra loudness for narrator lines (~ +2.6 dB) so they are clearer over music
pub const NARRATOR_BOOST: f32 = 1.35;

/// User-facing volume and mute, owned by the settings store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GainSettings {
    pub volume: u8, // 0-100
    pub muted: bool,
}

impl Default for GainSettings {
    fn default() -> Self {
        Self {
            volume: DEFAULT_VOLUME,
            muted: false,
        }
    }
}

/// Base gain for the given settings: 0 when muted, otherwise volume / 100
pub fn compute_gain(settings: GainSettings) -> f32 {
    if settings.muted {
        return 0.0;
    }
    (settings.volume as f32 / 100.0).clamp(0.0, 1.0)
}

/// Apply a per-slot factor to a base gain, keeping the result in [0, 1]
pub fn effective_gain(base: f32, factor: f32) -> f32 {
    let gain = base * factor;
    if gain.is_finite() {
        gain.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Voice multipliers that are not finite or not positive fall back to 1
pub fn sanitize_multiplier(multiplier: f32) -> f32 {
    if multiplier.is_finite() && multiplier > 0.0 {
        multiplier
    } else {
        1.0
    }
}

/// Clamp a requested volume (which may come from an unchecked UI value) into 0-100
pub fn clamp_volume(volume: i32) -> u8 {
    volume.clamp(0, 100) as u8
}
