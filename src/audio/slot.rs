// Playback slots and the things that occupy them
use serde::{Deserialize, Serialize};
use std::fmt;

use super::gain::{sanitize_multiplier, DUCKED_FACTOR, NARRATOR_BOOST};

/// One of the four independent playback channels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlaybackSlot {
    BackgroundMusic,
    Ambient,
    Voice,
    Effect,
}

impl PlaybackSlot {
    pub fn name(&self) -> &'static str {
        match self {
            PlaybackSlot::BackgroundMusic => "bgm",
            PlaybackSlot::Ambient => "ambient",
            PlaybackSlot::Voice => "voice",
            PlaybackSlot::Effect => "sfx",
        }
    }
}

impl fmt::Display for PlaybackSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Opaque resource locator for a sound. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SoundSource(String);

impl SoundSource {
    /// Returns `None` for empty or blank locators, which callers treat as "no sound"
    pub fn parse(source: impl Into<String>) -> Option<Self> {
        let source = source.into();
        if source.trim().is_empty() {
            None
        } else {
            Some(Self(source))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for SoundSource {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value).ok_or_else(|| "sound source must not be empty".to_string())
    }
}

impl From<SoundSource> for String {
    fn from(source: SoundSource) -> Self {
        source.0
    }
}

impl fmt::Display for SoundSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A narrated line, with its loudness multiplier and narrator tag
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceLine {
    pub source: SoundSource,
    pub multiplier: f32,
    /// Narrator lines get an extra boost on top of `multiplier`
    pub narrator: bool,
}

impl VoiceLine {
    pub fn new(source: SoundSource) -> Self {
        Self {
            source,
            multiplier: 1.0,
            narrator: false,
        }
    }

    pub fn with_multiplier(mut self, multiplier: f32) -> Self {
        self.multiplier = multiplier;
        self
    }

    pub fn narrated(mut self) -> Self {
        self.narrator = true;
        self
    }

    /// Multiplier actually applied on top of the base gain
    pub fn effective_multiplier(&self) -> f32 {
        let multiplier = sanitize_multiplier(self.multiplier);
        if self.narrator {
            multiplier * NARRATOR_BOOST
        } else {
            multiplier
        }
    }
}

impl From<SoundSource> for VoiceLine {
    fn from(source: SoundSource) -> Self {
        VoiceLine::new(source)
    }
}

/// Background music state relative to the voice slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Ducking {
    #[default]
    Normal,
    Ducked,
}

impl Ducking {
    pub fn background_factor(&self) -> f32 {
        match self {
            Ducking::Normal => 1.0,
            Ducking::Ducked => DUCKED_FACTOR,
        }
    }
}

/// Identity of one started sound. Completion notices carry it so a notice
/// for a sound that was already replaced or stopped can be told apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SoundId(pub u64);

impl fmt::Display for SoundId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn source(s: &str) -> SoundSource {
        SoundSource::parse(s).unwrap()
    }

    #[test]
    fn test_blank_source_is_rejected() {
        assert!(SoundSource::parse("").is_none());
        assert!(SoundSource::parse("   ").is_none());
        assert_eq!(source("/audio/bgm.mp3").as_str(), "/audio/bgm.mp3");
    }

    #[test]
    fn test_source_deserialize_rejects_empty() {
        let parsed: Result<SoundSource, _> = serde_json::from_str("\"\"");
        assert!(parsed.is_err());
        let parsed: SoundSource = serde_json::from_str("\"/audio/a.ogg\"").unwrap();
        assert_eq!(parsed, source("/audio/a.ogg"));
    }

    #[test]
    fn test_narrator_boost() {
        let line = VoiceLine::new(source("/audio/vo/Leo/line1.ogg")).narrated();
        assert_relative_eq!(line.effective_multiplier(), 1.35);

        let line = VoiceLine::new(source("/audio/vo/Other/line1.ogg"));
        assert_relative_eq!(line.effective_multiplier(), 1.0);
    }

    #[test]
    fn test_bad_multiplier_falls_back() {
        let line = VoiceLine::new(source("a.ogg")).with_multiplier(-1.0).narrated();
        assert_relative_eq!(line.effective_multiplier(), 1.35);
    }

    #[test]
    fn test_slot_log_names() {
        assert_eq!(PlaybackSlot::BackgroundMusic.to_string(), "bgm");
        assert_eq!(PlaybackSlot::Effect.to_string(), "sfx");
    }

    #[test]
    fn test_ducking_factor() {
        assert_eq!(Ducking::default(), Ducking::Normal);
        assert_eq!(Ducking::Normal.background_factor(), 1.0);
        assert_eq!(Ducking::Ducked.background_factor(), 0.25);
    }
}
