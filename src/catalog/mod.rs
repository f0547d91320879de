// Audio cue catalog
// Maps the cue names pages ask for to sound sources, loaded from catalog.json
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::audio::{SoundSource, VoiceLine};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read catalog {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse catalog: {0}")]
    Json(#[from] serde_json::Error),
}

/// A voice cue as written in the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceEntry {
    pub source: SoundSource,
    #[serde(default = "default_multiplier")]
    pub multiplier: f32,
    /// Narrator lines are boosted so they carry over the music
    #[serde(default)]
    pub narrator: bool,
}

fn default_multiplier() -> f32 {
    1.0
}

impl From<&VoiceEntry> for VoiceLine {
    fn from(entry: &VoiceEntry) -> Self {
        VoiceLine {
            source: entry.source.clone(),
            multiplier: entry.multiplier,
            narrator: entry.narrator,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioCatalog {
    pub bgm: HashMap<String, SoundSource>,
    pub ambient: HashMap<String, SoundSource>,
    pub voice: HashMap<String, VoiceEntry>,
    pub sfx: HashMap<String, SoundSource>,
}

impl AudioCatalog {
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let content = fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let catalog: AudioCatalog = serde_json::from_str(&content)?;
        tracing::info!(
            "[Catalog] Loaded {} bgm, {} ambient, {} voice, {} sfx cues from {:?}",
            catalog.bgm.len(),
            catalog.ambient.len(),
            catalog.voice.len(),
            catalog.sfx.len(),
            path
        );
        Ok(catalog)
    }

    /// Unknown names give `None`, which the coordinator treats as "play nothing"
    pub fn bgm(&self, name: &str) -> Option<SoundSource> {
        self.bgm.get(name).cloned()
    }

    pub fn ambient(&self, name: &str) -> Option<SoundSource> {
        self.ambient.get(name).cloned()
    }

    pub fn voice(&self, name: &str) -> Option<VoiceLine> {
        self.voice.get(name).map(VoiceLine::from)
    }

    pub fn sfx(&self, name: &str) -> Option<SoundSource> {
        self.sfx.get(name).cloned()
    }
}
