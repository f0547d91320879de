// Storybook audio - narration, music and settings for the story pages
// Module declarations
pub mod args;
pub mod audio;
pub mod catalog;
pub mod narration;
pub mod settings;
pub mod state;

use anyhow::{Context, Result};
use std::sync::mpsc;

use args::CliArgs;
use state::AppState;

/// Play one scene from the command line: music and ambience under a
/// sequence of narrated voice cues, then stop.
pub fn run(args: CliArgs) -> Result<()> {
    let data_dir = args.data_dir.context("No data directory given")?;
    let state = AppState::open(&data_dir)
        .with_context(|| format!("Failed to open story data in {:?}", data_dir))?;
    let audio = &state.audio;

    if !state.has_output() {
        tracing::warn!("No audio output; the scene will run silently");
    }
    if let Some(volume) = args.volume {
        audio.update_volume(volume);
    }
    if let Some(muted) = args.muted {
        audio.update_muted(muted);
    }
    tracing::info!("Volume {}%{}", audio.volume(), if audio.muted() { " (muted)" } else { "" });

    let shown = audio.with_settings(|store| {
        if let Some(brightness) = args.brightness {
            store.set_screen_brightness(brightness);
        }
        if let Some(text_size) = args.text_size {
            store.set_text_size(text_size);
        }
        store.settings().clone()
    });
    tracing::info!(
        "Screen brightness {}%, text size {}%",
        shown.screen_brightness,
        shown.text_size
    );

    if let Some(name) = &args.bgm {
        let source = state.catalog.bgm(name);
        if source.is_none() {
            tracing::warn!("Unknown bgm cue: {}", name);
        }
        audio.play_background_music(source, true);
    }
    if let Some(name) = &args.ambient {
        let source = state.catalog.ambient(name);
        if source.is_none() {
            tracing::warn!("Unknown ambient cue: {}", name);
        }
        audio.play_ambient(source, true);
    }

    let lines: Vec<_> = args
        .voices
        .iter()
        .filter_map(|name| {
            let line = state.catalog.voice(name);
            if line.is_none() {
                tracing::warn!("Unknown voice cue: {}", name);
            }
            line
        })
        .collect();
    tracing::info!("Narrating {} line(s)", lines.len());

    let (done_tx, done_rx) = mpsc::channel();
    narration::narrate(
        audio,
        lines,
        Box::new(move || {
            let _ = done_tx.send(());
        }),
    );
    done_rx.recv().context("Narration ended without finishing")?;

    audio.stop_voice();
    audio.stop_ambient();
    audio.stop_background_music();
    tracing::info!("Scene finished");
    Ok(())
}
