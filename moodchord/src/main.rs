// CLI entry point for the moodchord engine.
//
// Reads one EmotionAnalysis as JSON (from a file, or stdin when no path is
// given), generates a full response, and prints it as JSON on stdout. Logs
// go to stderr, filtered by RUST_LOG (default `info`).
//
// Usage:
//   chordgen [INPUT] [OPTIONS]
//     --seed <N>            Seed the generator for reproducible output
//     --root <NOTE>         Preferred root for the primary chord
//     --voicing <STYLE>     Voicing style for the primary chord
//     --alternatives <N>    Number of alternative chords (default from config)
//     --progression <N>     Also generate an N-chord progression
//     --cultural            Include raga/maqam suggestions
//     --tables <PATH>       Mapping tables JSON (default: built in)
//     --config <PATH>       Engine config JSON
//     --midi <PATH>         Write the progression as a MIDI file

use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use moodchord::config::EngineConfig;
use moodchord::emotion::{ChordOptions, EmotionAnalysis};
use moodchord::engine::{ChordEngine, ResponseOptions};
use moodchord::midi::write_midi;
use moodchord::tables::MappingTables;
use moodchord::voicing::VoicingStyle;
use moodchord_prng::ChordRng;

#[derive(Parser)]
#[command(name = "chordgen")]
#[command(about = "Generate chords, voicings and progressions from an emotion analysis")]
#[command(version)]
struct Cli {
    /// EmotionAnalysis JSON file; stdin when omitted.
    input: Option<PathBuf>,

    #[arg(long)]
    seed: Option<u64>,

    /// Preferred root for the primary chord.
    #[arg(long)]
    root: Option<String>,

    /// close, open, drop2, drop3, rootless, cluster, quartal, spread.
    #[arg(long)]
    voicing: Option<VoicingStyle>,

    #[arg(long)]
    alternatives: Option<usize>,

    /// Progression length.
    #[arg(long)]
    progression: Option<usize>,

    #[arg(long)]
    cultural: bool,

    #[arg(long)]
    tables: Option<PathBuf>,

    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the progression as a Standard MIDI File.
    #[arg(long)]
    midi: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let tables = match &cli.tables {
        Some(path) => Arc::new(
            MappingTables::load(path)
                .with_context(|| format!("loading mapping tables from {}", path.display()))?,
        ),
        None => MappingTables::builtin(),
    };
    let config = match &cli.config {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("loading engine config from {}", path.display()))?,
        None => EngineConfig::default(),
    };
    let emotion = read_emotion(cli.input.as_ref())?;

    let mut rng = match cli.seed {
        Some(seed) => ChordRng::new(seed),
        None => ChordRng::from_entropy(),
    };

    // MIDI export needs a progression even when none was asked for.
    let progression = cli
        .progression
        .or_else(|| cli.midi.as_ref().map(|_| config.default_progression_length));
    let response_options = ResponseOptions {
        alternatives: cli.alternatives.unwrap_or(config.default_alternatives),
        progression,
        cultural: cli.cultural,
    };
    let chord_options = ChordOptions {
        preferred_root: cli.root.clone(),
        voicing_style: cli.voicing,
        ..ChordOptions::default()
    };

    let engine = ChordEngine::new(tables, config);
    let response = engine.respond(&emotion, &chord_options, &response_options, &mut rng);

    if let Some(path) = &cli.midi
        && let Some(progression) = &response.chord_progression
    {
        write_midi(progression, path)
            .with_context(|| format!("writing MIDI to {}", path.display()))?;
        info!(path = %path.display(), chords = progression.chords.len(), "MIDI written");
    }

    let json = serde_json::to_string_pretty(&response).context("serializing response")?;
    println!("{json}");
    Ok(())
}

fn read_emotion(path: Option<&PathBuf>) -> Result<EmotionAnalysis> {
    let text = match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("reading emotion analysis from stdin")?;
            buf
        }
    };
    serde_json::from_str(&text).context("parsing emotion analysis JSON")
}
