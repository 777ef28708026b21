// Progression assembly.
//
// Runs the single-chord pipeline once per slot, threading one
// `VoicingSession` through the whole progression so every transition's
// smoothness is measured against the chord actually played before it.
// Harmonic function and Roman numerals are positional: they describe where a
// chord sits in the progression, not what it does in a key.
//
// Besides the chord list the assembler records, per transition, the
// smoothness score, each voice's movement, and the harmonic distance, and
// collects a set of feature tags describing what kinds of harmony appeared.

use serde::{Deserialize, Serialize};
use tracing::debug;

use moodchord_prng::RandomSource;

use crate::analysis::{HarmonicFunction, VoiceMovement, harmonic_distance, voice_movements};
use crate::emotion::{ChordOptions, EmotionAnalysis};
use crate::engine::ChordEngine;
use crate::select::{ChordData, HarmonicKind};
use crate::voicing::VoicingSession;

/// One slot of a progression.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressionChord {
    pub symbol: String,
    /// Beats.
    pub duration: u32,
    pub tension: f64,
    pub function: HarmonicFunction,
    /// The voiced MIDI notes, ascending.
    pub midi_notes: Vec<u8>,
}

/// The transition between two consecutive slots.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceLeadingStep {
    pub from_chord: String,
    pub to_chord: String,
    pub voice_movements: Vec<VoiceMovement>,
    /// The incoming chord's voice-leading score.
    pub smoothness: f64,
    pub harmonic_distance: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChordProgression {
    pub chords: Vec<ProgressionChord>,
    /// Root of the opening chord.
    pub key: String,
    pub mode: String,
    pub tempo: u16,
    /// Beats.
    pub total_duration: u32,
    pub complexity: f64,
    pub emotional_journey: String,
    pub roman_numerals: Vec<String>,
    /// Always one entry fewer than `chords`.
    pub voice_leading: Vec<VoiceLeadingStep>,
    pub features: Vec<String>,
}

/// Function by position: the ends are tonic, the middle slot (rounded down)
/// dominant, everything else subdominant.
pub fn positional_function(position: usize, length: usize) -> HarmonicFunction {
    if position == 0 || position + 1 == length {
        HarmonicFunction::Tonic
    } else if position == length / 2 {
        HarmonicFunction::Dominant
    } else {
        HarmonicFunction::Subdominant
    }
}

pub fn emotional_journey(emotion: &EmotionAnalysis) -> &'static str {
    if emotion.valence > 0.5 {
        "Uplifting progression moving through bright harmonies"
    } else if emotion.valence < -0.5 {
        "Descending progression exploring darker territories"
    } else {
        "Ambiguous progression balancing light and shadow"
    }
}

fn feature_tag(data: &ChordData) -> Option<&'static str> {
    Some(match data.context.harmonic? {
        HarmonicKind::Altered => "altered_dominants",
        HarmonicKind::ModalInterchange => "modal_interchange",
        HarmonicKind::Quartal => "quartal_harmony",
        HarmonicKind::Spectral => "spectral_harmony",
        HarmonicKind::Polychord => "polychords",
        HarmonicKind::Extended => "extended_harmony",
    })
}

fn push_feature(features: &mut Vec<String>, tag: &str) {
    if !features.iter().any(|f| f == tag) {
        features.push(tag.to_string());
    }
}

pub(crate) fn assemble<R: RandomSource + ?Sized>(
    engine: &ChordEngine,
    emotion: &EmotionAnalysis,
    length: usize,
    rng: &mut R,
) -> ChordProgression {
    let tables = engine.tables();
    let beats = engine.config().chord_duration_beats;
    let max_leap = tables.voice_leading.for_style(emotion.harmonic_style).max_interval;
    let options = ChordOptions::default();

    let mut session = VoicingSession::new();
    let mut chords: Vec<ProgressionChord> = Vec::with_capacity(length);
    let mut roman_numerals = Vec::with_capacity(length);
    let mut voice_leading = Vec::with_capacity(length.saturating_sub(1));
    let mut features = Vec::new();
    let mut key = None;
    let mut prev: Option<ChordData> = None;

    for i in 0..length {
        let (data, suggestion) = engine.build(&mut session, emotion, &options, rng);
        let function = positional_function(i, length);
        debug!(slot = i, symbol = %data.symbol, ?function, "progression step");

        if key.is_none() {
            key = Some(data.chord.root.clone());
        }
        if let Some(tag) = feature_tag(&data) {
            push_feature(&mut features, tag);
        }
        if !tables.roman_numerals.is_empty() {
            roman_numerals.push(tables.roman_numerals[i % tables.roman_numerals.len()].clone());
        }

        if let (Some(prev_data), Some(prev_chord)) = (&prev, chords.last()) {
            let movements = voice_movements(&prev_chord.midi_notes, &suggestion.voicing.notes);
            if movements.iter().any(|m| m.interval.unsigned_abs() > u16::from(max_leap)) {
                push_feature(&mut features, "wide_leaps");
            }
            voice_leading.push(VoiceLeadingStep {
                from_chord: prev_chord.symbol.clone(),
                to_chord: data.symbol.clone(),
                voice_movements: movements,
                smoothness: suggestion.voicing.voice_leading_score,
                harmonic_distance: harmonic_distance(&prev_data.chord, &data.chord),
            });
        }

        chords.push(ProgressionChord {
            symbol: data.symbol.clone(),
            duration: beats,
            tension: emotion.tension,
            function,
            midi_notes: suggestion.voicing.notes,
        });
        prev = Some(data);
    }

    let total_duration = chords.iter().map(|c| c.duration).sum();
    ChordProgression {
        chords,
        key: key.unwrap_or_else(|| "C".to_string()),
        mode: emotion.musical_mode.clone(),
        tempo: emotion.suggested_tempo,
        total_duration,
        complexity: emotion.complexity,
        emotional_journey: emotional_journey(emotion).to_string(),
        roman_numerals,
        voice_leading,
        features,
    }
}
