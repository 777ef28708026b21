// Harmonic analysis of a chosen chord.
//
// Scores computed from the theoretical chord alone: dissonance from the
// interval labels, complexity from note count plus the emotion's own
// complexity, and a coarse harmonic function read off the quality string.
// Also builds the boolean theoretical-context flags and the chord-to-chord
// measures the progression assembler reports (harmonic distance, per-voice
// movement).

use serde::{Deserialize, Serialize};

use crate::emotion::EmotionAnalysis;
use crate::select::{ChordData, HarmonicKind};
use crate::theory::{BasicChord, pitch_class};
use crate::voicing::{VoicingInfo, VoicingStyle};

/// Interval labels counted as dissonant, 0.2 each.
const DISSONANT_INTERVALS: [&str; 6] = ["2m", "2A", "4A", "5d", "7M", "7d"];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HarmonicFunction {
    Tonic,
    Subdominant,
    Dominant,
    Color,
}

impl HarmonicFunction {
    /// Substring match on a quality literal, checked in order: `7` is
    /// dominant, `maj` tonic, `m` subdominant, anything else color.
    pub fn of_quality(quality: &str) -> Self {
        if quality.contains('7') {
            HarmonicFunction::Dominant
        } else if quality.contains("maj") {
            HarmonicFunction::Tonic
        } else if quality.contains('m') {
            HarmonicFunction::Subdominant
        } else {
            HarmonicFunction::Color
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct HarmonicAnalysis {
    pub function: HarmonicFunction,
    /// In [0, 1].
    pub complexity: f64,
    /// In [0, 1].
    pub dissonance: f64,
}

pub fn dissonance(chord: &BasicChord) -> f64 {
    let count = chord
        .intervals
        .iter()
        .filter(|label| DISSONANT_INTERVALS.contains(&label.as_str()))
        .count();
    (count as f64 * 0.2).min(1.0)
}

pub fn analyze(chord: &BasicChord, emotion: &EmotionAnalysis) -> HarmonicAnalysis {
    let complexity = chord.notes.len() as f64 / 7.0 + emotion.complexity * 0.3;
    HarmonicAnalysis {
        function: HarmonicFunction::of_quality(&chord.quality),
        complexity: complexity.clamp(0.0, 1.0),
        dissonance: dissonance(chord),
    }
}

/// What kind of harmony a suggestion is, as flags for display.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TheoreticalContext {
    pub is_polychord: bool,
    pub is_quartal: bool,
    pub is_cluster: bool,
    pub is_spectral: bool,
    pub modal_interchange: bool,
    pub chromatic_mediant: bool,
    pub extended_harmony: bool,
}

impl TheoreticalContext {
    pub fn of(data: &ChordData, voicing: &VoicingInfo) -> Self {
        let kind = data.context.harmonic;
        let symbol = &data.symbol;
        let extended_kind = matches!(
            kind,
            Some(
                HarmonicKind::Polychord
                    | HarmonicKind::Spectral
                    | HarmonicKind::Altered
                    | HarmonicKind::Extended
            )
        );
        TheoreticalContext {
            // Slash qualities such as 6/9 are not polychords.
            is_polychord: kind == Some(HarmonicKind::Polychord),
            is_quartal: kind == Some(HarmonicKind::Quartal),
            is_cluster: voicing.voicing_type == VoicingStyle::Cluster,
            is_spectral: kind == Some(HarmonicKind::Spectral),
            modal_interchange: kind == Some(HarmonicKind::ModalInterchange),
            chromatic_mediant: false,
            extended_harmony: extended_kind
                || ["7", "9", "11", "13"].iter().any(|n| symbol.contains(n)),
        }
    }
}

/// Distance between two chords in [0, 1]: root movement around the circle
/// of semitones (a tritone is 1) plus 0.5 when the qualities differ.
pub fn harmonic_distance(a: &BasicChord, b: &BasicChord) -> f64 {
    let pa = pitch_class(&a.root).unwrap_or(0);
    let pb = pitch_class(&b.root).unwrap_or(0);
    let diff = pa.abs_diff(pb);
    let root_distance = f64::from(diff.min(12 - diff)) / 6.0;
    let quality_change = if a.quality == b.quality { 0.0 } else { 0.5 };
    (root_distance + quality_change).min(1.0)
}

/// Motion of one voice between consecutive voicings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceMovement {
    pub voice: usize,
    pub from: u8,
    pub to: u8,
    /// Signed semitones, positive upward.
    pub interval: i16,
}

/// Pair voices bottom-up over the shared voice count.
pub fn voice_movements(prev: &[u8], next: &[u8]) -> Vec<VoiceMovement> {
    prev.iter()
        .zip(next)
        .enumerate()
        .map(|(voice, (&from, &to))| VoiceMovement {
            voice,
            from,
            to,
            interval: i16::from(to) - i16::from(from),
        })
        .collect()
}
