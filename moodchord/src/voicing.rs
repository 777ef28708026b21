// Voicing engine: theoretical chord -> ordered MIDI pitches.
//
// Each style arranges the chord's pitch classes differently:
// - close: ascending stack from the root, base octave set by arousal
// - open: close stack with the second-lowest voice raised an octave
// - drop2 / drop3: close stack with the root second (third) from the top,
//   that voice dropped below the rest; fewer than 4 tones falls back
// - rootless: upper structure without the root plus a separate bass note
// - cluster: contiguous semitones from the root, sized by tension
// - quartal: three perfect fourths above a low root
// - spread: one octave per successive tone, from octave 2
//
// Before arranging, tones are deduplicated by pitch class, `avoid_notes` are
// removed (never the root), and chords of 5+ tones are thinned to root, 3rd,
// 7th and an extension (5 tones under high tension). Every style except
// cluster and quartal keeps the root as the lowest voice; every style except
// quartal and spread is lifted by octaves to sit on or above the register
// floor. The result is always ascending.
//
// `VoicingSession` carries the previous voicing between calls and scores
// each new voicing's movement against it. One session per request or per
// progression; never shared between unrelated requests.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::emotion::{ChordOptions, EmotionAnalysis, GemsDimension, HarmonicStyle};
use crate::theory::{BasicChord, pitch_class};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoicingStyle {
    Close,
    Open,
    Drop2,
    Drop3,
    Rootless,
    Cluster,
    Quartal,
    Spread,
}

impl VoicingStyle {
    pub const ALL: [VoicingStyle; 8] = [
        VoicingStyle::Close,
        VoicingStyle::Open,
        VoicingStyle::Drop2,
        VoicingStyle::Drop3,
        VoicingStyle::Rootless,
        VoicingStyle::Cluster,
        VoicingStyle::Quartal,
        VoicingStyle::Spread,
    ];

    pub fn name(self) -> &'static str {
        match self {
            VoicingStyle::Close => "close",
            VoicingStyle::Open => "open",
            VoicingStyle::Drop2 => "drop2",
            VoicingStyle::Drop3 => "drop3",
            VoicingStyle::Rootless => "rootless",
            VoicingStyle::Cluster => "cluster",
            VoicingStyle::Quartal => "quartal",
            VoicingStyle::Spread => "spread",
        }
    }

    pub fn density(self) -> Density {
        match self {
            VoicingStyle::Rootless | VoicingStyle::Spread => Density::Sparse,
            VoicingStyle::Cluster => Density::Dense,
            _ => Density::Medium,
        }
    }

    /// Styles that place the chord on or above the register floor.
    pub fn respects_floor(self) -> bool {
        !matches!(self, VoicingStyle::Quartal | VoicingStyle::Spread)
    }
}

impl std::fmt::Display for VoicingStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for VoicingStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        VoicingStyle::ALL
            .into_iter()
            .find(|style| style.name() == lower)
            .ok_or_else(|| format!("unknown voicing style {s:?}"))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Density {
    Sparse,
    Medium,
    Dense,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Register {
    Low,
    Mid,
    High,
    Full,
}

impl Register {
    /// Classify an ascending voicing by where it sits.
    pub fn of(notes: &[u8]) -> Register {
        let (Some(&lo), Some(&hi)) = (notes.first(), notes.last()) else {
            return Register::Mid;
        };
        if hi - lo >= 24 {
            Register::Full
        } else if hi < 60 {
            Register::Low
        } else if lo >= 72 {
            Register::High
        } else {
            Register::Mid
        }
    }
}

/// A playable voicing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoicingInfo {
    /// Ascending MIDI pitches.
    pub notes: Vec<u8>,
    pub voicing_type: VoicingStyle,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bass_note: Option<u8>,
    pub voice_leading_score: f64,
    pub density: Density,
    pub register: Register,
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Voice-leading memory for one generation session.
#[derive(Clone, Debug, Default)]
pub struct VoicingSession {
    previous: Option<Vec<u8>>,
}

impl VoicingSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// True until the first voicing is recorded.
    pub fn is_fresh(&self) -> bool {
        self.previous.is_none()
    }

    pub fn previous(&self) -> Option<&[u8]> {
        self.previous.as_deref()
    }

    /// Score `notes` against the previous voicing, then remember them.
    ///
    /// Score is `1 - movement / (voices * 12)` clamped to [0, 1], where
    /// movement sums per-voice distance over the shared voice count. The
    /// first voicing of a session scores 1.
    pub fn score_and_record(&mut self, notes: &[u8]) -> f64 {
        let score = match &self.previous {
            None => 1.0,
            Some(prev) => movement_score(prev, notes),
        };
        self.previous = Some(notes.to_vec());
        score
    }
}

/// Smoothness of moving from `prev` to `next`, in [0, 1].
pub fn movement_score(prev: &[u8], next: &[u8]) -> f64 {
    let voices = prev.len().min(next.len());
    if voices == 0 {
        return 1.0;
    }
    let movement: u32 = prev
        .iter()
        .zip(next)
        .map(|(&a, &b)| u32::from(a.abs_diff(b)))
        .sum();
    (1.0 - f64::from(movement) / (voices as f64 * 12.0)).clamp(0.0, 1.0)
}

// ---------------------------------------------------------------------------
// Style resolution and tone preparation
// ---------------------------------------------------------------------------

/// The style to voice with: the caller's choice, else one inferred from the
/// emotion.
pub fn resolve_style(emotion: &EmotionAnalysis, requested: Option<VoicingStyle>) -> VoicingStyle {
    if let Some(style) = requested {
        return style;
    }
    if emotion.gems.is_some() {
        let g = |dim| emotion.gems_value(dim);
        if g(GemsDimension::Tension) > 0.7 {
            return VoicingStyle::Cluster;
        }
        if g(GemsDimension::Wonder) > 0.7 {
            return VoicingStyle::Quartal;
        }
        if g(GemsDimension::Transcendence) > 0.7 {
            return VoicingStyle::Spread;
        }
        if g(GemsDimension::Nostalgia) > 0.7 {
            return VoicingStyle::Rootless;
        }
    }
    match emotion.harmonic_style {
        Some(HarmonicStyle::Jazz) => VoicingStyle::Drop2,
        Some(HarmonicStyle::Contemporary) => VoicingStyle::Quartal,
        Some(HarmonicStyle::Experimental) => VoicingStyle::Cluster,
        _ => standard_style(emotion),
    }
}

/// Close or open, by complexity.
fn standard_style(emotion: &EmotionAnalysis) -> VoicingStyle {
    if emotion.complexity > 0.5 {
        VoicingStyle::Open
    } else {
        VoicingStyle::Close
    }
}

/// One chord tone: pitch class and interval label.
#[derive(Clone, Debug, PartialEq)]
struct Tone {
    pc: u8,
    number: u8,
}

/// Interval number of a label: `3M` -> 3, `#11` -> 11, `b9` -> 9.
fn label_number(label: &str) -> u8 {
    label
        .trim_start_matches(['#', 'b'])
        .chars()
        .take_while(char::is_ascii_digit)
        .collect::<String>()
        .parse()
        .unwrap_or(0)
}

/// Unique chord tones, root first, minus avoided notes, thinned if large.
fn prepare_tones(chord: &BasicChord, root_pc: u8, avoid: &[String], tension: f64) -> Vec<Tone> {
    let avoid_pcs: Vec<u8> = avoid.iter().filter_map(|n| pitch_class(n)).collect();

    let mut tones = vec![Tone {
        pc: root_pc,
        number: 1,
    }];
    for (note, label) in chord.notes.iter().zip(&chord.intervals) {
        let Some(pc) = pitch_class(note) else { continue };
        if tones.iter().any(|t| t.pc == pc) || avoid_pcs.contains(&pc) {
            continue;
        }
        tones.push(Tone {
            pc,
            number: label_number(label),
        });
    }

    if tones.len() < 5 {
        return tones;
    }
    let limit = if tension > 0.7 { 5 } else { 4 };
    reduce_tones(tones, limit)
}

/// Keep root, 3rd (else 2nd/4th), 7th (else 6th), one extension, then fill
/// with whatever remains, fifths last. Chord order is preserved.
fn reduce_tones(tones: Vec<Tone>, limit: usize) -> Vec<Tone> {
    let mut keep = vec![0usize];
    let take_first = |keep: &mut Vec<usize>, wanted: &[u8]| {
        for &n in wanted {
            let found = (1..tones.len()).find(|&i| tones[i].number == n && !keep.contains(&i));
            if let Some(i) = found {
                keep.push(i);
                return;
            }
        }
    };
    take_first(&mut keep, &[3, 2, 4]);
    take_first(&mut keep, &[7, 6]);
    take_first(&mut keep, &[9, 11, 13]);

    let mut rest: Vec<usize> = (1..tones.len()).filter(|i| !keep.contains(i)).collect();
    rest.sort_by_key(|&i| tones[i].number == 5);
    keep.extend(rest);
    keep.truncate(limit);
    keep.sort_unstable();

    keep.into_iter().map(|i| tones[i].clone()).collect()
}

// ---------------------------------------------------------------------------
// Arrangements
// ---------------------------------------------------------------------------

/// MIDI number of a pitch class in an octave (C4 = 60).
fn pitch_in_octave(pc: u8, octave: i16) -> i16 {
    (octave + 1) * 12 + i16::from(pc)
}

/// Stack pitch classes upward from `start`, each tone the nearest pitch
/// strictly above the previous one.
fn stack_from(start: i16, pcs: impl IntoIterator<Item = u8>) -> Vec<i16> {
    let mut out: Vec<i16> = Vec::new();
    for pc in pcs {
        let pitch = match out.last() {
            None => start,
            Some(&prev) => {
                let up = (i16::from(pc) - prev).rem_euclid(12);
                prev + if up == 0 { 12 } else { up }
            }
        };
        out.push(pitch);
    }
    out
}

fn base_octave(emotion: &EmotionAnalysis) -> i16 {
    if emotion.arousal > 0.5 { 4 } else { 3 }
}

fn close_stack(tones: &[Tone], emotion: &EmotionAnalysis) -> Vec<i16> {
    let start = pitch_in_octave(tones[0].pc, base_octave(emotion));
    stack_from(start, tones.iter().map(|t| t.pc))
}

fn open_stack(tones: &[Tone], emotion: &EmotionAnalysis) -> Vec<i16> {
    let mut notes = close_stack(tones, emotion);
    if notes.len() >= 3 {
        notes[1] += 12;
    }
    notes
}

/// Close stack rotated so the root sits `from_top` voices from the top, with
/// the root then moved below every other voice.
fn drop_stack(tones: &[Tone], emotion: &EmotionAnalysis, from_top: usize) -> Vec<i16> {
    let n = tones.len();
    let first = from_top;
    let rotated = tones[first..].iter().chain(&tones[..first]).map(|t| t.pc);
    let start_pc = tones[first].pc;
    let mut notes = stack_from(pitch_in_octave(start_pc, base_octave(emotion)), rotated);

    let root_idx = n - first;
    let root = notes.remove(root_idx);
    let lowest_other = notes.iter().copied().min().unwrap_or(root);
    let mut dropped = root - 12;
    while dropped >= lowest_other {
        dropped -= 12;
    }
    notes.push(dropped);
    notes
}

fn rootless_stack(tones: &[Tone]) -> Vec<i16> {
    tones[1..]
        .iter()
        .enumerate()
        .map(|(i, t)| pitch_in_octave(t.pc, 3 + (i as i16) / 2))
        .collect()
}

fn cluster_stack(root_pc: u8, emotion: &EmotionAnalysis) -> Vec<i16> {
    let octave = if emotion.arousal > 0.5 { 5 } else { 4 };
    let root = pitch_in_octave(root_pc, octave);
    let size = 3 + (emotion.tension * 4.0).round() as i16;
    (0..size).map(|i| root + i).collect()
}

fn quartal_stack(root_pc: u8) -> Vec<i16> {
    let root = 48 + i16::from(root_pc);
    (0..4).map(|i| root + 5 * i).collect()
}

fn spread_stack(tones: &[Tone]) -> Vec<i16> {
    tones
        .iter()
        .enumerate()
        .map(|(i, t)| pitch_in_octave(t.pc, 2 + i as i16))
        .collect()
}

/// Lift by octaves until the lowest voice reaches `floor`.
fn lift_to_floor(notes: &mut [i16], floor: u8) {
    let Some(&lowest) = notes.iter().min() else { return };
    let deficit = i16::from(floor) - lowest;
    if deficit > 0 {
        let shift = 12 * ((deficit + 11) / 12);
        notes.iter_mut().for_each(|n| *n += shift);
    }
}

/// Octave-shift into `[low, high]` when the voicing's span fits.
fn fit_range(notes: &mut [i16], (low, high): (u8, u8)) {
    let (Some(&lo), Some(&hi)) = (notes.iter().min(), notes.iter().max()) else { return };
    let (low, high) = (i16::from(low), i16::from(high));
    if hi - lo > high - low {
        return;
    }
    let mut shift = 0;
    while lo + shift < low {
        shift += 12;
    }
    while hi + shift > high {
        shift -= 12;
    }
    if lo + shift >= low {
        notes.iter_mut().for_each(|n| *n += shift);
    }
}

fn to_midi(notes: Vec<i16>) -> Vec<u8> {
    let mut out: Vec<u8> = notes.into_iter().map(|n| n.clamp(0, 127) as u8).collect();
    out.sort_unstable();
    out
}

/// Voice a chord and score it against the session's previous voicing.
pub fn generate_voicing(
    chord: &BasicChord,
    emotion: &EmotionAnalysis,
    options: &ChordOptions,
    session: &mut VoicingSession,
    register_floor: u8,
) -> VoicingInfo {
    let requested = resolve_style(emotion, options.voicing_style);
    let root_pc = pitch_class(&chord.root)
        .or_else(|| chord.notes.first().and_then(|n| pitch_class(n)))
        .unwrap_or(0);
    let tones = prepare_tones(chord, root_pc, &options.avoid_notes, emotion.tension);

    let style = match requested {
        VoicingStyle::Drop2 | VoicingStyle::Drop3 if tones.len() < 4 => standard_style(emotion),
        VoicingStyle::Rootless if chord.notes.len() < 4 || tones.len() < 2 => {
            standard_style(emotion)
        }
        other => other,
    };
    if style != requested {
        debug!(%requested, %style, tones = tones.len(), "voicing style fell back");
    }

    let mut bass_note = None;
    let mut notes = match style {
        VoicingStyle::Close => close_stack(&tones, emotion),
        VoicingStyle::Open => open_stack(&tones, emotion),
        VoicingStyle::Drop2 => drop_stack(&tones, emotion, 2),
        VoicingStyle::Drop3 => drop_stack(&tones, emotion, 3),
        VoicingStyle::Rootless => {
            bass_note = Some(36 + root_pc);
            rootless_stack(&tones)
        }
        VoicingStyle::Cluster => cluster_stack(root_pc, emotion),
        VoicingStyle::Quartal => quartal_stack(root_pc),
        VoicingStyle::Spread => spread_stack(&tones),
    };

    if style.respects_floor() {
        lift_to_floor(&mut notes, register_floor);
    }
    if let Some(range) = options.instrument_range {
        fit_range(&mut notes, range);
    }
    let notes = to_midi(notes);

    let fresh = session.is_fresh();
    let mut score = session.score_and_record(&notes);
    if style == VoicingStyle::Cluster && !fresh {
        score = 0.2;
    }

    VoicingInfo {
        register: Register::of(&notes),
        density: style.density(),
        notes,
        voicing_type: style,
        bass_note,
        voice_leading_score: score,
    }
}
