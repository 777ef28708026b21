// The single-chord pipeline and the request-level entry points.
//
// `ChordEngine` owns the shared mapping tables and the engine config, and
// runs Selector -> Voicing -> Analyzer -> Resonance for each chord. It holds
// no mutable state: voice-leading memory lives in a `VoicingSession` the
// caller (or the progression assembler) threads through, and randomness
// comes from the caller's `RandomSource`. One engine can serve any number of
// concurrent requests.
//
// See also: `progression.rs` for multi-chord assembly, `select.rs` for the
// decision tree, `voicing.rs` for the session type.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use moodchord_prng::RandomSource;

use crate::analysis::{self, HarmonicFunction, TheoreticalContext};
use crate::config::EngineConfig;
use crate::emotion::{ChordOptions, EmotionAnalysis};
use crate::progression::{self, ChordProgression};
use crate::resonance::{self, Articulation, Dynamics, Timbre};
use crate::select::{ChordData, pick, select_chord};
use crate::tables::{CulturalScale, MappingTables};
use crate::theory::note_to_midi;
use crate::voicing::{VoicingInfo, VoicingSession, generate_voicing};

/// A fully described chord, ready for display or playback.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChordSuggestion {
    pub symbol: String,
    pub root: String,
    pub quality: String,
    pub notes: Vec<String>,
    pub intervals: Vec<String>,
    /// Theoretical notes in octave 4.
    pub midi_notes: Vec<u8>,
    pub voicing: VoicingInfo,
    pub harmonic_function: HarmonicFunction,
    pub harmonic_complexity: f64,
    pub dissonance_level: f64,
    pub theoretical_context: TheoreticalContext,
    pub emotional_resonance: f64,
    pub emotional_justification: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cultural_reference: Option<String>,
    pub timbre: Timbre,
    pub dynamics: Dynamics,
    pub articulation: Articulation,
}

/// A raga or maqam offered alongside the chords.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScaleSuggestion {
    pub name: String,
    pub emotion: String,
    pub notes: Vec<String>,
    pub characteristic: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CulturalAlternatives {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indian: Option<ScaleSuggestion>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arabic: Option<ScaleSuggestion>,
}

/// What a full response should include beyond the primary chord.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResponseOptions {
    pub alternatives: usize,
    /// Progression length, if one is wanted.
    pub progression: Option<usize>,
    pub cultural: bool,
}

/// Everything generated for one analyzed emotion.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmotionChordResponse {
    pub emotion: EmotionAnalysis,
    pub primary_chord: ChordSuggestion,
    pub alternative_chords: Vec<ChordSuggestion>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chord_progression: Option<ChordProgression>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cultural_alternatives: Option<CulturalAlternatives>,
}

#[derive(Clone, Debug)]
pub struct ChordEngine {
    tables: Arc<MappingTables>,
    config: EngineConfig,
}

impl Default for ChordEngine {
    fn default() -> Self {
        ChordEngine::new(MappingTables::builtin(), EngineConfig::default())
    }
}

impl ChordEngine {
    pub fn new(tables: Arc<MappingTables>, config: EngineConfig) -> Self {
        ChordEngine { tables, config }
    }

    pub fn tables(&self) -> &MappingTables {
        &self.tables
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// One chord in a fresh voicing session.
    pub fn generate_chord<R: RandomSource + ?Sized>(
        &self,
        emotion: &EmotionAnalysis,
        options: &ChordOptions,
        rng: &mut R,
    ) -> ChordSuggestion {
        let mut session = VoicingSession::new();
        self.generate_chord_in(&mut session, emotion, options, rng)
    }

    /// One chord, voiced against `session`'s previous voicing.
    pub fn generate_chord_in<R: RandomSource + ?Sized>(
        &self,
        session: &mut VoicingSession,
        emotion: &EmotionAnalysis,
        options: &ChordOptions,
        rng: &mut R,
    ) -> ChordSuggestion {
        self.build(session, emotion, options, rng).1
    }

    /// The pipeline proper. Returns the selector's record alongside the
    /// suggestion so progression assembly can read its tags.
    pub(crate) fn build<R: RandomSource + ?Sized>(
        &self,
        session: &mut VoicingSession,
        emotion: &EmotionAnalysis,
        options: &ChordOptions,
        rng: &mut R,
    ) -> (ChordData, ChordSuggestion) {
        let data = select_chord(&self.tables, emotion, options, rng);
        let voicing = generate_voicing(
            &data.chord,
            emotion,
            options,
            session,
            self.config.register_floor,
        );
        let harmony = analysis::analyze(&data.chord, emotion);
        debug!(
            symbol = %data.symbol,
            style = %voicing.voicing_type,
            notes = ?voicing.notes,
            "chord generated"
        );

        let suggestion = ChordSuggestion {
            symbol: data.symbol.clone(),
            root: data.chord.root.clone(),
            quality: data.chord.quality.clone(),
            notes: data.chord.notes.clone(),
            intervals: data.chord.intervals.clone(),
            midi_notes: data
                .chord
                .notes
                .iter()
                .map(|n| note_to_midi(n, 4).unwrap_or(60))
                .collect(),
            theoretical_context: TheoreticalContext::of(&data, &voicing),
            voicing,
            harmonic_function: harmony.function,
            harmonic_complexity: harmony.complexity,
            dissonance_level: harmony.dissonance,
            emotional_resonance: resonance::resonance(emotion, &data),
            emotional_justification: resonance::justification(emotion, &data),
            cultural_reference: data.cultural_reference.clone(),
            timbre: resonance::suggest_timbre(emotion),
            dynamics: resonance::suggest_dynamics(emotion),
            articulation: resonance::suggest_articulation(emotion),
        };
        (data, suggestion)
    }

    /// Up to `count` chords with distinct symbols, cycling voicing styles
    /// and drawing roots from the alternatives pool. Each chord gets its own
    /// session. A symbol collision costs an attempt; with the default one
    /// attempt per slot the result can come up short.
    pub fn generate_alternatives<R: RandomSource + ?Sized>(
        &self,
        emotion: &EmotionAnalysis,
        count: usize,
        rng: &mut R,
    ) -> Vec<ChordSuggestion> {
        let styles = &self.tables.alternative_styles;
        let attempts = count.saturating_mul(self.config.alternative_attempts_per_slot.max(1));
        let mut used = HashSet::new();
        let mut out = Vec::with_capacity(count);

        for i in 0..attempts {
            if out.len() >= count {
                break;
            }
            let voicing_style = (!styles.is_empty()).then(|| styles[i % styles.len()]);
            let root = pick(rng, &self.tables.alternative_roots, "C").to_string();
            let options = ChordOptions {
                preferred_root: Some(root),
                voicing_style,
                ..ChordOptions::default()
            };
            let chord = self.generate_chord(emotion, &options, rng);
            if used.insert(chord.symbol.clone()) {
                out.push(chord);
            } else {
                debug!(symbol = %chord.symbol, "duplicate alternative skipped");
            }
        }
        out
    }

    /// A progression of `length` chords sharing one voicing session.
    pub fn generate_progression<R: RandomSource + ?Sized>(
        &self,
        emotion: &EmotionAnalysis,
        length: usize,
        rng: &mut R,
    ) -> ChordProgression {
        progression::assemble(self, emotion, length, rng)
    }

    /// The first raga and first maqam whose emotion matches the primary
    /// emotion (case-insensitive, either name containing the other).
    pub fn cultural_alternatives(&self, emotion: &EmotionAnalysis) -> CulturalAlternatives {
        let primary = emotion.primary_emotion.to_lowercase();
        let find = |scales: &[CulturalScale], kind: &str| {
            scales
                .iter()
                .find(|s| emotion_matches(&primary, &s.emotion))
                .map(|s| ScaleSuggestion {
                    name: s.name.clone(),
                    emotion: s.emotion.clone(),
                    notes: s.notes.clone(),
                    characteristic: format!("{kind} {} for {}", s.name, s.emotion),
                })
        };
        CulturalAlternatives {
            indian: find(self.tables.ragas.as_slice(), "Raga"),
            arabic: find(self.tables.maqams.as_slice(), "Maqam"),
        }
    }

    /// Primary chord, alternatives, and the optional extras, as one record.
    pub fn respond<R: RandomSource + ?Sized>(
        &self,
        emotion: &EmotionAnalysis,
        primary_options: &ChordOptions,
        response: &ResponseOptions,
        rng: &mut R,
    ) -> EmotionChordResponse {
        let primary_chord = self.generate_chord(emotion, primary_options, rng);
        let alternative_chords = self.generate_alternatives(emotion, response.alternatives, rng);
        let chord_progression = response
            .progression
            .map(|length| self.generate_progression(emotion, length, rng));
        let cultural_alternatives = response.cultural.then(|| self.cultural_alternatives(emotion));
        info!(
            primary = %primary_chord.symbol,
            alternatives = alternative_chords.len(),
            progression = chord_progression.is_some(),
            "response assembled"
        );

        EmotionChordResponse {
            emotion: emotion.clone(),
            primary_chord,
            alternative_chords,
            chord_progression,
            cultural_alternatives,
        }
    }
}

/// `primary` is already lowercase. An empty primary emotion matches nothing.
fn emotion_matches(primary: &str, target: &str) -> bool {
    if primary.is_empty() {
        return false;
    }
    let target = target.to_lowercase();
    primary.contains(&target) || target.contains(primary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emotion::{Gems, GemsDimension};
    use crate::voicing::VoicingStyle;
    use moodchord_prng::ChordRng;

    fn engine() -> ChordEngine {
        ChordEngine::default()
    }

    #[test]
    fn suggestion_fields_line_up() {
        let e = EmotionAnalysis::default();
        let opts = ChordOptions {
            preferred_root: Some("D".to_string()),
            ..ChordOptions::default()
        };
        let s = engine().generate_chord(&e, &opts, &mut ChordRng::new(1));
        assert_eq!(s.notes.len(), s.intervals.len());
        assert_eq!(s.midi_notes.len(), s.notes.len());
        assert_eq!(s.root, "D");
        assert!(s.symbol.starts_with('D'));
        assert_eq!(s.voicing.voice_leading_score, 1.0);
        assert!((0.0..=1.0).contains(&s.emotional_resonance));
        assert!(s.emotional_justification.ends_with('.'));
    }

    #[test]
    fn midi_notes_are_octave_four() {
        let e = EmotionAnalysis {
            gems: Some(Gems::default().with(GemsDimension::Sadness, 0.9)),
            ..EmotionAnalysis::default()
        };
        let opts = ChordOptions {
            preferred_root: Some("C".to_string()),
            ..ChordOptions::default()
        };
        let s = engine().generate_chord(&e, &opts, &mut ChordRng::new(9));
        assert!(s.midi_notes.iter().all(|&m| (59..=72).contains(&m)), "{:?}", s.midi_notes);
    }

    #[test]
    fn session_threads_voice_leading() {
        let eng = engine();
        let e = EmotionAnalysis::default();
        let mut rng = ChordRng::new(4);
        let mut session = VoicingSession::new();
        let first = eng.generate_chord_in(&mut session, &e, &ChordOptions::default(), &mut rng);
        assert_eq!(first.voicing.voice_leading_score, 1.0);
        assert!(!session.is_fresh());
        let second = eng.generate_chord_in(&mut session, &e, &ChordOptions::default(), &mut rng);
        assert!((0.0..=1.0).contains(&second.voicing.voice_leading_score));
        assert_eq!(session.previous(), Some(second.voicing.notes.as_slice()));
    }

    #[test]
    fn alternatives_are_distinct_and_bounded() {
        let eng = engine();
        let e = EmotionAnalysis {
            valence: 0.8,
            arousal: 0.8,
            ..EmotionAnalysis::default()
        };
        for seed in 0..30 {
            let alts = eng.generate_alternatives(&e, 4, &mut ChordRng::new(seed));
            assert!(alts.len() <= 4);
            let symbols: HashSet<_> = alts.iter().map(|a| a.symbol.as_str()).collect();
            assert_eq!(symbols.len(), alts.len());
            for a in &alts {
                assert_eq!(a.voicing.voice_leading_score, 1.0);
            }
        }
    }

    #[test]
    fn alternatives_cycle_styles() {
        let eng = engine();
        // Slot zero asks for drop2; three-note qualities fall back to close.
        let e = EmotionAnalysis {
            valence: 0.8,
            arousal: 0.8,
            gems: Some(Gems::default().with(GemsDimension::Peacefulness, 0.9)),
            ..EmotionAnalysis::default()
        };
        let alts = eng.generate_alternatives(&e, 1, &mut ChordRng::new(2));
        assert_eq!(alts.len(), 1);
        assert!(matches!(
            alts[0].voicing.voicing_type,
            VoicingStyle::Drop2 | VoicingStyle::Close
        ));
    }

    #[test]
    fn retries_fill_more_slots() {
        let config = EngineConfig {
            alternative_attempts_per_slot: 20,
            ..EngineConfig::default()
        };
        let eng = ChordEngine::new(MappingTables::builtin(), config);
        let e = EmotionAnalysis::default();
        let alts = eng.generate_alternatives(&e, 5, &mut ChordRng::new(8));
        assert_eq!(alts.len(), 5);
    }

    #[test]
    fn zero_alternatives() {
        let alts =
            engine().generate_alternatives(&EmotionAnalysis::default(), 0, &mut ChordRng::new(1));
        assert!(alts.is_empty());
    }

    #[test]
    fn cultural_matching() {
        let eng = engine();
        let e = EmotionAnalysis {
            primary_emotion: "Sadness".to_string(),
            ..EmotionAnalysis::default()
        };
        let alts = eng.cultural_alternatives(&e);
        assert!(alts.indian.is_none());
        let saba = alts.arabic.unwrap();
        assert_eq!(saba.name, "Saba");
        assert_eq!(saba.characteristic, "Maqam Saba for sadness");

        let joy = EmotionAnalysis {
            primary_emotion: "joy".to_string(),
            ..EmotionAnalysis::default()
        };
        assert_eq!(eng.cultural_alternatives(&joy).indian.unwrap().name, "Hamsadhwani");

        // "longing" is contained in "sunset_longing".
        let longing = EmotionAnalysis {
            primary_emotion: "longing".to_string(),
            ..EmotionAnalysis::default()
        };
        assert_eq!(eng.cultural_alternatives(&longing).indian.unwrap().name, "Marwa");

        let blank = EmotionAnalysis {
            primary_emotion: String::new(),
            ..EmotionAnalysis::default()
        };
        assert_eq!(eng.cultural_alternatives(&blank), CulturalAlternatives::default());
    }

    #[test]
    fn respond_includes_requested_parts() {
        let eng = engine();
        let e = EmotionAnalysis::default();
        let resp = eng.respond(
            &e,
            &ChordOptions::default(),
            &ResponseOptions {
                alternatives: 3,
                progression: Some(4),
                cultural: true,
            },
            &mut ChordRng::new(12),
        );
        assert!(resp.alternative_chords.len() <= 3);
        assert_eq!(resp.chord_progression.as_ref().map(|p| p.chords.len()), Some(4));
        assert!(resp.cultural_alternatives.is_some());

        let json = serde_json::to_value(&resp).unwrap();
        assert!(json.get("primaryChord").is_some());
        assert!(json["primaryChord"]["voicing"].get("voiceLeadingScore").is_some());

        let bare = eng.respond(
            &e,
            &ChordOptions::default(),
            &ResponseOptions {
                alternatives: 0,
                progression: None,
                cultural: false,
            },
            &mut ChordRng::new(12),
        );
        let json = serde_json::to_value(&bare).unwrap();
        assert!(json.get("chordProgression").is_none());
        assert!(json.get("culturalAlternatives").is_none());
    }

    #[test]
    fn same_seed_same_response() {
        let eng = engine();
        let e = EmotionAnalysis::default();
        let opts = ResponseOptions {
            alternatives: 3,
            progression: Some(3),
            cultural: false,
        };
        let a = eng.respond(&e, &ChordOptions::default(), &opts, &mut ChordRng::new(99));
        let b = eng.respond(&e, &ChordOptions::default(), &opts, &mut ChordRng::new(99));
        assert_eq!(a, b);
    }
}
