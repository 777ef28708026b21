// Moodchord: emotion-to-harmony generation.
//
// Turns a structured emotion analysis (valence/arousal, tension, complexity,
// optional GEMS profile, cultural and stylistic context) into concrete chords:
// a symbol and its notes, a playable MIDI voicing, analytic scores, a one-line
// justification, and renderer hints. Multi-chord progressions thread voice
// leading from chord to chord.
//
// Architecture:
// - emotion.rs: Input records (EmotionAnalysis, GEMS profile, ChordOptions)
// - theory.rs: Note names, interval labels, the chord-type dictionary, and
//   symbol resolution with a major-triad fallback
// - tables.rs: Read-only mapping tables (quality lists, root sets, special
//   harmony tables, cultural scales, voice-leading rules), JSON-loadable
// - config.rs: Engine tuning knobs (register floor, durations, counts)
// - select.rs: The selection decision tree (GEMS, advanced, quadrant)
// - special.rs: Quartal, spectral, polychord, altered-dominant, and
//   modal-interchange builders
// - voicing.rs: Style resolution, the voicing stacks, and the per-request
//   voice-leading session
// - analysis.rs: Dissonance, complexity, harmonic function, context flags,
//   chord-to-chord distance and voice movement
// - resonance.rs: Resonance score, justification text, timbre/dynamics/
//   articulation hints
// - engine.rs: The single-chord pipeline, alternatives, cultural
//   alternatives, and full response assembly
// - progression.rs: Multi-chord progressions sharing one voicing session
// - midi.rs: Standard MIDI File output of a progression
//
// Every random decision goes through `moodchord_prng::RandomSource`, so a
// seeded `ChordRng` reproduces a response exactly.

pub mod analysis;
pub mod config;
pub mod emotion;
pub mod engine;
pub mod error;
pub mod midi;
pub mod progression;
pub mod resonance;
pub mod select;
pub mod special;
pub mod tables;
pub mod theory;
pub mod voicing;
