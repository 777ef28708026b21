// Mapping tables: every literal pick-list the engine chooses from.
//
// GEMS dimension -> chord qualities, valence/arousal quadrant qualities, root
// sets, polychord and modal-interchange tables, cultural raga/maqam scales,
// voice-leading style rules, and the positional Roman numeral table.
//
// The tables are data, not logic. `MappingTables::builtin()` builds the
// default set once per process and hands out a shared `Arc`; `load()` reads
// an alternative set from JSON and validates it. Nothing mutates a table
// after construction. Every pick-list must be non-empty, which is what lets
// the selector treat `choose()` as infallible.
//
// See also: `select.rs` and `special.rs`, the main readers.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, LazyLock};

use serde::{Deserialize, Serialize};

use crate::emotion::{GemsDimension, HarmonicStyle};
use crate::error::{HarmonyError, Result};
use crate::theory::NoteName;
use crate::voicing::VoicingStyle;

// ---------------------------------------------------------------------------
// Table record types
// ---------------------------------------------------------------------------

/// What one GEMS dimension asks of the harmony.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GemsMapping {
    /// Quality literals, including the special tokens `quartal`, `spectral`
    /// and `polychord`.
    pub qualities: Vec<String>,
    /// Descriptive voicing hint. Not every value names a `VoicingStyle`.
    pub voicing_preference: String,
    pub harmonic_features: Vec<String>,
}

/// Quality lists for the four valence/arousal quadrants.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuadrantQualities {
    /// valence > 0.5, arousal > 0.5
    pub bright: Vec<String>,
    /// valence > 0.5, arousal <= 0.5
    pub peaceful: Vec<String>,
    /// valence < -0.5, arousal > 0.5
    pub tense: Vec<String>,
    /// everything else
    pub minor: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RootSets {
    pub bright: Vec<String>,
    pub dark: Vec<String>,
    pub ambiguous: Vec<String>,
}

/// Bichord symbols (`"C/F#"`) for one emotional type.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PolychordSet {
    pub chords: Vec<String>,
    pub cultural_reference: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PolychordTables {
    pub dramatic: PolychordSet,
    pub mystical: PolychordSet,
    pub expansive: PolychordSet,
}

/// One borrowed chord quality and the mode it is borrowed from.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModalBorrowing {
    pub quality: String,
    pub source_mode: String,
    /// Attribution attached to the chord, e.g. "Borrowed from dorian mode".
    pub reference: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModalInterchangeTable {
    pub melancholic: ModalBorrowing,
    pub nostalgic: ModalBorrowing,
    pub dark: ModalBorrowing,
    pub mystical: ModalBorrowing,
}

/// A raga or maqam: its name, the emotion it carries, and its scale.
/// Notes may carry microtonal marks (`E♭+`) and are informational only.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CulturalScale {
    pub name: String,
    pub emotion: String,
    pub notes: Vec<String>,
}

/// Voice-leading limits for one harmonic idiom. Intervals in semitones.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VoiceLeadingRule {
    pub max_interval: u8,
    pub preferred_interval: u8,
    pub avoid_parallels: bool,
    pub smoothness: f64,
    #[serde(default)]
    pub prefer_rootless: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VoiceLeadingRules {
    pub classical: VoiceLeadingRule,
    pub jazz: VoiceLeadingRule,
    pub contemporary: VoiceLeadingRule,
}

impl VoiceLeadingRules {
    /// The rule governing a harmonic style. Experimental writing follows the
    /// contemporary limits; no style at all follows the classical ones.
    pub fn for_style(&self, style: Option<HarmonicStyle>) -> &VoiceLeadingRule {
        match style {
            Some(HarmonicStyle::Jazz) => &self.jazz,
            Some(HarmonicStyle::Contemporary | HarmonicStyle::Experimental) => &self.contemporary,
            Some(HarmonicStyle::Classical) | None => &self.classical,
        }
    }
}

// ---------------------------------------------------------------------------
// MappingTables
// ---------------------------------------------------------------------------

/// The complete set of literal tables the engine draws from.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MappingTables {
    pub gems: BTreeMap<GemsDimension, GemsMapping>,
    pub quadrants: QuadrantQualities,
    pub roots: RootSets,
    /// Root pool the alternatives generator draws from.
    pub alternative_roots: Vec<String>,
    /// Voicing styles the alternatives generator cycles through.
    pub alternative_styles: Vec<VoicingStyle>,
    pub polychords: PolychordTables,
    pub modal_interchange: ModalInterchangeTable,
    /// Labels for the altered-dominant builder (`7b9`, `13b9#11`, ...).
    pub altered_dominants: Vec<String>,
    /// Advanced-harmony fallback qualities.
    pub extended_qualities: Vec<String>,
    pub ragas: Vec<CulturalScale>,
    pub maqams: Vec<CulturalScale>,
    pub voice_leading: VoiceLeadingRules,
    pub roman_numerals: Vec<String>,
}

static BUILTIN: LazyLock<Arc<MappingTables>> =
    LazyLock::new(|| Arc::new(MappingTables::default_tables()));

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn gems_entry(qualities: &[&str], voicing: &str, features: &[&str]) -> GemsMapping {
    GemsMapping {
        qualities: strings(qualities),
        voicing_preference: voicing.to_string(),
        harmonic_features: strings(features),
    }
}

fn scale(name: &str, emotion: &str, notes: &[&str]) -> CulturalScale {
    CulturalScale {
        name: name.to_string(),
        emotion: emotion.to_string(),
        notes: strings(notes),
    }
}

impl MappingTables {
    /// The shared built-in tables, constructed on first use.
    pub fn builtin() -> Arc<MappingTables> {
        Arc::clone(&BUILTIN)
    }

    /// Load tables from a JSON file and validate them.
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path).map_err(|source| HarmonyError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&data)
    }

    /// Parse and validate tables from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        let tables: MappingTables = serde_json::from_str(json)?;
        tables.validate()?;
        Ok(tables)
    }

    /// Check that every pick-list is non-empty and every root is a note name.
    pub fn validate(&self) -> Result<()> {
        fn non_empty<T>(list: &[T], what: &str) -> Result<()> {
            if list.is_empty() {
                return Err(HarmonyError::InvalidTables(format!("{what} is empty")));
            }
            Ok(())
        }
        fn readable_roots(list: &[String], what: &str) -> Result<()> {
            non_empty(list, what)?;
            for root in list {
                NoteName::parse(root)
                    .map_err(|e| HarmonyError::InvalidTables(format!("{what}: {e}")))?;
            }
            Ok(())
        }

        for (dim, mapping) in &self.gems {
            non_empty(&mapping.qualities, &format!("gems.{dim}.qualities"))?;
        }
        non_empty(&self.quadrants.bright, "quadrants.bright")?;
        non_empty(&self.quadrants.peaceful, "quadrants.peaceful")?;
        non_empty(&self.quadrants.tense, "quadrants.tense")?;
        non_empty(&self.quadrants.minor, "quadrants.minor")?;
        readable_roots(&self.roots.bright, "roots.bright")?;
        readable_roots(&self.roots.dark, "roots.dark")?;
        readable_roots(&self.roots.ambiguous, "roots.ambiguous")?;
        readable_roots(&self.alternative_roots, "alternative_roots")?;
        non_empty(&self.alternative_styles, "alternative_styles")?;
        non_empty(&self.polychords.dramatic.chords, "polychords.dramatic")?;
        non_empty(&self.polychords.mystical.chords, "polychords.mystical")?;
        non_empty(&self.polychords.expansive.chords, "polychords.expansive")?;
        non_empty(&self.altered_dominants, "altered_dominants")?;
        non_empty(&self.extended_qualities, "extended_qualities")?;
        non_empty(&self.roman_numerals, "roman_numerals")?;
        Ok(())
    }

    /// The GEMS entry for a dimension, if the tables configure one.
    pub fn gems_mapping(&self, dim: GemsDimension) -> Option<&GemsMapping> {
        self.gems.get(&dim)
    }

    /// The hand-tuned default tables.
    pub fn default_tables() -> Self {
        use GemsDimension::*;

        let gems = BTreeMap::from([
            (
                Joy,
                gems_entry(
                    &["maj7", "maj9", "maj13", "6/9", "add9", "maj7#11"],
                    "open",
                    &["bright", "consonant", "stable"],
                ),
            ),
            (
                Sadness,
                gems_entry(
                    &["m7", "m9", "m11", "m6", "mMaj7", "m7b5"],
                    "close",
                    &["dark", "introspective", "descending"],
                ),
            ),
            (
                Tension,
                gems_entry(
                    &["7alt", "7b9", "7#9", "dim7", "aug", "7#11", "13b9"],
                    "cluster",
                    &["dissonant", "unstable", "chromatic"],
                ),
            ),
            (
                Wonder,
                gems_entry(
                    &["maj7#11", "maj13#11", "sus", "quartal", "maj7/5"],
                    "spread",
                    &["ethereal", "floating", "modal"],
                ),
            ),
            (
                Peacefulness,
                gems_entry(
                    &["maj7", "add9", "sus2", "6", "maj9"],
                    "open",
                    &["consonant", "stable", "spacious"],
                ),
            ),
            (
                Power,
                gems_entry(
                    &["5", "sus4", "7", "maj", "m"],
                    "dense",
                    &["strong", "direct", "forceful"],
                ),
            ),
            (
                Tenderness,
                gems_entry(
                    &["maj7", "m7", "maj9", "m9", "6"],
                    "close",
                    &["gentle", "warm", "intimate"],
                ),
            ),
            (
                Nostalgia,
                gems_entry(
                    &["m6", "mMaj7", "maj6", "m7", "dim7"],
                    "rootless",
                    &["bittersweet", "yearning", "chromatic"],
                ),
            ),
            (
                Transcendence,
                gems_entry(
                    &["maj7#11", "spectral", "quartal", "polychord"],
                    "spread",
                    &["otherworldly", "expansive", "overtone-based"],
                ),
            ),
        ]);

        let film = "Modern film scoring";

        MappingTables {
            gems,
            quadrants: QuadrantQualities {
                bright: strings(&["maj7", "maj9", "6/9", "maj13"]),
                peaceful: strings(&["maj7", "add9", "sus2", "maj6"]),
                tense: strings(&["7b9", "m7b5", "dim7", "7alt"]),
                minor: strings(&["m7", "m9", "m6", "mMaj7"]),
            },
            roots: RootSets {
                bright: strings(&["C", "G", "D", "A", "E"]),
                dark: strings(&["F", "Bb", "Eb", "Ab", "Db"]),
                ambiguous: strings(&["B", "F#", "C#"]),
            },
            alternative_roots: strings(&["C", "F", "G", "D", "A", "E", "B", "Bb", "Eb", "Ab"]),
            alternative_styles: vec![
                VoicingStyle::Drop2,
                VoicingStyle::Rootless,
                VoicingStyle::Quartal,
                VoicingStyle::Spread,
            ],
            polychords: PolychordTables {
                dramatic: PolychordSet {
                    chords: strings(&["C/F#", "Db/C", "Eb/E"]),
                    cultural_reference: "Stravinsky Rite of Spring".to_string(),
                },
                mystical: PolychordSet {
                    chords: strings(&["D/Eb", "F/Gb", "E/F"]),
                    cultural_reference: film.to_string(),
                },
                expansive: PolychordSet {
                    chords: strings(&["C/G", "F/C", "Bb/F"]),
                    cultural_reference: film.to_string(),
                },
            },
            modal_interchange: ModalInterchangeTable {
                melancholic: ModalBorrowing {
                    quality: "m6".to_string(),
                    source_mode: "dorian".to_string(),
                    reference: "Borrowed from dorian mode".to_string(),
                },
                nostalgic: ModalBorrowing {
                    quality: "mMaj7".to_string(),
                    source_mode: "melodic minor".to_string(),
                    reference: "Borrowed from melodic minor".to_string(),
                },
                dark: ModalBorrowing {
                    quality: "dim7".to_string(),
                    source_mode: "locrian".to_string(),
                    reference: "Borrowed from locrian mode".to_string(),
                },
                mystical: ModalBorrowing {
                    quality: "maj7#5".to_string(),
                    source_mode: "lydian augmented".to_string(),
                    reference: "Borrowed from lydian augmented".to_string(),
                },
            },
            altered_dominants: strings(&["7b9", "7#9", "7alt", "13b9#11"]),
            extended_qualities: strings(&["maj7#11", "m11", "maj13", "m13"]),
            ragas: vec![
                scale("Hamsadhwani", "joy", &["C", "D", "E", "G", "B"]),
                scale("Gujari Todi", "compassion", &["C", "Db", "Eb", "F#", "G", "Ab", "B"]),
                scale("Bhairav", "austere", &["C", "Db", "E", "F", "G", "Ab", "B"]),
                scale("Yaman", "romantic", &["C", "D", "E", "F#", "G", "A", "B"]),
                scale("Marwa", "sunset_longing", &["C", "Db", "E", "F#", "G", "A", "B"]),
            ],
            maqams: vec![
                scale("Rast", "pride", &["C", "D", "E♭+", "F", "G", "A", "B♭"]),
                scale("Saba", "sadness", &["D", "E♭", "F", "G♭", "A", "B♭", "C"]),
                scale("Hijaz", "mystical", &["D", "E♭", "F#", "G", "A", "B♭", "C"]),
                scale("Bayati", "tender", &["D", "E♭+", "F", "G", "A", "B♭", "C"]),
            ],
            voice_leading: VoiceLeadingRules {
                classical: VoiceLeadingRule {
                    max_interval: 8,
                    preferred_interval: 4,
                    avoid_parallels: true,
                    smoothness: 0.8,
                    prefer_rootless: false,
                },
                jazz: VoiceLeadingRule {
                    max_interval: 12,
                    preferred_interval: 7,
                    avoid_parallels: false,
                    smoothness: 0.6,
                    prefer_rootless: true,
                },
                contemporary: VoiceLeadingRule {
                    max_interval: 24,
                    preferred_interval: 12,
                    avoid_parallels: false,
                    smoothness: 0.4,
                    prefer_rootless: false,
                },
            },
            roman_numerals: strings(&["I", "V", "vi", "IV", "ii", "iii", "vii°"]),
        }
    }
}
