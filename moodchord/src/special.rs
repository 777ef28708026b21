// Special-harmony constructors: chords the plain `root + quality` path
// cannot express.
//
// - quartal: three stacked perfect fourths, `{root}sus4(add11)`
// - spectral: pitch classes of selected harmonic-series partials
// - polychord: two triads from a bichord literal such as `C/F#`
// - altered dominant: a dominant seventh plus the alterations its label names
// - modal interchange: a chord borrowed from a parallel mode
//
// Every constructor keeps `notes` and `intervals` the same length.

use tracing::warn;

use moodchord_prng::RandomSource;

use crate::emotion::{EmotionAnalysis, GemsDimension};
use crate::select::{ChordContext, ChordData, HarmonicKind, pick};
use crate::tables::{MappingTables, ModalBorrowing, PolychordSet};
use crate::theory::{BasicChord, Interval, NoteName, resolve_or_triad, resolve_symbol};

/// Harmonic partial numbers available to the spectral builder.
const PARTIALS: [u32; 12] = [1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 13];

/// Spectral interval labels in output order, with their semitone offsets.
const SPECTRAL_LABELS: [(u8, &str); 6] = [
    (0, "1P"),
    (7, "5P"),
    (4, "3M"),
    (10, "7m"),
    (2, "9M"),
    (6, "#11"),
];

const MAX_SPECTRAL_NOTES: usize = 6;

fn root_or_c(root: &str) -> NoteName {
    NoteName::parse(root).unwrap_or_else(|err| {
        warn!(root, %err, "unreadable root, building on C");
        NoteName::C
    })
}

/// Three perfect fourths stacked on the root.
pub fn quartal(root: &str) -> ChordData {
    let root_note = root_or_c(root);
    let mut pairs = vec![(root_note.to_string(), "1P".to_string())];
    let mut current = root_note;
    for _ in 0..3 {
        current = current.transpose(Interval::PERFECT_FOURTH);
        pairs.push((current.to_string(), "4P".to_string()));
    }

    ChordData {
        symbol: format!("{root}sus4(add11)"),
        chord: BasicChord::from_pairs(&root_note.to_string(), "quartal", pairs),
        context: ChordContext {
            harmonic: Some(HarmonicKind::Quartal),
            ..ChordContext::default()
        },
        cultural_reference: Some("McCoy Tyner/modern jazz quartal harmony".to_string()),
    }
}

/// Semitones above the fundamental of partial `h`, rounded to equal temperament.
fn partial_offset(h: u32) -> u32 {
    (12.0 * f64::from(h).log2()).round() as u32
}

/// A chord from the harmonic series over the root.
///
/// Strong transcendence takes the upper partials (7 and above), otherwise
/// partials 3 through 8. Each partial is reduced to its pitch class, duplicates
/// collapse, and partials with no spectral label (the 13th) are skipped.
pub fn spectral(root: &str, emotion: &EmotionAnalysis) -> ChordData {
    let root_note = root_or_c(root);
    let selected = if emotion.gems_value(GemsDimension::Transcendence) > 0.7 {
        &PARTIALS[6..]
    } else {
        &PARTIALS[2..8]
    };

    let mut offsets: Vec<u8> = Vec::new();
    for &h in selected {
        let pc = (partial_offset(h) % 12) as u8;
        let labelled = SPECTRAL_LABELS.iter().any(|&(o, _)| o == pc);
        if labelled && !offsets.contains(&pc) {
            offsets.push(pc);
        }
    }

    let pairs: Vec<(String, String)> = SPECTRAL_LABELS
        .iter()
        .filter(|(o, _)| offsets.contains(o))
        .take(MAX_SPECTRAL_NOTES)
        .filter_map(|&(_, label)| {
            let interval = Interval::parse(label).ok()?;
            Some((root_note.transpose(interval).to_string(), label.to_string()))
        })
        .collect();

    ChordData {
        symbol: format!("{root}spectral"),
        chord: BasicChord::from_pairs(&root_note.to_string(), "spectral", pairs),
        context: ChordContext {
            harmonic: Some(HarmonicKind::Spectral),
            ..ChordContext::default()
        },
        cultural_reference: Some("Spectral music (Grisey/Murail)".to_string()),
    }
}

/// Emotional flavour of a polychord.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PolychordMood {
    Dramatic,
    Mystical,
    Expansive,
}

impl PolychordMood {
    pub fn classify(emotion: &EmotionAnalysis) -> Self {
        if emotion.tension > 0.7 {
            PolychordMood::Dramatic
        } else if emotion.gems_value(GemsDimension::Wonder) > 0.7 {
            PolychordMood::Mystical
        } else {
            PolychordMood::Expansive
        }
    }

    fn set(self, tables: &MappingTables) -> &PolychordSet {
        match self {
            PolychordMood::Dramatic => &tables.polychords.dramatic,
            PolychordMood::Mystical => &tables.polychords.mystical,
            PolychordMood::Expansive => &tables.polychords.expansive,
        }
    }
}

/// Two triads stacked. The lower triad's root is the chord root.
pub fn polychord<R: RandomSource + ?Sized>(
    tables: &MappingTables,
    emotion: &EmotionAnalysis,
    rng: &mut R,
) -> ChordData {
    let set = PolychordMood::classify(emotion).set(tables);
    let symbol = pick(rng, &set.chords, "C/G");

    let mut chord = match symbol.split_once('/') {
        Some((bottom, top)) => {
            let mut lower = resolve_symbol(bottom);
            let upper = resolve_symbol(top);
            lower.notes.extend(upper.notes);
            lower.intervals.extend(upper.intervals);
            lower
        }
        None => resolve_symbol(symbol),
    };
    chord.quality = "polychord".to_string();

    ChordData {
        symbol: symbol.to_string(),
        chord,
        context: ChordContext {
            harmonic: Some(HarmonicKind::Polychord),
            ..ChordContext::default()
        },
        cultural_reference: Some(set.cultural_reference.clone()),
    }
}

/// Alteration flags an altered-dominant label may contain, and the tone each adds.
const ALTERATIONS: [(&str, &str); 4] = [("b9", "9m"), ("#9", "9A"), ("#11", "11A"), ("b13", "13m")];

/// A dominant seventh on `root` plus one tone per alteration flag in `label`.
/// `7alt` names no flag and stays a plain dominant seventh.
pub fn altered_dominant(root: &str, label: &str) -> BasicChord {
    let mut chord = resolve_or_triad(root, "7");
    let root_note = NoteName::parse(&chord.root).unwrap_or(NoteName::C);

    for (flag, tone) in ALTERATIONS {
        if !label.contains(flag) {
            continue;
        }
        if let Ok(interval) = Interval::parse(tone) {
            chord.notes.push(root_note.transpose(interval).to_string());
            chord.intervals.push(tone.to_string());
        }
    }
    chord.quality = label.to_string();
    chord
}

/// Emotional flavour that decides which parallel mode to borrow from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BorrowedMood {
    Melancholic,
    Nostalgic,
    Dark,
    Mystical,
}

impl BorrowedMood {
    pub fn classify(emotion: &EmotionAnalysis) -> Self {
        if emotion.gems_value(GemsDimension::Sadness) > 0.7 {
            BorrowedMood::Melancholic
        } else if emotion.gems_value(GemsDimension::Nostalgia) > 0.7 {
            BorrowedMood::Nostalgic
        } else if emotion.tension > 0.7 {
            BorrowedMood::Dark
        } else {
            BorrowedMood::Mystical
        }
    }

    fn borrowing(self, tables: &MappingTables) -> &ModalBorrowing {
        let table = &tables.modal_interchange;
        match self {
            BorrowedMood::Melancholic => &table.melancholic,
            BorrowedMood::Nostalgic => &table.nostalgic,
            BorrowedMood::Dark => &table.dark,
            BorrowedMood::Mystical => &table.mystical,
        }
    }
}

/// A chord borrowed from the parallel mode that fits the emotion.
pub fn modal_interchange(
    tables: &MappingTables,
    root: &str,
    emotion: &EmotionAnalysis,
) -> ChordData {
    let borrowed = BorrowedMood::classify(emotion).borrowing(tables);
    let context = ChordContext {
        harmonic: Some(HarmonicKind::ModalInterchange),
        borrowed_from: Some(borrowed.source_mode.clone()),
        ..ChordContext::default()
    };
    ChordData {
        cultural_reference: Some(borrowed.reference.clone()),
        ..ChordData::plain(root, &borrowed.quality, context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emotion::Gems;
    use moodchord_prng::ChordRng;

    fn with_gems(dim: GemsDimension, v: f64) -> EmotionAnalysis {
        EmotionAnalysis {
            gems: Some(Gems::default().with(dim, v)),
            ..EmotionAnalysis::default()
        }
    }

    #[test]
    fn quartal_stacks_fourths() {
        let data = quartal("D");
        assert_eq!(data.symbol, "Dsus4(add11)");
        assert_eq!(data.chord.notes, ["D", "G", "C", "F"]);
        assert_eq!(data.chord.intervals, ["1P", "4P", "4P", "4P"]);
        assert_eq!(data.chord.quality, "quartal");
        assert_eq!(data.context.harmonic, Some(HarmonicKind::Quartal));
    }

    #[test]
    fn quartal_from_flat_root() {
        assert_eq!(quartal("Bb").chord.notes, ["Bb", "Eb", "Ab", "Db"]);
    }

    #[test]
    fn partial_offsets_match_equal_temperament() {
        let pcs: Vec<u32> = PARTIALS.iter().map(|&h| partial_offset(h) % 12).collect();
        assert_eq!(pcs, [0, 0, 7, 0, 4, 7, 10, 0, 2, 4, 6, 8]);
    }

    #[test]
    fn spectral_middle_partials() {
        let data = spectral("C", &EmotionAnalysis::default());
        assert_eq!(data.symbol, "Cspectral");
        assert_eq!(data.chord.notes, ["C", "G", "E", "Bb"]);
        assert_eq!(data.chord.intervals, ["1P", "5P", "3M", "7m"]);
    }

    #[test]
    fn spectral_upper_partials_for_transcendence() {
        let e = with_gems(GemsDimension::Transcendence, 0.9);
        let data = spectral("C", &e);
        assert_eq!(data.chord.notes, ["C", "E", "Bb", "D", "F#"]);
        assert_eq!(data.chord.intervals, ["1P", "3M", "7m", "9M", "#11"]);
        assert!(data.chord.notes.len() <= MAX_SPECTRAL_NOTES);
        // The 13th partial has no label and is left out.
        assert!(!data.chord.notes.iter().any(|n| n == "Ab" || n == "G#"));
    }

    #[test]
    fn polychord_mood_classification() {
        let tense = EmotionAnalysis {
            tension: 0.9,
            ..EmotionAnalysis::default()
        };
        assert_eq!(PolychordMood::classify(&tense), PolychordMood::Dramatic);
        assert_eq!(
            PolychordMood::classify(&with_gems(GemsDimension::Wonder, 0.8)),
            PolychordMood::Mystical
        );
        assert_eq!(
            PolychordMood::classify(&EmotionAnalysis::default()),
            PolychordMood::Expansive
        );
    }

    #[test]
    fn polychord_concatenates_halves() {
        let tables = MappingTables::builtin();
        let tense = EmotionAnalysis {
            tension: 0.9,
            ..EmotionAnalysis::default()
        };
        for seed in 0..20 {
            let data = polychord(&tables, &tense, &mut ChordRng::new(seed));
            assert!(tables.polychords.dramatic.chords.contains(&data.symbol));
            assert_eq!(data.chord.notes.len(), 6);
            assert_eq!(data.chord.intervals.len(), 6);
            assert_eq!(data.cultural_reference.as_deref(), Some("Stravinsky Rite of Spring"));
            let bottom = data.symbol.split('/').next().unwrap();
            assert_eq!(data.chord.root, bottom);
        }
    }

    #[test]
    fn altered_dominant_appends_flags() {
        let chord = altered_dominant("G", "13b9#11");
        assert_eq!(chord.notes, ["G", "B", "D", "F", "Ab", "C#"]);
        assert_eq!(chord.intervals, ["1P", "3M", "5P", "7m", "9m", "11A"]);
        assert_eq!(chord.quality, "13b9#11");

        let sharp9 = altered_dominant("C", "7#9");
        assert_eq!(sharp9.notes, ["C", "E", "G", "Bb", "D#"]);
    }

    #[test]
    fn seven_alt_is_plain_dominant() {
        let chord = altered_dominant("E", "7alt");
        assert_eq!(chord.notes, ["E", "G#", "B", "D"]);
        assert_eq!(chord.quality, "7alt");
    }

    #[test]
    fn borrowed_mood_priority() {
        let mut e = with_gems(GemsDimension::Sadness, 0.8);
        e.gems = e.gems.map(|g| g.with(GemsDimension::Nostalgia, 0.9));
        assert_eq!(BorrowedMood::classify(&e), BorrowedMood::Melancholic);
        assert_eq!(
            BorrowedMood::classify(&with_gems(GemsDimension::Nostalgia, 0.9)),
            BorrowedMood::Nostalgic
        );
        let dark = EmotionAnalysis {
            tension: 0.75,
            ..EmotionAnalysis::default()
        };
        assert_eq!(BorrowedMood::classify(&dark), BorrowedMood::Dark);
        assert_eq!(
            BorrowedMood::classify(&EmotionAnalysis::default()),
            BorrowedMood::Mystical
        );
    }

    #[test]
    fn modal_interchange_cites_mode() {
        let tables = MappingTables::builtin();
        let data = modal_interchange(&tables, "A", &with_gems(GemsDimension::Sadness, 0.8));
        assert_eq!(data.symbol, "Am6");
        assert_eq!(data.chord.notes, ["A", "C", "E", "F#"]);
        assert_eq!(data.context.borrowed_from.as_deref(), Some("dorian"));
        assert_eq!(data.cultural_reference.as_deref(), Some("Borrowed from dorian mode"));

        let mystical = modal_interchange(&tables, "C", &EmotionAnalysis::default());
        assert_eq!(mystical.symbol, "Cmaj7#5");
        assert_eq!(mystical.chord.notes, ["C", "E", "G#", "B"]);
    }
}
