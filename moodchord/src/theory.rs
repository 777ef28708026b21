// Note names, interval labels, and chord spelling.
//
// The engine talks about chords the way lead sheets do: a root name ("Eb"),
// a quality literal ("maj7#11"), spelled notes ("Eb", "G", "Bb", "D", "A")
// and interval labels ("1P", "3M", "5P", "7M", "11A"). This module owns that
// vocabulary:
// - `NoteName`: letter + alteration, with letter-correct transposition
// - `Interval`: `<number><quality>` labels plus `b9`/`#11` shorthand
// - `CHORD_TYPES`: the static chord dictionary, every quality the mapping
//   tables can emit (one, "maj7/5", deliberately absent)
// - `resolve_or_triad`: the selector's failure policy. An unknown quality
//   or unreadable root degrades to a plain major triad instead of an error.
//
// Pitch classes are 0-11 with C = 0; MIDI octave numbering puts C4 at 60.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::TheoryError;

/// Pitch class of each natural letter C D E F G A B.
const NATURAL_PCS: [u8; 7] = [0, 2, 4, 5, 7, 9, 11];
const LETTERS: [char; 7] = ['C', 'D', 'E', 'F', 'G', 'A', 'B'];

/// A spelled note name without octave, e.g. `F#` or `Bb`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NoteName {
    /// Index into C D E F G A B.
    letter: u8,
    /// Sharps positive, flats negative.
    alter: i8,
}

impl NoteName {
    pub const C: NoteName = NoteName {
        letter: 0,
        alter: 0,
    };

    /// Parse `C`, `F#`, `Bb`, `Ebb`, `D♭`. Case-insensitive letter.
    pub fn parse(name: &str) -> Result<Self, TheoryError> {
        let (note, rest) = Self::parse_prefix(name)?;
        if !rest.is_empty() {
            return Err(TheoryError::InvalidNote(name.to_string()));
        }
        Ok(note)
    }

    /// Parse a root off the front of a chord symbol, returning the remainder.
    fn parse_prefix(text: &str) -> Result<(Self, &str), TheoryError> {
        let mut chars = text.char_indices();
        let letter = chars
            .next()
            .and_then(|(_, c)| LETTERS.iter().position(|&l| l == c.to_ascii_uppercase()))
            .ok_or_else(|| TheoryError::InvalidNote(text.to_string()))?;

        let mut alter: i8 = 0;
        let mut rest_start = text.len();
        for (i, c) in chars {
            match c {
                '#' | '♯' => alter += 1,
                'b' | '♭' => alter -= 1,
                _ => {
                    rest_start = i;
                    break;
                }
            }
        }
        if alter.abs() > 2 {
            return Err(TheoryError::InvalidNote(text.to_string()));
        }
        let note = NoteName {
            letter: letter as u8,
            alter,
        };
        Ok((note, &text[rest_start..]))
    }

    pub fn pitch_class(self) -> u8 {
        (NATURAL_PCS[self.letter as usize] as i16 + self.alter as i16).rem_euclid(12) as u8
    }

    /// Transpose up by an interval, keeping the letter spelling that the
    /// interval number implies (D + 3m is F, never E#).
    pub fn transpose(self, interval: Interval) -> NoteName {
        let steps = interval.number as usize - 1;
        let raw_letter = self.letter as usize + steps;
        let new_letter = raw_letter % 7;
        let wraps = (raw_letter / 7) as i16;

        let target = NATURAL_PCS[self.letter as usize] as i16
            + self.alter as i16
            + interval.semitones as i16;
        let natural = NATURAL_PCS[new_letter] as i16 + 12 * wraps;
        NoteName {
            letter: new_letter as u8,
            alter: (target - natural) as i8,
        }
    }

    /// MIDI number of this note in `octave` (C4 = 60). `Cb4` is 59, `B#3` is 60.
    pub fn midi(self, octave: i8) -> Option<u8> {
        let m = (octave as i16 + 1) * 12
            + NATURAL_PCS[self.letter as usize] as i16
            + self.alter as i16;
        u8::try_from(m).ok().filter(|&m| m <= 127)
    }
}

impl std::fmt::Display for NoteName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", LETTERS[self.letter as usize])?;
        let accidental = if self.alter > 0 { "#" } else { "b" };
        for _ in 0..self.alter.unsigned_abs() {
            f.write_str(accidental)?;
        }
        Ok(())
    }
}

/// A diatonic interval: its number (1 = unison, 9 = ninth) and its size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    pub number: u8,
    pub semitones: i8,
}

impl Interval {
    pub const UNISON: Interval = Interval {
        number: 1,
        semitones: 0,
    };
    pub const MAJOR_THIRD: Interval = Interval {
        number: 3,
        semitones: 4,
    };
    pub const PERFECT_FOURTH: Interval = Interval {
        number: 4,
        semitones: 5,
    };
    pub const PERFECT_FIFTH: Interval = Interval {
        number: 5,
        semitones: 7,
    };

    /// Parse `3M`, `5P`, `7m`, `5d`, `11A`, or shorthand `b9`, `#11`, `13`.
    pub fn parse(label: &str) -> Result<Self, TheoryError> {
        let bad = || TheoryError::InvalidInterval(label.to_string());

        let (shift, body) = match label.chars().next() {
            Some('#') => (1, &label[1..]),
            Some('b') => (-1, &label[1..]),
            _ => (0, label),
        };
        let digits_end = body
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(body.len());
        let number: u8 = body[..digits_end].parse().map_err(|_| bad())?;
        if number == 0 {
            return Err(bad());
        }
        let quality = &body[digits_end..];
        let perfect_class = matches!((number - 1) % 7, 0 | 3 | 4);

        let offset: i8 = match (quality, perfect_class) {
            ("", _) => 0,
            ("P", true) | ("M", false) => 0,
            ("m", false) => -1,
            ("A", _) => 1,
            ("d", true) => -1,
            ("d", false) => -2,
            _ => return Err(bad()),
        };
        if shift != 0 && !quality.is_empty() {
            return Err(bad());
        }

        let simple = (number as usize - 1) % 7;
        let octaves = (number as usize - 1) / 7;
        let base = NATURAL_PCS[simple] as i8 + 12 * octaves as i8;
        Ok(Interval {
            number,
            semitones: base + offset + shift,
        })
    }
}

/// One entry in the chord dictionary.
#[derive(Debug)]
pub struct ChordType {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub intervals: &'static [&'static str],
}

/// Every chord quality the selector can ask for, by interval recipe.
pub static CHORD_TYPES: &[ChordType] = &[
    // Triads and dyads
    ChordType {
        name: "maj",
        aliases: &["", "M", "maj", "major"],
        intervals: &["1P", "3M", "5P"],
    },
    ChordType {
        name: "m",
        aliases: &["m", "min", "-"],
        intervals: &["1P", "3m", "5P"],
    },
    ChordType {
        name: "dim",
        aliases: &["dim", "°"],
        intervals: &["1P", "3m", "5d"],
    },
    ChordType {
        name: "aug",
        aliases: &["aug", "+"],
        intervals: &["1P", "3M", "5A"],
    },
    ChordType {
        name: "sus4",
        aliases: &["sus4", "sus"],
        intervals: &["1P", "4P", "5P"],
    },
    ChordType {
        name: "sus2",
        aliases: &["sus2"],
        intervals: &["1P", "2M", "5P"],
    },
    ChordType {
        name: "5",
        aliases: &["5"],
        intervals: &["1P", "5P"],
    },
    // Sixths and added tones
    ChordType {
        name: "6",
        aliases: &["6"],
        intervals: &["1P", "3M", "5P", "6M"],
    },
    ChordType {
        name: "m6",
        aliases: &["m6"],
        intervals: &["1P", "3m", "5P", "6M"],
    },
    ChordType {
        name: "6/9",
        aliases: &["6/9", "69"],
        intervals: &["1P", "3M", "5P", "6M", "9M"],
    },
    ChordType {
        name: "add9",
        aliases: &["add9"],
        intervals: &["1P", "3M", "5P", "9M"],
    },
    // Major sevenths
    ChordType {
        name: "maj7",
        aliases: &["maj7", "M7", "Δ7"],
        intervals: &["1P", "3M", "5P", "7M"],
    },
    ChordType {
        name: "maj9",
        aliases: &["maj9", "M9"],
        intervals: &["1P", "3M", "5P", "7M", "9M"],
    },
    ChordType {
        name: "maj13",
        aliases: &["maj13", "M13"],
        intervals: &["1P", "3M", "5P", "7M", "9M", "13M"],
    },
    ChordType {
        name: "maj7#11",
        aliases: &["maj7#11", "M7#11"],
        intervals: &["1P", "3M", "5P", "7M", "11A"],
    },
    ChordType {
        name: "maj13#11",
        aliases: &["maj13#11", "M13#11"],
        intervals: &["1P", "3M", "5P", "7M", "9M", "11A", "13M"],
    },
    ChordType {
        name: "maj7#5",
        aliases: &["maj7#5", "M7#5"],
        intervals: &["1P", "3M", "5A", "7M"],
    },
    // Minor sevenths
    ChordType {
        name: "m7",
        aliases: &["m7", "min7", "-7"],
        intervals: &["1P", "3m", "5P", "7m"],
    },
    ChordType {
        name: "m9",
        aliases: &["m9", "min9"],
        intervals: &["1P", "3m", "5P", "7m", "9M"],
    },
    ChordType {
        name: "m11",
        aliases: &["m11", "min11"],
        intervals: &["1P", "3m", "5P", "7m", "9M", "11P"],
    },
    ChordType {
        name: "m13",
        aliases: &["m13", "min13"],
        intervals: &["1P", "3m", "5P", "7m", "9M", "11P", "13M"],
    },
    ChordType {
        name: "mMaj7",
        aliases: &["mMaj7", "mM7", "m(maj7)"],
        intervals: &["1P", "3m", "5P", "7M"],
    },
    ChordType {
        name: "m7b5",
        aliases: &["m7b5", "ø", "ø7"],
        intervals: &["1P", "3m", "5d", "7m"],
    },
    ChordType {
        name: "dim7",
        aliases: &["dim7", "°7"],
        intervals: &["1P", "3m", "5d", "7d"],
    },
    // Dominants
    ChordType {
        name: "7",
        aliases: &["7", "dom7"],
        intervals: &["1P", "3M", "5P", "7m"],
    },
    ChordType {
        name: "9",
        aliases: &["9"],
        intervals: &["1P", "3M", "5P", "7m", "9M"],
    },
    ChordType {
        name: "13",
        aliases: &["13"],
        intervals: &["1P", "3M", "5P", "7m", "9M", "13M"],
    },
    ChordType {
        name: "7b9",
        aliases: &["7b9"],
        intervals: &["1P", "3M", "5P", "7m", "9m"],
    },
    ChordType {
        name: "7#9",
        aliases: &["7#9"],
        intervals: &["1P", "3M", "5P", "7m", "9A"],
    },
    ChordType {
        name: "7#11",
        aliases: &["7#11"],
        intervals: &["1P", "3M", "5P", "7m", "11A"],
    },
    ChordType {
        name: "7alt",
        aliases: &["7alt", "alt7", "alt"],
        intervals: &["1P", "3M", "7m", "9m", "9A", "11A", "13m"],
    },
    ChordType {
        name: "13b9",
        aliases: &["13b9"],
        intervals: &["1P", "3M", "5P", "7m", "9m", "13M"],
    },
    ChordType {
        name: "13b9#11",
        aliases: &["13b9#11"],
        intervals: &["1P", "3M", "5P", "7m", "9m", "11A", "13M"],
    },
];

/// Rewrite spellings the dictionary does not list (`maj6` is just `6`).
fn normalize_quality(quality: &str) -> String {
    quality
        .replace("maj6", "6")
        .replace("Maj6", "6")
        .replace("MAJ6", "6")
}

/// Look up a quality literal in the chord dictionary.
pub fn chord_type(quality: &str) -> Option<&'static ChordType> {
    let normalized = normalize_quality(quality);
    CHORD_TYPES
        .iter()
        .find(|ct| ct.aliases.iter().any(|&a| a == normalized))
}

/// Theoretical chord: root, quality literal, spelled notes and the interval
/// label of each note. `notes` and `intervals` always have equal length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasicChord {
    pub root: String,
    pub quality: String,
    pub notes: Vec<String>,
    pub intervals: Vec<String>,
}

impl BasicChord {
    /// Build from a root and a list of `(note, label)` pairs.
    pub fn from_pairs(root: &str, quality: &str, pairs: Vec<(String, String)>) -> Self {
        let (notes, intervals) = pairs.into_iter().unzip();
        BasicChord {
            root: root.to_string(),
            quality: quality.to_string(),
            notes,
            intervals,
        }
    }
}

/// Split a chord symbol into its root and quality: `"Bbmaj7"` -> (`Bb`, `"maj7"`).
pub fn parse_symbol(symbol: &str) -> Result<(NoteName, &str), TheoryError> {
    NoteName::parse_prefix(symbol.trim())
}

/// Spell a chord from a root name and a quality literal.
pub fn resolve_chord(root: &str, quality: &str) -> Result<BasicChord, TheoryError> {
    let root_note = NoteName::parse(root)?;
    let ct = chord_type(quality).ok_or_else(|| TheoryError::UnknownQuality(quality.to_string()))?;

    let mut pairs = Vec::with_capacity(ct.intervals.len());
    for &label in ct.intervals {
        let interval = Interval::parse(label)?;
        pairs.push((root_note.transpose(interval).to_string(), label.to_string()));
    }
    Ok(BasicChord::from_pairs(&root_note.to_string(), quality, pairs))
}

/// Spell a chord, or fall back to a major triad on the intended root.
///
/// Never fails: an unreadable root falls back to C. The fallback's quality
/// is `"maj"`; callers keep the symbol they intended.
pub fn resolve_or_triad(root: &str, quality: &str) -> BasicChord {
    match resolve_chord(root, quality) {
        Ok(chord) => chord,
        Err(err) => {
            warn!(root, quality, %err, "unresolvable chord symbol, using major triad");
            let root_note = NoteName::parse(root).unwrap_or(NoteName::C);
            major_triad(root_note)
        }
    }
}

/// Resolve a whole symbol such as `"Db"` or `"F#m7"`, with the same fallback.
pub fn resolve_symbol(symbol: &str) -> BasicChord {
    match parse_symbol(symbol) {
        Ok((root, quality)) => resolve_or_triad(&root.to_string(), quality),
        Err(err) => {
            warn!(symbol, %err, "unreadable chord symbol, using C major triad");
            major_triad(NoteName::C)
        }
    }
}

fn major_triad(root: NoteName) -> BasicChord {
    let pairs = [
        (Interval::UNISON, "1P"),
        (Interval::MAJOR_THIRD, "3M"),
        (Interval::PERFECT_FIFTH, "5P"),
    ]
    .into_iter()
    .map(|(iv, label)| (root.transpose(iv).to_string(), label.to_string()))
    .collect();
    BasicChord::from_pairs(&root.to_string(), "maj", pairs)
}

/// Pitch class of a note name, `None` if unreadable.
pub fn pitch_class(name: &str) -> Option<u8> {
    NoteName::parse(name).ok().map(NoteName::pitch_class)
}

/// MIDI number of a note name in an octave (C4 = 60).
pub fn note_to_midi(name: &str, octave: i8) -> Option<u8> {
    NoteName::parse(name).ok().and_then(|n| n.midi(octave))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(chord: &BasicChord) -> Vec<&str> {
        chord.notes.iter().map(String::as_str).collect()
    }

    #[test]
    fn parse_and_display_notes() {
        assert_eq!(NoteName::parse("F#").unwrap().to_string(), "F#");
        assert_eq!(NoteName::parse("D♭").unwrap().to_string(), "Db");
        assert_eq!(NoteName::parse("bb").unwrap().to_string(), "Bb");
        assert_eq!(NoteName::parse("Eb").unwrap().pitch_class(), 3);
        assert_eq!(NoteName::parse("Cb").unwrap().pitch_class(), 11);
        assert!(NoteName::parse("H").is_err());
        assert!(NoteName::parse("Cmaj").is_err());
        assert!(NoteName::parse("").is_err());
    }

    #[test]
    fn interval_labels() {
        assert_eq!(Interval::parse("3M").unwrap().semitones, 4);
        assert_eq!(Interval::parse("7m").unwrap().semitones, 10);
        assert_eq!(Interval::parse("5d").unwrap().semitones, 6);
        assert_eq!(Interval::parse("7d").unwrap().semitones, 9);
        assert_eq!(Interval::parse("11A").unwrap().semitones, 18);
        assert_eq!(Interval::parse("#11").unwrap(), Interval::parse("11A").unwrap());
        assert_eq!(Interval::parse("b9").unwrap(), Interval::parse("9m").unwrap());
        assert_eq!(Interval::parse("13M").unwrap().semitones, 21);
        assert!(Interval::parse("3P").is_err());
        assert!(Interval::parse("5m").is_err());
        assert!(Interval::parse("x").is_err());
    }

    #[test]
    fn transpose_keeps_letter_spelling() {
        let d = NoteName::parse("D").unwrap();
        assert_eq!(d.transpose(Interval::parse("3m").unwrap()).to_string(), "F");
        let bb = NoteName::parse("Bb").unwrap();
        assert_eq!(bb.transpose(Interval::PERFECT_FOURTH).to_string(), "Eb");
        let fs = NoteName::parse("F#").unwrap();
        assert_eq!(fs.transpose(Interval::PERFECT_FOURTH).to_string(), "B");
        let c = NoteName::parse("C").unwrap();
        assert_eq!(c.transpose(Interval::parse("4A").unwrap()).to_string(), "F#");
    }

    #[test]
    fn d_minor_ninth() {
        let chord = resolve_chord("D", "m9").unwrap();
        assert_eq!(names(&chord), ["D", "F", "A", "C", "E"]);
        assert_eq!(chord.intervals, ["1P", "3m", "5P", "7m", "9M"]);
        assert_eq!(chord.quality, "m9");
    }

    #[test]
    fn flat_roots_spell_with_flats() {
        let chord = resolve_chord("Eb", "maj7#11").unwrap();
        assert_eq!(names(&chord), ["Eb", "G", "Bb", "D", "A"]);
        let chord = resolve_chord("Ab", "m7b5").unwrap();
        assert_eq!(names(&chord), ["Ab", "Cb", "Ebb", "Gb"]);
    }

    #[test]
    fn maj6_is_normalized() {
        let chord = resolve_chord("F", "maj6").unwrap();
        assert_eq!(names(&chord), ["F", "A", "C", "D"]);
    }

    #[test]
    fn every_dictionary_entry_spells_equal_lengths() {
        for ct in CHORD_TYPES {
            let chord = resolve_chord("G", ct.name).unwrap();
            assert_eq!(chord.notes.len(), chord.intervals.len(), "{}", ct.name);
            assert_eq!(chord.notes[0], "G", "{}", ct.name);
        }
    }

    #[test]
    fn unknown_quality_falls_back_to_triad() {
        let chord = resolve_or_triad("A", "maj7/5");
        assert_eq!(names(&chord), ["A", "C#", "E"]);
        assert_eq!(chord.quality, "maj");
        assert_eq!(chord.intervals.len(), 3);
    }

    #[test]
    fn unreadable_root_falls_back_to_c() {
        let chord = resolve_or_triad("Q", "m7");
        assert_eq!(names(&chord), ["C", "E", "G"]);
    }

    #[test]
    fn parse_symbol_splits_root() {
        let (root, quality) = parse_symbol("Bbmaj7").unwrap();
        assert_eq!(root.to_string(), "Bb");
        assert_eq!(quality, "maj7");
        let chord = resolve_symbol("F#");
        assert_eq!(names(&chord), ["F#", "A#", "C#"]);
    }

    #[test]
    fn midi_numbers() {
        assert_eq!(note_to_midi("C", 4), Some(60));
        assert_eq!(note_to_midi("A", 4), Some(69));
        assert_eq!(note_to_midi("Cb", 4), Some(59));
        assert_eq!(note_to_midi("D", 2), Some(38));
        assert_eq!(note_to_midi("C", -2), None);
        assert_eq!(pitch_class("Gb"), Some(6));
    }
}
