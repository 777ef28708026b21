// MIDI output from progressions.
//
// Writes a progression's voicings as a Standard MIDI File: one block chord
// per slot, held for the slot's duration in quarter-note beats. Output is SMF
// Format 1 with a tempo track and a single piano track.
//
// Uses the `midly` crate for MIDI writing.

use std::path::Path;

use midly::{
    Format, Header, MetaMessage, MidiMessage, Smf, Timing, Track, TrackEvent, TrackEventKind,
    num::{u4, u7, u15, u24, u28},
};

use crate::error::{HarmonyError, Result};
use crate::progression::ChordProgression;

/// Ticks per quarter note in MIDI output.
const TICKS_PER_QUARTER: u16 = 480;

const CHANNEL: u8 = 0;
const VELOCITY: u8 = 80;

/// Convert a progression to MIDI and write it to `path`.
pub fn write_midi(progression: &ChordProgression, path: &Path) -> Result<()> {
    let io_err = |source| HarmonyError::Io {
        path: path.to_path_buf(),
        source,
    };
    let smf = progression_to_smf(progression);
    let mut buf = Vec::new();
    smf.write_std(&mut buf).map_err(io_err)?;
    std::fs::write(path, &buf).map_err(io_err)?;
    Ok(())
}

fn event(delta: u32, kind: TrackEventKind<'static>) -> TrackEvent<'static> {
    TrackEvent {
        delta: u28::new(delta),
        kind,
    }
}

fn note(delta: u32, key: u8, on: bool) -> TrackEvent<'static> {
    let key = u7::new(key.min(127));
    let message = if on {
        MidiMessage::NoteOn {
            key,
            vel: u7::new(VELOCITY),
        }
    } else {
        MidiMessage::NoteOff {
            key,
            vel: u7::new(0),
        }
    };
    event(
        delta,
        TrackEventKind::Midi {
            channel: u4::new(CHANNEL),
            message,
        },
    )
}

/// Convert a progression to an in-memory SMF.
pub fn progression_to_smf(progression: &ChordProgression) -> Smf<'static> {
    let mut smf = Smf::new(Header::new(
        Format::Parallel,
        Timing::Metrical(u15::new(TICKS_PER_QUARTER)),
    ));

    let bpm = u32::from(progression.tempo.max(1));
    smf.tracks.push(vec![
        event(0, TrackEventKind::Meta(MetaMessage::Tempo(u24::new(60_000_000 / bpm)))),
        event(0, TrackEventKind::Meta(MetaMessage::EndOfTrack)),
    ]);

    let mut track: Track<'static> = vec![
        event(0, TrackEventKind::Meta(MetaMessage::TrackName(b"Chords"))),
        event(
            0,
            TrackEventKind::Midi {
                channel: u4::new(CHANNEL),
                message: MidiMessage::ProgramChange { program: u7::new(0) },
            },
        ),
    ];

    // Ticks elapsed since the last written event; empty slots are silence.
    let mut pending: u32 = 0;
    for chord in &progression.chords {
        let ticks = chord.duration * u32::from(TICKS_PER_QUARTER);
        if chord.midi_notes.is_empty() {
            pending += ticks;
            continue;
        }
        for (i, &key) in chord.midi_notes.iter().enumerate() {
            let delta = if i == 0 { pending } else { 0 };
            track.push(note(delta, key, true));
        }
        for (i, &key) in chord.midi_notes.iter().enumerate() {
            let delta = if i == 0 { ticks } else { 0 };
            track.push(note(delta, key, false));
        }
        pending = 0;
    }
    track.push(event(pending, TrackEventKind::Meta(MetaMessage::EndOfTrack)));
    smf.tracks.push(track);

    smf
}
