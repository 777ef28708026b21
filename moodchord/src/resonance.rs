// Emotional resonance, justification text, and renderer hints.
//
// Resonance is a coarse 0-1 alignment score: 0.5 base, +0.3 when the GEMS
// branch picked the chord, +0.2 when a cultural reference is attached.
// The justification is one sentence assembled from clauses. Timbre,
// dynamics and articulation are suggestions for a downstream renderer; the
// engine itself never plays anything.

use serde::{Deserialize, Serialize};

use crate::emotion::{EmotionAnalysis, GemsDimension};
use crate::select::{ChordData, HarmonicKind};

pub fn resonance(emotion: &EmotionAnalysis, data: &ChordData) -> f64 {
    let mut score = 0.5;
    if emotion.gems.is_some() && data.context.gems.is_some() {
        score += 0.3;
    }
    if data.cultural_reference.is_some() {
        score += 0.2;
    }
    f64::min(score, 1.0)
}

/// One sentence explaining why this chord fits the emotion.
pub fn justification(emotion: &EmotionAnalysis, data: &ChordData) -> String {
    let quality = match data.chord.quality.as_str() {
        "" => "chord",
        q => q,
    };
    let mut parts = vec![format!(
        "This {quality} reflects the {} emotion",
        emotion.primary_emotion
    )];

    match data.context.harmonic {
        Some(HarmonicKind::Quartal) => {
            parts.push("using quartal harmony for modern, open sound".to_string());
        }
        Some(HarmonicKind::Polychord) => parts.push("through polychordal tension".to_string()),
        Some(HarmonicKind::ModalInterchange) => {
            let mode = data.context.borrowed_from.as_deref().unwrap_or("parallel mode");
            parts.push(format!("borrowed from {mode}"));
        }
        Some(HarmonicKind::Spectral) => {
            parts.push("voicing partials of the harmonic series".to_string());
        }
        _ => {}
    }

    if let Some(dim) = emotion.dominant_gems() {
        parts.push(format!("emphasizing the {dim} quality"));
    }

    parts.join(", ") + "."
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Timbre {
    Piano,
    Strings,
    Brass,
    SynthPad,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dynamics {
    Pp,
    P,
    Mf,
    F,
    Ff,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Articulation {
    Normal,
    Legato,
    Staccato,
    Marcato,
}

pub fn suggest_timbre(emotion: &EmotionAnalysis) -> Timbre {
    let g = |dim| emotion.gems_value(dim);
    if g(GemsDimension::Tenderness) > 0.7 {
        Timbre::Strings
    } else if g(GemsDimension::Power) > 0.7 {
        Timbre::Brass
    } else if g(GemsDimension::Wonder) > 0.7 {
        Timbre::SynthPad
    } else {
        Timbre::Piano
    }
}

pub fn suggest_dynamics(emotion: &EmotionAnalysis) -> Dynamics {
    match emotion.emotional_intensity {
        i if i > 0.8 => Dynamics::Ff,
        i if i > 0.6 => Dynamics::F,
        i if i > 0.4 => Dynamics::Mf,
        i if i > 0.2 => Dynamics::P,
        _ => Dynamics::Pp,
    }
}

pub fn suggest_articulation(emotion: &EmotionAnalysis) -> Articulation {
    if emotion.gems_value(GemsDimension::Tension) > 0.7 {
        Articulation::Staccato
    } else if emotion.gems_value(GemsDimension::Peacefulness) > 0.7 {
        Articulation::Legato
    } else if emotion.arousal > 0.7 {
        Articulation::Marcato
    } else {
        Articulation::Normal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emotion::Gems;
    use crate::select::ChordContext;
    use crate::special;
    use crate::tables::MappingTables;

    fn joyful() -> EmotionAnalysis {
        EmotionAnalysis {
            primary_emotion: "joy".to_string(),
            gems: Some(Gems::default().with(GemsDimension::Joy, 0.9)),
            ..EmotionAnalysis::default()
        }
    }

    #[test]
    fn resonance_components() {
        let e = joyful();
        let plain = ChordData::plain("C", "maj7", ChordContext::default());
        assert_eq!(resonance(&e, &plain), 0.5);

        let mut gems_pick = plain.clone();
        gems_pick.context.gems = Some(GemsDimension::Joy);
        assert!((resonance(&e, &gems_pick) - 0.8).abs() < 1e-9);

        let mut quartal = special::quartal("C");
        quartal.context.gems = Some(GemsDimension::Wonder);
        assert_eq!(resonance(&e, &quartal), 1.0);

        let no_gems = EmotionAnalysis::default();
        assert!((resonance(&no_gems, &special::quartal("C")) - 0.7).abs() < 1e-9);
    }

    #[test]
    fn justification_plain() {
        let data = ChordData::plain("C", "maj9", ChordContext::default());
        assert_eq!(
            justification(&joyful(), &data),
            "This maj9 reflects the joy emotion, emphasizing the joy quality."
        );
        let neutral = EmotionAnalysis::default();
        assert_eq!(
            justification(&neutral, &data),
            "This maj9 reflects the neutral emotion."
        );
    }

    #[test]
    fn justification_technical_clauses() {
        let e = EmotionAnalysis {
            primary_emotion: "awe".to_string(),
            ..EmotionAnalysis::default()
        };
        assert_eq!(
            justification(&e, &special::quartal("D")),
            "This quartal reflects the awe emotion, using quartal harmony for modern, open sound."
        );

        let tables = MappingTables::builtin();
        let borrowed = special::modal_interchange(&tables, "C", &e);
        assert_eq!(
            justification(&e, &borrowed),
            "This maj7#5 reflects the awe emotion, borrowed from lydian augmented."
        );
    }

    #[test]
    fn hints() {
        let mut e = EmotionAnalysis::default();
        assert_eq!(suggest_timbre(&e), Timbre::Piano);
        assert_eq!(suggest_dynamics(&e), Dynamics::Mf);
        assert_eq!(suggest_articulation(&e), Articulation::Normal);

        e.emotional_intensity = 0.95;
        e.arousal = 0.9;
        e.gems = Some(Gems::default().with(GemsDimension::Power, 0.8));
        assert_eq!(suggest_timbre(&e), Timbre::Brass);
        assert_eq!(suggest_dynamics(&e), Dynamics::Ff);
        assert_eq!(suggest_articulation(&e), Articulation::Marcato);

        e.gems = Some(
            Gems::default()
                .with(GemsDimension::Wonder, 0.8)
                .with(GemsDimension::Tension, 0.8),
        );
        assert_eq!(suggest_timbre(&e), Timbre::SynthPad);
        assert_eq!(suggest_articulation(&e), Articulation::Staccato);

        e.emotional_intensity = 0.1;
        assert_eq!(suggest_dynamics(&e), Dynamics::Pp);
        assert_eq!(serde_json::to_string(&Timbre::SynthPad).unwrap(), "\"synth_pad\"");
    }
}
