// Input records: the analyzed emotion and caller-supplied chord options.
//
// `EmotionAnalysis` arrives already validated from the upstream analyzer
// (an LLM call that turns free text into these numbers). The engine never
// validates or mutates it; every generator takes it by shared reference.
//
// GEMS (Geneva Emotional Music Scale) values live in `Gems`, one optional
// field per dimension in canonical order. That order is the tie-break order
// for `Gems::dominant`, so the field order here is load-bearing.

use serde::{Deserialize, Serialize};

use crate::voicing::VoicingStyle;

/// The nine GEMS dimensions, in canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GemsDimension {
    Joy,
    Sadness,
    Tension,
    Wonder,
    Peacefulness,
    Power,
    Tenderness,
    Nostalgia,
    Transcendence,
}

impl GemsDimension {
    pub const ALL: [GemsDimension; 9] = [
        GemsDimension::Joy,
        GemsDimension::Sadness,
        GemsDimension::Tension,
        GemsDimension::Wonder,
        GemsDimension::Peacefulness,
        GemsDimension::Power,
        GemsDimension::Tenderness,
        GemsDimension::Nostalgia,
        GemsDimension::Transcendence,
    ];

    pub fn name(self) -> &'static str {
        match self {
            GemsDimension::Joy => "joy",
            GemsDimension::Sadness => "sadness",
            GemsDimension::Tension => "tension",
            GemsDimension::Wonder => "wonder",
            GemsDimension::Peacefulness => "peacefulness",
            GemsDimension::Power => "power",
            GemsDimension::Tenderness => "tenderness",
            GemsDimension::Nostalgia => "nostalgia",
            GemsDimension::Transcendence => "transcendence",
        }
    }
}

impl std::fmt::Display for GemsDimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// GEMS scores, each in [0, 1] when present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Gems {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub joy: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sadness: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tension: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wonder: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peacefulness: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub power: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenderness: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nostalgia: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcendence: Option<f64>,
}

impl Gems {
    /// Raw value of one dimension, `None` when the analyzer left it out.
    pub fn value(&self, dim: GemsDimension) -> Option<f64> {
        match dim {
            GemsDimension::Joy => self.joy,
            GemsDimension::Sadness => self.sadness,
            GemsDimension::Tension => self.tension,
            GemsDimension::Wonder => self.wonder,
            GemsDimension::Peacefulness => self.peacefulness,
            GemsDimension::Power => self.power,
            GemsDimension::Tenderness => self.tenderness,
            GemsDimension::Nostalgia => self.nostalgia,
            GemsDimension::Transcendence => self.transcendence,
        }
    }

    /// Value of one dimension, absent counted as 0.
    pub fn get(&self, dim: GemsDimension) -> f64 {
        self.value(dim).unwrap_or(0.0)
    }

    /// Builder-style setter, mostly for tests and fixtures.
    pub fn with(mut self, dim: GemsDimension, value: f64) -> Self {
        let slot = match dim {
            GemsDimension::Joy => &mut self.joy,
            GemsDimension::Sadness => &mut self.sadness,
            GemsDimension::Tension => &mut self.tension,
            GemsDimension::Wonder => &mut self.wonder,
            GemsDimension::Peacefulness => &mut self.peacefulness,
            GemsDimension::Power => &mut self.power,
            GemsDimension::Tenderness => &mut self.tenderness,
            GemsDimension::Nostalgia => &mut self.nostalgia,
            GemsDimension::Transcendence => &mut self.transcendence,
        };
        *slot = Some(value);
        self
    }

    /// The strictly-greatest dimension. Ties keep the earliest in canonical
    /// order; a dimension must score above zero to count.
    pub fn dominant(&self) -> Option<GemsDimension> {
        let mut best: Option<(GemsDimension, f64)> = None;
        for dim in GemsDimension::ALL {
            let Some(v) = self.value(dim) else { continue };
            let threshold = best.map_or(0.0, |(_, b)| b);
            if v > threshold {
                best = Some((dim, v));
            }
        }
        best.map(|(dim, _)| dim)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CulturalContext {
    Western,
    Indian,
    Arabic,
    Universal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HarmonicStyle {
    Classical,
    Jazz,
    Contemporary,
    Experimental,
}

/// One analyzed emotional state. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmotionAnalysis {
    /// Pleasantness, -1 to 1.
    pub valence: f64,
    /// Activation, 0 to 1.
    pub arousal: f64,
    pub tension: f64,
    pub complexity: f64,
    pub emotional_intensity: f64,
    pub primary_emotion: String,
    #[serde(default)]
    pub secondary_emotions: Vec<String>,
    pub musical_mode: String,
    /// BPM, 40 to 200.
    pub suggested_tempo: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gems: Option<Gems>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cultural_context: Option<CulturalContext>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub harmonic_style: Option<HarmonicStyle>,
}

impl EmotionAnalysis {
    /// A GEMS dimension, 0 when GEMS or the dimension is absent.
    pub fn gems_value(&self, dim: GemsDimension) -> f64 {
        self.gems.as_ref().map_or(0.0, |g| g.get(dim))
    }

    pub fn dominant_gems(&self) -> Option<GemsDimension> {
        self.gems.as_ref().and_then(Gems::dominant)
    }
}

impl Default for EmotionAnalysis {
    fn default() -> Self {
        EmotionAnalysis {
            valence: 0.0,
            arousal: 0.5,
            tension: 0.5,
            complexity: 0.5,
            emotional_intensity: 0.5,
            primary_emotion: "neutral".to_string(),
            secondary_emotions: Vec::new(),
            musical_mode: "major".to_string(),
            suggested_tempo: 100,
            gems: None,
            cultural_context: None,
            harmonic_style: None,
        }
    }
}

/// Caller overrides for a single generation request. Never mutated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChordOptions {
    pub preferred_root: Option<String>,
    pub voicing_style: Option<VoicingStyle>,
    /// Note names whose pitch classes should be left out of the voicing.
    pub avoid_notes: Vec<String>,
    /// Inclusive MIDI range `[low, high]` the voicing should sit in.
    pub instrument_range: Option<(u8, u8)>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dominant_picks_strict_maximum() {
        let gems = Gems::default()
            .with(GemsDimension::Joy, 0.4)
            .with(GemsDimension::Wonder, 0.8)
            .with(GemsDimension::Nostalgia, 0.6);
        assert_eq!(gems.dominant(), Some(GemsDimension::Wonder));
    }

    #[test]
    fn dominant_ties_keep_first_seen() {
        let gems = Gems::default()
            .with(GemsDimension::Transcendence, 0.9)
            .with(GemsDimension::Sadness, 0.9);
        assert_eq!(gems.dominant(), Some(GemsDimension::Sadness));
    }

    #[test]
    fn dominant_ignores_zero_and_absent() {
        assert_eq!(Gems::default().dominant(), None);
        let zeros = Gems::default().with(GemsDimension::Power, 0.0);
        assert_eq!(zeros.dominant(), None);
    }

    #[test]
    fn parses_camel_case_json() {
        let json = r#"{
            "valence": 0.8, "arousal": 0.7, "tension": 0.2, "complexity": 0.4,
            "emotionalIntensity": 0.9, "primaryEmotion": "joy",
            "secondaryEmotions": ["hope"], "musicalMode": "lydian",
            "suggestedTempo": 128, "gems": {"joy": 0.9, "wonder": 0.3},
            "culturalContext": "indian", "harmonicStyle": "jazz"
        }"#;
        let e: EmotionAnalysis = serde_json::from_str(json).unwrap();
        assert_eq!(e.suggested_tempo, 128);
        assert_eq!(e.cultural_context, Some(CulturalContext::Indian));
        assert_eq!(e.harmonic_style, Some(HarmonicStyle::Jazz));
        assert_eq!(e.dominant_gems(), Some(GemsDimension::Joy));
        assert_eq!(e.gems_value(GemsDimension::Tension), 0.0);
    }

    #[test]
    fn options_parse_with_defaults() {
        let opts: ChordOptions =
            serde_json::from_str(r#"{"preferredRoot": "Eb", "voicingStyle": "drop2"}"#).unwrap();
        assert_eq!(opts.preferred_root.as_deref(), Some("Eb"));
        assert_eq!(opts.voicing_style, Some(VoicingStyle::Drop2));
        assert!(opts.avoid_notes.is_empty());
        assert_eq!(opts.instrument_range, None);
    }
}
