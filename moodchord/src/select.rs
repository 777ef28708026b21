// Root and quality selection: EmotionAnalysis -> ChordData.
//
// Decision order, first match wins:
// 1. GEMS: the dominant dimension's quality list, if the tables configure
//    one. The tokens `quartal`, `spectral` and `polychord` hand off to the
//    generators in special.rs.
// 2. Advanced harmony (tension > 0.7 and complexity > 0.6): altered
//    dominant, modal interchange, or an extended-chord fallback.
// 3. Quadrant selection on (valence, arousal).
//
// Roots come from the cultural override, then the valence bucket;
// `ChordOptions::preferred_root` beats both and skips the random draw.
// Every random choice goes through the caller's `RandomSource`.

use serde::{Deserialize, Serialize};
use tracing::debug;

use moodchord_prng::{RandomSource, choose};

use crate::emotion::{ChordOptions, CulturalContext, EmotionAnalysis, GemsDimension};
use crate::special;
use crate::tables::MappingTables;
use crate::theory::{BasicChord, resolve_or_triad};

/// Which special construction produced a chord, if any.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HarmonicKind {
    Quartal,
    Spectral,
    Polychord,
    Altered,
    ModalInterchange,
    Extended,
}

/// Tags describing how a chord was chosen.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChordContext {
    /// Set when the GEMS branch picked the chord.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gems: Option<GemsDimension>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub harmonic: Option<HarmonicKind>,
    /// Source mode of a modal-interchange chord.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub borrowed_from: Option<String>,
}

/// A chosen chord before voicing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChordData {
    pub symbol: String,
    pub chord: BasicChord,
    pub context: ChordContext,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cultural_reference: Option<String>,
}

impl ChordData {
    /// A plain `root + quality` chord with no special tags.
    pub fn plain(root: &str, quality: &str, context: ChordContext) -> Self {
        ChordData {
            symbol: format!("{root}{quality}"),
            chord: resolve_or_triad(root, quality),
            context,
            cultural_reference: None,
        }
    }
}

/// Pick one entry of a table list, or `fallback` for an empty list.
pub(crate) fn pick<'a, R: RandomSource + ?Sized>(
    rng: &mut R,
    list: &'a [String],
    fallback: &'a str,
) -> &'a str {
    choose(rng, list).map_or(fallback, String::as_str)
}

/// Choose a chord for an emotion.
pub fn select_chord<R: RandomSource + ?Sized>(
    tables: &MappingTables,
    emotion: &EmotionAnalysis,
    options: &ChordOptions,
    rng: &mut R,
) -> ChordData {
    if let Some(dim) = emotion.dominant_gems()
        && let Some(mapping) = tables.gems_mapping(dim)
    {
        let quality = pick(rng, &mapping.qualities, "maj");
        let root = root_for(tables, emotion, options, rng);
        debug!(gems = %dim, quality, root = %root, "GEMS selection");

        let mut data = match quality {
            "quartal" => special::quartal(&root),
            "spectral" => special::spectral(&root, emotion),
            "polychord" => special::polychord(tables, emotion, rng),
            _ => ChordData::plain(&root, quality, ChordContext::default()),
        };
        data.context.gems = Some(dim);
        return data;
    }

    if emotion.tension > 0.7 && emotion.complexity > 0.6 {
        return advanced_harmony(tables, emotion, options, rng);
    }

    quadrant_selection(tables, emotion, options, rng)
}

/// High tension and complexity: altered dominants, borrowed chords, or
/// extended harmony.
fn advanced_harmony<R: RandomSource + ?Sized>(
    tables: &MappingTables,
    emotion: &EmotionAnalysis,
    options: &ChordOptions,
    rng: &mut R,
) -> ChordData {
    let root = root_for(tables, emotion, options, rng);

    if emotion.tension > 0.8 {
        let label = pick(rng, &tables.altered_dominants, "7alt");
        debug!(root = %root, label, "altered dominant");
        return ChordData {
            symbol: format!("{root}{label}"),
            chord: special::altered_dominant(&root, label),
            context: ChordContext {
                harmonic: Some(HarmonicKind::Altered),
                ..ChordContext::default()
            },
            cultural_reference: None,
        };
    }

    if emotion.complexity > 0.7 {
        debug!(root = %root, "modal interchange");
        return special::modal_interchange(tables, &root, emotion);
    }

    let quality = pick(rng, &tables.extended_qualities, "maj7#11");
    debug!(root = %root, quality, "extended harmony");
    ChordData::plain(
        &root,
        quality,
        ChordContext {
            harmonic: Some(HarmonicKind::Extended),
            ..ChordContext::default()
        },
    )
}

fn quadrant_selection<R: RandomSource + ?Sized>(
    tables: &MappingTables,
    emotion: &EmotionAnalysis,
    options: &ChordOptions,
    rng: &mut R,
) -> ChordData {
    let root = root_for(tables, emotion, options, rng);
    let q = &tables.quadrants;
    let list = if emotion.valence > 0.5 && emotion.arousal > 0.5 {
        &q.bright
    } else if emotion.valence > 0.5 {
        &q.peaceful
    } else if emotion.valence < -0.5 && emotion.arousal > 0.5 {
        &q.tense
    } else {
        &q.minor
    };
    let quality = pick(rng, list, "maj");
    debug!(root = %root, quality, "quadrant selection");
    ChordData::plain(&root, quality, ChordContext::default())
}

/// The preferred root if the caller gave one, else a drawn root.
fn root_for<R: RandomSource + ?Sized>(
    tables: &MappingTables,
    emotion: &EmotionAnalysis,
    options: &ChordOptions,
    rng: &mut R,
) -> String {
    match &options.preferred_root {
        Some(root) => root.clone(),
        None => select_root(tables, emotion, rng),
    }
}

/// Draw a root: cultural tonic first, then the valence bucket.
pub fn select_root<R: RandomSource + ?Sized>(
    tables: &MappingTables,
    emotion: &EmotionAnalysis,
    rng: &mut R,
) -> String {
    match emotion.cultural_context {
        // Sa or Pa.
        Some(CulturalContext::Indian) => {
            return if emotion.valence >= 0.0 { "C" } else { "G" }.to_string();
        }
        Some(CulturalContext::Arabic) => return "D".to_string(),
        _ => {}
    }

    let set = if emotion.valence > 0.5 {
        &tables.roots.bright
    } else if emotion.valence < -0.5 {
        &tables.roots.dark
    } else {
        &tables.roots.ambiguous
    };
    pick(rng, set, "C").to_string()
}
