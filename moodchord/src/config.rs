// Tunable engine parameters.
//
// `EngineConfig` holds the handful of numbers the engine would otherwise
// hard-code: the register floor for voicings, chord length in beats, and the
// default sizes for progressions and alternative sets. Loaded from JSON the
// same way as the mapping tables; any field left out of the file takes its
// default.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{HarmonyError, Result};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Lowest MIDI pitch a non-bass voicing may start on (55 = G3).
    pub register_floor: u8,
    /// Beats each progression chord lasts.
    pub chord_duration_beats: u32,
    pub default_progression_length: usize,
    pub default_alternatives: usize,
    /// Attempts the alternatives generator makes per requested chord.
    /// 1 means a symbol collision simply leaves that slot empty.
    pub alternative_attempts_per_slot: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            register_floor: 55,
            chord_duration_beats: 4,
            default_progression_length: 4,
            default_alternatives: 3,
            alternative_attempts_per_slot: 1,
        }
    }
}

impl EngineConfig {
    /// Load from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path).map_err(|source| HarmonyError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: EngineConfig = serde_json::from_str(&data)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"register_floor": 48, "alternative_attempts_per_slot": 4}"#)
                .unwrap();
        assert_eq!(config.register_floor, 48);
        assert_eq!(config.alternative_attempts_per_slot, 4);
        assert_eq!(config.chord_duration_beats, 4);
        assert_eq!(config.default_progression_length, 4);
    }

    #[test]
    fn default_config_serializes() {
        let config = EngineConfig::default();
        let json = serde_json::to_string_pretty(&config).unwrap();
        let restored: EngineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, restored);
    }

    #[test]
    fn bad_json_is_a_json_error() {
        let dir = std::env::temp_dir().join("moodchord-config-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("bad.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(EngineConfig::load(&path), Err(HarmonyError::Json(_))));
    }
}
