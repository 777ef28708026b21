// Error types for the harmony engine.
//
// Generation itself never fails for a well-formed `EmotionAnalysis`: the only
// failure inside the pipeline (an unresolvable chord symbol) is recovered
// locally in theory.rs. These errors surface from the edges instead: loading
// tables/config from disk and writing MIDI files.

use std::path::PathBuf;

/// Failures from the note/interval/chord library.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TheoryError {
    #[error("invalid note name: {0:?}")]
    InvalidNote(String),
    #[error("invalid interval label: {0:?}")]
    InvalidInterval(String),
    #[error("unknown chord quality: {0:?}")]
    UnknownQuality(String),
}

/// Errors from loading configuration or writing output.
#[derive(Debug, thiserror::Error)]
pub enum HarmonyError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid mapping tables: {0}")]
    InvalidTables(String),
}

pub type Result<T> = std::result::Result<T, HarmonyError>;
