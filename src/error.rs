use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::types::Rect;

/// Sprite sheet or manifest could not be turned into an atlas.
#[derive(Debug, Error)]
pub enum AssetLoadError {
    #[error("failed to read manifest {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("manifest is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("sequence {sequence:?} has invalid frame index {index:?}")]
    InvalidIndex { sequence: String, index: String },
    #[error("sequence {sequence:?} frame {index} has a negative size {width}x{height}")]
    NegativeSize {
        sequence: String,
        index: u32,
        width: i64,
        height: i64,
    },
    #[error("sequence {sequence:?} frame {index} {rect:?} lies outside the {sheet_width}x{sheet_height} sheet")]
    OutOfBounds {
        sequence: String,
        index: u32,
        rect: (i64, i64, i64, i64),
        sheet_width: u32,
        sheet_height: u32,
    },
    #[error("sheet is {width}x{height} but {actual} pixels were supplied")]
    PixelCount { width: u32, height: u32, actual: usize },
}

/// A sequence or frame that correct code always finds was missing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("unknown sprite sequence {0:?}")]
    UnknownSequence(String),
    #[error("sprite sequence {0:?} has no frames")]
    EmptySequence(String),
    #[error("sprite sequence {sequence:?} has no frame {index}")]
    MissingFrame { sequence: String, index: u32 },
}

/// No free spot for a new rock was found within the attempt limit.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no rock position clear of the ship after {attempts} attempts (ship at {ship:?})")]
pub struct SpawnPlacementFailed {
    pub attempts: u32,
    pub ship: Rect,
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("settings are not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid setting {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Everything that can stop the game from starting or running.
#[derive(Debug, Error)]
pub enum GameError {
    #[error(transparent)]
    Asset(#[from] AssetLoadError),
    #[error(transparent)]
    Lookup(#[from] LookupError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error("terminal I/O failed: {0}")]
    Io(#[from] io::Error),
}
