//! Error types for shoebox-graph.

use shoebox_core::SourceId;
use thiserror::Error;

/// Error type for source graph operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Unknown source: {0}")]
    UnknownSource(SourceId),

    #[error("Clip {clip} out of range ({available} available)")]
    ClipOutOfRange { clip: usize, available: usize },

    #[error("Recording failed: {0}")]
    Recording(String),

    #[error(transparent)]
    Core(#[from] shoebox_core::Error),
}

/// Result type alias.
pub type Result<T> = std::result::Result<T, Error>;
