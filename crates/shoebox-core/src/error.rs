//! Error types for shoebox-core.

use thiserror::Error;

use crate::floor::AnchorId;

/// Error type for shoebox-core operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Unknown surface: {0}. Must be one of LEFT, FRONT, RIGHT, BACK, CEILING, FLOOR")]
    UnknownSurface(String),

    #[error("Unknown plane anchor: {0}")]
    UnknownAnchor(AnchorId),

    #[error("No floor plane has been detected")]
    NoFloor,

    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("Catalog JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias.
pub type Result<T> = std::result::Result<T, Error>;
