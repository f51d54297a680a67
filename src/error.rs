//! Centralized error type for the shoebox umbrella crate.
//!
//! Wraps all subsystem errors so `?` propagates naturally across crate boundaries.

use thiserror::Error;

use crate::fsm::Rejection;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] shoebox_core::Error),

    #[error("Graph: {0}")]
    Graph(#[from] shoebox_graph::Error),

    #[error("Rejected: {0}")]
    Rejected(#[from] Rejection),

    #[error("Spatializer unavailable: {0}")]
    SpatializerUnavailable(String),

    #[error("Spatializer was lost, restart the session")]
    SpatializerLost,

    #[error("Unknown object model: {0}")]
    UnknownObject(String),
}

pub type Result<T> = std::result::Result<T, Error>;
