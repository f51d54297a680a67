//! Integration test modules for Shoebox
//!
//! - engine: construction, catalog loading, threading surface, restart
//! - environment: room fitting, lock gating, height measurement, materials
//! - sources: placement, lane renumbering, synchronized playback

pub mod engine;
pub mod sources;
