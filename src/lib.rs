//! # Shoebox - Virtual Acoustic Room Engine
//!
//! Fits a rectangular room to a tracked floor and keeps a spatializer in step
//! with it.
//!
//! ## Architecture
//!
//! Shoebox is an umbrella crate that coordinates:
//! - **shoebox-core** - Room fitting, surfaces, materials, catalog, floor tracking
//! - **shoebox-graph** - Sound sources on contiguous spatializer input lanes
//!
//! On top of those, [`EnvironmentController`] runs the environment modes
//! (measuring, painting, playing) and [`ShoeboxEngine`] makes it callable from
//! tracking, UI and picker threads.
//!
//! ## Quick Start
//!
//! ```ignore
//! use shoebox::prelude::*;
//!
//! let engine = ShoeboxEngine::builder()
//!     .catalog(Catalog::from_paths("materials.json", "objects.json")?)
//!     .headless()
//!     .build()?;
//!
//! // Tracking found the floor: a default room is fitted and hidden
//! engine.on_anchor_added(AnchorId(1), floor_extent)?;
//!
//! // Measure the height by looking at the ceiling line
//! engine.begin_measuring()?;
//! engine.submit_listener_pose(camera_pose);
//! engine.pump();
//! engine.confirm()?;
//!
//! // Place a source and play
//! engine.set_visible(false)?;
//! let id = engine.place_source(SourceSpec::new("radio", producer))?;
//! engine.start_playing()?;
//! ```

/// Re-export of shoebox-core for direct access
pub use shoebox_core as core;

/// Re-export of shoebox-graph for direct access
pub use shoebox_graph as graph;

pub use shoebox_core::{
    Alignment, AnchorId, Catalog, DefaultMaterials, FitConfig, MaterialId, PlaneExtent, Pose,
    RetainedScene, RoomFit, RoomGeometry, SceneSink, ShoeboxRoom, SourceId, Spatializer,
    SurfaceBuilder, SurfaceName,
};
pub use shoebox_graph::{
    AudioProducer, InputBus, NodeId, RecordingBus, RecordingSpatializer, Recorder, RouteChange,
    SourceSpec,
};

pub mod error;
pub use error::{Error, Result};

pub mod config;
pub use config::{EnvironmentConfig, RoomDimensions};

pub mod fsm;
pub use fsm::{
    EnvironmentEvent, EnvironmentFsm, EnvironmentMode, Rejection, RoomState, TransitionResult,
};

pub mod controller;
pub use controller::{EnvironmentController, PreparedFit, RoomUpdate};

mod builder;
pub use builder::ShoeboxEngineBuilder;

mod engine;
pub use engine::{BusFactory, PaintRequest, PumpStats, ShoeboxEngine, SpatializerFactory};

/// Convenient re-exports.
pub mod prelude {
    pub use crate::{
        Alignment, AnchorId, AudioProducer, Catalog, EnvironmentConfig, EnvironmentMode, Error,
        MaterialId, PlaneExtent, Pose, Result, RoomState, ShoeboxEngine, ShoeboxRoom, SourceId,
        SourceSpec, Spatializer, SurfaceName,
    };
    pub use glam::{Quat, Vec3};
}
