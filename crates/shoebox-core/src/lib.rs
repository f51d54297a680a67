//! Shoebox room geometry kernel.
//!
//! # Primary API
//!
//! - [`RoomFit`]: fits a [`ShoeboxRoom`] to a tracked floor extent
//! - [`measure_height`]: candidate wall height from the listener's gaze
//! - [`SurfaceBuilder`]: walls, floor, ceiling and corner markers of a room
//! - [`MaterialAssignment`]: per-surface acoustic materials
//! - [`FloorTracker`]: picks the floor among tracked plane anchors
//! - [`Catalog`]: static materials / objects lists
//!
//! # Collaborators
//!
//! - [`Spatializer`]: parameter surface of the spatial audio processor
//! - [`SceneSink`]: named surface and marker nodes for the renderer
//!
//! # Example
//!
//! ```ignore
//! use shoebox_core::prelude::*;
//!
//! let floor = PlaneExtent::centered(4.0, 5.0, Pose::IDENTITY);
//! let room = RoomFit::default().fit(&floor, 2.5);
//! let geometry = SurfaceBuilder::build(&room);
//! assert_eq!(geometry.surfaces().count(), 6);
//! ```

pub mod error;
pub use error::{Error, Result};

pub mod geometry;
pub use geometry::{closest_point_on_line, normalize_angle, Alignment, PlaneExtent, Pose};

pub mod room_fit;
pub use room_fit::{
    measure_height, FitConfig, RoomCorners, RoomFit, ShoeboxRoom, DEFAULT_MIN_EXTENT,
    DEFAULT_MIN_HEIGHT,
};

pub mod surfaces;
pub use surfaces::{
    Marker, MarkerColor, MarkerName, RoomGeometry, Surface, SurfaceBuilder, SurfaceName,
    MARKER_RADIUS,
};

pub mod scene;
pub use scene::{RetainedScene, SceneSink, SurfaceFill, SURFACE_GRAY};

pub mod spatializer;
pub use spatializer::{EnvironmentSurface, ListenerState, SourceId, Spatializer};

pub mod catalog;
pub use catalog::{Catalog, MaterialEntry, ObjectConfig, MATERIAL_OFF};

pub mod materials;
pub use materials::{DefaultMaterials, MaterialAssignment, MaterialId};

pub mod floor;
pub use floor::{AnchorId, FloorChange, FloorTracker};

pub mod lockfree;
pub use lockfree::{AtomicFlag, AtomicFloat, LatestSlot};

/// Convenient re-exports.
pub mod prelude {
    pub use crate::{
        Alignment, AnchorId, Catalog, MaterialAssignment, MaterialId, PlaneExtent, Pose, RoomFit,
        SceneSink, ShoeboxRoom, SourceId, Spatializer, SurfaceBuilder, SurfaceName,
    };
    pub use glam::{Quat, Vec3};
}
