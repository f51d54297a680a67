//! Control-parameter surface of the external spatializer.

use core::fmt;

use glam::{Quat, Vec3};

use crate::geometry::Pose;
use crate::surfaces::SurfaceName;

/// Process-unique sound source identifier. Assigned from 1 upward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceId(pub u32);

impl SourceId {
    #[inline]
    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Reflection path addressed by the per-surface material parameter.
///
/// The discriminants are part of the spatializer's parameter contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum EnvironmentSurface {
    Direct = 0,
    Left = 1,
    Front = 2,
    Right = 3,
    Back = 4,
    Ceiling = 5,
    Floor = 6,
}

impl EnvironmentSurface {
    #[inline]
    pub fn ordinal(self) -> i32 {
        self as i32
    }
}

impl From<SurfaceName> for EnvironmentSurface {
    fn from(name: SurfaceName) -> Self {
        match name {
            SurfaceName::Left => EnvironmentSurface::Left,
            SurfaceName::Front => EnvironmentSurface::Front,
            SurfaceName::Right => EnvironmentSurface::Right,
            SurfaceName::Back => EnvironmentSurface::Back,
            SurfaceName::Ceiling => EnvironmentSurface::Ceiling,
            SurfaceName::Floor => EnvironmentSurface::Floor,
        }
    }
}

/// Spatializer parameter surface.
///
/// Calls are fire-and-forget: the processor applies them on its own queue.
/// Positions and orientations are in the tracking world frame; the
/// processor places the room itself from the shoebox origin and yaw.
pub trait Spatializer: Send {
    fn add_source(&mut self, id: SourceId, position: Vec3);

    fn remove_source(&mut self, id: SourceId);

    fn set_source_position(&mut self, id: SourceId, position: Vec3);

    fn set_source_min_distance_gain(&mut self, id: SourceId, gain: f32);

    fn set_listener_position(&mut self, position: Vec3);

    fn set_listener_orientation_euler(&mut self, yaw: f32, pitch: f32, roll: f32);

    fn set_environment_freefield(&mut self);

    fn set_environment_shoebox(&mut self, width: f32, length: f32, height: f32);

    fn set_environment_shoebox_origin(&mut self, origin: Vec3);

    fn set_environment_shoebox_orientation_euler(&mut self, yaw: f32, pitch: f32, roll: f32);

    fn set_environment_shoebox_dimensions(&mut self, width: f32, length: f32, height: f32);

    fn set_environment_shoebox_reflection_material(&mut self, surface: i32, material: &str);

    /// `false` once the processor has crashed or been torn down.
    fn is_valid(&self) -> bool {
        true
    }
}

/// Listener position and orientation, updated every tracking frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ListenerState {
    pub position: Vec3,
    pub orientation: Quat,
}

impl ListenerState {
    /// Push position, then (yaw, pitch, roll).
    pub fn push_to(&self, spatializer: &mut dyn Spatializer) {
        let (yaw, pitch, roll) = self.pose().euler_ypr();
        spatializer.set_listener_position(self.position);
        spatializer.set_listener_orientation_euler(yaw, pitch, roll);
    }

    pub fn pose(&self) -> Pose {
        Pose::new(self.position, self.orientation)
    }
}

impl Default for ListenerState {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            orientation: Quat::IDENTITY,
        }
    }
}

impl From<Pose> for ListenerState {
    fn from(pose: Pose) -> Self {
        Self {
            position: pose.position,
            orientation: pose.orientation,
        }
    }
}
