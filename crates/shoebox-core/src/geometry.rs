//! World-frame geometry primitives produced by the tracking collaborator.
//!
//! The tracking frame is right-handed with +Y up. Local plane axes follow the
//! same convention: +X runs along the width edge, +Z along the length edge.

use glam::{EulerRot, Quat, Vec3};
use serde::{Deserialize, Serialize};
use std::f32::consts::{PI, TAU};

/// Rigid transform in the world frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Vec3,
    pub orientation: Quat,
}

impl Pose {
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        orientation: Quat::IDENTITY,
    };

    pub fn new(position: Vec3, orientation: Quat) -> Self {
        Self {
            position,
            orientation,
        }
    }

    pub fn from_position(position: Vec3) -> Self {
        Self::new(position, Quat::IDENTITY)
    }

    /// Pose rotated about the vertical axis only.
    pub fn from_yaw(position: Vec3, yaw: f32) -> Self {
        Self::new(position, Quat::from_rotation_y(yaw))
    }

    /// Map a point from this pose's local frame into the world frame.
    #[inline]
    pub fn transform_point(&self, local: Vec3) -> Vec3 {
        self.orientation * local + self.position
    }

    /// Viewing direction, -Z in the local frame.
    #[inline]
    pub fn forward(&self) -> Vec3 {
        self.orientation * Vec3::NEG_Z
    }

    /// (yaw, pitch, roll) in radians, about Y, X and Z respectively.
    pub fn euler_ypr(&self) -> (f32, f32, f32) {
        self.orientation.to_euler(EulerRot::YXZ)
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Alignment of a detected plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    Horizontal,
    Vertical,
}

/// Bounding rectangle of a detected plane in the plane's local frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaneExtent {
    pub min: Vec3,
    pub max: Vec3,
    pub pose: Pose,
    pub alignment: Alignment,
}

impl PlaneExtent {
    pub fn new(min: Vec3, max: Vec3, pose: Pose) -> Self {
        Self {
            min,
            max,
            pose,
            alignment: Alignment::Horizontal,
        }
    }

    /// Horizontal extent of `width` x `length` meters centered on the pose.
    pub fn centered(width: f32, length: f32, pose: Pose) -> Self {
        let half = Vec3::new(width * 0.5, 0.0, length * 0.5);
        Self::new(-half, half, pose)
    }

    pub fn with_alignment(mut self, alignment: Alignment) -> Self {
        self.alignment = alignment;
        self
    }

    /// World-space height of the plane.
    pub fn world_y(&self) -> f32 {
        self.pose.position.y
    }

    /// Local point mapped to world space.
    #[inline]
    pub fn to_world(&self, x: f32, y: f32, z: f32) -> Vec3 {
        self.pose.transform_point(Vec3::new(x, y, z))
    }
}

/// Wrap an angle into (-pi, pi].
pub fn normalize_angle(angle: f32) -> f32 {
    if !angle.is_finite() {
        return 0.0;
    }
    let mut wrapped = angle % TAU;
    if wrapped <= -PI {
        wrapped += TAU;
    } else if wrapped > PI {
        wrapped -= TAU;
    }
    wrapped
}

/// Closest point to `point` on the line through `through` along `direction`.
///
/// A zero direction degenerates to `through`.
pub fn closest_point_on_line(point: Vec3, through: Vec3, direction: Vec3) -> Vec3 {
    let dir = direction.normalize_or_zero();
    through + dir * (point - through).dot(dir)
}
