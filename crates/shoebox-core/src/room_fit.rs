//! Shoebox fitting from a tracked floor plane and a measured height.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::geometry::{closest_point_on_line, normalize_angle, PlaneExtent, Pose};

/// Smallest width/length a fitted room may have (meters).
pub const DEFAULT_MIN_EXTENT: f32 = 1e-3;

/// Smallest height a measured room may have (meters).
pub const DEFAULT_MIN_HEIGHT: f32 = 0.01;

/// Clamping policy for degenerate input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitConfig {
    /// Floor for width and length when the floor extent collapses.
    pub min_extent: f32,
    /// Floor for the room height.
    pub min_height: f32,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            min_extent: DEFAULT_MIN_EXTENT,
            min_height: DEFAULT_MIN_HEIGHT,
        }
    }
}

/// The four floor corners and the height corner of a room, in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoomCorners {
    pub origin: Vec3,
    pub width: Vec3,
    pub length: Vec3,
    pub opposite: Vec3,
    pub height: Vec3,
}

/// A fitted rectangular room.
///
/// The local +X axis (width) is rotated `yaw_radians` about world +Y away
/// from world +X; the length axis is perpendicular to it on the floor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShoeboxRoom {
    pub origin: Vec3,
    pub width: f32,
    pub length: f32,
    pub height: f32,
    pub yaw_radians: f32,
}

impl ShoeboxRoom {
    /// Build a room, clamping dimensions to be positive and wrapping the yaw.
    pub fn new(origin: Vec3, width: f32, length: f32, height: f32, yaw_radians: f32) -> Self {
        let positive = |v: f32, floor: f32| if v.is_finite() { v.max(floor) } else { floor };
        Self {
            origin,
            width: positive(width, DEFAULT_MIN_EXTENT),
            length: positive(length, DEFAULT_MIN_EXTENT),
            height: positive(height, DEFAULT_MIN_HEIGHT),
            yaw_radians: normalize_angle(yaw_radians),
        }
    }

    /// Unit vector along the width edge.
    pub fn width_axis(&self) -> Vec3 {
        let (sin, cos) = self.yaw_radians.sin_cos();
        Vec3::new(cos, 0.0, sin)
    }

    /// Unit vector along the length edge.
    pub fn length_axis(&self) -> Vec3 {
        let (sin, cos) = self.yaw_radians.sin_cos();
        Vec3::new(sin, 0.0, -cos)
    }

    pub fn dimensions(&self) -> (f32, f32, f32) {
        (self.width, self.length, self.height)
    }

    pub fn corners(&self) -> RoomCorners {
        let along_width = self.width_axis() * self.width;
        let along_length = self.length_axis() * self.length;
        RoomCorners {
            origin: self.origin,
            width: self.origin + along_width,
            length: self.origin + along_length,
            opposite: self.origin + along_width + along_length,
            height: self.origin + Vec3::Y * self.height,
        }
    }

    /// Center of the room volume.
    pub fn center(&self) -> Vec3 {
        self.origin
            + self.width_axis() * (self.width * 0.5)
            + self.length_axis() * (self.length * 0.5)
            + Vec3::Y * (self.height * 0.5)
    }

    /// World point expressed as (across width, up, along length) from the origin.
    pub fn to_room_local(&self, world: Vec3) -> Vec3 {
        let d = world - self.origin;
        Vec3::new(d.dot(self.width_axis()), d.y, d.dot(self.length_axis()))
    }

    /// Largest absolute difference across origin, dimensions and yaw.
    pub fn max_delta(&self, other: &ShoeboxRoom) -> f32 {
        let yaw = normalize_angle(self.yaw_radians - other.yaw_radians).abs();
        (self.origin - other.origin)
            .abs()
            .max_element()
            .max((self.width - other.width).abs())
            .max((self.length - other.length).abs())
            .max((self.height - other.height).abs())
            .max(yaw)
    }
}

/// Pure shoebox fitter.
#[derive(Debug, Clone, Copy, Default)]
pub struct RoomFit {
    config: FitConfig,
}

impl RoomFit {
    pub fn new(config: FitConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FitConfig {
        &self.config
    }

    /// Fit a room to the floor extent. Same input always yields the same room.
    pub fn fit(&self, extent: &PlaneExtent, measured_height: f32) -> ShoeboxRoom {
        let (min, max) = (extent.min, extent.max);
        let corner_origin = extent.to_world(min.x, min.y, max.z);
        let corner_width = extent.to_world(max.x, min.y, max.z);
        let corner_length = extent.to_world(min.x, min.y, min.z);

        let width = corner_origin.distance(corner_width);
        let length = corner_origin.distance(corner_length);

        let width_dir = match (corner_width - corner_origin).try_normalize() {
            Some(dir) if width > f32::EPSILON => dir,
            _ => extent.pose.orientation * Vec3::X,
        };
        let yaw = width_dir.z.atan2(width_dir.x);

        let clamp = |v: f32, floor: f32| if v.is_finite() { v.max(floor) } else { floor };
        ShoeboxRoom {
            origin: corner_origin,
            width: clamp(width, self.config.min_extent),
            length: clamp(length, self.config.min_extent),
            height: clamp(measured_height, self.config.min_height),
            yaw_radians: normalize_angle(yaw),
        }
    }

    /// Candidate room height from where the listener is looking.
    pub fn measure_height(&self, origin: Vec3, listener: &Pose) -> f32 {
        measure_height(origin, listener, self.config.min_height)
    }
}

/// Project the listener's gaze onto the vertical line through `origin`.
///
/// The probe point sits along the listener's forward axis at the listener's
/// distance from the origin; its height above the origin is the candidate
/// wall height, clamped to `min_height`.
pub fn measure_height(origin: Vec3, listener: &Pose, min_height: f32) -> f32 {
    let distance = origin.distance(listener.position);
    let probe = listener.position + listener.forward() * distance;
    let top = closest_point_on_line(probe, origin, Vec3::NEG_Y);
    let height = top.y - origin.y;
    if height.is_finite() {
        height.max(min_height)
    } else {
        min_height
    }
}
