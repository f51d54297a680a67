//! Wall, floor, ceiling and corner-marker construction for a fitted room.

use core::fmt;
use core::str::FromStr;

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use std::f32::consts::{FRAC_PI_2, PI};

use crate::error::Error;
use crate::geometry::normalize_angle;
use crate::room_fit::ShoeboxRoom;

/// Radius of the debug corner spheres (meters).
pub const MARKER_RADIUS: f32 = 0.005;

/// Stable identifier of a room surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SurfaceName {
    Left,
    Front,
    Right,
    Back,
    Ceiling,
    Floor,
}

impl SurfaceName {
    pub const ALL: [SurfaceName; 6] = [
        SurfaceName::Left,
        SurfaceName::Front,
        SurfaceName::Right,
        SurfaceName::Back,
        SurfaceName::Ceiling,
        SurfaceName::Floor,
    ];

    pub const WALLS: [SurfaceName; 4] = [
        SurfaceName::Left,
        SurfaceName::Front,
        SurfaceName::Right,
        SurfaceName::Back,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SurfaceName::Left => "LEFT",
            SurfaceName::Front => "FRONT",
            SurfaceName::Right => "RIGHT",
            SurfaceName::Back => "BACK",
            SurfaceName::Ceiling => "CEILING",
            SurfaceName::Floor => "FLOOR",
        }
    }

    pub fn is_wall(self) -> bool {
        !matches!(self, SurfaceName::Ceiling | SurfaceName::Floor)
    }

    /// Position in [`SurfaceName::ALL`].
    pub const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for SurfaceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SurfaceName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SurfaceName::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| Error::UnknownSurface(s.to_string()))
    }
}

/// Identifier of a corner marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerName {
    CornerOrigin,
    CornerWidth,
    CornerLength,
    CornerOpposite,
    CornerHeight,
}

impl MarkerName {
    pub const ALL: [MarkerName; 5] = [
        MarkerName::CornerOrigin,
        MarkerName::CornerWidth,
        MarkerName::CornerLength,
        MarkerName::CornerOpposite,
        MarkerName::CornerHeight,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MarkerName::CornerOrigin => "cornerOrigin",
            MarkerName::CornerWidth => "cornerWidth",
            MarkerName::CornerLength => "cornerLength",
            MarkerName::CornerOpposite => "cornerOpposite",
            MarkerName::CornerHeight => "cornerHeight",
        }
    }

    /// Position in [`MarkerName::ALL`].
    pub const fn index(self) -> usize {
        self as usize
    }

    pub fn color(self) -> MarkerColor {
        match self {
            MarkerName::CornerOrigin => MarkerColor::White,
            MarkerName::CornerWidth => MarkerColor::Red,
            MarkerName::CornerLength => MarkerColor::Blue,
            MarkerName::CornerOpposite => MarkerColor::Black,
            MarkerName::CornerHeight => MarkerColor::Green,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerColor {
    White,
    Red,
    Blue,
    Black,
    Green,
}

/// A rectangular quad.
///
/// The quad lies in its local XY plane (`width` along X, `height` along Y)
/// and `orientation` rotates it into the world; `normal` is local +Z after
/// rotation and always points into the room.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Surface {
    pub name: SurfaceName,
    pub center: Vec3,
    pub width: f32,
    pub height: f32,
    pub orientation: Quat,
    pub normal: Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Marker {
    pub name: MarkerName,
    pub position: Vec3,
    pub color: MarkerColor,
    pub radius: f32,
}

/// Everything renderable about one room.
///
/// Surfaces and markers are stored in [`SurfaceName::ALL`] and
/// [`MarkerName::ALL`] order, so lookups index directly.
#[derive(Debug, Clone, PartialEq)]
pub struct RoomGeometry {
    surfaces: [Surface; 6],
    markers: [Marker; 5],
}

impl RoomGeometry {
    /// All six surfaces: walls first, then ceiling and floor.
    pub fn surfaces(&self) -> impl Iterator<Item = &Surface> {
        self.surfaces.iter()
    }

    pub fn walls(&self) -> &[Surface] {
        &self.surfaces[..SurfaceName::WALLS.len()]
    }

    pub fn surface(&self, name: SurfaceName) -> &Surface {
        &self.surfaces[name.index()]
    }

    pub fn markers(&self) -> impl Iterator<Item = &Marker> {
        self.markers.iter()
    }

    pub fn marker(&self, name: MarkerName) -> &Marker {
        &self.markers[name.index()]
    }
}

/// Builds surfaces and markers from a room.
pub struct SurfaceBuilder;

impl SurfaceBuilder {
    pub fn build(room: &ShoeboxRoom) -> RoomGeometry {
        let c = room.corners();
        let inside = room.center();

        let start = (c.length + c.origin) * 0.5;
        let end = (c.width + c.opposite) * 0.5;
        let surfaces = [
            Self::wall(SurfaceName::Left, c.origin, c.length, room.height, inside),
            Self::wall(SurfaceName::Front, c.opposite, c.length, room.height, inside),
            Self::wall(SurfaceName::Right, c.width, c.opposite, room.height, inside),
            Self::wall(SurfaceName::Back, c.origin, c.width, room.height, inside),
            Self::horizontal(SurfaceName::Ceiling, start, end, room.length, room.height),
            Self::horizontal(SurfaceName::Floor, start, end, room.length, 0.0),
        ];

        let marker = |name: MarkerName, position: Vec3| Marker {
            name,
            position,
            color: name.color(),
            radius: MARKER_RADIUS,
        };
        let markers = [
            marker(MarkerName::CornerOrigin, c.origin),
            marker(MarkerName::CornerWidth, c.width),
            marker(MarkerName::CornerLength, c.length),
            marker(MarkerName::CornerOpposite, c.opposite),
            marker(MarkerName::CornerHeight, c.height),
        ];

        RoomGeometry { surfaces, markers }
    }

    /// Vertical quad spanning `start`..`end` on the floor, `height` tall.
    fn wall(name: SurfaceName, start: Vec3, end: Vec3, height: f32, inside: Vec3) -> Surface {
        let edge = end - start;
        let center = Vec3::new(
            start.x + edge.x * 0.5,
            start.y + height * 0.5,
            start.z + edge.z * 0.5,
        );

        let mut yaw = normalize_angle(edge.x.atan2(edge.z) - FRAC_PI_2);
        let (sin, cos) = yaw.sin_cos();
        let mut normal = Vec3::new(sin, 0.0, cos);
        let to_inside = Vec3::new(inside.x - center.x, 0.0, inside.z - center.z);
        if normal.dot(to_inside) < 0.0 {
            yaw = normalize_angle(yaw + PI);
            normal = -normal;
        }

        Surface {
            name,
            center,
            width: edge.length(),
            height,
            orientation: Quat::from_rotation_y(yaw),
            normal,
        }
    }

    /// Horizontal quad spanning `start`..`end`, `length` deep, `lift` above `start`.
    fn horizontal(name: SurfaceName, start: Vec3, end: Vec3, length: f32, lift: f32) -> Surface {
        let edge = end - start;
        let center = Vec3::new(
            start.x + edge.x * 0.5,
            start.y + lift,
            start.z + edge.z * 0.5,
        );
        let yaw = (-edge.z).atan2(edge.x);
        let (pitch, normal) = if name == SurfaceName::Ceiling {
            (FRAC_PI_2, Vec3::NEG_Y)
        } else {
            (-FRAC_PI_2, Vec3::Y)
        };

        Surface {
            name,
            center,
            width: edge.length(),
            height: length,
            orientation: Quat::from_rotation_y(yaw) * Quat::from_rotation_x(pitch),
            normal,
        }
    }
}
