//! Tolerance constants for geometry assertions.

/// Exact operations (copies, axis-aligned corners).
pub const FLOAT_EPSILON: f32 = 1e-6;

/// Results that went through trigonometry or a quaternion.
pub const GEOMETRY_EPSILON: f32 = 1e-4;

/// Heights measured from a gaze ray.
pub const MEASURE_EPSILON: f32 = 1e-3;
