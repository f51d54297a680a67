//! Sound sources and their audio producers.

use std::collections::VecDeque;

use glam::Vec3;
use shoebox_core::{normalize_angle, SourceId};

use crate::bus::{Lane, NodeId};

/// Farthest a source may be placed from the camera (meters).
pub const MAX_CAMERA_DISTANCE: f32 = 10.0;

/// Number of recent camera distances averaged while dragging a source.
pub const SMOOTHING_WINDOW: usize = 10;

/// Radius beyond which distance attenuation starts, when none is given.
pub const DEFAULT_MIN_DISTANCE_GAIN: f32 = 0.1;

/// Plays decoded audio into the host graph.
///
/// Scheduling and decoding live behind this trait; the graph only wires the
/// node and tells it when to start and stop.
pub trait AudioProducer: Send {
    /// Host graph node carrying this producer's output.
    fn node(&self) -> NodeId;

    /// Schedule clip `clip` to start at host time `start_at` (seconds).
    fn play(&mut self, clip: usize, start_at: f64);

    fn stop(&mut self);

    /// Number of clips this producer can play.
    fn clip_count(&self) -> usize;
}

/// Everything needed to load a source.
pub struct SourceSpec {
    pub name: String,
    pub position: Vec3,
    pub min_distance_gain: f32,
    pub producer: Box<dyn AudioProducer>,
}

impl SourceSpec {
    pub fn new(name: impl Into<String>, producer: Box<dyn AudioProducer>) -> Self {
        Self {
            name: name.into(),
            position: Vec3::ZERO,
            min_distance_gain: DEFAULT_MIN_DISTANCE_GAIN,
            producer,
        }
    }

    pub fn at(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    pub fn min_distance_gain(mut self, gain: f32) -> Self {
        self.min_distance_gain = gain;
        self
    }
}

/// Camera-relative placement with distance smoothing.
///
/// Only the perceived distance is averaged, not the direction, so a dragged
/// source follows the finger without lag but does not jitter in depth.
#[derive(Debug, Clone, Default)]
pub struct Placement {
    recent_distances: VecDeque<f32>,
    rotation: f32,
}

impl Placement {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a requested world position against the camera position.
    pub fn place(&mut self, target: Vec3, camera: Vec3, smooth: bool) -> Vec3 {
        let mut offset = target - camera;
        if offset.length() > MAX_CAMERA_DISTANCE {
            offset = offset.normalize_or_zero() * MAX_CAMERA_DISTANCE;
        }

        if !smooth {
            return camera + offset;
        }

        self.recent_distances.push_back(offset.length());
        while self.recent_distances.len() > SMOOTHING_WINDOW {
            self.recent_distances.pop_front();
        }
        let average =
            self.recent_distances.iter().sum::<f32>() / self.recent_distances.len() as f32;
        camera + offset.normalize_or_zero() * average
    }

    /// Forget the smoothing history.
    pub fn reset(&mut self) {
        self.recent_distances.clear();
    }

    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    /// Set the rotation about the local up axis, wrapped into (-pi, pi].
    pub fn set_rotation(&mut self, radians: f32) {
        self.rotation = normalize_angle(radians);
    }

    pub fn history_len(&self) -> usize {
        self.recent_distances.len()
    }
}

/// A placed emitter, owned by the source graph.
pub struct SoundSource {
    pub(crate) id: SourceId,
    pub(crate) lane: Lane,
    pub(crate) name: String,
    pub(crate) position: Vec3,
    pub(crate) min_distance_gain: f32,
    pub(crate) producer: Box<dyn AudioProducer>,
    pub(crate) placement: Placement,
}

impl SoundSource {
    pub fn id(&self) -> SourceId {
        self.id
    }

    pub fn lane(&self) -> Lane {
        self.lane
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn min_distance_gain(&self) -> f32 {
        self.min_distance_gain
    }

    pub fn node(&self) -> NodeId {
        self.producer.node()
    }

    pub fn rotation(&self) -> f32 {
        self.placement.rotation()
    }
}

impl core::fmt::Debug for SoundSource {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SoundSource")
            .field("id", &self.id)
            .field("lane", &self.lane)
            .field("name", &self.name)
            .field("position", &self.position)
            .field("node", &self.producer.node())
            .finish()
    }
}
