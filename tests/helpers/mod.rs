//! Test helpers and fixtures for Shoebox integration tests
//!
//! Every harness runs headless: a [`RecordingSpatializer`], a [`RecordingBus`]
//! and a shared [`RetainedScene`] stand in for the audio processor, the host
//! graph and the renderer, and stay readable after the engine takes them.
//!
//! ## Tolerance Levels
//!
//! Use the appropriate tolerance from [`tolerances`] module:
//! - `FLOAT_EPSILON` (1e-6): Exact operations
//! - `GEOMETRY_EPSILON` (1e-4): Trigonometry and rotations
//! - `MEASURE_EPSILON` (0.001): Gaze-ray height measurement

#![allow(dead_code)]

pub mod tolerances;

use std::sync::Arc;

use parking_lot::Mutex;
use shoebox::graph::{SpatializerCall, TestProducer};
use shoebox::prelude::*;
use shoebox::{InputBus, NodeId, RecordingBus, RecordingSpatializer, RetainedScene};

pub const MATERIALS_JSON: &str = r#"[
    { "materialName": "heavy_velour", "displayName": "Heavy Velour", "fileName": "heavy_velour.jpg" },
    { "materialName": "carpet_heavy", "displayName": "Heavy Carpet", "fileName": "carpet_heavy.jpg" },
    { "materialName": "brick_bare", "displayName": "Bare Brick", "fileName": "brick_bare.jpg" },
    { "materialName": "plywood_panel", "displayName": "Plywood", "fileName": "plywood_panel.jpg" }
]"#;

pub const OBJECTS_JSON: &str = r#"[
    {
        "modelName": "radio",
        "displayName": "Radio",
        "audioFile": ["radio_news.wav", "radio_music.wav"],
        "allowedAlignments": ["horizontal"]
    },
    {
        "modelName": "speaker",
        "displayName": "Wall Speaker",
        "audioFile": ["speaker.wav"],
        "allowedAlignments": ["vertical", "horizontal"]
    }
]"#;

/// Room height the default harness starts with (meters).
pub const TEST_HEIGHT: f32 = 2.5;

pub fn test_catalog() -> Catalog {
    Catalog::from_json_strs(MATERIALS_JSON, OBJECTS_JSON).expect("Failed to parse test catalog")
}

pub fn test_config() -> EnvironmentConfig {
    EnvironmentConfig {
        initial_height: TEST_HEIGHT,
        ..Default::default()
    }
}

/// Headless engine plus handles on everything it talks to.
pub struct Harness {
    pub engine: ShoeboxEngine,
    pub spatializer: RecordingSpatializer,
    pub bus: RecordingBus,
    pub scene: Arc<Mutex<RetainedScene>>,
}

impl Harness {
    pub fn calls(&self) -> Vec<SpatializerCall> {
        self.spatializer.calls()
    }

    pub fn count(&self, pred: impl Fn(&SpatializerCall) -> bool) -> usize {
        self.spatializer.count(pred)
    }

    pub fn room(&self) -> ShoeboxRoom {
        self.engine.room().expect("No room fitted")
    }
}

pub fn harness() -> Harness {
    harness_with(test_config())
}

/// Route engine logs to the test writer. Safe to call from every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

pub fn harness_with(config: EnvironmentConfig) -> Harness {
    init_tracing();
    let spatializer = RecordingSpatializer::new();
    let bus = RecordingBus::new();
    let scene = RetainedScene::shared();

    let (s, b) = (spatializer.clone(), bus.clone());
    let engine = ShoeboxEngine::builder()
        .config(config)
        .catalog(test_catalog())
        .spatializer_factory(move || Ok(Box::new(s.clone()) as Box<dyn Spatializer>))
        .bus_factory(move || Box::new(b.clone()) as Box<dyn InputBus>)
        .scene(scene.clone())
        .build()
        .expect("Failed to create test engine");

    Harness {
        engine,
        spatializer,
        bus,
        scene,
    }
}

/// Horizontal floor of `width` x `length` meters centered at the world origin.
pub fn floor(width: f32, length: f32) -> PlaneExtent {
    PlaneExtent::centered(width, length, Pose::IDENTITY)
}

/// Same floor raised to `y`.
pub fn floor_at(width: f32, length: f32, y: f32) -> PlaneExtent {
    PlaneExtent::centered(width, length, Pose::from_position(Vec3::new(0.0, y, 0.0)))
}

/// Harness with a 4 x 5 m floor already tracked (room hidden, unlocked).
pub fn harness_with_room() -> Harness {
    let h = harness();
    h.engine
        .on_anchor_added(AnchorId(1), floor(4.0, 5.0))
        .expect("Failed to add floor");
    h
}

/// Listener at `from` looking at `at`.
pub fn gaze(from: Vec3, at: Vec3) -> Pose {
    let direction = (at - from).normalize();
    Pose::new(from, Quat::from_rotation_arc(Vec3::NEG_Z, direction))
}

pub fn producer(node: u64) -> TestProducer {
    TestProducer::new(NodeId(node), 2)
}

pub fn spec(node: u64) -> SourceSpec {
    SourceSpec::new(format!("source-{node}"), Box::new(producer(node)))
        .at(Vec3::new(node as f32, 0.0, -1.0))
}
