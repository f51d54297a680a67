//! Headless backends that record every call they receive.
//!
//! They stand in for the spatializer, the host audio graph and the players
//! when no audio hardware is present, and let callers inspect exactly what
//! was sent. All of them are cheap to clone; clones share the same log.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use glam::Vec3;
use parking_lot::Mutex;
use shoebox_core::{AtomicFlag, SourceId, Spatializer};

use crate::bus::{BusInput, InputBus, Lane, NodeId};
use crate::error::{Error, Result};
use crate::graph::Recorder;
use crate::source::AudioProducer;

/// One spatializer parameter call.
#[derive(Debug, Clone, PartialEq)]
pub enum SpatializerCall {
    AddSource(SourceId, Vec3),
    RemoveSource(SourceId),
    SetSourcePosition(SourceId, Vec3),
    SetSourceMinDistanceGain(SourceId, f32),
    SetListenerPosition(Vec3),
    SetListenerOrientation { yaw: f32, pitch: f32, roll: f32 },
    SetEnvironmentFreefield,
    SetEnvironmentShoebox { width: f32, length: f32, height: f32 },
    SetShoeboxOrigin(Vec3),
    SetShoeboxOrientation { yaw: f32, pitch: f32, roll: f32 },
    SetShoeboxDimensions { width: f32, length: f32, height: f32 },
    SetReflectionMaterial { surface: i32, material: String },
}

#[derive(Clone)]
pub struct RecordingSpatializer {
    calls: Arc<Mutex<Vec<SpatializerCall>>>,
    valid: Arc<AtomicFlag>,
}

impl RecordingSpatializer {
    pub fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            valid: Arc::new(AtomicFlag::new(true)),
        }
    }

    pub fn calls(&self) -> Vec<SpatializerCall> {
        self.calls.lock().clone()
    }

    /// Calls matching `pred`.
    pub fn count(&self, pred: impl Fn(&SpatializerCall) -> bool) -> usize {
        self.calls.lock().iter().filter(|call| pred(call)).count()
    }

    pub fn clear(&self) {
        self.calls.lock().clear();
    }

    pub fn last(&self) -> Option<SpatializerCall> {
        self.calls.lock().last().cloned()
    }

    /// Simulate the processor crashing.
    pub fn invalidate(&self) {
        self.valid.set(false);
    }

    fn push(&self, call: SpatializerCall) {
        self.calls.lock().push(call);
    }
}

impl Default for RecordingSpatializer {
    fn default() -> Self {
        Self::new()
    }
}

impl Spatializer for RecordingSpatializer {
    fn add_source(&mut self, id: SourceId, position: Vec3) {
        self.push(SpatializerCall::AddSource(id, position));
    }

    fn remove_source(&mut self, id: SourceId) {
        self.push(SpatializerCall::RemoveSource(id));
    }

    fn set_source_position(&mut self, id: SourceId, position: Vec3) {
        self.push(SpatializerCall::SetSourcePosition(id, position));
    }

    fn set_source_min_distance_gain(&mut self, id: SourceId, gain: f32) {
        self.push(SpatializerCall::SetSourceMinDistanceGain(id, gain));
    }

    fn set_listener_position(&mut self, position: Vec3) {
        self.push(SpatializerCall::SetListenerPosition(position));
    }

    fn set_listener_orientation_euler(&mut self, yaw: f32, pitch: f32, roll: f32) {
        self.push(SpatializerCall::SetListenerOrientation { yaw, pitch, roll });
    }

    fn set_environment_freefield(&mut self) {
        self.push(SpatializerCall::SetEnvironmentFreefield);
    }

    fn set_environment_shoebox(&mut self, width: f32, length: f32, height: f32) {
        self.push(SpatializerCall::SetEnvironmentShoebox {
            width,
            length,
            height,
        });
    }

    fn set_environment_shoebox_origin(&mut self, origin: Vec3) {
        self.push(SpatializerCall::SetShoeboxOrigin(origin));
    }

    fn set_environment_shoebox_orientation_euler(&mut self, yaw: f32, pitch: f32, roll: f32) {
        self.push(SpatializerCall::SetShoeboxOrientation { yaw, pitch, roll });
    }

    fn set_environment_shoebox_dimensions(&mut self, width: f32, length: f32, height: f32) {
        self.push(SpatializerCall::SetShoeboxDimensions {
            width,
            length,
            height,
        });
    }

    fn set_environment_shoebox_reflection_material(&mut self, surface: i32, material: &str) {
        self.push(SpatializerCall::SetReflectionMaterial {
            surface,
            material: material.to_string(),
        });
    }

    fn is_valid(&self) -> bool {
        self.valid.get()
    }
}

/// One host graph wiring call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusCall {
    Attach(NodeId),
    Connect(NodeId, Lane),
    DisconnectAll,
    Detach(NodeId),
    ConnectPlaceholder,
    DisconnectPlaceholder,
}

#[derive(Debug, Default)]
struct BusState {
    calls: Vec<BusCall>,
    attached: BTreeSet<NodeId>,
    lanes: BTreeMap<Lane, BusInput>,
}

/// Input bus that tracks what is wired where.
#[derive(Clone, Default)]
pub struct RecordingBus {
    state: Arc<Mutex<BusState>>,
}

impl RecordingBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<BusCall> {
        self.state.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    /// Current lane occupancy.
    pub fn lanes(&self) -> BTreeMap<Lane, BusInput> {
        self.state.lock().lanes.clone()
    }

    pub fn input(&self, lane: Lane) -> Option<BusInput> {
        self.state.lock().lanes.get(&lane).copied()
    }

    pub fn is_attached(&self, node: NodeId) -> bool {
        self.state.lock().attached.contains(&node)
    }

    pub fn attached_count(&self) -> usize {
        self.state.lock().attached.len()
    }
}

impl InputBus for RecordingBus {
    fn attach(&mut self, node: NodeId) {
        let mut state = self.state.lock();
        state.attached.insert(node);
        state.calls.push(BusCall::Attach(node));
    }

    fn connect(&mut self, node: NodeId, lane: Lane) {
        let mut state = self.state.lock();
        state.lanes.insert(lane, BusInput::Node(node));
        state.calls.push(BusCall::Connect(node, lane));
    }

    fn disconnect_all(&mut self) {
        let mut state = self.state.lock();
        state.lanes.clear();
        state.calls.push(BusCall::DisconnectAll);
    }

    fn detach(&mut self, node: NodeId) {
        let mut state = self.state.lock();
        state.attached.remove(&node);
        state.lanes.retain(|_, input| *input != BusInput::Node(node));
        state.calls.push(BusCall::Detach(node));
    }

    fn connect_placeholder(&mut self) {
        let mut state = self.state.lock();
        state.lanes.insert(0, BusInput::Placeholder);
        state.calls.push(BusCall::ConnectPlaceholder);
    }

    fn disconnect_placeholder(&mut self) {
        let mut state = self.state.lock();
        state.lanes.retain(|_, input| *input != BusInput::Placeholder);
        state.calls.push(BusCall::DisconnectPlaceholder);
    }
}

/// Something a [`TestProducer`] was asked to do.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProducerEvent {
    Play { clip: usize, start_at: f64 },
    Stop,
}

/// Producer that logs play/stop requests instead of rendering.
#[derive(Clone)]
pub struct TestProducer {
    node: NodeId,
    clips: usize,
    events: Arc<Mutex<Vec<ProducerEvent>>>,
}

impl TestProducer {
    pub fn new(node: NodeId, clips: usize) -> Self {
        Self {
            node,
            clips,
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn events(&self) -> Vec<ProducerEvent> {
        self.events.lock().clone()
    }

    /// Whether the last request was a play.
    pub fn is_playing(&self) -> bool {
        matches!(self.events.lock().last(), Some(ProducerEvent::Play { .. }))
    }
}

impl AudioProducer for TestProducer {
    fn node(&self) -> NodeId {
        self.node
    }

    fn play(&mut self, clip: usize, start_at: f64) {
        self.events.lock().push(ProducerEvent::Play { clip, start_at });
    }

    fn stop(&mut self) {
        self.events.lock().push(ProducerEvent::Stop);
    }

    fn clip_count(&self) -> usize {
        self.clips
    }
}

#[derive(Debug, Default)]
struct RecorderState {
    starts: usize,
    stops: usize,
    active: bool,
    fail: bool,
}

/// Recorder that counts start/stop requests and can be told to fail.
#[derive(Clone, Default)]
pub struct TestRecorder {
    state: Arc<Mutex<RecorderState>>,
}

impl TestRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorder whose `start` always fails.
    pub fn failing() -> Self {
        let recorder = Self::default();
        recorder.state.lock().fail = true;
        recorder
    }

    pub fn starts(&self) -> usize {
        self.state.lock().starts
    }

    pub fn stops(&self) -> usize {
        self.state.lock().stops
    }

    pub fn is_active(&self) -> bool {
        self.state.lock().active
    }
}

impl Recorder for TestRecorder {
    fn start(&mut self) -> Result<()> {
        let mut state = self.state.lock();
        state.starts += 1;
        if state.fail {
            return Err(Error::Recording("input device unavailable".into()));
        }
        state.active = true;
        Ok(())
    }

    fn stop(&mut self) {
        let mut state = self.state.lock();
        state.stops += 1;
        state.active = false;
    }
}
