//! Spatializer source graph.
//!
//! [`SourceGraph`] owns the active sound sources and the spatializer's
//! multichannel [`InputBus`]. Lanes stay numbered `0..N-1` across every load
//! and remove; a silent placeholder keeps lane 0 busy when nothing is loaded.
//!
//! # Example
//!
//! ```ignore
//! use shoebox_graph::{RecordingBus, RecordingSpatializer, SourceGraph, SourceSpec, TestProducer, NodeId};
//!
//! let mut spatializer = RecordingSpatializer::new();
//! let mut graph = SourceGraph::new(Box::new(RecordingBus::new()));
//! let id = graph.load(SourceSpec::new("radio", Box::new(TestProducer::new(NodeId(1), 1))), &mut spatializer);
//! graph.remove(id, &mut spatializer)?;
//! ```

pub mod error;
pub use error::{Error, Result};

pub mod bus;
pub use bus::{BusInput, InputBus, Lane, NodeId};

pub mod source;
pub use source::{
    AudioProducer, Placement, SoundSource, SourceSpec, DEFAULT_MIN_DISTANCE_GAIN,
    MAX_CAMERA_DISTANCE, SMOOTHING_WINDOW,
};

pub mod graph;
pub use graph::{Recorder, RouteChange, SourceGraph, PLAYBACK_START_DELAY};

pub mod recording;
pub use recording::{
    BusCall, ProducerEvent, RecordingBus, RecordingSpatializer, SpatializerCall, TestProducer,
    TestRecorder,
};
