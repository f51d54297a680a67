//! The spatializer's multichannel input inside the host audio graph.

use core::fmt;

/// Host audio graph node handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node-{}", self.0)
    }
}

/// 0-based input channel index on the spatializer.
pub type Lane = usize;

/// Input side of the spatializer.
///
/// The spatializer only services its parameter queue while it is rendering,
/// and it only renders while something is connected. A silent placeholder
/// occupies lane 0 whenever no real source is connected.
pub trait InputBus: Send {
    /// Register a producer node with the host graph.
    fn attach(&mut self, node: NodeId);

    /// Connect an attached node to a lane.
    fn connect(&mut self, node: NodeId, lane: Lane);

    /// Disconnect every input of the spatializer, placeholder included.
    fn disconnect_all(&mut self);

    /// Remove a node from the host graph.
    fn detach(&mut self, node: NodeId);

    /// Connect the silent placeholder to lane 0.
    fn connect_placeholder(&mut self);

    fn disconnect_placeholder(&mut self);
}

/// What occupies a lane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusInput {
    Placeholder,
    Node(NodeId),
}
