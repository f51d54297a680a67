//! Floor selection among tracked plane anchors.
//!
//! The lowest horizontal anchor is the floor. Anchors arrive, change and
//! disappear (the tracker merges planes), so the choice is revisited on
//! every event.

use core::fmt;
use std::collections::BTreeMap;

use tracing::debug;

use crate::error::{Error, Result};
use crate::geometry::{Alignment, PlaneExtent};

/// Opaque tracking anchor identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AnchorId(pub u64);

impl fmt::Display for AnchorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "anchor-{}", self.0)
    }
}

/// Outcome of an anchor event for the floor selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloorChange {
    /// Floor unaffected.
    Unchanged,
    /// First floor of the session.
    First(AnchorId),
    /// A lower anchor took over as floor.
    Replaced(AnchorId),
    /// The floor anchor's extent changed.
    Updated(AnchorId),
    /// The floor anchor went away and nothing can replace it.
    Lost,
}

impl FloorChange {
    /// Whether the floor extent to fit against is different now.
    pub fn floor_moved(self) -> bool {
        !matches!(self, FloorChange::Unchanged | FloorChange::Lost)
    }
}

#[derive(Debug, Default)]
pub struct FloorTracker {
    anchors: BTreeMap<AnchorId, PlaneExtent>,
    floor: Option<AnchorId>,
}

impl FloorTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, id: AnchorId, extent: PlaneExtent) -> FloorChange {
        self.anchors.insert(id, extent);
        self.consider(id, &extent)
    }

    pub fn update(&mut self, id: AnchorId, extent: PlaneExtent) -> Result<FloorChange> {
        let slot = self.anchors.get_mut(&id).ok_or(Error::UnknownAnchor(id))?;
        *slot = extent;
        if self.floor == Some(id) {
            return Ok(FloorChange::Updated(id));
        }
        Ok(self.consider(id, &extent))
    }

    pub fn remove(&mut self, id: AnchorId) -> Result<FloorChange> {
        self.anchors.remove(&id).ok_or(Error::UnknownAnchor(id))?;
        if self.floor != Some(id) {
            return Ok(FloorChange::Unchanged);
        }

        self.floor = self.lowest();
        Ok(match self.floor {
            Some(next) => {
                debug!("Floor {} removed, promoting {}", id, next);
                FloorChange::Replaced(next)
            }
            None => {
                debug!("Floor {} removed, no replacement", id);
                FloorChange::Lost
            }
        })
    }

    pub fn floor(&self) -> Option<(AnchorId, &PlaneExtent)> {
        let id = self.floor?;
        self.anchors.get(&id).map(|extent| (id, extent))
    }

    pub fn floor_extent(&self) -> Option<&PlaneExtent> {
        self.floor().map(|(_, extent)| extent)
    }

    pub fn floor_y(&self) -> Option<f32> {
        self.floor_extent().map(PlaneExtent::world_y)
    }

    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }

    pub fn clear(&mut self) {
        self.anchors.clear();
        self.floor = None;
    }

    fn consider(&mut self, id: AnchorId, extent: &PlaneExtent) -> FloorChange {
        if extent.alignment != Alignment::Horizontal {
            return FloorChange::Unchanged;
        }
        match self.floor_y() {
            None => {
                self.floor = Some(id);
                debug!("First floor {} at y={:.3}", id, extent.world_y());
                FloorChange::First(id)
            }
            Some(y) if extent.world_y() < y => {
                self.floor = Some(id);
                debug!("Lower floor {} at y={:.3}", id, extent.world_y());
                FloorChange::Replaced(id)
            }
            Some(_) => FloorChange::Unchanged,
        }
    }

    fn lowest(&self) -> Option<AnchorId> {
        self.anchors
            .iter()
            .filter(|(_, extent)| extent.alignment == Alignment::Horizontal)
            .min_by(|a, b| a.1.world_y().total_cmp(&b.1.world_y()))
            .map(|(id, _)| *id)
    }
}
