//! Environment controller: owns the room, the materials and the source graph.
//!
//! Everything that talks to the spatializer or the scene goes through here.
//! The controller is single-owner; [`ShoeboxEngine`](crate::ShoeboxEngine)
//! serializes access to it.

use std::sync::Arc;

use glam::Vec3;
use shoebox_core::{
    Alignment, AnchorId, Catalog, FloorChange, FloorTracker, ListenerState, MaterialAssignment,
    MaterialId, PlaneExtent, Pose, RoomFit, RoomGeometry, SceneSink, ShoeboxRoom, SourceId,
    Spatializer, SurfaceBuilder, SurfaceName,
};
use shoebox_graph::{AudioProducer, InputBus, Recorder, RouteChange, SourceGraph, SourceSpec};
use tracing::{debug, info, warn};

use crate::config::EnvironmentConfig;
use crate::error::{Error, Result};
use crate::fsm::{
    EnvironmentEvent, EnvironmentFsm, EnvironmentMode, Rejection, RoomState, TransitionResult,
};

/// Room fitted off the owner thread, tagged with what it was fitted from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreparedFit {
    pub extent: PlaneExtent,
    pub height: f32,
    pub room: ShoeboxRoom,
}

impl PreparedFit {
    pub fn new(fit: &RoomFit, extent: PlaneExtent, height: f32) -> Self {
        Self {
            extent,
            height,
            room: fit.fit(&extent, height),
        }
    }
}

/// What a floor event did to the room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomUpdate {
    /// The event did not touch the floor.
    Unchanged,
    /// A new room was pushed to the spatializer.
    Pushed,
    /// Locked or busy: the previous room was kept.
    Held,
    /// The new fit was within the refit threshold.
    BelowThreshold,
    /// No floor to fit against.
    NoFloor,
}

fn reject(rejection: Rejection) -> Error {
    warn!("Rejected: {}", rejection);
    rejection.into()
}

pub struct EnvironmentController {
    config: EnvironmentConfig,
    catalog: Arc<Catalog>,
    spatializer: Box<dyn Spatializer>,
    scene: Box<dyn SceneSink>,
    graph: SourceGraph,
    materials: MaterialAssignment,
    floors: FloorTracker,
    fsm: EnvironmentFsm,
    fit: RoomFit,

    room: Option<ShoeboxRoom>,
    geometry: Option<RoomGeometry>,
    /// Committed room height.
    height: f32,
    /// Height under the listener's gaze while measuring.
    candidate_height: Option<f32>,
    listener: ListenerState,
    /// Whether the spatializer is in shoebox (not free-field) mode.
    shoebox_active: bool,
    lost: bool,
}

impl EnvironmentController {
    pub fn new(
        config: EnvironmentConfig,
        catalog: Arc<Catalog>,
        spatializer: Box<dyn Spatializer>,
        mut scene: Box<dyn SceneSink>,
        bus: Box<dyn InputBus>,
    ) -> Self {
        let graph = Self::new_graph(&config, bus);
        let materials = MaterialAssignment::new(catalog.clone(), config.default_materials.clone());
        scene.set_environment_hidden(true);
        scene.set_debug_overlay(false);

        Self {
            fit: RoomFit::new(config.fit),
            height: config.initial_height,
            config,
            catalog,
            spatializer,
            scene,
            graph,
            materials,
            floors: FloorTracker::new(),
            fsm: EnvironmentFsm::new(),
            room: None,
            geometry: None,
            candidate_height: None,
            listener: ListenerState::default(),
            shoebox_active: false,
            lost: false,
        }
    }

    fn new_graph(config: &EnvironmentConfig, bus: Box<dyn InputBus>) -> SourceGraph {
        let mut graph = SourceGraph::new(bus).with_start_delay(config.start_delay);
        graph.set_recording_enabled(config.recording_enabled);
        graph
    }

    pub fn set_recorder(&mut self, recorder: Box<dyn Recorder>) {
        self.graph.set_recorder(recorder);
    }

    // =========================================================================
    // Floor anchors
    // =========================================================================

    pub fn on_anchor_added(
        &mut self,
        id: AnchorId,
        extent: PlaneExtent,
        prepared: Option<PreparedFit>,
    ) -> Result<RoomUpdate> {
        self.ensure_alive()?;
        let change = self.floors.add(id, extent);
        self.apply_floor_change(change, prepared)
    }

    pub fn on_anchor_updated(
        &mut self,
        id: AnchorId,
        extent: PlaneExtent,
        prepared: Option<PreparedFit>,
    ) -> Result<RoomUpdate> {
        self.ensure_alive()?;
        let change = self.floors.update(id, extent).inspect_err(|e| {
            warn!("Ignored anchor update: {}", e);
        })?;
        self.apply_floor_change(change, prepared)
    }

    pub fn on_anchor_removed(&mut self, id: AnchorId) -> Result<RoomUpdate> {
        self.ensure_alive()?;
        let change = self.floors.remove(id).inspect_err(|e| {
            warn!("Ignored anchor removal: {}", e);
        })?;
        self.apply_floor_change(change, None)
    }

    fn apply_floor_change(
        &mut self,
        change: FloorChange,
        prepared: Option<PreparedFit>,
    ) -> Result<RoomUpdate> {
        match change {
            FloorChange::Unchanged => Ok(RoomUpdate::Unchanged),
            FloorChange::Lost => {
                info!("Floor lost, keeping the last room");
                Ok(RoomUpdate::Held)
            }
            FloorChange::First(id) if self.room.is_none() => {
                info!("Floor found on {}", id);
                Ok(self.create_default_room(prepared))
            }
            FloorChange::First(id) => {
                info!("Floor found again on {}", id);
                Ok(self.update_room(prepared))
            }
            FloorChange::Replaced(_) | FloorChange::Updated(_) => Ok(self.update_room(prepared)),
        }
    }

    /// Switch the spatializer to the placeholder shoebox, fit it to the floor,
    /// assign the default materials and leave it hidden.
    fn create_default_room(&mut self, prepared: Option<PreparedFit>) -> RoomUpdate {
        let dims = self.config.default_room;
        self.spatializer
            .set_environment_shoebox(dims.width, dims.length, dims.height);
        self.shoebox_active = true;

        let Some(room) = self.fit_floor(prepared) else {
            return RoomUpdate::NoFloor;
        };
        self.apply_room(room, true);
        self.materials
            .reset(self.spatializer.as_mut(), self.scene.as_mut());
        self.scene.set_environment_hidden(!self.fsm.is_visible());
        RoomUpdate::Pushed
    }

    /// Refit to the current floor unless the room is frozen.
    fn update_room(&mut self, prepared: Option<PreparedFit>) -> RoomUpdate {
        if self.fsm.is_frozen() {
            if self.fsm.is_visible() {
                self.redraw();
            }
            debug!("Room held ({:?}, {:?})", self.fsm.mode(), self.fsm.lock());
            return RoomUpdate::Held;
        }

        let Some(room) = self.fit_floor(prepared) else {
            return RoomUpdate::NoFloor;
        };

        let threshold = self.config.refit_threshold;
        if threshold > 0.0 {
            if let Some(current) = &self.room {
                if current.max_delta(&room) <= threshold {
                    return RoomUpdate::BelowThreshold;
                }
            }
        }

        self.apply_room(room, self.fsm.is_visible());
        if self.fsm.mode() == EnvironmentMode::MeasuringHeight && self.fsm.is_visible() {
            self.redraw();
        }
        RoomUpdate::Pushed
    }

    fn fit_floor(&self, prepared: Option<PreparedFit>) -> Option<ShoeboxRoom> {
        let extent = self.floors.floor_extent()?;
        match prepared {
            Some(p) if p.extent == *extent && p.height == self.height => Some(p.room),
            _ => Some(self.fit.fit(extent, self.height)),
        }
    }

    /// Build surfaces for `room`, push it to the spatializer and keep it.
    fn apply_room(&mut self, room: ShoeboxRoom, render: bool) {
        let geometry = SurfaceBuilder::build(&room);
        if render {
            self.scene.replace_room(&geometry);
            self.materials.refill(self.scene.as_mut());
        }

        let (width, length, height) = room.dimensions();
        if !self.shoebox_active {
            self.spatializer.set_environment_shoebox(width, length, height);
            self.shoebox_active = true;
        }
        self.spatializer
            .set_environment_shoebox_orientation_euler(room.yaw_radians, 0.0, 0.0);
        self.spatializer.set_environment_shoebox_origin(room.origin);
        self.spatializer
            .set_environment_shoebox_dimensions(width, length, height);
        self.graph.update_all_positions(self.spatializer.as_mut());

        debug!(
            "Room {:.2} x {:.2} x {:.2} m at {:?}, yaw {:.3}",
            width, length, height, room.origin, room.yaw_radians
        );
        self.room = Some(room);
        self.geometry = Some(geometry);
    }

    /// Re-send the retained room, or the height preview while measuring.
    fn redraw(&mut self) {
        if let (EnvironmentMode::MeasuringHeight, Some(height), Some(room)) =
            (self.fsm.mode(), self.candidate_height, self.room)
        {
            let preview = ShoeboxRoom { height, ..room };
            self.scene.replace_room(&SurfaceBuilder::build(&preview));
            return;
        }
        if let Some(geometry) = &self.geometry {
            self.scene.replace_room(geometry);
        }
    }

    // =========================================================================
    // Listener
    // =========================================================================

    /// Apply one tracking frame.
    pub fn update_listener(&mut self, pose: Pose) -> Result<()> {
        self.ensure_alive()?;
        self.listener = ListenerState::from(pose);
        self.listener.push_to(self.spatializer.as_mut());

        if self.fsm.mode() == EnvironmentMode::MeasuringHeight {
            if let Some(room) = self.room {
                self.candidate_height = Some(self.fit.measure_height(room.origin, &pose));
                if self.fsm.is_visible() {
                    self.redraw();
                }
            }
        }
        Ok(())
    }

    // =========================================================================
    // Modes
    // =========================================================================

    fn transition(&mut self, event: EnvironmentEvent) -> Result<TransitionResult> {
        match self.fsm.transition(event) {
            TransitionResult::Rejected(rejection) => Err(reject(rejection)),
            result => {
                if result != TransitionResult::None {
                    info!("{:?} -> {:?}", event, result);
                }
                Ok(result)
            }
        }
    }

    /// Mirror visibility and debug overlay into the scene.
    fn sync_scene(&mut self) {
        self.scene.set_environment_hidden(!self.fsm.is_visible());
        self.scene.set_debug_overlay(self.fsm.debug());
    }

    fn require_room(&self) -> Result<()> {
        if self.room.is_none() {
            warn!("Rejected: no room yet");
            return Err(shoebox_core::Error::NoFloor.into());
        }
        Ok(())
    }

    pub fn begin_measuring(&mut self) -> Result<()> {
        self.ensure_alive()?;
        self.require_room()?;
        self.transition(EnvironmentEvent::BeginMeasuring)?;
        self.candidate_height = None;
        self.sync_scene();
        self.redraw();
        Ok(())
    }

    pub fn begin_painting(&mut self) -> Result<()> {
        self.ensure_alive()?;
        self.require_room()?;
        self.transition(EnvironmentEvent::BeginPainting)?;
        self.sync_scene();
        self.redraw();
        Ok(())
    }

    /// Commit the pending height or paints.
    pub fn confirm(&mut self) -> Result<()> {
        self.ensure_alive()?;
        match self.transition(EnvironmentEvent::Confirm)? {
            TransitionResult::Confirmed(EnvironmentMode::MeasuringHeight) => {
                if let Some(height) = self.candidate_height.take() {
                    info!("Room height set to {:.2} m", height);
                    self.height = height;
                }
                if let Some(room) = self.fit_floor(None) {
                    self.apply_room(room, self.fsm.is_visible());
                }
            }
            TransitionResult::Confirmed(EnvironmentMode::PaintingMaterial) => {
                let count = self
                    .materials
                    .commit(self.spatializer.as_mut(), self.scene.as_mut());
                info!("Committed {} surface materials", count);
            }
            _ => {}
        }
        self.sync_scene();
        Ok(())
    }

    /// Drop the pending height or paints.
    pub fn cancel(&mut self) -> Result<()> {
        self.ensure_alive()?;
        match self.transition(EnvironmentEvent::Cancel)? {
            TransitionResult::Cancelled(EnvironmentMode::MeasuringHeight) => {
                self.candidate_height = None;
                if self.fsm.is_visible() {
                    self.redraw();
                }
            }
            TransitionResult::Cancelled(EnvironmentMode::PaintingMaterial) => {
                self.materials.discard(self.scene.as_mut());
            }
            _ => {}
        }
        self.sync_scene();
        Ok(())
    }

    /// Show or hide the room. Showing an unlocked room refits it first.
    pub fn set_visible(&mut self, visible: bool) -> Result<()> {
        let event = if visible {
            EnvironmentEvent::Show
        } else {
            EnvironmentEvent::Hide
        };
        if let TransitionResult::VisibilityChanged(true) = self.transition(event)? {
            if self.fsm.is_locked() {
                self.redraw();
            } else if let Some(room) = self.fit_floor(None) {
                self.apply_room(room, true);
            }
        }
        self.sync_scene();
        Ok(())
    }

    pub fn set_locked(&mut self, locked: bool) -> Result<()> {
        let event = if locked {
            EnvironmentEvent::Lock
        } else {
            EnvironmentEvent::Unlock
        };
        self.transition(event)?;
        Ok(())
    }

    pub fn toggle_debug(&mut self) -> Result<bool> {
        self.transition(EnvironmentEvent::ToggleDebug)?;
        self.sync_scene();
        Ok(self.fsm.debug())
    }

    // =========================================================================
    // Materials
    // =========================================================================

    /// Preview a material on a surface. Requires painting mode.
    pub fn paint(&mut self, surface: SurfaceName, material: &str) -> Result<MaterialId> {
        if self.fsm.mode() != EnvironmentMode::PaintingMaterial {
            return Err(reject(Rejection::NotPainting));
        }
        Ok(self.materials.stage(surface, material, self.scene.as_mut()))
    }

    pub fn paint_named(&mut self, surface: &str, material: &str) -> Result<MaterialId> {
        let name = surface.parse::<SurfaceName>().inspect_err(|e| {
            warn!("Rejected paint: {}", e);
        })?;
        self.paint(name, material)
    }

    /// Assign a material immediately, bypassing painting mode.
    pub fn assign_material(&mut self, surface: SurfaceName, material: &str) -> Result<MaterialId> {
        self.ensure_alive()?;
        Ok(self
            .materials
            .assign(surface, material, self.spatializer.as_mut(), self.scene.as_mut()))
    }

    // =========================================================================
    // Sources
    // =========================================================================

    pub fn place_source(&mut self, spec: SourceSpec) -> Result<SourceId> {
        self.ensure_alive()?;
        if self.floors.floor().is_none() {
            warn!("Rejected source placement: no floor");
            return Err(shoebox_core::Error::NoFloor.into());
        }
        match self.fsm.mode() {
            EnvironmentMode::Default => {}
            mode => return Err(reject(Rejection::Busy(mode))),
        }
        if self.fsm.is_visible() {
            return Err(reject(Rejection::EnvironmentVisible));
        }

        let id = self.graph.load(spec, self.spatializer.as_mut());
        info!("Placed source {} ({} total)", id, self.graph.len());
        Ok(id)
    }

    /// Place a catalog object on a plane of the given alignment.
    pub fn place_object(
        &mut self,
        model_name: &str,
        producer: Box<dyn AudioProducer>,
        position: Vec3,
        alignment: Alignment,
    ) -> Result<SourceId> {
        let display_name = {
            let object = self.catalog.object(model_name).ok_or_else(|| {
                warn!("Rejected placement of unknown object '{}'", model_name);
                Error::UnknownObject(model_name.to_string())
            })?;
            if !object.allows(alignment) {
                return Err(reject(Rejection::AlignmentNotAllowed));
            }
            object.display_name.clone()
        };
        self.place_source(SourceSpec::new(display_name, producer).at(position))
    }

    pub fn remove_source(&mut self, id: SourceId) -> Result<()> {
        self.ensure_alive()?;
        self.graph.remove(id, self.spatializer.as_mut())?;
        info!("Removed source {} ({} left)", id, self.graph.len());
        self.follow_graph();
        Ok(())
    }

    pub fn remove_all_sources(&mut self) -> Result<usize> {
        self.ensure_alive()?;
        let removed = self.graph.remove_all(self.spatializer.as_mut());
        self.follow_graph();
        Ok(removed)
    }

    /// Drag a source toward `target`, seen from the listener.
    pub fn move_source(&mut self, id: SourceId, target: Vec3, smooth: bool) -> Result<Vec3> {
        self.ensure_alive()?;
        let position = self
            .graph
            .move_source(id, target, self.listener.position, smooth)?;
        if self.graph.is_playing() {
            self.spatializer.set_source_position(id, position);
        }
        Ok(position)
    }

    pub fn finish_move(&mut self, id: SourceId) -> Result<()> {
        Ok(self.graph.finish_move(id)?)
    }

    pub fn rotate_source(&mut self, id: SourceId, radians: f32) -> Result<f32> {
        Ok(self.graph.rotate_source(id, radians)?)
    }

    pub fn select_clip(&mut self, clip: usize) -> Result<()> {
        Ok(self.graph.select_clip(clip)?)
    }

    // =========================================================================
    // Playback
    // =========================================================================

    /// Start every source `start_delay` after `now` (seconds).
    pub fn start_playing(&mut self, now: f64) -> Result<()> {
        self.ensure_alive()?;
        let event = EnvironmentEvent::StartPlaying {
            sources: self.graph.len(),
        };
        if let TransitionResult::ModeChanged(EnvironmentMode::Playing) = self.transition(event)? {
            self.sync_scene();
            self.graph.start_playing(now);
            self.graph.update_all_positions(self.spatializer.as_mut());
        }
        Ok(())
    }

    pub fn stop_playing(&mut self) {
        self.graph.stop_playing();
        self.follow_graph();
    }

    /// Returns whether playback is running afterwards.
    pub fn toggle_play(&mut self, now: f64) -> Result<bool> {
        if self.graph.is_playing() {
            self.stop_playing();
        } else {
            self.start_playing(now)?;
        }
        Ok(self.graph.is_playing())
    }

    pub fn handle_route_change(&self, change: RouteChange) {
        self.graph.handle_route_change(change);
    }

    /// Leave playing mode when the graph stopped on its own.
    fn follow_graph(&mut self) {
        if !self.graph.is_playing() && self.fsm.mode() == EnvironmentMode::Playing {
            self.fsm.transition(EnvironmentEvent::StopPlaying);
            info!("Playback stopped");
        }
    }

    // =========================================================================
    // Session
    // =========================================================================

    /// Hide the room and put the spatializer in free-field mode.
    pub fn reset_environment(&mut self) -> Result<()> {
        self.ensure_alive()?;
        if matches!(
            self.fsm.mode(),
            EnvironmentMode::MeasuringHeight | EnvironmentMode::PaintingMaterial
        ) {
            self.cancel()?;
        }
        self.set_visible(false)?;

        self.spatializer.set_environment_freefield();
        self.spatializer.set_environment_shoebox_origin(Vec3::ZERO);
        self.spatializer
            .set_environment_shoebox_orientation_euler(0.0, 0.0, 0.0);
        self.shoebox_active = false;
        self.graph.update_all_positions(self.spatializer.as_mut());
        info!("Environment reset to free field");
        Ok(())
    }

    /// Start over with a fresh spatializer and input bus.
    ///
    /// Rejected while playing. Sources, floor anchors and the room are
    /// dropped; the recorder carries over.
    pub fn restart(
        &mut self,
        spatializer: Box<dyn Spatializer>,
        bus: Box<dyn InputBus>,
    ) -> Result<()> {
        if self.graph.is_playing() {
            return Err(reject(Rejection::Busy(EnvironmentMode::Playing)));
        }

        let removed = self.graph.remove_all(self.spatializer.as_mut());
        self.fsm.transition(EnvironmentEvent::Reset);
        self.floors.clear();
        self.room = None;
        self.geometry = None;
        self.height = self.config.initial_height;
        self.candidate_height = None;
        self.shoebox_active = false;
        self.materials =
            MaterialAssignment::new(self.catalog.clone(), self.config.default_materials.clone());

        let recorder = self.graph.take_recorder();
        self.graph = Self::new_graph(&self.config, bus);
        if let Some(recorder) = recorder {
            self.graph.set_recorder(recorder);
        }
        self.spatializer = spatializer;
        self.lost = false;
        self.sync_scene();

        info!("Session restarted ({} sources removed)", removed);
        Ok(())
    }

    /// Latch [`Error::SpatializerLost`] once the processor goes away.
    fn ensure_alive(&mut self) -> Result<()> {
        if !self.lost && !self.spatializer.is_valid() {
            warn!("Spatializer is no longer valid");
            self.lost = true;
        }
        if self.lost {
            return Err(Error::SpatializerLost);
        }
        Ok(())
    }

    // =========================================================================
    // State
    // =========================================================================

    pub fn config(&self) -> &EnvironmentConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn fitter(&self) -> &RoomFit {
        &self.fit
    }

    pub fn mode(&self) -> EnvironmentMode {
        self.fsm.mode()
    }

    pub fn room_state(&self) -> RoomState {
        self.fsm.lock()
    }

    pub fn is_locked(&self) -> bool {
        self.fsm.is_locked()
    }

    pub fn is_visible(&self) -> bool {
        self.fsm.is_visible()
    }

    pub fn debug(&self) -> bool {
        self.fsm.debug()
    }

    pub fn room(&self) -> Option<&ShoeboxRoom> {
        self.room.as_ref()
    }

    pub fn geometry(&self) -> Option<&RoomGeometry> {
        self.geometry.as_ref()
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn candidate_height(&self) -> Option<f32> {
        self.candidate_height
    }

    pub fn listener(&self) -> &ListenerState {
        &self.listener
    }

    pub fn materials(&self) -> &MaterialAssignment {
        &self.materials
    }

    pub fn graph(&self) -> &SourceGraph {
        &self.graph
    }

    pub fn floors(&self) -> &FloorTracker {
        &self.floors
    }

    pub fn is_playing(&self) -> bool {
        self.graph.is_playing()
    }

    pub fn is_lost(&self) -> bool {
        self.lost
    }
}
