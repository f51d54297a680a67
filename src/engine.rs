//! Thread-safe engine facade.

use std::sync::Arc;
use std::time::Instant;

use crossbeam_channel::{unbounded, Receiver, Sender};
use glam::Vec3;
use parking_lot::Mutex;
use shoebox_core::{
    Alignment, AnchorId, AtomicFlag, AtomicFloat, LatestSlot, MaterialId, PlaneExtent, Pose,
    RoomFit, ShoeboxRoom, SourceId, Spatializer, SurfaceName,
};
use shoebox_graph::{AudioProducer, InputBus, RouteChange, SourceSpec};
use tracing::warn;

use crate::controller::{EnvironmentController, PreparedFit, RoomUpdate};
use crate::error::{Error, Result};
use crate::fsm::{EnvironmentMode, Rejection};
use crate::ShoeboxEngineBuilder;

/// Creates a spatializer instance, at startup and on every session restart.
pub type SpatializerFactory = Arc<dyn Fn() -> Result<Box<dyn Spatializer>> + Send + Sync>;

/// Creates the spatializer's input bus in the host audio graph.
pub type BusFactory = Arc<dyn Fn() -> Box<dyn InputBus> + Send + Sync>;

/// Material chosen in the picker for a surface, by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaintRequest {
    pub surface: String,
    pub material: String,
}

impl PaintRequest {
    pub fn new(surface: impl Into<String>, material: impl Into<String>) -> Self {
        Self {
            surface: surface.into(),
            material: material.into(),
        }
    }
}

/// What one [`ShoeboxEngine::pump`] applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PumpStats {
    pub listener_applied: bool,
    pub paints_applied: usize,
    pub paints_rejected: usize,
}

pub(crate) fn instantiate(factory: &SpatializerFactory) -> Result<Box<dyn Spatializer>> {
    factory().map_err(|e| match e {
        e @ Error::SpatializerUnavailable(_) => e,
        other => Error::SpatializerUnavailable(other.to_string()),
    })
}

/// Virtual acoustic room engine.
///
/// Tracking callbacks, UI gestures and the material picker may call in from
/// any thread. Mutations are serialized through one lock; status reads
/// (`is_playing`, `height`) are lock-free.
///
/// # Example
///
/// ```ignore
/// use shoebox::prelude::*;
///
/// let engine = ShoeboxEngine::builder()
///     .catalog_paths("materials.json", "objects.json")
///     .headless()
///     .build()?;
///
/// engine.on_anchor_added(AnchorId(1), floor_extent)?;
/// engine.submit_listener_pose(camera_pose);
/// engine.pump();
/// ```
pub struct ShoeboxEngine {
    controller: Mutex<EnvironmentController>,
    listener: LatestSlot<Pose>,
    paint_tx: Sender<PaintRequest>,
    paint_rx: Receiver<PaintRequest>,

    playing: Arc<AtomicFlag>,
    height: Arc<AtomicFloat>,

    fit: RoomFit,
    spatializer_factory: SpatializerFactory,
    bus_factory: BusFactory,
    started: Instant,
}

impl ShoeboxEngine {
    pub fn builder() -> ShoeboxEngineBuilder {
        ShoeboxEngineBuilder::default()
    }

    pub(crate) fn new(
        controller: EnvironmentController,
        spatializer_factory: SpatializerFactory,
        bus_factory: BusFactory,
    ) -> Self {
        let (paint_tx, paint_rx) = unbounded();
        Self {
            fit: *controller.fitter(),
            playing: Arc::new(AtomicFlag::new(controller.is_playing())),
            height: Arc::new(AtomicFloat::new(controller.height())),
            controller: Mutex::new(controller),
            listener: LatestSlot::new(),
            paint_tx,
            paint_rx,
            spatializer_factory,
            bus_factory,
            started: Instant::now(),
        }
    }

    /// Run `f` on the controller and refresh the lock-free status afterwards.
    fn with_status<R>(&self, f: impl FnOnce(&mut EnvironmentController) -> R) -> R {
        let mut controller = self.controller.lock();
        let result = f(&mut *controller);
        self.playing.set(controller.is_playing());
        self.height.set(controller.height());
        result
    }

    /// Read-only access to the controller.
    pub fn with_controller<R>(&self, f: impl FnOnce(&EnvironmentController) -> R) -> R {
        f(&*self.controller.lock())
    }

    /// Seconds since the engine was built; the clock playback starts use.
    pub fn now(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }

    // =========================================================================
    // Tracking
    // =========================================================================

    fn prepare(&self, extent: PlaneExtent) -> PreparedFit {
        PreparedFit::new(&self.fit, extent, self.height.get())
    }

    pub fn on_anchor_added(&self, id: AnchorId, extent: PlaneExtent) -> Result<RoomUpdate> {
        let prepared = self.prepare(extent);
        self.with_status(|c| c.on_anchor_added(id, extent, Some(prepared)))
    }

    pub fn on_anchor_updated(&self, id: AnchorId, extent: PlaneExtent) -> Result<RoomUpdate> {
        let prepared = self.prepare(extent);
        self.with_status(|c| c.on_anchor_updated(id, extent, Some(prepared)))
    }

    pub fn on_anchor_removed(&self, id: AnchorId) -> Result<RoomUpdate> {
        self.with_status(|c| c.on_anchor_removed(id))
    }

    /// Queue a listener pose. Only the newest pose is applied by [`pump`](Self::pump).
    pub fn submit_listener_pose(&self, pose: Pose) {
        self.listener.publish(pose);
    }

    /// Sender for the material picker.
    pub fn material_picker(&self) -> Sender<PaintRequest> {
        self.paint_tx.clone()
    }

    /// Apply the newest listener pose and every queued paint request.
    pub fn pump(&self) -> PumpStats {
        let mut stats = PumpStats::default();
        let pose = self.listener.take();
        let paints: Vec<PaintRequest> = self.paint_rx.try_iter().collect();
        if pose.is_none() && paints.is_empty() {
            return stats;
        }

        self.with_status(|c| {
            if let Some(pose) = pose {
                match c.update_listener(*pose) {
                    Ok(()) => stats.listener_applied = true,
                    Err(e) => warn!("Listener update dropped: {}", e),
                }
            }
            for request in paints {
                match c.paint_named(&request.surface, &request.material) {
                    Ok(_) => stats.paints_applied += 1,
                    Err(_) => stats.paints_rejected += 1,
                }
            }
        });
        stats
    }

    // =========================================================================
    // Environment
    // =========================================================================

    pub fn begin_measuring(&self) -> Result<()> {
        self.with_status(|c| c.begin_measuring())
    }

    pub fn begin_painting(&self) -> Result<()> {
        self.with_status(|c| c.begin_painting())
    }

    pub fn confirm(&self) -> Result<()> {
        self.with_status(|c| c.confirm())
    }

    pub fn cancel(&self) -> Result<()> {
        self.with_status(|c| c.cancel())
    }

    pub fn paint(&self, surface: SurfaceName, material: &str) -> Result<MaterialId> {
        self.with_status(|c| c.paint(surface, material))
    }

    pub fn assign_material(&self, surface: SurfaceName, material: &str) -> Result<MaterialId> {
        self.with_status(|c| c.assign_material(surface, material))
    }

    pub fn set_locked(&self, locked: bool) -> Result<()> {
        self.with_status(|c| c.set_locked(locked))
    }

    pub fn set_visible(&self, visible: bool) -> Result<()> {
        self.with_status(|c| c.set_visible(visible))
    }

    pub fn toggle_debug(&self) -> Result<bool> {
        self.with_status(|c| c.toggle_debug())
    }

    pub fn reset_environment(&self) -> Result<()> {
        self.with_status(|c| c.reset_environment())
    }

    // =========================================================================
    // Sources
    // =========================================================================

    pub fn place_source(&self, spec: SourceSpec) -> Result<SourceId> {
        self.with_status(|c| c.place_source(spec))
    }

    pub fn place_object(
        &self,
        model_name: &str,
        producer: Box<dyn AudioProducer>,
        position: Vec3,
        alignment: Alignment,
    ) -> Result<SourceId> {
        self.with_status(|c| c.place_object(model_name, producer, position, alignment))
    }

    pub fn remove_source(&self, id: SourceId) -> Result<()> {
        self.with_status(|c| c.remove_source(id))
    }

    pub fn remove_all_sources(&self) -> Result<usize> {
        self.with_status(|c| c.remove_all_sources())
    }

    pub fn move_source(&self, id: SourceId, target: Vec3, smooth: bool) -> Result<Vec3> {
        self.with_status(|c| c.move_source(id, target, smooth))
    }

    pub fn finish_move(&self, id: SourceId) -> Result<()> {
        self.with_status(|c| c.finish_move(id))
    }

    pub fn rotate_source(&self, id: SourceId, radians: f32) -> Result<f32> {
        self.with_status(|c| c.rotate_source(id, radians))
    }

    pub fn select_clip(&self, clip: usize) -> Result<()> {
        self.with_status(|c| c.select_clip(clip))
    }

    // =========================================================================
    // Playback
    // =========================================================================

    pub fn start_playing(&self) -> Result<()> {
        let now = self.now();
        self.with_status(|c| c.start_playing(now))
    }

    pub fn stop_playing(&self) {
        self.with_status(|c| c.stop_playing())
    }

    pub fn toggle_play(&self) -> Result<bool> {
        let now = self.now();
        self.with_status(|c| c.toggle_play(now))
    }

    pub fn handle_route_change(&self, change: RouteChange) {
        self.controller.lock().handle_route_change(change);
    }

    // =========================================================================
    // Session
    // =========================================================================

    /// Tear the session down and start again with a fresh spatializer.
    pub fn restart_session(&self) -> Result<()> {
        if self.playing.get() {
            warn!("Rejected session restart while playing");
            return Err(Rejection::Busy(EnvironmentMode::Playing).into());
        }
        let spatializer = instantiate(&self.spatializer_factory)?;
        let bus = (self.bus_factory)();
        // Stale poses and paints belong to the old session
        self.listener.take();
        self.paint_rx.try_iter().for_each(drop);
        self.with_status(|c| c.restart(spatializer, bus))
    }

    // =========================================================================
    // Status
    // =========================================================================

    #[inline]
    pub fn is_playing(&self) -> bool {
        self.playing.get()
    }

    /// Committed room height (meters).
    #[inline]
    pub fn height(&self) -> f32 {
        self.height.get()
    }

    pub fn mode(&self) -> EnvironmentMode {
        self.controller.lock().mode()
    }

    pub fn room(&self) -> Option<ShoeboxRoom> {
        self.controller.lock().room().copied()
    }

    pub fn source_count(&self) -> usize {
        self.controller.lock().graph().len()
    }
}
