//! Rendering collaborator interface and an in-memory retained scene.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::surfaces::{Marker, MarkerName, RoomGeometry, Surface, SurfaceName};

/// Neutral gray used for surfaces without a material.
pub const SURFACE_GRAY: [f32; 4] = [0.5, 0.5, 0.5, 1.0];

/// Visual content of a surface.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceFill {
    /// Repeating texture image.
    Texture(String),
    /// Flat RGBA color.
    FlatColor([f32; 4]),
}

impl Default for SurfaceFill {
    fn default() -> Self {
        SurfaceFill::FlatColor(SURFACE_GRAY)
    }
}

/// Receives named surface and marker nodes.
///
/// Every `replace_*` call replaces the node of the same name, so pushing a
/// rebuilt room never accumulates duplicates.
pub trait SceneSink: Send {
    fn replace_surface(&mut self, surface: &Surface);

    fn set_surface_fill(&mut self, name: SurfaceName, fill: &SurfaceFill);

    fn replace_marker(&mut self, marker: &Marker);

    fn set_environment_hidden(&mut self, hidden: bool);

    fn set_debug_overlay(&mut self, enabled: bool);

    /// Replace every surface and marker of `geometry`.
    fn replace_room(&mut self, geometry: &RoomGeometry) {
        for surface in geometry.surfaces() {
            self.replace_surface(surface);
        }
        for marker in geometry.markers() {
            self.replace_marker(marker);
        }
    }
}

/// Scene state kept in memory, keyed by node name.
#[derive(Debug, Clone, Default)]
pub struct RetainedScene {
    surfaces: BTreeMap<SurfaceName, Surface>,
    fills: BTreeMap<SurfaceName, SurfaceFill>,
    markers: HashMap<MarkerName, Marker>,
    hidden: bool,
    debug_overlay: bool,
    surface_replacements: usize,
}

impl RetainedScene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle that can be given to an engine while the caller keeps reading it.
    pub fn shared() -> Arc<Mutex<RetainedScene>> {
        Arc::new(Mutex::new(Self::new()))
    }

    pub fn surface(&self, name: SurfaceName) -> Option<&Surface> {
        self.surfaces.get(&name)
    }

    pub fn surface_count(&self) -> usize {
        self.surfaces.len()
    }

    pub fn fill(&self, name: SurfaceName) -> SurfaceFill {
        self.fills.get(&name).cloned().unwrap_or_default()
    }

    pub fn marker(&self, name: MarkerName) -> Option<&Marker> {
        self.markers.get(&name)
    }

    pub fn marker_count(&self) -> usize {
        self.markers.len()
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn debug_overlay(&self) -> bool {
        self.debug_overlay
    }

    /// Number of `replace_surface` calls received.
    pub fn surface_replacements(&self) -> usize {
        self.surface_replacements
    }
}

impl SceneSink for RetainedScene {
    fn replace_surface(&mut self, surface: &Surface) {
        self.surfaces.insert(surface.name, *surface);
        self.surface_replacements += 1;
    }

    fn set_surface_fill(&mut self, name: SurfaceName, fill: &SurfaceFill) {
        self.fills.insert(name, fill.clone());
    }

    fn replace_marker(&mut self, marker: &Marker) {
        self.markers.insert(marker.name, *marker);
    }

    fn set_environment_hidden(&mut self, hidden: bool) {
        self.hidden = hidden;
    }

    fn set_debug_overlay(&mut self, enabled: bool) {
        self.debug_overlay = enabled;
    }
}

impl<S: SceneSink> SceneSink for Arc<Mutex<S>> {
    fn replace_surface(&mut self, surface: &Surface) {
        self.lock().replace_surface(surface);
    }

    fn set_surface_fill(&mut self, name: SurfaceName, fill: &SurfaceFill) {
        self.lock().set_surface_fill(name, fill);
    }

    fn replace_marker(&mut self, marker: &Marker) {
        self.lock().replace_marker(marker);
    }

    fn set_environment_hidden(&mut self, hidden: bool) {
        self.lock().set_environment_hidden(hidden);
    }

    fn set_debug_overlay(&mut self, enabled: bool) {
        self.lock().set_debug_overlay(enabled);
    }
}
