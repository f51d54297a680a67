//! Per-surface acoustic material mapping.
//!
//! [`MaterialAssignment`] is the only writer of the surface -> material map and
//! keeps it in step with the scene fill and the spatializer's per-path
//! reflection parameter.

use core::fmt;
use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::catalog::{Catalog, MATERIAL_OFF};
use crate::error::Result;
use crate::scene::{SceneSink, SurfaceFill};
use crate::spatializer::{EnvironmentSurface, Spatializer};
use crate::surfaces::SurfaceName;

/// Acoustic material identifier as understood by the spatializer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MaterialId(String);

impl MaterialId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn off() -> Self {
        Self(MATERIAL_OFF.to_string())
    }

    pub fn is_off(&self) -> bool {
        self.0 == MATERIAL_OFF
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for MaterialId {
    fn default() -> Self {
        Self::off()
    }
}

impl fmt::Display for MaterialId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MaterialId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Materials applied whenever a room is created from scratch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultMaterials {
    pub walls: MaterialId,
    pub ceiling: MaterialId,
    pub floor: MaterialId,
}

impl Default for DefaultMaterials {
    fn default() -> Self {
        Self {
            walls: MaterialId::new("heavy_velour"),
            // Same drape as the walls, as the shipped asset table does.
            ceiling: MaterialId::new("heavy_velour"),
            floor: MaterialId::new("carpet_heavy"),
        }
    }
}

impl DefaultMaterials {
    pub fn for_surface(&self, surface: SurfaceName) -> &MaterialId {
        match surface {
            SurfaceName::Ceiling => &self.ceiling,
            SurfaceName::Floor => &self.floor,
            _ => &self.walls,
        }
    }
}

pub struct MaterialAssignment {
    catalog: Arc<Catalog>,
    defaults: DefaultMaterials,
    committed: BTreeMap<SurfaceName, MaterialId>,
    staged: BTreeMap<SurfaceName, MaterialId>,
}

impl MaterialAssignment {
    pub fn new(catalog: Arc<Catalog>, defaults: DefaultMaterials) -> Self {
        Self {
            catalog,
            defaults,
            committed: BTreeMap::new(),
            staged: BTreeMap::new(),
        }
    }

    pub fn defaults(&self) -> &DefaultMaterials {
        &self.defaults
    }

    /// Map a requested material to one the catalog knows, or "off".
    pub fn resolve(&self, material: &str) -> MaterialId {
        if material == MATERIAL_OFF || self.catalog.material(material).is_some() {
            MaterialId::new(material)
        } else {
            warn!("Unknown material '{}', falling back to '{}'", material, MATERIAL_OFF);
            MaterialId::off()
        }
    }

    /// Paint a surface: map, scene fill and spatializer reflection path.
    pub fn assign(
        &mut self,
        surface: SurfaceName,
        material: &str,
        spatializer: &mut dyn Spatializer,
        scene: &mut dyn SceneSink,
    ) -> MaterialId {
        let id = self.resolve(material);
        scene.set_surface_fill(surface, &self.fill_for(&id));
        spatializer.set_environment_shoebox_reflection_material(
            EnvironmentSurface::from(surface).ordinal(),
            id.as_str(),
        );
        debug!("Painted {} with '{}'", surface, id);
        self.committed.insert(surface, id.clone());
        id
    }

    /// [`assign`](Self::assign) addressed by surface name string.
    pub fn assign_named(
        &mut self,
        surface: &str,
        material: &str,
        spatializer: &mut dyn Spatializer,
        scene: &mut dyn SceneSink,
    ) -> Result<MaterialId> {
        let name = surface.parse::<SurfaceName>().inspect_err(|e| {
            warn!("Rejected material assignment: {}", e);
        })?;
        Ok(self.assign(name, material, spatializer, scene))
    }

    /// Committed material of a surface; "off" when never painted.
    pub fn get(&self, surface: SurfaceName) -> MaterialId {
        self.committed.get(&surface).cloned().unwrap_or_default()
    }

    /// Full committed map.
    pub fn snapshot(&self) -> BTreeMap<SurfaceName, MaterialId> {
        self.committed.clone()
    }

    /// Apply the default table to every surface, dropping staged paints.
    pub fn reset(&mut self, spatializer: &mut dyn Spatializer, scene: &mut dyn SceneSink) {
        self.staged.clear();
        for surface in SurfaceName::ALL {
            let material = self.defaults.for_surface(surface).clone();
            self.assign(surface, material.as_str(), spatializer, scene);
        }
    }

    /// Preview a paint in the scene without committing it.
    pub fn stage(
        &mut self,
        surface: SurfaceName,
        material: &str,
        scene: &mut dyn SceneSink,
    ) -> MaterialId {
        let id = self.resolve(material);
        scene.set_surface_fill(surface, &self.fill_for(&id));
        self.staged.insert(surface, id.clone());
        id
    }

    pub fn has_staged(&self) -> bool {
        !self.staged.is_empty()
    }

    pub fn staged(&self, surface: SurfaceName) -> Option<&MaterialId> {
        self.staged.get(&surface)
    }

    /// Assign every staged paint. Returns how many were applied.
    pub fn commit(
        &mut self,
        spatializer: &mut dyn Spatializer,
        scene: &mut dyn SceneSink,
    ) -> usize {
        let staged = std::mem::take(&mut self.staged);
        let count = staged.len();
        for (surface, id) in staged {
            self.assign(surface, id.as_str(), spatializer, scene);
        }
        count
    }

    /// Drop staged paints and restore the committed fills.
    pub fn discard(&mut self, scene: &mut dyn SceneSink) {
        let staged = std::mem::take(&mut self.staged);
        for surface in staged.into_keys() {
            scene.set_surface_fill(surface, &self.fill_for(&self.get(surface)));
        }
    }

    /// Re-send committed fills, e.g. after surfaces were rebuilt.
    pub fn refill(&self, scene: &mut dyn SceneSink) {
        for (surface, id) in &self.committed {
            scene.set_surface_fill(*surface, &self.fill_for(id));
        }
    }

    pub fn fill_for(&self, id: &MaterialId) -> SurfaceFill {
        match self.catalog.material(id.as_str()) {
            Some(entry) if !id.is_off() => SurfaceFill::Texture(entry.texture()),
            _ => SurfaceFill::default(),
        }
    }
}
