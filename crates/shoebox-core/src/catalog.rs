//! Static asset catalog: acoustic materials and placeable objects.
//!
//! Loaded once at startup and shared read-only afterwards.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::geometry::Alignment;

/// Material identifier meaning "no material".
pub const MATERIAL_OFF: &str = "off";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialEntry {
    /// Identifier sent to the spatializer.
    pub material_name: String,
    pub display_name: String,
    /// Thumbnail / texture asset.
    pub file_name: String,
}

impl MaterialEntry {
    /// Texture drawn on a painted surface.
    pub fn texture(&self) -> String {
        format!("{}.png", self.material_name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectConfig {
    pub model_name: String,
    pub display_name: String,
    /// Clips the object can play; index 0 is the default.
    pub audio_file: Vec<String>,
    pub allowed_alignments: Vec<Alignment>,
}

impl ObjectConfig {
    pub fn allows(&self, alignment: Alignment) -> bool {
        self.allowed_alignments.contains(&alignment)
    }
}

/// Immutable materials and objects lists.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    materials: Vec<MaterialEntry>,
    objects: Vec<ObjectConfig>,
}

impl Catalog {
    /// Build and validate a catalog.
    pub fn new(materials: Vec<MaterialEntry>, objects: Vec<ObjectConfig>) -> Result<Self> {
        let catalog = Self { materials, objects };
        catalog.validate()?;
        Ok(catalog)
    }

    /// Parse the two JSON arrays.
    pub fn from_json_strs(materials: &str, objects: &str) -> Result<Self> {
        let materials: Vec<MaterialEntry> = serde_json::from_str(materials)?;
        let objects: Vec<ObjectConfig> = serde_json::from_str(objects)?;
        Self::new(materials, objects)
    }

    /// Read and parse the two JSON files.
    pub fn from_paths(materials: impl AsRef<Path>, objects: impl AsRef<Path>) -> Result<Self> {
        let materials = std::fs::read_to_string(materials)?;
        let objects = std::fs::read_to_string(objects)?;
        Self::from_json_strs(&materials, &objects)
    }

    fn validate(&self) -> Result<()> {
        if self.materials.is_empty() {
            return Err(Error::Catalog("material list is empty".into()));
        }

        let mut seen = HashSet::new();
        for entry in &self.materials {
            if entry.material_name.is_empty() {
                return Err(Error::Catalog("material with empty name".into()));
            }
            if !seen.insert(entry.material_name.as_str()) {
                return Err(Error::Catalog(format!(
                    "duplicate material '{}'",
                    entry.material_name
                )));
            }
        }

        for object in &self.objects {
            if object.audio_file.is_empty() {
                return Err(Error::Catalog(format!(
                    "object '{}' has no audio files",
                    object.model_name
                )));
            }
            if object.allowed_alignments.is_empty() {
                return Err(Error::Catalog(format!(
                    "object '{}' allows no plane alignment",
                    object.model_name
                )));
            }
        }
        Ok(())
    }

    pub fn materials(&self) -> &[MaterialEntry] {
        &self.materials
    }

    pub fn objects(&self) -> &[ObjectConfig] {
        &self.objects
    }

    pub fn material(&self, name: &str) -> Option<&MaterialEntry> {
        self.materials.iter().find(|m| m.material_name == name)
    }

    pub fn object(&self, model_name: &str) -> Option<&ObjectConfig> {
        self.objects.iter().find(|o| o.model_name == model_name)
    }
}
