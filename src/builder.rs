//! Builder for configuring and constructing a `ShoeboxEngine`.

use std::path::PathBuf;
use std::sync::Arc;

use shoebox_core::{Catalog, RetainedScene, SceneSink, Spatializer};
use shoebox_graph::{InputBus, RecordingBus, RecordingSpatializer, Recorder};
use tracing::info;

use crate::config::EnvironmentConfig;
use crate::controller::EnvironmentController;
use crate::engine::{instantiate, BusFactory, SpatializerFactory};
use crate::error::{Error, Result};
use crate::ShoeboxEngine;

fn recording_bus() -> Box<dyn InputBus> {
    Box::new(RecordingBus::new())
}

enum CatalogSource {
    Loaded(Catalog),
    Paths { materials: PathBuf, objects: PathBuf },
}

/// A catalog and a spatializer are required. Without a bus or scene the
/// engine records wiring and surfaces in memory.
///
/// # Example
///
/// ```ignore
/// use shoebox::prelude::*;
///
/// let engine = ShoeboxEngine::builder()
///     .config(EnvironmentConfig::from_json(&config_json)?)
///     .catalog(Catalog::from_json_strs(&materials_json, &objects_json)?)
///     .spatializer_factory(|| Ok(Box::new(MySpatializer::new()?) as Box<dyn Spatializer>))
///     .build()?;
/// ```
#[derive(Default)]
pub struct ShoeboxEngineBuilder {
    config: EnvironmentConfig,
    catalog: Option<CatalogSource>,
    spatializer_factory: Option<SpatializerFactory>,
    bus_factory: Option<BusFactory>,
    scene: Option<Box<dyn SceneSink>>,
    recorder: Option<Box<dyn Recorder>>,
}

impl ShoeboxEngineBuilder {
    pub fn config(mut self, config: EnvironmentConfig) -> Self {
        self.config = config;
        self
    }

    pub fn catalog(mut self, catalog: Catalog) -> Self {
        self.catalog = Some(CatalogSource::Loaded(catalog));
        self
    }

    /// Load the catalog from `materials.json` / `objects.json` at build time.
    pub fn catalog_paths(
        mut self,
        materials: impl Into<PathBuf>,
        objects: impl Into<PathBuf>,
    ) -> Self {
        self.catalog = Some(CatalogSource::Paths {
            materials: materials.into(),
            objects: objects.into(),
        });
        self
    }

    /// Called once at build time and again on every session restart.
    pub fn spatializer_factory(
        mut self,
        factory: impl Fn() -> Result<Box<dyn Spatializer>> + Send + Sync + 'static,
    ) -> Self {
        let factory: SpatializerFactory = Arc::new(factory);
        self.spatializer_factory = Some(factory);
        self
    }

    /// Use an in-memory [`RecordingSpatializer`] for every session.
    pub fn headless(self) -> Self {
        self.spatializer_factory(|| Ok(Box::new(RecordingSpatializer::new()) as Box<dyn Spatializer>))
    }

    /// Default: a fresh [`RecordingBus`] per session.
    pub fn bus_factory(
        mut self,
        factory: impl Fn() -> Box<dyn InputBus> + Send + Sync + 'static,
    ) -> Self {
        let factory: BusFactory = Arc::new(factory);
        self.bus_factory = Some(factory);
        self
    }

    /// Default: [`RetainedScene`]
    pub fn scene(mut self, scene: impl SceneSink + 'static) -> Self {
        self.scene = Some(Box::new(scene));
        self
    }

    pub fn recorder(mut self, recorder: impl Recorder + 'static) -> Self {
        self.recorder = Some(Box::new(recorder));
        self
    }

    pub fn build(self) -> Result<ShoeboxEngine> {
        self.config.validate()?;

        let catalog = match self.catalog {
            Some(CatalogSource::Loaded(catalog)) => catalog,
            Some(CatalogSource::Paths { materials, objects }) => {
                Catalog::from_paths(materials, objects)?
            }
            None => {
                return Err(shoebox_core::Error::Catalog("no catalog configured".into()).into())
            }
        };

        let spatializer_factory = self
            .spatializer_factory
            .ok_or_else(|| Error::SpatializerUnavailable("no spatializer configured".into()))?;
        let spatializer = instantiate(&spatializer_factory)?;

        let bus_factory = self
            .bus_factory
            .unwrap_or_else(|| -> BusFactory { Arc::new(recording_bus) });
        let scene = self
            .scene
            .unwrap_or_else(|| -> Box<dyn SceneSink> { Box::new(RetainedScene::new()) });

        let mut controller = EnvironmentController::new(
            self.config,
            Arc::new(catalog),
            spatializer,
            scene,
            bus_factory(),
        );
        if let Some(recorder) = self.recorder {
            controller.set_recorder(recorder);
        }

        info!(
            "Shoebox engine ready: {} materials, {} objects",
            controller.catalog().materials().len(),
            controller.catalog().objects().len()
        );
        Ok(ShoeboxEngine::new(
            controller,
            spatializer_factory,
            bus_factory,
        ))
    }
}
