//! Engine lifecycle integration tests
//!
//! Tests engine construction, catalog loading, the threading surface
//! (listener coalescing, material picker) and session restart.

use std::io::Write;
use std::sync::Arc;

use parking_lot::Mutex;
use shoebox::graph::{BusInput, SpatializerCall};
use shoebox::prelude::*;
use shoebox::{PaintRequest, RecordingSpatializer, Rejection};

#[path = "../helpers/mod.rs"]
mod helpers;
use helpers::*;

fn json_file(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn test_engine_from_catalog_files() {
    let materials = json_file(MATERIALS_JSON);
    let objects = json_file(OBJECTS_JSON);

    let engine = ShoeboxEngine::builder()
        .catalog_paths(materials.path(), objects.path())
        .headless()
        .build()
        .unwrap();

    let count = engine.with_controller(|c| c.catalog().materials().len());
    assert_eq!(count, 4);
    assert_eq!(engine.mode(), EnvironmentMode::Default);
}

#[test]
fn test_malformed_catalog_is_fatal() {
    let materials = json_file(r#"[{ "materialName": "heavy_velour" "#);
    let objects = json_file(OBJECTS_JSON);

    let result = ShoeboxEngine::builder()
        .catalog_paths(materials.path(), objects.path())
        .headless()
        .build();
    assert!(matches!(
        result,
        Err(Error::Core(shoebox::core::Error::Json(_)))
    ));
}

#[test]
fn test_missing_catalog_file_is_fatal() {
    let objects = json_file(OBJECTS_JSON);
    let result = ShoeboxEngine::builder()
        .catalog_paths("/nonexistent/materials.json", objects.path())
        .headless()
        .build();
    assert!(matches!(result, Err(Error::Core(shoebox::core::Error::Io(_)))));
}

#[test]
fn test_empty_material_list_is_rejected() {
    let result = Catalog::from_json_strs("[]", OBJECTS_JSON);
    assert!(matches!(result, Err(shoebox::core::Error::Catalog(_))));
}

#[test]
fn test_listener_poses_are_coalesced() {
    let h = harness();

    for z in [1.0, 2.0, 3.0] {
        h.engine
            .submit_listener_pose(Pose::from_position(Vec3::new(0.0, 1.6, z)));
    }
    let stats = h.engine.pump();

    assert!(stats.listener_applied);
    let positions: Vec<_> = h
        .calls()
        .into_iter()
        .filter_map(|call| match call {
            SpatializerCall::SetListenerPosition(p) => Some(p),
            _ => None,
        })
        .collect();
    assert_eq!(positions, vec![Vec3::new(0.0, 1.6, 3.0)]);
    assert_eq!(
        h.count(|c| matches!(c, SpatializerCall::SetListenerOrientation { .. })),
        1
    );

    // Nothing pending
    assert_eq!(h.engine.pump(), Default::default());
}

#[test]
fn test_listener_orientation_is_yaw_pitch_roll() {
    let h = harness();
    let yaw = 0.7;
    h.engine
        .submit_listener_pose(Pose::from_yaw(Vec3::ZERO, yaw));
    h.engine.pump();

    let orientation = h
        .calls()
        .into_iter()
        .find_map(|call| match call {
            SpatializerCall::SetListenerOrientation { yaw, pitch, roll } => Some((yaw, pitch, roll)),
            _ => None,
        })
        .unwrap();
    approx::assert_abs_diff_eq!(orientation.0, yaw, epsilon = tolerances::GEOMETRY_EPSILON);
    approx::assert_abs_diff_eq!(orientation.1, 0.0, epsilon = tolerances::GEOMETRY_EPSILON);
    approx::assert_abs_diff_eq!(orientation.2, 0.0, epsilon = tolerances::GEOMETRY_EPSILON);
}

#[test]
fn test_material_picker_from_another_thread() {
    let h = harness_with_room();
    h.engine.begin_painting().unwrap();

    let picker = h.engine.material_picker();
    std::thread::spawn(move || {
        picker.send(PaintRequest::new("LEFT", "brick_bare")).unwrap();
        picker.send(PaintRequest::new("SIDE", "brick_bare")).unwrap();
    })
    .join()
    .unwrap();

    let stats = h.engine.pump();
    assert_eq!(stats.paints_applied, 1);
    assert_eq!(stats.paints_rejected, 1);
}

#[test]
fn test_engine_is_shareable_across_threads() {
    let h = harness_with_room();
    let engine = Arc::new(h.engine);

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let engine = Arc::clone(&engine);
            std::thread::spawn(move || {
                engine.submit_listener_pose(Pose::from_position(Vec3::new(i as f32, 1.6, 0.0)));
                engine.pump();
                engine.place_source(spec(i)).map(|_| ())
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap().unwrap();
    }

    assert_eq!(engine.source_count(), 4);
    let lanes = engine.with_controller(|c| c.graph().lanes());
    assert_eq!(lanes, vec![0, 1, 2, 3]);
}

#[test]
fn test_spatializer_loss_latches_until_restart() {
    let spawned: Arc<Mutex<Vec<RecordingSpatializer>>> = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&spawned);
    let engine = ShoeboxEngine::builder()
        .config(test_config())
        .catalog(test_catalog())
        .spatializer_factory(move || {
            let spatializer = RecordingSpatializer::new();
            log.lock().push(spatializer.clone());
            Ok(Box::new(spatializer) as Box<dyn Spatializer>)
        })
        .build()
        .unwrap();

    engine.on_anchor_added(AnchorId(1), floor(4.0, 5.0)).unwrap();
    spawned.lock()[0].invalidate();

    assert!(matches!(engine.place_source(spec(1)), Err(Error::SpatializerLost)));
    assert!(matches!(
        engine.on_anchor_updated(AnchorId(1), floor(4.5, 5.0)),
        Err(Error::SpatializerLost)
    ));
    assert!(engine.with_controller(|c| c.is_lost()));

    engine.restart_session().unwrap();
    assert_eq!(spawned.lock().len(), 2);
    assert!(!engine.with_controller(|c| c.is_lost()));
    assert!(engine.room().is_none());

    // The fresh session starts over from the first floor
    engine.on_anchor_added(AnchorId(7), floor(4.0, 5.0)).unwrap();
    assert_eq!(
        spawned.lock()[1].calls()[0],
        SpatializerCall::SetEnvironmentShoebox {
            width: 10.0,
            length: 5.0,
            height: 10.0
        }
    );
    assert_eq!(engine.place_source(spec(1)).unwrap(), SourceId(1));
}

#[test]
fn test_cancel_after_spatializer_loss_is_rejected() {
    let h = harness_with_room();
    h.engine.begin_painting().unwrap();
    h.engine.paint(SurfaceName::Floor, "plywood_panel").unwrap();
    h.spatializer.invalidate();
    h.spatializer.clear();

    assert!(matches!(h.engine.cancel(), Err(Error::SpatializerLost)));
    assert!(h.calls().is_empty());
    assert_eq!(h.engine.mode(), EnvironmentMode::PaintingMaterial);
}

#[test]
fn test_restart_clears_session() {
    let h = harness_with_room();
    for n in 0..3 {
        h.engine.place_source(spec(n)).unwrap();
    }
    h.engine.set_locked(true).unwrap();

    h.engine.restart_session().unwrap();

    assert_eq!(h.engine.source_count(), 0);
    assert!(h.engine.room().is_none());
    assert_eq!(h.engine.height(), TEST_HEIGHT);
    assert_eq!(h.bus.input(0), Some(BusInput::Placeholder));
    h.engine.with_controller(|c| {
        assert!(!c.is_locked());
        assert!(c.floors().is_empty());
    });
    assert_eq!(h.count(|c| matches!(c, SpatializerCall::RemoveSource(_))), 3);
}

#[test]
fn test_restart_rejected_while_playing() {
    let h = harness_with_room();
    h.engine.place_source(spec(1)).unwrap();
    h.engine.start_playing().unwrap();

    assert!(matches!(
        h.engine.restart_session(),
        Err(Error::Rejected(Rejection::Busy(EnvironmentMode::Playing)))
    ));
    assert_eq!(h.engine.source_count(), 1);
}
