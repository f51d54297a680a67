//! Source graph integration tests
//!
//! Placement rules, lane renumbering on removal, the silent placeholder
//! and synchronized playback.

use approx::assert_abs_diff_eq;
use proptest::prelude::*;
use shoebox::graph::{BusInput, ProducerEvent, SpatializerCall, TestRecorder, PLAYBACK_START_DELAY};
use shoebox::prelude::*;
use shoebox::{NodeId, Rejection, RouteChange};

#[path = "../helpers/mod.rs"]
mod helpers;
use helpers::tolerances::{FLOAT_EPSILON, GEOMETRY_EPSILON};
use helpers::*;

/// Room 4 x 5 x 2.5 m at yaw 0 with three sources; remove the one on lane 1.
#[test]
fn test_end_to_end_remove_middle_lane() {
    let h = harness_with_room();
    let room = h.room();
    assert_abs_diff_eq!(room.width, 4.0, epsilon = FLOAT_EPSILON);
    assert_abs_diff_eq!(room.height, 2.5, epsilon = FLOAT_EPSILON);
    let front = h
        .engine
        .with_controller(|c| *c.geometry().unwrap().surface(SurfaceName::Front));
    assert_abs_diff_eq!(front.width, 4.0, epsilon = GEOMETRY_EPSILON);
    assert_abs_diff_eq!(front.height, 2.5, epsilon = GEOMETRY_EPSILON);

    let ids: Vec<SourceId> = (1..=3)
        .map(|n| h.engine.place_source(spec(n)).unwrap())
        .collect();
    let lane_one = ids
        .iter()
        .copied()
        .find(|id| h.engine.with_controller(|c| c.graph().lane_of(*id).unwrap()) == 1)
        .unwrap();
    h.spatializer.clear();

    h.engine.remove_source(lane_one).unwrap();

    let lanes = h.engine.with_controller(|c| {
        ids.iter()
            .filter(|id| **id != lane_one)
            .map(|id| c.graph().lane_of(*id).unwrap())
            .collect::<Vec<_>>()
    });
    assert_eq!(lanes, vec![0, 1]);
    assert_eq!(h.count(|c| matches!(c, SpatializerCall::RemoveSource(_))), 1);
    assert_eq!(
        h.calls(),
        vec![
            SpatializerCall::RemoveSource(ids[1]),
            SpatializerCall::SetSourcePosition(ids[0], Vec3::new(1.0, 0.0, -1.0)),
            SpatializerCall::SetSourcePosition(ids[2], Vec3::new(3.0, 0.0, -1.0)),
        ]
    );
    assert_eq!(h.bus.input(1), Some(BusInput::Node(NodeId(3))));
    assert!(!h.bus.is_attached(NodeId(2)));
}

#[test]
fn test_remove_all_restores_placeholder() {
    let h = harness_with_room();
    for n in 1..=3 {
        h.engine.place_source(spec(n)).unwrap();
    }
    h.engine.start_playing().unwrap();
    assert!(h.engine.is_playing());

    assert_eq!(h.engine.remove_all_sources().unwrap(), 3);

    assert_eq!(h.bus.input(0), Some(BusInput::Placeholder));
    assert_eq!(h.bus.lanes().len(), 1);
    assert!(!h.engine.is_playing());
    assert_eq!(h.engine.mode(), EnvironmentMode::Default);
}

#[test]
fn test_unknown_source_is_rejected() {
    let h = harness_with_room();
    h.engine.place_source(spec(1)).unwrap();
    h.spatializer.clear();

    let result = h.engine.remove_source(SourceId(99));
    assert!(matches!(
        result,
        Err(Error::Graph(shoebox::graph::Error::UnknownSource(SourceId(99))))
    ));
    assert!(h.calls().is_empty());
    assert_eq!(h.engine.source_count(), 1);
}

#[test]
fn test_placement_requires_floor() {
    let h = harness();
    assert!(matches!(
        h.engine.place_source(spec(1)),
        Err(Error::Core(shoebox::core::Error::NoFloor))
    ));
    assert_eq!(h.bus.input(0), Some(BusInput::Placeholder));
}

#[test]
fn test_placement_rejected_while_room_is_shown() {
    let h = harness_with_room();
    h.engine.set_visible(true).unwrap();
    assert!(matches!(
        h.engine.place_source(spec(1)),
        Err(Error::Rejected(Rejection::EnvironmentVisible))
    ));

    h.engine.begin_painting().unwrap();
    assert!(matches!(
        h.engine.place_source(spec(1)),
        Err(Error::Rejected(Rejection::Busy(EnvironmentMode::PaintingMaterial)))
    ));
}

#[test]
fn test_place_catalog_object() {
    let h = harness_with_room();
    let position = Vec3::new(0.5, 0.0, -1.0);

    let id = h
        .engine
        .place_object("radio", Box::new(producer(10)), position, Alignment::Horizontal)
        .unwrap();
    let name = h
        .engine
        .with_controller(|c| c.graph().source(id).unwrap().name().to_string());
    assert_eq!(name, "Radio");
    assert!(h.calls().contains(&SpatializerCall::AddSource(id, position)));
    assert!(h
        .calls()
        .contains(&SpatializerCall::SetSourceMinDistanceGain(id, 0.1)));

    assert!(matches!(
        h.engine
            .place_object("radio", Box::new(producer(11)), position, Alignment::Vertical),
        Err(Error::Rejected(Rejection::AlignmentNotAllowed))
    ));
    assert!(matches!(
        h.engine
            .place_object("piano", Box::new(producer(12)), position, Alignment::Horizontal),
        Err(Error::UnknownObject(_))
    ));
}

#[test]
fn test_play_requires_sources() {
    let h = harness_with_room();
    assert!(matches!(
        h.engine.start_playing(),
        Err(Error::Rejected(Rejection::NoSources))
    ));
    assert!(!h.engine.is_playing());
}

#[test]
fn test_playback_starts_synchronized() {
    let h = harness_with_room();
    let a = producer(1);
    let b = producer(2);
    h.engine
        .place_source(SourceSpec::new("a", Box::new(a.clone())))
        .unwrap();
    h.engine
        .place_source(SourceSpec::new("b", Box::new(b.clone())))
        .unwrap();
    h.engine.select_clip(1).unwrap();
    h.engine.toggle_debug().unwrap();
    h.engine.set_visible(true).unwrap();
    h.spatializer.clear();

    h.engine.start_playing().unwrap();

    let (ProducerEvent::Play { clip, start_at }, ProducerEvent::Play { start_at: other, .. }) =
        (a.events()[0], b.events()[0])
    else {
        panic!("expected play events");
    };
    assert_eq!(clip, 1);
    assert_eq!(start_at, other);
    assert!(start_at >= PLAYBACK_START_DELAY);

    // Playing hides the room, clears the overlay and pushes positions
    {
        let scene = h.scene.lock();
        assert!(scene.is_hidden());
        assert!(!scene.debug_overlay());
    }
    assert_eq!(
        h.count(|c| matches!(c, SpatializerCall::SetSourcePosition(..))),
        2
    );
    assert_eq!(h.engine.mode(), EnvironmentMode::Playing);
}

fn is_room_push(call: &SpatializerCall) -> bool {
    matches!(
        call,
        SpatializerCall::SetEnvironmentShoebox { .. }
            | SpatializerCall::SetShoeboxOrigin(_)
            | SpatializerCall::SetShoeboxOrientation { .. }
            | SpatializerCall::SetShoeboxDimensions { .. }
    )
}

#[test]
fn test_room_frozen_while_playing() {
    let h = harness_with_room();
    h.engine.set_locked(false).unwrap();
    h.engine.place_source(spec(1)).unwrap();
    h.engine.start_playing().unwrap();
    let before = h.room();
    h.spatializer.clear();

    let update = h
        .engine
        .on_anchor_updated(AnchorId(1), floor(6.0, 6.0))
        .unwrap();
    assert_eq!(update, shoebox::RoomUpdate::Held);
    assert_eq!(h.room(), before);
    assert_eq!(h.count(is_room_push), 0);
    assert!(!h.engine.with_controller(|c| c.is_locked()));

    assert!(matches!(
        h.engine.set_visible(true),
        Err(Error::Rejected(Rejection::Busy(EnvironmentMode::Playing)))
    ));
}

#[test]
fn test_floor_reacquire_while_playing_keeps_room() {
    let h = harness_with_room();
    h.engine
        .assign_material(SurfaceName::Left, "brick_bare")
        .unwrap();
    h.engine.place_source(spec(1)).unwrap();
    h.engine.start_playing().unwrap();
    let before = h.room();
    h.spatializer.clear();

    h.engine.on_anchor_removed(AnchorId(1)).unwrap();
    let update = h
        .engine
        .on_anchor_added(AnchorId(2), floor_at(6.0, 7.0, -0.2))
        .unwrap();

    assert_eq!(update, shoebox::RoomUpdate::Held);
    assert_eq!(h.room(), before);
    assert_eq!(h.count(is_room_push), 0);
    assert_eq!(
        h.count(|c| matches!(c, SpatializerCall::SetReflectionMaterial { .. })),
        0
    );
    let left = h
        .engine
        .with_controller(|c| c.materials().get(SurfaceName::Left));
    assert_eq!(left.as_str(), "brick_bare");
    assert!(h.engine.is_playing());
}

#[test]
fn test_toggle_play_and_recording() {
    let recorder = TestRecorder::new();
    let h = harness_with_room();
    h.engine
        .with_controller(|c| assert!(!c.graph().is_recording()));
    drop(h);

    // Recorder is wired through the builder
    let engine = ShoeboxEngine::builder()
        .config(test_config())
        .catalog(test_catalog())
        .headless()
        .recorder(recorder.clone())
        .build()
        .unwrap();
    engine.on_anchor_added(AnchorId(1), floor(4.0, 5.0)).unwrap();
    engine.place_source(spec(1)).unwrap();

    assert!(engine.toggle_play().unwrap());
    assert!(recorder.is_active());
    assert!(!engine.toggle_play().unwrap());
    assert!(!recorder.is_active());
    assert_eq!(engine.mode(), EnvironmentMode::Default);

    // Route changes are reported but leave playback alone
    assert!(engine.toggle_play().unwrap());
    engine.handle_route_change(RouteChange::OldDeviceUnavailable);
    assert!(engine.is_playing());
    assert_eq!(recorder.starts(), 2);
}

#[test]
fn test_select_clip_out_of_range() {
    let h = harness_with_room();
    h.engine.place_source(spec(1)).unwrap();
    assert!(matches!(
        h.engine.select_clip(5),
        Err(Error::Graph(shoebox::graph::Error::ClipOutOfRange { clip: 5, available: 2 }))
    ));
}

#[test]
fn test_move_source_clamped_to_listener_range() {
    let h = harness_with_room();
    let id = h.engine.place_source(spec(1)).unwrap();
    h.engine
        .submit_listener_pose(Pose::from_position(Vec3::new(0.0, 1.5, 0.0)));
    h.engine.pump();

    let position = h
        .engine
        .move_source(id, Vec3::new(0.0, 1.5, -30.0), false)
        .unwrap();
    assert_abs_diff_eq!(position.z, -10.0, epsilon = GEOMETRY_EPSILON);
    assert_abs_diff_eq!(position.y, 1.5, epsilon = GEOMETRY_EPSILON);
    h.engine.finish_move(id).unwrap();

    let rotation = h.engine.rotate_source(id, 2.5 * std::f32::consts::PI).unwrap();
    assert_abs_diff_eq!(rotation, 0.5 * std::f32::consts::PI, epsilon = GEOMETRY_EPSILON);

    // Stopped: the spatializer hears about it on the next play
    assert_eq!(
        h.count(|c| matches!(c, SpatializerCall::SetSourcePosition(..))),
        0
    );
}

#[test]
fn test_source_ids_are_not_reused() {
    let h = harness_with_room();
    let first = h.engine.place_source(spec(1)).unwrap();
    h.engine.remove_source(first).unwrap();
    let second = h.engine.place_source(spec(2)).unwrap();
    assert_eq!(first, SourceId(1));
    assert_eq!(second, SourceId(2));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Whatever is placed and removed, lanes stay `0..N-1` and the bus agrees.
    #[test]
    fn prop_engine_lanes_stay_contiguous(
        ops in proptest::collection::vec((any::<bool>(), 0usize..8), 1..24)
    ) {
        let h = harness_with_room();
        let mut live: Vec<SourceId> = Vec::new();
        let mut node = 0;

        for (place, pick) in ops {
            if place || live.is_empty() {
                node += 1;
                live.push(h.engine.place_source(spec(node)).unwrap());
            } else {
                let id = live.remove(pick % live.len());
                h.engine.remove_source(id).unwrap();
            }

            let lanes = h.engine.with_controller(|c| c.graph().lanes());
            prop_assert_eq!(lanes, (0..live.len()).collect::<Vec<_>>());
            if live.is_empty() {
                prop_assert_eq!(h.bus.input(0), Some(BusInput::Placeholder));
            } else {
                prop_assert_eq!(h.bus.lanes().len(), live.len());
            }
        }
    }
}
