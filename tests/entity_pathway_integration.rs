// Voxel client core: Entity pathway / interpolation integration tests.
//
// Drives the waypoint interpolator and the distance-LOD entity physics
// controller the way the Entity Service composes them each tick,
// without needing a live REST server to seed the entity cache.

use glam::Vec3;

use voxel_client_core::entity::controller::{self, UpdateRate};
use voxel_client_core::entity::interpolation::{advance_index, interpolate};
use voxel_client_core::entity::model::{Waypoint, WaypointRotation};
use voxel_client_core::physics::context::{BlockFacets, BlockSource, Dimensions};
use voxel_client_core::world::chunk::VoxelPos;

fn waypoint(x: f32, ts: u64) -> Waypoint {
    Waypoint {
        target: Vec3::new(x, 0.0, 0.0),
        rotation: WaypointRotation { y: 0.0, p: None },
        timestamp: ts,
        pose: None,
    }
}

#[test]
fn entity_walks_a_multi_leg_pathway_to_completion() {
    println!("testing multi-leg pathway interpolation (scenario S6, extended)");

    let waypoints = vec![
        waypoint(0.0, 0),
        waypoint(10.0, 1000),
        waypoint(10.0, 1500), // a brief pause at the same spot
        waypoint(0.0, 2500),
    ];

    let mut index = 0usize;
    let mut last_position = Vec3::ZERO;
    for tick_ms in (0..=2500).step_by(100) {
        index = advance_index(&waypoints, index, tick_ms);
        let result = interpolate(&waypoints, index, tick_ms).expect("pathway should resolve a pose");
        last_position = result.position;
    }

    assert!(
        (last_position.x - 0.0).abs() < 1e-3,
        "entity should return to the origin by the end of its pathway, ended at x={}",
        last_position.x
    );

    let index_at_midpoint = advance_index(&waypoints, 0, 500);
    let midpoint = interpolate(&waypoints, index_at_midpoint, 500).unwrap();
    assert!(
        (midpoint.position.x - 5.0).abs() < 1e-2,
        "halfway through the first leg the entity should be halfway there, was at x={}",
        midpoint.position.x
    );
    assert!(
        (midpoint.velocity.x - 10.0).abs() < 1e-1,
        "velocity during the first leg should match the leg's implied speed, was {}",
        midpoint.velocity.x
    );

    let index_during_pause = advance_index(&waypoints, 0, 1250);
    let during_pause = interpolate(&waypoints, index_during_pause, 1250).unwrap();
    assert!(
        (during_pause.velocity.x).abs() < 1e-3,
        "an entity holding at the same target between waypoints should show no velocity, had {}",
        during_pause.velocity.x
    );
}

struct Ledge;

impl BlockSource for Ledge {
    fn facets_at(&self, pos: VoxelPos) -> BlockFacets {
        if pos.y <= 63 {
            BlockFacets {
                solid: true,
                ..BlockFacets::default()
            }
        } else {
            BlockFacets::default()
        }
    }
}

#[test]
fn distance_lod_throttles_ambient_entity_updates() {
    println!("testing distance-based update-rate selection for ambient entities");

    assert_eq!(controller::update_rate_for_distance(5.0), UpdateRate::EveryFrame);
    assert_eq!(controller::update_rate_for_distance(25.0), UpdateRate::EveryOther);
    assert_eq!(controller::update_rate_for_distance(80.0), UpdateRate::EverySixth);

    assert!(controller::should_update_this_tick(UpdateRate::EveryOther, 10));
    assert!(!controller::should_update_this_tick(UpdateRate::EveryOther, 11));
    assert!(controller::should_update_this_tick(UpdateRate::EverySixth, 12));
    assert!(!controller::should_update_this_tick(UpdateRate::EverySixth, 13));
}

#[test]
fn non_avatar_entity_settles_onto_a_ledge_and_decays_momentum() {
    println!("testing lightweight non-avatar physics stepping onto solid ground");

    let dims = Dimensions {
        height: 1.8,
        width: 0.6,
        footprint: 0.5,
    };

    let mut position = Vec3::new(0.0, 64.0, 0.0);
    let mut velocity = Vec3::new(3.0, 0.0, 0.0);
    for _ in 0..60 {
        let (next_position, next_velocity) =
            controller::step(&Ledge, position, velocity, dims, true, 1.0 / 30.0);
        position = next_position;
        velocity = next_velocity;
    }

    assert!(
        (position.y - 64.0).abs() < 1e-3,
        "non-avatar entity should stay pinned to the ledge surface, drifted to y={}",
        position.y
    );
    assert!(
        velocity.x.abs() < 0.01,
        "ground friction should have decayed horizontal velocity to near zero, left at {}",
        velocity.x
    );
}
