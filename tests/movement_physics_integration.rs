// Voxel client core: Movement + Physics integration tests.
//
// Exercises the Block Context Analyzer, Collision Detector, Movement
// Resolver and Physics Service together against small hand-built
// terrains, the way a real client would see them after chunk ingestion.

use std::collections::HashMap;

use glam::Vec3;

use voxel_client_core::block::Direction;
use voxel_client_core::config::ClientConfig;
use voxel_client_core::event::EventHub;
use voxel_client_core::physics::context::{BlockFacets, BlockSource};
use voxel_client_core::physics::entity_state::PhysicsEntity;
use voxel_client_core::physics::service::{ColumnSource, PhysicsService};

struct TestTerrain {
    solid: HashMap<(i32, i32, i32), BlockFacets>,
}

impl TestTerrain {
    fn new() -> Self {
        TestTerrain {
            solid: HashMap::new(),
        }
    }

    fn floor(mut self, x_range: std::ops::RangeInclusive<i32>, z_range: std::ops::RangeInclusive<i32>, y: i32) -> Self {
        for x in x_range {
            for z in z_range.clone() {
                self.solid.insert(
                    (x, y, z),
                    BlockFacets {
                        solid: true,
                        ..BlockFacets::default()
                    },
                );
            }
        }
        self
    }

    fn block_at(mut self, x: i32, y: i32, z: i32, facets: BlockFacets) -> Self {
        self.solid.insert((x, y, z), facets);
        self
    }
}

impl BlockSource for TestTerrain {
    fn facets_at(&self, pos: voxel_client_core::world::chunk::VoxelPos) -> BlockFacets {
        self.solid
            .get(&(pos.x, pos.y, pos.z))
            .copied()
            .unwrap_or_default()
    }
}

impl ColumnSource for TestTerrain {
    fn water_level_at(&self, _x: i32, _z: i32) -> Option<i32> {
        None
    }

    fn chunk_loaded_at(&self, _x: i32, _z: i32) -> bool {
        true
    }
}

#[test]
fn one_way_gate_blocks_disallowed_approach_but_allows_matching_entry() {
    println!("testing one-way gate entry rules (scenario S4)");

    let config = ClientConfig::default();
    let events = EventHub::new();

    // A wall spanning x=9..=11 at z=10, open only through its north face
    // (`passable_from: NORTH`): an entity moving south (+z) enters through
    // that face and passes; one moving north (-z) enters through the
    // south face, which is closed, and is stopped. Spanning three columns
    // means the entity's full footprint always lands on a gated cell
    // regardless of exactly which corner samples which column.
    let mut terrain = TestTerrain::new().floor(0..=20, 0..=20, 63);
    for x in 9..=11 {
        terrain = terrain.block_at(
            x,
            64,
            10,
            BlockFacets {
                solid: true,
                passable_from: Direction::NORTH,
                ..BlockFacets::default()
            },
        );
    }

    let mut physics = PhysicsService::new();
    physics.register(PhysicsEntity::new("walker", Vec3::new(10.4, 64.0, 9.5)));
    physics.set_wish_move("walker", Vec3::new(0.0, 0.0, 1.0), false);
    for _ in 0..10 {
        physics.update(1.0 / 30.0, 0, &config, &terrain, &terrain, &events);
        physics.set_wish_move("walker", Vec3::new(0.0, 0.0, 1.0), false);
    }
    let after_allowed_entry = physics.entity("walker").unwrap().position;
    assert!(
        after_allowed_entry.z > 10.0,
        "entity moving through its passable face should advance past the gate, landed at z={}",
        after_allowed_entry.z
    );

    physics.unregister("walker");
    physics.register(PhysicsEntity::new("walker", Vec3::new(10.4, 64.0, 10.9)));
    physics.set_wish_move("walker", Vec3::new(0.0, 0.0, -1.0), false);
    for _ in 0..10 {
        physics.update(1.0 / 30.0, 0, &config, &terrain, &terrain, &events);
        physics.set_wish_move("walker", Vec3::new(0.0, 0.0, -1.0), false);
    }
    let after_denied_entry = physics.entity("walker").unwrap().position;
    assert!(
        after_denied_entry.z > 10.0,
        "entity entering through a closed face should be stopped at the gate, stalled at z={}",
        after_denied_entry.z
    );
}

#[test]
fn auto_climb_steps_up_a_single_block_but_not_when_disabled() {
    println!("testing auto-climb policy (scenario S5)");

    let config = ClientConfig::default();
    let events = EventHub::new();

    let terrain_climbable = TestTerrain::new()
        .floor(0..=20, 0..=5, 63)
        .block_at(
            5,
            64,
            2,
            BlockFacets {
                solid: true,
                auto_climbable: true,
                ..BlockFacets::default()
            },
        )
        .floor(5..=20, 0..=5, 64);

    let mut physics = PhysicsService::new();
    physics.register(PhysicsEntity::new("climber", Vec3::new(2.0, 64.0, 2.0)));
    for _ in 0..90 {
        physics.set_wish_move("climber", Vec3::new(1.0, 0.0, 0.0), false);
        physics.update(1.0 / 30.0, 0, &config, &terrain_climbable, &terrain_climbable, &events);
    }
    let climbed = physics.entity("climber").unwrap().position;
    assert!(
        climbed.x > 5.0,
        "entity should auto-climb a single autoClimbable step and keep moving, stopped at x={}",
        climbed.x
    );

    let terrain_blocked = TestTerrain::new()
        .floor(0..=20, 0..=5, 63)
        .block_at(
            5,
            64,
            2,
            BlockFacets {
                solid: true,
                auto_climbable: false,
                ..BlockFacets::default()
            },
        );

    let mut physics2 = PhysicsService::new();
    physics2.register(PhysicsEntity::new("blocked", Vec3::new(2.0, 64.0, 2.0)));
    for _ in 0..90 {
        physics2.set_wish_move("blocked", Vec3::new(1.0, 0.0, 0.0), false);
        physics2.update(1.0 / 30.0, 0, &config, &terrain_blocked, &terrain_blocked, &events);
    }
    let halted = physics2.entity("blocked").unwrap().position;
    assert!(
        halted.x < 5.0,
        "entity should be stopped at a non-autoClimbable step, but reached x={}",
        halted.x
    );
}

#[test]
fn gravity_and_ground_contact_settle_a_falling_entity() {
    println!("testing free-fall settling onto solid ground");

    let config = ClientConfig::default();
    let events = EventHub::new();
    let terrain = TestTerrain::new().floor(0..=5, 0..=5, 63);

    let mut physics = PhysicsService::new();
    physics.register(PhysicsEntity::new("faller", Vec3::new(2.0, 70.0, 2.0)));
    for _ in 0..180 {
        physics.update(1.0 / 60.0, 0, &config, &terrain, &terrain, &events);
    }
    let settled = physics.entity("faller").unwrap().position;
    assert!(
        (settled.y - 64.0).abs() < 0.05,
        "falling entity should settle on top of the floor at y=64, landed at y={}",
        settled.y
    );
}
