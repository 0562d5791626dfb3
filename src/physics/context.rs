//! C3: Block Context Analyzer.
//!
//! Produces an 8-category neighborhood snapshot around an entity, used by
//! the Collision Detector and Physics Service to evaluate one-way gates,
//! auto-climb, slopes, and ground state without each querying the world
//! directly.

use std::collections::HashMap;
use std::time::Duration;

use glam::Vec3;

use crate::block::Direction;
use crate::world::chunk::VoxelPos;

/// Resolved physics-relevant facets for one block, already merged
/// (status/inline/world) by the Chunk Service.
#[derive(Debug, Clone, Copy)]
pub struct BlockFacets {
    pub solid: bool,
    pub passable_from: Direction,
    pub resistance: f32,
    pub auto_jump: f32,
    pub auto_move: Vec3,
    pub auto_orientation_y: Option<f32>,
    pub auto_climbable: bool,
    pub corner_heights: Option<[f32; 4]>,
    pub climbable: f32,
    pub collision_event: bool,
}

impl Default for BlockFacets {
    fn default() -> Self {
        BlockFacets {
            solid: false,
            passable_from: Direction::empty(),
            resistance: 0.0,
            auto_jump: 0.0,
            auto_move: Vec3::ZERO,
            auto_orientation_y: None,
            auto_climbable: true,
            corner_heights: None,
            climbable: 0.0,
            collision_event: false,
        }
    }
}

/// Abstraction the Collision Detector and Context Analyzer query instead
/// of holding a back-reference to the Chunk Service, per the donor's
/// "pass IDs/handles, consult a registry" pattern for breaking cyclic
/// chunk/service references.
pub trait BlockSource {
    fn facets_at(&self, pos: VoxelPos) -> BlockFacets;
}

#[derive(Debug, Clone, Default)]
pub struct BlockCategory {
    pub blocks: Vec<(VoxelPos, BlockFacets)>,
    pub has_solid: bool,
    pub all_passable: bool,
    pub all_non_solid: bool,
    pub passable_from: Direction,
    pub resistance: f32,
    pub auto_jump: f32,
    pub auto_move: Vec3,
    pub auto_orientation_y: Option<f32>,
    pub max_height: Option<f32>,
    pub corner_heights: Option<[f32; 4]>,
}

fn aggregate(blocks: Vec<(VoxelPos, BlockFacets)>, include_slope: bool) -> BlockCategory {
    let mut category = BlockCategory {
        all_passable: true,
        all_non_solid: true,
        ..Default::default()
    };
    for (pos, facets) in &blocks {
        category.has_solid |= facets.solid;
        category.all_non_solid &= !facets.solid;
        category.all_passable &= !facets.solid || !facets.passable_from.is_empty();
        category.passable_from = category.passable_from.with(facets.passable_from);
        category.resistance = category.resistance.max(facets.resistance);
        category.auto_jump = category.auto_jump.max(facets.auto_jump);
        category.auto_move = max_abs_sign(category.auto_move, facets.auto_move);
        if facets.auto_orientation_y.is_some() {
            category.auto_orientation_y = facets.auto_orientation_y;
        }
        if include_slope {
            if let Some(corners) = facets.corner_heights {
                let max = corners.iter().cloned().fold(0.0f32, f32::max);
                category.max_height = Some(category.max_height.unwrap_or(0.0).max(max));
                category.corner_heights = Some(corners);
            }
        }
        let _ = pos;
    }
    category.blocks = blocks;
    category
}

fn max_abs_sign(a: Vec3, b: Vec3) -> Vec3 {
    Vec3::new(
        pick_max_abs(a.x, b.x),
        pick_max_abs(a.y, b.y),
        pick_max_abs(a.z, b.z),
    )
}

fn pick_max_abs(a: f32, b: f32) -> f32 {
    if b.abs() > a.abs() {
        b
    } else {
        a
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Cardinal {
    North,
    East,
    South,
    West,
}

impl Cardinal {
    /// Resolves a yaw (radians, 0 = north, increasing clockwise) to the
    /// nearest cardinal via 45° bisectors.
    pub fn from_yaw(yaw: f32) -> Cardinal {
        let two_pi = std::f32::consts::TAU;
        let normalized = yaw.rem_euclid(two_pi);
        let octant = ((normalized / (std::f32::consts::FRAC_PI_2)).round() as i32).rem_euclid(4);
        match octant {
            0 => Cardinal::North,
            1 => Cardinal::East,
            2 => Cardinal::South,
            _ => Cardinal::West,
        }
    }

    fn offset(self) -> (i32, i32) {
        match self {
            Cardinal::North => (0, -1),
            Cardinal::East => (1, 0),
            Cardinal::South => (0, 1),
            Cardinal::West => (-1, 0),
        }
    }

    pub fn entry_direction(self) -> Direction {
        match self {
            Cardinal::North => Direction::SOUTH,
            Cardinal::East => Direction::WEST,
            Cardinal::South => Direction::NORTH,
            Cardinal::West => Direction::EAST,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Dimensions {
    pub height: f32,
    pub width: f32,
    pub footprint: f32,
}

#[derive(Debug, Clone, Default)]
pub struct PlayerBlockContext {
    pub current: BlockCategory,
    pub entering: BlockCategory,
    pub front: BlockCategory,
    pub foot: BlockCategory,
    pub foot_front: BlockCategory,
    pub ground: BlockCategory,
    pub ground_foot: BlockCategory,
    pub head: BlockCategory,
}

/// Four footprint-corner samples around `center`, offset by `footprint`
/// on each horizontal axis and deduplicated (tiny footprints collapse to
/// a single cell).
fn footprint_corners(center: Vec3, footprint: f32) -> Vec<(i32, i32)> {
    let mut corners = vec![
        VoxelPos::from_world_xyz(center.x - footprint, 0.0, center.z - footprint),
        VoxelPos::from_world_xyz(center.x + footprint, 0.0, center.z - footprint),
        VoxelPos::from_world_xyz(center.x + footprint, 0.0, center.z + footprint),
        VoxelPos::from_world_xyz(center.x - footprint, 0.0, center.z + footprint),
    ]
    .into_iter()
    .map(|p| (p.x, p.z))
    .collect::<Vec<_>>();
    corners.sort();
    corners.dedup();
    corners
}

fn column_blocks(
    source: &dyn BlockSource,
    xz: &[(i32, i32)],
    y_start: i32,
    y_end: i32,
) -> Vec<(VoxelPos, BlockFacets)> {
    let mut blocks = Vec::new();
    for &(x, z) in xz {
        for y in y_start..y_end {
            let pos = VoxelPos::new(x, y, z);
            blocks.push((pos, source.facets_at(pos)));
        }
    }
    blocks
}

/// Builds the full 8-category context for an entity standing at
/// `position` (feet) with the given `dimensions` and facing `yaw`.
/// `previous_floor` is the entity's floor position before this step, used
/// to derive `entering`.
pub fn build_context(
    source: &dyn BlockSource,
    position: Vec3,
    dimensions: Dimensions,
    yaw: f32,
    previous_floor: Option<VoxelPos>,
) -> PlayerBlockContext {
    let feet = VoxelPos::from_world_xyz(position.x, position.y, position.z);
    let body_top = (position.y + dimensions.height).ceil() as i32;
    let corners = footprint_corners(position, dimensions.footprint);

    let current = aggregate(column_blocks(source, &corners, feet.y, body_top), false);

    let entering = match previous_floor {
        Some(prev) if prev != feet => {
            aggregate(column_blocks(source, &corners, feet.y, body_top), false)
        }
        _ => BlockCategory::default(),
    };

    let cardinal = Cardinal::from_yaw(yaw);
    let (dx, dz) = cardinal.offset();
    let front_xz: Vec<(i32, i32)> = corners.iter().map(|&(x, z)| (x + dx, z + dz)).collect();
    let front = aggregate(column_blocks(source, &front_xz, feet.y, body_top), false);

    let foot = aggregate(column_blocks(source, &corners, feet.y, feet.y + 1), false);

    let foot_front = aggregate(
        column_blocks(source, &front_xz, feet.y, feet.y + 1),
        true,
    );

    let ground = aggregate(column_blocks(source, &corners, feet.y - 1, feet.y), true);

    let ground_foot = aggregate(
        column_blocks(source, &[(feet.x, feet.z)], feet.y, feet.y + 1),
        true,
    );

    let head = aggregate(column_blocks(source, &corners, body_top - 1, body_top), false);

    PlayerBlockContext {
        current,
        entering,
        front,
        foot,
        foot_front,
        ground,
        ground_foot,
        head,
    }
}

/// 100ms TTL per the spec; cached by `(entityId, floor(x), floor(y), floor(z))`.
pub const CONTEXT_CACHE_TTL: Duration = Duration::from_millis(100);

#[derive(Default)]
pub struct ContextCache {
    entries: HashMap<(String, i32, i32, i32), (PlayerBlockContext, u64)>,
}

impl ContextCache {
    pub fn new() -> Self {
        ContextCache::default()
    }

    pub fn get_or_build<F>(
        &mut self,
        entity_id: &str,
        cell: VoxelPos,
        now_ms: u64,
        build: F,
    ) -> PlayerBlockContext
    where
        F: FnOnce() -> PlayerBlockContext,
    {
        let key = (entity_id.to_string(), cell.x, cell.y, cell.z);
        if let Some((ctx, stamp)) = self.entries.get(&key) {
            if now_ms.saturating_sub(*stamp) <= CONTEXT_CACHE_TTL.as_millis() as u64 {
                return ctx.clone();
            }
        }
        let ctx = build();
        self.entries.insert(key, (ctx.clone(), now_ms));
        ctx
    }

    /// Invalidated explicitly when a block update touches an entity's
    /// cached cell.
    pub fn invalidate(&mut self, entity_id: &str, cell: VoxelPos) {
        self.entries
            .remove(&(entity_id.to_string(), cell.x, cell.y, cell.z));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct AllAir;
    impl BlockSource for AllAir {
        fn facets_at(&self, _pos: VoxelPos) -> BlockFacets {
            BlockFacets::default()
        }
    }

    struct SolidFloor;
    impl BlockSource for SolidFloor {
        fn facets_at(&self, pos: VoxelPos) -> BlockFacets {
            if pos.y < 64 {
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
    fn ground_blocks_detect_solid_floor() {
        let dims = Dimensions {
            height: 1.8,
            width: 0.6,
            footprint: 0.3,
        };
        let ctx = build_context(&SolidFloor, Vec3::new(0.0, 64.0, 0.0), dims, 0.0, None);
        assert!(ctx.ground.has_solid);
        assert!(!ctx.current.has_solid);
    }

    #[test]
    fn cardinal_from_yaw_quadrants() {
        assert!(matches!(Cardinal::from_yaw(0.0), Cardinal::North));
        assert!(matches!(
            Cardinal::from_yaw(std::f32::consts::FRAC_PI_2),
            Cardinal::East
        ));
        assert!(matches!(
            Cardinal::from_yaw(std::f32::consts::PI),
            Cardinal::South
        ));
    }

    #[test]
    fn all_air_has_no_solid_anywhere() {
        let dims = Dimensions {
            height: 1.8,
            width: 0.6,
            footprint: 0.3,
        };
        let ctx = build_context(&AllAir, Vec3::new(0.0, 64.0, 0.0), dims, 0.0, None);
        assert!(!ctx.ground.has_solid);
        assert!(!ctx.head.has_solid);
    }
}
