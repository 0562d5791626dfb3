//! C4: Collision Detector.
//!
//! Predictive, decomposed (Y then XZ) swept collision against
//! `passableFrom` one-way gates, with auto-climb and semi-solid slope
//! support. Does not mutate the entity beyond the returned result:
//! callers zero velocity components and raise `grounded`/`on_slope`
//! themselves from [`CollisionOutcome`].

use glam::Vec3;

use crate::block::Direction;
use crate::block::surface::interpolate_surface_height;
use crate::physics::context::{BlockFacets, BlockSource, Dimensions};
use crate::world::chunk::VoxelPos;

#[derive(Debug, Clone, Default)]
pub struct CollisionOutcome {
    pub position: Vec3,
    pub zero_vx: bool,
    pub zero_vy: bool,
    pub zero_vz: bool,
    pub grounded: bool,
    pub on_slope: bool,
    pub collision_events: Vec<VoxelPos>,
}

fn footprint_corners(x: f32, z: f32, footprint: f32) -> [(f32, f32); 4] {
    [
        (x - footprint, z - footprint),
        (x + footprint, z - footprint),
        (x + footprint, z + footprint),
        (x - footprint, z + footprint),
    ]
}

fn movement_directions(dx: f32, dz: f32) -> Direction {
    let mut dirs = Direction::empty();
    if dx > 1e-6 {
        dirs = dirs.with(Direction::EAST);
    }
    if dx < -1e-6 {
        dirs = dirs.with(Direction::WEST);
    }
    if dz > 1e-6 {
        dirs = dirs.with(Direction::SOUTH);
    }
    if dz < -1e-6 {
        dirs = dirs.with(Direction::NORTH);
    }
    dirs
}

/// Moving in direction `d` means crossing into the block through the face
/// opposite `d` (moving south, toward +z, enters through the block's
/// north face), so `passableFrom` must be checked against the entry face,
/// not the direction of travel. Only called with the horizontal tags
/// `movement_directions` produces; the vertical axis checks `passableFrom`
/// against the travel direction directly (see `resolve_collision`).
fn entry_face(dirs: Direction) -> Direction {
    let mut entry = Direction::empty();
    if dirs.contains(Direction::NORTH) {
        entry = entry.with(Direction::SOUTH);
    }
    if dirs.contains(Direction::SOUTH) {
        entry = entry.with(Direction::NORTH);
    }
    if dirs.contains(Direction::EAST) {
        entry = entry.with(Direction::WEST);
    }
    if dirs.contains(Direction::WEST) {
        entry = entry.with(Direction::EAST);
    }
    entry
}

/// A wall/one-way-gated block is passable only if it can be entered from
/// *every* face the movement implies (diagonals imply two).
fn passable_for_directions(facets: &BlockFacets, dirs: Direction) -> bool {
    if !facets.solid {
        return true;
    }
    if facets.passable_from.is_empty() {
        return false;
    }
    entry_face(dirs).iter().all(|d| facets.passable_from.contains(d))
}

pub fn resolve_collision(
    source: &dyn BlockSource,
    position: Vec3,
    wish_position: Vec3,
    dimensions: Dimensions,
    max_climb_height: f32,
) -> CollisionOutcome {
    let mut outcome = CollisionOutcome {
        position,
        ..Default::default()
    };

    // --- Vertical axis ---
    let mut y = position.y;
    let target_y = wish_position.y;
    let mut events = Vec::new();

    if target_y > y {
        let head_y = (y + dimensions.height).floor() as i32;
        let mut blocked = false;
        for (cx, cz) in footprint_corners(position.x, position.z, dimensions.footprint) {
            let pos = VoxelPos::new(cx.floor() as i32, head_y, cz.floor() as i32);
            let facets = source.facets_at(pos);
            if facets.collision_event {
                events.push(pos);
            }
            if facets.solid && !facets.passable_from.contains(Direction::UP) {
                blocked = true;
            }
        }
        y = if blocked {
            (head_y as f32) - dimensions.height
        } else {
            target_y
        };
        outcome.zero_vy = blocked;
    } else if target_y < y {
        let foot_y = target_y.floor() as i32;
        let mut blocked = false;
        let mut grounded = false;
        let mut on_slope = false;
        let mut slope_y = None;
        for (cx, cz) in footprint_corners(position.x, position.z, dimensions.footprint) {
            let pos = VoxelPos::new(cx.floor() as i32, foot_y, cz.floor() as i32);
            let facets = source.facets_at(pos);
            if facets.collision_event {
                events.push(pos);
            }
            if facets.solid && !facets.passable_from.contains(Direction::DOWN) {
                blocked = true;
                grounded = true;
            } else if let Some(corners) = facets.corner_heights {
                let fx = cx - cx.floor();
                let fz = cz - cz.floor();
                let surface = foot_y as f32 + interpolate_surface_height(corners, fx, fz);
                slope_y = Some(slope_y.unwrap_or(f32::MIN).max(surface));
                on_slope = true;
            }
        }
        if blocked {
            y = (foot_y as f32) + 1.0;
        } else if let Some(surface) = slope_y {
            if target_y < surface {
                y = surface;
                grounded = true;
            } else {
                y = target_y;
                on_slope = false;
            }
        } else {
            y = target_y;
        }
        outcome.zero_vy = blocked || grounded;
        outcome.grounded = grounded;
        outcome.on_slope = on_slope && !grounded;
    } else {
        y = target_y;
    }

    // --- Horizontal axes (predictive, not iterative) ---
    let dx = wish_position.x - position.x;
    let dz = wish_position.z - position.z;
    let dirs = movement_directions(dx, dz);

    let mut blocked_h = false;
    if !dirs.is_empty() {
        let y_start = y.floor() as i32;
        let y_end = (y + dimensions.height).ceil() as i32;
        'corners: for (cx, cz) in footprint_corners(wish_position.x, wish_position.z, dimensions.footprint) {
            for cell_y in y_start..y_end {
                let pos = VoxelPos::new(cx.floor() as i32, cell_y, cz.floor() as i32);
                let facets = source.facets_at(pos);
                if !facets.solid {
                    continue;
                }
                if facets.collision_event {
                    events.push(pos);
                }
                if passable_for_directions(&facets, dirs) {
                    continue;
                }
                if cell_y == y_start {
                    let height_diff = (cell_y as f32 + 1.0) - y;
                    if height_diff <= max_climb_height {
                        continue;
                    }
                    // A full one-block step is climbable by default (tall
                    // entities vault it); an explicit autoClimbable=false
                    // always blocks regardless of height.
                    if height_diff <= 1.0 && facets.auto_climbable {
                        continue;
                    }
                }
                blocked_h = true;
                break 'corners;
            }
        }
    }

    outcome.position = if blocked_h {
        outcome.zero_vx = true;
        outcome.zero_vz = true;
        Vec3::new(position.x, y, position.z)
    } else {
        Vec3::new(wish_position.x, y, wish_position.z)
    };
    outcome.collision_events = events;
    outcome
}

/// Circle-vs-circle (XZ) + Y-interval entity/entity pushback. Returns the
/// separation to apply to `mover` if it overlaps `other` and `other` is
/// solid.
pub fn resolve_entity_collision(
    mover_pos: Vec3,
    mover_radius: f32,
    mover_height: f32,
    other_pos: Vec3,
    other_radius: f32,
    other_height: f32,
    other_solid: bool,
) -> Option<Vec3> {
    let dx = mover_pos.x - other_pos.x;
    let dz = mover_pos.z - other_pos.z;
    let dist_sq = dx * dx + dz * dz;
    let combined = mover_radius + other_radius;
    if dist_sq >= combined * combined {
        return None;
    }
    let y_overlap =
        mover_pos.y < other_pos.y + other_height && other_pos.y < mover_pos.y + mover_height;
    if !y_overlap || !other_solid {
        return None;
    }
    let dist = dist_sq.sqrt().max(1e-4);
    let overlap = combined - dist;
    Some(Vec3::new(dx / dist * overlap, 0.0, dz / dist * overlap))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Solid(VoxelPos);
    impl BlockSource for Solid {
        fn facets_at(&self, pos: VoxelPos) -> BlockFacets {
            if pos == self.0 {
                BlockFacets {
                    solid: true,
                    ..BlockFacets::default()
                }
            } else {
                BlockFacets::default()
            }
        }
    }

    struct OneWay(VoxelPos, Direction);
    impl BlockSource for OneWay {
        fn facets_at(&self, pos: VoxelPos) -> BlockFacets {
            if pos == self.0 {
                BlockFacets {
                    solid: true,
                    passable_from: self.1,
                    ..BlockFacets::default()
                }
            } else {
                BlockFacets::default()
            }
        }
    }

    fn dims() -> Dimensions {
        Dimensions {
            height: 1.8,
            width: 0.6,
            footprint: 0.3,
        }
    }

    #[test]
    fn solid_ground_grounds_entity() {
        let source = Solid(VoxelPos::new(0, 63, 0));
        let outcome = resolve_collision(
            &source,
            Vec3::new(0.0, 64.0, 0.0),
            Vec3::new(0.0, 63.5, 0.0),
            dims(),
            0.1,
        );
        assert!(outcome.grounded);
        assert!(outcome.position.y >= 64.0);
    }

    #[test]
    fn one_way_gate_blocks_disallowed_entry() {
        // Block at x=1 passable only from NORTH; moving east (+x) enters
        // through the west face, which isn't open, so it must be blocked.
        let source = OneWay(VoxelPos::new(1, 64, 0), Direction::NORTH);
        let outcome = resolve_collision(
            &source,
            Vec3::new(0.4, 64.0, 0.0),
            Vec3::new(1.4, 64.0, 0.0),
            dims(),
            0.1,
        );
        assert!(outcome.zero_vx);
    }

    #[test]
    fn one_way_gate_allows_matching_entry() {
        // Moving east (+x) enters the block through its west face.
        let source = OneWay(VoxelPos::new(1, 64, 0), Direction::WEST);
        let outcome = resolve_collision(
            &source,
            Vec3::new(0.4, 64.0, 0.0),
            Vec3::new(1.4, 64.0, 0.0),
            dims(),
            0.1,
        );
        assert!(!outcome.zero_vx);
    }

    #[test]
    fn entity_overlap_pushes_apart() {
        let sep = resolve_entity_collision(
            Vec3::new(0.0, 0.0, 0.0),
            0.5,
            1.8,
            Vec3::new(0.5, 0.0, 0.0),
            0.5,
            1.8,
            true,
        );
        assert!(sep.is_some());
    }

    #[test]
    fn no_push_when_far_apart() {
        let sep = resolve_entity_collision(
            Vec3::new(0.0, 0.0, 0.0),
            0.5,
            1.8,
            Vec3::new(5.0, 0.0, 0.0),
            0.5,
            1.8,
            true,
        );
        assert!(sep.is_none());
    }
}
