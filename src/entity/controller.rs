//! C9: Entity Physics Controller.
//!
//! Lightweight, non-authoritative stepping for non-avatar physics
//! entities. The server owns Y; this only smooths horizontal motion and
//! nudges Y by a one-cell probe so entities don't visibly clip.

use glam::Vec3;

use crate::physics::context::{BlockSource, Dimensions};
use crate::world::chunk::VoxelPos;

pub const GROUND_FRICTION: f32 = 0.8;
pub const AIR_DRAG: f32 = 0.98;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateRate {
    EveryFrame,
    EveryOther,
    EverySixth,
}

/// Distance-LOD update rate relative to the avatar.
pub fn update_rate_for_distance(distance: f32) -> UpdateRate {
    if distance < 20.0 {
        UpdateRate::EveryFrame
    } else if distance < 40.0 {
        UpdateRate::EveryOther
    } else {
        UpdateRate::EverySixth
    }
}

pub fn should_update_this_tick(rate: UpdateRate, tick: u64) -> bool {
    match rate {
        UpdateRate::EveryFrame => true,
        UpdateRate::EveryOther => tick % 2 == 0,
        UpdateRate::EverySixth => tick % 6 == 0,
    }
}

/// Steps one lightweight entity. `grounded` is always asserted back to
/// the caller in this mode: the server is trusted to keep entities on
/// solid ground, so this controller never reports airborne state.
pub fn step(
    source: &dyn BlockSource,
    position: Vec3,
    velocity: Vec3,
    dimensions: Dimensions,
    grounded: bool,
    dt: f32,
) -> (Vec3, Vec3) {
    let drag = if grounded { GROUND_FRICTION } else { AIR_DRAG };
    let mut new_velocity = Vec3::new(velocity.x * drag, 0.0, velocity.z * drag);
    let mut new_position = position + Vec3::new(new_velocity.x, 0.0, new_velocity.z) * dt;
    new_velocity.y = 0.0;

    let feet = VoxelPos::from_world_xyz(new_position.x, new_position.y, new_position.z);
    let at_feet = source.facets_at(feet);
    if at_feet.solid {
        new_position.y = feet.y as f32 + 1.0;
    } else {
        let below = VoxelPos::new(feet.x, feet.y - 1, feet.z);
        if !source.facets_at(below).solid {
            // Neither solid at feet nor below: keep the server-given Y.
        }
    }
    let _ = dimensions;

    (new_position, new_velocity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::context::BlockFacets;

    struct AllAir;
    impl BlockSource for AllAir {
        fn facets_at(&self, _pos: VoxelPos) -> BlockFacets {
            BlockFacets::default()
        }
    }

    #[test]
    fn near_distance_updates_every_frame() {
        assert_eq!(update_rate_for_distance(5.0), UpdateRate::EveryFrame);
    }

    #[test]
    fn far_distance_updates_every_sixth() {
        assert_eq!(update_rate_for_distance(100.0), UpdateRate::EverySixth);
        assert!(should_update_this_tick(UpdateRate::EverySixth, 0));
        assert!(!should_update_this_tick(UpdateRate::EverySixth, 1));
    }

    #[test]
    fn horizontal_velocity_decays_with_ground_friction() {
        let dims = Dimensions {
            height: 1.8,
            width: 0.6,
            footprint: 0.3,
        };
        let (_, v) = step(&AllAir, Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0), dims, true, 1.0);
        assert!((v.x - GROUND_FRICTION).abs() < 1e-6);
    }
}
