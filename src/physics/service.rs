//! C6: Physics Service.
//!
//! Per-frame entity stepping: mode dispatch, ground/slope/underwater
//! evaluation, auto-move/auto-jump/auto-orientation application, and
//! `step:over` / `collision` / `underwater:changed` / `position:changed`
//! event emission.

use std::collections::HashMap;

use glam::Vec3;

use crate::config::ClientConfig;
use crate::event::{CoreEvent, EventHub};
use crate::physics::collision::{resolve_collision, resolve_entity_collision};
use crate::physics::context::{build_context, BlockSource, ContextCache};
use crate::physics::entity_state::PhysicsEntity;
use crate::physics::movement::{integrate, MoveInput, MovementMode};
use crate::world::chunk::VoxelPos;

/// Column water-level lookups, kept separate from [`BlockSource`] because
/// the underwater check only needs one scalar per `(x, z)` column rather
/// than a per-block facet query.
pub trait ColumnSource {
    fn water_level_at(&self, x: i32, z: i32) -> Option<i32>;
    fn chunk_loaded_at(&self, x: i32, z: i32) -> bool;
}

pub struct PhysicsService {
    entities: HashMap<String, PhysicsEntity>,
    context_cache: ContextCache,
}

impl PhysicsService {
    pub fn new() -> Self {
        PhysicsService {
            entities: HashMap::new(),
            context_cache: ContextCache::new(),
        }
    }

    pub fn register(&mut self, entity: PhysicsEntity) {
        self.entities.insert(entity.id.clone(), entity);
    }

    pub fn unregister(&mut self, id: &str) {
        self.entities.remove(id);
    }

    pub fn entity(&self, id: &str) -> Option<&PhysicsEntity> {
        self.entities.get(id)
    }

    pub fn set_wish_move(&mut self, id: &str, wish_move: Vec3, jump: bool) {
        if let Some(e) = self.entities.get_mut(id) {
            e.wish_move = wish_move;
            e.jump_requested = jump;
        }
    }

    pub fn teleport(&mut self, id: &str, target: Vec3) {
        if let Some(e) = self.entities.get_mut(id) {
            e.teleport(target);
        }
    }

    /// Steps every registered entity by `dt` seconds.
    pub fn update(
        &mut self,
        dt: f32,
        now_ms: u64,
        config: &ClientConfig,
        blocks: &dyn BlockSource,
        columns: &dyn ColumnSource,
        events: &EventHub,
    ) {
        let ids: Vec<String> = self.entities.keys().cloned().collect();
        for id in ids {
            self.step_entity(&id, dt, now_ms, config, blocks, columns, events);
        }
    }

    fn step_entity(
        &mut self,
        id: &str,
        dt: f32,
        now_ms: u64,
        config: &ClientConfig,
        blocks: &dyn BlockSource,
        columns: &dyn ColumnSource,
        events: &EventHub,
    ) {
        let Some(entity) = self.entities.get(id) else {
            return;
        };

        if let Some(previous_mode) = entity.pending_teleport {
            let floor = entity.floor_pos();
            if columns.chunk_loaded_at(floor.x, floor.z) {
                let e = self.entities.get_mut(id).unwrap();
                e.finish_teleport();
            } else {
                let _ = previous_mode;
                return;
            }
        }

        let entity = self.entities.get(id).unwrap().clone();
        let dimensions = entity.dimensions(config);
        let previous_floor = entity.last_block_pos;

        let cell = entity.floor_pos();
        let context = self.context_cache.get_or_build(id, cell, now_ms, || {
            build_context(
                blocks,
                entity.position,
                dimensions,
                entity.rotation_yaw,
                previous_floor,
            )
        });

        let mut motion = entity.motion;
        let params = config.mode_params(entity.movement_mode);

        let vertical_wish = if params.vertical_wish_enabled {
            if entity.jump_requested {
                1.0
            } else {
                0.0
            }
        } else {
            0.0
        };

        let input = MoveInput {
            wish_move: entity.wish_move,
            vertical_wish,
            jump_requested: entity.jump_requested && !params.vertical_wish_enabled,
            ground_resistance: context.ground.resistance,
            underwater: entity.in_water,
        };

        integrate(
            &mut motion,
            &params,
            &input,
            dt,
            now_ms,
            config.coyote_time.as_millis() as u64,
        );

        if context.ground.auto_jump > 0.0 && motion.grounded {
            motion.velocity.y = motion.velocity.y.max(context.ground.auto_jump);
        }
        if context.foot.auto_move != Vec3::ZERO {
            motion.velocity += context.foot.auto_move;
        }
        let rotation_yaw = context
            .foot
            .auto_orientation_y
            .or(context.ground.auto_orientation_y)
            .unwrap_or(entity.rotation_yaw);

        let wish_position = entity.position + motion.velocity * dt;
        let outcome = resolve_collision(
            blocks,
            entity.position,
            wish_position,
            dimensions,
            config.max_climb_height,
        );

        if outcome.zero_vx {
            motion.velocity.x = 0.0;
        }
        if outcome.zero_vy {
            motion.velocity.y = 0.0;
        }
        if outcome.zero_vz {
            motion.velocity.z = 0.0;
        }
        motion.grounded = outcome.grounded;
        motion.on_slope = outcome.on_slope;

        let mut resolved_position = outcome.position;
        resolved_position.y = resolved_position
            .y
            .clamp(config.world_min_y as f32, config.world_max_y as f32);

        for block in &outcome.collision_events {
            events.publish(CoreEvent::Collision {
                entity_id: id.to_string(),
                block: *block,
            });
        }

        let new_floor = VoxelPos::from_world_xyz(
            resolved_position.x,
            resolved_position.y,
            resolved_position.z,
        );
        let floor_changed = previous_floor != Some(new_floor);

        let mut in_water = entity.in_water;
        if floor_changed {
            if let Some(water_level) = columns.water_level_at(new_floor.x, new_floor.z) {
                let now_under = resolved_position.y < water_level as f32;
                if now_under != in_water {
                    in_water = now_under;
                    events.publish(CoreEvent::UnderwaterChanged {
                        entity_id: id.to_string(),
                        underwater: in_water,
                    });
                }
            }
        }

        let horizontal_speed = Vec3::new(motion.velocity.x, 0.0, motion.velocity.z).length();
        let moved_block = previous_floor.map(|p| p.x != new_floor.x || p.z != new_floor.z).unwrap_or(true);
        let since_last_step = now_ms.saturating_sub(entity.last_step_ms);
        let mut last_step_ms = entity.last_step_ms;
        if horizontal_speed > 0.1
            && motion.grounded
            && moved_block
            && since_last_step > config.step_throttle.as_millis() as u64
        {
            last_step_ms = now_ms;
            events.publish(CoreEvent::StepOver {
                entity_id: id.to_string(),
                block: VoxelPos::new(new_floor.x, new_floor.y - 1, new_floor.z),
                movement_type: format!("{:?}", entity.movement_mode),
            });
        }

        events.publish(CoreEvent::PositionChanged {
            entity_id: id.to_string(),
            position: resolved_position,
        });

        let e = self.entities.get_mut(id).unwrap();
        e.position = resolved_position;
        e.rotation_yaw = rotation_yaw;
        e.motion = motion;
        e.in_water = in_water;
        e.last_block_pos = Some(new_floor);
        e.last_step_ms = last_step_ms;
        e.wish_move = Vec3::ZERO;
        e.jump_requested = false;
    }

    /// Applies entity-vs-entity pushback for `id` against every other
    /// registered entity within `radius`.
    pub fn resolve_entity_pushback(&mut self, id: &str, radius: f32, config: &ClientConfig) {
        let Some(mover) = self.entities.get(id).cloned() else {
            return;
        };
        let mover_dims = mover.dimensions(config);
        let mut total = Vec3::ZERO;
        for (other_id, other) in self.entities.iter() {
            if other_id == id {
                continue;
            }
            if mover.position.distance(other.position) > radius {
                continue;
            }
            let other_dims = other.dimensions(config);
            if let Some(sep) = resolve_entity_collision(
                mover.position,
                mover_dims.footprint,
                mover_dims.height,
                other.position,
                other_dims.footprint,
                other_dims.height,
                true,
            ) {
                total += sep;
            }
        }
        if total != Vec3::ZERO {
            if let Some(e) = self.entities.get_mut(id) {
                e.position += total;
            }
        }
    }
}

impl Default for PhysicsService {
    fn default() -> Self {
        PhysicsService::new()
    }
}
