//! C8: Entity Service.
//!
//! Cached entity/model registry with lazy REST fetch and LRU+age
//! eviction, pathway-driven waypoint interpolation, and
//! proximity/visibility evaluation.

use std::sync::Arc;

use glam::Vec3;

use crate::config::ClientConfig;
use crate::entity::cache::LruCache;
use crate::entity::controller;
use crate::entity::interpolation::{advance_index, interpolate};
use crate::entity::model::{ClientEntity, EntityModel, EntityPathway};
use crate::error::EngineResult;
use crate::event::{CoreEvent, EventHub};
use crate::network::protocol::{EntityInteractionAction, EntityInteractionMessage};
use crate::network::rest::RestClient;
use crate::physics::context::{BlockSource, Dimensions};
use crate::physics::movement::MovementMode;
use crate::world::chunk::{ChunkPos, VoxelPos};

pub struct EntityService {
    config: ClientConfig,
    rest: Arc<RestClient>,
    models: LruCache<String, EntityModel>,
    entities: LruCache<String, ClientEntity>,
    proximity_state: std::collections::HashSet<String>,
    last_cleanup_ms: u64,
}

impl EntityService {
    pub fn new(config: ClientConfig, rest: Arc<RestClient>) -> Self {
        let entity_cache_size = config.entity_cache_size;
        let model_cache_size = config.entity_model_cache_size;
        EntityService {
            config,
            rest,
            models: LruCache::new(model_cache_size),
            entities: LruCache::new(entity_cache_size),
            proximity_state: std::collections::HashSet::new(),
            last_cleanup_ms: 0,
        }
    }

    pub async fn get_model(&mut self, id: &str, now_ms: u64) -> EngineResult<Option<EntityModel>> {
        if let Some(model) = self.models.get(&id.to_string(), now_ms) {
            return Ok(Some(model.clone()));
        }
        match self.rest.fetch_entity_model(id).await {
            Ok(Some(model)) => {
                self.models.insert(id.to_string(), model.clone(), now_ms);
                Ok(Some(model))
            }
            Ok(None) => Ok(None),
            Err(message) => Err(crate::error::EngineError::NetworkError { message }),
        }
    }

    pub async fn get_entity(&mut self, id: &str, now_ms: u64) -> EngineResult<Option<ClientEntity>> {
        if let Some(entity) = self.entities.get_mut(&id.to_string(), now_ms) {
            return Ok(Some(entity.clone()));
        }
        match self.rest.fetch_entity(id).await {
            Ok(Some(record)) => {
                let entity = ClientEntity::from_record(record, now_ms);
                self.entities.insert(id.to_string(), entity.clone(), now_ms);
                Ok(Some(entity))
            }
            Ok(None) => Ok(None),
            Err(message) => Err(crate::error::EngineError::NetworkError { message }),
        }
    }

    /// Stores an incoming pathway for `entity_id`, lazily fetching the
    /// entity if it isn't cached yet. Physics-based entities with client
    /// physics enabled only take the rotation/velocity hint from the
    /// first waypoint (position snaps only on spawn); waypoint-mode
    /// entities snap directly to the first waypoint's transform.
    pub async fn set_pathway(
        &mut self,
        entity_id: &str,
        pathway: EntityPathway,
        now_ms: u64,
        events: &EventHub,
    ) -> EngineResult<()> {
        if self.entities.get(&entity_id.to_string(), now_ms).is_none() {
            let fetched = self.get_entity(entity_id, now_ms).await?;
            if fetched.is_none() {
                return Ok(());
            }
        }

        let physics_enabled = pathway.physics_enabled;
        let first = pathway.waypoints.first().cloned();

        if let Some(entity) = self.entities.get_mut(&entity_id.to_string(), now_ms) {
            if let Some(v) = pathway.velocity {
                entity.velocity = v;
            }
            if let Some(first) = &first {
                if physics_enabled {
                    entity.rotation = first.rotation.clone();
                    let is_spawn = entity.position == Vec3::ZERO;
                    if is_spawn {
                        entity.position = first.target;
                    }
                } else {
                    entity.position = first.target;
                    entity.rotation = first.rotation.clone();
                    entity.pose = first.pose;
                }
            }
            entity.physics_enabled = physics_enabled;
            entity.waypoints = pathway.waypoints.clone();
            entity.waypoint_index = 0;
        }

        events.publish(CoreEvent::Pathway {
            entity_id: entity_id.to_string(),
            pathway,
        });
        Ok(())
    }

    /// Per-tick update for every cached entity: physics entities delegate
    /// to the Entity Physics Controller, waypoint entities interpolate;
    /// both emit `transform`, evaluate visibility, and evaluate
    /// proximity.
    pub fn update(
        &mut self,
        now_ms: u64,
        dt: f32,
        tick: u64,
        avatar_position: Vec3,
        avatar_movement_mode: MovementMode,
        blocks: &dyn BlockSource,
        events: &EventHub,
        outgoing: &mut Vec<EntityInteractionMessage>,
    ) {
        let ids: Vec<String> = self.entities.keys().cloned().collect();
        for id in ids {
            self.update_one(
                &id,
                now_ms,
                dt,
                tick,
                avatar_position,
                avatar_movement_mode,
                blocks,
                events,
                outgoing,
            );
        }

        if now_ms.saturating_sub(self.last_cleanup_ms) >= self.config.cache_cleanup_interval.as_millis() as u64
        {
            self.last_cleanup_ms = now_ms;
            let timeout = self.config.cache_eviction_timeout.as_millis() as u64;
            let evicted_entities = self.entities.evict_stale(now_ms, timeout);
            for id in evicted_entities {
                events.publish(CoreEvent::Removed { entity_id: id });
            }
            self.models.evict_stale(now_ms, timeout);
        }
    }

    fn update_one(
        &mut self,
        id: &str,
        now_ms: u64,
        dt: f32,
        tick: u64,
        avatar_position: Vec3,
        avatar_movement_mode: MovementMode,
        blocks: &dyn BlockSource,
        events: &EventHub,
        outgoing: &mut Vec<EntityInteractionMessage>,
    ) {
        let Some(entity) = self.entities.get_mut(&id.to_string(), now_ms) else {
            return;
        };

        let dims = Dimensions {
            height: 1.8,
            width: 0.6,
            footprint: 0.6,
        };

        if entity.physics_enabled {
            let distance = entity.position.distance(avatar_position);
            let rate = controller::update_rate_for_distance(distance);
            if controller::should_update_this_tick(rate, tick) {
                let (new_pos, new_vel) =
                    controller::step(blocks, entity.position, entity.velocity, dims, true, dt);
                entity.position = new_pos;
                entity.velocity = new_vel;
            }
        } else if !entity.waypoints.is_empty() {
            entity.waypoint_index = advance_index(&entity.waypoints, entity.waypoint_index, now_ms);
            if let Some(result) = interpolate(&entity.waypoints, entity.waypoint_index, now_ms) {
                entity.position = result.position;
                entity.rotation = result.rotation;
                entity.pose = result.pose;
                entity.velocity = result.velocity;
            }
        }

        let position = entity.position;
        let rotation = entity.rotation.clone();
        let pose = entity.pose;
        let velocity = entity.velocity;
        let model_id = entity.model_id.clone();
        let was_visible = entity.visible;
        let previous_floor = entity.last_block_pos;
        let since_last_step = now_ms.saturating_sub(entity.last_step_ms);
        let physics_enabled = entity.physics_enabled;

        let yaw = rotation.y;
        let quat_rotation =
            glam::Quat::from_axis_angle(Vec3::Y, yaw) * glam::Quat::from_rotation_x(rotation.p.unwrap_or(0.0));

        events.publish(CoreEvent::Transform {
            entity_id: id.to_string(),
            position,
            rotation: quat_rotation,
            pose,
            velocity,
        });

        let distance_to_avatar = position.distance(avatar_position);
        let now_visible = distance_to_avatar <= self.config.visibility_radius;
        if now_visible != was_visible {
            if let Some(e) = self.entities.get_mut(&id.to_string(), now_ms) {
                e.visible = now_visible;
            }
            events.publish(CoreEvent::Visibility {
                entity_id: id.to_string(),
                visible: now_visible,
            });
        }

        // Same 300ms throttle and block-move gate the avatar uses; every
        // ambient entity is treated as grounded per C9, so there's no
        // separate ground-block requirement to exempt swim mode from.
        let new_floor = VoxelPos::from_world_xyz(position.x, position.y, position.z);
        let moved_block = previous_floor
            .map(|p| p.x != new_floor.x || p.z != new_floor.z)
            .unwrap_or(true);
        let horizontal_speed = Vec3::new(velocity.x, 0.0, velocity.z).length();
        if now_visible
            && horizontal_speed > 0.1
            && moved_block
            && since_last_step > self.config.step_throttle.as_millis() as u64
        {
            if let Some(e) = self.entities.get_mut(&id.to_string(), now_ms) {
                e.last_step_ms = now_ms;
            }
            events.publish(CoreEvent::StepOver {
                entity_id: id.to_string(),
                block: VoxelPos::new(new_floor.x, new_floor.y - 1, new_floor.z),
                movement_type: if physics_enabled { "physics" } else { "waypoint" }.to_string(),
            });
        }
        if let Some(e) = self.entities.get_mut(&id.to_string(), now_ms) {
            e.last_block_pos = Some(new_floor);
        }

        self.evaluate_proximity(id, model_id, distance_to_avatar, avatar_movement_mode, now_ms, outgoing);
    }

    fn evaluate_proximity(
        &mut self,
        id: &str,
        model_id: String,
        distance: f32,
        avatar_movement_mode: MovementMode,
        now_ms: u64,
        outgoing: &mut Vec<EntityInteractionMessage>,
    ) {
        let Some(model) = self.models.get(&model_id, now_ms) else {
            return;
        };
        let mode_key = format!("{avatar_movement_mode:?}");
        let Some(range) = model.effective_attention_range(&mode_key) else {
            return;
        };
        let within = distance <= range;
        let was_within = self.proximity_state.contains(id);
        if within && !was_within {
            self.proximity_state.insert(id.to_string());
            outgoing.push(EntityInteractionMessage {
                entity_id: id.to_string(),
                ts: now_ms,
                ac: EntityInteractionAction::EntityProximity,
                pa: None,
            });
        } else if !within && was_within {
            self.proximity_state.remove(id);
        }
    }

    /// Hides (does not evict) every entity whose floor-chunk matches
    /// `pos` when that chunk unloads.
    pub fn on_chunk_unloaded(&mut self, pos: ChunkPos, chunk_size: i32, events: &EventHub, now_ms: u64) {
        let ids: Vec<String> = self.entities.keys().cloned().collect();
        for id in ids {
            if let Some(entity) = self.entities.get_mut(&id, now_ms) {
                let floor = VoxelPos::from_world_xyz(entity.position.x, entity.position.y, entity.position.z);
                if floor.to_chunk_pos(chunk_size) == pos && entity.visible {
                    entity.visible = false;
                    events.publish(CoreEvent::Visibility {
                        entity_id: id,
                        visible: false,
                    });
                }
            }
        }
    }

    pub fn get_entities_in_radius(&mut self, center: Vec3, radius: f32, now_ms: u64) -> Vec<ClientEntity> {
        let ids: Vec<String> = self.entities.keys().cloned().collect();
        ids.into_iter()
            .filter_map(|id| self.entities.get(&id, now_ms).cloned())
            .filter(|e| e.position.distance(center) <= radius)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> EntityService {
        EntityService::new(ClientConfig::default(), Arc::new(RestClient::new_for_tests()))
    }

    #[test]
    fn proximity_fires_once_on_enter() {
        let mut svc = service();
        svc.models.insert(
            "model-a".to_string(),
            EntityModel {
                id: "model-a".to_string(),
                notify_on_attention_range: Some(10.0),
                stealth_reduction: Default::default(),
            },
            0,
        );
        let mut outgoing = Vec::new();
        svc.evaluate_proximity(
            "e1",
            "model-a".to_string(),
            5.0,
            MovementMode::Walk,
            0,
            &mut outgoing,
        );
        assert_eq!(outgoing.len(), 1);
        let mut outgoing2 = Vec::new();
        svc.evaluate_proximity(
            "e1",
            "model-a".to_string(),
            5.0,
            MovementMode::Walk,
            100,
            &mut outgoing2,
        );
        assert!(outgoing2.is_empty());
    }
}
