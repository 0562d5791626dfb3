//! Voxel-world client engine core.
//!
//! Ingests authoritative chunk/entity state from a remote server over
//! REST and a push wire protocol, resolves it into locally navigable
//! state, and drives per-frame avatar physics and ambient entity
//! simulation. Rendering, audio, input capture, and persistence live
//! outside this crate; see the module docs below for the boundary each
//! one crosses.

pub mod block;
pub mod config;
pub mod entity;
pub mod error;
pub mod event;
pub mod network;
pub mod physics;
pub mod world;

use std::sync::Arc;

use glam::Vec3;

pub use config::ClientConfig;
pub use error::{EngineError, EngineResult};

use crate::block::registry::BlockTypeRegistry;
use crate::entity::model::EntityPathway;
use crate::entity::service::EntityService;
use crate::event::EventHub;
use crate::network::protocol::{
    BlockDto, ChunkDataTransferObject, ChunkRegisterMessage, EntityInteractionMessage,
};
use crate::network::rest::RestClient;
use crate::physics::entity_state::PhysicsEntity;
use crate::physics::service::PhysicsService;
use crate::world::chunk_service::ChunkService;

/// The single cooperative actor described in §5 of the design notes:
/// every public method takes `&mut self`, so the borrow checker rules out
/// the concurrent-mutation hazards the original design had to police at
/// runtime.
pub struct VoxelClient {
    config: ClientConfig,
    rest: Arc<RestClient>,
    registry: Arc<BlockTypeRegistry>,
    chunks: ChunkService,
    physics: PhysicsService,
    entities: EntityService,
    events: EventHub,
    avatar_id: String,
}

impl VoxelClient {
    pub fn new(config: ClientConfig) -> Self {
        let rest = Arc::new(RestClient::new(config.api_root.clone()));
        let registry = Arc::new(BlockTypeRegistry::new(rest.clone()));
        let chunks = ChunkService::new(config.clone(), registry.clone());
        let entities = EntityService::new(config.clone(), rest.clone());

        VoxelClient {
            config,
            rest,
            registry,
            chunks,
            physics: PhysicsService::new(),
            entities,
            events: EventHub::new(),
            avatar_id: "avatar".to_string(),
        }
    }

    pub fn events_mut(&mut self) -> &mut EventHub {
        &mut self.events
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn register_avatar(&mut self, position: Vec3) {
        self.physics
            .register(PhysicsEntity::new(self.avatar_id.clone(), position));
    }

    pub fn set_avatar_wish_move(&mut self, wish_move: Vec3, jump: bool) {
        self.physics.set_wish_move(&self.avatar_id, wish_move, jump);
    }

    pub fn teleport_avatar(&mut self, target: Vec3) {
        self.physics.teleport(&self.avatar_id, target);
    }

    pub fn avatar_position(&self) -> Option<Vec3> {
        self.physics.entity(&self.avatar_id).map(|e| e.position)
    }

    /// Ingests a batch of `CHUNK_UPDATE` payloads.
    pub async fn on_chunk_update(&mut self, dtos: Vec<ChunkDataTransferObject>) -> EngineResult<()> {
        self.chunks.on_chunk_update(dtos, &self.events).await
    }

    /// Ingests a batch of `BLOCK_UPDATE` deltas.
    pub fn on_block_update(&mut self, blocks: Vec<BlockDto>) {
        self.chunks.on_block_update(blocks, &self.events);
    }

    /// Ingests an `ENTITY_PATHWAY` message.
    pub async fn on_entity_pathway(&mut self, entity_id: &str, pathway: EntityPathway, now_ms: u64) -> EngineResult<()> {
        self.entities
            .set_pathway(entity_id, pathway, now_ms, &self.events)
            .await
    }

    /// Requests registration of chunks around the avatar and unloads
    /// chunks outside the unload distance. Returns the outbound
    /// `CHUNK_REGISTER` message the host should send.
    pub fn update_chunk_window(&mut self, world_x: f32, world_z: f32) -> ChunkRegisterMessage {
        self.chunks.update_around(world_x, world_z, &self.events)
    }

    /// Advances the avatar and every ambient entity by one frame.
    /// Returns any `ENTITY_INTERACTION` messages the host should send.
    pub fn update(&mut self, dt: f32, now_ms: u64, tick: u64) -> Vec<EntityInteractionMessage> {
        self.physics
            .update(dt, now_ms, &self.config, &self.chunks, &self.chunks, &self.events);

        let avatar_position = self.avatar_position().unwrap_or(Vec3::ZERO);
        let avatar_movement_mode = self
            .physics
            .entity(&self.avatar_id)
            .map(|e| e.movement_mode)
            .unwrap_or_default();
        let mut outgoing = Vec::new();
        self.entities.update(
            now_ms,
            dt,
            tick,
            avatar_position,
            avatar_movement_mode,
            &self.chunks,
            &self.events,
            &mut outgoing,
        );
        outgoing
    }

    pub fn recalculate_all_modifiers(&mut self) {
        self.chunks.recalculate_all_modifiers(&self.events);
    }

    pub fn registry(&self) -> &Arc<BlockTypeRegistry> {
        &self.registry
    }

    pub fn rest(&self) -> &Arc<RestClient> {
        &self.rest
    }
}
