//! Physics-entity state: the record the Physics Service steps each frame.

use glam::Vec3;

use crate::config::ClientConfig;
use crate::physics::context::Dimensions;
use crate::physics::movement::{MotionState, MovementMode};
use crate::world::chunk::VoxelPos;

#[derive(Debug, Clone)]
pub struct PhysicsEntity {
    pub id: String,
    pub position: Vec3,
    pub rotation_yaw: f32,
    pub motion: MotionState,
    pub wish_move: Vec3,
    pub jump_requested: bool,
    pub movement_mode: MovementMode,
    pub in_water: bool,
    pub last_block_pos: Option<VoxelPos>,
    pub last_step_ms: u64,
    /// Set by `teleport`; physics is gated until the destination chunk
    /// reports loaded, at which point the previous mode is restored.
    pub pending_teleport: Option<MovementMode>,
}

impl PhysicsEntity {
    pub fn new(id: impl Into<String>, position: Vec3) -> Self {
        PhysicsEntity {
            id: id.into(),
            position,
            rotation_yaw: 0.0,
            motion: MotionState::default(),
            wish_move: Vec3::ZERO,
            jump_requested: false,
            movement_mode: MovementMode::Walk,
            in_water: false,
            last_block_pos: None,
            last_step_ms: 0,
            pending_teleport: None,
        }
    }

    pub fn dimensions(&self, config: &ClientConfig) -> Dimensions {
        let params = config.mode_params(self.movement_mode);
        Dimensions {
            height: params.height,
            width: params.width,
            footprint: params.footprint,
        }
    }

    pub fn floor_pos(&self) -> VoxelPos {
        VoxelPos::from_world_xyz(self.position.x, self.position.y, self.position.z)
    }

    pub fn teleport(&mut self, target: Vec3) {
        self.pending_teleport = Some(self.movement_mode);
        self.movement_mode = MovementMode::Teleport;
        self.position = target;
        self.motion.velocity = Vec3::ZERO;
    }

    /// Called once the destination chunk reports `isLoaded` with height
    /// data; restores whatever mode was active before the teleport.
    pub fn finish_teleport(&mut self) {
        if let Some(previous) = self.pending_teleport.take() {
            self.movement_mode = previous;
        }
    }
}
