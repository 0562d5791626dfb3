//! Entity data model: models, pathways, and the client-cached entity.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::world::chunk::VoxelPos;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityModel {
    pub id: String,
    #[serde(rename = "notifyOnAttentionRange")]
    pub notify_on_attention_range: Option<f32>,
    /// Fractional reduction applied to the attention range per movement
    /// mode (e.g. crouch lowers detection range).
    #[serde(rename = "stealthReduction", default)]
    pub stealth_reduction: std::collections::HashMap<String, f32>,
}

impl EntityModel {
    pub fn effective_attention_range(&self, movement_mode: &str) -> Option<f32> {
        let base = self.notify_on_attention_range?;
        let reduction = self.stealth_reduction.get(movement_mode).copied().unwrap_or(0.0);
        Some((base * (1.0 - reduction)).max(0.0))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WaypointRotation {
    pub y: f32,
    #[serde(default)]
    pub p: Option<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Waypoint {
    pub target: Vec3,
    pub rotation: WaypointRotation,
    pub timestamp: u64,
    #[serde(default)]
    pub pose: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityPathway {
    pub waypoints: Vec<Waypoint>,
    #[serde(rename = "idlePose", default)]
    pub idle_pose: Option<i32>,
    #[serde(rename = "physicsEnabled", default)]
    pub physics_enabled: bool,
    #[serde(default)]
    pub velocity: Option<Vec3>,
}

/// Base record as returned by `GET /entity/{id}`, before runtime cache
/// bookkeeping (lastAccess, live waypoints) is attached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityRecord {
    pub id: String,
    #[serde(rename = "modelId")]
    pub model_id: String,
    pub position: Vec3,
    #[serde(default)]
    pub rotation: WaypointRotation,
    #[serde(default)]
    pub pose: Option<i32>,
}

/// The client's cached view of one entity, driven by pathway intake and
/// the per-tick interpolator (waypoint mode) or the Entity Physics
/// Controller (physics mode).
#[derive(Debug, Clone)]
pub struct ClientEntity {
    pub id: String,
    pub model_id: String,
    pub position: Vec3,
    pub rotation: WaypointRotation,
    pub pose: Option<i32>,
    pub waypoints: Vec<Waypoint>,
    pub waypoint_index: usize,
    pub physics_enabled: bool,
    pub velocity: Vec3,
    pub visible: bool,
    pub last_access_ms: u64,
    pub last_block_pos: Option<VoxelPos>,
    pub last_step_ms: u64,
}

impl ClientEntity {
    pub fn from_record(record: EntityRecord, now_ms: u64) -> Self {
        ClientEntity {
            id: record.id,
            model_id: record.model_id,
            position: record.position,
            rotation: record.rotation,
            pose: record.pose,
            waypoints: Vec::new(),
            waypoint_index: 0,
            physics_enabled: false,
            velocity: Vec3::ZERO,
            visible: false,
            last_access_ms: now_ms,
            last_block_pos: None,
            last_step_ms: now_ms,
        }
    }

    pub fn touch(&mut self, now_ms: u64) {
        self.last_access_ms = now_ms;
    }

    pub fn current_waypoint(&self) -> Option<&Waypoint> {
        self.waypoints.get(self.waypoint_index)
    }
}
