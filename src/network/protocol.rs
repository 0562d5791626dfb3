//! Wire protocol: envelope, inbound payload DTOs and outbound messages.
//! Grounded on the donor's `network/protocol.rs` (a plain struct of
//! associated constants/helpers) but built around this core's actual
//! message set instead of username/chat validation.

use serde::{Deserialize, Serialize};

use crate::entity::model::EntityPathway;
use crate::world::chunk::VoxelPos;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageType {
    ChunkUpdate,
    BlockUpdate,
    ItemUpdate,
    EntityPathway,
}

/// Inbound envelope: `{t: MessageType, d: payload}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundEnvelope {
    pub t: MessageType,
    pub d: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockDto {
    pub x: i32,
    pub y: i32,
    pub z: i32,
    /// Raw, possibly legacy-numeric or already-canonical block type id.
    #[serde(rename = "blockType")]
    pub block_type: String,
    #[serde(default)]
    pub status: i32,
    #[serde(rename = "modifier", default)]
    pub inline_modifier: Option<crate::block::ModifierOverride>,
}

impl BlockDto {
    pub fn position(&self) -> VoxelPos {
        VoxelPos::new(self.x, self.y, self.z)
    }

    pub fn is_deletion(&self) -> bool {
        self.block_type == "0"
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeightEntryDto {
    pub x: i32,
    pub z: i32,
    #[serde(rename = "maxHeight")]
    pub max_height: Option<i32>,
    #[serde(rename = "groundLevel")]
    pub ground_level: Option<i32>,
    #[serde(rename = "waterLevel")]
    pub water_level: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemDto {
    pub id: String,
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub texture: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BackdropSideDto {
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BackdropDto {
    #[serde(default)]
    pub n: Vec<BackdropSideDto>,
    #[serde(default)]
    pub e: Vec<BackdropSideDto>,
    #[serde(default)]
    pub s: Vec<BackdropSideDto>,
    #[serde(default)]
    pub w: Vec<BackdropSideDto>,
}

/// The inflated body of a compressed chunk payload's `c` field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompressedChunkBody {
    pub blocks: Vec<BlockDto>,
    #[serde(rename = "heightData")]
    pub height_data: Vec<HeightEntryDto>,
    pub backdrop: Option<BackdropDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkDataTransferObject {
    pub cx: i32,
    pub cz: i32,
    #[serde(rename = "b", default)]
    pub blocks: Option<Vec<BlockDto>>,
    #[serde(rename = "h", default)]
    pub height_data: Option<Vec<HeightEntryDto>>,
    #[serde(rename = "i", default)]
    pub items: Option<Vec<ItemDto>>,
    pub backdrop: Option<BackdropDto>,
    /// Base64-encoded gzip of a [`CompressedChunkBody`], when present.
    #[serde(rename = "c", default)]
    pub compressed: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityPathwayMessage {
    #[serde(rename = "entityId")]
    pub entity_id: String,
    #[serde(flatten)]
    pub pathway: EntityPathway,
}

/// `CHUNK_REGISTER {cx, cz, hr, lr}`: subscribe to a neighborhood.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkRegisterMessage {
    pub cx: i32,
    pub cz: i32,
    pub hr: i32,
    pub lr: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EntityInteractionAction {
    EntityProximity,
    EntityCollision,
    HitDuringShortcut,
    FireShortcut,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityInteractionMessage {
    #[serde(rename = "entityId")]
    pub entity_id: String,
    pub ts: u64,
    pub ac: EntityInteractionAction,
    pub pa: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockInteractionMessage {
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub ts: u64,
    pub ac: EntityInteractionAction,
    pub pa: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_update_zero_is_deletion() {
        let dto = BlockDto {
            x: 0,
            y: 0,
            z: 0,
            block_type: "0".to_string(),
            status: 0,
            inline_modifier: None,
        };
        assert!(dto.is_deletion());
    }
}
