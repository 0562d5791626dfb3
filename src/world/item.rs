//! Minimal item record referenced by client blocks. This core has no
//! crafting, inventory, or tool-durability concept, so unlike the donor's
//! `ItemRegistry`/`ItemType`/`Tool` hierarchy, this is just enough data to
//! place an item in a chunk and hand it to rendering.

use serde::{Deserialize, Serialize};

use crate::world::chunk::VoxelPos;

pub const DELETED_TEXTURE: &str = "__deleted__";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemRecord {
    pub id: String,
    pub position: VoxelPos,
    pub texture: String,
}

impl ItemRecord {
    pub fn is_deleted(&self) -> bool {
        self.texture == DELETED_TEXTURE
    }
}
