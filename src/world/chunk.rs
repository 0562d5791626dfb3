//! Chunk-local data model: coordinates, the client-side block view, height
//! columns, and the chunk itself.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::block::{BlockType, BlockTypeId, Modifier, ModifierOverride};
use crate::world::item::ItemRecord;

/// Column coordinate identifying one chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChunkPos {
    pub cx: i32,
    pub cz: i32,
}

impl ChunkPos {
    pub fn new(cx: i32, cz: i32) -> Self {
        ChunkPos { cx, cz }
    }

    /// Chebyshev distance, used by the sliding-window unload rule.
    pub fn chebyshev_distance(self, other: ChunkPos) -> i32 {
        (self.cx - other.cx).abs().max((self.cz - other.cz).abs())
    }
}

/// World-space voxel coordinate (integer block position).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VoxelPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

/// A position identifying a block involved in a step/collision event.
pub type ClientBlockPosition = VoxelPos;

impl VoxelPos {
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        VoxelPos { x, y, z }
    }

    /// Floor-divides by `chunk_size` on the horizontal axes, matching the
    /// spec's "floor, Euclidean remainder" world-to-chunk conversion.
    pub fn to_chunk_pos(self, chunk_size: i32) -> ChunkPos {
        ChunkPos {
            cx: self.x.div_euclid(chunk_size),
            cz: self.z.div_euclid(chunk_size),
        }
    }

    /// Local coordinates within the owning chunk, always in `[0, chunk_size)`.
    pub fn to_local_xz(self, chunk_size: i32) -> (i32, i32) {
        (self.x.rem_euclid(chunk_size), self.z.rem_euclid(chunk_size))
    }

    pub fn from_world_xyz(x: f32, y: f32, z: f32) -> Self {
        VoxelPos {
            x: x.floor() as i32,
            y: y.floor() as i32,
            z: z.floor() as i32,
        }
    }
}

/// The client-side materialization of a [`Block`](crate::network::protocol::BlockDto):
/// resolved type, merged modifier, and bookkeeping flags.
#[derive(Debug, Clone)]
pub struct ClientBlock {
    pub position: VoxelPos,
    pub block_type: BlockType,
    pub status: i32,
    pub inline_override: Option<ModifierOverride>,
    pub current_modifier: Modifier,
    pub visible: bool,
    pub dirty: bool,
    pub last_update_ms: u64,
    pub item: Option<ItemRecord>,
}

impl ClientBlock {
    pub fn is_item(&self) -> bool {
        self.item.is_some()
    }
}

/// Water shapes whose presence raises a column's `water_level`, per §3.
pub const WATER_SHAPES: &[&str] = &["ocean", "water", "river", "ocean_maelstrom", "ocean_coast"];

#[derive(Debug, Clone)]
pub struct HeightColumn {
    pub x: i32,
    pub z: i32,
    pub max_height: i32,
    pub min_height: i32,
    pub ground_level: i32,
    pub water_level: Option<i32>,
}

impl HeightColumn {
    pub fn world_bound_default(x: i32, z: i32, world_min_y: i32, world_max_y: i32) -> Self {
        HeightColumn {
            x,
            z,
            max_height: world_max_y,
            min_height: world_min_y,
            ground_level: world_min_y,
            water_level: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackdropSideEntry {
    #[serde(rename = "type")]
    pub kind: String,
}

impl BackdropSideEntry {
    pub fn none() -> Self {
        BackdropSideEntry {
            kind: "none".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Backdrop {
    pub n: Vec<BackdropSideEntry>,
    pub e: Vec<BackdropSideEntry>,
    pub s: Vec<BackdropSideEntry>,
    pub w: Vec<BackdropSideEntry>,
}

fn normalize_side(side: Vec<BackdropSideEntry>) -> Vec<BackdropSideEntry> {
    if side.is_empty() {
        vec![BackdropSideEntry::none()]
    } else {
        side
    }
}

impl Backdrop {
    pub fn normalized(self) -> Self {
        Backdrop {
            n: normalize_side(self.n),
            e: normalize_side(self.e),
            s: normalize_side(self.s),
            w: normalize_side(self.w),
        }
    }
}

/// The client's in-memory view of one loaded chunk.
#[derive(Debug, Clone)]
pub struct Chunk {
    pub pos: ChunkPos,
    pub chunk_size: i32,
    pub blocks: HashMap<VoxelPos, ClientBlock>,
    pub height_columns: HashMap<(i32, i32), HeightColumn>,
    pub status: HashMap<VoxelPos, i32>,
    pub backdrop: Backdrop,
    pub is_loaded: bool,
    pub is_rendered: bool,
}

impl Chunk {
    pub fn new(pos: ChunkPos, chunk_size: i32) -> Self {
        Chunk {
            pos,
            chunk_size,
            blocks: HashMap::new(),
            height_columns: HashMap::new(),
            status: HashMap::new(),
            backdrop: Backdrop::default(),
            is_loaded: false,
            is_rendered: false,
        }
    }

    pub fn get_block(&self, pos: VoxelPos) -> Option<&ClientBlock> {
        self.blocks.get(&pos)
    }

    pub fn block_type_id_at(&self, pos: VoxelPos) -> BlockTypeId {
        self.blocks
            .get(&pos)
            .map(|b| b.block_type.id.clone())
            .unwrap_or_else(BlockTypeId::air)
    }

    /// Ensures every `(localX, localZ)` in `[0, chunk_size)^2` has a height
    /// column, per invariant I2. Missing columns fall back to world
    /// bounds.
    pub fn fill_missing_columns(&mut self, world_min_y: i32, world_max_y: i32) {
        for x in 0..self.chunk_size {
            for z in 0..self.chunk_size {
                self.height_columns.entry((x, z)).or_insert_with(|| {
                    HeightColumn::world_bound_default(x, z, world_min_y, world_max_y)
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_world_coords_floor_to_negative_chunk() {
        let pos = VoxelPos::from_world_xyz(-0.5, 0.0, -0.5);
        assert_eq!(pos.to_chunk_pos(16), ChunkPos::new(-1, -1));
        let (lx, lz) = pos.to_local_xz(16);
        assert!((0..16).contains(&lx));
        assert!((0..16).contains(&lz));
    }

    #[test]
    fn empty_backdrop_side_normalizes_to_none() {
        let backdrop = Backdrop::default().normalized();
        assert_eq!(backdrop.n, vec![BackdropSideEntry::none()]);
    }

    #[test]
    fn fill_missing_columns_covers_full_grid() {
        let mut chunk = Chunk::new(ChunkPos::new(0, 0), 4);
        chunk.fill_missing_columns(-64, 320);
        for x in 0..4 {
            for z in 0..4 {
                assert!(chunk.height_columns.contains_key(&(x, z)));
            }
        }
    }
}
