//! Block type catalog: ids, modifier facets, and the pure merge function
//! used to fold a block's status/inline/world overrides into a single
//! effective modifier.

pub mod registry;
pub mod surface;

use std::collections::HashMap;

use bitflags::bitflags;
use glam::Vec3;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Which faces an otherwise-solid (or wall) block can be entered from.
    /// `Serialize`/`Deserialize` come from bitflags' own "serde" feature.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Direction: u8 {
        const NORTH = 0b0000_0001;
        const EAST  = 0b0000_0010;
        const SOUTH = 0b0000_0100;
        const WEST  = 0b0000_1000;
        const UP    = 0b0001_0000;
        const DOWN  = 0b0010_0000;
    }
}

impl Direction {
    pub fn has(self, d: Direction) -> bool {
        self.contains(d)
    }

    pub fn with(self, d: Direction) -> Direction {
        self | d
    }

    pub fn without(self, d: Direction) -> Direction {
        self & !d
    }
}

/// Canonical `"group:name"` block type identifier, always lowercased.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockTypeId(pub String);

impl BlockTypeId {
    pub const AIR_RAW: &'static str = "w:0";
    pub const ERROR_RAW: &'static str = "w:error";

    pub fn air() -> Self {
        BlockTypeId(Self::AIR_RAW.to_string())
    }

    pub fn error() -> Self {
        BlockTypeId(Self::ERROR_RAW.to_string())
    }

    pub fn is_air(&self) -> bool {
        self.0 == Self::AIR_RAW || self.0 == "0"
    }

    /// Case-fold, trim, coerce legacy numeric ids, default the group to
    /// `"w"` when absent. Idempotent: `normalize(normalize(x)) == normalize(x)`.
    pub fn normalize(raw: &str) -> BlockTypeId {
        let trimmed = raw.trim().to_lowercase();
        if trimmed.is_empty() {
            return BlockTypeId::air();
        }
        if trimmed == "0" {
            return BlockTypeId::air();
        }
        if let Some((group, name)) = trimmed.split_once(':') {
            if group.is_empty() {
                return BlockTypeId(format!("w:{name}"));
            }
            return BlockTypeId(format!("{group}:{name}"));
        }
        // Bare legacy numeric (or bare name) id: default group "w".
        BlockTypeId(format!("w:{trimmed}"))
    }

    pub fn group(&self) -> &str {
        self.0.split_once(':').map(|(g, _)| g).unwrap_or("w")
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VisibilityFacet {
    pub opaque: bool,
    pub transparent_sides: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhysicsFacet {
    pub solid: bool,
    #[serde(default)]
    pub passable_from: Direction,
    pub corner_heights: Option<[f32; 4]>,
    #[serde(default)]
    pub resistance: f32,
    #[serde(default = "default_true")]
    pub auto_climbable: bool,
    pub auto_move: Option<Vec3>,
    pub auto_orientation_y: Option<f32>,
    #[serde(default)]
    pub auto_jump: f32,
    #[serde(default)]
    pub climbable: f32,
    #[serde(default)]
    pub collision_event: bool,
}

fn default_true() -> bool {
    true
}

impl Default for PhysicsFacet {
    fn default() -> Self {
        PhysicsFacet {
            solid: false,
            passable_from: Direction::empty(),
            corner_heights: None,
            resistance: 0.0,
            auto_climbable: true,
            auto_move: None,
            auto_orientation_y: None,
            auto_jump: 0.0,
            climbable: 0.0,
            collision_event: false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AudioFacet {
    pub step_sound: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WindFacet {
    pub sway: f32,
}

/// An effective set of facets for one (type, status) combination, plus
/// any inline/world overrides already folded in. See [`merge`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Modifier {
    pub visibility: VisibilityFacet,
    pub physics: PhysicsFacet,
    pub audio: AudioFacet,
    pub wind: WindFacet,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockType {
    pub id: BlockTypeId,
    pub modifiers: HashMap<i32, Modifier>,
}

impl BlockType {
    pub fn air() -> Self {
        let mut modifiers = HashMap::new();
        modifiers.insert(0, Modifier::default());
        BlockType {
            id: BlockTypeId::air(),
            modifiers,
        }
    }

    pub fn error() -> Self {
        let mut modifiers = HashMap::new();
        modifiers.insert(
            0,
            Modifier {
                physics: PhysicsFacet {
                    solid: true,
                    ..PhysicsFacet::default()
                },
                ..Modifier::default()
            },
        );
        BlockType {
            id: BlockTypeId::error(),
            modifiers,
        }
    }

    pub fn modifier_for(&self, status_key: i32) -> Option<&Modifier> {
        self.modifiers.get(&status_key)
    }
}

/// Inline per-block override: any field left `None` falls through to the
/// lower-precedence source.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModifierOverride {
    pub solid: Option<bool>,
    pub passable_from: Option<Direction>,
    pub corner_heights: Option<[f32; 4]>,
    pub resistance: Option<f32>,
    pub auto_climbable: Option<bool>,
    pub auto_move: Option<Vec3>,
    pub auto_orientation_y: Option<f32>,
    pub auto_jump: Option<f32>,
    pub climbable: Option<f32>,
    pub collision_event: Option<bool>,
}

/// Folds base type modifier (keyed by `status_key`), inline per-block
/// overrides, and world/season-level overrides into one effective
/// [`Modifier`]. Precedence: inline > status (world) > base. Pure and
/// deterministic: same inputs always produce the same output, and the
/// facets are independent of each other so their override order commutes.
pub fn merge(
    base: &BlockType,
    status_key: i32,
    inline: Option<&ModifierOverride>,
    world: Option<&ModifierOverride>,
) -> Modifier {
    let mut result = base
        .modifier_for(status_key)
        .or_else(|| base.modifier_for(0))
        .cloned()
        .unwrap_or_default();

    if let Some(w) = world {
        apply_override(&mut result.physics, w);
    }
    if let Some(i) = inline {
        apply_override(&mut result.physics, i);
    }
    result
}

fn apply_override(physics: &mut PhysicsFacet, over: &ModifierOverride) {
    if let Some(v) = over.solid {
        physics.solid = v;
    }
    if let Some(v) = over.passable_from {
        physics.passable_from = v;
    }
    if over.corner_heights.is_some() {
        physics.corner_heights = over.corner_heights;
    }
    if let Some(v) = over.resistance {
        physics.resistance = v;
    }
    if let Some(v) = over.auto_climbable {
        physics.auto_climbable = v;
    }
    if over.auto_move.is_some() {
        physics.auto_move = over.auto_move;
    }
    if over.auto_orientation_y.is_some() {
        physics.auto_orientation_y = over.auto_orientation_y;
    }
    if let Some(v) = over.auto_jump {
        physics.auto_jump = v;
    }
    if let Some(v) = over.climbable {
        physics.climbable = v;
    }
    if let Some(v) = over.collision_event {
        physics.collision_event = v;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_is_idempotent() {
        for raw in ["310", "W:310", "  Core:Stone ", "0", "", "w:0"] {
            let once = BlockTypeId::normalize(raw);
            let twice = BlockTypeId::normalize(&once.0);
            assert_eq!(once, twice, "normalize not idempotent for {raw:?}");
        }
    }

    #[test]
    fn legacy_numeric_gets_w_prefix() {
        assert_eq!(BlockTypeId::normalize("310").0, "w:310");
    }

    #[test]
    fn zero_is_always_air() {
        assert!(BlockTypeId::normalize("0").is_air());
        assert!(BlockTypeId::normalize("w:0").is_air());
    }

    #[test]
    fn merge_precedence_inline_over_world_over_base() {
        let mut bt = BlockType::air();
        bt.modifiers.insert(
            0,
            Modifier {
                physics: PhysicsFacet {
                    resistance: 0.1,
                    ..PhysicsFacet::default()
                },
                ..Modifier::default()
            },
        );
        let world = ModifierOverride {
            resistance: Some(0.5),
            ..Default::default()
        };
        let inline = ModifierOverride {
            resistance: Some(0.9),
            ..Default::default()
        };
        let m = merge(&bt, 0, Some(&inline), Some(&world));
        assert_eq!(m.physics.resistance, 0.9);

        let m_world_only = merge(&bt, 0, None, Some(&world));
        assert_eq!(m_world_only.physics.resistance, 0.5);
    }

    #[test]
    fn independent_facets_commute() {
        let bt = BlockType::air();
        let solid_override = ModifierOverride {
            solid: Some(true),
            ..Default::default()
        };
        let resistance_override = ModifierOverride {
            resistance: Some(0.3),
            ..Default::default()
        };
        let mut a = bt.modifier_for(0).cloned().unwrap_or_default().physics;
        apply_override(&mut a, &solid_override);
        apply_override(&mut a, &resistance_override);

        let mut b = bt.modifier_for(0).cloned().unwrap_or_default().physics;
        apply_override(&mut b, &resistance_override);
        apply_override(&mut b, &solid_override);

        assert_eq!(a.solid, b.solid);
        assert_eq!(a.resistance, b.resistance);
    }
}
