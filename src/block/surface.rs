//! C2: Surface Analyzer.
//!
//! Decodes a block's four top-corner heights, used by the Collision
//! Detector to interpolate slope/semi-solid surfaces instead of treating
//! every non-air block as a flat cube.

use crate::block::Modifier;

/// Vertex offset table indices that encode the Y of the four top corners
/// of a block mesh, in `[NW, NE, SE, SW]` order. Mirrors the layout the
/// donor's mesh generator uses for partial-height blocks (slabs, stairs,
/// slopes): indices 19, 22, 16, 13 are the top-face corners.
const TOP_CORNER_OFFSET_INDICES: [usize; 4] = [19, 22, 16, 13];

/// Returns `[NW, NE, SE, SW]` corner heights as fractions in `[0, 1]`.
/// Precedence: explicit `cornerHeights` on the modifier; else derive from
/// the vertex offset table; else `None` (the caller should treat the
/// block as a full cube).
pub fn corner_heights(modifier: &Modifier, vertex_offsets: Option<&[f32]>) -> Option<[f32; 4]> {
    if let Some(explicit) = modifier.physics.corner_heights {
        return Some(explicit);
    }

    let offsets = vertex_offsets?;
    let mut heights = [0.0f32; 4];
    for (i, &idx) in TOP_CORNER_OFFSET_INDICES.iter().enumerate() {
        heights[i] = *offsets.get(idx)?;
    }
    Some(heights)
}

/// Bilinearly interpolates the surface height at local fractional
/// coordinates `(fx, fz) ∈ [0,1]²` within a block's footprint, given its
/// four corner heights.
pub fn interpolate_surface_height(corners: [f32; 4], fx: f32, fz: f32) -> f32 {
    let [nw, ne, se, sw] = corners;
    let north = nw + (ne - nw) * fx;
    let south = sw + (se - sw) * fx;
    north + (south - north) * fz
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::PhysicsFacet;

    #[test]
    fn explicit_corner_heights_take_precedence() {
        let modifier = Modifier {
            physics: PhysicsFacet {
                corner_heights: Some([0.5, 0.5, 0.5, 0.5]),
                ..PhysicsFacet::default()
            },
            ..Modifier::default()
        };
        assert_eq!(corner_heights(&modifier, None), Some([0.5, 0.5, 0.5, 0.5]));
    }

    #[test]
    fn no_heights_and_no_offsets_signals_cube() {
        let modifier = Modifier::default();
        assert_eq!(corner_heights(&modifier, None), None);
    }

    #[test]
    fn flat_full_block_interpolates_to_one() {
        let height = interpolate_surface_height([1.0, 1.0, 1.0, 1.0], 0.3, 0.7);
        assert!((height - 1.0).abs() < 1e-6);
    }

    #[test]
    fn center_of_a_simple_slope_is_the_average() {
        // NW=1.0, others=0.0: center should be roughly a quarter of the way.
        let height = interpolate_surface_height([1.0, 0.0, 0.0, 0.0], 0.5, 0.5);
        assert!((height - 0.25).abs() < 1e-6);
    }
}
