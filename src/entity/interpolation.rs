//! Pure waypoint interpolation, grounded on the donor's DOP
//! `network/interpolation.rs` (lerp position, slerp-style rotation,
//! extrapolation fallback) but built around explicit pathway waypoints
//! with timestamps rather than a network snapshot queue.

use glam::Vec3;

use crate::entity::model::{Waypoint, WaypointRotation};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interpolated {
    pub position: Vec3,
    pub rotation: WaypointRotation,
    pub pose: Option<i32>,
    pub velocity: Vec3,
}

fn lerp_rotation(a: &WaypointRotation, b: &WaypointRotation, t: f32) -> WaypointRotation {
    WaypointRotation {
        y: a.y + (b.y - a.y) * t,
        p: match (a.p, b.p) {
            (Some(ap), Some(bp)) => Some(ap + (bp - ap) * t),
            (Some(ap), None) => Some(ap),
            (None, Some(bp)) => Some(bp),
            (None, None) => None,
        },
    }
}

/// Advances `index` past any waypoint whose target timestamp has already
/// elapsed, so the caller always interpolates between the pair that
/// currently brackets `now_ms`.
pub fn advance_index(waypoints: &[Waypoint], mut index: usize, now_ms: u64) -> usize {
    while index + 1 < waypoints.len() && now_ms >= waypoints[index + 1].timestamp {
        index += 1;
    }
    index
}

/// Interpolates between `waypoints[index]` and `waypoints[index + 1]` at
/// `now_ms`. Returns `None` if there are no waypoints. When `now_ms` is
/// before the first waypoint's timestamp, holds at the first waypoint
/// (open question in §9: ambiguous source behavior, spec resolves to
/// "hold at first"). When there is no next waypoint, holds at the last
/// with zero velocity.
pub fn interpolate(waypoints: &[Waypoint], index: usize, now_ms: u64) -> Option<Interpolated> {
    let from = waypoints.get(index)?;

    if now_ms < from.timestamp {
        return Some(Interpolated {
            position: from.target,
            rotation: from.rotation.clone(),
            pose: from.pose,
            velocity: Vec3::ZERO,
        });
    }

    let Some(to) = waypoints.get(index + 1) else {
        return Some(Interpolated {
            position: from.target,
            rotation: from.rotation.clone(),
            pose: from.pose,
            velocity: Vec3::ZERO,
        });
    };

    let span_ms = to.timestamp.saturating_sub(from.timestamp).max(1) as f32;
    let elapsed_ms = now_ms.saturating_sub(from.timestamp) as f32;
    let t = (elapsed_ms / span_ms).clamp(0.0, 1.0);

    let position = from.target + (to.target - from.target) * t;
    let rotation = lerp_rotation(&from.rotation, &to.rotation, t);
    let pose = if t > 0.5 { to.pose } else { from.pose };

    let velocity = if t < 1.0 {
        (to.target - from.target) / (span_ms / 1000.0)
    } else {
        Vec3::ZERO
    };

    Some(Interpolated {
        position,
        rotation,
        pose,
        velocity,
    })
}
