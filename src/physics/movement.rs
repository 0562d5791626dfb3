//! C5: Movement Resolver.
//!
//! Accel/friction/gravity integration plus jump + coyote time, per the
//! mode table in [`crate::config::ClientConfig`].

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::config::ModeParams;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MovementMode {
    Walk,
    Sprint,
    Crouch,
    Swim,
    Climb,
    Fly,
    FreeFly,
    Teleport,
}

impl Default for MovementMode {
    fn default() -> Self {
        MovementMode::Walk
    }
}

/// Per-entity motion state carried across frames.
#[derive(Debug, Clone, Copy, Default)]
pub struct MotionState {
    pub velocity: Vec3,
    pub grounded: bool,
    pub on_slope: bool,
    pub last_grounded_ms: u64,
}

fn approach(current: f32, target: f32, max_delta: f32) -> f32 {
    if (target - current).abs() <= max_delta {
        target
    } else {
        current + (target - current).signum() * max_delta
    }
}

pub struct MoveInput {
    pub wish_move: Vec3,
    pub vertical_wish: f32,
    pub jump_requested: bool,
    pub ground_resistance: f32,
    pub underwater: bool,
}

/// Integrates one frame of motion. Does not touch position or resolve
/// collisions — the caller (Physics Service) combines the returned
/// velocity with `dt` to form a wish-position and hands that to the
/// Collision Detector.
pub fn integrate(
    state: &mut MotionState,
    params: &ModeParams,
    input: &MoveInput,
    dt: f32,
    now_ms: u64,
    coyote_time_ms: u64,
) {
    let horizontal_wish = Vec3::new(input.wish_move.x, 0.0, input.wish_move.z);
    let target = if horizontal_wish.length_squared() > 1e-6 {
        horizontal_wish.normalize() * params.speed
    } else {
        Vec3::ZERO
    };

    let accel = if state.grounded {
        params.ground_acceleration
    } else {
        params.air_acceleration
    };
    state.velocity.x = approach(state.velocity.x, target.x, accel * dt);
    state.velocity.z = approach(state.velocity.z, target.z, accel * dt);

    let friction = if state.grounded {
        params.ground_friction
    } else {
        params.air_friction
    };
    let decay = (-friction * dt).exp();
    state.velocity.x *= decay;
    state.velocity.z *= decay;

    if input.ground_resistance > 0.0 {
        let factor = (1.0 - input.ground_resistance).max(0.0);
        state.velocity.x *= factor;
        state.velocity.z *= factor;
    }

    if params.vertical_wish_enabled {
        state.velocity.y = input.vertical_wish * params.speed;
    } else if params.gravity != 0.0 {
        let gravity = if input.underwater {
            params.gravity * 0.1
        } else {
            params.gravity
        };
        state.velocity.y += gravity * dt;
    }

    if state.grounded {
        state.last_grounded_ms = now_ms;
    }

    if input.jump_requested {
        let within_coyote = now_ms.saturating_sub(state.last_grounded_ms) <= coyote_time_ms;
        if state.grounded || within_coyote {
            state.velocity.y = params.jump_speed;
            state.last_grounded_ms = 0;
        }
    }
}
