//! Startup configuration for the client core.
//!
//! Replaces the donor's window/GPU-centric `EngineConfig`: this core is
//! headless and configured entirely by data the host supplies once at
//! construction time.

use std::collections::HashMap;
use std::time::Duration;

use crate::physics::movement::MovementMode;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub chunk_size: i32,
    pub world_min_y: i32,
    pub world_max_y: i32,

    pub render_distance: i32,
    pub unload_distance: i32,

    pub world_id: String,
    pub api_root: String,
    pub auth_exit_url: String,

    pub update_interval: Duration,
    pub entity_cache_size: usize,
    pub entity_model_cache_size: usize,
    pub cache_cleanup_interval: Duration,
    pub cache_eviction_timeout: Duration,
    pub visibility_radius: f32,

    pub max_climb_height: f32,
    pub coyote_time: Duration,
    pub step_throttle: Duration,

    pub movement_modes: HashMap<MovementMode, ModeParams>,
}

/// Per-movement-mode tuning, keyed by [`MovementMode`].
#[derive(Debug, Clone, Copy)]
pub struct ModeParams {
    pub speed: f32,
    pub ground_acceleration: f32,
    pub air_acceleration: f32,
    pub ground_friction: f32,
    pub air_friction: f32,
    pub gravity: f32,
    pub jump_speed: f32,
    pub vertical_wish_enabled: bool,
    pub height: f32,
    pub width: f32,
    pub footprint: f32,
}

impl Default for ModeParams {
    fn default() -> Self {
        ModeParams {
            speed: 5.0,
            ground_acceleration: 100.0,
            air_acceleration: 10.0,
            ground_friction: 8.0,
            air_friction: 1.0,
            gravity: -20.0,
            jump_speed: 7.0,
            vertical_wish_enabled: false,
            height: 1.8,
            width: 0.6,
            footprint: 0.6,
        }
    }
}

fn default_mode_table() -> HashMap<MovementMode, ModeParams> {
    use MovementMode::*;
    let mut table = HashMap::new();
    table.insert(Walk, ModeParams::default());
    table.insert(
        Sprint,
        ModeParams {
            speed: 7.5,
            ..ModeParams::default()
        },
    );
    table.insert(
        Crouch,
        ModeParams {
            speed: 2.0,
            height: 1.0,
            ..ModeParams::default()
        },
    );
    table.insert(
        Swim,
        ModeParams {
            speed: 3.0,
            gravity: -2.0,
            vertical_wish_enabled: true,
            ..ModeParams::default()
        },
    );
    table.insert(
        Climb,
        ModeParams {
            speed: 2.5,
            gravity: 0.0,
            vertical_wish_enabled: true,
            ..ModeParams::default()
        },
    );
    table.insert(
        Fly,
        ModeParams {
            speed: 8.0,
            gravity: 0.0,
            vertical_wish_enabled: true,
            ..ModeParams::default()
        },
    );
    table.insert(
        FreeFly,
        ModeParams {
            speed: 16.0,
            gravity: 0.0,
            vertical_wish_enabled: true,
            ..ModeParams::default()
        },
    );
    table.insert(
        Teleport,
        ModeParams {
            speed: 0.0,
            gravity: 0.0,
            ..ModeParams::default()
        },
    );
    table
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            chunk_size: 16,
            world_min_y: -64,
            world_max_y: 320,
            render_distance: 8,
            unload_distance: 10,
            world_id: String::new(),
            api_root: String::new(),
            auth_exit_url: String::new(),
            update_interval: Duration::from_millis(100),
            entity_cache_size: 1000,
            entity_model_cache_size: 100,
            cache_cleanup_interval: Duration::from_secs(60),
            cache_eviction_timeout: Duration::from_secs(300),
            visibility_radius: 50.0,
            max_climb_height: 0.1,
            coyote_time: Duration::from_millis(150),
            step_throttle: Duration::from_millis(300),
            movement_modes: default_mode_table(),
        }
    }
}

impl ClientConfig {
    pub fn mode_params(&self, mode: MovementMode) -> ModeParams {
        self.movement_modes.get(&mode).copied().unwrap_or_default()
    }
}
