//! Birdstrike - side-scrolling survival/combat simulation core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (entities, pipes, combat, items, player)
//! - `config`: Data-driven balance (tuning overrides, item spawn weights)
//!
//! Rendering, audio, UI, and learning-environment wrappers live in host
//! applications; this crate exposes only geometry, action intents, and
//! state queries.

pub mod config;
pub mod sim;

pub use config::{BalanceConfig, ConfigError, SpawnWeights};
pub use sim::{GameEvent, TickInput, World, collide};

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation tick rate (classic 30 Hz arcade cadence)
    pub const TICK_RATE: u32 = 30;
    /// Fixed simulation timestep in seconds
    pub const SIM_DT: f32 = 1.0 / TICK_RATE as f32;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 4;

    /// Playfield dimensions (pixels, +y down)
    pub const PLAYFIELD_W: f32 = 1080.0;
    pub const PLAYFIELD_H: f32 = 720.0;
    /// Top edge of the ground strip
    pub const GROUND_Y: f32 = 640.0;

    /// Pipe geometry and scroll
    pub const PIPE_W: f32 = 86.0;
    pub const PIPE_VGAP: f32 = 180.0;
    pub const PIPE_HGAP: f32 = 340.0;
    pub const PIPE_VEL_X: f32 = -3.0;
    /// Number of live pipe pairs (recycled in place, never reallocated)
    pub const PIPE_PAIRS: usize = 4;
    /// A pair is recycled once its right edge is this far past the left edge
    pub const PIPE_RECYCLE_MARGIN: f32 = 1.5 * PIPE_W;

    /// Bird geometry and kinematics
    pub const BIRD_W: f32 = 34.0;
    pub const BIRD_H: f32 = 24.0;
    pub const BIRD_X: f32 = 216.0;
    pub const GRAVITY: f32 = 1.0;
    pub const FLAP_IMPULSE: f32 = -10.5;
    pub const MAX_FALL_SPEED: f32 = 16.0;
    /// Rotation bounds (radians) and interpolation factor per tick
    pub const ROT_UP: f32 = -0.5;
    pub const ROT_DOWN: f32 = 1.2;
    pub const ROT_LERP: f32 = 0.15;
    /// Idle bob before a round starts: y = base + amp * sin(freq * tick)
    pub const SHM_AMPLITUDE: f32 = 6.0;
    pub const SHM_FREQUENCY: f32 = 0.1;

    /// Player resources
    pub const PLAYER_HP: f32 = 100.0;
    pub const PLAYER_SHIELD: f32 = 100.0;
    pub const PLAYER_FOOD: f32 = 100.0;
    /// HP regained per tick while invincible
    pub const REGEN_PER_TICK: f32 = 0.2;
    /// Food drain per tick in normal flight, and hp drain while starving
    pub const FOOD_DECAY: f32 = 0.02;
    pub const STARVE_DRAIN: f32 = 0.1;

    /// Bullet lifecycle
    pub const BULLET_W: f32 = 10.0;
    pub const BULLET_H: f32 = 4.0;
    /// Ticks a settled bullet rests on the ground before removal
    pub const BULLET_SETTLE_TICKS: u32 = 90;
    /// Horizontal margin past which any bullet is discarded
    pub const BULLET_OFFSCREEN_MARGIN: f32 = 120.0;

    /// Recoil animation length (ticks); triangular ramp out then back
    pub const RECOIL_TICKS: u32 = 8;
    /// Recoil amplitude: pixels back along the barrel, radians of kick
    pub const RECOIL_OFFSET: f32 = 4.0;
    pub const RECOIL_KICK: f32 = 0.12;

    /// Pickup spawn cooldown window (ticks) and scroll-off margin
    pub const ITEM_CD_MIN: u32 = 90;
    pub const ITEM_CD_MAX: u32 = 240;
    pub const PICKUP_SIZE: f32 = 28.0;

    /// Enemy spawn cooldown window (ticks) and members per group
    pub const ENEMY_CD_MIN: u32 = 300;
    pub const ENEMY_CD_MAX: u32 = 600;
    pub const ENEMY_GROUP_SIZE: usize = 3;

    /// CloudSkimmer tuning
    pub const SKIMMER_VEL_X: f32 = -0.5;
    pub const SKIMMER_AMPLITUDE: f32 = 15.0;
    pub const SKIMMER_FREQUENCY: f32 = 0.017;
    pub const SKIMMER_BASELINE_Y: f32 = 350.0;
    pub const SKIMMER_FORMATION_STEP: f32 = 110.0;
    pub const SKIMMER_TURN_RATE: f32 = 0.06;
    pub const SKIMMER_SIZE: f32 = 48.0;
    pub const SKIMMER_SPAWN_X: f32 = PLAYFIELD_W + 40.0;
    /// Per-member trigger cadence window (ticks between shots)
    pub const SKIMMER_FIRE_CD_MIN: u32 = 45;
    pub const SKIMMER_FIRE_CD_MAX: u32 = 120;
    pub const SKIMMER_RESERVE_AMMO: u32 = 98;

    /// SkyDart tuning
    pub const DART_VEL_X: f32 = -6.0;
    pub const DART_BRAKE_DIST: f32 = 160.0;
    pub const DART_DAMAGE: f32 = 25.0;
    pub const DART_DIVE_SPEED: f32 = 7.0;
    pub const DART_GRAV: f32 = 0.35;
    pub const DART_GRAV_WEAK: f32 = 0.06;
    pub const DART_LAUNCH_GAP: u32 = 75;
    pub const DART_TARGET_JITTER: f32 = 25.0;
    pub const DART_W: f32 = 44.0;
    pub const DART_H: f32 = 30.0;
    /// Approach spawn layout: staggered columns, banded heights
    pub const DART_SPAWN_X: f32 = PLAYFIELD_W + 60.0;
    pub const DART_SPAWN_STAGGER: f32 = 90.0;
    pub const DART_SPAWN_Y_BASE: f32 = 120.0;
    pub const DART_SPAWN_Y_STEP: f32 = 110.0;
    pub const DART_SPAWN_Y_SPAN: f32 = 70.0;
    /// Per-instance hold position window (x of the dart's left edge)
    pub const DART_STOP_X_MIN: f32 = 620.0;
    pub const DART_STOP_X_MAX: f32 = 860.0;

    /// Invincibility window granted by the totem special item (ticks)
    pub const TOTEM_INVINCIBILITY_TICKS: u32 = 180;
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::PI;
    while angle >= PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// Rotate a vector by `angle` radians (counterclockwise in math coords)
#[inline]
pub fn rotate_vec(v: Vec2, angle: f32) -> Vec2 {
    let (sin, cos) = angle.sin_cos();
    Vec2::new(v.x * cos - v.y * sin, v.x * sin + v.y * cos)
}

/// Interpolate `from` toward `to` by factor `t` in [0,1]
#[inline]
pub fn lerp(from: f32, to: f32, t: f32) -> f32 {
    from + (to - from) * t
}
