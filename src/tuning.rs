//! Data-driven game balance
//!
//! Keep gameplay tuning separate from world constants (`crate::consts`).
//! Every section deserializes with defaults so a partial JSON override works.

use serde::{Deserialize, Serialize};

/// Free-flight ship handling.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShipTuning {
    /// Thrust acceleration in units per second squared.
    pub acceleration: f32,
    /// Velocity magnitude cap without boost.
    pub max_speed: f32,
    /// Multiplier applied to both thrust and the speed cap while boosting.
    pub boost_multiplier: f32,
    /// Per-frame velocity damping factor (< 1).
    pub damping: f32,
    /// Per-frame angular velocity damping factor (< 1).
    pub angular_damping: f32,
    /// Base rotation rate in radians per second.
    pub rotation_speed: f32,
    /// Scale applied to raw pointer movement (pixels to radians).
    pub mouse_raw_scale: f32,
    /// Sensitivity applied to pointer deltas when rotating.
    pub mouse_sensitivity: f32,
    /// Sensitivity applied to the look joystick vector.
    pub joystick_sensitivity: f32,
    /// Movement joystick dead zone.
    pub joystick_dead_zone: f32,
    /// Acceleration while inside a destination.
    pub inside_speed: f32,
    /// Velocity damping while inside a destination.
    pub inside_damping: f32,
}

impl Default for ShipTuning {
    fn default() -> Self {
        Self {
            acceleration: 25.0,
            max_speed: 80.0,
            boost_multiplier: 2.5,
            damping: 0.96,
            angular_damping: 0.90,
            rotation_speed: 1.2,
            mouse_raw_scale: 0.002,
            mouse_sensitivity: 1.4,
            joystick_sensitivity: 1.5,
            joystick_dead_zone: 0.1,
            inside_speed: 0.5,
            inside_damping: 0.95,
        }
    }
}

/// Destination proximity and warp transition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavTuning {
    /// Distance under which the "nearby" notification is shown.
    pub warning_radius: f32,
    /// Distance under which the ship is pulled into the destination.
    pub attraction_radius: f32,
    /// Warp progress gained per second when driven internally.
    pub warp_rate: f32,
    /// Progress value at which the warp completes.
    pub warp_complete_at: f32,
}

impl Default for NavTuning {
    fn default() -> Self {
        Self {
            warning_radius: 35.0,
            attraction_radius: 18.0,
            warp_rate: 0.8,
            warp_complete_at: 0.95,
        }
    }
}

/// Free-flight weapon.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LaserTuning {
    /// Projectile speed in units per second.
    pub speed: f32,
    /// Travel distance after which a projectile is dropped.
    pub max_range: f32,
    /// Minimum time between two local shots (ms).
    pub cooldown_ms: f64,
    /// Peer hitbox radius for the ray test.
    pub hitbox_radius: f32,
    /// Spawn offset along the firing direction.
    pub muzzle_offset: f32,
    /// Resolved-id set is cleared once it grows past this size.
    pub resolved_cap: usize,
}

impl Default for LaserTuning {
    fn default() -> Self {
        Self {
            speed: 45.0,
            max_range: 150.0,
            cooldown_ms: 10_000.0,
            hitbox_radius: 1.8,
            muzzle_offset: 1.5,
            resolved_cap: 100,
        }
    }
}

/// Multiplayer replication.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncTuning {
    /// Players per room before it counts as full.
    pub room_capacity: usize,
    /// Minimum time between two position publishes (ms).
    pub publish_interval_ms: f64,
    /// Peers silent for longer than this are dropped (ms).
    pub peer_timeout_ms: f64,
    /// Delay before a received laser record is deleted from the store (ms).
    pub laser_cleanup_ms: f64,
    /// Invulnerability after a respawn (ms).
    pub respawn_protection_ms: f64,
}

impl Default for SyncTuning {
    fn default() -> Self {
        Self {
            room_capacity: 10,
            publish_interval_ms: 50.0,
            peer_timeout_ms: 2000.0,
            laser_cleanup_ms: 2000.0,
            respawn_protection_ms: 3000.0,
        }
    }
}

/// Arcade mini-game balance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArcadeTuning {
    pub width: f32,
    pub height: f32,
    pub player_speed: f32,
    pub player_y: f32,
    pub bullet_speed: f32,
    pub bullet_cooldown_ms: f64,
    pub enemy_spacing: f32,
    pub base_rows: u32,
    pub base_cols: u32,
    pub max_rows: u32,
    pub max_cols: u32,
    /// Formation step interval (ms)
    pub enemy_move_interval_ms: f64,
    /// Horizontal formation step per move
    pub enemy_step: f32,
    pub enemy_drop: f32,
    /// Per-enemy, per-frame fire probability
    pub enemy_shoot_chance: f32,
    pub enemy_bullet_speed: f32,
    /// Player bullet vs enemy distance threshold
    pub enemy_hit_radius: f32,
    /// Enemy bullet vs player distance threshold
    pub player_hit_radius: f32,
    pub invulnerability_ms: f64,
    pub loading_ms: f64,
    pub wave_delay_ms: f64,
    pub wave_bonus: u64,
    pub lives: u8,
}

impl Default for ArcadeTuning {
    fn default() -> Self {
        Self {
            width: 20.0,
            height: 30.0,
            player_speed: 25.0,
            player_y: -12.0,
            bullet_speed: 40.0,
            bullet_cooldown_ms: 150.0,
            enemy_spacing: 2.5,
            base_rows: 3,
            base_cols: 6,
            max_rows: 5,
            max_cols: 8,
            enemy_move_interval_ms: 1000.0,
            enemy_step: 1.5,
            enemy_drop: 1.0,
            enemy_shoot_chance: 0.001,
            enemy_bullet_speed: 10.0,
            enemy_hit_radius: 1.2,
            player_hit_radius: 1.5,
            invulnerability_ms: 2000.0,
            loading_ms: 300.0,
            wave_delay_ms: 1000.0,
            wave_bonus: 500,
            lives: 3,
        }
    }
}

/// Fleeing easter-egg planet.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NeverPlanetTuning {
    pub detection_radius: f32,
    pub capture_radius: f32,
    pub min_flee_speed: f32,
    pub max_flee_speed: f32,
    pub boundary_radius: f32,
}

impl Default for NeverPlanetTuning {
    fn default() -> Self {
        Self {
            detection_radius: 100.0,
            capture_radius: 8.0,
            min_flee_speed: 5.0,
            max_flee_speed: 35.0,
            boundary_radius: 800.0,
        }
    }
}

/// All tuning sections for one session.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub ship: ShipTuning,
    pub nav: NavTuning,
    pub laser: LaserTuning,
    pub sync: SyncTuning,
    pub arcade: ArcadeTuning,
    pub never_planet: NeverPlanetTuning,
}

impl Tuning {
    /// Parse a (possibly partial) JSON override on top of the defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
