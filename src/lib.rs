//! Starfolio - a flyable space portfolio
//!
//! Core modules:
//! - `sim`: Frame-driven simulation (ship physics, navigation, lasers, arcade)
//! - `net`: Best-effort multiplayer replication over a hosted key-value store
//! - `session`: Orchestrator composing the subsystems for one client
//! - `platform`: Browser/native platform abstraction
//! - `tuning`: Data-driven game balance

pub mod highscores;
pub mod net;
pub mod platform;
pub mod session;
pub mod settings;
pub mod sim;
pub mod timers;
pub mod tuning;

pub use highscores::HighScores;
pub use session::{FrameView, Session, SessionEvent};
pub use settings::{CameraView, Settings};
pub use tuning::Tuning;

use glam::{EulerRot, Quat, Vec3};

/// World configuration constants
pub mod consts {
    use glam::Vec3;

    /// Ship spawn point at session start and after leaving the arcade
    pub const SHIP_START: Vec3 = Vec3::new(0.0, 0.0, 12.0);
    /// Ship anchor once a destination has been entered
    pub const INSIDE_ANCHOR: Vec3 = Vec3::new(0.0, 0.0, 8.0);
    /// Where the ship reappears after "go home"
    pub const HOME_POINT: Vec3 = Vec3::new(0.0, 2.0, 15.0);

    /// Clamp box for movement inside a destination (min, max)
    pub const INSIDE_MIN: Vec3 = Vec3::new(-5.0, -1.0, 2.0);
    pub const INSIDE_MAX: Vec3 = Vec3::new(5.0, 3.0, 12.0);

    /// Respawn draw box half extents, centered on the origin
    pub const RESPAWN_HALF_EXTENTS: Vec3 = Vec3::new(30.0, 20.0, 30.0);

    /// Hidden arcade trigger
    pub const ARCADE_PLANET_POSITION: Vec3 = Vec3::new(-300.0, -180.0, 280.0);
    pub const ARCADE_ACTIVATION_RADIUS: f32 = 25.0;
    pub const ARCADE_HINT_RADIUS: f32 = 60.0;

    /// Number of rooms checked on connect (`room-1` .. `room-N`)
    pub const ROOM_COUNT: usize = 10;

    /// Ship color palette shared by every client
    pub const SHIP_COLORS: [&str; 10] = [
        "#ef4444", // red
        "#f97316", // orange
        "#eab308", // yellow
        "#22c55e", // green
        "#14b8a6", // teal
        "#06b6d4", // cyan
        "#3b82f6", // blue
        "#8b5cf6", // violet
        "#d946ef", // fuchsia
        "#ec4899", // pink
    ];

    /// Delay between death and the automatic respawn (ms)
    pub const RESPAWN_DELAY_MS: f64 = 1500.0;
}

/// Rotation quaternion for an XYZ Euler triple (same convention as the scene graph)
#[inline]
pub fn euler_to_quat(rotation: Vec3) -> Quat {
    Quat::from_euler(EulerRot::XYZ, rotation.x, rotation.y, rotation.z)
}

/// Ship-space forward axis (-Z) rotated into world space
#[inline]
pub fn forward_from_euler(rotation: Vec3) -> Vec3 {
    euler_to_quat(rotation) * Vec3::NEG_Z
}

/// Linear interpolation between two scalars
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}
