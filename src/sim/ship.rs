//! Ship physics model
//!
//! The local craft is integrated once per frame with a damped-acceleration
//! model. Only this module writes `ShipState`; everyone else reads it.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use super::input::{ControlIntent, LookInput};
use crate::consts::{INSIDE_MAX, INSIDE_MIN, SHIP_START};
use crate::settings::{CameraView, Settings};
use crate::tuning::ShipTuning;
use crate::{euler_to_quat, forward_from_euler};

/// Joystick yaw response relative to the base rotation speed
const JOYSTICK_YAW_FACTOR: f32 = 0.8;
/// Joystick pitch target per unit of stick deflection
const JOYSTICK_PITCH_TARGET: f32 = 0.15;
/// Pull of the joystick pitch target back toward level flight
const JOYSTICK_PITCH_RECENTER: f32 = 0.2;
/// Roll rate multiplier for Q/E while the pointer is captured
const ROLL_FACTOR: f32 = 1.5;
/// A/D banking when the pointer is not captured
const BANK_ROLL_FACTOR: f32 = 0.3;
const BANK_YAW_FACTOR: f32 = 0.5;
/// Reverse thrust relative to forward thrust
const REVERSE_THRUST: f32 = 0.5;

/// Third-person camera offset in ship space (up, behind)
const CHASE_OFFSET: Vec3 = Vec3::new(0.0, 3.0, 8.0);

/// The player's craft
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShipState {
    pub position: Vec3,
    /// Euler angles (XYZ order). Pitch and roll are never clamped.
    pub rotation: Vec3,
    pub velocity: Vec3,
    pub angular_velocity: Vec3,
}

impl Default for ShipState {
    fn default() -> Self {
        Self::at(SHIP_START)
    }
}

impl ShipState {
    /// Ship at rest at `position`, level and facing -Z
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            rotation: Vec3::ZERO,
            velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
        }
    }

    /// Place the ship at `position`, level and at rest
    pub fn teleport(&mut self, position: Vec3) {
        *self = Self::at(position);
    }

    pub fn speed(&self) -> f32 {
        self.velocity.length()
    }

    pub fn forward(&self) -> Vec3 {
        forward_from_euler(self.rotation)
    }

    /// Current velocity cap for the given boost state
    pub fn max_speed(tuning: &ShipTuning, boost: bool) -> f32 {
        if boost {
            tuning.max_speed * tuning.boost_multiplier
        } else {
            tuning.max_speed
        }
    }

    /// Free-flight integration step
    pub fn step_free(&mut self, intent: &ControlIntent, tuning: &ShipTuning, dt: f32) {
        let speed_mult = if intent.boost {
            tuning.boost_multiplier
        } else {
            1.0
        };
        let rot_speed = tuning.rotation_speed;

        // --- Rotation ---
        let pointer_captured = matches!(intent.look, LookInput::Pointer { .. });
        match intent.look {
            LookInput::Pointer { delta } => {
                self.rotation.y -= delta.x * tuning.mouse_sensitivity;
                self.rotation.x -= delta.y * tuning.mouse_sensitivity;
            }
            LookInput::Joystick { look } => {
                self.angular_velocity.y += -look.x * rot_speed * dt * JOYSTICK_YAW_FACTOR;
                let target_pitch = look.y * JOYSTICK_PITCH_TARGET;
                self.angular_velocity.x +=
                    (target_pitch - self.rotation.x * JOYSTICK_PITCH_RECENTER) * rot_speed * dt;
            }
            LookInput::Idle => {}
        }

        if pointer_captured {
            if intent.roll_left {
                self.rotation.z += rot_speed * dt * ROLL_FACTOR;
            }
            if intent.roll_right {
                self.rotation.z -= rot_speed * dt * ROLL_FACTOR;
            }
        } else {
            if intent.left {
                self.angular_velocity.z += rot_speed * dt * BANK_ROLL_FACTOR;
                self.angular_velocity.y += rot_speed * dt * BANK_YAW_FACTOR;
            }
            if intent.right {
                self.angular_velocity.z -= rot_speed * dt * BANK_ROLL_FACTOR;
                self.angular_velocity.y -= rot_speed * dt * BANK_YAW_FACTOR;
            }
        }

        // --- Thrust along the current forward axis ---
        let forward = self.forward();
        if intent.forward {
            self.velocity += forward * tuning.acceleration * speed_mult * dt;
        }
        if intent.backward {
            self.velocity -= forward * tuning.acceleration * speed_mult * dt * REVERSE_THRUST;
        }

        let max_speed = tuning.max_speed * speed_mult;
        self.velocity = self.velocity.clamp_length_max(max_speed);

        // Space friction, the only thing that slows the ship down
        self.velocity *= tuning.damping;
        self.angular_velocity *= tuning.angular_damping;

        self.position += self.velocity * dt;
        self.rotation += self.angular_velocity * dt;
    }

    /// Slow, box-clamped movement inside a destination. Rotation input is ignored.
    pub fn step_inside(&mut self, intent: &ControlIntent, tuning: &ShipTuning, dt: f32) {
        let accel = tuning.inside_speed * dt;
        if intent.forward {
            self.velocity.z -= accel;
        }
        if intent.backward {
            self.velocity.z += accel;
        }
        if intent.left {
            self.velocity.x -= accel;
        }
        if intent.right {
            self.velocity.x += accel;
        }

        self.velocity *= tuning.inside_damping;
        // Velocity is a per-frame displacement in this mode
        self.position = (self.position + self.velocity).clamp(INSIDE_MIN, INSIDE_MAX);
    }
}

/// Camera pose handed to the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraPose {
    pub position: Vec3,
    pub orientation: Quat,
}

/// Follows the ship in first or third person
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraRig {
    pub pose: CameraPose,
}

impl Default for CameraRig {
    fn default() -> Self {
        Self {
            pose: CameraPose {
                position: SHIP_START,
                orientation: Quat::IDENTITY,
            },
        }
    }
}

impl CameraRig {
    /// Copy the ship pose straight into the camera (warp, inside, teleport)
    pub fn snap_to(&mut self, ship: &ShipState) {
        self.pose = CameraPose {
            position: ship.position,
            orientation: euler_to_quat(ship.rotation),
        };
    }

    pub fn follow(&mut self, ship: &ShipState, settings: &Settings) {
        match settings.camera_view {
            CameraView::FirstPerson => self.snap_to(ship),
            CameraView::ThirdPerson => {
                let ship_rot = euler_to_quat(ship.rotation);
                let target = ship.position + ship_rot * CHASE_OFFSET;
                let position = self
                    .pose
                    .position
                    .lerp(target, settings.camera_smoothing());

                let to_ship = ship.position - position;
                let orientation = if to_ship.length_squared() > 1e-6 {
                    Quat::from_rotation_arc(Vec3::NEG_Z, to_ship.normalize())
                } else {
                    ship_rot
                };
                self.pose = CameraPose {
                    position,
                    orientation,
                };
            }
        }
    }
}
