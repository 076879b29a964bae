//! Input aggregation
//!
//! Keyboard, pointer-capture mouse deltas and the two touch joysticks all land
//! in `InputState` whenever the platform delivers them. The frame loop reads
//! the merged result exactly once per frame via `take_intent` (free flight) or
//! `take_arcade_input` (arcade), which also clears the one-shot fields.

use glam::Vec2;

use crate::settings::Settings;
use crate::tuning::ShipTuning;

/// Logical action bound to a physical key code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyBinding {
    Forward,
    Backward,
    Left,
    Right,
    RollLeft,
    RollRight,
    Boost,
    ToggleView,
    Fire,
    Escape,
    Restart,
}

impl KeyBinding {
    /// Map a DOM `KeyboardEvent.code` to its binding
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "KeyW" | "ArrowUp" => Some(Self::Forward),
            "KeyS" | "ArrowDown" => Some(Self::Backward),
            "KeyA" | "ArrowLeft" => Some(Self::Left),
            "KeyD" | "ArrowRight" => Some(Self::Right),
            "KeyQ" => Some(Self::RollLeft),
            "KeyE" => Some(Self::RollRight),
            "ShiftLeft" | "ShiftRight" => Some(Self::Boost),
            "KeyV" => Some(Self::ToggleView),
            "Space" => Some(Self::Fire),
            "Escape" => Some(Self::Escape),
            "KeyR" => Some(Self::Restart),
            _ => None,
        }
    }
}

/// Rotation source for one frame. Pointer capture and joystick never mix.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum LookInput {
    #[default]
    Idle,
    /// Direct rotation delta in radians (already scaled), consumed this frame
    Pointer { delta: Vec2 },
    /// Normalized look vector (sensitivity applied), held across frames
    Joystick { look: Vec2 },
}

/// Merged control intent for a single frame
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ControlIntent {
    pub look: LookInput,
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
    pub roll_left: bool,
    pub roll_right: bool,
    pub boost: bool,
    /// Fire pressed since the last frame
    pub fire: bool,
    /// Camera view toggle pressed since the last frame
    pub toggle_view: bool,
    /// Escape pressed since the last frame
    pub escape: bool,
}

/// Arcade controls for a single frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ArcadeInput {
    pub left: bool,
    pub right: bool,
    /// Fire is held, the arcade applies its own cooldown
    pub fire: bool,
    pub exit: bool,
    pub restart: bool,
}

#[derive(Debug, Clone, Copy, Default)]
struct HeldKeys {
    forward: bool,
    backward: bool,
    left: bool,
    right: bool,
    roll_left: bool,
    roll_right: bool,
    boost: bool,
    fire: bool,
}

/// Raw input state written by event handlers
#[derive(Debug, Clone, Default)]
pub struct InputState {
    held: HeldKeys,
    /// Latest raw pointer movement in pixels (last write wins)
    mouse_delta: Vec2,
    pointer_locked: bool,
    look_joystick: Vec2,
    move_joystick: f32,
    /// Boost held from the on-screen button
    boost_button: bool,
    fire_pressed: bool,
    toggle_view_pressed: bool,
    escape_pressed: bool,
    restart_pressed: bool,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle a key press. `repeat` is the browser auto-repeat flag.
    pub fn key_down(&mut self, code: &str, repeat: bool) {
        let Some(binding) = KeyBinding::from_code(code) else {
            return;
        };
        match binding {
            KeyBinding::Forward => self.held.forward = true,
            KeyBinding::Backward => self.held.backward = true,
            KeyBinding::Left => self.held.left = true,
            KeyBinding::Right => self.held.right = true,
            KeyBinding::RollLeft => self.held.roll_left = true,
            KeyBinding::RollRight => self.held.roll_right = true,
            KeyBinding::Boost => self.held.boost = true,
            KeyBinding::ToggleView => {
                // View toggle only makes sense while flying with pointer capture
                if self.pointer_locked && !repeat {
                    self.toggle_view_pressed = true;
                }
            }
            KeyBinding::Fire => {
                self.held.fire = true;
                if !repeat {
                    self.fire_pressed = true;
                }
            }
            KeyBinding::Escape => self.escape_pressed = true,
            KeyBinding::Restart => {
                if !repeat {
                    self.restart_pressed = true;
                }
            }
        }
    }

    pub fn key_up(&mut self, code: &str) {
        let Some(binding) = KeyBinding::from_code(code) else {
            return;
        };
        match binding {
            KeyBinding::Forward => self.held.forward = false,
            KeyBinding::Backward => self.held.backward = false,
            KeyBinding::Left => self.held.left = false,
            KeyBinding::Right => self.held.right = false,
            KeyBinding::RollLeft => self.held.roll_left = false,
            KeyBinding::RollRight => self.held.roll_right = false,
            KeyBinding::Boost => self.held.boost = false,
            KeyBinding::Fire => self.held.fire = false,
            KeyBinding::ToggleView | KeyBinding::Escape | KeyBinding::Restart => {}
        }
    }

    /// Pointer movement while captured, in raw pixels
    pub fn mouse_move(&mut self, dx: f32, dy: f32) {
        if self.pointer_locked {
            self.mouse_delta = Vec2::new(dx, dy);
        }
    }

    pub fn set_pointer_locked(&mut self, locked: bool) {
        self.pointer_locked = locked;
        if !locked {
            self.mouse_delta = Vec2::ZERO;
        }
    }

    pub fn pointer_locked(&self) -> bool {
        self.pointer_locked
    }

    /// Left touch joystick, components in [-1, 1]
    pub fn set_look_joystick(&mut self, x: f32, y: f32) {
        self.look_joystick = Vec2::new(x, y).clamp(Vec2::splat(-1.0), Vec2::splat(1.0));
    }

    /// Right touch joystick vertical axis in [-1, 1] (positive = forward)
    pub fn set_move_joystick(&mut self, y: f32) {
        self.move_joystick = y.clamp(-1.0, 1.0);
    }

    /// On-screen boost button
    pub fn set_boost(&mut self, active: bool) {
        self.boost_button = active;
    }

    /// On-screen fire button
    pub fn request_fire(&mut self) {
        self.fire_pressed = true;
    }

    /// Drop every held key and pending one-shot (focus loss, mode switch)
    pub fn release_all(&mut self) {
        let pointer_locked = self.pointer_locked;
        *self = Self::default();
        self.pointer_locked = pointer_locked;
    }

    /// Merge everything into this frame's intent and consume one-shots
    pub fn take_intent(&mut self, tuning: &ShipTuning, settings: &Settings) -> ControlIntent {
        let dead_zone = tuning.joystick_dead_zone;
        let has_mobile_input = self.look_joystick != Vec2::ZERO || self.move_joystick != 0.0;

        let mut look_y_sign = 1.0;
        if settings.invert_look_y {
            look_y_sign = -1.0;
        }

        let look = if self.pointer_locked {
            let delta = self.mouse_delta * tuning.mouse_raw_scale * settings.look_sensitivity;
            LookInput::Pointer {
                delta: Vec2::new(delta.x, delta.y * look_y_sign),
            }
        } else if has_mobile_input {
            // Move stick alone still selects the joystick source, with a zero look vector
            let look = self.look_joystick * tuning.joystick_sensitivity * settings.look_sensitivity;
            LookInput::Joystick {
                look: Vec2::new(look.x, look.y * look_y_sign),
            }
        } else {
            LookInput::Idle
        };

        let intent = ControlIntent {
            look,
            forward: self.held.forward || self.move_joystick > dead_zone,
            backward: self.held.backward || self.move_joystick < -dead_zone,
            left: self.held.left,
            right: self.held.right,
            roll_left: self.held.roll_left,
            roll_right: self.held.roll_right,
            boost: self.held.boost || self.boost_button,
            fire: self.fire_pressed,
            toggle_view: self.toggle_view_pressed,
            escape: self.escape_pressed,
        };

        self.mouse_delta = Vec2::ZERO;
        self.fire_pressed = false;
        self.toggle_view_pressed = false;
        self.escape_pressed = false;
        self.restart_pressed = false;
        intent
    }

    /// Arcade view of the same state; consumes the exit/restart one-shots
    pub fn take_arcade_input(&mut self) -> ArcadeInput {
        let input = ArcadeInput {
            left: self.held.left,
            right: self.held.right,
            fire: self.held.fire || self.fire_pressed,
            exit: self.escape_pressed,
            restart: self.restart_pressed,
        };
        self.mouse_delta = Vec2::ZERO;
        self.fire_pressed = false;
        self.toggle_view_pressed = false;
        self.escape_pressed = false;
        self.restart_pressed = false;
        input
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn take(input: &mut InputState) -> ControlIntent {
        input.take_intent(&ShipTuning::default(), &Settings::default())
    }

    #[test]
    fn test_pointer_delta_consumed_each_frame() {
        let mut input = InputState::new();
        input.set_pointer_locked(true);
        input.mouse_move(10.0, -5.0);

        let intent = take(&mut input);
        match intent.look {
            LookInput::Pointer { delta } => {
                assert!((delta.x - 10.0 * 0.002).abs() < 1e-6);
                assert!((delta.y + 5.0 * 0.002).abs() < 1e-6);
            }
            other => panic!("expected pointer look, got {other:?}"),
        }

        // No new movement: zero delta, no accumulation
        let intent = take(&mut input);
        assert_eq!(intent.look, LookInput::Pointer { delta: Vec2::ZERO });
    }

    #[test]
    fn test_mouse_ignored_without_pointer_lock() {
        let mut input = InputState::new();
        input.mouse_move(10.0, 10.0);
        assert_eq!(take(&mut input).look, LookInput::Idle);
    }

    #[test]
    fn test_pointer_lock_wins_over_joystick() {
        let mut input = InputState::new();
        input.set_look_joystick(0.5, 0.0);
        assert!(matches!(take(&mut input).look, LookInput::Joystick { .. }));

        input.set_pointer_locked(true);
        assert!(matches!(take(&mut input).look, LookInput::Pointer { .. }));
    }

    #[test]
    fn test_joystick_persists_while_held() {
        let mut input = InputState::new();
        input.set_look_joystick(1.0, 0.0);
        for _ in 0..3 {
            match take(&mut input).look {
                LookInput::Joystick { look } => assert!((look.x - 1.5).abs() < 1e-6),
                other => panic!("expected joystick, got {other:?}"),
            }
        }
        input.set_look_joystick(0.0, 0.0);
        assert_eq!(take(&mut input).look, LookInput::Idle);
    }

    #[test]
    fn test_move_joystick_dead_zone() {
        let mut input = InputState::new();
        input.set_move_joystick(0.05);
        let intent = take(&mut input);
        assert!(!intent.forward && !intent.backward);

        input.set_move_joystick(-0.6);
        let intent = take(&mut input);
        assert!(intent.backward && !intent.forward);
    }

    #[test]
    fn test_fire_is_one_shot_and_ignores_repeat() {
        let mut input = InputState::new();
        input.key_down("Space", false);
        assert!(take(&mut input).fire);
        input.key_down("Space", true);
        assert!(!take(&mut input).fire);
    }

    #[test]
    fn test_view_toggle_requires_pointer_lock() {
        let mut input = InputState::new();
        input.key_down("KeyV", false);
        assert!(!take(&mut input).toggle_view);
        input.set_pointer_locked(true);
        input.key_down("KeyV", false);
        assert!(take(&mut input).toggle_view);
    }

    #[test]
    fn test_escape_is_one_shot() {
        let mut input = InputState::new();
        input.key_down("Escape", false);
        assert!(take(&mut input).escape);
        assert!(!take(&mut input).escape);
    }

    #[test]
    fn test_arcade_input_uses_held_fire() {
        let mut input = InputState::new();
        input.key_down("ArrowLeft", false);
        input.key_down("Space", false);
        let a = input.take_arcade_input();
        assert!(a.left && a.fire && !a.right);
        // Still held next frame
        assert!(input.take_arcade_input().fire);
        input.key_up("Space");
        assert!(!input.take_arcade_input().fire);
    }
}
