//! Player settings and preferences
//!
//! Held in memory for the session only; the presentation layer may hand in a
//! JSON blob at startup.

use serde::{Deserialize, Serialize};

/// Camera placement relative to the ship
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum CameraView {
    #[default]
    FirstPerson,
    ThirdPerson,
}

impl CameraView {
    pub fn as_str(&self) -> &'static str {
        match self {
            CameraView::FirstPerson => "First person",
            CameraView::ThirdPerson => "Third person",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "first" | "first_person" | "fps" => Some(CameraView::FirstPerson),
            "third" | "third_person" | "chase" => Some(CameraView::ThirdPerson),
            _ => None,
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            CameraView::FirstPerson => CameraView::ThirdPerson,
            CameraView::ThirdPerson => CameraView::FirstPerson,
        }
    }
}

/// Game settings/preferences
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Camera view mode
    pub camera_view: CameraView,

    // === Controls ===
    /// Multiplier on top of the tuned mouse/joystick sensitivities
    pub look_sensitivity: f32,
    /// Invert vertical look
    pub invert_look_y: bool,

    // === Accessibility ===
    /// Reduced motion (camera snaps instead of easing)
    pub reduced_motion: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            camera_view: CameraView::FirstPerson,
            look_sensitivity: 1.0,
            invert_look_y: false,
            reduced_motion: false,
        }
    }
}

impl Settings {
    /// Parse settings handed in by the presentation layer, falling back to defaults
    pub fn from_json(json: &str) -> Self {
        match serde_json::from_str::<Settings>(json) {
            Ok(mut settings) => {
                settings.look_sensitivity = settings.look_sensitivity.clamp(0.1, 5.0);
                settings
            }
            Err(e) => {
                log::warn!("Ignoring invalid settings: {}", e);
                Self::default()
            }
        }
    }

    pub fn toggle_camera_view(&mut self) {
        self.camera_view = self.camera_view.toggled();
    }

    /// Third-person camera smoothing factor (1.0 snaps)
    pub fn camera_smoothing(&self) -> f32 {
        if self.reduced_motion { 1.0 } else { 0.1 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json_partial_and_clamped() {
        let s = Settings::from_json(r#"{"look_sensitivity": 50.0, "invert_look_y": true}"#);
        assert_eq!(s.look_sensitivity, 5.0);
        assert!(s.invert_look_y);
        assert_eq!(s.camera_view, CameraView::FirstPerson);
    }

    #[test]
    fn test_from_json_invalid_falls_back() {
        let s = Settings::from_json("not json");
        assert_eq!(s.look_sensitivity, 1.0);
    }

    #[test]
    fn test_toggle_camera_view() {
        let mut s = Settings::default();
        s.toggle_camera_view();
        assert_eq!(s.camera_view, CameraView::ThirdPerson);
        s.toggle_camera_view();
        assert_eq!(s.camera_view, CameraView::FirstPerson);
    }
}
