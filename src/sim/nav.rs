//! Destination proximity detection and the warp state machine
//!
//! `FreeFlight -> Warping -> InsideDestination -> FreeFlight`. The arcade is a
//! separate mode owned by the session; while it runs nothing here is updated.

use glam::Vec3;
use serde::Serialize;

use super::ship::ShipState;
use crate::consts::{
    ARCADE_ACTIVATION_RADIUS, ARCADE_HINT_RADIUS, ARCADE_PLANET_POSITION, HOME_POINT,
    INSIDE_ANCHOR,
};
use crate::tuning::NavTuning;

/// Distance beyond which the arcade trigger re-arms
const ARCADE_REARM_RADIUS: f32 = 50.0;

/// A fixed portfolio section placed in the world
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Destination {
    pub id: &'static str,
    pub name: &'static str,
    pub color: &'static str,
    pub position: Vec3,
}

pub const DESTINATIONS: [Destination; 5] = [
    Destination {
        id: "about",
        name: "Sobre Mí",
        color: "#6366f1",
        position: Vec3::new(0.0, 45.0, -120.0),
    },
    Destination {
        id: "projects",
        name: "Proyectos",
        color: "#ec4899",
        position: Vec3::new(-150.0, -30.0, -75.0),
    },
    Destination {
        id: "skills",
        name: "Habilidades",
        color: "#14b8a6",
        position: Vec3::new(150.0, 15.0, -90.0),
    },
    Destination {
        id: "experience",
        name: "Tecnologías",
        color: "#f59e0b",
        position: Vec3::new(-90.0, 75.0, 60.0),
    },
    Destination {
        id: "contact",
        name: "Contacto",
        color: "#22c55e",
        position: Vec3::new(105.0, -60.0, 75.0),
    },
];

/// Look up a destination by id
pub fn destination(id: &str) -> Option<&'static Destination> {
    DESTINATIONS.iter().find(|d| d.id == id)
}

/// Which content the presentation layer shows for an entered destination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "id")]
pub enum ContentView {
    /// Gallery layout used by the projects section
    Projects,
    /// Generic text panel
    Panel(&'static str),
}

impl ContentView {
    /// Unknown ids render nothing
    pub fn for_destination(id: &str) -> Option<Self> {
        let dest = destination(id)?;
        if dest.id == "projects" {
            Some(ContentView::Projects)
        } else {
            Some(ContentView::Panel(dest.id))
        }
    }
}

/// "Approaching X" notification payload
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NearbyDestination {
    pub id: &'static str,
    pub name: &'static str,
    pub color: &'static str,
    pub distance: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum NavMode {
    FreeFlight,
    Warping { progress: f32 },
    InsideDestination,
}

/// Transitions reported to the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavEvent {
    WarpStarted(&'static str),
    Arrived(&'static str),
    ReturnedHome,
    ArcadeTriggered,
}

#[derive(Debug, Clone)]
pub struct Navigator {
    mode: NavMode,
    /// Destination the ship is inside of
    current: Option<&'static str>,
    /// Warp target
    pending: Option<&'static str>,
    nearby: Option<NearbyDestination>,
    arcade_armed: bool,
    arcade_hint: f32,
}

impl Default for Navigator {
    fn default() -> Self {
        Self {
            mode: NavMode::FreeFlight,
            current: None,
            pending: None,
            nearby: None,
            arcade_armed: true,
            arcade_hint: 0.0,
        }
    }
}

impl Navigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> NavMode {
        self.mode
    }

    pub fn is_free_flight(&self) -> bool {
        matches!(self.mode, NavMode::FreeFlight)
    }

    pub fn is_warping(&self) -> bool {
        matches!(self.mode, NavMode::Warping { .. })
    }

    pub fn is_inside(&self) -> bool {
        matches!(self.mode, NavMode::InsideDestination)
    }

    pub fn current(&self) -> Option<&'static Destination> {
        self.current.and_then(destination)
    }

    pub fn pending(&self) -> Option<&'static Destination> {
        self.pending.and_then(destination)
    }

    pub fn nearby(&self) -> Option<&NearbyDestination> {
        self.nearby.as_ref()
    }

    /// 0 outside the hint radius, rising to 1 at the trigger point
    pub fn arcade_hint(&self) -> f32 {
        self.arcade_hint
    }

    pub fn content_view(&self) -> Option<ContentView> {
        match self.mode {
            NavMode::InsideDestination => self.current.and_then(ContentView::for_destination),
            _ => None,
        }
    }

    /// Per-frame free-flight check against every destination and the arcade trigger
    pub fn update_proximity(&mut self, position: Vec3, tuning: &NavTuning) -> Option<NavEvent> {
        if !self.is_free_flight() {
            return None;
        }

        let closest = DESTINATIONS
            .iter()
            .map(|d| (d, position.distance(d.position)))
            .min_by(|a, b| a.1.total_cmp(&b.1));

        self.nearby = None;
        if let Some((dest, distance)) = closest {
            if distance < tuning.attraction_radius {
                return self.navigate_to(dest.id);
            }
            if distance < tuning.warning_radius {
                self.nearby = Some(NearbyDestination {
                    id: dest.id,
                    name: dest.name,
                    color: dest.color,
                    distance,
                });
            }
        }

        self.check_arcade_trigger(position)
    }

    fn check_arcade_trigger(&mut self, position: Vec3) -> Option<NavEvent> {
        let distance = position.distance(ARCADE_PLANET_POSITION);
        self.arcade_hint = if distance < ARCADE_HINT_RADIUS {
            1.0 - distance / ARCADE_HINT_RADIUS
        } else {
            0.0
        };

        if distance > ARCADE_REARM_RADIUS {
            self.arcade_armed = true;
        } else if distance < ARCADE_ACTIVATION_RADIUS && self.arcade_armed {
            self.arcade_armed = false;
            return Some(NavEvent::ArcadeTriggered);
        }
        None
    }

    /// Start warping to `id` (planet click or attraction). Ignored mid-warp or for unknown ids.
    pub fn navigate_to(&mut self, id: &str) -> Option<NavEvent> {
        if self.is_warping() {
            return None;
        }
        let Some(dest) = destination(id) else {
            log::warn!("Ignoring navigation to unknown destination {}", id);
            return None;
        };
        self.nearby = None;
        self.pending = Some(dest.id);
        self.mode = NavMode::Warping { progress: 0.0 };
        log::info!("Warping to {}", dest.id);
        Some(NavEvent::WarpStarted(dest.id))
    }

    /// Drive the warp from the frame clock
    pub fn advance_warp(
        &mut self,
        dt: f32,
        tuning: &NavTuning,
        ship: &mut ShipState,
    ) -> Option<NavEvent> {
        let NavMode::Warping { progress } = self.mode else {
            return None;
        };
        self.set_warp_progress(progress + tuning.warp_rate * dt, tuning, ship)
    }

    /// Progress reported by an external transition animation. Never moves backwards.
    pub fn report_warp_progress(
        &mut self,
        progress: f32,
        tuning: &NavTuning,
        ship: &mut ShipState,
    ) -> Option<NavEvent> {
        let NavMode::Warping { progress: held } = self.mode else {
            return None;
        };
        self.set_warp_progress(progress.max(held), tuning, ship)
    }

    fn set_warp_progress(
        &mut self,
        progress: f32,
        tuning: &NavTuning,
        ship: &mut ShipState,
    ) -> Option<NavEvent> {
        if progress < tuning.warp_complete_at {
            self.mode = NavMode::Warping { progress };
            return None;
        }

        let arrived = self.pending.take()?;
        self.current = Some(arrived);
        self.mode = NavMode::InsideDestination;
        ship.teleport(INSIDE_ANCHOR);
        log::info!("Arrived at {}", arrived);
        Some(NavEvent::Arrived(arrived))
    }

    /// Leave whatever destination we are in and reappear at the home point
    pub fn go_home(&mut self, ship: &mut ShipState) -> NavEvent {
        self.mode = NavMode::FreeFlight;
        self.current = None;
        self.pending = None;
        self.nearby = None;
        ship.teleport(HOME_POINT);
        NavEvent::ReturnedHome
    }

    /// Reset to free flight without moving the ship (arcade exit)
    pub fn reset(&mut self) {
        let armed = self.arcade_armed;
        *self = Self::default();
        self.arcade_armed = armed;
    }
}
