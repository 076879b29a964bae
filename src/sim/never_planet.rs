//! The planet that runs away
//!
//! A hidden, nearly invisible planet that flees from the ship once it gets
//! close. Catching it is counted globally in the store.

use glam::Vec3;
use serde::Serialize;

use crate::lerp;
use crate::net::records::paths;
use crate::net::store::{RemoteStore, StoreError};
use crate::tuning::NeverPlanetTuning;

pub const NEVER_PLANET_START: Vec3 = Vec3::new(400.0, 150.0, -450.0);

/// Reported once when the planet is caught
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NeverPlanetCatch {
    /// Time since the chase began (ms)
    pub chase_ms: f64,
}

#[derive(Debug, Clone)]
pub struct NeverPlanet {
    tuning: NeverPlanetTuning,
    pub position: Vec3,
    /// 0.3 when far, up to 0.65 as the ship closes in
    pub visibility: f32,
    chase_started_ms: Option<f64>,
    caught: bool,
    /// Global catch counter as last read from the store
    catches: u64,
}

impl NeverPlanet {
    pub fn new(tuning: NeverPlanetTuning) -> Self {
        Self {
            tuning,
            position: NEVER_PLANET_START,
            visibility: 0.3,
            chase_started_ms: None,
            caught: false,
            catches: 0,
        }
    }

    pub fn is_caught(&self) -> bool {
        self.caught
    }

    pub fn catches(&self) -> u64 {
        self.catches
    }

    /// Flee from `ship`. `elapsed_s` drives the zigzag.
    pub fn update(
        &mut self,
        ship: Vec3,
        elapsed_s: f32,
        dt: f32,
        now_ms: f64,
    ) -> Option<NeverPlanetCatch> {
        if self.caught {
            return None;
        }

        let to_ship = ship - self.position;
        let distance = to_ship.length();

        if distance < self.tuning.detection_radius {
            self.chase_started_ms.get_or_insert(now_ms);

            let proximity = 1.0 - distance / self.tuning.detection_radius;
            let flee_speed = lerp(self.tuning.min_flee_speed, self.tuning.max_flee_speed, proximity);
            let zigzag = Vec3::new(
                (elapsed_s * 2.0).sin() * 0.3,
                (elapsed_s * 1.5).cos() * 0.2,
                (elapsed_s * 1.8).sin() * 0.25,
            );
            let away = -to_ship.normalize_or_zero();
            let direction = (away + zigzag).normalize_or_zero();
            self.position += direction * flee_speed * dt;

            if self.position.length() > self.tuning.boundary_radius {
                self.position -= self.position.normalize_or_zero() * flee_speed * dt * 2.0;
            }
            self.visibility = lerp(0.3, 1.0, proximity * 0.5);
        } else {
            self.visibility = 0.3;
        }

        if distance < self.tuning.capture_radius {
            self.caught = true;
            let chase_ms = self.chase_started_ms.map_or(0.0, |start| now_ms - start);
            log::info!("Never planet caught after {:.1}s", chase_ms / 1000.0);
            return Some(NeverPlanetCatch { chase_ms });
        }
        None
    }

    /// Dismiss the victory screen. The planet stays where it was caught.
    pub fn reset(&mut self) {
        self.caught = false;
        self.chase_started_ms = None;
    }

    /// Read the global catch counter
    pub fn refresh_catches<S: RemoteStore>(&mut self, store: &S) -> Result<u64, StoreError> {
        self.catches = store
            .get(paths::NEVER_PLANET_CATCHES)?
            .and_then(|v| v.as_u64())
            .unwrap_or(0);
        Ok(self.catches)
    }

    /// Atomically add one catch to the global counter
    pub fn record_catch<S: RemoteStore>(&mut self, store: &S) -> Result<(), StoreError> {
        let mut next = 0;
        store.transaction(paths::NEVER_PLANET_CATCHES, |current| {
            next = current.and_then(|v| v.as_u64()).unwrap_or(0) + 1;
            Some(serde_json::Value::from(next))
        })?;
        self.catches = next;
        Ok(())
    }
}
