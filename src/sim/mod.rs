//! Frame-driven simulation
//!
//! Gameplay logic for one client. Nothing in here touches the DOM or the GPU:
//! - Every step takes an explicit `dt` and wall-clock `now_ms`
//! - Randomness comes from seeded generators
//! - Entity lists stay sorted by ID

pub mod arcade;
pub mod input;
pub mod laser;
pub mod nav;
pub mod never_planet;
pub mod ship;

pub use arcade::{ArcadeEvent, ArcadePhase, ArcadeState};
pub use input::{ArcadeInput, ControlIntent, InputState};
pub use laser::{LaserHit, LaserSystem, Projectile, ProjectileView, Shot};
pub use nav::{ContentView, DESTINATIONS, Destination, NavEvent, NavMode, Navigator};
pub use never_planet::{NeverPlanet, NeverPlanetCatch};
pub use ship::{CameraPose, CameraRig, ShipState};
