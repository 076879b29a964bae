//! Hidden arcade mini-game
//!
//! A small fixed-formation shooter played on a 20 x 30 board.

pub mod state;
pub mod tick;

pub use state::{ArcadeEvent, ArcadePhase, ArcadeState, Bullet, Enemy, EnemyKind};
pub use tick::tick;
