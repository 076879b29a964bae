//! Arcade game state and entity types

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::Serialize;

use crate::timers::Timers;
use crate::tuning::ArcadeTuning;

/// Current phase of the arcade. `Inactive` while flying.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ArcadePhase {
    Inactive,
    /// Short pause before the first wave moves
    Loading,
    Playing,
    GameOver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EnemyKind {
    Basic,
    /// Top row from wave 2
    Fast,
    /// Center of the top row from wave 3
    Tank,
}

impl EnemyKind {
    pub fn points(&self) -> u64 {
        match self {
            EnemyKind::Basic => 100,
            EnemyKind::Fast => 150,
            EnemyKind::Tank => 300,
        }
    }

    pub fn health(&self) -> u8 {
        match self {
            EnemyKind::Tank => 3,
            _ => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Enemy {
    pub id: u32,
    pub kind: EnemyKind,
    pub x: f32,
    pub y: f32,
    pub health: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bullet {
    pub id: u32,
    pub x: f32,
    pub y: f32,
    /// Fired by an enemy (moves down)
    pub hostile: bool,
}

/// Things the session and presentation react to
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ArcadeEvent {
    WaveStarted { wave: u32 },
    EnemyDestroyed { kind: EnemyKind, points: u64 },
    PlayerHit { lives: u8 },
    WaveCleared { wave: u32 },
    GameOver { score: u64, wave: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ArcadeTimer {
    LoadingDone,
    SpawnWave,
}

/// Complete arcade state
#[derive(Debug, Clone, Serialize)]
pub struct ArcadeState {
    #[serde(skip)]
    pub tuning: ArcadeTuning,
    pub phase: ArcadePhase,
    pub score: u64,
    pub lives: u8,
    /// 1-based wave number
    pub wave: u32,
    pub player_x: f32,
    /// Sorted by id
    pub enemies: Vec<Enemy>,
    /// Sorted by id
    pub bullets: Vec<Bullet>,
    /// Formation direction (+1 right, -1 left)
    pub direction: f32,
    pub(crate) last_enemy_move_ms: f64,
    pub(crate) last_shot_ms: Option<f64>,
    pub(crate) invulnerable_until_ms: f64,
    #[serde(skip)]
    pub(crate) timers: Timers<ArcadeTimer>,
    #[serde(skip)]
    pub(crate) rng: Pcg32,
    #[serde(skip)]
    pub(crate) events: Vec<ArcadeEvent>,
    next_id: u32,
}

impl ArcadeState {
    /// Create an inactive arcade with the given seed
    pub fn new(tuning: ArcadeTuning, seed: u64) -> Self {
        Self {
            tuning,
            phase: ArcadePhase::Inactive,
            score: 0,
            lives: tuning.lives,
            wave: 1,
            player_x: 0.0,
            enemies: Vec::new(),
            bullets: Vec::new(),
            direction: 1.0,
            last_enemy_move_ms: 0.0,
            last_shot_ms: None,
            invulnerable_until_ms: 0.0,
            timers: Timers::new(),
            rng: Pcg32::seed_from_u64(seed),
            events: Vec::new(),
            next_id: 1,
        }
    }

    pub fn is_active(&self) -> bool {
        self.phase != ArcadePhase::Inactive
    }

    pub fn is_invulnerable(&self, now_ms: f64) -> bool {
        now_ms < self.invulnerable_until_ms
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Begin a fresh game at wave 1
    pub fn start(&mut self, now_ms: f64) {
        self.timers.cancel_all();
        self.phase = ArcadePhase::Loading;
        self.score = 0;
        self.lives = self.tuning.lives;
        self.wave = 1;
        self.player_x = 0.0;
        self.bullets.clear();
        self.last_enemy_move_ms = now_ms;
        self.last_shot_ms = None;
        self.invulnerable_until_ms = now_ms + self.tuning.invulnerability_ms;
        self.spawn_wave(1);
        self.timers
            .schedule(now_ms + self.tuning.loading_ms, ArcadeTimer::LoadingDone);
        log::info!("Arcade started");
    }

    /// Only valid from game over
    pub fn restart(&mut self, now_ms: f64) -> bool {
        if self.phase != ArcadePhase::GameOver {
            return false;
        }
        self.start(now_ms);
        true
    }

    /// Leave the arcade, dropping every entity and pending timer
    pub fn exit(&mut self) {
        self.timers.cancel_all();
        self.phase = ArcadePhase::Inactive;
        self.enemies.clear();
        self.bullets.clear();
        self.events.clear();
        self.score = 0;
        self.lives = self.tuning.lives;
        self.wave = 1;
        log::info!("Arcade exited");
    }

    /// Formation size for a wave: (cols, rows)
    pub fn formation_size(&self, wave: u32) -> (u32, u32) {
        let t = &self.tuning;
        let cols = (t.base_cols + wave / 2).min(t.max_cols);
        let rows = (t.base_rows + wave / 3).min(t.max_rows);
        (cols, rows)
    }

    /// Replace the formation with wave `wave`
    pub fn spawn_wave(&mut self, wave: u32) {
        let (cols, rows) = self.formation_size(wave);
        let spacing = self.tuning.enemy_spacing;

        self.enemies.clear();
        for row in 0..rows {
            for col in 0..cols {
                let kind = if wave >= 3 && row == 0 && col == cols / 2 {
                    EnemyKind::Tank
                } else if wave >= 2 && row == 0 {
                    EnemyKind::Fast
                } else {
                    EnemyKind::Basic
                };
                let id = self.next_entity_id();
                self.enemies.push(Enemy {
                    id,
                    kind,
                    x: (col as f32 - cols as f32 / 2.0 + 0.5) * spacing,
                    y: 8.0 - row as f32 * spacing,
                    health: kind.health(),
                });
            }
        }
        self.direction = 1.0;
        log::info!("Spawned {} enemies for wave {}", self.enemies.len(), wave);
        self.events.push(ArcadeEvent::WaveStarted { wave });
    }

    pub fn drain_events(&mut self) -> Vec<ArcadeEvent> {
        std::mem::take(&mut self.events)
    }

    /// Ensure entities are sorted by ID for deterministic iteration
    pub fn normalize_order(&mut self) {
        self.enemies.sort_by_key(|e| e.id);
        self.bullets.sort_by_key(|b| b.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arcade() -> ArcadeState {
        ArcadeState::new(ArcadeTuning::default(), 12345)
    }

    #[test]
    fn test_wave_sizes() {
        let a = arcade();
        assert_eq!(a.formation_size(1), (6, 3));
        assert_eq!(a.formation_size(2), (7, 3));
        assert_eq!(a.formation_size(3), (7, 4));
        assert_eq!(a.formation_size(6), (8, 5));
        assert_eq!(a.formation_size(40), (8, 5));
    }

    #[test]
    fn test_first_wave_layout() {
        let mut a = arcade();
        a.spawn_wave(1);
        assert_eq!(a.enemies.len(), 18);
        assert!(a.enemies.iter().all(|e| e.kind == EnemyKind::Basic));
        assert_eq!(a.enemies[0].x, -6.25);
        assert_eq!(a.enemies[0].y, 8.0);
        assert_eq!(a.enemies[17].x, 6.25);
        assert_eq!(a.enemies[17].y, 3.0);
    }

    #[test]
    fn test_fast_row_and_tank_placement() {
        let mut a = arcade();
        a.spawn_wave(2);
        assert_eq!(a.enemies.len(), 21);
        assert!(a.enemies[..7].iter().all(|e| e.kind == EnemyKind::Fast));
        assert!(a.enemies.iter().all(|e| e.kind != EnemyKind::Tank));

        a.spawn_wave(3);
        assert_eq!(a.enemies.len(), 28);
        let tanks: Vec<usize> = a
            .enemies
            .iter()
            .enumerate()
            .filter(|(_, e)| e.kind == EnemyKind::Tank)
            .map(|(i, _)| i)
            .collect();
        // Row 0, col = 7 / 2 = 3
        assert_eq!(tanks, vec![3]);
        assert_eq!(a.enemies[3].health, 3);
        assert_eq!(a.enemies[3].x, 0.0);
    }

    #[test]
    fn test_start_and_exit() {
        let mut a = arcade();
        assert!(!a.is_active());
        a.start(1000.0);
        assert_eq!(a.phase, ArcadePhase::Loading);
        assert_eq!(a.lives, 3);
        assert!(a.is_invulnerable(2500.0));
        assert!(!a.restart(1100.0));

        a.exit();
        assert!(!a.is_active());
        assert!(a.timers.is_empty());
        assert!(a.enemies.is_empty());
    }
}
