//! Arcade frame step
//!
//! Advances the arcade by one frame of `dt` seconds at wall-clock `now_ms`.

use rand::Rng;

use super::state::{ArcadeEvent, ArcadePhase, ArcadeState, ArcadeTimer, Bullet};
use crate::sim::input::ArcadeInput;

/// Advance the arcade by one frame
pub fn tick(state: &mut ArcadeState, input: &ArcadeInput, dt: f32, now_ms: f64) {
    for timer in state.timers.poll(now_ms) {
        match timer {
            ArcadeTimer::LoadingDone => {
                if state.phase == ArcadePhase::Loading {
                    state.phase = ArcadePhase::Playing;
                    log::info!("Arcade playing");
                }
            }
            ArcadeTimer::SpawnWave => {
                let wave = state.wave;
                state.spawn_wave(wave);
            }
        }
    }

    if input.restart && state.phase == ArcadePhase::GameOver {
        state.restart(now_ms);
        return;
    }
    if state.phase != ArcadePhase::Playing {
        return;
    }

    let t = state.tuning;
    let half_w = t.width / 2.0;
    let half_h = t.height / 2.0;

    // --- Player ---
    if input.left {
        state.player_x -= t.player_speed * dt;
    }
    if input.right {
        state.player_x += t.player_speed * dt;
    }
    state.player_x = state.player_x.clamp(-half_w + 1.0, half_w - 1.0);

    let ready = state
        .last_shot_ms
        .is_none_or(|last| now_ms - last > t.bullet_cooldown_ms);
    if input.fire && ready {
        let id = state.next_entity_id();
        state.bullets.push(Bullet {
            id,
            x: state.player_x,
            y: t.player_y + 1.0,
            hostile: false,
        });
        state.last_shot_ms = Some(now_ms);
    }

    // --- Bullets ---
    for bullet in state.bullets.iter_mut() {
        if bullet.hostile {
            bullet.y -= t.enemy_bullet_speed * dt;
        } else {
            bullet.y += t.bullet_speed * dt;
        }
    }
    state
        .bullets
        .retain(|b| if b.hostile { b.y > -half_h } else { b.y < half_h });

    // --- Formation ---
    if now_ms - state.last_enemy_move_ms > t.enemy_move_interval_ms {
        state.last_enemy_move_ms = now_ms;
        let step = state.direction * t.enemy_step;
        let hits_edge = state
            .enemies
            .iter()
            .any(|e| (e.x + step).abs() > half_w - 1.0);
        if hits_edge {
            // Reverse and drop instead of moving sideways
            state.direction = -state.direction;
            for enemy in state.enemies.iter_mut() {
                enemy.y -= t.enemy_drop;
            }
        } else {
            for enemy in state.enemies.iter_mut() {
                enemy.x += step;
            }
        }
    }

    // --- Enemy fire ---
    let mut shots = Vec::new();
    for enemy in &state.enemies {
        if state.rng.random::<f32>() < t.enemy_shoot_chance {
            shots.push((enemy.x, enemy.y - 0.5));
        }
    }
    for (x, y) in shots {
        let id = state.next_entity_id();
        state.bullets.push(Bullet {
            id,
            x,
            y,
            hostile: true,
        });
    }

    // --- Player bullets vs enemies ---
    let mut spent = Vec::new();
    for bullet in state.bullets.iter().filter(|b| !b.hostile) {
        let target = state.enemies.iter_mut().find(|e| {
            e.health > 0 && ((bullet.x - e.x).powi(2) + (bullet.y - e.y).powi(2)).sqrt() < t.enemy_hit_radius
        });
        if let Some(enemy) = target {
            enemy.health -= 1;
            spent.push(bullet.id);
            if enemy.health == 0 {
                let points = enemy.kind.points();
                state.score += points;
                state.events.push(ArcadeEvent::EnemyDestroyed {
                    kind: enemy.kind,
                    points,
                });
            }
        }
    }
    state.bullets.retain(|b| !spent.contains(&b.id));
    state.enemies.retain(|e| e.health > 0);

    // --- Damage to the player ---
    if !state.is_invulnerable(now_ms) {
        let shot_down = state.bullets.iter().any(|b| {
            b.hostile
                && ((b.x - state.player_x).powi(2) + (b.y - t.player_y).powi(2)).sqrt()
                    < t.player_hit_radius
        });
        if shot_down {
            lose_life(state, now_ms);
        } else if let Some(i) = state.enemies.iter().position(|e| e.y < t.player_y + 2.0) {
            state.enemies.remove(i);
            lose_life(state, now_ms);
        }
        if state.phase == ArcadePhase::GameOver {
            return;
        }
    }

    // --- Wave clear ---
    if state.enemies.is_empty() && !state.timers.contains(&ArcadeTimer::SpawnWave) {
        let cleared = state.wave;
        state.score += t.wave_bonus;
        state.wave += 1;
        state.invulnerable_until_ms = now_ms + t.invulnerability_ms;
        state
            .timers
            .schedule(now_ms + t.wave_delay_ms, ArcadeTimer::SpawnWave);
        state.events.push(ArcadeEvent::WaveCleared { wave: cleared });
        log::info!("Wave {} cleared, score {}", cleared, state.score);
    }

    state.normalize_order();
}

fn lose_life(state: &mut ArcadeState, now_ms: f64) {
    state.lives = state.lives.saturating_sub(1);
    state.player_x = 0.0;
    state.bullets.retain(|b| !b.hostile);
    state.invulnerable_until_ms = now_ms + state.tuning.invulnerability_ms;
    state.events.push(ArcadeEvent::PlayerHit { lives: state.lives });

    if state.lives == 0 {
        state.phase = ArcadePhase::GameOver;
        state.timers.cancel_all();
        state.events.push(ArcadeEvent::GameOver {
            score: state.score,
            wave: state.wave,
        });
        log::info!("Arcade game over: {} points, wave {}", state.score, state.wave);
    }
}
