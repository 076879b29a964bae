//! Free-flight lasers and ray-based hit detection
//!
//! Projectile positions are analytic: `origin + direction * speed * elapsed`.
//! Only locally fired projectiles are tested against peers; the victim's own
//! client learns about the hit through the store.

use std::collections::HashSet;

use glam::Vec3;
use serde::Serialize;

use crate::net::records::LaserRecord;
use crate::net::sync::Peer;
use crate::tuning::LaserTuning;

#[derive(Debug, Clone, PartialEq)]
pub struct Projectile {
    pub id: String,
    pub origin: Vec3,
    /// Unit length
    pub direction: Vec3,
    pub created_ms: f64,
    pub remote: bool,
    /// Distance along the ray already covered by hit tests
    checked_distance: f32,
    /// Hit confirmed this frame; dropped after the detection pass
    consumed: bool,
}

impl Projectile {
    pub fn distance_at(&self, now_ms: f64, speed: f32) -> f32 {
        let elapsed = ((now_ms - self.created_ms) / 1000.0).max(0.0) as f32;
        elapsed * speed
    }

    pub fn position_at(&self, now_ms: f64, speed: f32) -> Vec3 {
        self.origin + self.direction * self.distance_at(now_ms, speed)
    }
}

/// Muzzle point and direction of a shot that passed the cooldown
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shot {
    pub origin: Vec3,
    pub direction: Vec3,
}

/// A confirmed local hit on a peer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LaserHit {
    pub projectile_id: String,
    pub victim_id: String,
    /// Explosion spawn point (the victim's position)
    pub position: Vec3,
    pub color: String,
}

/// Projectile snapshot for the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectileView {
    pub id: String,
    pub position: Vec3,
    pub direction: Vec3,
    pub remote: bool,
}

#[derive(Debug, Clone)]
pub struct LaserSystem {
    tuning: LaserTuning,
    projectiles: Vec<Projectile>,
    last_shot_ms: Option<f64>,
    /// Projectile ids that already scored
    resolved: HashSet<String>,
}

impl LaserSystem {
    pub fn new(tuning: LaserTuning) -> Self {
        Self {
            tuning,
            projectiles: Vec::new(),
            last_shot_ms: None,
            resolved: HashSet::new(),
        }
    }

    pub fn projectiles(&self) -> &[Projectile] {
        &self.projectiles
    }

    pub fn can_fire(&self, now_ms: f64) -> bool {
        self.last_shot_ms
            .is_none_or(|last| now_ms - last >= self.tuning.cooldown_ms)
    }

    /// Remaining cooldown in ms (0 when ready)
    pub fn cooldown_remaining(&self, now_ms: f64) -> f64 {
        match self.last_shot_ms {
            Some(last) => (self.tuning.cooldown_ms - (now_ms - last)).max(0.0),
            None => 0.0,
        }
    }

    /// Consume the cooldown and compute the muzzle point, or `None` if still cooling down
    pub fn try_fire(&mut self, position: Vec3, forward: Vec3, now_ms: f64) -> Option<Shot> {
        if !self.can_fire(now_ms) {
            return None;
        }
        let direction = forward.try_normalize()?;
        self.last_shot_ms = Some(now_ms);
        Some(Shot {
            origin: position + direction * self.tuning.muzzle_offset,
            direction,
        })
    }

    /// Track a local shot under the id it was announced with
    pub fn add_local(&mut self, id: String, shot: Shot, now_ms: f64) {
        self.projectiles.push(Projectile {
            id,
            origin: shot.origin,
            direction: shot.direction,
            created_ms: now_ms,
            remote: false,
            checked_distance: 0.0,
            consumed: false,
        });
    }

    /// Insert a projectile fired by a peer. Duplicate ids are ignored.
    /// Flight time starts at receipt so peers' clock skew does not matter.
    pub fn add_remote(&mut self, record: &LaserRecord, now_ms: f64) -> bool {
        if self.resolved.contains(&record.id) || self.projectiles.iter().any(|p| p.id == record.id) {
            return false;
        }
        let Some(direction) = Vec3::from(record.direction).try_normalize() else {
            log::debug!("Dropping laser {} with zero direction", record.id);
            return false;
        };
        self.projectiles.push(Projectile {
            id: record.id.clone(),
            origin: record.origin.into(),
            direction,
            created_ms: now_ms,
            remote: true,
            checked_distance: 0.0,
            consumed: false,
        });
        true
    }

    /// Drop projectiles past maximum range. Local ones stay until the hit
    /// test has covered the ray up to the range limit.
    pub fn update(&mut self, now_ms: f64) {
        let speed = self.tuning.speed;
        let max_range = self.tuning.max_range;
        self.projectiles.retain(|p| {
            !p.consumed
                && (p.distance_at(now_ms, speed) < max_range
                    || (!p.remote && p.checked_distance < max_range))
        });
    }

    /// Test local projectiles against peers over the distance covered since the last call
    pub fn detect_hits<'a>(
        &mut self,
        peers: impl IntoIterator<Item = &'a Peer>,
        now_ms: f64,
    ) -> Vec<LaserHit> {
        let targets: Vec<&Peer> = peers.into_iter().filter(|p| !p.protected).collect();
        let speed = self.tuning.speed;
        let radius = self.tuning.hitbox_radius;
        let max_range = self.tuning.max_range;
        let mut hits = Vec::new();

        for projectile in self.projectiles.iter_mut() {
            if projectile.remote || projectile.consumed || self.resolved.contains(&projectile.id) {
                continue;
            }
            let from = projectile.checked_distance;
            let to = projectile.distance_at(now_ms, speed).min(max_range);

            for peer in &targets {
                let to_peer = peer.position - projectile.origin;
                let along = to_peer.dot(projectile.direction);
                if along < from || along > to {
                    continue;
                }
                let closest = projectile.origin + projectile.direction * along;
                if closest.distance(peer.position) < radius {
                    log::info!("Laser {} hit {}", projectile.id, peer.id);
                    hits.push(LaserHit {
                        projectile_id: projectile.id.clone(),
                        victim_id: peer.id.clone(),
                        position: peer.position,
                        color: peer.color.clone(),
                    });
                    projectile.consumed = true;
                    self.resolved.insert(projectile.id.clone());
                    break;
                }
            }
            projectile.checked_distance = to;
        }

        self.projectiles.retain(|p| !p.consumed);
        if self.resolved.len() > self.tuning.resolved_cap {
            self.resolved.clear();
        }
        hits
    }

    pub fn views(&self, now_ms: f64) -> Vec<ProjectileView> {
        self.projectiles
            .iter()
            .map(|p| ProjectileView {
                id: p.id.clone(),
                position: p.position_at(now_ms, self.tuning.speed),
                direction: p.direction,
                remote: p.remote,
            })
            .collect()
    }

    /// Forget every projectile (session teardown)
    pub fn clear(&mut self) {
        self.projectiles.clear();
        self.resolved.clear();
    }
}
