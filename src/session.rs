//! Session orchestrator
//!
//! Owns every subsystem for one client and runs them once per frame. The
//! presentation layer forwards input through the `Session` methods, calls
//! `frame` from its animation loop, then reads `view` and drains
//! `SessionEvent`s for one-off effects (explosions, panels, sounds).

use glam::Vec3;
use serde::Serialize;

use crate::consts::{RESPAWN_DELAY_MS, SHIP_START};
use crate::highscores::HighScores;
use crate::net::records::HighScoreRecord;
use crate::net::store::RemoteStore;
use crate::net::sync::{Peer, SyncEvent, Synchronizer};
use crate::settings::{CameraView, Settings};
use crate::sim::arcade::{self, ArcadeEvent, ArcadeState};
use crate::sim::input::InputState;
use crate::sim::laser::{LaserSystem, ProjectileView};
use crate::sim::nav::{ContentView, NavEvent, NavMode, Navigator, NearbyDestination};
use crate::sim::never_planet::NeverPlanet;
use crate::sim::ship::{CameraPose, CameraRig, ShipState};
use crate::timers::Timers;
use crate::tuning::Tuning;

/// Longest frame step fed to the simulation (s)
const MAX_FRAME_DT: f32 = 0.1;

/// One-off notifications for the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SessionEvent {
    /// The "approaching" notification changed (None hides it)
    NearbyChanged { nearby: Option<NearbyDestination> },
    WarpStarted { destination: &'static str },
    Arrived {
        destination: &'static str,
        content: Option<ContentView>,
    },
    ReturnedHome,
    CameraViewChanged { view: CameraView },
    LaserFired { id: String },
    /// A local laser destroyed a peer
    PeerDestroyed {
        victim: String,
        position: Vec3,
        color: String,
    },
    PeersChanged,
    /// Our ship was destroyed
    Destroyed { attacker: String },
    Respawned { position: Vec3 },
    ArcadeStarted,
    ArcadeExited,
    ArcadeGameOver {
        score: u64,
        wave: u32,
        rank: Option<usize>,
        personal_best: u64,
    },
    NeverPlanetCaught { chase_ms: f64, catches: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionTimer {
    Respawn,
}

/// Fleeing planet as drawn
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NeverPlanetView {
    pub position: Vec3,
    pub visibility: f32,
    pub caught: bool,
    pub catches: u64,
}

/// Everything the presentation layer draws for one frame
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameView {
    pub player_id: String,
    pub color: &'static str,
    pub room: Option<String>,
    pub ship: ShipState,
    pub speed: f32,
    pub camera: CameraPose,
    pub camera_view: CameraView,
    pub nav_mode: NavMode,
    pub destination: Option<&'static str>,
    pub content: Option<ContentView>,
    pub nearby: Option<NearbyDestination>,
    pub arcade_hint: f32,
    pub alive: bool,
    pub protected: bool,
    pub laser_cooldown_ms: f64,
    pub projectiles: Vec<ProjectileView>,
    pub peers: Vec<Peer>,
    /// Present while the arcade runs
    pub arcade: Option<ArcadeState>,
    pub never_planet: NeverPlanetView,
    pub high_scores: Vec<HighScoreRecord>,
    pub personal_best: u64,
}

/// One client: local simulation plus replication
pub struct Session<S: RemoteStore + Clone> {
    store: S,
    tuning: Tuning,
    settings: Settings,
    ship: ShipState,
    camera: CameraRig,
    input: InputState,
    nav: Navigator,
    lasers: LaserSystem,
    sync: Synchronizer<S>,
    arcade: ArcadeState,
    never_planet: NeverPlanet,
    high_scores: HighScores,
    timers: Timers<SessionTimer>,
    events: Vec<SessionEvent>,
    /// Time of the first frame, drives the never planet zigzag
    started_ms: Option<f64>,
    alive: bool,
    last_nearby: Option<&'static str>,
}

impl<S: RemoteStore + Clone> Session<S> {
    pub fn new(store: S, tuning: Tuning, settings: Settings, seed: u64) -> Self {
        Self {
            sync: Synchronizer::new(store.clone(), tuning.sync, seed),
            store,
            settings,
            ship: ShipState::default(),
            camera: CameraRig::default(),
            input: InputState::new(),
            nav: Navigator::new(),
            lasers: LaserSystem::new(tuning.laser),
            arcade: ArcadeState::new(tuning.arcade, seed.wrapping_add(1)),
            never_planet: NeverPlanet::new(tuning.never_planet),
            high_scores: HighScores::new(),
            timers: Timers::new(),
            events: Vec::new(),
            started_ms: None,
            alive: true,
            last_nearby: None,
            tuning,
        }
    }

    pub fn ship(&self) -> &ShipState {
        &self.ship
    }

    pub fn navigator(&self) -> &Navigator {
        &self.nav
    }

    pub fn sync(&self) -> &Synchronizer<S> {
        &self.sync
    }

    pub fn arcade(&self) -> &ArcadeState {
        &self.arcade
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn high_scores(&self) -> &HighScores {
        &self.high_scores
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    /// Join a room (or go solo) and read the shared counters
    pub fn connect(&mut self, now_ms: f64) {
        self.sync.connect(now_ms);
        if let Err(e) = self.high_scores.refresh(&self.store) {
            log::warn!("Failed to load high scores: {}", e);
        }
        if let Err(e) = self.never_planet.refresh_catches(&self.store) {
            log::warn!("Failed to load never planet catches: {}", e);
        }
    }

    // === Input ===

    pub fn key_down(&mut self, code: &str, repeat: bool) {
        self.input.key_down(code, repeat);
    }

    pub fn key_up(&mut self, code: &str) {
        self.input.key_up(code);
    }

    pub fn mouse_move(&mut self, dx: f32, dy: f32) {
        self.input.mouse_move(dx, dy);
    }

    pub fn set_pointer_locked(&mut self, locked: bool) {
        self.input.set_pointer_locked(locked);
    }

    pub fn set_look_joystick(&mut self, x: f32, y: f32) {
        self.input.set_look_joystick(x, y);
    }

    pub fn set_move_joystick(&mut self, y: f32) {
        self.input.set_move_joystick(y);
    }

    pub fn request_fire(&mut self) {
        self.input.request_fire();
    }

    pub fn set_boost(&mut self, active: bool) {
        self.input.set_boost(active);
    }

    // === Navigation ===

    /// Planet click
    pub fn navigate_to(&mut self, id: &str, now_ms: f64) {
        if self.arcade.is_active() || !self.alive {
            return;
        }
        if let Some(event) = self.nav.navigate_to(id) {
            self.handle_nav_event(event, now_ms);
        }
    }

    /// Progress from an external transition animation
    pub fn report_warp_progress(&mut self, progress: f32, now_ms: f64) {
        if let Some(event) = self
            .nav
            .report_warp_progress(progress, &self.tuning.nav, &mut self.ship)
        {
            self.handle_nav_event(event, now_ms);
        }
    }

    pub fn go_home(&mut self, now_ms: f64) {
        if self.arcade.is_active() {
            return;
        }
        let event = self.nav.go_home(&mut self.ship);
        self.camera.snap_to(&self.ship);
        self.handle_nav_event(event, now_ms);
    }

    // === Arcade ===

    pub fn start_arcade(&mut self, now_ms: f64) {
        if self.arcade.is_active() {
            return;
        }
        self.input.release_all();
        self.nav.reset();
        self.ship.velocity = Vec3::ZERO;
        self.ship.angular_velocity = Vec3::ZERO;
        self.arcade.start(now_ms);
        self.events.push(SessionEvent::ArcadeStarted);
    }

    pub fn exit_arcade(&mut self) {
        if !self.arcade.is_active() {
            return;
        }
        self.arcade.exit();
        self.input.release_all();
        self.nav.reset();
        self.ship.teleport(SHIP_START);
        self.camera.snap_to(&self.ship);
        self.events.push(SessionEvent::ArcadeExited);
    }

    pub fn restart_arcade(&mut self, now_ms: f64) {
        self.arcade.restart(now_ms);
    }

    /// Dismiss the never planet victory screen
    pub fn dismiss_never_planet(&mut self) {
        self.never_planet.reset();
    }

    // === Frame ===

    /// Advance everything by one frame
    pub fn frame(&mut self, now_ms: f64, dt: f32) {
        let dt = dt.clamp(0.0, MAX_FRAME_DT);
        let started = *self.started_ms.get_or_insert(now_ms);

        for timer in self.timers.poll(now_ms) {
            match timer {
                SessionTimer::Respawn => self.respawn(now_ms),
            }
        }

        self.sync.poll(now_ms);
        self.handle_sync_events(now_ms);

        if self.arcade.is_active() {
            self.arcade_frame(now_ms, dt);
        } else {
            self.flight_frame(now_ms, dt, ((now_ms - started) / 1000.0) as f32);
        }

        let hits = self.lasers.detect_hits(self.sync.visible_peers(), now_ms);
        self.lasers.update(now_ms);
        for hit in hits {
            self.sync.send_hit(&hit.victim_id, now_ms);
            self.events.push(SessionEvent::PeerDestroyed {
                victim: hit.victim_id,
                position: hit.position,
                color: hit.color,
            });
        }

        if self.alive {
            // The arcade counts as sheltered
            let sheltered = self.nav.is_inside() || self.arcade.is_active();
            self.sync
                .update_position(self.ship.position, self.ship.rotation, sheltered, now_ms);
        }
    }

    fn flight_frame(&mut self, now_ms: f64, dt: f32, elapsed_s: f32) {
        let intent = self.input.take_intent(&self.tuning.ship, &self.settings);
        if intent.toggle_view {
            self.settings.toggle_camera_view();
            self.events.push(SessionEvent::CameraViewChanged {
                view: self.settings.camera_view,
            });
        }

        match self.nav.mode() {
            NavMode::FreeFlight => {
                if self.alive {
                    self.ship.step_free(&intent, &self.tuning.ship, dt);
                    if intent.fire {
                        self.fire(now_ms);
                    }
                }
                if let Some(event) = self.nav.update_proximity(self.ship.position, &self.tuning.nav)
                {
                    self.handle_nav_event(event, now_ms);
                }
                self.update_nearby();
                if self.arcade.is_active() {
                    return;
                }
                self.camera.follow(&self.ship, &self.settings);

                if let Some(catch) =
                    self.never_planet
                        .update(self.ship.position, elapsed_s, dt, now_ms)
                {
                    if let Err(e) = self.never_planet.record_catch(&self.store) {
                        log::warn!("Failed to record never planet catch: {}", e);
                    }
                    self.events.push(SessionEvent::NeverPlanetCaught {
                        chase_ms: catch.chase_ms,
                        catches: self.never_planet.catches(),
                    });
                }
            }
            NavMode::Warping { .. } => {
                if let Some(event) = self.nav.advance_warp(dt, &self.tuning.nav, &mut self.ship) {
                    self.handle_nav_event(event, now_ms);
                }
                self.camera.snap_to(&self.ship);
            }
            NavMode::InsideDestination => {
                if intent.escape {
                    self.go_home(now_ms);
                    return;
                }
                self.ship.step_inside(&intent, &self.tuning.ship, dt);
                self.camera.snap_to(&self.ship);
            }
        }
    }

    fn arcade_frame(&mut self, now_ms: f64, dt: f32) {
        let input = self.input.take_arcade_input();
        if input.exit {
            self.exit_arcade();
            return;
        }

        arcade::tick(&mut self.arcade, &input, dt, now_ms);
        for event in self.arcade.drain_events() {
            if let ArcadeEvent::GameOver { score, wave } = event {
                self.submit_score(score, wave, now_ms);
            }
        }
    }

    fn submit_score(&mut self, score: u64, wave: u32, now_ms: f64) {
        let record = HighScoreRecord {
            score,
            wave,
            player_id: self.sync.player_id().to_string(),
            timestamp: now_ms,
        };
        let rank = match self.high_scores.submit(&self.store, record) {
            Ok(rank) => rank,
            Err(e) => {
                log::warn!("Failed to submit score {}: {}", score, e);
                None
            }
        };
        self.events.push(SessionEvent::ArcadeGameOver {
            score,
            wave,
            rank,
            personal_best: self.high_scores.personal_best(),
        });
    }

    /// Fire if the weapon is usable and cooled down
    fn fire(&mut self, now_ms: f64) -> bool {
        if !self.alive || !self.nav.is_free_flight() || self.arcade.is_active() {
            return false;
        }
        let Some(shot) = self
            .lasers
            .try_fire(self.ship.position, self.ship.forward(), now_ms)
        else {
            return false;
        };
        let record = self.sync.send_laser(shot.origin, shot.direction, now_ms);
        self.lasers.add_local(record.id.clone(), shot, now_ms);
        self.events.push(SessionEvent::LaserFired { id: record.id });
        true
    }

    fn respawn(&mut self, now_ms: f64) {
        let position = self.sync.respawn(now_ms);
        self.ship.teleport(position);
        self.camera.snap_to(&self.ship);
        self.alive = true;
        self.events.push(SessionEvent::Respawned { position });
    }

    fn handle_sync_events(&mut self, now_ms: f64) {
        for event in self.sync.drain_events() {
            match event {
                SyncEvent::PeerListChanged => self.events.push(SessionEvent::PeersChanged),
                SyncEvent::ProjectileReceived(record) => {
                    self.lasers.add_remote(&record, now_ms);
                }
                SyncEvent::HitReceived { attacker } => {
                    self.alive = false;
                    self.ship.velocity = Vec3::ZERO;
                    self.ship.angular_velocity = Vec3::ZERO;
                    self.input.release_all();
                    self.timers
                        .schedule(now_ms + RESPAWN_DELAY_MS, SessionTimer::Respawn);
                    self.events.push(SessionEvent::Destroyed { attacker });
                }
            }
        }
    }

    fn handle_nav_event(&mut self, event: NavEvent, now_ms: f64) {
        match event {
            NavEvent::WarpStarted(id) => {
                self.input.release_all();
                self.events
                    .push(SessionEvent::WarpStarted { destination: id });
            }
            NavEvent::Arrived(id) => {
                self.camera.snap_to(&self.ship);
                self.events.push(SessionEvent::Arrived {
                    destination: id,
                    content: ContentView::for_destination(id),
                });
            }
            NavEvent::ReturnedHome => self.events.push(SessionEvent::ReturnedHome),
            NavEvent::ArcadeTriggered => self.start_arcade(now_ms),
        }
    }

    fn update_nearby(&mut self) {
        let nearby = self.nav.nearby().copied();
        let id = nearby.map(|n| n.id);
        if id != self.last_nearby {
            self.last_nearby = id;
            self.events.push(SessionEvent::NearbyChanged { nearby });
        }
    }

    /// Leave the room and drop the connection
    pub fn shutdown(&mut self) {
        self.timers.cancel_all();
        self.arcade.exit();
        self.lasers.clear();
        self.sync.leave();
        self.store.disconnect();
        log::info!("Session shut down");
    }

    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn view(&self, now_ms: f64) -> FrameView {
        FrameView {
            player_id: self.sync.player_id().to_string(),
            color: self.sync.color(),
            room: self.sync.room().map(str::to_string),
            ship: self.ship,
            speed: self.ship.speed(),
            camera: self.camera.pose,
            camera_view: self.settings.camera_view,
            nav_mode: self.nav.mode(),
            destination: self.nav.current().map(|d| d.id),
            content: self.nav.content_view(),
            nearby: self.nav.nearby().copied(),
            arcade_hint: self.nav.arcade_hint(),
            alive: self.alive,
            protected: self.sync.is_protected(now_ms),
            laser_cooldown_ms: self.lasers.cooldown_remaining(now_ms),
            projectiles: self.lasers.views(now_ms),
            peers: self.sync.visible_peers().cloned().collect(),
            arcade: self.arcade.is_active().then(|| self.arcade.clone()),
            never_planet: NeverPlanetView {
                position: self.never_planet.position,
                visibility: self.never_planet.visibility,
                caught: self.never_planet.is_caught(),
                catches: self.never_planet.catches(),
            },
            high_scores: self.high_scores.entries.clone(),
            personal_best: self.high_scores.personal_best(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::ARCADE_PLANET_POSITION;
    use crate::net::records::paths;
    use crate::net::store::MemoryStore;
    use crate::sim::arcade::{ArcadePhase, Enemy, EnemyKind};
    use crate::sim::never_planet::NEVER_PLANET_START;

    const DT: f32 = 1.0 / 60.0;
    const FRAME_MS: f64 = 1000.0 / 60.0;

    fn session(store: &MemoryStore, seed: u64) -> Session<MemoryStore> {
        Session::new(store.clone(), Tuning::default(), Settings::default(), seed)
    }

    fn run(session: &mut Session<MemoryStore>, from_ms: f64, frames: usize) -> f64 {
        let mut now = from_ms;
        for _ in 0..frames {
            now += FRAME_MS;
            session.frame(now, DT);
        }
        now
    }

    #[test]
    fn test_thrust_moves_forward_and_publishes() {
        let store = MemoryStore::new();
        let mut s = session(&store, 1);
        s.connect(0.0);
        s.key_down("KeyW", false);
        run(&mut s, 0.0, 30);

        assert!(s.ship().position.z < SHIP_START.z);
        let path = paths::player("room-1", s.sync().player_id());
        let published = store.get(&path).unwrap().unwrap();
        assert!(published["position"]["z"].as_f64().unwrap() < SHIP_START.z as f64);
    }

    #[test]
    fn test_fire_respects_cooldown() {
        let store = MemoryStore::new();
        let mut s = session(&store, 2);
        s.connect(0.0);

        s.request_fire();
        let now = run(&mut s, 0.0, 1);
        s.request_fire();
        run(&mut s, now, 1);

        let fired = s
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, SessionEvent::LaserFired { .. }))
            .count();
        assert_eq!(fired, 1);
        assert_eq!(store.child_count(&paths::room_lasers("room-1")), 1);
        assert_eq!(s.view(now).projectiles.len(), 1);
    }

    #[test]
    fn test_laser_destroys_peer_and_peer_respawns() {
        let store = MemoryStore::new();
        let mut a = session(&store, 3);
        let mut b = session(&store.connect_client(), 4);
        a.connect(0.0);
        b.connect(0.0);
        b.ship.teleport(Vec3::new(0.0, 0.0, -10.0));

        // Let both sides see each other
        let mut now = 0.0;
        for _ in 0..10 {
            now += FRAME_MS;
            a.frame(now, DT);
            b.frame(now, DT);
        }
        let b_id = b.sync().player_id().to_string();
        assert!(a.sync().peer(&b_id).is_some());

        a.request_fire();
        let mut destroyed_at = None;
        for _ in 0..300 {
            now += FRAME_MS;
            a.frame(now, DT);
            b.frame(now, DT);
            if destroyed_at.is_none() && !b.is_alive() {
                destroyed_at = Some(now);
            }
        }

        let a_events = a.drain_events();
        assert!(a_events.iter().any(
            |e| matches!(e, SessionEvent::PeerDestroyed { victim, .. } if *victim == b_id)
        ));

        let b_events = b.drain_events();
        let attacker = a.sync().player_id().to_string();
        assert!(b_events.contains(&SessionEvent::Destroyed { attacker }));
        assert!(destroyed_at.is_some());
        assert!(b_events
            .iter()
            .any(|e| matches!(e, SessionEvent::Respawned { .. })));
        assert!(b.is_alive());
    }

    #[test]
    fn test_no_firing_inside_destination() {
        let store = MemoryStore::new();
        let mut s = session(&store, 5);
        s.connect(0.0);
        s.navigate_to("about", 0.0);
        let now = run(&mut s, 0.0, 90);
        assert!(s.navigator().is_inside());

        let events = s.drain_events();
        assert!(events.contains(&SessionEvent::Arrived {
            destination: "about",
            content: Some(ContentView::Panel("about")),
        }));

        s.request_fire();
        run(&mut s, now, 1);
        assert!(s.drain_events().is_empty());
        assert_eq!(store.child_count(&paths::room_lasers("room-1")), 0);
    }

    #[test]
    fn test_escape_inside_goes_home() {
        let store = MemoryStore::new();
        let mut s = session(&store, 6);
        s.navigate_to("projects", 0.0);
        s.report_warp_progress(1.0, 10.0);
        assert!(s.navigator().is_inside());
        assert_eq!(s.view(10.0).content, Some(ContentView::Projects));

        s.key_down("Escape", false);
        run(&mut s, 10.0, 1);
        assert!(s.navigator().is_free_flight());
        assert!(s.drain_events().contains(&SessionEvent::ReturnedHome));
        assert_eq!(s.ship().position, crate::consts::HOME_POINT);
    }

    #[test]
    fn test_arcade_trigger_and_exit() {
        let store = MemoryStore::new();
        let mut s = session(&store, 7);
        s.ship.teleport(ARCADE_PLANET_POSITION);
        let now = run(&mut s, 0.0, 1);
        assert!(s.arcade().is_active());
        assert!(s.drain_events().contains(&SessionEvent::ArcadeStarted));

        s.key_down("Escape", false);
        run(&mut s, now, 1);
        assert!(!s.arcade().is_active());
        assert_eq!(s.ship().position, SHIP_START);
        assert!(s.drain_events().contains(&SessionEvent::ArcadeExited));
    }

    #[test]
    fn test_arcade_game_over_submits_score() {
        let store = MemoryStore::new();
        let mut s = session(&store, 8);
        s.connect(0.0);
        s.start_arcade(0.0);
        s.arcade.score = 1200;
        s.arcade.lives = 1;
        let id = s.arcade.next_entity_id();
        s.arcade.enemies.push(Enemy {
            id,
            kind: EnemyKind::Basic,
            x: 0.0,
            y: -11.0,
            health: 1,
        });

        s.frame(2500.0, DT);
        assert_eq!(s.arcade().phase, ArcadePhase::GameOver);
        assert!(s.drain_events().contains(&SessionEvent::ArcadeGameOver {
            score: 1200,
            wave: 1,
            rank: Some(1),
            personal_best: 1200,
        }));
        assert_eq!(store.child_count(paths::ARCADE_HIGHSCORES), 1);
    }

    #[test]
    fn test_offline_plays_solo() {
        let store = MemoryStore::new();
        store.set_offline(true);
        let mut s = session(&store, 9);
        s.connect(0.0);
        assert!(s.sync().is_connected());
        assert_eq!(s.sync().room(), None);

        s.request_fire();
        s.key_down("KeyW", false);
        run(&mut s, 0.0, 10);
        assert!(s
            .drain_events()
            .iter()
            .any(|e| matches!(e, SessionEvent::LaserFired { .. })));
        assert!(s.ship().position.z < SHIP_START.z);
    }

    #[test]
    fn test_never_planet_catch_is_counted() {
        let store = MemoryStore::new();
        let mut s = session(&store, 10);
        s.connect(0.0);
        s.ship.teleport(NEVER_PLANET_START + Vec3::X);
        run(&mut s, 0.0, 1);

        let events = s.drain_events();
        assert!(events
            .iter()
            .any(|e| matches!(e, SessionEvent::NeverPlanetCaught { catches: 1, .. })));
        assert_eq!(
            store.get(paths::NEVER_PLANET_CATCHES).unwrap(),
            Some(serde_json::json!(1))
        );
        assert!(s.view(0.0).never_planet.caught);
    }

    #[test]
    fn test_shutdown_removes_presence() {
        let store = MemoryStore::new();
        let mut s = session(&store, 11);
        s.connect(0.0);
        assert_eq!(store.child_count(&paths::room_players("room-1")), 1);

        s.shutdown();
        assert_eq!(store.child_count(&paths::room_players("room-1")), 0);
        assert!(!s.sync().is_connected());
    }

    #[test]
    fn test_view_serializes_camel_case() {
        let store = MemoryStore::new();
        let s = session(&store, 12);
        let value = serde_json::to_value(s.view(0.0)).unwrap();
        assert_eq!(value["alive"], serde_json::json!(true));
        assert!(value.get("navMode").is_some());
        assert!(value["arcade"].is_null());
    }

    #[test]
    fn test_camera_view_toggle_needs_pointer_lock() {
        let store = MemoryStore::new();
        let mut s = session(&store, 13);
        s.key_down("KeyV", false);
        let now = run(&mut s, 0.0, 1);
        assert_eq!(s.settings().camera_view, CameraView::FirstPerson);

        s.set_pointer_locked(true);
        s.key_down("KeyV", false);
        run(&mut s, now, 1);
        assert_eq!(s.settings().camera_view, CameraView::ThirdPerson);
    }
}
