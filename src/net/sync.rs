//! Multiplayer synchronizer
//!
//! Best-effort replication of ship poses, lasers and hits through the remote
//! store. Every store error is logged and swallowed: the local game never
//! stops because the network did.

use std::collections::{BTreeMap, HashSet};

use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::Serialize;
use serde_json::Value;

use super::records::{HitRecord, LaserRecord, PlayerRecord, paths};
use super::store::{RemoteStore, StoreError, Subscription};
use crate::consts::{RESPAWN_HALF_EXTENTS, ROOM_COUNT, SHIP_COLORS, SHIP_START};
use crate::timers::Timers;
use crate::tuning::SyncTuning;

/// A remote player as last reported
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Peer {
    pub id: String,
    pub color: String,
    pub position: Vec3,
    pub rotation: Vec3,
    pub protected: bool,
    pub last_update: f64,
}

impl From<PlayerRecord> for Peer {
    fn from(r: PlayerRecord) -> Self {
        Self {
            id: r.id,
            color: r.color,
            position: r.position.into(),
            rotation: r.rotation.into(),
            protected: r.is_protected,
            last_update: r.last_update,
        }
    }
}

/// Notifications for the session, drained once per frame
#[derive(Debug, Clone, PartialEq)]
pub enum SyncEvent {
    PeerListChanged,
    ProjectileReceived(LaserRecord),
    HitReceived { attacker: String },
}

#[derive(Debug, Clone, PartialEq)]
enum SyncTimer {
    RemoveLaser(String),
}

#[derive(Debug, Clone)]
struct RoomSubscriptions {
    players: Subscription,
    lasers: Subscription,
    hit: Subscription,
}

pub struct Synchronizer<S: RemoteStore> {
    store: S,
    tuning: SyncTuning,
    rng: Pcg32,
    player_id: String,
    color: &'static str,
    room: Option<String>,
    connected: bool,
    alive: bool,
    /// Latest "inside a destination" flag from the session
    inside_destination: bool,
    protected_until_ms: f64,
    last_publish_ms: Option<f64>,
    laser_seq: u64,
    /// Sorted by id for a stable iteration order
    peers: BTreeMap<String, Peer>,
    seen_lasers: HashSet<String>,
    subscriptions: Option<RoomSubscriptions>,
    timers: Timers<SyncTimer>,
    events: Vec<SyncEvent>,
}

impl<S: RemoteStore> Synchronizer<S> {
    /// Pick a random identity. Nothing touches the store until `connect`.
    pub fn new(store: S, tuning: SyncTuning, seed: u64) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        let uuid = uuid::Builder::from_random_bytes(rng.random()).into_uuid();
        let player_id = format!("player-{}", uuid.simple());
        let color = SHIP_COLORS[rng.random_range(0..SHIP_COLORS.len())];

        Self {
            store,
            tuning,
            rng,
            player_id,
            color,
            room: None,
            connected: false,
            alive: true,
            inside_destination: false,
            protected_until_ms: 0.0,
            last_publish_ms: None,
            laser_seq: 0,
            peers: BTreeMap::new(),
            seen_lasers: HashSet::new(),
            subscriptions: None,
            timers: Timers::new(),
            events: Vec::new(),
        }
    }

    pub fn player_id(&self) -> &str {
        &self.player_id
    }

    pub fn color(&self) -> &'static str {
        self.color
    }

    pub fn room(&self) -> Option<&str> {
        self.room.as_deref()
    }

    /// True once room selection finished, solo included
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    /// Whether incoming hits are ignored right now
    pub fn is_protected(&self, now_ms: f64) -> bool {
        self.inside_destination || now_ms < self.protected_until_ms
    }

    pub fn peers(&self) -> impl Iterator<Item = &Peer> {
        self.peers.values()
    }

    /// Peers that can be shown and shot
    pub fn visible_peers(&self) -> impl Iterator<Item = &Peer> {
        self.peers.values().filter(|p| !p.protected)
    }

    pub fn peer(&self, id: &str) -> Option<&Peer> {
        self.peers.get(id)
    }

    pub fn drain_events(&mut self) -> Vec<SyncEvent> {
        std::mem::take(&mut self.events)
    }

    fn own_record(&self, position: Vec3, rotation: Vec3, protected: bool, now_ms: f64) -> PlayerRecord {
        PlayerRecord {
            id: self.player_id.clone(),
            color: self.color.to_string(),
            position: position.into(),
            rotation: rotation.into(),
            is_protected: protected,
            last_update: now_ms,
        }
    }

    fn room_player_count(&self, room: &str) -> Result<usize, StoreError> {
        let count = match self.store.get(&paths::room_players(room))? {
            Some(Value::Object(players)) => players.len(),
            _ => 0,
        };
        Ok(count)
    }

    fn write_own_record(&self, room: &str, record: &PlayerRecord) -> Result<(), StoreError> {
        let path = paths::player(room, &self.player_id);
        self.store.set_as(&path, record)?;
        self.store.on_disconnect_remove(&path)?;
        Ok(())
    }

    /// Check rooms in order and join the first with spare capacity, else play solo
    pub fn connect(&mut self, now_ms: f64) {
        if self.connected {
            return;
        }

        for i in 1..=ROOM_COUNT {
            let room = format!("room-{i}");
            let count = match self.room_player_count(&room) {
                Ok(count) => count,
                Err(e) => {
                    log::warn!("Failed to read {}: {}", room, e);
                    continue;
                }
            };
            log::debug!("{}: {} players", room, count);
            if count >= self.tuning.room_capacity {
                continue;
            }

            // Another client may take the last slot between the count and the join
            let record = self.own_record(SHIP_START, Vec3::ZERO, false, now_ms);
            match self.write_own_record(&room, &record) {
                Ok(()) => {
                    log::info!("Joined {} as {} ({})", room, self.player_id, self.color);
                    self.subscriptions = Some(RoomSubscriptions {
                        players: Subscription::new(paths::room_players(&room)),
                        lasers: Subscription::new(paths::room_lasers(&room)),
                        hit: Subscription::new(paths::hit(&room, &self.player_id)),
                    });
                    self.room = Some(room);
                    self.last_publish_ms = Some(now_ms);
                }
                Err(e) => log::warn!("Failed to join {}, playing solo: {}", room, e),
            }
            self.connected = true;
            return;
        }

        log::info!("No room available, playing solo");
        self.connected = true;
    }

    /// Publish the local pose, at most once per publish interval
    pub fn update_position(&mut self, position: Vec3, rotation: Vec3, inside: bool, now_ms: f64) {
        self.inside_destination = inside;
        let Some(room) = self.room.clone() else {
            return;
        };
        if !self.alive {
            return;
        }
        if let Some(last) = self.last_publish_ms
            && now_ms - last < self.tuning.publish_interval_ms
        {
            return;
        }
        self.last_publish_ms = Some(now_ms);

        let record = self.own_record(position, rotation, self.is_protected(now_ms), now_ms);
        if let Err(e) = self.store.set_as(&paths::player(&room, &self.player_id), &record) {
            log::warn!("Position publish failed: {}", e);
        }
    }

    /// Reconcile the peer set with a full `players` snapshot
    pub fn apply_players_snapshot(&mut self, snapshot: Option<Value>, now_ms: f64) {
        let entries = match snapshot {
            Some(Value::Object(map)) => map,
            _ => Default::default(),
        };
        let mut changed = false;

        for (id, value) in &entries {
            if *id == self.player_id {
                continue;
            }
            let record: PlayerRecord = match serde_json::from_value(value.clone()) {
                Ok(record) => record,
                Err(e) => {
                    log::debug!("Skipping malformed player {}: {}", id, e);
                    continue;
                }
            };

            if now_ms - record.last_update > self.tuning.peer_timeout_ms {
                log::debug!("Peer {} timed out", id);
                if self.peers.remove(id).is_some() {
                    changed = true;
                }
                if let Some(room) = &self.room
                    && let Err(e) = self.store.remove(&paths::player(room, id))
                {
                    log::warn!("Failed to remove stale peer {}: {}", id, e);
                }
                continue;
            }

            let peer = Peer::from(record);
            // Out-of-order delivery never rewinds a peer
            let replace = match self.peers.get(id) {
                Some(held) => held.last_update <= peer.last_update && *held != peer,
                None => {
                    log::debug!("Peer {} joined", id);
                    true
                }
            };
            if replace {
                self.peers.insert(id.clone(), peer);
                changed = true;
            }
        }

        let before = self.peers.len();
        self.peers.retain(|id, _| entries.contains_key(id));
        if self.peers.len() != before {
            changed = true;
        }

        if changed {
            self.events.push(SyncEvent::PeerListChanged);
        }
    }

    /// Surface lasers fired by others, each exactly once
    pub fn apply_lasers_snapshot(&mut self, snapshot: Option<Value>, now_ms: f64) {
        let entries = match snapshot {
            Some(Value::Object(map)) => map,
            _ => Default::default(),
        };

        for (key, value) in &entries {
            if !self.seen_lasers.insert(key.clone()) {
                continue;
            }
            let record: LaserRecord = match serde_json::from_value(value.clone()) {
                Ok(record) => record,
                Err(e) => {
                    log::debug!("Skipping malformed laser {}: {}", key, e);
                    continue;
                }
            };
            if record.player_id == self.player_id {
                continue;
            }
            self.timers.schedule(
                now_ms + self.tuning.laser_cleanup_ms,
                SyncTimer::RemoveLaser(key.clone()),
            );
            self.events.push(SyncEvent::ProjectileReceived(record));
        }

        self.seen_lasers.retain(|key| entries.contains_key(key));
    }

    /// React to a hit record addressed to us
    pub fn apply_hit(&mut self, snapshot: Option<Value>, now_ms: f64) {
        let Some(value) = snapshot else {
            return;
        };
        let Some(room) = self.room.clone() else {
            return;
        };
        let hit_path = paths::hit(&room, &self.player_id);

        let hit: HitRecord = match serde_json::from_value(value) {
            Ok(hit) => hit,
            Err(e) => {
                log::debug!("Discarding malformed hit: {}", e);
                self.remove_logged(&hit_path);
                return;
            }
        };

        if !self.alive || self.is_protected(now_ms) {
            log::debug!("Ignoring hit from {} while protected", hit.attacker_id);
            self.remove_logged(&hit_path);
            return;
        }

        log::info!("Destroyed by {}", hit.attacker_id);
        self.remove_logged(&paths::player(&room, &self.player_id));
        self.remove_logged(&hit_path);
        self.alive = false;
        self.events.push(SyncEvent::HitReceived {
            attacker: hit.attacker_id,
        });
    }

    fn remove_logged(&self, path: &str) {
        if let Err(e) = self.store.remove(path) {
            log::warn!("Failed to remove {}: {}", path, e);
        }
    }

    /// Come back at a random point with temporary protection. Returns the spawn point.
    pub fn respawn(&mut self, now_ms: f64) -> Vec3 {
        let h = RESPAWN_HALF_EXTENTS;
        let position = Vec3::new(
            self.rng.random_range(-h.x..=h.x),
            self.rng.random_range(-h.y..=h.y),
            self.rng.random_range(-h.z..=h.z),
        );
        self.alive = true;
        self.protected_until_ms = now_ms + self.tuning.respawn_protection_ms;

        if let Some(room) = self.room.clone() {
            let record = self.own_record(position, Vec3::ZERO, true, now_ms);
            match self.write_own_record(&room, &record) {
                Ok(()) => log::info!("Respawned at {:?}", position),
                Err(e) => log::warn!("Respawn publish failed: {}", e),
            }
            self.last_publish_ms = Some(now_ms);
        }
        position
    }

    /// Announce a local shot. The returned record carries the projectile id.
    pub fn send_laser(&mut self, origin: Vec3, direction: Vec3, now_ms: f64) -> LaserRecord {
        self.laser_seq += 1;
        let record = LaserRecord {
            id: format!("laser-{}-{}", self.player_id, self.laser_seq),
            player_id: self.player_id.clone(),
            origin: origin.into(),
            direction: direction.into(),
            timestamp: now_ms,
        };

        if let Some(room) = &self.room {
            match self.store.set_as(&paths::laser(room, &record.id), &record) {
                Ok(()) => {
                    // Peers clean up what they receive; this covers an empty room
                    self.timers.schedule(
                        now_ms + self.tuning.laser_cleanup_ms,
                        SyncTimer::RemoveLaser(record.id.clone()),
                    );
                }
                Err(e) => log::warn!("Laser publish failed: {}", e),
            }
        }
        record
    }

    /// Report a hit on `victim`. Concurrent reports resolve to the earliest timestamp.
    pub fn send_hit(&mut self, victim: &str, now_ms: f64) {
        let Some(room) = &self.room else {
            return;
        };
        let record = HitRecord {
            attacker_id: self.player_id.clone(),
            timestamp: now_ms,
        };
        let value = match serde_json::to_value(&record) {
            Ok(value) => value,
            Err(e) => {
                log::warn!("Hit encode failed: {}", e);
                return;
            }
        };

        let result = self.store.transaction(&paths::hit(room, victim), |current| {
            let earlier = current
                .and_then(|v| serde_json::from_value::<HitRecord>(v).ok())
                .is_some_and(|held| held.timestamp <= now_ms);
            if earlier { None } else { Some(value) }
        });
        match result {
            Ok(true) => log::debug!("Hit on {} recorded", victim),
            Ok(false) => log::debug!("Hit on {} already claimed", victim),
            Err(e) => log::warn!("Hit publish failed: {}", e),
        }
    }

    /// Poll room subscriptions and fire due timers
    pub fn poll(&mut self, now_ms: f64) {
        if let Some(mut subs) = self.subscriptions.take() {
            match subs.players.poll(&self.store) {
                Ok(Some(snapshot)) => self.apply_players_snapshot(snapshot, now_ms),
                Ok(None) => {}
                Err(e) => log::warn!("Players poll failed: {}", e),
            }
            match subs.lasers.poll(&self.store) {
                Ok(Some(snapshot)) => self.apply_lasers_snapshot(snapshot, now_ms),
                Ok(None) => {}
                Err(e) => log::warn!("Lasers poll failed: {}", e),
            }
            match subs.hit.poll(&self.store) {
                Ok(Some(snapshot)) => self.apply_hit(snapshot, now_ms),
                Ok(None) => {}
                Err(e) => log::warn!("Hit poll failed: {}", e),
            }
            // Leave may have run from inside a handler
            if self.room.is_some() {
                self.subscriptions = Some(subs);
            }
        }

        for timer in self.timers.poll(now_ms) {
            match timer {
                SyncTimer::RemoveLaser(id) => {
                    if let Some(room) = &self.room {
                        self.remove_logged(&paths::laser(room, &id));
                    }
                }
            }
        }
    }

    /// Remove our record and stop all pending work
    pub fn leave(&mut self) {
        self.timers.cancel_all();
        if let Some(room) = self.room.take() {
            self.remove_logged(&paths::player(&room, &self.player_id));
            log::info!("Left {}", room);
        }
        self.subscriptions = None;
        self.peers.clear();
        self.seen_lasers.clear();
        self.connected = false;
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::store::MemoryStore;
    use serde_json::json;

    fn sync(store: &MemoryStore, seed: u64) -> Synchronizer<MemoryStore> {
        Synchronizer::new(store.clone(), SyncTuning::default(), seed)
    }

    fn peer_json(id: &str, last_update: f64) -> Value {
        json!({
            "id": id, "color": "#ef4444",
            "position": {"x": 1.0, "y": 2.0, "z": 3.0},
            "rotation": {"x": 0.0, "y": 0.0, "z": 0.0},
            "isProtected": false,
            "lastUpdate": last_update
        })
    }

    #[test]
    fn test_identity_is_seeded() {
        let store = MemoryStore::new();
        let a = sync(&store, 7);
        let b = sync(&store, 7);
        let c = sync(&store, 8);
        assert_eq!(a.player_id(), b.player_id());
        assert_ne!(a.player_id(), c.player_id());
        assert!(a.player_id().starts_with("player-"));
        assert!(SHIP_COLORS.contains(&a.color()));
    }

    #[test]
    fn test_connect_joins_first_room_with_space() {
        let store = MemoryStore::new();
        let other = store.connect_client();
        for i in 0..10 {
            other
                .set(&paths::player("room-1", &format!("p{i}")), peer_json("x", 0.0))
                .unwrap();
        }

        let mut s = sync(&store, 1);
        s.connect(1000.0);
        assert!(s.is_connected());
        assert_eq!(s.room(), Some("room-2"));
        let record: PlayerRecord = store
            .get_as(&paths::player("room-2", s.player_id()))
            .unwrap()
            .unwrap();
        assert!(!record.is_protected);
        assert_eq!(record.last_update, 1000.0);

        // Disconnect hook registered
        store.disconnect();
        assert_eq!(other.child_count("rooms/room-2/players"), 0);
    }

    #[test]
    fn test_full_rooms_play_solo_without_writes() {
        let store = MemoryStore::new();
        let other = store.connect_client();
        for room in 1..=ROOM_COUNT {
            for i in 0..10 {
                other
                    .set(
                        &paths::player(&format!("room-{room}"), &format!("p{i}")),
                        peer_json("x", 0.0),
                    )
                    .unwrap();
            }
        }
        let revision = store.revision("rooms");

        let mut s = sync(&store, 1);
        s.connect(0.0);
        assert!(s.is_connected());
        assert_eq!(s.room(), None);

        s.update_position(Vec3::ONE, Vec3::ZERO, false, 100.0);
        s.send_laser(Vec3::ZERO, Vec3::NEG_Z, 100.0);
        s.send_hit("p1", 100.0);
        s.respawn(200.0);
        assert_eq!(store.revision("rooms"), revision);
    }

    #[test]
    fn test_join_failure_falls_back_to_solo() {
        let store = MemoryStore::new();
        store.reject_writes_under("rooms");
        let mut s = sync(&store, 1);
        s.connect(0.0);
        assert!(s.is_connected());
        assert_eq!(s.room(), None);
    }

    #[test]
    fn test_offline_store_plays_solo() {
        let store = MemoryStore::new();
        store.set_offline(true);
        let mut s = sync(&store, 1);
        s.connect(0.0);
        assert!(s.is_connected());
        assert_eq!(s.room(), None);
    }

    #[test]
    fn test_publish_is_throttled() {
        let store = MemoryStore::new();
        let mut s = sync(&store, 1);
        s.connect(0.0);
        let path = paths::player("room-1", s.player_id());

        s.update_position(Vec3::X, Vec3::ZERO, false, 60.0);
        s.update_position(Vec3::Y, Vec3::ZERO, false, 80.0);
        let record: PlayerRecord = store.get_as(&path).unwrap().unwrap();
        assert_eq!(record.last_update, 60.0);
        assert_eq!(Vec3::from(record.position), Vec3::X);

        s.update_position(Vec3::Z, Vec3::ZERO, true, 110.0);
        let record: PlayerRecord = store.get_as(&path).unwrap().unwrap();
        assert_eq!(Vec3::from(record.position), Vec3::Z);
        assert!(record.is_protected);
    }

    #[test]
    fn test_players_snapshot_is_idempotent() {
        let store = MemoryStore::new();
        let mut s = sync(&store, 1);
        let snapshot = json!({ "a": peer_json("a", 1000.0), "b": peer_json("b", 1000.0) });

        s.apply_players_snapshot(Some(snapshot.clone()), 1500.0);
        let first: Vec<Peer> = s.peers().cloned().collect();
        assert_eq!(s.drain_events(), vec![SyncEvent::PeerListChanged]);

        s.apply_players_snapshot(Some(snapshot), 1500.0);
        let second: Vec<Peer> = s.peers().cloned().collect();
        assert_eq!(first, second);
        assert!(s.drain_events().is_empty());
    }

    #[test]
    fn test_stale_peer_removed_locally_and_remotely() {
        let store = MemoryStore::new();
        let mut s = sync(&store, 1);
        s.connect(0.0);
        let other = store.connect_client();
        other
            .set(&paths::player("room-1", "old"), peer_json("old", 0.0))
            .unwrap();

        s.apply_players_snapshot(Some(json!({ "old": peer_json("old", 1000.0) })), 1500.0);
        assert!(s.peer("old").is_some());

        s.apply_players_snapshot(Some(json!({ "old": peer_json("old", 1000.0) })), 3500.0);
        assert!(s.peer("old").is_none());
        assert_eq!(store.get(&paths::player("room-1", "old")).unwrap(), None);
    }

    #[test]
    fn test_older_record_never_replaces_newer() {
        let store = MemoryStore::new();
        let mut s = sync(&store, 1);
        s.apply_players_snapshot(Some(json!({ "a": peer_json("a", 1000.0) })), 1000.0);

        let mut old = peer_json("a", 900.0);
        old["position"] = json!({"x": 9.0, "y": 9.0, "z": 9.0});
        s.apply_players_snapshot(Some(json!({ "a": old })), 1000.0);
        let peer = s.peer("a").unwrap();
        assert_eq!(peer.last_update, 1000.0);
        assert_eq!(peer.position, Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_absent_peer_is_removed() {
        let store = MemoryStore::new();
        let mut s = sync(&store, 1);
        s.apply_players_snapshot(Some(json!({ "a": peer_json("a", 1000.0) })), 1000.0);
        s.drain_events();
        s.apply_players_snapshot(None, 1000.0);
        assert_eq!(s.peers().count(), 0);
        assert_eq!(s.drain_events(), vec![SyncEvent::PeerListChanged]);
    }

    #[test]
    fn test_protected_peers_hidden() {
        let store = MemoryStore::new();
        let mut s = sync(&store, 1);
        let mut shielded = peer_json("b", 1000.0);
        shielded["isProtected"] = json!(true);
        s.apply_players_snapshot(
            Some(json!({ "a": peer_json("a", 1000.0), "b": shielded })),
            1000.0,
        );
        let visible: Vec<&str> = s.visible_peers().map(|p| p.id.as_str()).collect();
        assert_eq!(visible, vec!["a"]);
    }

    #[test]
    fn test_lasers_surface_once_and_get_cleaned_up() {
        let store = MemoryStore::new();
        let mut s = sync(&store, 1);
        s.connect(0.0);
        let own = s.player_id().to_string();

        let laser = |id: &str, player: &str| {
            json!({
                "id": id, "playerId": player,
                "origin": {"x": 0.0, "y": 0.0, "z": 0.0},
                "direction": {"x": 0.0, "y": 0.0, "z": -1.0},
                "timestamp": 100.0
            })
        };
        let other = store.connect_client();
        other.set(&paths::laser("room-1", "l1"), laser("l1", "enemy")).unwrap();
        other.set(&paths::laser("room-1", "mine"), laser("mine", &own)).unwrap();

        s.poll(100.0);
        let received: Vec<SyncEvent> = s
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, SyncEvent::ProjectileReceived(_)))
            .collect();
        assert_eq!(received.len(), 1);

        // Redelivery of the same snapshot is ignored
        let snapshot = store.get("rooms/room-1/lasers").unwrap();
        s.apply_lasers_snapshot(snapshot, 150.0);
        assert!(s.drain_events().is_empty());

        s.poll(2100.0);
        assert_eq!(store.get(&paths::laser("room-1", "l1")).unwrap(), None);
        assert!(store.get(&paths::laser("room-1", "mine")).unwrap().is_some());
    }

    #[test]
    fn test_own_and_malformed_lasers_marked_seen() {
        let store = MemoryStore::new();
        let mut s = sync(&store, 1);
        s.connect(0.0);
        let own = s.player_id().to_string();
        s.drain_events();

        let snapshot = json!({
            "mine": {
                "id": "mine", "playerId": own,
                "origin": {"x": 0.0, "y": 0.0, "z": 0.0},
                "direction": {"x": 0.0, "y": 0.0, "z": -1.0},
                "timestamp": 100.0
            },
            "junk": {"id": 7}
        });
        s.apply_lasers_snapshot(Some(snapshot), 100.0);
        assert!(s.seen_lasers.contains("mine"));
        assert!(s.seen_lasers.contains("junk"));
        assert!(s.drain_events().is_empty());
        assert!(s.timers.is_empty());

        s.apply_lasers_snapshot(None, 200.0);
        assert!(s.seen_lasers.is_empty());
    }

    #[test]
    fn test_hit_kills_unprotected_player() {
        let store = MemoryStore::new();
        let mut s = sync(&store, 1);
        s.connect(0.0);
        let other = store.connect_client();
        other
            .set(
                &paths::hit("room-1", s.player_id()),
                json!({"attackerId": "enemy", "timestamp": 50.0}),
            )
            .unwrap();

        s.poll(100.0);
        assert!(!s.is_alive());
        assert!(
            s.drain_events()
                .contains(&SyncEvent::HitReceived { attacker: "enemy".into() })
        );
        assert_eq!(store.get(&paths::player("room-1", s.player_id())).unwrap(), None);
        assert_eq!(store.get(&paths::hit("room-1", s.player_id())).unwrap(), None);

        // Dead ships do not publish
        s.update_position(Vec3::ONE, Vec3::ZERO, false, 500.0);
        assert_eq!(store.get(&paths::player("room-1", s.player_id())).unwrap(), None);
    }

    #[test]
    fn test_hit_ignored_during_respawn_protection() {
        let store = MemoryStore::new();
        let mut s = sync(&store, 1);
        s.connect(0.0);
        let pos = s.respawn(1000.0);
        assert!(pos.x.abs() <= 30.0 && pos.y.abs() <= 20.0 && pos.z.abs() <= 30.0);
        let record: PlayerRecord = store
            .get_as(&paths::player("room-1", s.player_id()))
            .unwrap()
            .unwrap();
        assert!(record.is_protected);

        s.apply_hit(Some(json!({"attackerId": "enemy", "timestamp": 1500.0})), 1500.0);
        assert!(s.is_alive());
        assert!(s.drain_events().is_empty());

        s.apply_hit(Some(json!({"attackerId": "enemy", "timestamp": 4500.0})), 4500.0);
        assert!(!s.is_alive());
    }

    #[test]
    fn test_hit_ignored_inside_destination() {
        let store = MemoryStore::new();
        let mut s = sync(&store, 1);
        s.connect(0.0);
        s.update_position(Vec3::ZERO, Vec3::ZERO, true, 100.0);
        s.apply_hit(Some(json!({"attackerId": "enemy", "timestamp": 100.0})), 100.0);
        assert!(s.is_alive());
    }

    #[test]
    fn test_earliest_hit_wins() {
        let store = MemoryStore::new();
        let mut a = sync(&store, 1);
        let mut b = Synchronizer::new(store.connect_client(), SyncTuning::default(), 2);
        a.connect(0.0);
        b.connect(0.0);

        b.send_hit("victim", 200.0);
        a.send_hit("victim", 100.0);
        let hit: HitRecord = store
            .get_as(&paths::hit("room-1", "victim"))
            .unwrap()
            .unwrap();
        assert_eq!(hit.attacker_id, a.player_id());

        b.send_hit("victim", 300.0);
        let hit: HitRecord = store
            .get_as(&paths::hit("room-1", "victim"))
            .unwrap()
            .unwrap();
        assert_eq!(hit.timestamp, 100.0);
    }

    #[test]
    fn test_two_clients_see_each_other() {
        let store = MemoryStore::new();
        let mut a = sync(&store, 1);
        let mut b = Synchronizer::new(store.connect_client(), SyncTuning::default(), 2);
        a.connect(0.0);
        b.connect(10.0);
        assert_eq!(b.room(), Some("room-1"));

        a.update_position(Vec3::new(5.0, 0.0, 0.0), Vec3::ZERO, false, 100.0);
        b.poll(120.0);
        let seen = b.peer(a.player_id()).unwrap();
        assert_eq!(seen.position, Vec3::new(5.0, 0.0, 0.0));
        assert!(b.peer(b.player_id()).is_none());
    }

    #[test]
    fn test_leave_removes_record_and_timers() {
        let store = MemoryStore::new();
        let mut s = sync(&store, 1);
        s.connect(0.0);
        s.send_laser(Vec3::ZERO, Vec3::NEG_Z, 10.0);
        assert_eq!(s.pending_timers(), 1);

        s.leave();
        assert_eq!(s.pending_timers(), 0);
        assert_eq!(s.room(), None);
        assert_eq!(store.get(&paths::player("room-1", s.player_id())).unwrap(), None);
    }

    #[test]
    fn test_store_errors_are_swallowed() {
        let store = MemoryStore::new();
        let mut s = sync(&store, 1);
        s.connect(0.0);
        store.set_offline(true);
        s.update_position(Vec3::ONE, Vec3::ZERO, false, 100.0);
        s.send_laser(Vec3::ZERO, Vec3::NEG_Z, 100.0);
        s.send_hit("x", 100.0);
        s.poll(200.0);
        s.respawn(300.0);
        assert_eq!(s.room(), Some("room-1"));
    }
}
