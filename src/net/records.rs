//! Store record shapes
//!
//! Field names match what every other client writes (camelCase).

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Store paths
pub mod paths {
    pub fn room_players(room: &str) -> String {
        format!("rooms/{room}/players")
    }

    pub fn player(room: &str, id: &str) -> String {
        format!("rooms/{room}/players/{id}")
    }

    pub fn room_lasers(room: &str) -> String {
        format!("rooms/{room}/lasers")
    }

    pub fn laser(room: &str, id: &str) -> String {
        format!("rooms/{room}/lasers/{id}")
    }

    pub fn hit(room: &str, victim: &str) -> String {
        format!("rooms/{room}/hits/{victim}")
    }

    pub const NEVER_PLANET_CATCHES: &str = "neverPlanet/catches";
    pub const ARCADE_HIGHSCORES: &str = "arcade/highscores";
}

/// `{x, y, z}` triple
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3Record {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl From<Vec3> for Vec3Record {
    fn from(v: Vec3) -> Self {
        Self {
            x: v.x,
            y: v.y,
            z: v.z,
        }
    }
}

impl From<Vec3Record> for Vec3 {
    fn from(r: Vec3Record) -> Self {
        Vec3::new(r.x, r.y, r.z)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerRecord {
    pub id: String,
    pub color: String,
    pub position: Vec3Record,
    pub rotation: Vec3Record,
    #[serde(default)]
    pub is_protected: bool,
    /// Wall-clock ms of the writer
    pub last_update: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaserRecord {
    pub id: String,
    pub player_id: String,
    pub origin: Vec3Record,
    pub direction: Vec3Record,
    pub timestamp: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HitRecord {
    pub attacker_id: String,
    pub timestamp: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HighScoreRecord {
    pub score: u64,
    pub wave: u32,
    pub player_id: String,
    pub timestamp: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_player_record_wire_names() {
        let record = PlayerRecord {
            id: "p".into(),
            color: "#ef4444".into(),
            position: Vec3::new(1.0, 2.0, 3.0).into(),
            rotation: Vec3Record::default(),
            is_protected: true,
            last_update: 10.0,
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["isProtected"], json!(true));
        assert_eq!(value["lastUpdate"], json!(10.0));
        assert_eq!(value["position"]["y"], json!(2.0));
    }

    #[test]
    fn test_player_record_missing_protected_defaults() {
        let value = json!({
            "id": "p", "color": "#fff",
            "position": {"x": 0, "y": 0, "z": 0},
            "rotation": {"x": 0, "y": 0, "z": 0},
            "lastUpdate": 5
        });
        let record: PlayerRecord = serde_json::from_value(value).unwrap();
        assert!(!record.is_protected);
    }

    #[test]
    fn test_paths() {
        assert_eq!(paths::player("room-3", "abc"), "rooms/room-3/players/abc");
        assert_eq!(paths::hit("room-1", "v"), "rooms/room-1/hits/v");
    }
}
