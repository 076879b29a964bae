//! Multiplayer networking over a hosted key-value store
//!
//! - `store`: store client trait and the in-process implementation
//! - `records`: wire records and paths
//! - `sync`: room membership, pose replication, lasers and hits

pub mod records;
pub mod store;
pub mod sync;

pub use records::{HighScoreRecord, HitRecord, LaserRecord, PlayerRecord, Vec3Record};
pub use store::{MemoryStore, RemoteStore, StoreError, Subscription};
pub use sync::{Peer, SyncEvent, Synchronizer};
