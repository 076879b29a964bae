//! Arcade high score leaderboard
//!
//! Scores live in the remote store under `arcade/highscores`, one pushed
//! record per finished game. The local copy keeps the top 10 and the
//! player's personal best for this session.

use serde_json::Value;

use crate::net::records::{HighScoreRecord, paths};
use crate::net::store::{RemoteStore, StoreError};

/// Maximum number of high scores to keep
pub const MAX_HIGH_SCORES: usize = 10;

/// High score leaderboard
#[derive(Debug, Clone, Default)]
pub struct HighScores {
    /// Sorted by score, descending
    pub entries: Vec<HighScoreRecord>,
    personal_best: u64,
}

impl HighScores {
    /// Create empty leaderboard
    pub fn new() -> Self {
        Self::default()
    }

    fn replace_entries(&mut self, snapshot: Option<Value>) {
        let mut entries: Vec<HighScoreRecord> = match snapshot {
            Some(Value::Object(map)) => map
                .into_iter()
                .filter_map(|(key, value)| match serde_json::from_value(value) {
                    Ok(record) => Some(record),
                    Err(e) => {
                        log::debug!("Skipping malformed score {}: {}", key, e);
                        None
                    }
                })
                .collect(),
            _ => Vec::new(),
        };
        // Equal scores: the older one ranks higher
        entries.sort_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then(a.timestamp.total_cmp(&b.timestamp))
        });
        entries.truncate(MAX_HIGH_SCORES);
        self.entries = entries;
    }

    /// Re-read the leaderboard from the store
    pub fn refresh<S: RemoteStore>(&mut self, store: &S) -> Result<(), StoreError> {
        let snapshot = store.get(paths::ARCADE_HIGHSCORES)?;
        self.replace_entries(snapshot);
        Ok(())
    }

    /// Record a finished game: updates the personal best and pushes a non-zero
    /// score to the store. Returns the leaderboard rank achieved, if any.
    pub fn submit<S: RemoteStore>(
        &mut self,
        store: &S,
        record: HighScoreRecord,
    ) -> Result<Option<usize>, StoreError> {
        if record.score == 0 {
            return Ok(None);
        }
        self.personal_best = self.personal_best.max(record.score);

        store.push(paths::ARCADE_HIGHSCORES, serde_json::to_value(&record)?)?;
        log::info!("Submitted score {} (wave {})", record.score, record.wave);
        Ok(self.insert(record))
    }

    /// Insert into the local top 10. Returns the rank (1-indexed) or None.
    fn insert(&mut self, record: HighScoreRecord) -> Option<usize> {
        // Ties rank below the entries already held
        let index = self
            .entries
            .iter()
            .position(|e| record.score > e.score)
            .unwrap_or(self.entries.len());
        if index >= MAX_HIGH_SCORES {
            return None;
        }
        self.entries.insert(index, record);
        self.entries.truncate(MAX_HIGH_SCORES);
        Some(index + 1)
    }

    /// Best score of this session
    pub fn personal_best(&self) -> u64 {
        self.personal_best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::store::MemoryStore;

    fn record(score: u64, timestamp: f64) -> HighScoreRecord {
        HighScoreRecord {
            score,
            wave: 1,
            player_id: "p".into(),
            timestamp,
        }
    }

    #[test]
    fn test_snapshot_sorted_and_capped() {
        let store = MemoryStore::new();
        for i in 0..15u64 {
            store
                .push(
                    paths::ARCADE_HIGHSCORES,
                    serde_json::to_value(record(i * 100, i as f64)).unwrap(),
                )
                .unwrap();
        }
        let mut scores = HighScores::new();
        scores.refresh(&store).unwrap();
        assert_eq!(scores.entries.len(), MAX_HIGH_SCORES);
        assert_eq!(scores.entries.first().map(|e| e.score), Some(1400));
        assert_eq!(scores.entries.last().map(|e| e.score), Some(500));
    }

    #[test]
    fn test_zero_score_not_submitted() {
        let store = MemoryStore::new();
        let mut scores = HighScores::new();
        assert_eq!(scores.submit(&store, record(0, 1.0)).unwrap(), None);
        assert_eq!(store.get(paths::ARCADE_HIGHSCORES).unwrap(), None);
    }

    #[test]
    fn test_submit_pushes_and_ranks() {
        let store = MemoryStore::new();
        let mut scores = HighScores::new();
        assert_eq!(scores.submit(&store, record(500, 1.0)).unwrap(), Some(1));
        assert_eq!(scores.submit(&store, record(900, 2.0)).unwrap(), Some(1));
        assert_eq!(scores.submit(&store, record(100, 3.0)).unwrap(), Some(3));
        assert_eq!(scores.personal_best(), 900);
        assert_eq!(store.child_count(paths::ARCADE_HIGHSCORES), 3);

        let mut reread = HighScores::new();
        reread.refresh(&store).unwrap();
        let order: Vec<u64> = reread.entries.iter().map(|e| e.score).collect();
        assert_eq!(order, vec![900, 500, 100]);
    }

    #[test]
    fn test_full_board_rejects_low_score() {
        let store = MemoryStore::new();
        let mut scores = HighScores::new();
        for i in 1..=10u64 {
            scores.submit(&store, record(i * 1000, i as f64)).unwrap();
        }
        assert_eq!(scores.submit(&store, record(500, 20.0)).unwrap(), None);
        assert_eq!(scores.submit(&store, record(1000, 21.0)).unwrap(), None);
        assert_eq!(scores.entries.len(), MAX_HIGH_SCORES);
        assert_eq!(scores.personal_best(), 10_000);

        assert_eq!(scores.submit(&store, record(10_500, 22.0)).unwrap(), Some(1));
        assert_eq!(scores.entries.len(), MAX_HIGH_SCORES);
        assert_eq!(scores.entries.last().map(|e| e.score), Some(2000));
        // Every game is still pushed, ranked or not
        assert_eq!(store.child_count(paths::ARCADE_HIGHSCORES), 13);
    }

    #[test]
    fn test_tied_score_ranks_below_existing() {
        let store = MemoryStore::new();
        let mut scores = HighScores::new();
        scores.submit(&store, record(700, 1.0)).unwrap();
        scores.submit(&store, record(300, 2.0)).unwrap();
        assert_eq!(scores.submit(&store, record(700, 3.0)).unwrap(), Some(2));
        let stamps: Vec<f64> = scores.entries.iter().map(|e| e.timestamp).collect();
        assert_eq!(stamps, vec![1.0, 3.0, 2.0]);
    }

    #[test]
    fn test_submit_offline_keeps_personal_best() {
        let store = MemoryStore::new();
        store.set_offline(true);
        let mut scores = HighScores::new();
        assert!(scores.submit(&store, record(300, 1.0)).is_err());
        assert_eq!(scores.personal_best(), 300);
    }
}
