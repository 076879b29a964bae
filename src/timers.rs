//! Session-scoped one-shot timers
//!
//! The frame loop polls a `Timers` set with the current time and receives the
//! payloads whose deadline passed, in deadline order. Each subsystem owns its
//! own set so a transition (leaving the arcade, disconnecting) can cancel every
//! pending timer at once with `cancel_all`.

#[derive(Debug, Clone)]
struct Entry<K> {
    seq: u64,
    due_ms: f64,
    payload: K,
}

/// A set of pending one-shot timers
#[derive(Debug, Clone)]
pub struct Timers<K> {
    entries: Vec<Entry<K>>,
    next_seq: u64,
}

impl<K> Default for Timers<K> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            next_seq: 0,
        }
    }
}

impl<K> Timers<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `payload` to fire at `due_ms`
    pub fn schedule(&mut self, due_ms: f64, payload: K) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.push(Entry {
            seq,
            due_ms,
            payload,
        });
    }

    /// Drop every pending timer
    pub fn cancel_all(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove and return every payload due at or before `now_ms`
    pub fn poll(&mut self, now_ms: f64) -> Vec<K> {
        let mut due: Vec<Entry<K>> = Vec::new();
        let mut i = 0;
        while i < self.entries.len() {
            if self.entries[i].due_ms <= now_ms {
                due.push(self.entries.swap_remove(i));
            } else {
                i += 1;
            }
        }
        // Deadline order, ties broken by scheduling order
        due.sort_by(|a, b| {
            a.due_ms
                .partial_cmp(&b.due_ms)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.seq.cmp(&b.seq))
        });
        due.into_iter().map(|e| e.payload).collect()
    }
}

impl<K: PartialEq> Timers<K> {
    /// Whether a timer with this payload is pending
    pub fn contains(&self, payload: &K) -> bool {
        self.entries.iter().any(|e| &e.payload == payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_poll_returns_due_in_order() {
        let mut timers = Timers::new();
        timers.schedule(300.0, "c");
        timers.schedule(100.0, "a");
        timers.schedule(200.0, "b");

        assert!(timers.poll(50.0).is_empty());
        assert_eq!(timers.poll(250.0), vec!["a", "b"]);
        assert_eq!(timers.len(), 1);
        assert_eq!(timers.poll(1000.0), vec!["c"]);
        assert!(timers.is_empty());
    }

    #[test]
    fn test_same_deadline_keeps_schedule_order() {
        let mut timers = Timers::new();
        timers.schedule(100.0, 1);
        timers.schedule(50.0, 0);
        timers.schedule(100.0, 2);
        timers.schedule(100.0, 3);
        assert_eq!(timers.poll(100.0), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_cancel_all_drops_pending() {
        let mut timers = Timers::new();
        timers.schedule(10.0, 3);
        timers.schedule(20.0, 4);
        assert!(timers.contains(&4));
        timers.cancel_all();
        assert!(!timers.contains(&4));
        assert!(timers.poll(1e9).is_empty());
    }
}
