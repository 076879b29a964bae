//! Hosted key-value store client abstraction
//!
//! The store is a JSON tree addressed by `/`-separated paths with
//! last-write-wins keys, disconnect hooks and single-key transactions.
//! `MemoryStore` keeps the tree in process. Handles cloned from one another
//! act as the same client; `MemoryStore::connect_client` opens another client
//! against the same tree.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// No connection to the store
    #[error("Store is offline")]
    Offline,

    /// Empty segment or reserved character in a path
    #[error("Invalid store path: {0:?}")]
    InvalidPath(String),

    /// Record did not (de)serialize
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Write refused by the store's access rules
    #[error("Write rejected at {0}")]
    Rejected(String),
}

/// Client operations against the remote tree
pub trait RemoteStore {
    fn get(&self, path: &str) -> Result<Option<Value>, StoreError>;

    fn set(&self, path: &str, value: Value) -> Result<(), StoreError>;

    fn remove(&self, path: &str) -> Result<(), StoreError>;

    /// Append under a generated, time-ordered key. Returns the new key.
    fn push(&self, path: &str, value: Value) -> Result<String, StoreError>;

    /// Remove `path` when this client disconnects
    fn on_disconnect_remove(&self, path: &str) -> Result<(), StoreError>;

    /// Atomically replace the value at `path` with `update(current)`.
    /// Returning `None` from `update` aborts without writing.
    /// Returns whether a value was written.
    fn transaction<F>(&self, path: &str, update: F) -> Result<bool, StoreError>
    where
        F: FnOnce(Option<Value>) -> Option<Value>;

    /// Change counter covering `path` and everything under it
    fn revision(&self, path: &str) -> u64;

    /// Drop the connection, running this client's disconnect hooks
    fn disconnect(&self);

    fn get_as<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, StoreError>
    where
        Self: Sized,
    {
        match self.get(path)? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    fn set_as<T: Serialize>(&self, path: &str, record: &T) -> Result<(), StoreError>
    where
        Self: Sized,
    {
        self.set(path, serde_json::to_value(record)?)
    }
}

/// Split and validate a store path
fn segments(path: &str) -> Result<Vec<&str>, StoreError> {
    let parts: Vec<&str> = path.split('/').collect();
    let valid = parts.iter().all(|p| {
        !p.is_empty() && !p.contains(['.', '#', '$', '[', ']'])
    });
    if valid {
        Ok(parts)
    } else {
        Err(StoreError::InvalidPath(path.to_string()))
    }
}

#[derive(Debug, Default)]
struct Backend {
    root: Map<String, Value>,
    /// Last change anywhere under a path (a write bumps the path and every ancestor)
    subtree: HashMap<String, u64>,
    /// Last write addressed at exactly this path (replaces everything under it)
    direct: HashMap<String, u64>,
    counter: u64,
    push_counter: u64,
    /// Disconnect hooks per client
    hooks: HashMap<u64, Vec<String>>,
    next_client: u64,
    offline: bool,
    /// Path prefixes that refuse writes
    rejected: Vec<String>,
}

impl Backend {
    fn check_online(&self) -> Result<(), StoreError> {
        if self.offline {
            Err(StoreError::Offline)
        } else {
            Ok(())
        }
    }

    fn check_writable(&self, path: &str) -> Result<(), StoreError> {
        self.check_online()?;
        let denied = self
            .rejected
            .iter()
            .any(|prefix| path == prefix || path.starts_with(&format!("{prefix}/")));
        if denied {
            Err(StoreError::Rejected(path.to_string()))
        } else {
            Ok(())
        }
    }

    fn lookup(&self, parts: &[&str]) -> Option<&Value> {
        let (first, rest) = parts.split_first()?;
        let mut node = self.root.get(*first)?;
        for part in rest {
            node = node.as_object()?.get(*part)?;
        }
        Some(node)
    }

    fn bump(&mut self, parts: &[&str]) {
        self.counter += 1;
        for depth in 1..=parts.len() {
            self.subtree.insert(parts[..depth].join("/"), self.counter);
        }
        self.direct.insert(parts.join("/"), self.counter);
    }

    fn write(&mut self, parts: &[&str], value: Option<Value>) {
        let Some((last, parents)) = parts.split_last() else {
            return;
        };
        let mut node = &mut self.root;
        for part in parents {
            let entry = node
                .entry(part.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !entry.is_object() {
                *entry = Value::Object(Map::new());
            }
            let Value::Object(map) = entry else {
                return;
            };
            node = map;
        }
        match value {
            // Null deletes, like the hosted store
            Some(v) if !v.is_null() => {
                node.insert(last.to_string(), v);
            }
            _ => {
                node.remove(*last);
            }
        }
        self.prune_empty(parents);
        self.bump(parts);
    }

    /// Empty objects left behind by a removal disappear, like the hosted store
    fn prune_empty(&mut self, parents: &[&str]) {
        for depth in (1..=parents.len()).rev() {
            let empty = matches!(
                self.lookup(&parents[..depth]),
                Some(Value::Object(map)) if map.is_empty()
            );
            if !empty {
                break;
            }
            let Some((last, above)) = parents[..depth].split_last() else {
                break;
            };
            if above.is_empty() {
                self.root.remove(*last);
            } else if let Some(Value::Object(map)) = self.lookup_mut(above) {
                map.remove(*last);
            }
        }
    }

    fn lookup_mut(&mut self, parts: &[&str]) -> Option<&mut Value> {
        let (first, rest) = parts.split_first()?;
        let mut node = self.root.get_mut(*first)?;
        for part in rest {
            node = node.as_object_mut()?.get_mut(*part)?;
        }
        Some(node)
    }
}

/// In-process store shared between client handles
#[derive(Debug, Clone)]
pub struct MemoryStore {
    backend: Rc<RefCell<Backend>>,
    client: u64,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            backend: Rc::new(RefCell::new(Backend::default())),
            client: 0,
        }
    }

    /// A second client on the same tree, with its own disconnect hooks
    pub fn connect_client(&self) -> Self {
        let mut backend = self.backend.borrow_mut();
        backend.next_client += 1;
        Self {
            backend: Rc::clone(&self.backend),
            client: backend.next_client,
        }
    }

    /// Simulate losing (or regaining) the connection for every client
    pub fn set_offline(&self, offline: bool) {
        self.backend.borrow_mut().offline = offline;
    }

    /// Refuse writes at or under `prefix`
    pub fn reject_writes_under(&self, prefix: &str) {
        self.backend.borrow_mut().rejected.push(prefix.to_string());
    }

    /// Number of direct children at `path` (0 when absent)
    pub fn child_count(&self, path: &str) -> usize {
        match self.get(path) {
            Ok(Some(Value::Object(map))) => map.len(),
            _ => 0,
        }
    }
}

impl RemoteStore for MemoryStore {
    fn get(&self, path: &str) -> Result<Option<Value>, StoreError> {
        let parts = segments(path)?;
        let backend = self.backend.borrow();
        backend.check_online()?;
        Ok(backend.lookup(&parts).cloned())
    }

    fn set(&self, path: &str, value: Value) -> Result<(), StoreError> {
        let parts = segments(path)?;
        let mut backend = self.backend.borrow_mut();
        backend.check_writable(path)?;
        backend.write(&parts, Some(value));
        Ok(())
    }

    fn remove(&self, path: &str) -> Result<(), StoreError> {
        let parts = segments(path)?;
        let mut backend = self.backend.borrow_mut();
        backend.check_writable(path)?;
        backend.write(&parts, None);
        Ok(())
    }

    fn push(&self, path: &str, value: Value) -> Result<String, StoreError> {
        segments(path)?;
        let key = {
            let mut backend = self.backend.borrow_mut();
            backend.push_counter += 1;
            format!("k{:012}", backend.push_counter)
        };
        self.set(&format!("{path}/{key}"), value)?;
        Ok(key)
    }

    fn on_disconnect_remove(&self, path: &str) -> Result<(), StoreError> {
        segments(path)?;
        let mut backend = self.backend.borrow_mut();
        backend.check_online()?;
        let hooks = backend.hooks.entry(self.client).or_default();
        if !hooks.iter().any(|p| p == path) {
            hooks.push(path.to_string());
        }
        Ok(())
    }

    fn transaction<F>(&self, path: &str, update: F) -> Result<bool, StoreError>
    where
        F: FnOnce(Option<Value>) -> Option<Value>,
    {
        let parts = segments(path)?;
        let mut backend = self.backend.borrow_mut();
        backend.check_writable(path)?;
        let current = backend.lookup(&parts).cloned();
        match update(current) {
            Some(next) => {
                backend.write(&parts, Some(next));
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn revision(&self, path: &str) -> u64 {
        let backend = self.backend.borrow();
        let parts: Vec<&str> = path.split('/').collect();
        let below = backend.subtree.get(path).copied().unwrap_or(0);
        let above = (1..parts.len())
            .filter_map(|depth| backend.direct.get(&parts[..depth].join("/")))
            .copied()
            .max()
            .unwrap_or(0);
        below.max(above)
    }

    fn disconnect(&self) {
        let mut backend = self.backend.borrow_mut();
        let hooks = backend.hooks.remove(&self.client).unwrap_or_default();
        for path in hooks {
            if let Ok(parts) = segments(&path) {
                backend.write(&parts, None);
            }
        }
    }
}

/// Change detector for one path, polled once per frame
#[derive(Debug, Clone)]
pub struct Subscription {
    path: String,
    seen: u64,
}

impl Subscription {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            seen: 0,
        }
    }

    /// Current value if the path changed since the last poll
    pub fn poll<S: RemoteStore>(&mut self, store: &S) -> Result<Option<Option<Value>>, StoreError> {
        let revision = store.revision(&self.path);
        if revision <= self.seen {
            return Ok(None);
        }
        let value = store.get(&self.path)?;
        self.seen = revision;
        Ok(Some(value))
    }
}
