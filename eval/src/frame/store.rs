//! Shared store of named frames.

use hashbrown::HashMap;
use parking_lot::RwLock;

use std::sync::Arc;

use super::Frame;

/// Shared store of frames published under their keys. Frames in the store are owned
/// outside of any session; sessions treat their columns as global.
///
/// Cloning the store produces another handle to the same frames.
#[derive(Debug, Clone, Default)]
pub struct Store {
    frames: Arc<RwLock<HashMap<String, Frame>>>,
}

impl Store {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes `frame` under its key, returning the previously published frame.
    pub fn insert(&self, frame: Frame) -> Option<Frame> {
        let key = frame.key().to_owned();
        self.frames.write().insert(key, frame)
    }

    /// Gets a frame by key.
    pub fn get(&self, key: &str) -> Option<Frame> {
        self.frames.read().get(key).cloned()
    }

    /// Removes a frame by key.
    pub fn remove(&self, key: &str) -> Option<Frame> {
        self.frames.write().remove(key)
    }

    /// Checks whether a frame with the specified key is published.
    pub fn contains(&self, key: &str) -> bool {
        self.frames.read().contains_key(key)
    }

    /// Returns sorted keys of all published frames.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<_> = self.frames.read().keys().cloned().collect();
        keys.sort_unstable();
        keys
    }

    /// Returns the number of published frames.
    pub fn len(&self) -> usize {
        self.frames.read().len()
    }

    /// Checks whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.frames.read().is_empty()
    }
}
