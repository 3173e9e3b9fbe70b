//! Session-lifetime favorites shared by every view.
//!
//! `FavoritesStore` is a cheap handle: clones point at the same collection,
//! so a mutation through one handle is immediately visible through all of
//! them. Nothing is persisted.

use std::sync::Arc;

use tokio::sync::watch;

use crate::model::WeatherSnapshot;

#[derive(Debug, Clone)]
pub struct FavoritesStore {
    entries: Arc<watch::Sender<Vec<WeatherSnapshot>>>,
}

impl Default for FavoritesStore {
    fn default() -> Self {
        Self::new()
    }
}

impl FavoritesStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Vec::new());
        Self {
            entries: Arc::new(tx),
        }
    }

    /// Append to the end. The same city may be added more than once.
    pub fn add(&self, snapshot: WeatherSnapshot) {
        tracing::debug!(id = snapshot.id, city = %snapshot.city_name, "adding favorite");
        self.entries.send_modify(|entries| entries.push(snapshot));
    }

    /// Remove every entry with this id. Returns how many were removed.
    pub fn remove(&self, id: i64) -> usize {
        let mut removed = 0;
        self.entries.send_if_modified(|entries| {
            let before = entries.len();
            entries.retain(|entry| entry.id != id);
            removed = before - entries.len();
            removed > 0
        });
        tracing::debug!(id, removed, "removed favorites");
        removed
    }

    /// Snapshot of the collection in insertion order.
    pub fn list(&self) -> Vec<WeatherSnapshot> {
        self.entries.borrow().clone()
    }

    pub fn contains(&self, id: i64) -> bool {
        self.entries.borrow().iter().any(|entry| entry.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Receiver that is notified after every effective mutation.
    pub fn subscribe(&self) -> watch::Receiver<Vec<WeatherSnapshot>> {
        self.entries.subscribe()
    }
}
