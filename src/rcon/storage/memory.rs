//! In-memory `CatalogStore`, used by tests and ephemeral deployments.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::rcon::error::RconError;

use super::traits::{CatalogStore, RegistrySnapshot};

/// Keeps the last saved snapshot in memory and counts writes.
#[derive(Default)]
pub struct MemoryStore {
    snapshot: Mutex<RegistrySnapshot>,
    saves: AtomicUsize,
    fail_saves: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing snapshot.
    pub fn with_snapshot(snapshot: RegistrySnapshot) -> Self {
        Self {
            snapshot: Mutex::new(snapshot),
            ..Self::default()
        }
    }

    /// Number of successful `save` calls.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// Make every following `save` fail until switched back.
    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// Copy of the last saved snapshot.
    pub fn snapshot(&self) -> RegistrySnapshot {
        self.snapshot
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn load(&self) -> Result<RegistrySnapshot, RconError> {
        self.snapshot
            .lock()
            .map(|guard| guard.clone())
            .map_err(|e| RconError::Persistence(e.to_string()))
    }

    async fn save(&self, snapshot: &RegistrySnapshot) -> Result<(), RconError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(RconError::Persistence("store is read-only".to_string()));
        }
        let mut guard = self
            .snapshot
            .lock()
            .map_err(|e| RconError::Persistence(e.to_string()))?;
        *guard = snapshot.clone();
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn describe(&self) -> String {
        "in-memory".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rcon::types::Catalog;

    #[tokio::test]
    async fn test_save_counts_and_replaces() {
        let store = MemoryStore::new();
        let mut snapshot = RegistrySnapshot::new();
        snapshot.insert("group_1".to_string(), Catalog::new());

        store.save(&snapshot).await.unwrap();

        assert_eq!(store.save_count(), 1);
        assert_eq!(store.load().await.unwrap(), snapshot);
    }

    #[tokio::test]
    async fn test_failing_saves_keep_previous_snapshot() {
        let store = MemoryStore::new();
        store.set_fail_saves(true);

        let mut snapshot = RegistrySnapshot::new();
        snapshot.insert("group_1".to_string(), Catalog::new());

        assert!(matches!(
            store.save(&snapshot).await,
            Err(RconError::Persistence(_))
        ));
        assert_eq!(store.save_count(), 0);
        assert!(store.snapshot().is_empty());
    }
}
