//! In-memory server registry backed by a `CatalogStore`.
//!
//! The registry is the only owner of conversation catalogs. Every successful
//! mutation is written through to the store before the call returns, so a
//! success reply always implies the change is durable.
//!
//! # Concurrency
//!
//! Catalogs live in a `DashMap` keyed by conversation. Mutations take a
//! per-conversation async mutex for the whole read-modify-persist sequence, so
//! two commands for the same conversation are applied one after the other.
//! Saves are additionally serialised registry-wide and snapshot the map while
//! holding that lock, so an older snapshot never overwrites a newer one.
//!
//! # Persistence Failures
//!
//! A failed save is reported as `RconError::Persistence` but the in-memory
//! change stays applied. The next successful save writes it out.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, error, info};

use super::error::RconError;
use super::storage::{CatalogStore, RegistrySnapshot};
use super::types::{Catalog, ServerEntry, ServerListItem, ServerListing};

/// Outcome of a successful `remove`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovedServer {
    pub entry: ServerEntry,
    /// Whether the removed server was the active one.
    pub was_active: bool,
}

pub struct ServerRegistry {
    catalogs: DashMap<String, Catalog>,
    conversation_locks: DashMap<String, Arc<Mutex<()>>>,
    persist_lock: Mutex<()>,
    store: Arc<dyn CatalogStore>,
}

impl ServerRegistry {
    /// Create a registry with no catalogs, without reading the store.
    pub fn empty(store: Arc<dyn CatalogStore>) -> Self {
        Self {
            catalogs: DashMap::new(),
            conversation_locks: DashMap::new(),
            persist_lock: Mutex::new(()),
            store,
        }
    }

    /// Build the registry from whatever the store currently holds.
    pub async fn load(store: Arc<dyn CatalogStore>) -> Result<Self, RconError> {
        let snapshot = store.load().await?;
        info!(
            "Server registry loaded {} conversation(s) from {}",
            snapshot.len(),
            store.describe()
        );
        let registry = Self::empty(store);
        for (key, catalog) in snapshot {
            registry.catalogs.insert(key, catalog);
        }
        Ok(registry)
    }

    /// Add or overwrite `name` in conversation `key` and make it active.
    pub async fn add(
        &self,
        key: &str,
        name: &str,
        host: &str,
        port: u16,
        password: &str,
    ) -> Result<ServerEntry, RconError> {
        if name.is_empty() || name.chars().any(char::is_whitespace) {
            return Err(RconError::Validation(format!(
                "Invalid server name '{}': must be a single non-empty word",
                name
            )));
        }
        if host.is_empty() {
            return Err(RconError::Validation("Host must not be empty".to_string()));
        }
        if port == 0 {
            return Err(RconError::Validation(
                "Invalid port '0': expected an integer between 1 and 65535".to_string(),
            ));
        }

        let _guard = self.lock_conversation(key).await;

        let mut entry = ServerEntry::new(name, host, port, password);
        entry.added_at = Some(chrono::Utc::now().to_rfc3339());

        let replaced = {
            let mut catalog = self.catalogs.entry(key.to_string()).or_default();
            let replaced = catalog.contains(name);
            catalog.upsert(entry.clone());
            replaced
        };

        info!(
            "{} server '{}' ({}) in {} and selected it",
            if replaced { "Replaced" } else { "Added" },
            name,
            entry.address(),
            key
        );

        self.persist().await?;
        Ok(entry)
    }

    /// Make `name` the active server of conversation `key`.
    pub async fn use_server(&self, key: &str, name: &str) -> Result<ServerEntry, RconError> {
        let _guard = self.lock_conversation(key).await;

        let selected = self.catalogs.get_mut(key).and_then(|mut catalog| {
            if catalog.select(name) {
                catalog.get(name).cloned()
            } else {
                None
            }
        });

        let entry = selected.ok_or_else(|| RconError::UnknownServer(name.to_string()))?;
        info!("Selected server '{}' in {}", name, key);

        self.persist().await?;
        Ok(entry)
    }

    /// Delete `name` from conversation `key`, clearing the selection if it was active.
    pub async fn remove(&self, key: &str, name: &str) -> Result<RemovedServer, RconError> {
        let _guard = self.lock_conversation(key).await;

        let removed = self.catalogs.get_mut(key).and_then(|mut catalog| {
            let was_active = catalog.active_name() == Some(name);
            catalog
                .remove(name)
                .map(|entry| RemovedServer { entry, was_active })
        });

        let removed = removed.ok_or_else(|| RconError::UnknownServer(name.to_string()))?;
        info!(
            "Removed server '{}' from {}{}",
            name,
            key,
            if removed.was_active {
                " (was active)"
            } else {
                ""
            }
        );

        self.persist().await?;
        Ok(removed)
    }

    /// Servers of conversation `key` in insertion order.
    pub fn list(&self, key: &str) -> ServerListing {
        let Some(catalog) = self.catalogs.get(key) else {
            return ServerListing::Empty;
        };
        if catalog.is_empty() {
            return ServerListing::Empty;
        }

        let active = catalog.active_name();
        ServerListing::Servers(
            catalog
                .servers()
                .iter()
                .map(|s| ServerListItem {
                    name: s.name.clone(),
                    host: s.host.clone(),
                    port: s.port,
                    active: active == Some(s.name.as_str()),
                })
                .collect(),
        )
    }

    /// The active server of conversation `key`.
    pub fn get_active(&self, key: &str) -> Result<ServerEntry, RconError> {
        let catalog = self.catalogs.get(key).ok_or(RconError::NoActiveServer)?;
        let active = catalog.active_name().ok_or(RconError::NoActiveServer)?;
        catalog
            .get(active)
            .cloned()
            .ok_or_else(|| RconError::UnknownServer(active.to_string()))
    }

    /// Copy of one conversation's catalog.
    pub fn catalog(&self, key: &str) -> Option<Catalog> {
        self.catalogs.get(key).map(|c| c.value().clone())
    }

    /// Copy of every catalog, keyed by conversation.
    pub fn snapshot(&self) -> RegistrySnapshot {
        self.catalogs
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    async fn lock_conversation(&self, key: &str) -> OwnedMutexGuard<()> {
        let lock = Arc::clone(
            self.conversation_locks
                .entry(key.to_string())
                .or_default()
                .value(),
        );
        lock.lock_owned().await
    }

    async fn persist(&self) -> Result<(), RconError> {
        let _guard = self.persist_lock.lock().await;
        let snapshot = self.snapshot();
        match self.store.save(&snapshot).await {
            Ok(()) => {
                debug!("Persisted {} conversation(s)", snapshot.len());
                Ok(())
            }
            Err(e) => {
                error!("Failed to persist server registry: {}", e);
                Err(e)
            }
        }
    }
}
