//! Storage trait definition for the server catalog.

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::rcon::error::RconError;
use crate::rcon::types::Catalog;

/// Full persisted state: conversation key -> catalog.
pub type RegistrySnapshot = BTreeMap<String, Catalog>;

/// Trait for durable catalog storage.
///
/// Implementations must be thread-safe (`Send + Sync`) for use across
/// async tasks. `save` always receives the complete registry and replaces
/// whatever was stored before.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Read the stored registry.
    ///
    /// A missing resource is an empty registry, not an error. Malformed
    /// conversations are replaced by empty catalogs.
    async fn load(&self) -> Result<RegistrySnapshot, RconError>;

    /// Overwrite the stored registry with `snapshot`.
    async fn save(&self, snapshot: &RegistrySnapshot) -> Result<(), RconError>;

    /// Short description for logs.
    fn describe(&self) -> String;
}
