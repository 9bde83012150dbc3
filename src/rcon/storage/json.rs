//! JSON file implementation of `CatalogStore`.
//!
//! # Format
//!
//! ```json
//! {
//!   "group_1": {
//!     "servers": [
//!       {"name": "main", "host": "10.0.0.5", "port": 27015, "password": "secret"}
//!     ],
//!     "active": "main"
//!   }
//! }
//! ```
//!
//! Servers are an array so insertion order survives a round trip.
//!
//! # Corruption Handling
//!
//! Decoding validates each conversation on its own. A conversation whose value
//! does not match the catalog schema is replaced by an empty catalog and a
//! warning is logged; every other conversation still loads. A document that is
//! not a JSON object at all loads as an empty registry. `JsonFileStore` first
//! moves such a file aside to `<file>.corrupt-<timestamp>` so the next save
//! cannot destroy it.

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::rcon::error::RconError;
use crate::rcon::types::Catalog;

use super::traits::{CatalogStore, RegistrySnapshot};

/// Decode stored JSON into a registry, isolating malformed conversations.
pub fn decode_registry(raw: &str) -> RegistrySnapshot {
    decode_document(raw).unwrap_or_else(|reason| {
        warn!("Server catalog {}, starting empty", reason);
        RegistrySnapshot::new()
    })
}

/// Like `decode_registry`, but reports a document that is unusable as a whole.
fn decode_document(raw: &str) -> Result<RegistrySnapshot, String> {
    let mut registry = RegistrySnapshot::new();

    if raw.trim().is_empty() {
        return Ok(registry);
    }

    let document = match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => map,
        Ok(other) => {
            return Err(format!(
                "is not a JSON object (found {})",
                json_kind(&other)
            ));
        }
        Err(e) => return Err(format!("is not valid JSON ({})", e)),
    };

    for (key, value) in document {
        let catalog = match decode_catalog(value) {
            Ok(catalog) => catalog,
            Err(reason) => {
                warn!(
                    "Discarding malformed catalog for conversation '{}': {}",
                    key, reason
                );
                Catalog::new()
            }
        };
        registry.insert(key, catalog);
    }

    Ok(registry)
}

fn decode_catalog(value: Value) -> Result<Catalog, String> {
    let catalog: Catalog = serde_json::from_value(value).map_err(|e| e.to_string())?;
    catalog.validate()?;
    Ok(catalog.normalize())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Encode a registry as pretty-printed JSON.
pub fn encode_registry(snapshot: &RegistrySnapshot) -> Result<String, RconError> {
    serde_json::to_string_pretty(snapshot)
        .map_err(|e| RconError::Persistence(format!("failed to encode catalog: {}", e)))
}

/// Catalog store backed by one JSON file.
///
/// Writes go to a sibling temporary file which is then renamed over the
/// target, so a crash mid-write leaves the previous file intact.
pub struct JsonFileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "catalog.json".to_string());
        self.path.with_file_name(format!(".{}.tmp", file_name))
    }

    /// Move an undecodable catalog file out of the way and return where it went.
    async fn quarantine(&self) -> Result<PathBuf, RconError> {
        let mut target = self.path.clone().into_os_string();
        target.push(format!(
            ".corrupt-{}",
            chrono::Utc::now().format("%Y%m%dT%H%M%S%.3f")
        ));
        let target = PathBuf::from(target);

        tokio::fs::rename(&self.path, &target).await.map_err(|e| {
            RconError::Persistence(format!(
                "failed to move corrupt {} aside: {}",
                self.path.display(),
                e
            ))
        })?;
        Ok(target)
    }
}

#[async_trait]
impl CatalogStore for JsonFileStore {
    async fn load(&self) -> Result<RegistrySnapshot, RconError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!(
                    "No server catalog at {}, starting empty",
                    self.path.display()
                );
                return Ok(RegistrySnapshot::new());
            }
            Err(e) => {
                return Err(RconError::Persistence(format!(
                    "failed to read {}: {}",
                    self.path.display(),
                    e
                )));
            }
        };

        let registry = match decode_document(&raw) {
            Ok(registry) => registry,
            Err(reason) => {
                let moved_to = self.quarantine().await?;
                warn!(
                    "Server catalog {} {}; moved it to {} and starting empty",
                    self.path.display(),
                    reason,
                    moved_to.display()
                );
                return Ok(RegistrySnapshot::new());
            }
        };
        info!(
            "Loaded {} conversation catalog(s) from {}",
            registry.len(),
            self.path.display()
        );
        Ok(registry)
    }

    async fn save(&self, snapshot: &RegistrySnapshot) -> Result<(), RconError> {
        let encoded = encode_registry(snapshot)?;
        let _guard = self.write_lock.lock().await;

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                RconError::Persistence(format!("failed to create {}: {}", parent.display(), e))
            })?;
        }

        let temp_path = self.temp_path();
        tokio::fs::write(&temp_path, encoded.as_bytes())
            .await
            .map_err(|e| {
                RconError::Persistence(format!("failed to write {}: {}", temp_path.display(), e))
            })?;
        tokio::fs::rename(&temp_path, &self.path)
            .await
            .map_err(|e| {
                RconError::Persistence(format!(
                    "failed to replace {}: {}",
                    self.path.display(),
                    e
                ))
            })?;

        debug!(
            "Saved {} conversation catalog(s) to {}",
            snapshot.len(),
            self.path.display()
        );
        Ok(())
    }

    fn describe(&self) -> String {
        format!("json file {}", self.path.display())
    }
}
