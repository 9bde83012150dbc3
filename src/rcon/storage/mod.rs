//! Durable storage for the conversation -> catalog mapping.
//!
//! This module provides a trait-based storage abstraction that enables:
//! - Dependency injection for testability (`MemoryStore`)
//! - A JSON file backend for deployments (`JsonFileStore`)
//! - Per-conversation corruption isolation on load (`decode_registry`)

mod json;
mod memory;
mod traits;

pub use json::{JsonFileStore, decode_registry, encode_registry};
pub use memory::MemoryStore;
pub use traits::{CatalogStore, RegistrySnapshot};
