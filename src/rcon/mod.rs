//! Chat-driven RCON administration.
//!
//! This module is organized into the following submodules:
//!
//! - `types`: Server entries, catalogs, conversation scopes and tool response types
//! - `config`: Configuration resolution with environment variable support
//! - `error`: Router errors and console failure classification
//! - `permission`: Caller allow-list
//! - `storage`: Durable catalog storage (JSON file, in-memory)
//! - `registry`: Per-conversation server registry with write-through persistence
//! - `console`: Remote console seam and the Source RCON client
//! - `message`: Reply text builders
//! - `router`: Command parsing and dispatch
//! - `webhook`: HTTP adapter for chat platforms
//! - `commands`: MCP tool implementations

pub mod commands;
pub mod config;
pub mod console;
pub mod error;
pub mod message;
pub mod permission;
pub mod registry;
pub mod router;
pub(crate) mod schema;
pub mod storage;
pub mod types;
pub mod webhook;

pub use commands::McpRconCommands;
pub use config::RconConfig;
pub use error::RconError;
pub use router::{CommandReply, CommandRouter, RouterSettings};
pub use webhook::{TokenAuth, WebhookState, rcon_webhook};
