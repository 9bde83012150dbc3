//! Core data model: server entries, per-conversation catalogs and the
//! incoming command shape host adapters hand to the router.
//!
//! Response types exposed over MCP also live here and derive `JsonSchema`.

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::error::RconError;

/// Conversation key used when no group or user identity can be resolved.
pub const DEFAULT_CONVERSATION_KEY: &str = "default";

/// One remote console target.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerEntry {
    pub name: String,
    pub host: String,
    pub port: u16,
    pub password: String,
    /// When the entry was (last) added, RFC3339.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub added_at: Option<String>,
}

impl ServerEntry {
    pub fn new(
        name: impl Into<String>,
        host: impl Into<String>,
        port: u16,
        password: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            host: host.into(),
            port,
            password: password.into(),
            added_at: None,
        }
    }

    /// `host:port`, used in replies and logs.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// Passwords stay out of logs.
impl fmt::Debug for ServerEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerEntry")
            .field("name", &self.name)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("password", &"<redacted>")
            .field("added_at", &self.added_at)
            .finish()
    }
}

/// Parse a port argument. Accepts integers in `1..=65535`.
pub fn parse_port(raw: &str) -> Result<u16, RconError> {
    match raw.parse::<u16>() {
        Ok(port) if port != 0 => Ok(port),
        _ => Err(RconError::Validation(format!(
            "Invalid port '{}': expected an integer between 1 and 65535",
            raw
        ))),
    }
}

/// One conversation's servers plus its active selection.
///
/// Invariant: `active`, when set, names an entry in `servers`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    servers: Vec<ServerEntry>,
    #[serde(default)]
    active: Option<String>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.servers.len()
    }

    pub fn get(&self, name: &str) -> Option<&ServerEntry> {
        self.servers.iter().find(|s| s.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn active_name(&self) -> Option<&str> {
        self.active.as_deref()
    }

    /// Servers in insertion order.
    pub fn servers(&self) -> &[ServerEntry] {
        &self.servers
    }

    /// Insert `entry`, replacing an existing entry of the same name in place,
    /// and make it the active server.
    pub fn upsert(&mut self, entry: ServerEntry) {
        let name = entry.name.clone();
        match self.servers.iter_mut().find(|s| s.name == entry.name) {
            Some(existing) => *existing = entry,
            None => self.servers.push(entry),
        }
        self.active = Some(name);
    }

    /// Select `name` if present. Returns `false` for unknown names.
    pub fn select(&mut self, name: &str) -> bool {
        if !self.contains(name) {
            return false;
        }
        self.active = Some(name.to_string());
        true
    }

    /// Remove `name`, clearing the active selection if it pointed at it.
    pub fn remove(&mut self, name: &str) -> Option<ServerEntry> {
        let idx = self.servers.iter().position(|s| s.name == name)?;
        let removed = self.servers.remove(idx);
        if self.active.as_deref() == Some(name) {
            self.active = None;
        }
        Some(removed)
    }

    /// Restore the catalog invariants after loading untrusted data.
    ///
    /// Duplicate names collapse onto the first position with the last
    /// occurrence's values; a dangling `active` is cleared.
    pub(crate) fn normalize(mut self) -> Self {
        let mut servers: Vec<ServerEntry> = Vec::with_capacity(self.servers.len());
        for entry in self.servers.drain(..) {
            match servers.iter_mut().find(|s| s.name == entry.name) {
                Some(existing) => *existing = entry,
                None => servers.push(entry),
            }
        }
        self.servers = servers;
        if let Some(active) = self.active.as_deref()
            && !self.contains(active)
        {
            self.active = None;
        }
        self
    }

    /// Check the shape rules serde cannot express.
    pub(crate) fn validate(&self) -> Result<(), String> {
        for entry in &self.servers {
            if entry.name.trim().is_empty() {
                return Err("server with empty name".to_string());
            }
            if entry.name.chars().any(char::is_whitespace) {
                return Err(format!("server name '{}' contains whitespace", entry.name));
            }
            if entry.port == 0 {
                return Err(format!("server '{}' has port 0", entry.name));
            }
        }
        Ok(())
    }
}

/// Where an incoming command was sent from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "id")]
pub enum ConversationScope {
    Group(String),
    Private(String),
    Unscoped,
}

impl ConversationScope {
    /// Build a scope from whatever identities the chat platform supplied.
    /// A group identity wins over a user identity; blank ids count as absent.
    pub fn resolve(group_id: Option<&str>, user_id: Option<&str>) -> Self {
        fn present(id: Option<&str>) -> Option<&str> {
            id.map(str::trim).filter(|s| !s.is_empty())
        }

        if let Some(group) = present(group_id) {
            return ConversationScope::Group(group.to_string());
        }
        if let Some(user) = present(user_id) {
            return ConversationScope::Private(user.to_string());
        }
        ConversationScope::Unscoped
    }

    /// The catalog key for this scope, or `None` when unscoped.
    pub fn key(&self) -> Option<String> {
        match self {
            ConversationScope::Group(id) => Some(format!("group_{}", id)),
            ConversationScope::Private(id) => Some(format!("private_{}", id)),
            ConversationScope::Unscoped => None,
        }
    }
}

/// What to do with commands whose conversation cannot be identified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnscopedPolicy {
    /// All unscoped commands share the `"default"` catalog.
    #[default]
    Shared,
    /// Unscoped commands are refused.
    Reject,
}

impl UnscopedPolicy {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "shared" | "default" => Some(UnscopedPolicy::Shared),
            "reject" | "deny" => Some(UnscopedPolicy::Reject),
            _ => None,
        }
    }
}

/// A command line as received from the chat platform, already stripped of the
/// command prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingCommand {
    pub caller_id: String,
    pub scope: ConversationScope,
    pub text: String,
}

impl IncomingCommand {
    pub fn new(
        caller_id: impl Into<String>,
        scope: ConversationScope,
        text: impl Into<String>,
    ) -> Self {
        Self {
            caller_id: caller_id.into(),
            scope,
            text: text.into(),
        }
    }
}

/// One row of a `list` result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ServerListItem {
    pub name: String,
    pub host: String,
    #[schemars(schema_with = "crate::rcon::schema::uint")]
    pub port: u16,
    pub active: bool,
}

/// Result of `list` for one conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerListing {
    Empty,
    Servers(Vec<ServerListItem>),
}

/// Servers of one conversation, returned by the `rcon_list_servers` MCP tool.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ServerListResponse {
    /// Servers in the order they were added
    pub servers: Vec<ServerListItem>,
    /// Number of servers
    #[schemars(schema_with = "crate::rcon::schema::uint")]
    pub count: usize,
}

/// Reply returned by the `rcon_command` MCP tool.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct RconCommandResponse {
    /// Text to deliver back to the conversation
    pub reply: String,
    /// Whether the command succeeded
    pub ok: bool,
}
