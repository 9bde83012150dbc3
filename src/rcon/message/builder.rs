//! Builder patterns for constructing chat replies.

use crate::rcon::error::RconError;
use crate::rcon::types::{ServerEntry, ServerListing};

/// Marker appended to console output cut at the reply limit.
pub const TRUNCATION_MARKER: &str = "… (truncated)";

pub(crate) const ADD_USAGE: &str = "Usage: add <name> <host> <port> <password>";
pub(crate) const USE_USAGE: &str = "Usage: use <name>";
pub(crate) const DEL_USAGE: &str = "Usage: del <name>";
pub(crate) const SEND_USAGE: &str = "Usage: send <command>";

/// Help text listing every verb, shown with the chat command prefix.
pub fn help_text(prefix: &str) -> String {
    let p = if prefix.is_empty() {
        String::new()
    } else {
        format!("{} ", prefix)
    };
    [
        "📖 RCON commands:".to_string(),
        format!("• {}help - show this help", p),
        format!(
            "• {}add <name> <host> <port> <password> - add a server and select it",
            p
        ),
        format!("• {}use <name> - select a server", p),
        format!("• {}del <name> - remove a server", p),
        format!("• {}list - list servers in this conversation", p),
        format!("• {}send <command> - send <command> to the selected server", p),
        format!("• {}<command> - shorthand for send, unless <command> starts with a verb", p),
    ]
    .join("\n")
}

/// Cut `output` to at most `limit` characters, appending [`TRUNCATION_MARKER`]
/// when anything was removed. Counts characters, not bytes.
pub fn truncate_output(output: &str, limit: usize) -> String {
    match output.char_indices().nth(limit) {
        Some((cut, _)) => format!("{}\n{}", &output[..cut], TRUNCATION_MARKER),
        None => output.to_string(),
    }
}

/// Builder for the reply to a passthrough command.
///
/// # Example
///
/// ```ignore
/// let reply = PassthroughReplyBuilder::new("main", "players")
///     .with_response("3 players online")
///     .with_limit(1000)
///     .build();
/// ```
pub struct PassthroughReplyBuilder {
    server: String,
    command: String,
    response: String,
    limit: usize,
}

impl PassthroughReplyBuilder {
    pub fn new(server: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            command: command.into(),
            response: String::new(),
            limit: usize::MAX,
        }
    }

    pub fn with_response(mut self, response: impl Into<String>) -> Self {
        self.response = response.into();
        self
    }

    /// Maximum number of response characters kept.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn build(&self) -> String {
        let trimmed = self.response.trim_end();
        let body = if trimmed.is_empty() {
            "(no output)".to_string()
        } else {
            truncate_output(trimmed, self.limit)
        };

        [
            format!("📡 [{}] Command: `{}`", self.server, self.command),
            "📥 Response:".to_string(),
            "```".to_string(),
            body,
            "```".to_string(),
        ]
        .join("\n")
    }
}

/// Builder for `list` replies.
pub struct ListReplyBuilder {
    listing: ServerListing,
}

impl ListReplyBuilder {
    pub fn new(listing: ServerListing) -> Self {
        Self { listing }
    }

    pub fn build(&self) -> String {
        let items = match &self.listing {
            ServerListing::Empty => {
                return "📭 No servers in this conversation yet. Use `add` to register one."
                    .to_string();
            }
            ServerListing::Servers(items) => items,
        };

        let mut lines = vec![format!("🗂 Servers ({}):", items.len())];
        for item in items {
            let marker = if item.active { "*" } else { " " };
            let suffix = if item.active { " (active)" } else { "" };
            lines.push(format!(
                "{} {}  {}:{}{}",
                marker, item.name, item.host, item.port, suffix
            ));
        }
        lines.join("\n")
    }
}

pub(crate) fn added_reply(entry: &ServerEntry) -> String {
    format!(
        "✅ Added server '{}' ({}) and selected it.",
        entry.name,
        entry.address()
    )
}

pub(crate) fn selected_reply(entry: &ServerEntry) -> String {
    format!(
        "✅ Selected server '{}' ({}).",
        entry.name,
        entry.address()
    )
}

pub(crate) fn removed_reply(name: &str, was_active: bool) -> String {
    if was_active {
        format!(
            "🗑 Removed server '{}'. It was the active server; use `use <name>` to select another.",
            name
        )
    } else {
        format!("🗑 Removed server '{}'.", name)
    }
}

/// Render any router failure as a single reply.
pub fn render_error(err: &RconError) -> String {
    match err {
        RconError::PermissionDenied => "❌ You are not allowed to use RCON commands.".to_string(),
        RconError::Validation(usage) => format!("❌ {}", usage),
        RconError::UnknownServer(name) => format!(
            "❌ Unknown server '{}'. Use `list` to see registered servers.",
            name
        ),
        RconError::NoActiveServer => {
            "❌ No server selected. Use `add` or `use <name>` first.".to_string()
        }
        RconError::UnscopedConversation => {
            "❌ This message has no group or user to scope servers to.".to_string()
        }
        RconError::ConnectionRefused { address } => {
            format!("⚠️ Connection refused by {}. Is the server running?", address)
        }
        RconError::ConnectionTimeout { address, timeout } => format!(
            "⚠️ Timed out after {}s waiting for {}.",
            timeout.as_secs(),
            address
        ),
        RconError::AuthenticationFailure { address } => {
            format!("⚠️ RCON authentication failed for {}. Check the password.", address)
        }
        RconError::RemoteProtocol { address, message } => {
            format!("⚠️ RCON command failed on {}: {}", address, message)
        }
        RconError::Persistence(message) => format!(
            "⚠️ The change was applied but could not be saved: {}",
            message
        ),
    }
}
