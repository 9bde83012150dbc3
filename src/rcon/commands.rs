//! MCP RCON Commands implementation.
//!
//! Exposes the chat command router as MCP tools so an agent or a chat bridge
//! speaking MCP can drive it:
//!
//! - `rcon_command`: Run one command line (`help`, `add`, `use`, `del`, `list`
//!   or a console command) as a given caller in a given conversation
//! - `rcon_list_servers`: List a conversation's servers as structured data

use std::sync::Arc;

use poem_mcpserver::{Tools, tool::StructuredContent};
use tracing::{info, warn};

use super::error::RconError;
use super::message::render_error;
use super::router::CommandRouter;
use super::types::{
    ConversationScope, IncomingCommand, RconCommandResponse, ServerListResponse, ServerListing,
};

/// MCP RCON Commands tool implementation.
pub struct McpRconCommands {
    router: Arc<CommandRouter>,
}

impl McpRconCommands {
    pub fn new(router: Arc<CommandRouter>) -> Self {
        Self { router }
    }
}

#[Tools]
impl McpRconCommands {
    /// Run an RCON bot command on behalf of a chat user.
    ///
    /// The command is the text after the chat prefix, e.g. `add main 10.0.0.5 27015 secret`,
    /// `use main`, `list`, or any console command such as `players`, which is sent to
    /// the conversation's selected server. The reply is the text the bot would post.
    async fn rcon_command(
        &self,
        /// Chat user id of the caller; must be in RCON_ALLOWED_IDS
        caller_id: String,
        /// Group id when the message came from a group chat (omit for private chats)
        group_id: Option<String>,
        /// Command text without the chat prefix
        command: String,
    ) -> StructuredContent<RconCommandResponse> {
        let scope = ConversationScope::resolve(group_id.as_deref(), Some(&caller_id));
        let incoming = IncomingCommand::new(caller_id, scope, command);
        let reply = self.router.respond(&incoming).await;

        StructuredContent(RconCommandResponse {
            reply: reply.text,
            ok: reply.ok,
        })
    }

    /// List the servers registered in a conversation, marking the selected one.
    ///
    /// Passwords are never returned.
    async fn rcon_list_servers(
        &self,
        /// Chat user id of the caller; must be in RCON_ALLOWED_IDS
        caller_id: String,
        /// Group id when listing a group chat's servers (omit for private chats)
        group_id: Option<String>,
    ) -> Result<StructuredContent<ServerListResponse>, String> {
        if !self.router.is_allowed(&caller_id) {
            warn!("Rejected server listing for unauthorized caller {}", caller_id);
            return Err(render_error(&RconError::PermissionDenied));
        }

        let scope = ConversationScope::resolve(group_id.as_deref(), Some(&caller_id));
        let key = self
            .router
            .conversation_key(&scope)
            .map_err(|e| render_error(&e))?;

        let servers = match self.router.registry().list(&key) {
            ServerListing::Empty => Vec::new(),
            ServerListing::Servers(items) => items,
        };
        info!("Listing {} server(s) for {}", servers.len(), key);

        let count = servers.len();
        Ok(StructuredContent(ServerListResponse { servers, count }))
    }
}
