//! Command parsing and dispatch.
//!
//! A command line is handled in one pass:
//!
//! 1. The caller is checked against the allow-list. Rejection stops here,
//!    before parsing or any registry access.
//! 2. The text is split on whitespace and the first token is matched
//!    case-insensitively against `help`, `add`, `use`, `del`, `list` and
//!    `send`. Anything else is a passthrough command for the active server.
//! 3. The conversation key is derived from the message scope.
//! 4. Catalog verbs go to the registry; passthrough goes to the console.
//!
//! The router keeps no state between commands. A console command whose first
//! word is one of the reserved verbs is only reachable through `send`.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::config::{
    DEFAULT_COMMAND_PREFIX, DEFAULT_REPLY_LIMIT, DEFAULT_TIMEOUT_SECS, RconConfig,
};
use super::console::{RconClient, RemoteConsole};
use super::error::RconError;
use super::message::{
    ADD_USAGE, DEL_USAGE, ListReplyBuilder, PassthroughReplyBuilder, SEND_USAGE, USE_USAGE,
    added_reply, help_text, removed_reply, render_error, selected_reply,
};
use super::permission::PermissionGate;
use super::registry::ServerRegistry;
use super::storage::JsonFileStore;
use super::types::{
    ConversationScope, DEFAULT_CONVERSATION_KEY, IncomingCommand, UnscopedPolicy, parse_port,
};

/// A parsed command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Add {
        name: String,
        host: String,
        port: u16,
        password: String,
    },
    Use {
        name: String,
    },
    Del {
        name: String,
    },
    List,
    /// Tokens re-joined with single spaces.
    Passthrough(String),
}

impl Command {
    fn verb(&self) -> &'static str {
        match self {
            Command::Help => "help",
            Command::Add { .. } => "add",
            Command::Use { .. } => "use",
            Command::Del { .. } => "del",
            Command::List => "list",
            Command::Passthrough(_) => "passthrough",
        }
    }
}

/// Parse one command line (without the chat prefix).
///
/// `list` ignores extra arguments. `add`, `use` and `del` require their exact
/// argument count and fail with the verb's usage line otherwise. `send` forwards
/// its arguments to the console, which reaches console commands that share a
/// name with a verb (`send list`).
pub fn parse_command(text: &str) -> Result<Command, RconError> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    let Some((first, args)) = tokens.split_first() else {
        return Ok(Command::Help);
    };

    match first.to_ascii_lowercase().as_str() {
        "help" => Ok(Command::Help),
        "add" => match args {
            [name, host, port, password] => {
                let port = parse_port(port)
                    .map_err(|e| RconError::Validation(format!("{}\n{}", e, ADD_USAGE)))?;
                Ok(Command::Add {
                    name: name.to_string(),
                    host: host.to_string(),
                    port,
                    password: password.to_string(),
                })
            }
            _ => Err(RconError::Validation(ADD_USAGE.to_string())),
        },
        "use" => match args {
            [name] => Ok(Command::Use {
                name: name.to_string(),
            }),
            _ => Err(RconError::Validation(USE_USAGE.to_string())),
        },
        "del" => match args {
            [name] => Ok(Command::Del {
                name: name.to_string(),
            }),
            _ => Err(RconError::Validation(DEL_USAGE.to_string())),
        },
        "list" => Ok(Command::List),
        "send" => match args {
            [] => Err(RconError::Validation(SEND_USAGE.to_string())),
            _ => Ok(Command::Passthrough(args.join(" "))),
        },
        _ => Ok(Command::Passthrough(tokens.join(" "))),
    }
}

/// Router knobs resolved from configuration.
#[derive(Debug, Clone)]
pub struct RouterSettings {
    pub timeout: Duration,
    pub reply_limit: usize,
    pub unscoped_policy: UnscopedPolicy,
    /// Only used to render help text.
    pub command_prefix: String,
}

impl Default for RouterSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            reply_limit: DEFAULT_REPLY_LIMIT,
            unscoped_policy: UnscopedPolicy::default(),
            command_prefix: DEFAULT_COMMAND_PREFIX.to_string(),
        }
    }
}

impl From<&RconConfig> for RouterSettings {
    fn from(config: &RconConfig) -> Self {
        Self {
            timeout: config.timeout,
            reply_limit: config.reply_limit,
            unscoped_policy: config.unscoped_policy,
            command_prefix: config.command_prefix.clone(),
        }
    }
}

/// Reply produced for every routed command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandReply {
    pub text: String,
    pub ok: bool,
}

pub struct CommandRouter {
    registry: Arc<ServerRegistry>,
    gate: PermissionGate,
    console: Arc<dyn RemoteConsole>,
    settings: RouterSettings,
}

impl CommandRouter {
    pub fn new(
        registry: Arc<ServerRegistry>,
        gate: PermissionGate,
        console: Arc<dyn RemoteConsole>,
        settings: RouterSettings,
    ) -> Self {
        Self {
            registry,
            gate,
            console,
            settings,
        }
    }

    /// Wire a router from configuration: JSON file store, Source RCON client
    /// and the configured allow-list.
    pub async fn from_config(config: &RconConfig) -> Result<Self, RconError> {
        let store = Arc::new(JsonFileStore::new(config.store_path.clone()));
        let registry = Arc::new(ServerRegistry::load(store).await?);
        let console =
            Arc::new(RconClient::new().with_minecraft_quirks(config.minecraft_quirks));
        let gate = PermissionGate::new(config.allowed_ids.iter().cloned());

        Ok(Self::new(registry, gate, console, RouterSettings::from(config)))
    }

    pub fn registry(&self) -> &Arc<ServerRegistry> {
        &self.registry
    }

    pub fn settings(&self) -> &RouterSettings {
        &self.settings
    }

    pub fn is_allowed(&self, caller_id: &str) -> bool {
        self.gate.is_allowed(caller_id)
    }

    /// Catalog key for `scope` under the configured unscoped policy.
    pub fn conversation_key(&self, scope: &ConversationScope) -> Result<String, RconError> {
        match (scope.key(), self.settings.unscoped_policy) {
            (Some(key), _) => Ok(key),
            (None, UnscopedPolicy::Shared) => Ok(DEFAULT_CONVERSATION_KEY.to_string()),
            (None, UnscopedPolicy::Reject) => Err(RconError::UnscopedConversation),
        }
    }

    /// Handle one command and always produce a reply.
    ///
    /// Typed failures are rendered by `render_error`. A panic while handling
    /// is caught and reported as an internal error so the host keeps running.
    pub async fn respond(&self, command: &IncomingCommand) -> CommandReply {
        match AssertUnwindSafe(self.handle(command)).catch_unwind().await {
            Ok(Ok(text)) => CommandReply { text, ok: true },
            Ok(Err(e)) => CommandReply {
                text: render_error(&e),
                ok: false,
            },
            Err(_) => {
                error!("Panic while handling command from {}", command.caller_id);
                CommandReply {
                    text: "⚠️ Internal error while handling the command.".to_string(),
                    ok: false,
                }
            }
        }
    }

    /// Handle one command, returning the success reply or the classified failure.
    pub async fn handle(&self, command: &IncomingCommand) -> Result<String, RconError> {
        let request_id = Uuid::new_v4();

        if !self.gate.is_allowed(&command.caller_id) {
            warn!(
                "[{}] Rejected RCON command from unauthorized caller {}",
                request_id, command.caller_id
            );
            return Err(RconError::PermissionDenied);
        }

        let parsed = parse_command(&command.text)?;
        if parsed == Command::Help {
            return Ok(help_text(&self.settings.command_prefix));
        }

        let key = self.conversation_key(&command.scope)?;
        info!(
            "[{}] {} from {} in {}",
            request_id,
            parsed.verb(),
            command.caller_id,
            key
        );

        let result = self.dispatch(&key, parsed).await;
        if let Err(ref e) = result {
            if e.is_user_error() {
                info!("[{}] {} rejected: {}", request_id, key, e);
            } else {
                warn!("[{}] {} failed: {}", request_id, key, e);
            }
        }
        result
    }

    async fn dispatch(&self, key: &str, command: Command) -> Result<String, RconError> {
        match command {
            Command::Help => Ok(help_text(&self.settings.command_prefix)),
            Command::Add {
                name,
                host,
                port,
                password,
            } => {
                let entry = self
                    .registry
                    .add(key, &name, &host, port, &password)
                    .await?;
                Ok(added_reply(&entry))
            }
            Command::Use { name } => {
                let entry = self.registry.use_server(key, &name).await?;
                Ok(selected_reply(&entry))
            }
            Command::Del { name } => {
                let removed = self.registry.remove(key, &name).await?;
                Ok(removed_reply(&removed.entry.name, removed.was_active))
            }
            Command::List => Ok(ListReplyBuilder::new(self.registry.list(key)).build()),
            Command::Passthrough(text) => self.passthrough(key, &text).await,
        }
    }

    async fn passthrough(&self, key: &str, text: &str) -> Result<String, RconError> {
        let target = self.registry.get_active(key)?;
        let timeout = self.settings.timeout;

        let response = self
            .console
            .execute(&target, text, timeout)
            .await
            .map_err(|e| RconError::from_console(e, target.address(), timeout))?;

        Ok(PassthroughReplyBuilder::new(&target.name, text)
            .with_response(response)
            .with_limit(self.settings.reply_limit)
            .build())
    }
}
