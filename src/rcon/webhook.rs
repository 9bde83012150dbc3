//! HTTP webhook adapter for chat platforms.
//!
//! The chat platform POSTs every message it sees to `/rcon` as
//!
//! ```json
//! {"user_id": "10001", "group_id": "42", "message": "rcon list"}
//! ```
//!
//! Messages that do not start with the command prefix are acknowledged with
//! `{"handled": false}`. Everything else is routed and answered with
//! `{"handled": true, "ok": true, "reply": "..."}`; delivering the reply back to
//! the conversation is the platform's job.
//!
//! The caller id in the body is trusted, so the HTTP server must only be
//! reachable by the platform. [`TokenAuth`] rejects requests that do not carry
//! the configured shared secret in `X-Rcon-Token` or `Authorization: Bearer`
//! with `401 Unauthorized`.

use std::sync::Arc;

use poem::http::{HeaderMap, StatusCode, header};
use poem::web::{Data, Json};
use poem::{Endpoint, Middleware, Request, handler};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use tracing::{debug, warn};

use super::router::CommandRouter;
use super::types::{ConversationScope, IncomingCommand};

/// One chat message as delivered by the platform.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub group_id: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WebhookReply {
    pub handled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ok: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply: Option<String>,
}

impl WebhookReply {
    fn ignored() -> Self {
        Self {
            handled: false,
            ok: None,
            reply: None,
        }
    }
}

/// Shared state for the webhook endpoint.
pub struct WebhookState {
    pub router: Arc<CommandRouter>,
    pub command_prefix: String,
}

/// Header carrying the shared secret.
pub const TOKEN_HEADER: &str = "x-rcon-token";

/// Whether `headers` carry `expected`. Always true when no token is configured.
pub fn token_matches(expected: Option<&str>, headers: &HeaderMap) -> bool {
    let Some(expected) = expected else {
        return true;
    };

    let provided = headers
        .get(TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .or_else(|| {
            headers
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.strip_prefix("Bearer "))
        });

    match provided {
        Some(provided) => provided.trim().as_bytes().ct_eq(expected.as_bytes()).into(),
        None => false,
    }
}

/// Middleware requiring the shared secret on every request.
pub struct TokenAuth {
    token: Option<Arc<str>>,
}

impl TokenAuth {
    pub fn new(token: Option<&str>) -> Self {
        Self {
            token: token.map(Arc::from),
        }
    }
}

impl<E: Endpoint> Middleware<E> for TokenAuth {
    type Output = TokenAuthEndpoint<E>;

    fn transform(&self, ep: E) -> Self::Output {
        TokenAuthEndpoint {
            inner: ep,
            token: self.token.clone(),
        }
    }
}

pub struct TokenAuthEndpoint<E> {
    inner: E,
    token: Option<Arc<str>>,
}

impl<E: Endpoint> Endpoint for TokenAuthEndpoint<E> {
    type Output = E::Output;

    async fn call(&self, req: Request) -> poem::Result<Self::Output> {
        if !token_matches(self.token.as_deref(), req.headers()) {
            warn!("Rejected {} {} without a valid token", req.method(), req.uri().path());
            return Err(poem::Error::from_status(StatusCode::UNAUTHORIZED));
        }
        self.inner.call(req).await
    }
}

/// Return the command text after `prefix`, or `None` if the message is not a
/// command. The prefix match is ASCII case-insensitive and must be followed by
/// whitespace or the end of the message.
pub fn strip_command_prefix<'a>(message: &'a str, prefix: &str) -> Option<&'a str> {
    let message = message.trim_start();
    if prefix.is_empty() {
        return Some(message);
    }

    let head = message.get(..prefix.len())?;
    if !head.eq_ignore_ascii_case(prefix) {
        return None;
    }

    let rest = &message[prefix.len()..];
    match rest.chars().next() {
        None => Some(""),
        Some(c) if c.is_whitespace() => Some(rest.trim()),
        Some(_) => None,
    }
}

/// Route one webhook event.
pub async fn process_event(state: &WebhookState, event: WebhookEvent) -> WebhookReply {
    let Some(text) = strip_command_prefix(&event.message, &state.command_prefix) else {
        return WebhookReply::ignored();
    };

    let scope = ConversationScope::resolve(event.group_id.as_deref(), event.user_id.as_deref());
    let caller_id = event.user_id.unwrap_or_default();
    debug!("Webhook command from '{}' in {:?}", caller_id, scope);

    let reply = state
        .router
        .respond(&IncomingCommand::new(caller_id, scope, text))
        .await;

    WebhookReply {
        handled: true,
        ok: Some(reply.ok),
        reply: Some(reply.text),
    }
}

#[handler]
pub async fn rcon_webhook(
    Json(event): Json<WebhookEvent>,
    Data(state): Data<&Arc<WebhookState>>,
) -> Json<WebhookReply> {
    Json(process_event(state, event).await)
}
