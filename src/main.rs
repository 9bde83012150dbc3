#![deny(warnings)]
#![deny(clippy::unwrap_used)]

use std::sync::Arc;

use chat_rcon::rcon::{
    CommandRouter, McpRconCommands, RconConfig, TokenAuth, WebhookState, rcon_webhook,
};
use dotenv::dotenv;
use poem::{EndpointExt, Route, Server, listener::TcpListener, middleware::Tracing, post};
use poem_mcpserver::{McpServer, streamable_http};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();

    // Initialize logging with proper tracing default
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("info".parse().expect("valid directive")),
        )
        .init();

    let config = RconConfig::from_env();
    if config.allowed_ids.is_empty() {
        warn!("RCON_ALLOWED_IDS is empty; every command will be rejected");
    }
    if config.webhook_token.is_none() {
        warn!(
            "RCON_WEBHOOK_TOKEN is not set; any client that reaches {}:{} can act as any caller",
            config.bind_host, config.http_port
        );
    }

    let router = Arc::new(CommandRouter::from_config(&config).await?);
    let state = Arc::new(WebhookState {
        router: router.clone(),
        command_prefix: config.command_prefix.clone(),
    });

    let addr = format!("{}:{}", config.bind_host, config.http_port);
    info!("Starting chat RCON server on {}", addr);

    let app = Route::new()
        .at("/rcon", post(rcon_webhook).data(state))
        .at(
            "/mcp",
            streamable_http::endpoint(move |_| {
                McpServer::new().tools(McpRconCommands::new(router.clone()))
            }),
        )
        .with(TokenAuth::new(config.webhook_token.as_deref()))
        .with(Tracing);

    info!(
        "Webhook ready at POST /rcon (prefix '{}'), MCP tools at /mcp",
        config.command_prefix
    );

    Server::new(TcpListener::bind(addr))
        .name("Chat RCON Server")
        .run(app)
        .await?;

    Ok(())
}
