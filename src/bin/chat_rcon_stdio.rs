#![deny(warnings)]
#![deny(clippy::unwrap_used)]

use std::sync::Arc;

use chat_rcon::rcon::{CommandRouter, McpRconCommands, RconConfig};
use dotenv::dotenv;
use poem_mcpserver::McpServer;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();

    // stdout carries the MCP protocol, so logs go to stderr
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("info".parse().expect("valid directive")),
        )
        .init();

    let config = RconConfig::from_env();
    let router = Arc::new(CommandRouter::from_config(&config).await?);

    poem_mcpserver::stdio::stdio(McpServer::new().tools(McpRconCommands::new(router))).await?;
    Ok(())
}
