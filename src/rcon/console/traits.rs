//! Remote console trait definition.

use std::time::Duration;

use async_trait::async_trait;

use crate::rcon::error::ConsoleError;
use crate::rcon::types::ServerEntry;

/// One bounded command/response exchange with a remote console.
///
/// Implementations must connect, authenticate, send `command` once, collect
/// the aggregated response and release the connection on every exit path,
/// all within `timeout`. No connection outlives a call and nothing is retried.
#[async_trait]
pub trait RemoteConsole: Send + Sync {
    async fn execute(
        &self,
        target: &ServerEntry,
        command: &str,
        timeout: Duration,
    ) -> Result<String, ConsoleError>;
}
