//! RCON client used for passthrough commands.
//!
//! ## Connection Lifecycle
//!
//! 1. **Connect**: open a TCP connection to `host:port`.
//! 2. **Authenticate**: send the stored password. A rejected password is an
//!    authentication failure, never retried.
//! 3. **Command**: send the command once and read the (possibly multi-packet)
//!    response as one string.
//! 4. **Release**: the connection is dropped when the call returns, whether it
//!    succeeded, failed or timed out.
//!
//! The whole sequence runs under a single `tokio::time::timeout`. On expiry
//! the in-flight future is dropped, which closes the socket.

use std::time::Duration;

use async_trait::async_trait;
use ::rcon::Connection;
use tokio::net::TcpStream;
use tracing::{debug, warn};

use crate::rcon::error::{ConsoleError, classify_console_error};
use crate::rcon::types::ServerEntry;

use super::traits::RemoteConsole;

/// `RemoteConsole` over the Source RCON protocol.
#[derive(Debug, Clone, Default)]
pub struct RconClient {
    minecraft_quirks: bool,
}

impl RconClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable Minecraft's response framing quirks.
    pub fn with_minecraft_quirks(mut self, enabled: bool) -> Self {
        self.minecraft_quirks = enabled;
        self
    }

    async fn round_trip(
        &self,
        address: String,
        password: &str,
        command: &str,
    ) -> Result<String, ConsoleError> {
        let mut connection = Connection::<TcpStream>::builder()
            .enable_minecraft_quirks(self.minecraft_quirks)
            .connect(address, password)
            .await
            .map_err(map_rcon_error)?;

        connection.cmd(command).await.map_err(map_rcon_error)
    }
}

/// Map the client library's error onto the console failure classes.
fn map_rcon_error(err: ::rcon::Error) -> ConsoleError {
    match err {
        ::rcon::Error::Auth => ConsoleError::Authentication,
        ::rcon::Error::Io(io_err) => ConsoleError::from(io_err),
        other => classify_console_error(&other.to_string()),
    }
}

#[async_trait]
impl RemoteConsole for RconClient {
    async fn execute(
        &self,
        target: &ServerEntry,
        command: &str,
        timeout: Duration,
    ) -> Result<String, ConsoleError> {
        let address = target.address();
        debug!("Opening RCON session to {} ({})", address, target.name);

        let round_trip = self.round_trip(address.clone(), &target.password, command);
        match tokio::time::timeout(timeout, round_trip).await {
            Ok(Ok(response)) => {
                debug!(
                    "RCON command on {} returned {} byte(s)",
                    address,
                    response.len()
                );
                Ok(response)
            }
            Ok(Err(e)) => {
                warn!("RCON command on {} failed: {}", address, e);
                Err(e)
            }
            Err(_) => {
                warn!("RCON command on {} timed out after {:?}", address, timeout);
                Err(ConsoleError::Timeout)
            }
        }
    }
}
