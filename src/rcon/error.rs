//! Error taxonomy for the RCON command router.
//!
//! Every failure a command can hit is a variant of [`RconError`]. The router
//! never lets one escape to the host: `CommandRouter::respond` renders each
//! variant into a reply line.
//!
//! # Console Failure Classification
//!
//! The remote console reports failures in four classes (see [`ConsoleError`]).
//! Typed I/O errors are mapped by kind. Errors that only carry text are
//! classified with [`classify_console_error`]:
//!
//! 1. **Authentication failures** are checked first. A message containing both
//!    auth and connection keywords is an auth failure.
//! 2. **Refused connections** (refused, unreachable, reset, no route).
//! 3. **Timeouts** (timed out, timeout, deadline).
//! 4. Anything else is `Other`, with the text kept verbatim.
//!
//! # Examples
//!
//! ```rust,ignore
//! use chat_rcon::rcon::error::{classify_console_error, ConsoleError};
//!
//! assert!(matches!(classify_console_error("Authentication failed"), ConsoleError::Authentication));
//! assert!(matches!(classify_console_error("Connection refused (os error 111)"), ConsoleError::Refused));
//! assert!(matches!(classify_console_error("operation timed out"), ConsoleError::Timeout));
//! ```

use std::io;
use std::time::Duration;

use thiserror::Error;

/// Authentication error patterns. These take precedence over everything else.
const AUTH_ERRORS: &[&str] = &[
    "authentication failed",
    "auth failed",
    "auth fail",
    "bad password",
    "wrong password",
    "incorrect password",
    "unauthorized",
];

/// Patterns meaning the server could not be reached at all.
const REFUSED_ERRORS: &[&str] = &[
    "connection refused",
    "connection reset",
    "network is unreachable",
    "no route to host",
    "host is down",
    "failed to connect",
];

/// Patterns meaning the round trip ran out of time.
const TIMEOUT_ERRORS: &[&str] = &["timed out", "timeout", "deadline"];

/// Failure classes reported by the remote console boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsoleError {
    #[error("connection refused")]
    Refused,
    #[error("timed out")]
    Timeout,
    #[error("authentication failed")]
    Authentication,
    #[error("{0}")]
    Other(String),
}

impl From<io::Error> for ConsoleError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::ConnectionRefused
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::NotConnected
            | io::ErrorKind::AddrNotAvailable => ConsoleError::Refused,
            io::ErrorKind::TimedOut => ConsoleError::Timeout,
            // Local OS failures, never a rejected RCON password.
            io::ErrorKind::PermissionDenied | io::ErrorKind::WouldBlock => {
                ConsoleError::Other(err.to_string())
            }
            _ => classify_console_error(&err.to_string()),
        }
    }
}

/// Classify a console failure that is only available as text.
///
/// Matching is case-insensitive. Authentication patterns win over connection
/// patterns, and connection patterns win over timeout patterns, so that
/// "connection timed out during authentication failed" is reported as an
/// authentication failure and never as something worth re-issuing unchanged.
pub fn classify_console_error(error: &str) -> ConsoleError {
    let error_lower = error.to_lowercase();

    if AUTH_ERRORS.iter().any(|p| error_lower.contains(p)) {
        return ConsoleError::Authentication;
    }

    if REFUSED_ERRORS.iter().any(|p| error_lower.contains(p)) {
        return ConsoleError::Refused;
    }

    if TIMEOUT_ERRORS.iter().any(|p| error_lower.contains(p)) {
        return ConsoleError::Timeout;
    }

    ConsoleError::Other(error.to_string())
}

/// Every way a single routed command can fail.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RconError {
    #[error("caller is not allowed to use RCON commands")]
    PermissionDenied,

    /// Malformed verb arguments. Carries the usage line to show the caller.
    #[error("{0}")]
    Validation(String),

    #[error("unknown server '{0}'")]
    UnknownServer(String),

    #[error("no active server selected")]
    NoActiveServer,

    /// Raised only when unscoped conversations are configured to be rejected.
    #[error("cannot resolve a conversation for this message")]
    UnscopedConversation,

    #[error("connection to {address} refused")]
    ConnectionRefused { address: String },

    #[error("connection to {address} timed out after {timeout:?}")]
    ConnectionTimeout { address: String, timeout: Duration },

    #[error("authentication to {address} failed")]
    AuthenticationFailure { address: String },

    #[error("{address}: {message}")]
    RemoteProtocol { address: String, message: String },

    #[error("failed to persist server catalog: {0}")]
    Persistence(String),
}

impl RconError {
    /// Attach the target address to a console failure.
    pub fn from_console(err: ConsoleError, address: impl Into<String>, timeout: Duration) -> Self {
        let address = address.into();
        match err {
            ConsoleError::Refused => RconError::ConnectionRefused { address },
            ConsoleError::Timeout => RconError::ConnectionTimeout { address, timeout },
            ConsoleError::Authentication => RconError::AuthenticationFailure { address },
            ConsoleError::Other(message) => RconError::RemoteProtocol { address, message },
        }
    }

    /// Whether the failure comes from the caller's input rather than the
    /// remote server or the store.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            RconError::PermissionDenied
                | RconError::Validation(_)
                | RconError::UnknownServer(_)
                | RconError::NoActiveServer
                | RconError::UnscopedConversation
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod classification {
        use super::*;

        #[test]
        fn test_authentication_patterns() {
            assert_eq!(
                classify_console_error("Authentication failed"),
                ConsoleError::Authentication
            );
            assert_eq!(
                classify_console_error("AUTH FAILED: bad password"),
                ConsoleError::Authentication
            );
            assert_eq!(
                classify_console_error("server said: Unauthorized"),
                ConsoleError::Authentication
            );
        }

        #[test]
        fn test_refused_patterns() {
            assert_eq!(
                classify_console_error("Connection refused (os error 111)"),
                ConsoleError::Refused
            );
            assert_eq!(
                classify_console_error("No route to host"),
                ConsoleError::Refused
            );
            assert_eq!(
                classify_console_error("connection reset by peer"),
                ConsoleError::Refused
            );
        }

        #[test]
        fn test_timeout_patterns() {
            assert_eq!(
                classify_console_error("operation timed out"),
                ConsoleError::Timeout
            );
            assert_eq!(
                classify_console_error("TIMEOUT waiting for response"),
                ConsoleError::Timeout
            );
        }

        #[test]
        fn test_auth_takes_precedence() {
            assert_eq!(
                classify_console_error("connection timed out during authentication failed"),
                ConsoleError::Authentication
            );
        }

        #[test]
        fn test_refused_takes_precedence_over_timeout() {
            assert_eq!(
                classify_console_error("failed to connect: timeout"),
                ConsoleError::Refused
            );
        }

        #[test]
        fn test_os_permission_text_is_not_authentication() {
            assert_eq!(
                classify_console_error("Permission denied (os error 13)"),
                ConsoleError::Other("Permission denied (os error 13)".to_string())
            );
        }

        #[test]
        fn test_unknown_is_kept_verbatim() {
            assert_eq!(
                classify_console_error("Command too long"),
                ConsoleError::Other("Command too long".to_string())
            );
        }
    }

    mod io_errors {
        use super::*;

        #[test]
        fn test_io_kinds() {
            let refused = io::Error::from(io::ErrorKind::ConnectionRefused);
            assert_eq!(ConsoleError::from(refused), ConsoleError::Refused);

            let timed_out = io::Error::from(io::ErrorKind::TimedOut);
            assert_eq!(ConsoleError::from(timed_out), ConsoleError::Timeout);
        }

        #[test]
        fn test_local_os_errors_are_other() {
            let denied = io::Error::new(io::ErrorKind::PermissionDenied, "permission denied");
            assert_eq!(
                ConsoleError::from(denied),
                ConsoleError::Other("permission denied".to_string())
            );

            let would_block = io::Error::new(io::ErrorKind::WouldBlock, "operation would block");
            assert_eq!(
                ConsoleError::from(would_block),
                ConsoleError::Other("operation would block".to_string())
            );
        }

        #[test]
        fn test_other_io_falls_back_to_text() {
            let err = io::Error::other("unexpected packet type 7");
            assert_eq!(
                ConsoleError::from(err),
                ConsoleError::Other("unexpected packet type 7".to_string())
            );
        }
    }

    mod rcon_error {
        use super::*;

        #[test]
        fn test_from_console_attaches_address() {
            let timeout = Duration::from_secs(10);
            assert_eq!(
                RconError::from_console(ConsoleError::Refused, "10.0.0.5:27015", timeout),
                RconError::ConnectionRefused {
                    address: "10.0.0.5:27015".to_string()
                }
            );
            assert_eq!(
                RconError::from_console(ConsoleError::Other("boom".into()), "h:1", timeout),
                RconError::RemoteProtocol {
                    address: "h:1".to_string(),
                    message: "boom".to_string()
                }
            );
        }

        #[test]
        fn test_user_error_split() {
            assert!(RconError::NoActiveServer.is_user_error());
            assert!(RconError::Validation("usage".into()).is_user_error());
            assert!(!RconError::Persistence("disk full".into()).is_user_error());
            assert!(
                !RconError::AuthenticationFailure {
                    address: "h:1".into()
                }
                .is_user_error()
            );
        }
    }
}
