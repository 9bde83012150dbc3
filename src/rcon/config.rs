//! Configuration resolution for the chat RCON bot.
//!
//! This module handles configuration values with a three-tier priority system:
//!
//! 1. **Parameter** - Explicitly provided function parameter (highest priority)
//! 2. **Environment Variable** - Value from environment variable
//! 3. **Default** - Built-in default value (lowest priority)
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `RCON_ALLOWED_IDS` | (empty) | Comma-separated caller ids allowed to use the bot |
//! | `RCON_TIMEOUT_SECS` | 10s | RCON round-trip timeout in seconds |
//! | `RCON_REPLY_LIMIT` | 1000 | Max characters of console output in a reply |
//! | `RCON_STORE_PATH` | `data/rcon_servers.json` | Server catalog file |
//! | `RCON_UNSCOPED_POLICY` | `shared` | `shared` or `reject` for unidentifiable conversations |
//! | `RCON_COMMAND_PREFIX` | `rcon` | Prefix that marks a chat message as an RCON command |
//! | `RCON_HTTP_PORT` | 8000 | Webhook listen port |
//! | `RCON_BIND_HOST` | `127.0.0.1` | Webhook listen address |
//! | `RCON_WEBHOOK_TOKEN` | (unset) | Shared secret required on every HTTP request |
//! | `RCON_MINECRAFT_QUIRKS` | false | Enable Minecraft response quirks in the RCON client |

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use super::types::UnscopedPolicy;

/// Default RCON round-trip timeout in seconds
pub(crate) const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Default cap on console output characters in one reply
pub(crate) const DEFAULT_REPLY_LIMIT: usize = 1000;

/// Default catalog file location
pub(crate) const DEFAULT_STORE_PATH: &str = "data/rcon_servers.json";

/// Default chat command prefix
pub(crate) const DEFAULT_COMMAND_PREFIX: &str = "rcon";

/// Default webhook listen port
pub(crate) const DEFAULT_HTTP_PORT: u16 = 8000;

/// Default webhook listen address
pub(crate) const DEFAULT_BIND_HOST: &str = "127.0.0.1";

/// Environment variable name for the caller allow-list
pub(crate) const ALLOWED_IDS_ENV_VAR: &str = "RCON_ALLOWED_IDS";

/// Environment variable name for the RCON timeout
pub(crate) const TIMEOUT_ENV_VAR: &str = "RCON_TIMEOUT_SECS";

/// Environment variable name for the reply limit
pub(crate) const REPLY_LIMIT_ENV_VAR: &str = "RCON_REPLY_LIMIT";

/// Environment variable name for the catalog file path
pub(crate) const STORE_PATH_ENV_VAR: &str = "RCON_STORE_PATH";

/// Environment variable name for the unscoped conversation policy
pub(crate) const UNSCOPED_POLICY_ENV_VAR: &str = "RCON_UNSCOPED_POLICY";

/// Environment variable name for the command prefix
pub(crate) const COMMAND_PREFIX_ENV_VAR: &str = "RCON_COMMAND_PREFIX";

/// Environment variable name for the webhook port
pub(crate) const HTTP_PORT_ENV_VAR: &str = "RCON_HTTP_PORT";

/// Environment variable name for the webhook listen address
pub(crate) const BIND_HOST_ENV_VAR: &str = "RCON_BIND_HOST";

/// Environment variable name for the HTTP shared secret
pub(crate) const WEBHOOK_TOKEN_ENV_VAR: &str = "RCON_WEBHOOK_TOKEN";

/// Environment variable name for Minecraft quirks
pub(crate) const MINECRAFT_QUIRKS_ENV_VAR: &str = "RCON_MINECRAFT_QUIRKS";

/// Fully resolved runtime configuration.
#[derive(Debug, Clone)]
pub struct RconConfig {
    pub allowed_ids: Vec<String>,
    pub timeout: Duration,
    pub reply_limit: usize,
    pub store_path: PathBuf,
    pub unscoped_policy: UnscopedPolicy,
    pub command_prefix: String,
    pub http_port: u16,
    pub bind_host: String,
    /// Shared secret for the HTTP server; `None` disables the check.
    pub webhook_token: Option<String>,
    pub minecraft_quirks: bool,
}

impl RconConfig {
    /// Resolve every setting from the environment, falling back to defaults.
    pub fn from_env() -> Self {
        Self {
            allowed_ids: resolve_allowed_ids(None),
            timeout: resolve_timeout(None),
            reply_limit: resolve_reply_limit(None),
            store_path: resolve_store_path(None),
            unscoped_policy: resolve_unscoped_policy(None),
            command_prefix: resolve_command_prefix(None),
            http_port: resolve_http_port(None),
            bind_host: resolve_bind_host(None),
            webhook_token: resolve_webhook_token(None),
            minecraft_quirks: resolve_minecraft_quirks(None),
        }
    }
}

/// Split a comma-separated id list, dropping blanks.
pub(crate) fn parse_id_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Resolve the caller allow-list with priority: parameter -> env var -> default (empty)
pub(crate) fn resolve_allowed_ids(param: Option<Vec<String>>) -> Vec<String> {
    // Priority 1: Use parameter if provided
    if let Some(ids) = param {
        return ids;
    }

    // Priority 2: Use environment variable if set
    if let Ok(env_ids) = env::var(ALLOWED_IDS_ENV_VAR) {
        return parse_id_list(&env_ids);
    }

    // Priority 3: Nobody is allowed
    Vec::new()
}

/// Resolve the RCON timeout with priority: parameter -> env var -> default
pub(crate) fn resolve_timeout(timeout_param: Option<u64>) -> Duration {
    // Priority 1: Use parameter if provided
    if let Some(timeout) = timeout_param {
        return Duration::from_secs(timeout);
    }

    // Priority 2: Use environment variable if set
    if let Ok(env_timeout) = env::var(TIMEOUT_ENV_VAR)
        && let Ok(timeout) = env_timeout.parse::<u64>()
        && timeout > 0
    {
        return Duration::from_secs(timeout);
    }

    // Priority 3: Default value
    Duration::from_secs(DEFAULT_TIMEOUT_SECS)
}

/// Resolve the reply limit with priority: parameter -> env var -> default
pub(crate) fn resolve_reply_limit(limit_param: Option<usize>) -> usize {
    if let Some(limit) = limit_param {
        return limit;
    }

    if let Ok(env_limit) = env::var(REPLY_LIMIT_ENV_VAR)
        && let Ok(limit) = env_limit.parse::<usize>()
        && limit > 0
    {
        return limit;
    }

    DEFAULT_REPLY_LIMIT
}

/// Resolve the catalog file path with priority: parameter -> env var -> default
pub(crate) fn resolve_store_path(path_param: Option<PathBuf>) -> PathBuf {
    if let Some(path) = path_param {
        return path;
    }

    if let Ok(env_path) = env::var(STORE_PATH_ENV_VAR)
        && !env_path.trim().is_empty()
    {
        return PathBuf::from(env_path.trim());
    }

    PathBuf::from(DEFAULT_STORE_PATH)
}

/// Resolve the unscoped conversation policy with priority: parameter -> env var -> default (shared)
pub(crate) fn resolve_unscoped_policy(policy_param: Option<UnscopedPolicy>) -> UnscopedPolicy {
    if let Some(policy) = policy_param {
        return policy;
    }

    if let Ok(env_policy) = env::var(UNSCOPED_POLICY_ENV_VAR)
        && let Some(policy) = UnscopedPolicy::parse(&env_policy)
    {
        return policy;
    }

    UnscopedPolicy::default()
}

/// Resolve the command prefix with priority: parameter -> env var -> default
pub(crate) fn resolve_command_prefix(prefix_param: Option<String>) -> String {
    if let Some(prefix) = prefix_param {
        return prefix;
    }

    if let Ok(env_prefix) = env::var(COMMAND_PREFIX_ENV_VAR)
        && !env_prefix.trim().is_empty()
    {
        return env_prefix.trim().to_string();
    }

    DEFAULT_COMMAND_PREFIX.to_string()
}

/// Resolve the webhook port with priority: parameter -> env var -> default
pub(crate) fn resolve_http_port(port_param: Option<u16>) -> u16 {
    if let Some(port) = port_param {
        return port;
    }

    if let Ok(env_port) = env::var(HTTP_PORT_ENV_VAR)
        && let Ok(port) = env_port.parse::<u16>()
    {
        return port;
    }

    DEFAULT_HTTP_PORT
}

/// Resolve the webhook listen address with priority: parameter -> env var -> default (loopback)
pub(crate) fn resolve_bind_host(host_param: Option<String>) -> String {
    if let Some(host) = host_param {
        return host;
    }

    if let Ok(env_host) = env::var(BIND_HOST_ENV_VAR)
        && !env_host.trim().is_empty()
    {
        return env_host.trim().to_string();
    }

    DEFAULT_BIND_HOST.to_string()
}

/// Resolve the HTTP shared secret with priority: parameter -> env var -> none
pub(crate) fn resolve_webhook_token(token_param: Option<String>) -> Option<String> {
    if let Some(token) = token_param {
        return Some(token);
    }

    env::var(WEBHOOK_TOKEN_ENV_VAR)
        .ok()
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

/// Resolve the Minecraft quirks flag with priority: parameter -> env var -> default (false)
pub(crate) fn resolve_minecraft_quirks(quirks_param: Option<bool>) -> bool {
    if let Some(quirks) = quirks_param {
        return quirks;
    }

    if let Ok(env_quirks) = env::var(MINECRAFT_QUIRKS_ENV_VAR) {
        return env_quirks.eq_ignore_ascii_case("true") || env_quirks == "1";
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;

    // Use a mutex to serialize env var tests to avoid race conditions
    // SAFETY: Tests are serialized via ENV_TEST_MUTEX to prevent data races
    static ENV_TEST_MUTEX: once_cell::sync::Lazy<StdMutex<()>> =
        once_cell::sync::Lazy::new(|| StdMutex::new(()));

    /// Helper to set an environment variable safely within tests.
    /// SAFETY: Must be called while holding ENV_TEST_MUTEX to prevent data races.
    unsafe fn set_env(key: &str, value: &str) {
        // SAFETY: Caller ensures ENV_TEST_MUTEX is held
        unsafe { env::set_var(key, value) };
    }

    /// Helper to remove an environment variable safely within tests.
    /// SAFETY: Must be called while holding ENV_TEST_MUTEX to prevent data races.
    unsafe fn remove_env(key: &str) {
        // SAFETY: Caller ensures ENV_TEST_MUTEX is held
        unsafe { env::remove_var(key) };
    }

    mod allowed_ids {
        use super::*;

        #[test]
        fn test_parse_id_list() {
            assert_eq!(
                parse_id_list(" 10001, ,10002,"),
                vec!["10001".to_string(), "10002".to_string()]
            );
            assert!(parse_id_list("").is_empty());
        }

        #[test]
        fn test_param_takes_priority_over_env() {
            let _guard = ENV_TEST_MUTEX.lock().unwrap();
            // SAFETY: Holding ENV_TEST_MUTEX, no concurrent env access
            unsafe {
                set_env(ALLOWED_IDS_ENV_VAR, "1,2,3");
            }
            let result = resolve_allowed_ids(Some(vec!["9".to_string()]));
            // SAFETY: Holding ENV_TEST_MUTEX, no concurrent env access
            unsafe {
                remove_env(ALLOWED_IDS_ENV_VAR);
            }
            assert_eq!(result, vec!["9".to_string()]);
        }

        #[test]
        fn test_uses_env_var_when_no_param() {
            let _guard = ENV_TEST_MUTEX.lock().unwrap();
            // SAFETY: Holding ENV_TEST_MUTEX, no concurrent env access
            unsafe {
                set_env(ALLOWED_IDS_ENV_VAR, "10001,10002");
            }
            let result = resolve_allowed_ids(None);
            // SAFETY: Holding ENV_TEST_MUTEX, no concurrent env access
            unsafe {
                remove_env(ALLOWED_IDS_ENV_VAR);
            }
            assert_eq!(result.len(), 2);
        }

        #[test]
        fn test_default_is_empty() {
            let _guard = ENV_TEST_MUTEX.lock().unwrap();
            // SAFETY: Holding ENV_TEST_MUTEX, no concurrent env access
            unsafe {
                remove_env(ALLOWED_IDS_ENV_VAR);
            }
            assert!(resolve_allowed_ids(None).is_empty());
        }
    }

    mod timeout {
        use super::*;

        #[test]
        fn test_uses_param_when_provided() {
            assert_eq!(resolve_timeout(Some(30)), Duration::from_secs(30));
        }

        #[test]
        fn test_uses_env_var_when_no_param() {
            let _guard = ENV_TEST_MUTEX.lock().unwrap();
            // SAFETY: Holding ENV_TEST_MUTEX, no concurrent env access
            unsafe {
                set_env(TIMEOUT_ENV_VAR, "25");
            }
            let result = resolve_timeout(None);
            // SAFETY: Holding ENV_TEST_MUTEX, no concurrent env access
            unsafe {
                remove_env(TIMEOUT_ENV_VAR);
            }
            assert_eq!(result, Duration::from_secs(25));
        }

        #[test]
        fn test_ignores_invalid_and_zero_env_var() {
            let _guard = ENV_TEST_MUTEX.lock().unwrap();
            for raw in ["invalid", "-10", "0"] {
                // SAFETY: Holding ENV_TEST_MUTEX, no concurrent env access
                unsafe {
                    set_env(TIMEOUT_ENV_VAR, raw);
                }
                let result = resolve_timeout(None);
                assert_eq!(result, Duration::from_secs(DEFAULT_TIMEOUT_SECS), "{raw}");
            }
            // SAFETY: Holding ENV_TEST_MUTEX, no concurrent env access
            unsafe {
                remove_env(TIMEOUT_ENV_VAR);
            }
        }
    }

    mod reply_limit {
        use super::*;

        #[test]
        fn test_uses_default_when_no_param_or_env() {
            let _guard = ENV_TEST_MUTEX.lock().unwrap();
            // SAFETY: Holding ENV_TEST_MUTEX, no concurrent env access
            unsafe {
                remove_env(REPLY_LIMIT_ENV_VAR);
            }
            assert_eq!(resolve_reply_limit(None), DEFAULT_REPLY_LIMIT);
        }

        #[test]
        fn test_uses_env_var_when_no_param() {
            let _guard = ENV_TEST_MUTEX.lock().unwrap();
            // SAFETY: Holding ENV_TEST_MUTEX, no concurrent env access
            unsafe {
                set_env(REPLY_LIMIT_ENV_VAR, "500");
            }
            let result = resolve_reply_limit(None);
            // SAFETY: Holding ENV_TEST_MUTEX, no concurrent env access
            unsafe {
                remove_env(REPLY_LIMIT_ENV_VAR);
            }
            assert_eq!(result, 500);
        }
    }

    mod store_path {
        use super::*;

        #[test]
        fn test_uses_param_when_provided() {
            let path = PathBuf::from("/tmp/servers.json");
            assert_eq!(resolve_store_path(Some(path.clone())), path);
        }

        #[test]
        fn test_blank_env_var_uses_default() {
            let _guard = ENV_TEST_MUTEX.lock().unwrap();
            // SAFETY: Holding ENV_TEST_MUTEX, no concurrent env access
            unsafe {
                set_env(STORE_PATH_ENV_VAR, "   ");
            }
            let result = resolve_store_path(None);
            // SAFETY: Holding ENV_TEST_MUTEX, no concurrent env access
            unsafe {
                remove_env(STORE_PATH_ENV_VAR);
            }
            assert_eq!(result, PathBuf::from(DEFAULT_STORE_PATH));
        }
    }

    mod bind_host {
        use super::*;

        #[test]
        fn test_defaults_to_loopback() {
            let _guard = ENV_TEST_MUTEX.lock().unwrap();
            // SAFETY: Holding ENV_TEST_MUTEX, no concurrent env access
            unsafe {
                remove_env(BIND_HOST_ENV_VAR);
            }
            assert_eq!(resolve_bind_host(None), "127.0.0.1");
        }

        #[test]
        fn test_uses_env_var_when_no_param() {
            let _guard = ENV_TEST_MUTEX.lock().unwrap();
            // SAFETY: Holding ENV_TEST_MUTEX, no concurrent env access
            unsafe {
                set_env(BIND_HOST_ENV_VAR, " 0.0.0.0 ");
            }
            let result = resolve_bind_host(None);
            // SAFETY: Holding ENV_TEST_MUTEX, no concurrent env access
            unsafe {
                remove_env(BIND_HOST_ENV_VAR);
            }
            assert_eq!(result, "0.0.0.0");
        }
    }

    mod webhook_token {
        use super::*;

        #[test]
        fn test_unset_is_none() {
            let _guard = ENV_TEST_MUTEX.lock().unwrap();
            // SAFETY: Holding ENV_TEST_MUTEX, no concurrent env access
            unsafe {
                remove_env(WEBHOOK_TOKEN_ENV_VAR);
            }
            assert_eq!(resolve_webhook_token(None), None);
        }

        #[test]
        fn test_blank_env_var_is_none() {
            let _guard = ENV_TEST_MUTEX.lock().unwrap();
            // SAFETY: Holding ENV_TEST_MUTEX, no concurrent env access
            unsafe {
                set_env(WEBHOOK_TOKEN_ENV_VAR, "  ");
            }
            let result = resolve_webhook_token(None);
            // SAFETY: Holding ENV_TEST_MUTEX, no concurrent env access
            unsafe {
                remove_env(WEBHOOK_TOKEN_ENV_VAR);
            }
            assert_eq!(result, None);
        }

        #[test]
        fn test_uses_env_var_when_no_param() {
            let _guard = ENV_TEST_MUTEX.lock().unwrap();
            // SAFETY: Holding ENV_TEST_MUTEX, no concurrent env access
            unsafe {
                set_env(WEBHOOK_TOKEN_ENV_VAR, "s3cret");
            }
            let result = resolve_webhook_token(None);
            // SAFETY: Holding ENV_TEST_MUTEX, no concurrent env access
            unsafe {
                remove_env(WEBHOOK_TOKEN_ENV_VAR);
            }
            assert_eq!(result.as_deref(), Some("s3cret"));
        }
    }

    mod unscoped_policy {
        use super::*;

        #[test]
        fn test_env_var_reject() {
            let _guard = ENV_TEST_MUTEX.lock().unwrap();
            // SAFETY: Holding ENV_TEST_MUTEX, no concurrent env access
            unsafe {
                set_env(UNSCOPED_POLICY_ENV_VAR, "REJECT");
            }
            let result = resolve_unscoped_policy(None);
            // SAFETY: Holding ENV_TEST_MUTEX, no concurrent env access
            unsafe {
                remove_env(UNSCOPED_POLICY_ENV_VAR);
            }
            assert_eq!(result, UnscopedPolicy::Reject);
        }

        #[test]
        fn test_unknown_env_var_uses_shared() {
            let _guard = ENV_TEST_MUTEX.lock().unwrap();
            // SAFETY: Holding ENV_TEST_MUTEX, no concurrent env access
            unsafe {
                set_env(UNSCOPED_POLICY_ENV_VAR, "sometimes");
            }
            let result = resolve_unscoped_policy(None);
            // SAFETY: Holding ENV_TEST_MUTEX, no concurrent env access
            unsafe {
                remove_env(UNSCOPED_POLICY_ENV_VAR);
            }
            assert_eq!(result, UnscopedPolicy::Shared);
        }
    }

    mod minecraft_quirks {
        use super::*;

        #[test]
        fn test_env_var_one() {
            let _guard = ENV_TEST_MUTEX.lock().unwrap();
            // SAFETY: Holding ENV_TEST_MUTEX, no concurrent env access
            unsafe {
                set_env(MINECRAFT_QUIRKS_ENV_VAR, "1");
            }
            let result = resolve_minecraft_quirks(None);
            // SAFETY: Holding ENV_TEST_MUTEX, no concurrent env access
            unsafe {
                remove_env(MINECRAFT_QUIRKS_ENV_VAR);
            }
            assert!(result);
        }

        #[test]
        fn test_default_is_false() {
            let _guard = ENV_TEST_MUTEX.lock().unwrap();
            // SAFETY: Holding ENV_TEST_MUTEX, no concurrent env access
            unsafe {
                remove_env(MINECRAFT_QUIRKS_ENV_VAR);
            }
            assert!(!resolve_minecraft_quirks(None));
        }
    }

    #[test]
    fn test_command_prefix_and_port_params() {
        assert_eq!(resolve_command_prefix(Some("/rcon".to_string())), "/rcon");
        assert_eq!(resolve_http_port(Some(9000)), 9000);
    }
}
