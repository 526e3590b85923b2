//! Server configuration types
//!
//! Defines the configuration structures for the listener and the dialer.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;

/// Default listen address
fn default_listen() -> String {
    "127.0.0.1:1080".to_string()
}

/// Default TCP_NODELAY setting
fn default_nodelay() -> bool {
    true
}

/// Default keepalive seconds
fn default_keepalive_secs() -> u64 {
    20
}

/// Default keepalive interval
fn default_keepalive_interval() -> u64 {
    8
}

/// Root configuration structure
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    /// Listener configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Outbound dialer configuration
    #[serde(default)]
    pub dialer: DialerConfig,
}

impl Config {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        self.server.validate()?;
        self.dialer.validate()
    }
}

/// Listener configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServerConfig {
    /// Address to accept SOCKS5 clients on (e.g., "127.0.0.1:1080")
    #[serde(default = "default_listen")]
    pub listen: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            listen: default_listen(),
        }
    }
}

impl ServerConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        self.listen
            .parse::<SocketAddr>()
            .map(|_| ())
            .map_err(|e| format!("Invalid listen address {:?}: {}", self.listen, e))
    }
}

/// Outbound dialer configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DialerConfig {
    /// Connect timeout in seconds; 0 means no explicit timeout
    #[serde(default)]
    pub connect_timeout: u64,

    /// Enable TCP_NODELAY
    #[serde(default = "default_nodelay")]
    pub nodelay: bool,

    /// TCP keepalive timeout in seconds; 0 disables keepalive
    #[serde(default = "default_keepalive_secs")]
    pub keepalive_secs: u64,

    /// TCP keepalive interval in seconds
    #[serde(default = "default_keepalive_interval")]
    pub keepalive_interval: u64,

    /// Send a failure reply when dialing the destination fails
    #[serde(default)]
    pub reply_on_dial_failure: bool,
}

impl Default for DialerConfig {
    fn default() -> Self {
        DialerConfig {
            connect_timeout: 0,
            nodelay: default_nodelay(),
            keepalive_secs: default_keepalive_secs(),
            keepalive_interval: default_keepalive_interval(),
            reply_on_dial_failure: false,
        }
    }
}

impl DialerConfig {
    /// Connect timeout, if one is configured
    pub fn connect_timeout(&self) -> Option<Duration> {
        (self.connect_timeout > 0).then(|| Duration::from_secs(self.connect_timeout))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.keepalive_secs > 0 && self.keepalive_interval == 0 {
            return Err("keepalive_interval must be non-zero when keepalive is enabled".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_config_default() {
        let config = ServerConfig::default();
        assert_eq!(config.listen, "127.0.0.1:1080");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_server_config_validate() {
        let config = ServerConfig {
            listen: "not an address".to_string(),
        };
        assert!(config.validate().is_err());

        let config = ServerConfig {
            listen: "[::]:1080".to_string(),
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_dialer_config_default() {
        let config = DialerConfig::default();
        assert_eq!(config.connect_timeout(), None);
        assert!(config.nodelay);
        assert_eq!(config.keepalive_secs, 20);
        assert_eq!(config.keepalive_interval, 8);
        assert!(!config.reply_on_dial_failure);
    }

    #[test]
    fn test_dialer_config_connect_timeout() {
        let config = DialerConfig {
            connect_timeout: 7,
            ..Default::default()
        };
        assert_eq!(config.connect_timeout(), Some(Duration::from_secs(7)));
    }

    #[test]
    fn test_dialer_config_validate() {
        let config = DialerConfig {
            keepalive_interval: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = DialerConfig {
            keepalive_secs: 0,
            keepalive_interval: 0,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }
}
