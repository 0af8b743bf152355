//! Gateway configuration

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

use crate::{GatewayError, DEFAULT_HOST, DEFAULT_PORT};
use techwise_core::input::DEFAULT_MIN_QUERY_CHARS;

/// HTTP gateway configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// Questions shorter than this are rejected with 400
    pub min_query_chars: usize,

    /// Allow cross-origin requests from any origin
    pub permissive_cors: bool,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            min_query_chars: DEFAULT_MIN_QUERY_CHARS,
            permissive_cors: true,
        }
    }
}

impl GatewayConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the host
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Set the port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_min_query_chars(mut self, min: usize) -> Self {
        self.min_query_chars = min;
        self
    }

    /// Get the socket address
    pub fn socket_addr(&self) -> crate::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| GatewayError::InvalidConfig(format!("{}:{}: {}", self.host, self.port, e)))
    }

    /// Load configuration from a JSON file
    pub fn from_file(path: &str) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a JSON file
    pub fn to_file(&self, path: &str) -> crate::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
