//! Client configuration with validation.
//!
//! The `connection` section is what the native engine receives at handle
//! creation; the `correlation` section only affects the bridge itself.

use crate::domain::allocator::IdReusePolicy;
use serde::{Deserialize, Serialize};

/// Main client configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Endpoint description handed to the native engine
    pub connection: ConnectionConfig,
    /// Correlation table settings
    pub correlation: CorrelationConfig,
}

impl ClientConfig {
    /// Single-node config for `host:port`.
    pub fn for_address(host: impl Into<String>, port: u16) -> Self {
        Self {
            connection: ConnectionConfig {
                addresses: vec![NodeAddress::new(host, port)],
                ..ConnectionConfig::default()
            },
            correlation: CorrelationConfig::default(),
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.connection.validate()
    }
}

/// Endpoint description passed to `create_handle`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    pub addresses: Vec<NodeAddress>,
    pub tls_mode: TlsMode,
    pub cluster_mode: bool,
    /// Per-request timeout enforced by the engine; `None` leaves the engine default.
    pub request_timeout_ms: Option<u32>,
    pub read_from: ReadFrom,
    pub connection_retry: ConnectionRetryStrategy,
    pub authentication: Option<AuthenticationInfo>,
    pub database_id: u32,
    pub protocol: ProtocolVersion,
    pub client_name: Option<String>,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            addresses: vec![NodeAddress::default()],
            tls_mode: TlsMode::NoTls,
            cluster_mode: false,
            request_timeout_ms: None,
            read_from: ReadFrom::Primary,
            connection_retry: ConnectionRetryStrategy::default(),
            authentication: None,
            database_id: 0,
            protocol: ProtocolVersion::Resp3,
            client_name: None,
        }
    }
}

impl ConnectionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.addresses.is_empty() {
            return Err(ConfigError::NoAddresses);
        }

        for address in &self.addresses {
            if address.host.trim().is_empty() {
                return Err(ConfigError::InvalidAddress(format!(
                    "empty host (port {})",
                    address.port
                )));
            }
            if address.port == 0 {
                return Err(ConfigError::InvalidAddress(format!(
                    "{}: port cannot be 0",
                    address.host
                )));
            }
        }

        if self.request_timeout_ms == Some(0) {
            return Err(ConfigError::InvalidTimeout(
                "request_timeout_ms cannot be 0".into(),
            ));
        }

        if self.cluster_mode && self.database_id != 0 {
            return Err(ConfigError::Invalid(
                "cluster mode only supports database 0".into(),
            ));
        }

        if self.connection_retry.exponent_base < 2 {
            return Err(ConfigError::Invalid(
                "connection_retry.exponent_base must be at least 2".into(),
            ));
        }

        Ok(())
    }

    /// Serialized form handed across the boundary.
    pub fn to_json_bytes(&self) -> Result<Vec<u8>, ConfigError> {
        serde_json::to_vec(self).map_err(|e| ConfigError::Serialization(e.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeAddress {
    pub host: String,
    pub port: u16,
}

impl NodeAddress {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl Default for NodeAddress {
    fn default() -> Self {
        Self::new("localhost", 6379)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TlsMode {
    NoTls,
    SecureTls,
    InsecureTls,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadFrom {
    Primary,
    PreferReplica,
    LowestLatency,
    AzAffinity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProtocolVersion {
    Resp2,
    Resp3,
}

/// Reconnect backoff: `factor * exponent_base^attempt` ms, up to `number_of_retries`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionRetryStrategy {
    pub number_of_retries: u32,
    pub factor: u32,
    pub exponent_base: u32,
}

impl Default for ConnectionRetryStrategy {
    fn default() -> Self {
        Self {
            number_of_retries: 5,
            factor: 100,
            exponent_base: 2,
        }
    }
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticationInfo {
    pub username: Option<String>,
    pub password: String,
}

impl std::fmt::Debug for AuthenticationInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthenticationInfo")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Correlation table settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrelationConfig {
    /// How ids are handed out (default: monotonic)
    pub id_reuse: IdReusePolicy,
}

/// Configuration errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    /// No endpoint given
    #[error("no addresses configured")]
    NoAddresses,
    /// Malformed endpoint
    #[error("invalid address: {0}")]
    InvalidAddress(String),
    /// Invalid timeout value
    #[error("invalid timeout: {0}")]
    InvalidTimeout(String),
    /// Connection request could not be encoded
    #[error("failed to encode connection request: {0}")]
    Serialization(String),
    /// General configuration error
    #[error("invalid configuration: {0}")]
    Invalid(String),
}
