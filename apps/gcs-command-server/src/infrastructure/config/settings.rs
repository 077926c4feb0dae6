//! Server Configuration Settings
//!
//! Configuration types for the command server, loaded from environment
//! variables. Unparseable values fall back to their defaults; values that
//! parse but cannot work together are rejected by validation.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

/// Per-stream settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamSettings {
    /// Capacity of each stream's outbound command channel.
    pub buffer_capacity: usize,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            buffer_capacity: 32,
        }
    }
}

/// Complete server configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address both listeners bind to.
    pub bind_address: IpAddr,
    /// gRPC server port.
    pub grpc_port: u16,
    /// Health check HTTP port (0 = disabled).
    pub health_port: u16,
    /// Per-stream settings.
    pub stream: StreamSettings,
    /// How long shutdown waits for the servers to drain.
    pub shutdown_grace: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            grpc_port: 9090,
            health_port: 8080,
            stream: StreamSettings::default(),
            shutdown_grace: Duration::from_secs(10),
        }
    }
}

impl ServerConfig {
    /// Create configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a value is invalid or the settings conflict.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if a value is invalid or the settings conflict.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let bind_address = match lookup("GCS_BIND_ADDRESS") {
            Some(raw) => raw
                .trim()
                .parse::<IpAddr>()
                .map_err(|_| ConfigError::InvalidValue {
                    key: "GCS_BIND_ADDRESS".to_string(),
                    value: raw,
                })?,
            None => defaults.bind_address,
        };

        let config = Self {
            bind_address,
            grpc_port: parse_or(&lookup, "GCS_GRPC_PORT", defaults.grpc_port),
            health_port: parse_or(&lookup, "GCS_HEALTH_PORT", defaults.health_port),
            stream: StreamSettings {
                buffer_capacity: parse_or(
                    &lookup,
                    "GCS_STREAM_BUFFER",
                    defaults.stream.buffer_capacity,
                ),
            },
            shutdown_grace: Duration::from_secs(parse_or(
                &lookup,
                "GCS_SHUTDOWN_GRACE_SECS",
                defaults.shutdown_grace.as_secs(),
            )),
        };

        config.validate()?;
        Ok(config)
    }

    /// Check that the settings can work together.
    ///
    /// # Errors
    ///
    /// Returns the first conflict found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grpc_port == 0 {
            return Err(ConfigError::Validation(
                "gRPC port must be non-zero".to_string(),
            ));
        }

        if self.health_port == self.grpc_port {
            return Err(ConfigError::Validation(format!(
                "gRPC and health servers cannot share port {}",
                self.grpc_port
            )));
        }

        if self.stream.buffer_capacity == 0 {
            return Err(ConfigError::Validation(
                "stream buffer capacity must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    /// Socket address of the gRPC listener.
    #[must_use]
    pub const fn grpc_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_address, self.grpc_port)
    }

    /// Socket address of the health listener, or `None` when disabled.
    #[must_use]
    pub const fn health_addr(&self) -> Option<SocketAddr> {
        if self.health_port == 0 {
            None
        } else {
            Some(SocketAddr::new(self.bind_address, self.health_port))
        }
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A variable is set to a value that cannot be used.
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue {
        /// Variable name.
        key: String,
        /// Offending value.
        value: String,
    },
    /// Settings parse individually but conflict.
    #[error("invalid configuration: {0}")]
    Validation(String),
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<ServerConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        let config = load(&[]).unwrap();
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.grpc_addr().to_string(), "0.0.0.0:9090");
        assert_eq!(
            config.health_addr().map(|a| a.to_string()).as_deref(),
            Some("0.0.0.0:8080")
        );
    }

    #[test]
    fn overrides_from_env() {
        let config = load(&[
            ("GCS_BIND_ADDRESS", "127.0.0.1"),
            ("GCS_GRPC_PORT", "50070"),
            ("GCS_HEALTH_PORT", "8099"),
            ("GCS_STREAM_BUFFER", "4"),
            ("GCS_SHUTDOWN_GRACE_SECS", "3"),
        ])
        .unwrap();

        assert_eq!(config.grpc_addr().to_string(), "127.0.0.1:50070");
        assert_eq!(config.health_port, 8099);
        assert_eq!(config.stream.buffer_capacity, 4);
        assert_eq!(config.shutdown_grace, Duration::from_secs(3));
    }

    #[test]
    fn unparseable_numbers_fall_back() {
        let config = load(&[("GCS_GRPC_PORT", "not-a-port"), ("GCS_STREAM_BUFFER", "-1")]).unwrap();
        assert_eq!(config.grpc_port, 9090);
        assert_eq!(config.stream.buffer_capacity, 32);
    }

    #[test]
    fn invalid_bind_address_rejected() {
        let err = load(&[("GCS_BIND_ADDRESS", "localhost")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "GCS_BIND_ADDRESS"));
    }

    #[test]
    fn port_conflict_rejected() {
        let err = load(&[("GCS_GRPC_PORT", "7000"), ("GCS_HEALTH_PORT", "7000")]).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn zero_grpc_port_rejected() {
        assert!(load(&[("GCS_GRPC_PORT", "0")]).is_err());
    }

    #[test]
    fn zero_buffer_rejected() {
        assert!(load(&[("GCS_STREAM_BUFFER", "0")]).is_err());
    }

    #[test]
    fn health_can_be_disabled() {
        let config = load(&[("GCS_HEALTH_PORT", "0")]).unwrap();
        assert!(config.health_addr().is_none());
    }

    #[test]
    fn ipv6_bind_address() {
        let config = load(&[("GCS_BIND_ADDRESS", "::1")]).unwrap();
        assert_eq!(config.grpc_addr().to_string(), "[::1]:9090");
    }
}
