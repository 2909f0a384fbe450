//! Server configuration

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::registry::RegistryConfig;

/// Default bind address
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default listen port
pub const DEFAULT_PORT: u16 = 80;

/// Relay server configuration options
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Address to bind to
    pub bind_addr: SocketAddr,

    /// Interval between SSE keep-alive comments on idle streams
    pub keep_alive_interval: Duration,

    /// Allow cross-origin requests from any origin
    pub cors_enabled: bool,

    /// Configuration applied to every protocol registry
    pub registry: RegistryConfig,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::new(
                IpAddr::V4(std::net::Ipv4Addr::UNSPECIFIED),
                DEFAULT_PORT,
            ),
            keep_alive_interval: Duration::from_secs(15),
            cors_enabled: true,
            registry: RegistryConfig::default(),
        }
    }
}

impl RelayConfig {
    /// Create a new config with custom bind address
    pub fn with_addr(addr: SocketAddr) -> Self {
        Self {
            bind_addr: addr,
            ..Default::default()
        }
    }

    /// Load the bind address from `HOST` and `PORT`
    ///
    /// Unset variables fall back to `0.0.0.0` and `80`. `HOST` may be an IP
    /// literal or a hostname; hostnames are resolved and the first address
    /// is used.
    pub async fn from_env() -> Result<Self> {
        let host = std::env::var("HOST").ok();
        let port = std::env::var("PORT").ok();

        Self::from_host_port(host.as_deref(), port.as_deref()).await
    }

    async fn from_host_port(host: Option<&str>, port: Option<&str>) -> Result<Self> {
        let host = host.unwrap_or(DEFAULT_HOST);

        let port = match port {
            Some(port) => port
                .parse::<u16>()
                .map_err(|_| Error::Config(format!("PORT is not a valid port: {}", port)))?,
            None => DEFAULT_PORT,
        };

        let addr = tokio::net::lookup_host((host, port))
            .await
            .map_err(|e| Error::Config(format!("HOST cannot be resolved: {}: {}", host, e)))?
            .next()
            .ok_or_else(|| Error::Config(format!("HOST resolved to no address: {}", host)))?;

        Ok(Self::with_addr(addr))
    }

    /// Set the bind address
    pub fn bind(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Set the SSE keep-alive interval
    pub fn keep_alive_interval(mut self, interval: Duration) -> Self {
        self.keep_alive_interval = interval;
        self
    }

    /// Disable the permissive CORS layer
    pub fn disable_cors(mut self) -> Self {
        self.cors_enabled = false;
        self
    }

    /// Set the registry configuration
    pub fn registry(mut self, registry: RegistryConfig) -> Self {
        self.registry = registry;
        self
    }
}
