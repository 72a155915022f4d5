//! Server settings loaded via OrthoConfig.
//!
//! Every value can come from the command line, a configuration file or a
//! `FOODSHARE_*` environment variable. Unset values fall back to defaults
//! suited to local development with the in-memory store.

use std::net::SocketAddr;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;

use crate::domain::{AccountPolicy, DEFAULT_STORE_TIMEOUT, StoreTimeout};
use crate::outbound::persistence::{DEFAULT_MAX_CONNECTIONS, PoolConfig};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

/// Errors raised when a configured value cannot be interpreted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    #[error("invalid bind address '{value}': {message}")]
    BindAddr { value: String, message: String },
    #[error("store timeout must be at least 1 ms")]
    ZeroStoreTimeout,
    #[error("database pool needs at least one connection")]
    ZeroConnections,
}

/// Process-level configuration for the HTTP server.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "FOODSHARE")]
pub struct ServerSettings {
    /// Socket address to listen on.
    pub bind_addr: Option<String>,
    /// PostgreSQL URL; without one the server keeps data in memory.
    pub database_url: Option<String>,
    /// Upper bound for pooled database connections.
    pub db_max_connections: Option<u32>,
    /// Deadline for each store call, in milliseconds.
    pub store_timeout_ms: Option<u64>,
    /// Permit self-registration with the admin role.
    #[ortho_config(default = false)]
    pub allow_admin_registration: bool,
}

impl ServerSettings {
    /// Parse the configured bind address, falling back to `0.0.0.0:8080`.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::BindAddr`] when the value is not a socket
    /// address.
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let raw = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        raw.parse().map_err(|err: std::net::AddrParseError| SettingsError::BindAddr {
            value: raw.to_owned(),
            message: err.to_string(),
        })
    }

    /// Store call deadline, five seconds unless configured.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::ZeroStoreTimeout`] for a zero deadline.
    pub fn store_timeout(&self) -> Result<StoreTimeout, SettingsError> {
        match self.store_timeout_ms {
            None => Ok(StoreTimeout::new(DEFAULT_STORE_TIMEOUT)),
            Some(0) => Err(SettingsError::ZeroStoreTimeout),
            Some(ms) => Ok(StoreTimeout::new(Duration::from_millis(ms))),
        }
    }

    pub fn account_policy(&self) -> AccountPolicy {
        AccountPolicy {
            allow_admin_registration: self.allow_admin_registration,
        }
    }

    /// Pool configuration when a database URL is set.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::ZeroConnections`] when the pool size is zero.
    pub fn pool_config(&self) -> Result<Option<PoolConfig>, SettingsError> {
        let Some(url) = self.database_url.as_deref() else {
            return Ok(None);
        };
        let max_size = self.db_max_connections.unwrap_or(DEFAULT_MAX_CONNECTIONS);
        if max_size == 0 {
            return Err(SettingsError::ZeroConnections);
        }
        Ok(Some(PoolConfig::new(url).with_max_size(max_size)))
    }
}
