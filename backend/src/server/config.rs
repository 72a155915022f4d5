//! HTTP server configuration object and helpers.

use foodshare::domain::{AccountPolicy, StoreTimeout};
use foodshare::inbound::http::token_config::TokenSettings;
use foodshare::outbound::persistence::DbPool;
use std::net::SocketAddr;

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) bind_addr: SocketAddr,
    pub(crate) token: TokenSettings,
    pub(crate) store_timeout: StoreTimeout,
    pub(crate) account_policy: AccountPolicy,
    pub(crate) db_pool: Option<DbPool>,
}

impl ServerConfig {
    /// Construct a configuration that keeps data in memory.
    #[must_use]
    pub fn new(bind_addr: SocketAddr, token: TokenSettings) -> Self {
        Self {
            bind_addr,
            token,
            store_timeout: StoreTimeout::default(),
            account_policy: AccountPolicy::default(),
            db_pool: None,
        }
    }

    /// Attach a database connection pool for the Diesel adapters.
    ///
    /// Without one the server uses the in-memory repositories.
    #[must_use]
    pub fn with_db_pool(mut self, pool: DbPool) -> Self {
        self.db_pool = Some(pool);
        self
    }

    #[must_use]
    pub fn with_store_timeout(mut self, timeout: StoreTimeout) -> Self {
        self.store_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_account_policy(mut self, policy: AccountPolicy) -> Self {
        self.account_policy = policy;
        self
    }
}
