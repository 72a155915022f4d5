//! Builders wiring repositories and services into the HTTP state.

use std::sync::Arc;

use actix_web::web;
use mockable::{Clock, DefaultClock};

use foodshare::domain::ports::{DonationRepository, UserRepository};
use foodshare::domain::{
    AccountService, DonationLifecycleService, DonationQueryService, TokenAuthenticator,
};
use foodshare::inbound::http::state::HttpState;
use foodshare::outbound::memory::{InMemoryDonationRepository, InMemoryUserRepository};
use foodshare::outbound::persistence::{DieselDonationRepository, DieselUserRepository};
use foodshare::outbound::security::{Argon2PasswordHasher, JwtTokenCodec};

use super::ServerConfig;

/// Compose the domain services over one pair of repositories.
///
/// A single [`AccountService`] backs both account ports and a single token
/// codec both issues and verifies tokens.
fn build_ports<D, U>(
    donations: Arc<D>,
    users: Arc<U>,
    config: &ServerConfig,
    clock: Arc<dyn Clock>,
) -> HttpState
where
    D: DonationRepository + 'static,
    U: UserRepository + 'static,
{
    let timeout = config.store_timeout;
    let tokens = Arc::new(JwtTokenCodec::new(&config.token.secret, config.token.ttl));
    let accounts = Arc::new(AccountService::new(
        users.clone(),
        Arc::new(Argon2PasswordHasher::new()),
        tokens.clone(),
        clock.clone(),
        timeout,
        config.account_policy,
    ));

    HttpState {
        donations: Arc::new(DonationLifecycleService::new(
            donations.clone(),
            users.clone(),
            clock.clone(),
            timeout,
        )),
        donations_query: Arc::new(DonationQueryService::new(donations, clock.clone(), timeout)),
        accounts: accounts.clone(),
        accounts_query: accounts,
        authenticator: Arc::new(TokenAuthenticator::new(users, tokens, clock, timeout)),
    }
}

/// Build the shared HTTP state, using Diesel repositories when a pool is
/// configured and in-memory repositories otherwise.
pub(super) fn build_http_state(config: &ServerConfig) -> web::Data<HttpState> {
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    let state = match &config.db_pool {
        Some(pool) => build_ports(
            Arc::new(DieselDonationRepository::new(pool.clone())),
            Arc::new(DieselUserRepository::new(pool.clone())),
            config,
            clock,
        ),
        None => build_ports(
            Arc::new(InMemoryDonationRepository::new()),
            Arc::new(InMemoryUserRepository::new()),
            config,
            clock,
        ),
    };
    web::Data::new(state)
}
