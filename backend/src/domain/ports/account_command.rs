//! Driving port for account mutations: registration, login and profile or
//! status changes.

use async_trait::async_trait;

use crate::domain::access::Identity;
use crate::domain::{
    AccountStatus, Error, IssuedToken, LoginCredentials, ProfilePatch, Registration, User, UserId,
};

/// Authenticated user together with a freshly issued token.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user: User,
    pub token: IssuedToken,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountCommand: Send + Sync {
    /// Create an account and sign the caller in.
    async fn register(&self, registration: Registration) -> Result<AuthSession, Error>;

    /// Exchange credentials for a token.
    async fn login(&self, credentials: LoginCredentials) -> Result<AuthSession, Error>;

    /// Apply an allow-listed patch to the caller's own profile.
    async fn update_profile(&self, identity: Identity, patch: ProfilePatch) -> Result<User, Error>;

    /// Change another account's status; admins only.
    async fn update_account(
        &self,
        identity: Identity,
        target: UserId,
        status: AccountStatus,
    ) -> Result<User, Error>;
}
