//! Bearer token authentication.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::debug;

use crate::domain::access::Identity;
use crate::domain::lifecycle_service::map_user_error;
use crate::domain::ports::{Authenticator, TokenCodec, TokenCodecError, UserRepository};
use crate::domain::store_call::StoreTimeout;
use crate::domain::Error;

/// Resolves tokens into identities, re-reading the account on every call so
/// suspensions take effect immediately.
#[derive(Clone)]
pub struct TokenAuthenticator<U, T> {
    users: Arc<U>,
    tokens: Arc<T>,
    clock: Arc<dyn Clock>,
    timeout: StoreTimeout,
}

impl<U, T> TokenAuthenticator<U, T> {
    pub fn new(users: Arc<U>, tokens: Arc<T>, clock: Arc<dyn Clock>, timeout: StoreTimeout) -> Self {
        Self {
            users,
            tokens,
            clock,
            timeout,
        }
    }
}

#[async_trait]
impl<U, T> Authenticator for TokenAuthenticator<U, T>
where
    U: UserRepository,
    T: TokenCodec,
{
    async fn authenticate(&self, token: &str) -> Result<Identity, Error> {
        let claims = self
            .tokens
            .verify(token, self.clock.utc())
            .map_err(|error| {
                debug!(kind = error.kind(), "bearer token rejected");
                match error {
                    TokenCodecError::Expired => Error::unauthorized("token has expired"),
                    _ => Error::unauthorized("token is invalid"),
                }
            })?;

        let user = self
            .timeout
            .run("load user", self.users.find_by_id(&claims.subject), map_user_error)
            .await?
            .ok_or_else(|| Error::unauthorized("token subject no longer exists"))?;
        if !user.is_active() {
            return Err(Error::forbidden(format!(
                "account is {}",
                user.account_status()
            )));
        }
        Ok(Identity::new(*user.id(), user.role()))
    }
}
