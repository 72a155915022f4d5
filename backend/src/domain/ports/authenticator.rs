//! Driving port resolving bearer tokens into caller identities.
//!
//! Inbound adapters hand the raw token to an [`Authenticator`] and never see
//! token codecs or user storage, which keeps handler tests free of
//! cryptography.

use async_trait::async_trait;

use crate::domain::Error;
use crate::domain::access::Identity;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Verify `token` and load the identity it names.
    ///
    /// Fails with `unauthorized` for bad or expired tokens and deleted users,
    /// and with `forbidden` for accounts that are not active.
    async fn authenticate(&self, token: &str) -> Result<Identity, Error>;
}
