//! Port for issuing and verifying signed access tokens.

use chrono::{DateTime, Utc};

use crate::domain::{IssuedToken, TokenClaims, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by token codec adapters.
    pub enum TokenCodecError {
        /// The token is malformed or its signature does not verify.
        Invalid { message: String } => "token is invalid: {message}",
        /// The token verified but is past its expiry.
        Expired => "token has expired",
        /// The token could not be signed.
        Signing { message: String } => "token signing failed: {message}",
    }
}

/// Expiry is evaluated against the caller-supplied `now` so services can run
/// on a mockable clock.
#[cfg_attr(test, mockall::automock)]
pub trait TokenCodec: Send + Sync {
    /// Sign a token for `subject` issued at `now`.
    fn issue(&self, subject: &UserId, now: DateTime<Utc>) -> Result<IssuedToken, TokenCodecError>;

    /// Verify the signature and expiry of `token`.
    fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<TokenClaims, TokenCodecError>;
}
