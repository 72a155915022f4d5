//! Port for one-way password hashing.
//!
//! Hashing is CPU bound and synchronous; services call it directly and the
//! adapters keep their cost parameters moderate.

use crate::domain::{Password, PasswordDigest};

use super::define_port_error;

define_port_error! {
    /// Errors raised by password hashing adapters.
    pub enum PasswordHashError {
        /// The hashing primitive failed.
        Hashing { message: String } => "password hashing failed: {message}",
        /// A stored digest could not be parsed.
        MalformedDigest { message: String } => "stored password digest is malformed: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
pub trait PasswordHasher: Send + Sync {
    /// Derive a salted digest for `password`.
    fn hash(&self, password: &Password) -> Result<PasswordDigest, PasswordHashError>;

    /// Check `password` against `digest`; `Ok(false)` on mismatch.
    fn verify(&self, password: &Password, digest: &PasswordDigest)
    -> Result<bool, PasswordHashError>;
}
