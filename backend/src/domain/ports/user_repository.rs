//! Port abstraction for the identity store and its errors.
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{AccountStatus, Email, GeoPoint, Role, User, UserId};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by user repository adapters.
    pub enum UserPersistenceError {
        /// Repository connection could not be established.
        Connection { message: String } => "user repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "user repository query failed: {message}",
        /// Another account already uses the e-mail address.
        DuplicateEmail { email: String } => "email {email} is already registered",
        /// The user to update does not exist.
        Missing { id: String } => "user {id} does not exist",
    }
}

/// User found by a proximity search with its distance from the centre.
#[derive(Debug, Clone, PartialEq)]
pub struct NearbyUser {
    pub user: User,
    pub distance_meters: f64,
}

/// Largest number of users a proximity search returns.
pub const NEARBY_RESULT_LIMIT: usize = 100;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new user. E-mail addresses are unique.
    async fn create(&self, user: &User) -> Result<(), UserPersistenceError>;

    /// Write the self-service fields of a stored user: name, e-mail, phone
    /// and role profile. Account status and password digest are not written,
    /// so a concurrent status change survives. E-mail stays unique.
    async fn update_profile(&self, user: &User) -> Result<(), UserPersistenceError>;

    /// Write only the account status of a stored user.
    async fn update_account_status(
        &self,
        id: &UserId,
        status: AccountStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<(), UserPersistenceError>;

    /// Fetch a user by identifier.
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError>;

    /// Fetch a user by normalised e-mail address.
    async fn find_by_email(&self, email: &Email) -> Result<Option<User>, UserPersistenceError>;

    /// Users with a recorded location within `radius_meters` of `center`,
    /// nearest first, optionally restricted to one role.
    async fn find_near(
        &self,
        center: GeoPoint,
        radius_meters: f64,
        role: Option<Role>,
    ) -> Result<Vec<NearbyUser>, UserPersistenceError>;
}
