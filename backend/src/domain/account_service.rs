//! Account use-cases: registration, login, profiles and account status.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde_json::json;
use tracing::{info, warn};

use crate::domain::access::{Action, Identity, require};
use crate::domain::lifecycle_service::map_user_error;
use crate::domain::ports::{
    AccountCommand, AccountQuery, AuthSession, MAX_NEARBY_RADIUS_METERS, NearbySearch, NearbyUser,
    PasswordHashError, PasswordHasher, TokenCodec, TokenCodecError, UserRepository,
};
use crate::domain::store_call::StoreTimeout;
use crate::domain::{
    AccountStatus, Error, LoginCredentials, ProfilePatch, Registration, Role, User, UserId,
    UserParts, UserValidationError,
};

pub(crate) fn map_user_validation_error(error: UserValidationError) -> Error {
    Error::invalid_request(error.to_string()).with_details(json!({ "field": error.field() }))
}

fn map_hash_error(error: PasswordHashError) -> Error {
    Error::internal(format!("credential check failed: {error}"))
}

fn map_token_error(error: TokenCodecError) -> Error {
    Error::internal(format!("token issuance failed: {error}"))
}

fn invalid_credentials() -> Error {
    Error::unauthorized("invalid email or password")
}

/// Options controlling account policies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccountPolicy {
    /// Whether anyone may self-register with the admin role.
    pub allow_admin_registration: bool,
}

/// Account service implementing [`AccountCommand`] and [`AccountQuery`].
#[derive(Clone)]
pub struct AccountService<U, H, T> {
    users: Arc<U>,
    hasher: Arc<H>,
    tokens: Arc<T>,
    clock: Arc<dyn Clock>,
    timeout: StoreTimeout,
    policy: AccountPolicy,
}

impl<U, H, T> AccountService<U, H, T> {
    pub fn new(
        users: Arc<U>,
        hasher: Arc<H>,
        tokens: Arc<T>,
        clock: Arc<dyn Clock>,
        timeout: StoreTimeout,
        policy: AccountPolicy,
    ) -> Self {
        Self {
            users,
            hasher,
            tokens,
            clock,
            timeout,
            policy,
        }
    }
}

impl<U, H, T> AccountService<U, H, T>
where
    U: UserRepository,
    H: PasswordHasher,
    T: TokenCodec,
{
    async fn load(&self, id: &UserId) -> Result<User, Error> {
        self.timeout
            .run("load user", self.users.find_by_id(id), map_user_error)
            .await?
            .ok_or_else(|| Error::not_found(format!("user {id} not found")))
    }

    async fn save_profile(&self, user: &User) -> Result<(), Error> {
        self.timeout
            .run("update user profile", self.users.update_profile(user), map_user_error)
            .await
    }

    fn session_for(&self, user: User) -> Result<AuthSession, Error> {
        let token = self
            .tokens
            .issue(user.id(), self.clock.utc())
            .map_err(map_token_error)?;
        Ok(AuthSession { user, token })
    }
}

#[async_trait]
impl<U, H, T> AccountCommand for AccountService<U, H, T>
where
    U: UserRepository,
    H: PasswordHasher,
    T: TokenCodec,
{
    async fn register(&self, registration: Registration) -> Result<AuthSession, Error> {
        let role = registration.role();
        if role == Role::Admin && !self.policy.allow_admin_registration {
            return Err(Error::forbidden("admin accounts cannot be self-registered")
                .with_details(json!({ "field": "userType" })));
        }

        let Registration {
            name,
            email,
            password,
            phone,
            profile,
        } = registration;
        let password_digest = self.hasher.hash(&password).map_err(map_hash_error)?;
        let now = self.clock.utc();
        let user = User::from_parts(UserParts {
            id: UserId::random(),
            name,
            email,
            password_digest,
            phone,
            account_status: AccountStatus::Active,
            profile,
            created_at: now,
            updated_at: now,
        });

        self.timeout
            .run("create user", self.users.create(&user), map_user_error)
            .await?;
        info!(user_id = %user.id(), role = %role, "user registered");
        self.session_for(user)
    }

    async fn login(&self, credentials: LoginCredentials) -> Result<AuthSession, Error> {
        let Some(user) = self
            .timeout
            .run(
                "find user by email",
                self.users.find_by_email(credentials.email()),
                map_user_error,
            )
            .await?
        else {
            return Err(invalid_credentials());
        };

        let matches = self
            .hasher
            .verify(credentials.password(), user.password_digest())
            .map_err(map_hash_error)?;
        if !matches {
            warn!(user_id = %user.id(), "login rejected: password mismatch");
            return Err(invalid_credentials());
        }
        if !user.is_active() {
            return Err(Error::forbidden(format!(
                "account is {}",
                user.account_status()
            )));
        }
        info!(user_id = %user.id(), "user logged in");
        self.session_for(user)
    }

    async fn update_profile(&self, identity: Identity, patch: ProfilePatch) -> Result<User, Error> {
        require(
            &identity,
            Action::UpdateOwnProfile {
                user: *identity.user_id(),
            },
            None,
        )?;
        let mut user = self.load(identity.user_id()).await?;
        user.apply_profile_patch(patch, self.clock.utc())
            .map_err(map_user_validation_error)?;
        self.save_profile(&user).await?;
        info!(user_id = %user.id(), "profile updated");
        Ok(user)
    }

    async fn update_account(
        &self,
        identity: Identity,
        target: UserId,
        status: AccountStatus,
    ) -> Result<User, Error> {
        require(&identity, Action::UpdateAccount, None)?;
        let mut user = self.load(&target).await?;
        let previous = user.account_status();
        let now = self.clock.utc();
        self.timeout
            .run(
                "update account status",
                self.users.update_account_status(&target, status, now),
                map_user_error,
            )
            .await?;
        user.set_account_status(status, now);
        info!(
            user_id = %target,
            admin_id = %identity.user_id(),
            from = %previous,
            to = %status,
            "account status changed"
        );
        Ok(user)
    }
}

#[async_trait]
impl<U, H, T> AccountQuery for AccountService<U, H, T>
where
    U: UserRepository,
    H: PasswordHasher,
    T: TokenCodec,
{
    async fn profile(&self, identity: Identity) -> Result<User, Error> {
        self.load(identity.user_id()).await
    }

    async fn find_nearby(
        &self,
        identity: Identity,
        search: NearbySearch,
    ) -> Result<Vec<NearbyUser>, Error> {
        require(&identity, Action::FindNearbyUsers, None)?;
        let radius = search.max_distance_meters;
        if !radius.is_finite() || radius <= 0.0 || radius > MAX_NEARBY_RADIUS_METERS {
            return Err(Error::invalid_request(format!(
                "maxDistance must be between 0 and {MAX_NEARBY_RADIUS_METERS} metres"
            ))
            .with_details(json!({ "field": "maxDistance" })));
        }
        self.timeout
            .run(
                "find nearby users",
                self.users.find_near(search.center, radius, search.role),
                map_user_error,
            )
            .await
    }
}

#[cfg(test)]
#[path = "account_service_tests.rs"]
mod tests;
