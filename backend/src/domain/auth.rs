//! Authentication primitives: passwords, digests, login and registration
//! payloads, and signed access token claims.
//!
//! Inbound adapters build these through validating constructors so services
//! only ever see well-formed input.

use std::fmt;

use chrono::{DateTime, Utc};
use zeroize::Zeroizing;

use crate::domain::{Email, PersonName, Phone, Role, RoleProfile, UserId, UserValidationError};

/// Minimum number of characters accepted for a new password.
pub const PASSWORD_MIN_CHARS: usize = 8;

/// Domain error returned when credential values are invalid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialValidationError {
    /// Password was blank.
    EmptyPassword,
    /// Password shorter than [`PASSWORD_MIN_CHARS`].
    PasswordTooShort { min: usize },
    /// A user attribute failed validation.
    User(UserValidationError),
}

impl fmt::Display for CredentialValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyPassword => write!(f, "password must not be empty"),
            Self::PasswordTooShort { min } => {
                write!(f, "password must be at least {min} characters")
            }
            Self::User(inner) => inner.fmt(f),
        }
    }
}

impl std::error::Error for CredentialValidationError {}

impl From<UserValidationError> for CredentialValidationError {
    fn from(value: UserValidationError) -> Self {
        Self::User(value)
    }
}

impl CredentialValidationError {
    /// Name of the offending input field.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::EmptyPassword | Self::PasswordTooShort { .. } => Some("password"),
            Self::User(inner) => inner.field(),
        }
    }
}

/// Plaintext password held in zeroising memory.
#[derive(Clone, PartialEq, Eq)]
pub struct Password(Zeroizing<String>);

impl Password {
    /// Accept any non-empty password; used for login attempts.
    pub fn any(raw: &str) -> Result<Self, CredentialValidationError> {
        if raw.is_empty() {
            return Err(CredentialValidationError::EmptyPassword);
        }
        Ok(Self(Zeroizing::new(raw.to_owned())))
    }

    /// Accept a password that satisfies the strength policy for new accounts.
    pub fn new_secret(raw: &str) -> Result<Self, CredentialValidationError> {
        let password = Self::any(raw)?;
        if raw.chars().count() < PASSWORD_MIN_CHARS {
            return Err(CredentialValidationError::PasswordTooShort {
                min: PASSWORD_MIN_CHARS,
            });
        }
        Ok(password)
    }

    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(***)")
    }
}

/// Encoded password hash in PHC string format.
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordDigest(String);

impl PasswordDigest {
    pub fn new(encoded: impl Into<String>) -> Self {
        Self(encoded.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for PasswordDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordDigest(***)")
    }
}

/// Validated login credentials.
///
/// # Examples
/// ```
/// use foodshare::domain::LoginCredentials;
///
/// let creds = LoginCredentials::try_from_parts("Ada@Example.org", "hunter22").unwrap();
/// assert_eq!(creds.email().as_ref(), "ada@example.org");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    email: Email,
    password: Password,
}

impl LoginCredentials {
    pub fn try_from_parts(email: &str, password: &str) -> Result<Self, CredentialValidationError> {
        Ok(Self {
            email: Email::new(email)?,
            password: Password::any(password)?,
        })
    }

    pub fn email(&self) -> &Email {
        &self.email
    }

    pub fn password(&self) -> &Password {
        &self.password
    }
}

/// Validated self-registration request.
#[derive(Debug, Clone)]
pub struct Registration {
    pub name: PersonName,
    pub email: Email,
    pub password: Password,
    pub phone: Option<Phone>,
    pub profile: RoleProfile,
}

impl Registration {
    pub fn role(&self) -> Role {
        self.profile.role()
    }
}

/// Claims carried by an access token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenClaims {
    pub subject: UserId,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Signed access token handed to clients.
#[derive(Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: Zeroizing<String>,
    pub expires_at: DateTime<Utc>,
}

impl fmt::Debug for IssuedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IssuedToken")
            .field("token", &"***")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}
